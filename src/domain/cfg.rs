//! Load-time cfg flags.
//!
//! A file whose inner `#![cfg(...)]` is false under the configured flags is left out of
//! its package, the way the compiler would leave it out of the build.

use std::collections::HashSet;

use syn::punctuated::Punctuated;
use syn::{Expr, File, Lit, Meta, Token};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CfgSet {
    names: HashSet<String>,
    pairs: HashSet<(String, String)>,
}

impl CfgSet {
    /// Accepts `name` and `key = "value"` flags; quotes around the value are optional.
    pub fn parse<S: AsRef<str>>(flags: &[S]) -> Self {
        let mut set = Self::default();
        for flag in flags {
            match flag.as_ref().split_once('=') {
                Some((key, value)) => {
                    let value = value.trim().trim_matches('"');
                    set.pairs.insert((key.trim().to_string(), value.to_string()));
                }
                None => {
                    set.names.insert(flag.as_ref().trim().to_string());
                }
            }
        }
        set
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty() && self.pairs.is_empty()
    }

    /// Evaluates a cfg predicate; `None` when it is not a well-formed predicate.
    pub fn eval(&self, meta: &Meta) -> Option<bool> {
        match meta {
            Meta::Path(path) => Some(self.names.contains(&path.get_ident()?.to_string())),
            Meta::NameValue(pair) => {
                let key = pair.path.get_ident()?.to_string();
                let Expr::Lit(expr) = &pair.value else {
                    return None;
                };
                let Lit::Str(value) = &expr.lit else {
                    return None;
                };
                Some(self.pairs.contains(&(key, value.value())))
            }
            Meta::List(list) => {
                let operator = list.path.get_ident()?.to_string();
                let args = list
                    .parse_args_with(Punctuated::<Meta, Token![,]>::parse_terminated)
                    .ok()?;
                let mut results = args.iter().map(|arg| self.eval(arg));
                match operator.as_str() {
                    "all" => results.try_fold(true, |acc, result| Some(acc & result?)),
                    "any" => results.try_fold(false, |acc, result| Some(acc | result?)),
                    "not" if args.len() == 1 => results.next().flatten().map(|result| !result),
                    _ => None,
                }
            }
        }
    }

    /// False only when an inner `#![cfg(...)]` of the file evaluates to false.
    pub fn file_enabled(&self, file: &File) -> bool {
        file.attrs
            .iter()
            .filter(|attr| attr.path().is_ident("cfg"))
            .all(|attr| {
                attr.parse_args::<Meta>()
                    .ok()
                    .and_then(|predicate| self.eval(&predicate))
                    .unwrap_or(true)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn meta(predicate: &str) -> Meta {
        syn::parse_str(predicate).unwrap()
    }

    #[test]
    fn test_eval() {
        let cfgs = CfgSet::parse(&["unix", r#"feature = "logger""#, "target_os=linux"]);

        assert_eq!(cfgs.eval(&meta("unix")), Some(true));
        assert_eq!(cfgs.eval(&meta("windows")), Some(false));
        assert_eq!(cfgs.eval(&meta(r#"feature = "logger""#)), Some(true));
        assert_eq!(cfgs.eval(&meta(r#"target_os = "linux""#)), Some(true));
        assert_eq!(cfgs.eval(&meta(r#"all(unix, not(windows))"#)), Some(true));
        assert_eq!(cfgs.eval(&meta(r#"any(windows, feature = "assert")"#)), Some(false));
        assert_eq!(cfgs.eval(&meta("all()")), Some(true));
        assert_eq!(cfgs.eval(&meta("not(unix, windows)")), None);
        assert_eq!(cfgs.eval(&meta("version(1)")), None);
    }

    #[test]
    fn test_file_enabled() {
        let cfgs = CfgSet::parse(&["unix"]);
        let enabled = |source: &str| cfgs.file_enabled(&syn::parse_file(source).unwrap());

        assert!(enabled("#![cfg(unix)]\nfn f() {}"));
        assert!(!enabled("#![cfg(windows)]\nfn f() {}"));
        assert!(enabled("fn f() {}"));
        assert!(enabled("#![allow(dead_code)]\nfn f() {}"));
    }
}
