use std::collections::{BTreeSet, HashSet};

use syn::Item;

use crate::domain::coordinator::{from_fn, Coordinator};
use crate::domain::node::{is_private, Node};
use crate::domain::pipeline::EditPipeline;
use crate::domain::tree::SourceTree;
use crate::error::EditError;
use crate::ports::Inspector;

// Attributes that don't make a function reachable from outside the file.
const INERT_ATTRIBUTES: &[&str] = &["doc", "allow", "inline", "must_use"];

/// Drops private free functions nothing retained refers to anymore.
pub fn remove_dead_private_functions(pipeline: &mut EditPipeline) {
    pipeline.before_edit(remove_dead_functions);
}

pub fn remove_dead_functions(tree: &mut SourceTree) -> Result<(), EditError> {
    let references: Vec<HashSet<String>> = tree.file.items.iter_mut().map(referenced_names).collect();
    let candidates: Vec<Option<String>> = tree.file.items.iter().map(candidate_name).collect();

    let mut live: Vec<bool> = candidates.iter().map(Option::is_none).collect();
    let mut reached: BTreeSet<usize> = (0..live.len()).filter(|&index| live[index]).collect();

    while let Some(index) = reached.pop_first() {
        for (other, name) in candidates.iter().enumerate() {
            let Some(name) = name else { continue };
            if !live[other] && references[index].contains(name) {
                live[other] = true;
                reached.insert(other);
            }
        }
    }

    let before = tree.file.items.len();
    let mut index = 0;
    tree.file.items.retain(|_| {
        let keep = live[index];
        index += 1;
        keep
    });
    let removed = before - tree.file.items.len();
    if removed > 0 {
        tracing::debug!(removed, "removed unreferenced private functions");
    }
    Ok(())
}

fn candidate_name(item: &Item) -> Option<String> {
    let Item::Fn(function) = item else {
        return None;
    };
    let inert = function
        .attrs
        .iter()
        .all(|attr| INERT_ATTRIBUTES.iter().any(|name| attr.path().is_ident(name)));
    if !is_private(&function.vis) || function.sig.ident == "main" || !inert {
        return None;
    }
    Some(function.sig.ident.to_string())
}

/// Every identifier an item mentions, macro arguments included.
pub fn referenced_names(item: &mut Item) -> HashSet<String> {
    let mut names = HashSet::new();
    {
        let mut collector = from_fn(|node| {
            match node {
                Node::Ident(ident) => {
                    names.insert(ident.to_string());
                }
                Node::Macro(_) | Node::Attribute(_) => names.extend(node.opaque_idents()),
                _ => {}
            }
            true
        });
        let mut coordinator = Coordinator::new([&mut collector as &mut dyn Inspector]);
        coordinator.inspect(item);
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::node::declared_ident;

    fn remaining(source: &str) -> Vec<String> {
        let mut tree = SourceTree::parse(source).unwrap();
        remove_dead_functions(&mut tree).unwrap();
        tree.file
            .items
            .iter()
            .filter_map(|item| declared_ident(item).map(ToString::to_string))
            .collect()
    }

    #[test]
    fn test_unreferenced_helpers_are_removed() {
        let names = remaining(
            r#"
pub fn log() {}
fn format_line() -> String { String::new() }
fn unused() {}
"#,
        );
        assert_eq!(names, vec!["log"]);
    }

    #[test]
    fn test_reachability_is_transitive() {
        let names = remaining(
            r#"
pub fn log() -> String { outer() }
fn outer() -> String { inner() }
fn inner() -> String { String::new() }
fn orphan() -> String { inner() }
"#,
        );
        assert_eq!(names, vec!["log", "outer", "inner"]);
    }

    #[test]
    fn test_macro_references_count() {
        let names = remaining(
            r#"
pub fn log() { println!("{}", prefix()); }
fn prefix() -> &'static str { "debug" }
"#,
        );
        assert_eq!(names, vec!["log", "prefix"]);
    }

    #[test]
    fn test_attribute_arguments_count() {
        let names = remaining(
            r#"
#[hook(on_flush)]
pub struct Flusher;
fn on_flush() {}
fn unused() {}
"#,
        );
        assert_eq!(names, vec!["Flusher", "on_flush"]);
    }

    #[test]
    fn test_entry_points_and_attributed_functions_stay() {
        let names = remaining(
            r#"
fn main() {}
#[no_mangle]
fn exported_symbol() {}
#[inline]
fn unused() {}
"#,
        );
        assert_eq!(names, vec!["main", "exported_symbol"]);
    }
}
