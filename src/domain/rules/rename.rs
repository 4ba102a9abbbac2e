//! Rename-and-forward.
//!
//! A matching free function `old` is renamed to `new` and made private, and a wrapper
//! named `old` with the original visibility, docs and signature forwards to it. Call
//! sites of `old` are rewritten to `new`.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use quote::{format_ident, ToTokens};
use syn::{parse_quote, Expr, FnArg, GenericParam, Ident, Item, ItemFn, Pat, PatIdent, Visibility};

use crate::domain::coordinator::{from_fn, Composite};
use crate::domain::node::{callee, token_idents, Node};
use crate::domain::pipeline::EditPipeline;
use crate::error::EditError;

struct Renamer {
    filter: Box<dyn Fn(&str) -> Option<String>>,
    // Names this rule introduced; they are never renamed again.
    produced: HashSet<String>,
    error: Option<EditError>,
}

impl Renamer {
    fn target(&self, name: &str) -> Option<String> {
        if self.produced.contains(name) {
            return None;
        }
        (self.filter)(name).filter(|new_name| new_name != name)
    }

    fn ident(&mut self, name: String) -> Option<Ident> {
        match syn::parse_str::<Ident>(&name) {
            Ok(ident) => Some(ident),
            Err(_) => {
                self.error.get_or_insert(EditError::InvalidName { name });
                None
            }
        }
    }
}

/// Registers rename-and-forward for every free function `filter` maps to a new name.
pub fn rename_and_forward<F>(pipeline: &mut EditPipeline, filter: F)
where
    F: Fn(&str) -> Option<String> + 'static,
{
    let renamer = Rc::new(RefCell::new(Renamer {
        filter: Box::new(filter),
        produced: HashSet::new(),
        error: None,
    }));

    let declarations = renamer.clone();
    let calls = renamer.clone();
    pipeline.node(
        Composite::new()
            .with(from_fn(move |node| {
                if let Node::File(file) = node {
                    forward_declarations(&mut file.items, &mut declarations.borrow_mut());
                }
                false
            }))
            .with(from_fn(move |node| {
                if let Node::Call(call) = node {
                    rename_call(call, &mut calls.borrow_mut());
                }
                true
            })),
    );

    pipeline.after_edit(move |_| match renamer.borrow_mut().error.take() {
        Some(err) => Err(err),
        None => Ok(()),
    });
}

fn forward_declarations(items: &mut Vec<Item>, renamer: &mut Renamer) {
    let mut index = 0;
    while index < items.len() {
        let Item::Fn(function) = &items[index] else {
            index += 1;
            continue;
        };
        let Some(new_name) = renamer.target(&function.sig.ident.to_string()) else {
            index += 1;
            continue;
        };
        let function = function.clone();
        let Some(new_ident) = renamer.ident(new_name) else {
            return;
        };

        tracing::debug!(from = %function.sig.ident, to = %new_ident, "forwarding function");
        renamer.produced.insert(new_ident.to_string());
        let (internal, wrapper) = forward(function, new_ident);
        items[index] = Item::Fn(internal);
        items.insert(index + 1, Item::Fn(wrapper));
        index += 2;
    }
}

fn rename_call(call: &mut syn::ExprCall, renamer: &mut Renamer) {
    let Some(name) = callee(call).map(ToString::to_string) else {
        return;
    };
    let Some(new_name) = renamer.target(&name) else {
        return;
    };
    let Some(mut ident) = renamer.ident(new_name) else {
        return;
    };
    if let Expr::Path(path) = &mut *call.func {
        if let Some(segment) = path.path.segments.last_mut() {
            ident.set_span(segment.ident.span());
            segment.ident = ident;
        }
    }
}

/// Splits `function` into the renamed private implementation and its public wrapper.
pub fn forward(function: ItemFn, new_ident: Ident) -> (ItemFn, ItemFn) {
    let mut internal = function.clone();
    internal.sig.ident = new_ident.clone();
    internal.vis = Visibility::Inherited;
    internal.attrs.retain(|attr| !attr.path().is_ident("doc"));

    let mut wrapper = function;
    let mut args = Vec::new();
    for (position, input) in wrapper.sig.inputs.iter_mut().enumerate() {
        let FnArg::Typed(typed) = input else {
            continue;
        };
        let ident = match &mut *typed.pat {
            Pat::Ident(pat) if pat.subpat.is_none() && pat.by_ref.is_none() => {
                pat.mutability = None;
                pat.ident.clone()
            }
            _ => {
                let ident = format_ident!("arg{}", position);
                *typed.pat = Pat::Ident(PatIdent {
                    attrs: Vec::new(),
                    by_ref: None,
                    mutability: None,
                    ident: ident.clone(),
                    subpat: None,
                });
                ident
            }
        };
        args.push(ident);
    }

    let generic_args: Vec<&Ident> = wrapper
        .sig
        .generics
        .params
        .iter()
        .filter_map(|param| match param {
            GenericParam::Type(ty) => Some(&ty.ident),
            GenericParam::Const(constant) => Some(&constant.ident),
            GenericParam::Lifetime(_) => None,
        })
        .collect();
    // Explicit generic arguments are rejected when `impl Trait` appears in argument position.
    let impl_in_inputs = wrapper
        .sig
        .inputs
        .iter()
        .any(|input| token_idents(&input.to_token_stream()).iter().any(|ident| ident == "impl"));

    let mut call: Expr = if generic_args.is_empty() || impl_in_inputs {
        parse_quote!(#new_ident(#(#args),*))
    } else {
        parse_quote!(#new_ident::<#(#generic_args),*>(#(#args),*))
    };
    if wrapper.sig.asyncness.is_some() {
        call = parse_quote!(#call.await);
    }
    wrapper.block = Box::new(parse_quote!({ #call }));

    (internal, wrapper)
}

#[cfg(test)]
mod tests {
    use quote::quote;

    use super::*;
    use crate::domain::tree::SourceTree;

    fn renamed(source: &str) -> Result<Vec<String>, EditError> {
        fn option(pipeline: &mut EditPipeline) {
            rename_and_forward(pipeline, |name| name.strip_prefix("log_").map(|rest| format!("{}_impl", rest)));
        }
        let mut tree = SourceTree::parse(source).unwrap();
        EditPipeline::new("rename", &[option]).edit(&mut tree)?;
        Ok(tree.file.items.iter().map(|item| item.to_token_stream().to_string()).collect())
    }

    #[test]
    fn test_declaration_is_forwarded_and_calls_renamed() {
        let items = renamed(
            r#"
pub fn log_line(mut message: String, (a, b): (u8, u8)) {
    step(message);
}
pub fn caller() {
    log_line(String::new(), (1, 2));
}
"#,
        )
        .unwrap();

        assert_eq!(
            items,
            vec![
                quote! { fn line_impl(mut message: String, (a, b): (u8, u8)) { step(message); } }.to_string(),
                quote! { pub fn log_line(message: String, arg1: (u8, u8)) { line_impl(message, arg1) } }.to_string(),
                quote! { pub fn caller() { line_impl(String::new(), (1, 2)); } }.to_string(),
            ]
        );
    }

    #[test]
    fn test_generics_use_turbofish_unless_impl_trait() {
        let items = renamed(
            r#"
pub fn log_value<T: Debug, const N: usize>(value: [T; N]) {}
pub fn log_display(value: impl Display) {}
"#,
        )
        .unwrap();

        assert_eq!(
            items[1],
            quote! { pub fn log_value<T: Debug, const N: usize>(value: [T; N]) { value_impl::<T, N>(value) } }.to_string()
        );
        assert_eq!(
            items[3],
            quote! { pub fn log_display(value: impl Display) { display_impl(value) } }.to_string()
        );
    }

    #[test]
    fn test_async_wrapper_awaits() {
        let items = renamed("pub async fn log_flush() {}").unwrap();
        assert_eq!(items[1], quote! { pub async fn log_flush() { flush_impl().await } }.to_string());
    }

    #[test]
    fn test_docs_stay_on_wrapper() {
        let mut tree = SourceTree::parse("/// Writes a line.\npub fn log_line() {}").unwrap();
        let Item::Fn(function) = tree.file.items.remove(0) else {
            panic!("expected a function");
        };
        let (internal, wrapper) = forward(function, format_ident!("line_impl"));
        assert!(internal.attrs.is_empty());
        assert!(wrapper.attrs[0].path().is_ident("doc"));
    }

    #[test]
    fn test_invalid_name_fails() {
        fn option(pipeline: &mut EditPipeline) {
            rename_and_forward(pipeline, |name| (name == "log").then(|| "not valid".to_string()));
        }
        let mut tree = SourceTree::parse("pub fn log() {}").unwrap();
        let err = EditPipeline::new("rename", &[option]).edit(&mut tree).unwrap_err();
        assert_eq!(err, EditError::InvalidName { name: "not valid".to_string() });
    }
}
