use quote::ToTokens;
use syn::{parse_quote, Attribute, FnArg, ImplItem, Item, ReturnType, Signature, Type, Visibility};

use crate::domain::node::is_private;
use crate::domain::pipeline::EditPipeline;
use crate::domain::tree::SourceTree;
use crate::error::EditError;

/// Empties the body of every free function and inherent method returning `()`.
pub fn strip_function_body(pipeline: &mut EditPipeline) {
    pipeline.before_edit(strip_bodies);
}

pub fn strip_bodies(tree: &mut SourceTree) -> Result<(), EditError> {
    for item in tree.file.items.iter_mut() {
        match item {
            Item::Fn(function) => {
                strip(&function.vis, &function.sig, &mut function.attrs, &mut function.block.stmts)?;
            }
            // Trait impls must keep matching the trait signature and contract.
            Item::Impl(block) if block.trait_.is_none() => {
                for member in block.items.iter_mut() {
                    if let ImplItem::Fn(method) = member {
                        strip(&method.vis, &method.sig, &mut method.attrs, &mut method.block.stmts)?;
                    }
                }
            }
            _ => {}
        }
    }
    Ok(())
}

fn strip(vis: &Visibility, sig: &Signature, attrs: &mut Vec<Attribute>, stmts: &mut Vec<syn::Stmt>) -> Result<(), EditError> {
    if returns_unit(&sig.output) {
        stmts.clear();
        if has_typed_inputs(sig) && !allows_unused_variables(attrs) {
            attrs.push(parse_quote!(#[allow(unused_variables)]));
        }
        return Ok(());
    }

    if is_private(vis) {
        return Ok(());
    }

    let ReturnType::Type(_, ty) = &sig.output else {
        return Ok(());
    };
    Err(EditError::Validation {
        function: sig.ident.to_string(),
        reason: format!("declares return type `{}`", ty.to_token_stream()),
    })
}

/// `-> ()` and a missing return type both count as unit; `!` does not.
pub fn returns_unit(output: &ReturnType) -> bool {
    match output {
        ReturnType::Default => true,
        ReturnType::Type(_, ty) => is_unit(ty),
    }
}

fn is_unit(ty: &Type) -> bool {
    match ty {
        Type::Tuple(tuple) => tuple.elems.is_empty(),
        Type::Paren(paren) => is_unit(&paren.elem),
        _ => false,
    }
}

fn has_typed_inputs(sig: &Signature) -> bool {
    sig.inputs.iter().any(|input| matches!(input, FnArg::Typed(_)))
}

fn allows_unused_variables(attrs: &[Attribute]) -> bool {
    attrs.iter().any(|attr| {
        attr.path().is_ident("allow")
            && attr
                .meta
                .require_list()
                .map(|list| list.tokens.to_string().contains("unused_variables"))
                .unwrap_or(false)
    })
}
