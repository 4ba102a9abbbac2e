// Syntax node union handed to inspectors.
// Every variant borrows one node of a syn tree mutably for the duration of a single
// inspector call; the coordinator owns the walk itself.

use proc_macro2::{TokenStream, TokenTree};
use syn::{Attribute, Expr, ExprCall, File, Ident, ImplItemFn, Item, ItemFn, ItemUse, Macro, Meta, Visibility};

/// Kind tag of a [`Node`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    File,
    Declaration,
    Function,
    Method,
    Import,
    Call,
    Macro,
    Attribute,
    Comment,
    Ident,
}

/// A node visited by the coordinator.
#[derive(Debug)]
pub enum Node<'a> {
    /// The whole source file.
    File(&'a mut File),
    /// Any item that is neither a free function nor a `use`.
    Declaration(&'a mut Item),
    /// A free function.
    Function(&'a mut ItemFn),
    /// A function inside an `impl` block.
    Method(&'a mut ImplItemFn),
    /// A `use` item; its bindings are import bindings.
    Import(&'a mut ItemUse),
    /// A call expression `f(args)`.
    Call(&'a mut ExprCall),
    /// A macro invocation. Its token stream is not walked.
    Macro(&'a mut Macro),
    /// Any attribute other than a doc comment. Its argument tokens are not walked;
    /// see [`Node::opaque_idents`].
    Attribute(&'a mut Attribute),
    /// A doc comment (`///`, `//!` or `#[doc = ...]`).
    Comment(&'a mut Attribute),
    Ident(&'a mut Ident),
}

impl<'a> Node<'a> {
    /// Wraps a top-level item into the node kind the coordinator would report for it.
    pub fn from_item(item: &'a mut Item) -> Self {
        match item {
            Item::Fn(function) => Node::Function(function),
            Item::Use(import) => Node::Import(import),
            _ => Node::Declaration(item),
        }
    }

    pub fn kind(&self) -> NodeKind {
        match self {
            Node::File(_) => NodeKind::File,
            Node::Declaration(_) => NodeKind::Declaration,
            Node::Function(_) => NodeKind::Function,
            Node::Method(_) => NodeKind::Method,
            Node::Import(_) => NodeKind::Import,
            Node::Call(_) => NodeKind::Call,
            Node::Macro(_) => NodeKind::Macro,
            Node::Attribute(_) => NodeKind::Attribute,
            Node::Comment(_) => NodeKind::Comment,
            Node::Ident(_) => NodeKind::Ident,
        }
    }

    /// Name of the declared or referenced symbol, when the node carries one.
    pub fn name(&self) -> Option<String> {
        match self {
            Node::Function(function) => Some(function.sig.ident.to_string()),
            Node::Method(method) => Some(method.sig.ident.to_string()),
            Node::Declaration(item) => declared_ident(item).map(ToString::to_string),
            Node::Call(call) => callee(call).map(ToString::to_string),
            Node::Macro(mac) => mac.path.segments.last().map(|s| s.ident.to_string()),
            Node::Attribute(attr) => attr.path().segments.last().map(|s| s.ident.to_string()),
            Node::Ident(ident) => Some(ident.to_string()),
            Node::File(_) | Node::Import(_) | Node::Comment(_) => None,
        }
    }

    /// Identifiers hidden in opaque token streams: macro arguments and the
    /// arguments of list attributes such as `derive(..)` or `cfg_attr(..)`.
    pub fn opaque_idents(&self) -> Vec<String> {
        match self {
            Node::Macro(mac) => token_idents(&mac.tokens),
            Node::Attribute(attr) => match &attr.meta {
                Meta::List(list) => token_idents(&list.tokens),
                Meta::Path(_) | Meta::NameValue(_) => Vec::new(),
            },
            _ => Vec::new(),
        }
    }
}

/// Identifier introduced by a declaration item, if it introduces one.
pub fn declared_ident(item: &Item) -> Option<&Ident> {
    match item {
        Item::Const(i) => Some(&i.ident),
        Item::Enum(i) => Some(&i.ident),
        Item::ExternCrate(i) => Some(&i.ident),
        Item::Fn(i) => Some(&i.sig.ident),
        Item::Macro(i) => i.ident.as_ref(),
        Item::Mod(i) => Some(&i.ident),
        Item::Static(i) => Some(&i.ident),
        Item::Struct(i) => Some(&i.ident),
        Item::Trait(i) => Some(&i.ident),
        Item::TraitAlias(i) => Some(&i.ident),
        Item::Type(i) => Some(&i.ident),
        Item::Union(i) => Some(&i.ident),
        _ => None,
    }
}

/// `pub(self)` and `pub(in self)` are as private as no visibility at all.
pub fn is_private(vis: &Visibility) -> bool {
    match vis {
        Visibility::Inherited => true,
        Visibility::Restricted(restricted) => restricted.path.is_ident("self"),
        Visibility::Public(_) => false,
    }
}

/// Callee of `name(args)`; `None` for qualified paths, methods and closures.
pub fn callee(call: &ExprCall) -> Option<&Ident> {
    match &*call.func {
        Expr::Path(path) if path.qself.is_none() => path.path.get_ident(),
        _ => None,
    }
}

/// Identifiers appearing anywhere in a token stream, including nested groups.
///
/// Macro arguments are opaque to syn, so references hidden inside them are only
/// visible at the token level.
pub fn token_idents(tokens: &TokenStream) -> Vec<String> {
    let mut idents = Vec::new();
    collect_token_idents(tokens.clone(), &mut idents);
    idents
}

fn collect_token_idents(tokens: TokenStream, out: &mut Vec<String>) {
    for tree in tokens {
        match tree {
            TokenTree::Ident(ident) => out.push(ident.to_string()),
            TokenTree::Group(group) => collect_token_idents(group.stream(), out),
            TokenTree::Punct(_) | TokenTree::Literal(_) => {}
        }
    }
}
