//! Unused-import pruning.
//!
//! Three hooks share one [`ImportTable`]: the pre-pass snapshots the names bound by
//! top-level private `use` items, the node pass marks every bound name that is still
//! mentioned, and the post-pass rewrites each `use` tree down to the marked names.

use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use syn::visit_mut::{self, VisitMut};
use syn::{ExprMethodCall, File, Ident, Item, UseTree};

use crate::domain::coordinator::from_fn;
use crate::domain::node::{is_private, Node};
use crate::domain::pipeline::EditPipeline;

/// Names bound by the file's imports and the subset still referenced.
#[derive(Debug, Default)]
pub struct ImportTable {
    bound: HashSet<String>,
    required: HashSet<String>,
}

impl ImportTable {
    pub fn snapshot(file: &File) -> Self {
        let mut bound = HashSet::new();
        for item in &file.items {
            if let Item::Use(import) = item {
                if is_private(&import.vis) {
                    collect_bindings(&import.tree, None, &mut bound);
                }
            }
        }
        Self {
            bound,
            required: HashSet::new(),
        }
    }

    pub fn bound(&self) -> &HashSet<String> {
        &self.bound
    }

    pub fn mark(&mut self, name: &str) {
        if self.bound.contains(name) && !self.required.contains(name) {
            self.required.insert(name.to_string());
        }
    }

    /// Names bound after the snapshot was taken are never pruned.
    pub fn keeps(&self, name: &str) -> bool {
        !self.bound.contains(name) || self.required.contains(name)
    }
}

pub fn prune_unused_references(pipeline: &mut EditPipeline) {
    let table = Rc::new(RefCell::new(ImportTable::default()));

    let snapshot = table.clone();
    pipeline.before_edit(move |tree| {
        *snapshot.borrow_mut() = ImportTable::snapshot(&tree.file);
        Ok(())
    });

    let marks = table.clone();
    pipeline.node(from_fn(move |node| {
        let mut table = marks.borrow_mut();
        match node {
            // The import itself is not a use of its bindings.
            Node::Import(_) => return false,
            Node::Ident(ident) => table.mark(&ident.to_string()),
            Node::Macro(_) | Node::Attribute(_) => {
                for name in node.opaque_idents() {
                    table.mark(&name);
                }
            }
            _ => {}
        }
        true
    }));

    pipeline.after_edit(move |tree| {
        prune_imports(&mut tree.file, &table.borrow());
        Ok(())
    });
}

/// Rewrites private top-level imports down to the names `table` keeps.
pub fn prune_imports(file: &mut File, table: &ImportTable) {
    // Trait imports are used without being named; keep capitalised names while
    // method calls remain.
    let mut calls = MethodCalls::default();
    calls.visit_file_mut(file);
    let keep = |name: &str| table.keeps(name) || (calls.found && starts_uppercase(name));

    let before = file.items.len();
    file.items.retain_mut(|item| match item {
        Item::Use(import) if is_private(&import.vis) => retain_tree(&mut import.tree, None, &keep),
        _ => true,
    });
    if file.items.len() < before {
        tracing::debug!(removed = before - file.items.len(), "pruned unused imports");
    }
}

fn collect_bindings(tree: &UseTree, parent: Option<&Ident>, out: &mut HashSet<String>) {
    match tree {
        UseTree::Path(path) => collect_bindings(&path.tree, Some(&path.ident), out),
        UseTree::Name(name) => {
            if let Some(bound) = binding(&name.ident, parent) {
                out.insert(bound);
            }
        }
        UseTree::Rename(rename) if rename.rename != "_" => {
            out.insert(rename.rename.to_string());
        }
        UseTree::Group(group) => {
            for tree in &group.items {
                collect_bindings(tree, parent, out);
            }
        }
        UseTree::Rename(_) | UseTree::Glob(_) => {}
    }
}

fn retain_tree(tree: &mut UseTree, parent: Option<&Ident>, keep: &dyn Fn(&str) -> bool) -> bool {
    match tree {
        UseTree::Path(path) => retain_tree(&mut path.tree, Some(&path.ident), keep),
        UseTree::Name(name) => binding(&name.ident, parent).map_or(true, |bound| keep(&bound)),
        UseTree::Rename(rename) => rename.rename == "_" || keep(&rename.rename.to_string()),
        UseTree::Glob(_) => true,
        UseTree::Group(group) => {
            let items = std::mem::take(&mut group.items);
            group.items = items
                .into_iter()
                .filter_map(|mut tree| retain_tree(&mut tree, parent, keep).then_some(tree))
                .collect();
            !group.items.is_empty()
        }
    }
}

/// `self` in a group binds the enclosing path segment.
fn binding(ident: &Ident, parent: Option<&Ident>) -> Option<String> {
    if ident == "self" {
        parent.map(ToString::to_string)
    } else {
        Some(ident.to_string())
    }
}

fn starts_uppercase(name: &str) -> bool {
    name.chars().next().is_some_and(char::is_uppercase)
}

#[derive(Default)]
struct MethodCalls {
    found: bool,
}

impl VisitMut for MethodCalls {
    fn visit_expr_method_call_mut(&mut self, call: &mut ExprMethodCall) {
        self.found = true;
        visit_mut::visit_expr_method_call_mut(self, call);
    }
}

#[cfg(test)]
mod tests {
    use quote::ToTokens;

    use super::*;
    use crate::domain::tree::SourceTree;

    fn pruned(source: &str) -> Vec<String> {
        let mut tree = SourceTree::parse(source).unwrap();
        let mut pipeline = EditPipeline::new("prune", &[prune_unused_references]);
        pipeline.edit(&mut tree).unwrap();
        imports(&tree.file)
    }

    fn imports(file: &File) -> Vec<String> {
        file.items
            .iter()
            .filter_map(|item| match item {
                Item::Use(import) => Some(import.tree.to_token_stream().to_string().replace(' ', "")),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn test_unreferenced_import_is_removed() {
        let kept = pruned(
            r#"
use std::fmt;
use std::collections::HashMap;

pub fn show(args: fmt::Arguments<'_>) {}
"#,
        );
        assert_eq!(kept, vec!["std::fmt"]);
    }

    #[test]
    fn test_group_is_narrowed_in_order() {
        let kept = pruned(
            r#"
use std::{fmt, io::{self, Read}, collections::HashMap, sync::Arc};

pub fn run(a: Arc<u8>, r: &mut dyn Read) { io::stdout(); }
fn show(args: fmt::Arguments<'_>) {}
"#,
        );
        assert_eq!(kept, vec!["std::{fmt,io::{self,Read},sync::Arc}"]);
    }

    #[test]
    fn test_glob_underscore_and_public_imports_stay() {
        let kept = pruned(
            r#"
use std::prelude::*;
use std::io::Write as _;
pub use std::fmt::Debug;
use std::fmt::Display as Shown;
"#,
        );
        assert_eq!(kept, vec!["std::prelude::*", "std::io::Writeas_", "std::fmt::Debug"]);
    }

    #[test]
    fn test_macro_arguments_count_as_references() {
        let kept = pruned(
            r#"
use std::env;
pub fn show() { println!("{:?}", env::args()); }
"#,
        );
        assert_eq!(kept, vec!["std::env"]);
    }

    #[test]
    fn test_derive_arguments_count_as_references() {
        let kept = pruned(
            r#"
use serde::{Deserialize, Serialize};
use std::fmt::Debug;
use std::collections::HashMap;

#[derive(Serialize)]
#[cfg_attr(test, derive(Debug))]
pub struct Event {
    pub id: u64,
}

pub fn log(event: &Event) {}
"#,
        );
        assert_eq!(kept, vec!["serde::{Serialize}", "std::fmt::Debug"]);
    }

    #[test]
    fn test_trait_imports_survive_method_calls() {
        let kept = pruned(
            r#"
use std::fmt::Write;
use std::mem;
fn render() -> String {
    let mut out = String::new();
    let _ = out.write_str("x");
    out
}
"#,
        );
        assert_eq!(kept, vec!["std::fmt::Write"]);
    }

    #[test]
    fn test_pruning_is_idempotent() {
        let source = r#"
use std::fmt;
use std::io::{self, Write};
pub fn show(args: fmt::Arguments<'_>) {}
"#;
        let mut tree = SourceTree::parse(source).unwrap();
        EditPipeline::new("prune", &[prune_unused_references]).edit(&mut tree).unwrap();
        let once = imports(&tree.file);
        EditPipeline::new("prune", &[prune_unused_references]).edit(&mut tree).unwrap();
        assert_eq!(imports(&tree.file), once);
        assert_eq!(once, vec!["std::fmt"]);
    }

    #[test]
    fn test_snapshot_bindings() {
        let file: File = syn::parse_str("use a::{b::{self, C}, d as e, f::*, g as _}; pub use h::I;").unwrap();
        let table = ImportTable::snapshot(&file);
        let mut bound: Vec<&String> = table.bound().iter().collect();
        bound.sort();
        assert_eq!(bound, vec!["C", "b", "e"]);
    }
}
