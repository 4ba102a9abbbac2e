// Infrastructure implementations for debugtwin.

pub mod concurrency;
pub mod package_loader;

use syn::{File, Item};

use crate::domain::tree::{item_line, Anchor, CommentGroup, SourceTree};
use crate::ports::{SourceParser, SourcePrinter};

pub struct SynParser;

impl SourceParser for SynParser {
    fn parse(&self, source: &str) -> syn::Result<SourceTree> {
        SourceTree::parse(source)
    }
}

/// Prints with prettyplease and puts the recorded comment groups back above their items.
pub struct PrettyPrinter;

impl SourcePrinter for PrettyPrinter {
    fn print(&self, tree: &SourceTree) -> String {
        let mut out = String::new();
        let mut printed = vec![false; tree.comments.len()];

        if !tree.file.attrs.is_empty() {
            out.push_str(&unparse(tree.file.attrs.clone(), Vec::new()));
            out.push('\n');
        }

        for (index, group) in tree.comments.iter().enumerate() {
            if group.anchor == Anchor::Header {
                push_group(&mut out, group);
                out.push('\n');
                printed[index] = true;
            }
        }

        let mut previous: Option<&Item> = None;
        for item in &tree.file.items {
            let line = item_line(item);
            let adjacent_imports = matches!((previous, item), (Some(Item::Use(_)), Item::Use(_)));
            if previous.is_some() && !adjacent_imports {
                out.push('\n');
            }

            // Floating groups keep their blank line, attached groups sit on the item.
            for (index, group) in tree.comments.iter().enumerate() {
                if !printed[index] && group.anchor == (Anchor::Detached { before: Some(line) }) {
                    push_group(&mut out, group);
                    out.push('\n');
                    printed[index] = true;
                }
            }
            for (index, group) in tree.comments.iter().enumerate() {
                if !printed[index] && group.anchor == Anchor::Item(line) {
                    push_group(&mut out, group);
                    printed[index] = true;
                }
            }

            out.push_str(&unparse(Vec::new(), vec![item.clone()]));
            previous = Some(item);
        }

        let mut rest = tree.comments.iter().zip(&printed).filter(|(_, done)| !**done).peekable();
        if rest.peek().is_some() && previous.is_some() {
            out.push('\n');
        }
        for (group, _) in rest {
            push_group(&mut out, group);
        }

        out
    }
}

fn unparse(attrs: Vec<syn::Attribute>, items: Vec<Item>) -> String {
    prettyplease::unparse(&File {
        shebang: None,
        attrs,
        items,
    })
}

fn push_group(out: &mut String, group: &CommentGroup) {
    for line in &group.lines {
        out.push_str(line);
        out.push('\n');
    }
}
