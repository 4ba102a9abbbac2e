//! Source tree: a syn file plus the free-standing comments syn discards.
//!
//! Plain `//` comments between top-level items are kept as comment groups anchored to
//! the item they sit on, so the printer can put them back and the production pipeline
//! can drop the ones whose item was removed. Comments inside item bodies are lost.

use std::collections::HashSet;

use syn::spanned::Spanned;
use syn::{File, Item};

/// Where a comment group belongs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Anchor {
    /// File-level comment above the first item, separated from it by a blank line.
    Header,
    /// Directly above the item starting at this source line.
    Item(usize),
    /// Floating between items; `before` is the start line of the next item.
    Detached { before: Option<usize> },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommentGroup {
    pub lines: Vec<String>,
    pub anchor: Anchor,
}

/// A parsed file as seen by edit pipelines.
#[derive(Debug, Clone)]
pub struct SourceTree {
    pub file: File,
    pub comments: Vec<CommentGroup>,
}

impl SourceTree {
    pub fn parse(source: &str) -> syn::Result<Self> {
        let file = syn::parse_file(source)?;
        let comments = comment_groups(source, &file.items);
        Ok(Self { file, comments })
    }

    /// Start lines of the items still present in the tree.
    pub fn retained_anchors(&self) -> HashSet<usize> {
        self.file.items.iter().map(item_line).collect()
    }
}

/// Source line an item starts on, outer attributes and doc comments included.
pub fn item_line(item: &Item) -> usize {
    item.span().start().line
}

fn comment_groups(source: &str, items: &[Item]) -> Vec<CommentGroup> {
    let ranges: Vec<(usize, usize)> = items
        .iter()
        .map(|item| {
            let span = item.span();
            (span.start().line, span.end().line)
        })
        .collect();
    let inside_item = |line: usize| ranges.iter().any(|&(start, end)| line >= start && line <= end);
    let next_item = |line: usize| ranges.iter().map(|&(start, _)| start).find(|&start| start > line);
    let first_item = ranges.first().map(|&(start, _)| start);

    let mut groups = Vec::new();
    let mut current: Vec<String> = Vec::new();
    let mut last_line = 0;

    for (index, text) in source.lines().enumerate() {
        let line = index + 1;
        let trimmed = text.trim();
        if is_plain_comment(trimmed) && !inside_item(line) {
            current.push(trimmed.to_string());
            last_line = line;
            continue;
        }
        if !current.is_empty() {
            let lines = std::mem::take(&mut current);
            groups.push(anchor_group(lines, last_line, next_item(last_line), first_item));
        }
    }
    if !current.is_empty() {
        groups.push(anchor_group(current, last_line, None, first_item));
    }

    groups
}

fn anchor_group(lines: Vec<String>, last_line: usize, next_item: Option<usize>, first_item: Option<usize>) -> CommentGroup {
    let anchor = match next_item {
        Some(start) if start == last_line + 1 => Anchor::Item(start),
        // Above the first item, or in a file without items.
        next if next == first_item => Anchor::Header,
        before => Anchor::Detached { before },
    };
    CommentGroup { lines, anchor }
}

fn is_plain_comment(line: &str) -> bool {
    if !line.starts_with("//") {
        return false;
    }
    let is_doc = (line.starts_with("///") && !line.starts_with("////")) || line.starts_with("//!");
    !is_doc
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = r#"// Package-level notes.

// fmt is used in function parameters.
use std::fmt;
// io::Write is only used in function bodies.
use std::io::Write;

// A floating remark.

/// Doc comments stay on the item.
pub fn println(args: fmt::Arguments<'_>) {
    // Lost with the body.
    let _ = std::io::stderr().write_fmt(args);
}
// Trailing note.
"#;

    #[test]
    fn test_comment_groups_are_anchored() {
        let tree = SourceTree::parse(SOURCE).unwrap();
        let anchors: Vec<(&str, &Anchor)> = tree
            .comments
            .iter()
            .map(|group| (group.lines[0].as_str(), &group.anchor))
            .collect();

        assert_eq!(
            anchors,
            vec![
                ("// Package-level notes.", &Anchor::Header),
                ("// fmt is used in function parameters.", &Anchor::Item(4)),
                ("// io::Write is only used in function bodies.", &Anchor::Item(6)),
                ("// A floating remark.", &Anchor::Detached { before: Some(10) }),
                ("// Trailing note.", &Anchor::Detached { before: None }),
            ]
        );
    }

    #[test]
    fn test_body_comments_are_not_collected() {
        let tree = SourceTree::parse(SOURCE).unwrap();
        assert!(tree.comments.iter().all(|g| g.lines.iter().all(|l| !l.contains("Lost with the body"))));
    }

    #[test]
    fn test_retained_anchors_follow_items() {
        let mut tree = SourceTree::parse(SOURCE).unwrap();
        assert_eq!(tree.retained_anchors(), HashSet::from([4, 6, 10]));

        tree.file.items.remove(1);
        assert_eq!(tree.retained_anchors(), HashSet::from([4, 10]));
    }

    #[test]
    fn test_doc_comments_are_not_plain() {
        assert!(is_plain_comment("// note"));
        assert!(is_plain_comment("//// divider"));
        assert!(!is_plain_comment("/// docs"));
        assert!(!is_plain_comment("//! module docs"));
        assert!(!is_plain_comment("let x = 1; // trailing"));
    }
}
