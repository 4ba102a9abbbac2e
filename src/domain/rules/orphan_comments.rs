use crate::domain::pipeline::EditPipeline;
use crate::domain::tree::{Anchor, SourceTree};
use crate::error::EditError;

pub fn remove_orphan_comments(pipeline: &mut EditPipeline) {
    pipeline.after_edit(drop_orphans);
}

/// Keeps the file header, comments sitting on an item that still exists, and
/// floating comments whose following item still exists. Trailing comments go.
pub fn drop_orphans(tree: &mut SourceTree) -> Result<(), EditError> {
    let retained = tree.retained_anchors();
    tree.comments.retain(|group| match group.anchor {
        Anchor::Header => true,
        Anchor::Item(line) => retained.contains(&line),
        Anchor::Detached { before: Some(line) } => retained.contains(&line),
        Anchor::Detached { before: None } => false,
    });
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_comments_of_removed_items_are_dropped() {
        let mut tree = SourceTree::parse(
            r#"// Header.

// About fmt.
use std::fmt;
// About io.
use std::io;

// Floating.

// About log.
pub fn log() {}
// Trailing.
"#,
        )
        .unwrap();
        tree.file.items.remove(1);

        drop_orphans(&mut tree).unwrap();
        let kept: Vec<&str> = tree.comments.iter().map(|group| group.lines[0].as_str()).collect();
        assert_eq!(kept, vec!["// Header.", "// About fmt.", "// Floating.", "// About log."]);
    }

    #[test]
    fn test_section_divider_follows_the_next_item() {
        let source = r#"pub fn first() {}

// ---- Section two ----

pub fn second() {}
"#;
        let mut tree = SourceTree::parse(source).unwrap();
        drop_orphans(&mut tree).unwrap();
        assert_eq!(tree.comments.len(), 1);

        tree.file.items.remove(1);
        drop_orphans(&mut tree).unwrap();
        assert!(tree.comments.is_empty());
    }
}
