use crate::domain::node::Node;
use crate::domain::tree::SourceTree;

/// Visits one node and decides whether to keep descending into its children.
///
/// Returning `false` excludes this inspector from the node's descendants only;
/// other inspectors keep walking, and this one resumes after the subtree.
pub trait Inspector {
    fn inspect(&mut self, node: &mut Node<'_>) -> bool;
}

/// Turns source text into a tree.
pub trait SourceParser {
    fn parse(&self, source: &str) -> syn::Result<SourceTree>;
}

/// Turns a tree back into source text.
pub trait SourcePrinter {
    fn print(&self, tree: &SourceTree) -> String;
}
