//! Reusable edit rules. Each module exposes pipeline options plus the underlying
//! tree passes, so rules can be composed into any pipeline.

pub mod dead_code;
pub mod orphan_comments;
pub mod prune;
pub mod rename;
pub mod strip_body;

pub use dead_code::remove_dead_private_functions;
pub use orphan_comments::remove_orphan_comments;
pub use prune::prune_unused_references;
pub use rename::rename_and_forward;
pub use strip_body::strip_function_body;
