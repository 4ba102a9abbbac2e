pub mod cfg;
pub mod coordinator;
pub mod node;
pub mod pipeline;
pub mod rules;
pub mod tree;
pub mod variant;
