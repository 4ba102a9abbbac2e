// Main library entry point for debugtwin.

pub mod application;
pub mod domain;
pub mod error;
pub mod infrastructure;
pub mod ports;

pub use application::{generate, Generator, GeneratorOptions, PackageReport, Stage};
pub use domain::coordinator::{from_fn, Composite, Coordinator, TopLevel};
pub use domain::node::{Node, NodeKind};
pub use domain::pipeline::{EditPipeline, PipelineOption};
pub use domain::tree::SourceTree;
pub use domain::variant::{Marker, Variant};
pub use error::{EditError, GenerateError, GenerationFailed, LoadError};
pub use ports::Inspector;
