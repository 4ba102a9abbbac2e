pub mod generator;
pub mod options;

pub use generator::{generate, Generator, PackageReport, Stage};
pub use options::GeneratorOptions;
