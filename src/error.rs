//! Error taxonomy for debugtwin.
//!
//! - `EditError`: an edit hook refused to produce a variant (authoring-contract violation).
//! - `LoadError`: a package directory or one of its files could not be loaded.
//! - `GenerateError`: one failure recorded by the generator, with package and file context.
//! - `GenerationFailed`: every failure of a run, reported together after the join.

use std::path::PathBuf;

use thiserror::Error;

/// Raised by a pipeline hook; aborts the edit of the current tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EditError {
    /// Stripping would leave a value-returning exported function without a body.
    #[error("exported function `{function}` cannot be stripped: {reason}")]
    Validation { function: String, reason: String },

    /// A rename filter produced something that is not a Rust identifier.
    #[error("`{name}` is not a valid function name")]
    InvalidName { name: String },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("package path {0} does not exist")]
    Missing(PathBuf),

    #[error("package path {0} is not a directory")]
    NotADirectory(PathBuf),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // syn errors carry spans, so only the rendered message crosses worker threads.
    #[error("failed to parse {path} (line {line}): {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },
}

/// One failure recorded during generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("package `{package}`: {source}")]
    Load {
        package: String,
        #[source]
        source: LoadError,
    },

    #[error("package `{package}`, file `{file}`: {source}")]
    Validation {
        package: String,
        file: String,
        #[source]
        source: EditError,
    },

    #[error("package `{package}`, file {}: write failed: {source}", .file.display())]
    Write {
        package: String,
        file: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("package `{package}`, file `{file}`: {reason}")]
    ModuleName {
        package: String,
        file: String,
        reason: String,
    },

    #[error("package `{package}`: {} has the same name as {}", .dir.display(), .first.display())]
    DuplicatePackage {
        package: String,
        dir: PathBuf,
        first: PathBuf,
    },

    #[error("output path {0} exists and is not a directory")]
    OutputNotADirectory(PathBuf),

    #[error("failed to build the package worker pool: {0}")]
    Pool(#[from] rayon::ThreadPoolBuildError),
}

impl GenerateError {
    /// Package the error belongs to, if any.
    pub fn package(&self) -> Option<&str> {
        match self {
            GenerateError::Load { package, .. }
            | GenerateError::Validation { package, .. }
            | GenerateError::Write { package, .. }
            | GenerateError::ModuleName { package, .. }
            | GenerateError::DuplicatePackage { package, .. } => Some(package),
            GenerateError::OutputNotADirectory(_) | GenerateError::Pool(_) => None,
        }
    }
}

/// Every error of one generation run.
#[derive(Debug, Error)]
#[error("{} error(s) occurred during code generation:{}", .errors.len(), bullet_list(.errors))]
pub struct GenerationFailed {
    pub errors: Vec<GenerateError>,
}

fn bullet_list(errors: &[GenerateError]) -> String {
    errors.iter().map(|error| format!("\n\t{}", error)).collect()
}
