use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::domain::variant::Marker;

/// Everything one generation run needs.
///
/// Loadable from TOML:
///
/// ```toml
/// sources = ["src/logger", "src/assert"]
/// output = "src/generated"
/// common = "src/common"
/// load_cfgs = ["unix"]
/// invocation = "debugtwin --config debugtwin.toml"
/// marker = { cfg = "debug_assertions" }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorOptions {
    /// Package directories, one output package each.
    pub sources: Vec<PathBuf>,
    /// Cfg flags evaluated against inner `#![cfg(...)]` of every input file.
    pub load_cfgs: Vec<String>,
    /// Root of the generated packages.
    pub output: PathBuf,
    /// Directory whose files are added to every package.
    pub common: Option<PathBuf>,
    pub marker: Marker,
    /// Written into the regenerate comment of each generated file.
    pub invocation: String,
    /// Worker threads; one per CPU when unset.
    pub threads: Option<usize>,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            sources: Vec::new(),
            load_cfgs: Vec::new(),
            output: PathBuf::from("generated"),
            common: None,
            marker: Marker::default(),
            invocation: "debugtwin".to_string(),
            threads: None,
        }
    }
}

impl GeneratorOptions {
    pub fn new(output: impl Into<PathBuf>) -> Self {
        Self {
            output: output.into(),
            ..Self::default()
        }
    }

    pub fn source(mut self, dir: impl Into<PathBuf>) -> Self {
        self.sources.push(dir.into());
        self
    }

    pub fn load_cfg(mut self, flag: impl Into<String>) -> Self {
        self.load_cfgs.push(flag.into());
        self
    }

    pub fn common(mut self, dir: impl Into<PathBuf>) -> Self {
        self.common = Some(dir.into());
        self
    }

    pub fn marker(mut self, marker: Marker) -> Self {
        self.marker = marker;
        self
    }

    pub fn invocation(mut self, invocation: impl Into<String>) -> Self {
        self.invocation = invocation.into();
        self
    }

    pub fn threads(mut self, threads: usize) -> Self {
        self.threads = Some(threads);
        self
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse generator options")
    }

    /// Reads options from a TOML file. Relative paths stay relative to the working
    /// directory, not to the file.
    pub fn from_toml_file(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read options file {}", path.display()))?;
        Self::from_toml_str(&text).with_context(|| format!("Invalid options file {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_toml_str() {
        let options = GeneratorOptions::from_toml_str(
            r#"
sources = ["src/logger", "src/assert"]
output = "out"
common = "src/common"
load_cfgs = ["unix", 'feature = "std"']
marker = { cfg = "debug_assertions" }
threads = 2
"#,
        )
        .unwrap();

        assert_eq!(
            options,
            GeneratorOptions::new("out")
                .source("src/logger")
                .source("src/assert")
                .common("src/common")
                .load_cfg("unix")
                .load_cfg(r#"feature = "std""#)
                .marker(Marker::Cfg("debug_assertions".to_string()))
                .threads(2)
        );
    }

    #[test]
    fn test_defaults_and_unknown_fields() {
        let options = GeneratorOptions::from_toml_str(r#"marker = "package_feature""#).unwrap();
        assert_eq!(options, GeneratorOptions::default());

        let err = GeneratorOptions::from_toml_str("colour = true").unwrap_err();
        assert!(format!("{:#}", err).contains("colour"));
    }

    #[test]
    fn test_from_missing_file() {
        let err = GeneratorOptions::from_toml_file(Path::new("/nonexistent/debugtwin.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read options file"));
    }
}
