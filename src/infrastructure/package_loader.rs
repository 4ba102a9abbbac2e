use std::fs;
use std::path::{Path, PathBuf};

use crate::domain::cfg::CfgSet;
use crate::domain::tree::SourceTree;
use crate::error::LoadError;
use crate::ports::SourceParser;

/// Raw contents of one source file.
#[derive(Debug, Clone)]
pub struct SourceText {
    /// File name, e.g. `logger.rs`.
    pub name: String,
    pub path: PathBuf,
    pub text: String,
}

/// A parsed source file of a package.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    /// File name without `.rs`; names the generated module.
    pub stem: String,
    pub path: PathBuf,
    pub tree: SourceTree,
}

#[derive(Debug, Clone)]
pub struct Package {
    pub name: String,
    pub dir: PathBuf,
    pub files: Vec<SourceFile>,
}

pub struct PackageLoader<'a> {
    cfgs: &'a CfgSet,
    parser: &'a dyn SourceParser,
}

impl<'a> PackageLoader<'a> {
    pub fn new(cfgs: &'a CfgSet, parser: &'a dyn SourceParser) -> Self {
        Self { cfgs, parser }
    }

    /// Loads the `.rs` files of `dir` (sorted by name, `mod.rs` excluded) followed by
    /// the `common` files whose names the package does not already use.
    pub fn load(&self, dir: &Path, common: &[SourceText]) -> Result<Package, LoadError> {
        let name = package_name(dir);
        let mut texts = read_sources(dir)?;

        for shared in common {
            if texts.iter().any(|text| text.name == shared.name) {
                tracing::warn!(package = %name, file = %shared.name, "package already has a file of this name, skipping common file");
                continue;
            }
            texts.push(shared.clone());
        }

        let mut files = Vec::with_capacity(texts.len());
        for text in &texts {
            if let Some(file) = self.parse_text(text)? {
                files.push(file);
            }
        }

        tracing::debug!(package = %name, files = files.len(), "package loaded");
        Ok(Package {
            name,
            dir: dir.to_path_buf(),
            files,
        })
    }

    /// Parses one file; `None` when its inner cfg excludes it under the load flags.
    pub fn parse_text(&self, text: &SourceText) -> Result<Option<SourceFile>, LoadError> {
        let tree = self.parser.parse(&text.text).map_err(|err| LoadError::Parse {
            path: text.path.clone(),
            line: err.span().start().line,
            message: err.to_string(),
        })?;

        if !self.cfgs.file_enabled(&tree.file) {
            tracing::debug!(file = %text.path.display(), "excluded by load cfgs");
            return Ok(None);
        }

        Ok(Some(SourceFile {
            name: text.name.clone(),
            stem: stem(&text.name).to_string(),
            path: text.path.clone(),
            tree,
        }))
    }
}

/// Reads every `.rs` file directly inside `dir`, sorted by file name.
pub fn read_sources(dir: &Path) -> Result<Vec<SourceText>, LoadError> {
    if !dir.exists() {
        return Err(LoadError::Missing(dir.to_path_buf()));
    }
    if !dir.is_dir() {
        return Err(LoadError::NotADirectory(dir.to_path_buf()));
    }

    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| LoadError::Io { path, source }
    };

    let mut texts = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_err(dir))? {
        let path = entry.map_err(io_err(dir))?.path();
        if !path.is_file() || path.extension().map_or(true, |ext| ext != "rs") {
            continue;
        }
        let Some(name) = path.file_name().map(|name| name.to_string_lossy().into_owned()) else {
            continue;
        };
        if name == "mod.rs" {
            continue;
        }
        let text = fs::read_to_string(&path).map_err(io_err(&path))?;
        texts.push(SourceText { name, path, text });
    }

    texts.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(texts)
}

/// Last path component of the package directory.
pub fn package_name(dir: &Path) -> String {
    dir.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .or_else(|| {
            dir.canonicalize()
                .ok()
                .and_then(|path| path.file_name().map(|name| name.to_string_lossy().into_owned()))
        })
        .unwrap_or_else(|| "package".to_string())
}

fn stem(name: &str) -> &str {
    name.strip_suffix(".rs").unwrap_or(name)
}
