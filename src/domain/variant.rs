//! Output variants and the marker that selects between them.

use std::fmt;

use serde::{Deserialize, Serialize};
use syn::Ident;

use crate::domain::pipeline::{EditPipeline, PipelineOption};
use crate::domain::rules::{
    prune_unused_references, remove_dead_private_functions, remove_orphan_comments, strip_function_body,
};

pub const GENERATED_LINE: &str = "// Code generated by debugtwin. DO NOT EDIT.";

// Production edits wrapped around any extra options: stripping first, cleanup last.
const PRODUCTION_FIRST: [PipelineOption; 2] = [strip_function_body, remove_dead_private_functions];
const PRODUCTION_LAST: [PipelineOption; 2] = [prune_unused_references, remove_orphan_comments];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// Instrumentation intact, compiled when the marker is on.
    Diagnostic,
    /// Instrumentation stripped, compiled when the marker is off.
    Production,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Diagnostic, Variant::Production];

    pub fn file_name(self, stem: &str) -> String {
        match self {
            Variant::Diagnostic => format!("{}.debug.rs", stem),
            Variant::Production => format!("{}.rs", stem),
        }
    }

    /// The cfg predicate under which this variant compiles.
    pub fn cfg(self, predicate: &str) -> String {
        match self {
            Variant::Diagnostic => predicate.to_string(),
            Variant::Production => format!("not({})", predicate),
        }
    }

    /// A fresh pipeline for this variant, with `extra` options in the middle.
    pub fn pipeline(self, extra: &[PipelineOption]) -> EditPipeline {
        match self {
            Variant::Diagnostic => EditPipeline::new(self.to_string(), extra),
            Variant::Production => {
                let mut options: Vec<PipelineOption> = Vec::with_capacity(PRODUCTION_FIRST.len() + extra.len() + PRODUCTION_LAST.len());
                options.extend_from_slice(&PRODUCTION_FIRST);
                options.extend_from_slice(extra);
                options.extend_from_slice(&PRODUCTION_LAST);
                EditPipeline::new(self.to_string(), &options)
            }
        }
    }
}

impl fmt::Display for Variant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Variant::Diagnostic => write!(f, "diagnostic"),
            Variant::Production => write!(f, "production"),
        }
    }
}

/// The debug marker a generated package is keyed on.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Marker {
    /// `feature = "<package name>"`.
    #[default]
    PackageFeature,
    /// Any cfg predicate, e.g. `debug_assertions`.
    Cfg(String),
}

impl Marker {
    pub fn predicate(&self, package: &str) -> String {
        match self {
            Marker::PackageFeature => format!("feature = {:?}", package),
            Marker::Cfg(predicate) => predicate.clone(),
        }
    }
}

/// Leading lines of every generated file.
pub struct Header<'a> {
    pub invocation: &'a str,
    pub cfg: Option<&'a str>,
}

impl Header<'_> {
    pub fn render(&self) -> String {
        let mut out = format!("{}\n// Regenerate with: {}\n\n", GENERATED_LINE, self.invocation);
        if let Some(cfg) = self.cfg {
            out.push_str(&format!("#![cfg({})]\n", cfg));
        }
        out
    }
}

/// `mod.rs` of a generated package: one module per file, routed to a variant by cfg.
pub struct ModuleIndex<'a> {
    pub invocation: &'a str,
    pub predicate: &'a str,
    /// `(stem, module name)` pairs; names come from [`module_name`].
    pub modules: &'a [(String, String)],
}

impl ModuleIndex<'_> {
    pub fn render(&self) -> String {
        let mut out = Header {
            invocation: self.invocation,
            cfg: None,
        }
        .render();

        for (stem, module) in self.modules {
            for variant in [Variant::Production, Variant::Diagnostic] {
                out.push_str(&format!(
                    "#[cfg({})]\n#[path = {:?}]\nmod {};\n",
                    variant.cfg(self.predicate),
                    variant.file_name(stem),
                    module
                ));
            }
            out.push_str(&format!("pub use self::{}::*;\n", module));
        }
        out
    }
}

/// Module identifier for a file stem. Characters outside `[A-Za-z0-9_]` become `_`
/// and keywords are written raw (`r#type`). `None` when no identifier fits, e.g. a
/// stem starting with a digit or one of `self`, `super`, `crate`.
pub fn module_name(stem: &str) -> Option<String> {
    let name: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if syn::parse_str::<Ident>(&name).is_ok() {
        return Some(name);
    }
    let raw = format!("r#{}", name);
    syn::parse_str::<Ident>(&raw).is_ok().then_some(raw)
}
