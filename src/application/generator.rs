//! Package generator.
//!
//! One rayon task per package. Each task loads its package, edits two independent
//! clones of every file (diagnostic and production), writes both plus a routing
//! `mod.rs`, and records what happened. Failures are isolated: a file that fails
//! validation is skipped, a package that fails to load is skipped, and every error is
//! collected for a single report after the join.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use dashmap::DashMap;
use parking_lot::{Mutex, MutexGuard};
use rayon::prelude::*;
use tracing::{debug, info, info_span, warn};

use crate::application::options::GeneratorOptions;
use crate::domain::cfg::CfgSet;
use crate::domain::pipeline::PipelineOption;
use crate::domain::variant::{module_name, Header, ModuleIndex, Variant};
use crate::error::{GenerateError, GenerationFailed, LoadError};
use crate::infrastructure::concurrency::build_pool;
use crate::infrastructure::package_loader::{package_name, read_sources, Package, PackageLoader, SourceFile, SourceText};
use crate::infrastructure::{PrettyPrinter, SynParser};
use crate::ports::{SourceParser, SourcePrinter};

/// Where a package is in its generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    Loading,
    EditingDiagnostic,
    EditingProduction,
    Writing,
    Done,
    Failed,
}

impl Stage {
    fn editing(variant: Variant) -> Self {
        match variant {
            Variant::Diagnostic => Stage::EditingDiagnostic,
            Variant::Production => Stage::EditingProduction,
        }
    }
}

/// Outcome of one package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageReport {
    pub package: String,
    pub dir: PathBuf,
    pub stage: Stage,
    /// Generated files, `mod.rs` last.
    pub written: Vec<PathBuf>,
    /// Input files that produced no output.
    pub failed_files: Vec<String>,
}

impl PackageReport {
    fn new(package: String, dir: &Path) -> Self {
        Self {
            package,
            dir: dir.to_path_buf(),
            stage: Stage::Idle,
            written: Vec::new(),
            failed_files: Vec::new(),
        }
    }

    fn advance(&mut self, stage: Stage) {
        debug!(from = ?self.stage, to = ?stage, "stage");
        self.stage = stage;
    }
}

pub struct Generator {
    options: GeneratorOptions,
    cfgs: CfgSet,
    common: Vec<SourceText>,
    diagnostic_extra: Vec<PipelineOption>,
    production_extra: Vec<PipelineOption>,
    errors: Mutex<Vec<GenerateError>>,
    reports: DashMap<PathBuf, PackageReport>,
}

impl Generator {
    /// Validates the output path and reads the common files.
    pub fn new(options: GeneratorOptions) -> Result<Self, GenerateError> {
        if options.output.exists() && !options.output.is_dir() {
            return Err(GenerateError::OutputNotADirectory(options.output.clone()));
        }

        let common = match &options.common {
            Some(dir) => read_common(dir)?,
            None => Vec::new(),
        };

        Ok(Self {
            cfgs: CfgSet::parse(&options.load_cfgs),
            options,
            common,
            diagnostic_extra: Vec::new(),
            production_extra: Vec::new(),
            errors: Mutex::new(Vec::new()),
            reports: DashMap::new(),
        })
    }

    /// Adds a rule to every diagnostic pipeline.
    pub fn with_diagnostic(mut self, option: PipelineOption) -> Self {
        self.diagnostic_extra.push(option);
        self
    }

    /// Adds a rule to every production pipeline, between stripping and cleanup.
    pub fn with_production(mut self, option: PipelineOption) -> Self {
        self.production_extra.push(option);
        self
    }

    pub fn options(&self) -> &GeneratorOptions {
        &self.options
    }

    /// Generates every package and returns once all of them are finished.
    pub fn start(&self) {
        let pool = match build_pool(self.options.threads) {
            Ok(pool) => pool,
            Err(err) => {
                self.errors.lock().push(err.into());
                return;
            }
        };

        let packages = self.claim_output_dirs();
        info!(packages = packages.len(), output = %self.options.output.display(), "generating");
        pool.install(|| {
            packages.par_iter().for_each(|dir| self.generate_package(dir));
        });
        info!(errors = self.errors.lock().len(), "generation finished");
    }

    // Packages are keyed by directory name in the output; the first source with a
    // given name wins and later ones are failed before any work is dispatched.
    fn claim_output_dirs(&self) -> Vec<&Path> {
        let mut claimed: HashMap<String, &Path> = HashMap::new();
        let mut packages = Vec::with_capacity(self.options.sources.len());

        for dir in &self.options.sources {
            let name = package_name(dir);
            match claimed.get(&name) {
                Some(first) => {
                    warn!(package = %name, dir = %dir.display(), first = %first.display(), "duplicate package skipped");
                    let mut report = PackageReport::new(name.clone(), dir);
                    report.advance(Stage::Failed);
                    self.reports.insert(dir.clone(), report);
                    self.record(GenerateError::DuplicatePackage {
                        package: name,
                        dir: dir.clone(),
                        first: first.to_path_buf(),
                    });
                }
                None => {
                    claimed.insert(name, dir);
                    packages.push(dir.as_path());
                }
            }
        }
        packages
    }

    /// Errors recorded so far.
    pub fn errors(&self) -> MutexGuard<'_, Vec<GenerateError>> {
        self.errors.lock()
    }

    /// Package reports, sorted by package name.
    pub fn reports(&self) -> Vec<PackageReport> {
        let mut reports: Vec<PackageReport> = self.reports.iter().map(|entry| entry.value().clone()).collect();
        reports.sort_by(|a, b| a.package.cmp(&b.package).then_with(|| a.dir.cmp(&b.dir)));
        reports
    }

    /// The reports, or every recorded error at once.
    pub fn finish(self) -> Result<Vec<PackageReport>, GenerationFailed> {
        let reports = self.reports();
        let errors = self.errors.into_inner();
        if errors.is_empty() {
            Ok(reports)
        } else {
            Err(GenerationFailed { errors })
        }
    }

    fn generate_package(&self, dir: &Path) {
        let name = package_name(dir);
        let span = info_span!("package", package = %name);
        let _guard = span.enter();

        let mut report = PackageReport::new(name.clone(), dir);
        report.advance(Stage::Loading);

        let parser = SynParser;
        let loader = PackageLoader::new(&self.cfgs, &parser);
        match loader.load(dir, &self.common) {
            Ok(package) => self.write_package(&package, &mut report),
            Err(source) => {
                warn!(error = %source, "package skipped");
                report.advance(Stage::Failed);
                self.record(GenerateError::Load { package: name, source });
            }
        }

        info!(stage = ?report.stage, written = report.written.len(), failed = report.failed_files.len(), "package finished");
        self.reports.insert(dir.to_path_buf(), report);
    }

    fn write_package(&self, package: &Package, report: &mut PackageReport) {
        let out_dir = self.options.output.join(&package.name);
        if let Err(source) = fs::create_dir_all(&out_dir) {
            report.advance(Stage::Failed);
            self.record(GenerateError::Write {
                package: package.name.clone(),
                file: out_dir,
                source,
            });
            return;
        }

        let predicate = self.options.marker.predicate(&package.name);
        let mut modules: Vec<(String, String)> = Vec::with_capacity(package.files.len());
        let mut failed = false;

        for file in &package.files {
            let outcome = self
                .claim_module(package, file, &modules)
                .and_then(|module| {
                    self.generate_file(package, file, &out_dir, &predicate, report)?;
                    Ok(module)
                });
            match outcome {
                Ok(module) => modules.push((file.stem.clone(), module)),
                Err(err) => {
                    warn!(file = %file.name, error = %err, "file skipped");
                    report.failed_files.push(file.name.clone());
                    self.record(err);
                    failed = true;
                }
            }
        }

        if !modules.is_empty() {
            report.advance(Stage::Writing);
            let index = ModuleIndex {
                invocation: &self.options.invocation,
                predicate: &predicate,
                modules: &modules,
            };
            let path = out_dir.join("mod.rs");
            match fs::write(&path, index.render()) {
                Ok(()) => report.written.push(path),
                Err(source) => {
                    self.record(GenerateError::Write {
                        package: package.name.clone(),
                        file: path,
                        source,
                    });
                    failed = true;
                }
            }
        }

        report.advance(if failed { Stage::Failed } else { Stage::Done });
    }

    /// Module name `file` gets in the package's `mod.rs`, unless it is not an
    /// identifier or an earlier file already took it.
    fn claim_module(
        &self,
        package: &Package,
        file: &SourceFile,
        taken: &[(String, String)],
    ) -> Result<String, GenerateError> {
        let error = |reason: String| GenerateError::ModuleName {
            package: package.name.clone(),
            file: file.name.clone(),
            reason,
        };
        let module = module_name(&file.stem)
            .ok_or_else(|| error(format!("`{}` cannot be turned into a module name", file.stem)))?;
        if let Some((stem, _)) = taken.iter().find(|(_, name)| *name == module) {
            return Err(error(format!("module `{}` is already used by `{}.rs`", module, stem)));
        }
        Ok(module)
    }

    // Both variants are edited before either is written, and a failed write removes
    // the variant already written, so a file never ends up with half a pair on disk.
    fn generate_file(
        &self,
        package: &Package,
        file: &SourceFile,
        out_dir: &Path,
        predicate: &str,
        report: &mut PackageReport,
    ) -> Result<(), GenerateError> {
        let mut rendered = Vec::with_capacity(Variant::ALL.len());

        for variant in Variant::ALL {
            report.advance(Stage::editing(variant));
            let extra = match variant {
                Variant::Diagnostic => &self.diagnostic_extra,
                Variant::Production => &self.production_extra,
            };

            let mut tree = file.tree.clone();
            variant
                .pipeline(extra)
                .edit(&mut tree)
                .map_err(|source| GenerateError::Validation {
                    package: package.name.clone(),
                    file: file.name.clone(),
                    source,
                })?;

            let cfg = variant.cfg(predicate);
            let header = Header {
                invocation: &self.options.invocation,
                cfg: Some(cfg.as_str()),
            };
            rendered.push((variant, format!("{}\n{}", header.render(), PrettyPrinter.print(&tree))));
        }

        report.advance(Stage::Writing);
        let mut written: Vec<PathBuf> = Vec::with_capacity(rendered.len());
        for (variant, text) in rendered {
            let path = out_dir.join(variant.file_name(&file.stem));
            if let Err(source) = fs::write(&path, text) {
                for partial in &written {
                    if let Err(err) = fs::remove_file(partial) {
                        warn!(file = %partial.display(), error = %err, "cannot remove half-written pair");
                    }
                }
                return Err(GenerateError::Write {
                    package: package.name.clone(),
                    file: path,
                    source,
                });
            }
            debug!(file = %path.display(), %variant, "written");
            written.push(path);
        }
        report.written.extend(written);
        Ok(())
    }

    fn record(&self, err: GenerateError) {
        self.errors.lock().push(err);
    }
}

/// Reads the common files and checks that they parse, so a broken one fails the run
/// up front instead of once per package.
fn read_common(dir: &Path) -> Result<Vec<SourceText>, GenerateError> {
    let package = package_name(dir);
    let texts = read_sources(dir).map_err(|source| GenerateError::Load {
        package: package.clone(),
        source,
    })?;

    for text in &texts {
        if let Err(err) = SynParser.parse(&text.text) {
            return Err(GenerateError::Load {
                package,
                source: LoadError::Parse {
                    path: text.path.clone(),
                    line: err.span().start().line,
                    message: err.to_string(),
                },
            });
        }
    }
    debug!(files = texts.len(), dir = %dir.display(), "common files read");
    Ok(texts)
}

/// Builds a generator for `options`, runs it and returns the outcome.
pub fn generate(options: GeneratorOptions) -> Result<Vec<PackageReport>, GenerationFailed> {
    let generator = Generator::new(options).map_err(|err| GenerationFailed { errors: vec![err] })?;
    generator.start();
    generator.finish()
}
