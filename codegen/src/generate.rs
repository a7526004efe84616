//! Code Generator: [`OptimizedIR`] → files on disk.
//!
//! Classes are grouped into files by the [`Layout`], each file's classes are
//! ordered so that everything a class needs eagerly from the same file comes
//! first, and files are rendered in parallel. Writing is sequential; every
//! unit goes to its own path.

use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::FoundationConfig;
use crate::emit::{write_file, SourceFile};
use crate::error::CodeGenerationError;
use crate::imports::resolve_imports;
use crate::ir::ClassDef;
use crate::layout::{FileLoc, Layout};
use crate::mapping::{is_builtin_range, module_segments};
use crate::optimize::OptimizedIR;
use crate::quality::ToolOutcome;
use crate::targets::{ClassUnit, FileUnit, Manifest, Target};

/// Report of what was generated.
#[derive(Debug, Default)]
pub struct GenerationReport {
    /// Name of the target language.
    pub target: &'static str,
    /// Number of classes written.
    pub classes_emitted: usize,
    /// Class files written, relative to the output root.
    pub files: Vec<PathBuf>,
    /// Manifests written, relative to the output root.
    pub manifests: Vec<PathBuf>,
    /// The foundation module, if it was written.
    pub foundation: Option<PathBuf>,
    /// Classes registered for the finalize pass, in finalize order.
    pub finalize: Vec<String>,
    /// Classes not written because their name is blank.
    pub skipped: Vec<String>,
    /// Stale files removed by the clean step.
    pub removed: usize,
    /// Quality tool results, if tools ran.
    pub quality: Vec<ToolOutcome>,
}

/// Writes an [`OptimizedIR`] through a [`Target`].
pub struct CodeGenerator<'a> {
    target: &'a dyn Target,
    foundation: &'a FoundationConfig,
}

impl<'a> CodeGenerator<'a> {
    /// Creates a generator for `target`.
    pub fn new(target: &'a dyn Target, foundation: &'a FoundationConfig) -> Self {
        Self { target, foundation }
    }

    /// Removes previously generated files (by extension) under `out_root`.
    ///
    /// Returns the number of files removed. Failures are logged and skipped.
    pub fn clean(&self, out_root: &Path) -> usize {
        if !out_root.exists() {
            return 0;
        }
        let extension = self.target.file_extension();
        let mut removed = 0;
        for entry in WalkDir::new(out_root).into_iter().filter_map(Result::ok) {
            let path = entry.path();
            if !entry.file_type().is_file()
                || path.extension().and_then(|e| e.to_str()) != Some(extension)
            {
                continue;
            }
            match fs::remove_file(path) {
                Ok(()) => removed += 1,
                Err(e) => warn!(path = %path.display(), error = %e, "failed to remove stale file"),
            }
        }
        info!(removed, root = %out_root.display(), "cleaned output directory");
        removed
    }

    /// Emits every class, manifest and the foundation module under `out_root`.
    ///
    /// # Errors
    ///
    /// Returns [`CodeGenerationError::Render`] naming the first class that
    /// fails to render, or [`CodeGenerationError::Io`] if a file cannot be
    /// written.
    pub fn emit(
        &self,
        ir: &OptimizedIR,
        out_root: &Path,
    ) -> Result<GenerationReport, CodeGenerationError> {
        let mut report = GenerationReport {
            target: self.target.name(),
            ..GenerationReport::default()
        };
        let layout = Layout::new(ir, self.foundation);

        let mut units: Vec<FileUnit<'_>> = Vec::new();
        for (loc, names) in layout.files() {
            let mut classes: Vec<&ClassDef> = Vec::new();
            for name in names {
                match ir.class(name) {
                    Some(class) if !class.name.trim().is_empty() => classes.push(class),
                    _ => {
                        warn!(class = ?name, "skipping class with blank name");
                        report.skipped.push(name.to_string());
                    }
                }
            }
            if classes.is_empty() {
                continue;
            }
            let classes = definition_order(&classes, ir)
                .into_iter()
                .map(|class| ClassUnit {
                    class,
                    imports: resolve_imports(class, loc, ir, &layout),
                })
                .collect();
            units.push(FileUnit { loc, classes });
        }

        let rendered: Vec<String> = units
            .par_iter()
            .map(|unit| self.render_file(unit))
            .collect::<Result<_, _>>()?;

        let ext = self.target.file_extension();
        for (unit, text) in units.iter().zip(&rendered) {
            let rel = file_path(unit.loc, ext);
            write_file(&out_root.join(&rel), text)?;
            debug!(file = %rel.display(), classes = unit.classes.len(), "wrote file");
            report.classes_emitted += unit.classes.len();
            report.files.push(rel);
        }

        let foundation = self
            .foundation
            .emit_stub
            .then(|| layout.foundation())
            .flatten();
        if let Some(loc) = foundation {
            let rel = file_path(loc, ext);
            write_file(&out_root.join(&rel), &self.target.render_foundation(self.foundation))?;
            report.foundation = Some(rel);
        }

        for manifest in manifests(ir, &units, foundation) {
            let mut rel: PathBuf = module_segments(&manifest.package).collect();
            rel.push(format!("{}.{ext}", self.target.manifest_stem()));
            write_file(&out_root.join(&rel), &self.target.render_manifest(&manifest))?;
            report.manifests.push(rel);
        }

        report.finalize = ir.finalize_list().iter().map(|c| c.name.clone()).collect();
        info!(
            target = report.target,
            classes = report.classes_emitted,
            files = report.files.len(),
            manifests = report.manifests.len(),
            finalize = report.finalize.len(),
            "generated code"
        );
        Ok(report)
    }

    fn render_file(&self, unit: &FileUnit<'_>) -> Result<String, CodeGenerationError> {
        let mut f = SourceFile::new();
        f.buf.push_str(&self.target.render_header(unit));
        for class in &unit.classes {
            let body = self
                .target
                .render_class(class)
                .map_err(|source| CodeGenerationError::Render {
                    class: class.class.name.clone(),
                    source,
                })?;
            f.blank_lines(2);
            f.buf.push_str(&body);
        }
        Ok(f.finish())
    }
}

/// `a.b` / `Stem` → `a/b/Stem.<ext>`.
fn file_path(loc: &FileLoc, ext: &str) -> PathBuf {
    let mut path: PathBuf = loc.package().collect();
    path.push(format!("{}.{ext}", loc.stem));
    path
}

/// Orders the classes of one file so that each follows the classes of the
/// same file it needs eagerly. Ties and leftovers go by name.
fn definition_order<'c>(classes: &[&'c ClassDef], ir: &OptimizedIR) -> Vec<&'c ClassDef> {
    let members: BTreeMap<&str, &'c ClassDef> =
        classes.iter().map(|c| (c.name.as_str(), *c)).collect();
    let mut needs: BTreeMap<&str, BTreeSet<&str>> = BTreeMap::new();
    for class in classes {
        let entry = needs.entry(class.name.as_str()).or_default();
        for base in &class.bases {
            if *base != class.name && members.contains_key(base.as_str()) {
                entry.insert(base.as_str());
            }
        }
        for attr in &class.attrs {
            let dep = attr.range.as_str();
            if attr.forward_ref || is_builtin_range(dep) || dep == class.name {
                continue;
            }
            if members.contains_key(dep) && !ir.is_forward_ref(&class.name, dep) {
                entry.insert(dep);
            }
        }
    }

    let mut order: Vec<&'c ClassDef> = Vec::with_capacity(classes.len());
    let mut placed: BTreeSet<&str> = BTreeSet::new();
    while order.len() < members.len() {
        let next = needs
            .iter()
            .find(|(name, deps)| !placed.contains(*name) && deps.iter().all(|d| placed.contains(d)))
            .map(|(name, _)| *name)
            .or_else(|| members.keys().copied().find(|n| !placed.contains(n)));
        let Some(name) = next else {
            break;
        };
        placed.insert(name);
        if let Some(class) = members.get(name) {
            order.push(*class);
        }
    }
    order
}

/// One manifest per package directory: every prefix of every written module,
/// plus the foundation's package.
fn manifests(ir: &OptimizedIR, units: &[FileUnit<'_>], foundation: Option<&FileLoc>) -> Vec<Manifest> {
    let mut packages: BTreeSet<String> = BTreeSet::new();
    let modules = units
        .iter()
        .map(|u| u.loc.module.as_str())
        .chain(foundation.map(|f| f.module.as_str()));
    for module in modules {
        let segments: Vec<&str> = module_segments(module).collect();
        for end in 1..=segments.len() {
            packages.insert(segments[..end].join("."));
        }
    }

    let written: BTreeSet<&str> = units.iter().map(|u| u.loc.module.as_str()).collect();
    let finalize = ir.finalize_list();
    packages
        .into_iter()
        .map(|package| {
            let exports = units
                .iter()
                .filter(|u| u.loc.module == package)
                .map(|u| {
                    let mut names: Vec<String> =
                        u.classes.iter().map(|c| c.class.name.clone()).collect();
                    names.sort();
                    (u.loc.stem.clone(), names)
                })
                .collect();
            let finalize_here = finalize
                .iter()
                .filter(|c| c.module == package)
                .map(|c| c.name.clone())
                .collect();
            let finalize_modules = (!package.contains('.')).then(|| {
                ir.module_order
                    .iter()
                    .filter(|m| written.contains(m.as_str()))
                    .filter_map(|m| relative_module(&package, m))
                    .collect()
            });
            Manifest {
                package,
                exports,
                finalize: finalize_here,
                finalize_modules,
            }
        })
        .collect()
}

/// Segments of `module` below `package`; empty for the package itself.
fn relative_module(package: &str, module: &str) -> Option<Vec<String>> {
    if module == package {
        return Some(Vec::new());
    }
    let rest = module.strip_prefix(package)?.strip_prefix('.')?;
    Some(module_segments(rest).map(str::to_string).collect())
}
