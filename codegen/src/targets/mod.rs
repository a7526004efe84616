//! Target languages.
//!
//! A [`Target`] turns the language-agnostic pieces the generator prepares
//! (files of classes with resolved imports, package manifests, the
//! foundation module) into source text. The generator decides what goes
//! where; the target only decides how it is spelled.

pub mod python;

use std::collections::BTreeSet;

use crate::config::{FoundationConfig, ToolConfig};
use crate::error::RenderError;
use crate::imports::{ClassImports, Import};
use crate::ir::ClassDef;
use crate::layout::FileLoc;

pub use python::PythonTarget;

/// One class ready to render.
#[derive(Debug, Clone)]
pub struct ClassUnit<'a> {
    /// The class, with forward-reference flags set.
    pub class: &'a ClassDef,
    /// Its resolved imports.
    pub imports: ClassImports,
}

/// One output file: classes in definition order.
#[derive(Debug, Clone)]
pub struct FileUnit<'a> {
    /// Where the file goes.
    pub loc: &'a FileLoc,
    /// Classes, each after everything it needs eagerly from the same file.
    pub classes: Vec<ClassUnit<'a>>,
}

impl FileUnit<'_> {
    /// Eager imports of every class in the file, merged.
    #[must_use]
    pub fn imports(&self) -> BTreeSet<&Import> {
        self.classes.iter().flat_map(|c| c.imports.eager.iter()).collect()
    }
}

/// One package manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    /// Dotted package path.
    pub package: String,
    /// File stem → classes it defines, for files directly in the package.
    pub exports: Vec<(String, Vec<String>)>,
    /// Classes of this package that need the finalize pass.
    pub finalize: Vec<String>,
    /// For a top-level package: every generated module below it (including
    /// itself, as an empty path), relative to it, in module order.
    pub finalize_modules: Option<Vec<Vec<String>>>,
}

impl Manifest {
    /// Returns true if the package defines classes of its own.
    #[must_use]
    pub fn has_classes(&self) -> bool {
        self.exports.iter().any(|(_, names)| !names.is_empty())
    }

    /// Every exported class name, sorted.
    #[must_use]
    pub fn exported_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .exports
            .iter()
            .flat_map(|(_, names)| names.iter().map(String::as_str))
            .collect();
        names.sort_unstable();
        names
    }
}

/// A language the generator can emit.
pub trait Target: Send + Sync {
    /// Short name, for logs and reports.
    fn name(&self) -> &'static str;

    /// Source file extension, without the dot.
    fn file_extension(&self) -> &'static str;

    /// File stem of a package manifest.
    fn manifest_stem(&self) -> &'static str;

    /// Keywords a class or attribute name must not collide with.
    fn reserved_words(&self) -> &'static [&'static str];

    /// Member names the generated base type already defines.
    fn reserved_member_names(&self) -> &'static [&'static str];

    /// Renders the top of a class file: header comment and imports.
    fn render_header(&self, file: &FileUnit<'_>) -> String;

    /// Renders one class definition.
    ///
    /// # Errors
    ///
    /// Returns a [`RenderError`] if the class cannot be expressed in the
    /// target language.
    fn render_class(&self, unit: &ClassUnit<'_>) -> Result<String, RenderError>;

    /// Renders a package manifest.
    fn render_manifest(&self, manifest: &Manifest) -> String;

    /// Renders the foundation module.
    fn render_foundation(&self, foundation: &FoundationConfig) -> String;

    /// Formatters and checkers to run when none are configured.
    fn default_tools(&self) -> Vec<ToolConfig>;
}
