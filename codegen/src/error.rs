//! Stage-scoped error types.
//!
//! Each generator stage has its own error type; [`PipelineError`] wraps them
//! with the name of the stage that failed and keeps the original cause
//! reachable through [`std::error::Error::source`].

use std::path::PathBuf;
use std::time::Duration;

use ontogen_schema::SchemaLoadError;

/// Failure to read or validate the generator configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read configuration file {}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The configuration file is not valid TOML or has unknown keys.
    #[error("failed to parse configuration")]
    Parse(#[source] toml::de::Error),
    /// The configuration parsed but is not usable.
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// Fatal failure of the IR Builder stage.
///
/// Per-class problems are not errors; they are reported as
/// [`SkipReason`](crate::builder::SkipReason)s.
#[derive(Debug, thiserror::Error)]
pub enum IrBuildError {
    /// The configuration could not be loaded or is invalid.
    #[error("unusable generator configuration")]
    Config(#[from] ConfigError),
}

/// Fatal failure of the Dependency Optimizer stage: the IR is malformed.
#[derive(Debug, thiserror::Error)]
pub enum OptimizationError {
    /// A class is stored under a key that differs from its own name.
    #[error("class `{name}` is stored under key `{key}`")]
    KeyMismatch {
        /// Map key.
        key: String,
        /// `ClassDef::name`.
        name: String,
    },
    /// A class has an empty or blank name.
    #[error("class with IRI fragment {fragment:?} has a blank name")]
    BlankName {
        /// Provenance of the offending class, if known.
        fragment: Option<String>,
    },
    /// A class has a blank module path.
    #[error("class `{0}` has no module")]
    BlankModule(String),
}

/// Failure to render a single class.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// The class has no base at all; at least a foundation base is required.
    #[error("class has no base class")]
    NoBase,
    /// A name is not a valid identifier in the target language.
    #[error("{kind} name `{name}` is not a valid identifier")]
    InvalidIdentifier {
        /// `"class"` or `"attribute"`.
        kind: &'static str,
        /// The offending name.
        name: String,
    },
}

/// Fatal failure of the Code Generator stage.
#[derive(Debug, thiserror::Error)]
pub enum CodeGenerationError {
    /// A file or directory could not be written.
    #[error("failed to write {}", path.display())]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// A class could not be rendered.
    #[error("failed to generate class `{class}`")]
    Render {
        /// Name of the class.
        class: String,
        /// Underlying render error.
        #[source]
        source: RenderError,
    },
}

/// Fatal failure while running downstream quality tools.
///
/// Only a timeout is fatal; a missing binary or a non-zero exit is logged and
/// reported as a [`ToolStatus`](crate::quality::ToolStatus).
#[derive(Debug, thiserror::Error)]
pub enum CodeQualityError {
    /// The tool did not finish within its time budget and was killed.
    #[error("quality tool `{tool}` timed out after {}s", .after.as_secs())]
    Timeout {
        /// Tool name.
        tool: String,
        /// Configured timeout.
        after: Duration,
    },
}

/// A pipeline failure, tagged with the stage that raised it.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// Loading the schema failed.
    #[error("load stage failed")]
    Load(#[from] SchemaLoadError),
    /// Building the IR failed.
    #[error("build stage failed")]
    Build(#[from] IrBuildError),
    /// Optimizing the IR failed.
    #[error("optimize stage failed")]
    Optimize(#[from] OptimizationError),
    /// Emitting code failed.
    #[error("generate stage failed")]
    Generate(#[from] CodeGenerationError),
    /// A quality tool timed out.
    #[error("quality stage failed")]
    Quality(#[from] CodeQualityError),
}

impl PipelineError {
    /// Returns the name of the failing stage.
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Load(_) => "load",
            PipelineError::Build(_) => "build",
            PipelineError::Optimize(_) => "optimize",
            PipelineError::Generate(_) => "generate",
            PipelineError::Quality(_) => "quality",
        }
    }
}
