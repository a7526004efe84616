//! Pipeline orchestrator: load → build → optimize → generate → quality.
//!
//! Stages run strictly in sequence. A failing stage aborts the run with a
//! [`PipelineError`] naming it; nothing is retried.

use std::path::{Path, PathBuf};

use ontogen_schema::{json, SchemaSource};
use tracing::info;

use crate::builder::{IrBuilder, SkippedClass};
use crate::config::Config;
use crate::error::PipelineError;
use crate::generate::{CodeGenerator, GenerationReport};
use crate::optimize::{optimize, OptimizedIR};
use crate::quality::run_tools;
use crate::targets::Target;

/// Inputs of one generator run.
#[derive(Debug, Clone, Default)]
pub struct PipelineOptions {
    /// Path of the JSON schema.
    pub schema: PathBuf,
    /// Root directory generated files are written under.
    pub output_dir: PathBuf,
    /// Generator configuration; defaults apply when `None`.
    pub config: Option<PathBuf>,
    /// Remove previously generated files first.
    pub clean: bool,
    /// Overrides `quality.enabled` from the configuration.
    pub quality: Option<bool>,
}

/// Everything known after optimization, before any file is written.
#[derive(Debug)]
pub struct Plan {
    /// The configuration in effect.
    pub config: Config,
    /// Classes the builder left out.
    pub skipped: Vec<SkippedClass>,
    /// The optimized IR.
    pub optimized: OptimizedIR,
}

/// Runs the whole pipeline on the schema file named in `options`.
///
/// # Errors
///
/// Returns the [`PipelineError`] of the first stage that fails.
pub fn run(options: &PipelineOptions, target: &dyn Target) -> Result<GenerationReport, PipelineError> {
    let schema = json::load_json(&options.schema)?;
    info!(
        schema = %options.schema.display(),
        classes = schema.classes.len(),
        object_properties = schema.object_property_count(),
        datatype_properties = schema.datatype_property_count(),
        "loaded schema"
    );
    run_with_source(&schema, options, target)
}

/// Runs build → optimize → generate → quality on an already loaded schema.
///
/// # Errors
///
/// Returns the [`PipelineError`] of the first stage that fails.
pub fn run_with_source<S: SchemaSource + ?Sized>(
    source: &S,
    options: &PipelineOptions,
    target: &dyn Target,
) -> Result<GenerationReport, PipelineError> {
    let plan = plan(source, options.config.as_deref(), target)?;
    let generator = CodeGenerator::new(target, &plan.config.foundation);

    let removed = if options.clean {
        generator.clean(&options.output_dir)
    } else {
        0
    };
    let mut report = generator.emit(&plan.optimized, &options.output_dir)?;
    report.removed = removed;
    report.skipped.extend(
        plan.skipped
            .iter()
            .map(|s| format!("{} ({})", s.iri, s.reason)),
    );

    if options.quality.unwrap_or(plan.config.quality.enabled) {
        let tools = if plan.config.quality.tools.is_empty() {
            target.default_tools()
        } else {
            plan.config.quality.tools.clone()
        };
        report.quality = run_tools(&tools, &options.output_dir)?;
    }
    Ok(report)
}

/// Runs build → optimize without writing anything.
///
/// # Errors
///
/// Returns [`PipelineError::Build`] if the configuration cannot be loaded and
/// [`PipelineError::Optimize`] if the dependency graph cannot be built.
pub fn plan<S: SchemaSource + ?Sized>(
    source: &S,
    config: Option<&Path>,
    target: &dyn Target,
) -> Result<Plan, PipelineError> {
    let builder = IrBuilder::from_config_file(
        config,
        target.reserved_words(),
        target.reserved_member_names(),
    )?;
    let output = builder.build(source);
    let optimized = optimize(&output.ir, &builder.config().consolidation)?;
    Ok(Plan {
        config: builder.config().clone(),
        skipped: output.skipped,
        optimized,
    })
}
