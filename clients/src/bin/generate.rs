//! `ontogen`: generates typed class definitions from an ontology schema.
//!
//! Reads a JSON schema (classes and properties extracted from an OWL
//! ontology) and writes one package tree of pydantic models under `--out`.
//!
//! **Usage:**
//! ```text
//! ontogen <schema.json> [--out <dir>] [--config <ontogen.toml>] [--clean] [--quality|--no-quality]
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ontogen_clients::{init_tracing, LogLevel};
use ontogen_codegen::quality::ToolStatus;
use ontogen_codegen::targets::PythonTarget;
use ontogen_codegen::{run, PipelineOptions};
use tracing::info;

/// Generate typed class definitions from an ontology schema.
#[derive(Parser)]
#[command(name = "ontogen", version, about = "Generate pydantic models from an ontology schema")]
struct Args {
    /// JSON schema extracted from the ontology.
    schema: PathBuf,

    /// Output root for the generated packages.
    #[arg(long, default_value = "generated")]
    out: PathBuf,

    /// Generator configuration (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Remove previously generated files under the output root first.
    #[arg(long)]
    clean: bool,

    /// Run the quality tools after generation.
    #[arg(long, conflicts_with = "no_quality")]
    quality: bool,

    /// Skip the quality tools even if the configuration enables them.
    #[arg(long)]
    no_quality: bool,

    /// Log verbosity; `RUST_LOG` overrides it.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level);

    let quality = match (args.quality, args.no_quality) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    };
    let options = PipelineOptions {
        schema: args.schema,
        output_dir: args.out,
        config: args.config,
        clean: args.clean,
        quality,
    };

    info!(
        schema = %options.schema.display(),
        out = %options.output_dir.display(),
        clean = options.clean,
        "starting generation"
    );
    let report = run(&options, &PythonTarget)
        .with_context(|| format!("generation from {} failed", options.schema.display()))?;

    if report.removed > 0 {
        println!("Removed {} stale files", report.removed);
    }
    println!(
        "Generated {} classes in {} files, {} manifests ({} target)",
        report.classes_emitted,
        report.files.len(),
        report.manifests.len(),
        report.target
    );
    if let Some(foundation) = &report.foundation {
        println!("Foundation: {}", foundation.display());
    }
    if !report.finalize.is_empty() {
        println!("Deferred annotations ({}): {}", report.finalize.len(), report.finalize.join(", "));
    }
    if !report.skipped.is_empty() {
        println!("Skipped ({}):", report.skipped.len());
        for skipped in &report.skipped {
            println!("  {skipped}");
        }
    }
    for outcome in &report.quality {
        let status = match &outcome.status {
            ToolStatus::Passed => "passed".to_string(),
            ToolStatus::Failed { code: Some(code), .. } => format!("failed (exit {code})"),
            ToolStatus::Failed { code: None, .. } => "failed (signal)".to_string(),
            ToolStatus::Missing => "not installed".to_string(),
            ToolStatus::Error(e) => format!("error: {e}"),
        };
        println!(
            "[{}] {status} in {:.1}s",
            outcome.tool,
            outcome.elapsed.as_secs_f64()
        );
    }
    println!("Output: {}", options.output_dir.display());
    Ok(())
}
