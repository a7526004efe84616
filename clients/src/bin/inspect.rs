//! `ontogen-inspect`: prints the optimized dependency analysis of a schema.
//!
//! Runs load, build and optimize without writing any code and prints the
//! result as JSON: cycles, forward references, module order and file
//! consolidation, plus the classes the builder skipped.
//!
//! **Usage:**
//! ```text
//! ontogen-inspect <schema.json> [--config <ontogen.toml>] [--compact]
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
use ontogen_codegen::pipeline::plan;
use ontogen_codegen::targets::PythonTarget;
use ontogen_schema::json::load_json;

/// Print the dependency analysis of an ontology schema.
#[derive(Parser)]
#[command(name = "ontogen-inspect", version, about = "Inspect cycles, forward references and module order")]
struct Args {
    /// JSON schema extracted from the ontology.
    schema: PathBuf,

    /// Generator configuration (TOML).
    #[arg(long)]
    config: Option<PathBuf>,

    /// Print single-line JSON.
    #[arg(long)]
    compact: bool,

    /// Log verbosity; `RUST_LOG` overrides it.
    #[arg(long, value_enum, default_value_t = LogLevel::Warn)]
    log_level: LogLevel,
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_tracing(args.log_level);

    let schema = load_json(&args.schema)
        .with_context(|| format!("load stage failed for {}", args.schema.display()))?;
    let plan = plan(&schema, args.config.as_deref(), &PythonTarget)
        .context("dependency analysis failed")?;

    let skipped: Vec<serde_json::Value> = plan
        .skipped
        .iter()
        .map(|s| serde_json::json!({ "iri": s.iri, "reason": s.reason.to_string() }))
        .collect();
    let document = serde_json::json!({
        "skipped": skipped,
        "optimized": plan.optimized,
    });
    let text = if args.compact {
        serde_json::to_string(&document)?
    } else {
        serde_json::to_string_pretty(&document)?
    };
    println!("{text}");
    Ok(())
}
