//! ontogen code generator.
//!
//! Turns an ontology's class and property descriptors into typed class
//! definitions a target language can import without circular-import or
//! undefined-name errors. The work happens in three stages:
//!
//! 1. [`builder::IrBuilder`] resolves modules, names, bases and attributes
//!    into an [`ir::IntermediateRepresentation`], skipping classes it cannot
//!    place.
//! 2. [`optimize::optimize`] builds the class dependency graph, finds its
//!    strongly connected components, marks the references that must be
//!    deferred, orders modules and assigns classes to output files.
//! 3. [`generate::CodeGenerator`] renders every file through a
//!    [`targets::Target`], writes package manifests with the finalize pass and
//!    optionally runs external quality tools.
//!
//! [`pipeline::run`] sequences the stages and wraps failures per stage.
//!
//! # Entry Point
//!
//! ```no_run
//! use ontogen_codegen::pipeline::{run, PipelineOptions};
//! use ontogen_codegen::targets::PythonTarget;
//!
//! let options = PipelineOptions {
//!     schema: "schema.json".into(),
//!     output_dir: "generated".into(),
//!     ..PipelineOptions::default()
//! };
//! let report = run(&options, &PythonTarget)?;
//! println!("{} classes", report.classes_emitted);
//! # Ok::<(), ontogen_codegen::error::PipelineError>(())
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

pub mod builder;
pub mod config;
pub mod emit;
pub mod error;
pub mod generate;
pub mod imports;
pub mod ir;
pub mod layout;
pub mod mapping;
pub mod optimize;
pub mod pipeline;
pub mod quality;
pub mod targets;

pub use builder::{BuildOutput, IrBuilder, SkipReason, SkippedClass};
pub use config::Config;
pub use error::PipelineError;
pub use generate::{CodeGenerator, GenerationReport};
pub use ir::{AttrDef, ClassDef, IntermediateRepresentation, Multiplicity};
pub use optimize::{optimize, OptimizedIR};
pub use pipeline::{run, run_with_source, PipelineOptions};
