//! Shared plumbing for the ontogen binaries.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use clap::ValueEnum;
use tracing_subscriber::EnvFilter;

/// Verbosity of the log written to stderr.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum LogLevel {
    /// Errors only.
    Error,
    /// Skipped classes, module cycles and failed tools.
    #[default]
    Warn,
    /// Stage summaries.
    Info,
    /// Per-class detail.
    Debug,
    /// Everything.
    Trace,
}

impl LogLevel {
    /// The filter directive for this level.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Installs the stderr log subscriber. `RUST_LOG`, when set, takes
/// precedence over `level`.
pub fn init_tracing(level: LogLevel) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}
