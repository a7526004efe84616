//! Downstream formatters and type checkers.
//!
//! Tools are advisory: a missing binary or a non-zero exit is logged and
//! reported. A tool that outlives its time budget is killed and fails the run.

use std::io::Read;
use std::path::Path;
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{info, warn};

use crate::config::ToolConfig;
use crate::error::CodeQualityError;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// How a tool run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolStatus {
    /// Exited with status zero.
    Passed,
    /// Exited with a non-zero status.
    Failed {
        /// Exit code, if the process was not killed by a signal.
        code: Option<i32>,
        /// Captured stdout and stderr.
        output: String,
    },
    /// The program was not found on `PATH`.
    Missing,
    /// The program could not be started or waited on.
    Error(String),
}

/// Result of one tool run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolOutcome {
    /// Tool name.
    pub tool: String,
    /// How it ended.
    pub status: ToolStatus,
    /// Wall-clock time spent.
    pub elapsed: Duration,
}

/// Runs every tool in order against `out_root`.
///
/// # Errors
///
/// Returns [`CodeQualityError::Timeout`] as soon as a tool exceeds its
/// budget; later tools are not run.
pub fn run_tools(tools: &[ToolConfig], out_root: &Path) -> Result<Vec<ToolOutcome>, CodeQualityError> {
    tools.iter().map(|tool| run_tool(tool, out_root)).collect()
}

/// Runs one tool, substituting `{out}` in its arguments.
///
/// # Errors
///
/// Returns [`CodeQualityError::Timeout`] if the tool does not exit within
/// `timeout_secs`. The process is killed first.
pub fn run_tool(tool: &ToolConfig, out_root: &Path) -> Result<ToolOutcome, CodeQualityError> {
    let out = out_root.display().to_string();
    let args: Vec<String> = tool.args.iter().map(|a| a.replace("{out}", &out)).collect();
    let timeout = Duration::from_secs(tool.timeout_secs);
    let start = Instant::now();
    info!(tool = %tool.name, program = %tool.program, ?args, "running quality tool");

    let outcome = |status| ToolOutcome {
        tool: tool.name.clone(),
        status,
        elapsed: start.elapsed(),
    };

    let mut child = match Command::new(&tool.program)
        .args(&args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
    {
        Ok(child) => child,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(tool = %tool.name, "quality tool not found, skipping");
            return Ok(outcome(ToolStatus::Missing));
        }
        Err(e) => {
            warn!(tool = %tool.name, error = %e, "quality tool failed to start");
            return Ok(outcome(ToolStatus::Error(e.to_string())));
        }
    };
    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());

    let status = match wait_with_timeout(&mut child, timeout) {
        Ok(Some(status)) => status,
        Ok(None) => {
            warn!(tool = %tool.name, ?timeout, "quality tool timed out, killing");
            let _ = child.kill();
            let _ = child.wait();
            return Err(CodeQualityError::Timeout {
                tool: tool.name.clone(),
                after: timeout,
            });
        }
        Err(e) => {
            warn!(tool = %tool.name, error = %e, "failed to wait for quality tool");
            return Ok(outcome(ToolStatus::Error(e.to_string())));
        }
    };

    let output = [join(stdout), join(stderr)]
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("\n");
    if status.success() {
        info!(tool = %tool.name, "quality tool passed");
        Ok(outcome(ToolStatus::Passed))
    } else {
        warn!(tool = %tool.name, code = ?status.code(), %output, "quality tool reported problems");
        Ok(outcome(ToolStatus::Failed {
            code: status.code(),
            output,
        }))
    }
}

/// Polls `child` until it exits or `timeout` elapses. `Ok(None)` means the
/// timeout elapsed.
fn wait_with_timeout(child: &mut Child, timeout: Duration) -> std::io::Result<Option<ExitStatus>> {
    let start = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if start.elapsed() >= timeout {
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL.min(timeout.saturating_sub(start.elapsed())));
    }
}

/// Reads a pipe to the end on its own thread so the child never blocks on a
/// full pipe.
fn drain<R: Read + Send + 'static>(pipe: Option<R>) -> Option<JoinHandle<String>> {
    pipe.map(|mut pipe| {
        thread::spawn(move || {
            let mut buf = String::new();
            let _ = pipe.read_to_string(&mut buf);
            buf
        })
    })
}

fn join(handle: Option<JoinHandle<String>>) -> String {
    handle.and_then(|h| h.join().ok()).unwrap_or_default()
}
