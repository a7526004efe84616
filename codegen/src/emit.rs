//! Source buffer and file-writing helpers shared by every target.

use std::fs;
use std::path::Path;

use crate::error::CodeGenerationError;

/// Indentation unit used by [`SourceFile::indented`].
pub const INDENT: &str = "    ";

/// An in-memory source file under construction.
#[derive(Debug, Default)]
pub struct SourceFile {
    /// The text written so far.
    pub buf: String,
}

impl SourceFile {
    /// Creates an empty file.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a line.
    pub fn line(&mut self, s: &str) {
        self.buf.push_str(s);
        self.buf.push('\n');
    }

    /// Appends a line indented by `level` units.
    pub fn indented(&mut self, level: usize, s: &str) {
        for _ in 0..level {
            self.buf.push_str(INDENT);
        }
        self.line(s);
    }

    /// Appends an empty line, unless the buffer already ends with one.
    pub fn blank(&mut self) {
        self.blank_lines(1);
    }

    /// Makes the buffer end with at least `n` empty lines.
    pub fn blank_lines(&mut self, n: usize) {
        if self.buf.is_empty() {
            return;
        }
        let trailing = self.buf.len() - self.buf.trim_end_matches('\n').len();
        for _ in trailing..=n {
            self.buf.push('\n');
        }
    }

    /// Returns the text with exactly one trailing newline.
    #[must_use]
    pub fn finish(mut self) -> String {
        let trimmed = self.buf.trim_end().len();
        self.buf.truncate(trimmed);
        self.buf.push('\n');
        self.buf
    }
}

/// Collapses runs of whitespace (newlines included) into single spaces.
#[must_use]
pub fn normalize_comment(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Writes `content` to `path`, creating parent directories as needed.
///
/// # Errors
///
/// Returns [`CodeGenerationError::Io`] if a directory or the file cannot be
/// written.
pub fn write_file(path: &Path, content: &str) -> Result<(), CodeGenerationError> {
    let io_err = |source| CodeGenerationError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_err)?;
    }
    fs::write(path, content).map_err(io_err)
}
