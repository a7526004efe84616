//! JSON loader for [`Schema`](crate::Schema) files.

use std::fs;
use std::path::{Path, PathBuf};

use crate::Schema;

/// Failure to load a schema. Raised before any generator stage runs.
#[derive(Debug, thiserror::Error)]
pub enum SchemaLoadError {
    /// The schema file could not be read.
    #[error("failed to read schema file {}", path.display())]
    Io {
        /// Path that was read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The schema document is not valid JSON or does not match the descriptor layout.
    #[error("failed to parse schema {origin}")]
    Parse {
        /// File path or `"<string>"`.
        origin: String,
        /// Underlying parse error (carries line and column).
        #[source]
        source: serde_json::Error,
    },
}

/// Parses a schema from a JSON string.
///
/// # Errors
///
/// Returns [`SchemaLoadError::Parse`] if the document is malformed.
pub fn from_json_str(source: &str) -> Result<Schema, SchemaLoadError> {
    serde_json::from_str(source).map_err(|source| SchemaLoadError::Parse {
        origin: "<string>".to_string(),
        source,
    })
}

/// Reads and parses a schema file.
///
/// # Errors
///
/// Returns [`SchemaLoadError::Io`] if the file cannot be read and
/// [`SchemaLoadError::Parse`] if it is malformed.
pub fn load_json(path: &Path) -> Result<Schema, SchemaLoadError> {
    let text = fs::read_to_string(path).map_err(|source| SchemaLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| SchemaLoadError::Parse {
        origin: path.display().to_string(),
        source,
    })
}
