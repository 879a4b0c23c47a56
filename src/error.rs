use std::path::PathBuf;

use thiserror::Error;

/// The selection is not syntactically valid JSON. Displays the parser's
/// message unchanged.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct ParseError(#[from] serde_json::Error);

#[derive(Debug, Error)]
pub enum StorageError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("storage file {path} is corrupt: {source}")]
    Corrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("storage task failed: {0}")]
    Task(String),

    #[error("could not determine a configuration directory; set SNAPPY_LENS_HOME or pass --store-dir")]
    NoConfigDir,
}

impl StorageError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

#[derive(Debug, Error)]
pub enum ClipboardError {
    #[error("{backend} clipboard failed: {message}")]
    Backend { backend: &'static str, message: String },

    #[error("all clipboard mechanisms failed (primary: {primary}; fallback: {fallback})")]
    Exhausted {
        primary: Box<ClipboardError>,
        fallback: Box<ClipboardError>,
    },
}

impl ClipboardError {
    pub fn backend(backend: &'static str, message: impl ToString) -> Self {
        Self::Backend { backend, message: message.to_string() }
    }
}

#[derive(Debug, Error)]
pub enum MessageError {
    #[error("no responder is listening")]
    Disconnected,

    #[error("responder dropped the request")]
    Dropped,

    #[error("malformed message: {0}")]
    Malformed(#[from] serde_json::Error),
}
