//! Error types for filemap-fs

use std::path::PathBuf;

/// Result type for filemap-fs operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in filemap-fs operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Lock acquisition failed for {path}")]
    LockFailed { path: PathBuf },

    #[error("Handle for {path} does not support backup")]
    BackupUnsupported { path: PathBuf },
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
