use std::io;
use std::path::PathBuf;

/// Errors produced by remote store operations.
#[derive(Debug, thiserror::Error)]
pub enum RemoteError {
    /// No live connection to the replicated store.
    #[error("remote store unavailable")]
    Unavailable,

    /// I/O error while reading or writing the journal.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// Serialization or deserialization failure.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Journal file not found or inaccessible.
    #[error("journal path not found: {0}")]
    JournalPathNotFound(PathBuf),

    /// A write named an empty namespace, id, or field.
    #[error("invalid key: {0}")]
    InvalidKey(String),
}

/// Convenience alias used throughout the remote crate.
pub type Result<T> = std::result::Result<T, RemoteError>;
