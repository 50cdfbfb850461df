use thiserror::Error;

/// Errors produced by type operations.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("post id must not be empty")]
    EmptyId,

    #[error("post id contains a control character: {0:?}")]
    InvalidId(String),
}
