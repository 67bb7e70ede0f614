//! Chunked-file error types.

use papyrus_client::ClientError;
use thiserror::Error;

/// Chunked-file errors.
#[derive(Debug, Error)]
pub enum GridError {
    #[error("invalid file mode: {0:?}")]
    InvalidMode(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("file not opened for writing")]
    NotWritable,

    #[error("seek is only permitted in read mode")]
    SeekNotAllowed,

    #[error("illegal seek position: {0}")]
    InvalidSeekPosition(i64),

    #[error("malformed stored document: {0}")]
    MalformedDocument(String),

    #[error(transparent)]
    Client(#[from] ClientError),
}
