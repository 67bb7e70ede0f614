//! Protocol error types.

use thiserror::Error;

/// Protocol-level errors that can occur during framing or reply parsing.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("truncated reply: need {needed} bytes, have {have}")]
    TruncatedReply { needed: usize, have: usize },

    #[error("invalid document length {length} at offset {offset}")]
    InvalidDocumentLength { length: i32, offset: usize },

    #[error("invalid message length: {0}")]
    InvalidMessageLength(i32),

    #[error("unknown opcode: {0}")]
    UnknownOpCode(i32),

    #[error("invalid safe mode option: {0}")]
    InvalidSafeOption(String),

    #[error("collection name contains NUL byte: {0:?}")]
    InvalidCollectionName(String),

    #[error("BSON encode error: {0}")]
    Encode(#[from] bson::ser::Error),

    #[error("BSON decode error: {0}")]
    Decode(#[from] bson::de::Error),
}
