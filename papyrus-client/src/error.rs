//! Client error types.

use papyrus_protocol::ProtocolError;
use thiserror::Error;

/// Client errors.
///
/// `ConnectionFailure` is the only kind that tears the connection down;
/// the next operation re-runs the connector. `PoolTimeout` leaves the
/// connection intact and may simply be retried.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Malformed caller input: URI, pair arity, port, safe-mode option.
    #[error("argument error: {0}")]
    Argument(String),

    /// Connecting to a non-master single node without slave consent.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Socket-level failure, short read, or closed peer.
    #[error("connection failure: {0}")]
    ConnectionFailure(String),

    /// Pool checkout exceeded its timeout.
    #[error("timed out waiting for an available socket")]
    PoolTimeout,

    /// Credential replay or explicit authentication failed.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// Server-reported `err`/`errmsg` in a reply document.
    #[error("operation failure: {0}")]
    Operation(String),
}

impl From<ProtocolError> for ClientError {
    fn from(err: ProtocolError) -> Self {
        match err {
            // Caller mistakes surface as argument errors; everything else
            // means the stream is unusable.
            ProtocolError::InvalidSafeOption(_) | ProtocolError::InvalidCollectionName(_) => {
                ClientError::Argument(err.to_string())
            }
            other => ClientError::ConnectionFailure(other.to_string()),
        }
    }
}
