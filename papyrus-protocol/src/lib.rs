//! # papyrus-protocol
//!
//! Wire protocol implementation for papyrus.
//!
//! This crate provides:
//! - Little-endian message framing (16-byte standard header)
//! - Reply frame parsing (20-byte reply header plus BSON documents)
//! - Body builders for the opcoded message types
//! - Protocol constants and error types
//!
//! The crate is pure: it packs and parses byte buffers but never touches a
//! socket. BSON document encoding and decoding is delegated to the `bson`
//! crate.

pub mod error;
pub mod header;
pub mod message;
pub mod reply;

pub use error::ProtocolError;
pub use header::{MsgHeader, ReplyHeader, HEADER_SIZE, REPLY_HEADER_SIZE};
pub use message::{Message, OpCode};
pub use reply::Reply;

/// Default server port.
pub const DEFAULT_PORT: u16 = 27017;

/// Maximum accepted message size (16 MiB).
pub const MAX_MESSAGE_SIZE: i32 = 16 * 1024 * 1024;
