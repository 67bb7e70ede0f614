//! # papyrus-client
//!
//! Synchronous client runtime for papyrus.
//!
//! This crate provides:
//! - A bounded socket pool with blocking checkout and timeout
//! - Server discovery and master election across paired nodes
//! - A request router with fire-and-forget, safe-checked and
//!   reply-bearing operations
//! - Connection URIs, paired construction and saved-auth replay
//! - A minimal database/collection façade

pub mod auth;
pub mod connection;
pub mod db;
pub mod error;
pub mod node;
pub mod uri;

mod pool;
mod socket;

#[cfg(test)]
pub(crate) mod testutil;

pub use auth::SavedAuth;
pub use connection::{Connection, ConnectionConfig, DEFAULT_TIMEOUT};
pub use db::{Batch, Collection, Database};
pub use error::ClientError;
pub use node::{Endpoint, NodeSpec, DEFAULT_HOST};
pub use papyrus_protocol::DEFAULT_PORT;
pub use uri::{parse_uri, ParsedUri};
