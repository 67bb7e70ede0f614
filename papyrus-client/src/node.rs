//! Endpoints and node sets.

use crate::error::ClientError;
use papyrus_protocol::DEFAULT_PORT;
use std::fmt;

/// Host used when a node spec omits one.
pub const DEFAULT_HOST: &str = "localhost";

/// A `host:port` server address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    pub port: u16,
}

impl Endpoint {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// One member of a paired node list.
///
/// Mirrors the accepted construction shapes: `("host", port)`, `"host"`
/// alone (default port), a bare port (default host), or nothing at all.
#[derive(Debug, Clone, Default)]
pub enum NodeSpec {
    HostPort(String, u16),
    Host(String),
    Port(u16),
    #[default]
    Default,
}

impl NodeSpec {
    /// Fills in defaults to produce a concrete endpoint.
    pub fn resolve(&self) -> Endpoint {
        match self {
            NodeSpec::HostPort(host, port) => Endpoint::new(host.clone(), *port),
            NodeSpec::Host(host) => Endpoint::new(host.clone(), DEFAULT_PORT),
            NodeSpec::Port(port) => Endpoint::new(DEFAULT_HOST, *port),
            NodeSpec::Default => Endpoint::new(DEFAULT_HOST, DEFAULT_PORT),
        }
    }
}

impl From<(&str, u16)> for NodeSpec {
    fn from((host, port): (&str, u16)) -> Self {
        NodeSpec::HostPort(host.to_string(), port)
    }
}

impl From<(String, u16)> for NodeSpec {
    fn from((host, port): (String, u16)) -> Self {
        NodeSpec::HostPort(host, port)
    }
}

impl From<&str> for NodeSpec {
    fn from(host: &str) -> Self {
        NodeSpec::Host(host.to_string())
    }
}

impl From<u16> for NodeSpec {
    fn from(port: u16) -> Self {
        NodeSpec::Port(port)
    }
}

/// Resolves a paired node list. Exactly two members are required.
pub(crate) fn pair_nodes(specs: &[NodeSpec]) -> Result<Vec<Endpoint>, ClientError> {
    if specs.len() != 2 {
        return Err(ClientError::Argument(format!(
            "paired connection takes exactly two nodes, got {}",
            specs.len()
        )));
    }
    Ok(specs.iter().map(NodeSpec::resolve).collect())
}
