//! Connection URI parsing.
//!
//! Grammar: `papyrus://[user:pass@]host1[:port1][,host2[:port2]...][/db]`.
//!
//! Credentials and the database name may appear on any host spec (the
//! database conventionally trails the last one). If any of user, password
//! or database is present, all three must be; each spec carrying
//! credentials yields one saved auth against that database.

use crate::auth::SavedAuth;
use crate::error::ClientError;
use crate::node::Endpoint;
use papyrus_protocol::DEFAULT_PORT;

const SCHEME: &str = "papyrus://";

/// The outcome of parsing a connection URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedUri {
    pub nodes: Vec<Endpoint>,
    pub auths: Vec<SavedAuth>,
}

/// Parses a connection URI into a node list and saved auths.
pub fn parse_uri(uri: &str) -> Result<ParsedUri, ClientError> {
    let rest = uri.strip_prefix(SCHEME).ok_or_else(|| {
        ClientError::Argument(format!("connection URI must begin with '{}'", SCHEME))
    })?;
    if rest.is_empty() {
        return Err(ClientError::Argument("empty connection URI".to_string()));
    }

    let mut nodes = Vec::new();
    let mut credentialed = Vec::new();
    let mut db_name: Option<String> = None;

    for spec in rest.split(',') {
        let (creds, host_part) = match spec.split_once('@') {
            Some((creds, host_part)) => (Some(creds), host_part),
            None => (None, spec),
        };

        let (host_port, db) = match host_part.split_once('/') {
            Some((host_port, db)) => (host_port, Some(db)),
            None => (host_part, None),
        };

        let (host, port) = match host_port.split_once(':') {
            Some((host, port)) => {
                let port = port.parse::<u16>().map_err(|_| {
                    ClientError::Argument(format!("invalid port in connection URI: '{}'", port))
                })?;
                (host, port)
            }
            None => (host_port, DEFAULT_PORT),
        };
        if host.is_empty() {
            return Err(ClientError::Argument(format!(
                "missing host in connection URI spec '{}'",
                spec
            )));
        }

        if let Some(db) = db {
            if db.is_empty() {
                return Err(ClientError::Argument(
                    "missing database name in connection URI".to_string(),
                ));
            }
            db_name = Some(db.to_string());
        }

        if let Some(creds) = creds {
            let (user, pass) = creds.split_once(':').ok_or_else(|| {
                ClientError::Argument(
                    "connection URI credentials must be 'user:pass'".to_string(),
                )
            })?;
            if user.is_empty() || pass.is_empty() {
                return Err(ClientError::Argument(
                    "connection URI credentials must be 'user:pass'".to_string(),
                ));
            }
            credentialed.push((user.to_string(), pass.to_string()));
        }

        nodes.push(Endpoint::new(host, port));
    }

    let auths = match (&db_name, credentialed.is_empty()) {
        (Some(db), false) => credentialed
            .into_iter()
            .map(|(user, pass)| SavedAuth::new(db.clone(), user, pass))
            .collect(),
        (None, true) => Vec::new(),
        // One of {user, pass, db} without the others.
        _ => {
            return Err(ClientError::Argument(
                "connection URI must supply all of username, password and database, or none"
                    .to_string(),
            ))
        }
    };

    Ok(ParsedUri { nodes, auths })
}
