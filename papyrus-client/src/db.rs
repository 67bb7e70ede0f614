//! Minimal database and collection façade.
//!
//! Thin wrappers over the request router: build a message body, route it,
//! check the reply envelope. The chunked-file layer and credential replay
//! are its main clients.

use crate::auth;
use crate::connection::{doc_number, Connection};
use crate::error::ClientError;
use bson::{doc, Document};
use papyrus_protocol::{message, OpCode};

/// A handle on one logical database of a connection.
pub struct Database<'a> {
    conn: &'a Connection,
    name: String,
}

impl<'a> Database<'a> {
    pub(crate) fn new(conn: &'a Connection, name: impl Into<String>) -> Self {
        Self {
            conn,
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn collection(&self, name: &str) -> Collection<'a> {
        Collection {
            conn: self.conn,
            db_name: self.name.clone(),
            name: name.to_string(),
        }
    }

    /// Runs a command against this database and returns its reply
    /// document. A reply without `ok == 1` is an `Operation` failure.
    pub fn command(&self, cmd: Document) -> Result<Document, ClientError> {
        let body = message::query_body(&format!("{}.$cmd", self.name), 0, 0, -1, &cmd)?;
        let (docs, _, _) = self.conn.receive(OpCode::Query, &body, None, None)?;
        let doc = docs
            .into_iter()
            .next()
            .ok_or_else(|| ClientError::Operation("command returned no document".to_string()))?;

        if doc_number(&doc, "ok") != Some(1.0) {
            let text = doc
                .get_str("errmsg")
                .unwrap_or("command failed")
                .to_string();
            return Err(ClientError::Operation(text));
        }
        Ok(doc)
    }

    /// Authenticates against this database and saves the credential for
    /// replay on reconnection.
    pub fn authenticate(&self, username: &str, password: &str) -> Result<(), ClientError> {
        self.issue_authentication(username, password)?;
        self.conn.add_auth(&self.name, username, password);
        Ok(())
    }

    /// Runs the nonce handshake without touching the saved-auth list; the
    /// connector replays credentials through this.
    pub(crate) fn issue_authentication(
        &self,
        username: &str,
        password: &str,
    ) -> Result<(), ClientError> {
        let nonce_doc = self.command(doc! { "getnonce": 1i32 }).map_err(|e| {
            ClientError::Authentication(format!("getnonce against {} failed: {}", self.name, e))
        })?;
        let nonce = nonce_doc.get_str("nonce").map_err(|_| {
            ClientError::Authentication("getnonce reply carried no nonce".to_string())
        })?;

        let key = auth::auth_key(username, password, nonce);
        let cmd = doc! { "authenticate": 1i32, "user": username, "nonce": nonce, "key": key };
        self.command(cmd).map_err(|_| {
            ClientError::Authentication(format!(
                "failed to authenticate '{}' against {}",
                username, self.name
            ))
        })?;
        Ok(())
    }
}

/// The initial batch of a query reply. Cursor continuation is not part of
/// this client; the id is surfaced untouched.
#[derive(Debug, Clone)]
pub struct Batch {
    pub documents: Vec<Document>,
    pub cursor_id: i64,
}

/// A handle on one collection.
pub struct Collection<'a> {
    conn: &'a Connection,
    db_name: String,
    name: String,
}

impl<'a> Collection<'a> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn full_name(&self) -> String {
        format!("{}.{}", self.db_name, self.name)
    }

    /// The parent database handle.
    pub fn database(&self) -> Database<'a> {
        Database {
            conn: self.conn,
            name: self.db_name.clone(),
        }
    }

    /// Inserts documents. With `safe`, a `getLastError` round trip
    /// confirms the write.
    pub fn insert(&self, docs: &[Document], safe: Option<&Document>) -> Result<(), ClientError> {
        let full = self.full_name();
        let body = message::insert_body(&full, docs)?;
        let log = format!("insert into {}", full);
        match safe {
            Some(opts) => {
                self.conn
                    .send_with_safe_check(OpCode::Insert, &body, &self.db_name, opts, Some(&log))?;
                Ok(())
            }
            None => self.conn.send(OpCode::Insert, &body, Some(&log)),
        }
    }

    /// Removes documents matching `selector`.
    pub fn remove(&self, selector: &Document, safe: Option<&Document>) -> Result<(), ClientError> {
        let full = self.full_name();
        let body = message::delete_body(&full, selector)?;
        let log = format!("remove from {}", full);
        match safe {
            Some(opts) => {
                self.conn
                    .send_with_safe_check(OpCode::Delete, &body, &self.db_name, opts, Some(&log))?;
                Ok(())
            }
            None => self.conn.send(OpCode::Delete, &body, Some(&log)),
        }
    }

    /// Runs a query and returns the initial batch.
    pub fn find(&self, selector: &Document, n_return: i32) -> Result<Batch, ClientError> {
        let full = self.full_name();
        let body = message::query_body(&full, 0, 0, n_return, selector)?;
        let (documents, _, cursor_id) =
            self.conn
                .receive(OpCode::Query, &body, Some(&format!("query {}", full)), None)?;
        Ok(Batch {
            documents,
            cursor_id,
        })
    }

    pub fn find_one(&self, selector: &Document) -> Result<Option<Document>, ClientError> {
        Ok(self.find(selector, -1)?.documents.into_iter().next())
    }

    /// Ensures an index, returning its generated name.
    pub fn create_index(&self, keys: &[(&str, i32)]) -> Result<String, ClientError> {
        let mut key_doc = Document::new();
        let mut name_parts = Vec::with_capacity(keys.len());
        for (field, direction) in keys {
            key_doc.insert(field.to_string(), *direction);
            name_parts.push(format!("{}_{}", field, direction));
        }
        let name = name_parts.join("_");

        let index = doc! { "name": &name, "ns": self.full_name(), "key": key_doc };
        let body = message::insert_body(&format!("{}.system.indexes", self.db_name), &[index])?;
        self.conn.send(
            OpCode::Insert,
            &body,
            Some(&format!("index {} on {}", name, self.full_name())),
        )?;
        Ok(name)
    }
}
