//! Saved authentication credentials and digest helpers.

use md5::{Digest, Md5};

/// A credential saved on the connection, replayed after every successful
/// master (re)connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedAuth {
    pub db_name: String,
    pub username: String,
    pub password: String,
}

impl SavedAuth {
    pub fn new(
        db_name: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            db_name: db_name.into(),
            username: username.into(),
            password: password.into(),
        }
    }
}

/// Ordered saved-auth list, keyed by database name.
#[derive(Debug, Default)]
pub(crate) struct AuthStore {
    auths: Vec<SavedAuth>,
}

impl AuthStore {
    /// Saves a credential. An existing entry for the same database is
    /// replaced in place, keeping its position in replay order.
    pub fn add(&mut self, auth: SavedAuth) {
        match self.auths.iter_mut().find(|a| a.db_name == auth.db_name) {
            Some(existing) => *existing = auth,
            None => self.auths.push(auth),
        }
    }

    /// Removes the credential for `db_name`, reporting whether one existed.
    pub fn remove(&mut self, db_name: &str) -> bool {
        let before = self.auths.len();
        self.auths.retain(|a| a.db_name != db_name);
        self.auths.len() != before
    }

    pub fn clear(&mut self) {
        self.auths.clear();
    }

    /// All saved credentials in insertion order.
    pub fn all(&self) -> Vec<SavedAuth> {
        self.auths.clone()
    }

    pub fn len(&self) -> usize {
        self.auths.len()
    }
}

/// The stored password digest: `md5("<user>:papyrus:<pass>")`.
pub(crate) fn password_digest(username: &str, password: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(username.as_bytes());
    hasher.update(b":papyrus:");
    hasher.update(password.as_bytes());
    hex::encode(hasher.finalize())
}

/// The nonce-bound key sent in an `authenticate` command:
/// `md5(nonce + user + password_digest)`.
pub(crate) fn auth_key(username: &str, password: &str, nonce: &str) -> String {
    let mut hasher = Md5::new();
    hasher.update(nonce.as_bytes());
    hasher.update(username.as_bytes());
    hasher.update(password_digest(username, password).as_bytes());
    hex::encode(hasher.finalize())
}
