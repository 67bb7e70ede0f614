//! In-memory collection store for tests.

use crate::store::Collection;
use bson::{doc, Document};
use papyrus_client::ClientError;
use parking_lot::Mutex;
use std::sync::Arc;

/// A `Collection` over a shared in-memory document list. Selectors match
/// on key-by-key equality, which covers every lookup the engine issues.
#[derive(Clone, Default)]
pub(crate) struct MemCollection {
    docs: Arc<Mutex<Vec<Document>>>,
    indexes: Arc<Mutex<Vec<String>>>,
}

impl MemCollection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a document directly, bypassing the trait.
    pub fn insert_raw(&self, document: Document) {
        self.docs.lock().push(document);
    }

    pub fn all(&self) -> Vec<Document> {
        self.docs.lock().clone()
    }

    pub fn indexes(&self) -> Vec<String> {
        self.indexes.lock().clone()
    }
}

fn matches(doc: &Document, selector: &Document) -> bool {
    selector.iter().all(|(key, value)| doc.get(key) == Some(value))
}

impl Collection for MemCollection {
    fn find_one(&self, selector: Document) -> Result<Option<Document>, ClientError> {
        Ok(self
            .docs
            .lock()
            .iter()
            .find(|doc| matches(doc, &selector))
            .cloned())
    }

    fn insert(&self, document: Document) -> Result<(), ClientError> {
        self.docs.lock().push(document);
        Ok(())
    }

    fn remove(&self, selector: Document) -> Result<(), ClientError> {
        self.docs.lock().retain(|doc| !matches(doc, &selector));
        Ok(())
    }

    fn create_index(&self, keys: &[(&str, i32)]) -> Result<(), ClientError> {
        let name = keys
            .iter()
            .map(|(field, direction)| format!("{}_{}", field, direction))
            .collect::<Vec<_>>()
            .join("_");
        self.indexes.lock().push(name);
        Ok(())
    }

    fn command(&self, cmd: Document) -> Result<Document, ClientError> {
        if cmd.contains_key("filemd5") {
            return Ok(doc! { "md5": "d41d8cd98f00b204e9800998ecf8427e", "ok": 1.0 });
        }
        Ok(doc! { "ok": 1.0 })
    }
}
