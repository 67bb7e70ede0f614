//! The storage seam of the chunked-file engine.

use bson::Document;
use papyrus_client::{ClientError, Collection as WireCollection};

/// What the chunked-file engine needs from a collection: point lookups,
/// inserts, deletes, index creation, and commands against the parent
/// database (`filemd5` at close). The engine never touches sockets
/// directly; everything goes through this seam.
pub trait Collection {
    fn find_one(&self, selector: Document) -> Result<Option<Document>, ClientError>;

    fn insert(&self, document: Document) -> Result<(), ClientError>;

    fn remove(&self, selector: Document) -> Result<(), ClientError>;

    fn create_index(&self, keys: &[(&str, i32)]) -> Result<(), ClientError>;

    /// Runs a command against the collection's parent database.
    fn command(&self, cmd: Document) -> Result<Document, ClientError>;
}

impl Collection for WireCollection<'_> {
    fn find_one(&self, selector: Document) -> Result<Option<Document>, ClientError> {
        WireCollection::find_one(self, &selector)
    }

    fn insert(&self, document: Document) -> Result<(), ClientError> {
        WireCollection::insert(self, &[document], None)
    }

    fn remove(&self, selector: Document) -> Result<(), ClientError> {
        WireCollection::remove(self, &selector, None)
    }

    fn create_index(&self, keys: &[(&str, i32)]) -> Result<(), ClientError> {
        WireCollection::create_index(self, keys).map(|_| ())
    }

    fn command(&self, cmd: Document) -> Result<Document, ClientError> {
        self.database().command(cmd)
    }
}
