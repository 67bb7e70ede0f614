//! Chunk documents.

use crate::error::GridError;
use crate::store::Collection;
use bson::spec::BinarySubtype;
use bson::{doc, oid::ObjectId, Binary, Bson, Document};

/// One fixed-size slice of a logical file, stored as a single document
/// keyed by `(files_id, n)`.
#[derive(Debug, Clone)]
pub struct Chunk {
    id: ObjectId,
    files_id: Bson,
    n: i32,
    pub(crate) data: Vec<u8>,
}

impl Chunk {
    /// A fresh, empty chunk with index `n`.
    pub fn new(files_id: Bson, n: i32) -> Self {
        Self {
            id: ObjectId::new(),
            files_id,
            n,
            data: Vec::new(),
        }
    }

    /// 0-based chunk index within the file.
    pub fn n(&self) -> i32 {
        self.n
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn from_document(doc: &Document) -> Result<Self, GridError> {
        let id = doc
            .get_object_id("_id")
            .map_err(|_| GridError::MalformedDocument("chunk without _id".to_string()))?;
        let files_id = doc
            .get("files_id")
            .cloned()
            .ok_or_else(|| GridError::MalformedDocument("chunk without files_id".to_string()))?;
        let n = doc
            .get_i32("n")
            .map_err(|_| GridError::MalformedDocument("chunk without n".to_string()))?;
        let data = doc
            .get_binary_generic("data")
            .map_err(|_| GridError::MalformedDocument("chunk without data".to_string()))?
            .clone();

        Ok(Self {
            id,
            files_id,
            n,
            data,
        })
    }

    pub fn to_document(&self) -> Document {
        doc! {
            "_id": self.id,
            "files_id": self.files_id.clone(),
            "n": self.n,
            "data": Bson::Binary(Binary {
                subtype: BinarySubtype::Generic,
                bytes: self.data.clone(),
            }),
        }
    }

    /// Write-through persistence: delete-then-insert on `_id`, an
    /// effective upsert.
    pub fn save<C: Collection>(&self, chunks: &C) -> Result<(), GridError> {
        chunks.remove(doc! { "_id": self.id })?;
        chunks.insert(self.to_document())?;
        Ok(())
    }
}
