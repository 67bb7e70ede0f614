//! Seekable, position-tracked chunked files.
//!
//! A `GridFile` maps one logical byte stream onto a files document plus
//! an ordered set of chunk documents. Writes persist each touched chunk
//! immediately; `close` finalizes the files document with the computed
//! length, the upload date and the server-side digest.

use crate::chunk::Chunk;
use crate::error::GridError;
use crate::store::Collection;
use crate::{DEFAULT_CHUNK_SIZE, DEFAULT_CONTENT_TYPE};
use bson::{doc, oid::ObjectId, Bson, Document};

/// File open mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// `"r"`: read an existing file from the start.
    Read,
    /// `"w"`: write a fresh file, discarding any previous chunks.
    Write,
    /// `"w+"`: append to an existing file (or start a fresh one).
    Append,
}

impl Mode {
    /// Parses the conventional mode strings `"r"`, `"w"` and `"w+"`.
    pub fn parse(mode: &str) -> Result<Self, GridError> {
        match mode {
            "r" => Ok(Mode::Read),
            "w" => Ok(Mode::Write),
            "w+" => Ok(Mode::Append),
            other => Err(GridError::InvalidMode(other.to_string())),
        }
    }

    fn is_write(self) -> bool {
        matches!(self, Mode::Write | Mode::Append)
    }
}

/// Position origin for `seek`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Whence {
    Set,
    Cur,
    End,
}

/// Options accepted by `GridFile::open`.
#[derive(Debug, Clone, Default)]
pub struct OpenOptions {
    pub chunk_size: Option<usize>,
    pub content_type: Option<String>,
    pub files_id: Option<Bson>,
    pub metadata: Option<Document>,
    pub aliases: Option<Vec<String>>,
    /// Extra selector fields merged into the files-collection lookup.
    pub criteria: Option<Document>,
}

impl OpenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = Some(chunk_size);
        self
    }

    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    pub fn with_files_id(mut self, files_id: Bson) -> Self {
        self.files_id = Some(files_id);
        self
    }

    pub fn with_metadata(mut self, metadata: Document) -> Self {
        self.metadata = Some(metadata);
        self
    }

    pub fn with_aliases(mut self, aliases: Vec<String>) -> Self {
        self.aliases = Some(aliases);
        self
    }

    pub fn with_criteria(mut self, criteria: Document) -> Self {
        self.criteria = Some(criteria);
        self
    }
}

/// A chunked file open over a `(files, chunks)` collection pair.
pub struct GridFile<C: Collection> {
    files: C,
    chunks: C,
    filename: String,
    mode: Mode,
    files_id: Bson,
    content_type: String,
    chunk_size: usize,
    metadata: Option<Document>,
    aliases: Option<Vec<String>>,
    length: u64,
    upload_date: Option<bson::DateTime>,
    md5: Option<String>,
    current_chunk: Chunk,
    file_position: u64,
    chunk_position: usize,
}

impl<C: Collection> GridFile<C> {
    /// Opens `filename` in the given mode.
    ///
    /// The files collection is consulted first (with any `criteria`
    /// merged into the selector); an existing document supplies the
    /// file's attributes, otherwise a fresh `files_id` is minted.
    pub fn open(
        files: C,
        chunks: C,
        filename: &str,
        mode: Mode,
        options: OpenOptions,
    ) -> Result<Self, GridError> {
        let mut selector = doc! { "filename": filename };
        if let Some(criteria) = &options.criteria {
            for (key, value) in criteria {
                selector.insert(key.clone(), value.clone());
            }
        }
        let existing = files.find_one(selector)?;
        tracing::debug!(
            target: "papyrus::grid",
            "open {:?} mode={:?} exists={}",
            filename,
            mode,
            existing.is_some()
        );

        let mut file = match &existing {
            Some(doc) => {
                let files_id = doc.get("_id").cloned().ok_or_else(|| {
                    GridError::MalformedDocument("files document without _id".to_string())
                })?;
                Self {
                    current_chunk: Chunk::new(files_id.clone(), 0),
                    files_id,
                    content_type: doc
                        .get_str("contentType")
                        .unwrap_or(DEFAULT_CONTENT_TYPE)
                        .to_string(),
                    chunk_size: doc
                        .get_i32("chunkSize")
                        .map(|v| v as usize)
                        .unwrap_or(DEFAULT_CHUNK_SIZE),
                    length: doc.get_i64("length").unwrap_or(0) as u64,
                    upload_date: doc.get_datetime("uploadDate").ok().copied(),
                    metadata: doc.get_document("metadata").ok().cloned(),
                    aliases: doc.get_array("aliases").ok().map(|arr| {
                        arr.iter()
                            .filter_map(|b| b.as_str().map(str::to_string))
                            .collect()
                    }),
                    md5: doc.get_str("md5").ok().map(str::to_string),
                    files,
                    chunks,
                    filename: filename.to_string(),
                    mode,
                    file_position: 0,
                    chunk_position: 0,
                }
            }
            None => {
                let files_id = options
                    .files_id
                    .clone()
                    .unwrap_or_else(|| Bson::ObjectId(ObjectId::new()));
                Self {
                    current_chunk: Chunk::new(files_id.clone(), 0),
                    files_id,
                    content_type: options
                        .content_type
                        .clone()
                        .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
                    chunk_size: options.chunk_size.unwrap_or(DEFAULT_CHUNK_SIZE),
                    length: 0,
                    upload_date: None,
                    metadata: options.metadata.clone(),
                    aliases: options.aliases.clone(),
                    md5: None,
                    files,
                    chunks,
                    filename: filename.to_string(),
                    mode,
                    file_position: 0,
                    chunk_position: 0,
                }
            }
        };

        match mode {
            Mode::Read => {
                if existing.is_none() {
                    return Err(GridError::FileNotFound(filename.to_string()));
                }
                if let Some(chunk) = file.get_chunk(0)? {
                    file.current_chunk = chunk;
                }
            }
            Mode::Write => {
                file.chunks
                    .remove(doc! { "files_id": file.files_id.clone() })?;
                file.chunks.create_index(&[("files_id", 1), ("n", 1)])?;
                file.current_chunk = Chunk::new(file.files_id.clone(), 0);
                file.length = 0;
            }
            Mode::Append => {
                file.chunks.create_index(&[("files_id", 1), ("n", 1)])?;
                if let Some(chunk) = file.get_chunk(file.last_chunk_number())? {
                    file.current_chunk = chunk;
                }
                file.chunk_position = file.current_chunk.len();
                file.file_position = file.length;
            }
        }

        Ok(file)
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn files_id(&self) -> &Bson {
        &self.files_id
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// Total file length in bytes.
    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn upload_date(&self) -> Option<bson::DateTime> {
        self.upload_date
    }

    pub fn md5(&self) -> Option<&str> {
        self.md5.as_deref()
    }

    /// Current absolute position.
    pub fn tell(&self) -> u64 {
        self.file_position
    }

    /// Reads up to `length` bytes from the current position; `None` reads
    /// to the end of the file. Reads past the final chunk return what is
    /// available.
    pub fn read(&mut self, length: Option<usize>) -> Result<Vec<u8>, GridError> {
        if length == Some(0) {
            return Ok(Vec::new());
        }

        // Whole-file fast path.
        if length.is_none() && self.file_position == 0 {
            return self.read_all();
        }

        let remaining_in_file = self.length.saturating_sub(self.file_position) as usize;
        let want = length.unwrap_or(remaining_in_file);

        let mut buf = Vec::with_capacity(want.min(remaining_in_file));
        while buf.len() < want {
            let available = self.current_chunk.len().saturating_sub(self.chunk_position);
            if available == 0 {
                if self.current_chunk.n() >= self.last_chunk_number() {
                    break;
                }
                match self.get_chunk(self.current_chunk.n() + 1)? {
                    Some(next) => {
                        self.current_chunk = next;
                        self.chunk_position = 0;
                    }
                    None => break,
                }
                continue;
            }

            let take = available.min(want - buf.len());
            let start = self.chunk_position;
            buf.extend_from_slice(&self.current_chunk.data[start..start + take]);
            self.chunk_position += take;
            self.file_position += take as u64;
        }

        // Keep the cursor on the chunk holding the current position.
        if self.chunk_position == self.chunk_size {
            if let Some(next) = self.get_chunk(self.current_chunk.n() + 1)? {
                self.current_chunk = next;
                self.chunk_position = 0;
            }
        }

        Ok(buf)
    }

    fn read_all(&mut self) -> Result<Vec<u8>, GridError> {
        let mut buf = Vec::with_capacity(self.length as usize);
        buf.extend_from_slice(&self.current_chunk.data);

        while self.current_chunk.n() < self.last_chunk_number() {
            match self.get_chunk(self.current_chunk.n() + 1)? {
                Some(next) => {
                    self.current_chunk = next;
                    buf.extend_from_slice(&self.current_chunk.data);
                }
                None => break,
            }
        }

        self.chunk_position = self.current_chunk.len();
        self.file_position = buf.len() as u64;
        Ok(buf)
    }

    /// Appends `data` at the current position, persisting every touched
    /// chunk as it goes. Returns the number of bytes written.
    pub fn write(&mut self, data: &[u8]) -> Result<usize, GridError> {
        if !self.mode.is_write() {
            return Err(GridError::NotWritable);
        }

        let mut remaining = data;
        while !remaining.is_empty() {
            if self.chunk_position == self.chunk_size {
                // Current chunk is full: persist it and start the next.
                self.current_chunk.save(&self.chunks)?;
                let next_n = self.current_chunk.n() + 1;
                self.current_chunk = Chunk::new(self.files_id.clone(), next_n);
                self.chunk_position = 0;
            }

            let space = self.chunk_size - self.chunk_position;
            let take = space.min(remaining.len());
            self.current_chunk.data.extend_from_slice(&remaining[..take]);
            self.chunk_position += take;
            self.file_position += take as u64;
            self.current_chunk.save(&self.chunks)?;
            remaining = &remaining[take..];
        }

        self.length = self.length.max(self.file_position);
        Ok(data.len())
    }

    /// Repositions the read cursor, fetching the target chunk when it
    /// differs from the current one. Returns the new absolute position.
    pub fn seek(&mut self, pos: i64, whence: Whence) -> Result<u64, GridError> {
        if self.mode != Mode::Read {
            return Err(GridError::SeekNotAllowed);
        }

        let base = match whence {
            Whence::Set => 0,
            Whence::Cur => self.file_position as i64,
            Whence::End => self.length as i64,
        };
        let target = base + pos;
        if target < 0 {
            return Err(GridError::InvalidSeekPosition(target));
        }
        let target = target as u64;

        let target_chunk = (target / self.chunk_size as u64) as i32;
        if target_chunk != self.current_chunk.n() {
            self.current_chunk = self
                .get_chunk(target_chunk)?
                .unwrap_or_else(|| Chunk::new(self.files_id.clone(), target_chunk));
        }
        self.file_position = target;
        self.chunk_position = (target % self.chunk_size as u64) as usize;
        Ok(self.file_position)
    }

    /// Finalizes the file. In write modes the length is computed from the
    /// cursor, the upload date is set on first close only, the digest is
    /// requested from the server via `filemd5`, and the files document is
    /// rewritten. Read-mode close is a no-op.
    pub fn close(&mut self) -> Result<(), GridError> {
        if !self.mode.is_write() {
            return Ok(());
        }

        self.length =
            self.current_chunk.n() as u64 * self.chunk_size as u64 + self.chunk_position as u64;
        if self.upload_date.is_none() {
            self.upload_date = Some(bson::DateTime::now());
        }

        let digest = self
            .files
            .command(doc! { "filemd5": self.files_id.clone() })?;
        self.md5 = digest.get_str("md5").ok().map(str::to_string);

        self.files.remove(doc! { "_id": self.files_id.clone() })?;
        self.files.insert(self.files_document())?;
        tracing::debug!(
            target: "papyrus::grid",
            "finalized {:?}: {} bytes in {} chunks",
            self.filename,
            self.length,
            self.current_chunk.n() + 1
        );
        Ok(())
    }

    fn files_document(&self) -> Document {
        doc! {
            "_id": self.files_id.clone(),
            "filename": &self.filename,
            "contentType": &self.content_type,
            "length": self.length as i64,
            "chunkSize": self.chunk_size as i32,
            "uploadDate": self.upload_date,
            "aliases": self.aliases.clone(),
            "metadata": self.metadata.clone(),
            "md5": self.md5.clone(),
        }
    }

    /// Index of the final chunk implied by the recorded length.
    fn last_chunk_number(&self) -> i32 {
        if self.length == 0 {
            0
        } else {
            ((self.length - 1) / self.chunk_size as u64) as i32
        }
    }

    fn get_chunk(&self, n: i32) -> Result<Option<Chunk>, GridError> {
        let selector = doc! { "files_id": self.files_id.clone(), "n": n };
        match self.chunks.find_one(selector)? {
            Some(doc) => Ok(Some(Chunk::from_document(&doc)?)),
            None => Ok(None),
        }
    }
}
