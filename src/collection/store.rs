//! Collection store
//!
//! One append-only file per collection. Opening scans every frame, rebuilds
//! the identifier index and recovers the counter as the largest identifier
//! seen. Inserts allocate identifiers and append under one mutex, so
//! identifier order is file order. Lookups go through the index and a shared
//! read handle with positional reads.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::codec::Map;
use crate::config::DatabaseConfig;
use crate::error::{HoardError, HoardResult};
use crate::observability::{log_event_with_fields, Event, Logger, MetricsRegistry, Severity};
use crate::storage::{RecordFrame, StorageReader, StorageWriter};

use super::document::Document;

/// Where a document's frame lives in the collection file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RecordLocation {
    offset: u64,
    frame_len: u32,
}

/// Mutable state guarded by the insert lock
struct WriterState {
    storage: StorageWriter,
    /// Largest identifier ever handed out, 0 if none
    last_id: u64,
}

/// Paging options for [`Collection::find_all`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanOptions {
    /// Maximum number of documents returned
    pub limit: Option<usize>,
    /// Documents skipped before the first one returned
    pub skip: usize,
}

impl ScanOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    pub fn skip(mut self, skip: usize) -> Self {
        self.skip = skip;
        self
    }
}

/// A named collection of documents backed by one file.
///
/// `None` in the writer or reader slot means the collection was closed.
pub struct Collection {
    name: String,
    path: PathBuf,
    max_document_bytes: usize,
    writer: Mutex<Option<WriterState>>,
    index: RwLock<BTreeMap<u64, RecordLocation>>,
    reader: RwLock<Option<File>>,
    metrics: Arc<MetricsRegistry>,
}

impl Collection {
    /// Opens the collection file at `path`, creating it if absent, and
    /// rebuilds the index from its frames.
    ///
    /// # Errors
    ///
    /// - `HOARD_IO_ERROR` if the file cannot be opened
    /// - `HOARD_STORAGE_CORRUPT` if any frame fails verification or decoding,
    ///   or identifiers are not strictly increasing
    pub(crate) fn open(
        name: &str,
        path: &Path,
        config: &DatabaseConfig,
        metrics: Arc<MetricsRegistry>,
    ) -> HoardResult<Self> {
        let path_str = path.display().to_string();
        log_event_with_fields(
            Event::CollectionLoadStart,
            &[("collection", name), ("path", path_str.as_str())],
        );

        let storage = StorageWriter::open(path, config.sync_mode)?;

        let (index, last_id) = match Self::scan(name, path) {
            Ok(scanned) => scanned,
            Err(e) => {
                let error = e.to_string();
                log_event_with_fields(
                    Event::StorageCorruption,
                    &[("collection", name), ("error", error.as_str())],
                );
                return Err(e);
            }
        };

        let read_handle = File::open(path).map_err(|e| {
            HoardError::io_error(format!("Failed to open {} for reading", path_str), e)
        })?;

        let records = index.len() as u64;
        metrics.record_collection_loaded(records);

        let records_str = records.to_string();
        let last_id_str = last_id.to_string();
        log_event_with_fields(
            Event::CollectionLoaded,
            &[
                ("collection", name),
                ("records", records_str.as_str()),
                ("last_id", last_id_str.as_str()),
            ],
        );

        Ok(Self {
            name: name.to_string(),
            path: path.to_path_buf(),
            max_document_bytes: config.max_document_bytes,
            writer: Mutex::new(Some(WriterState { storage, last_id })),
            index: RwLock::new(index),
            reader: RwLock::new(Some(read_handle)),
            metrics,
        })
    }

    fn scan(name: &str, path: &Path) -> HoardResult<(BTreeMap<u64, RecordLocation>, u64)> {
        let mut reader = StorageReader::open(path)?;
        let mut index = BTreeMap::new();
        let mut last_id = 0u64;

        while let Some(frame) = reader.read_next()? {
            let doc = Document::decode_stored(name, frame.offset, &frame.payload)?;
            if doc.id() <= last_id {
                return Err(HoardError::storage_corrupt(format!(
                    "Identifier {} in collection '{}' does not follow {}",
                    doc.id(),
                    name,
                    last_id
                ))
                .with_details(format!("byte_offset: {}", frame.offset)));
            }
            last_id = doc.id();
            index.insert(
                last_id,
                RecordLocation {
                    offset: frame.offset,
                    frame_len: frame.frame_len,
                },
            );
        }

        Ok((index, last_id))
    }

    /// Collection name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Path of the backing file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Inserts one document and returns it with its assigned `_id`.
    ///
    /// Returns only after the frame is synced. On a write failure the
    /// identifier stays consumed and the next insert skips it.
    pub fn insert_one(&self, fields: Map) -> HoardResult<Document> {
        let mut docs = self.append_documents(vec![fields])?;
        docs.pop()
            .ok_or_else(|| HoardError::invalid_document("Insert produced no document"))
    }

    /// Inserts a batch with contiguous identifiers in a single append and
    /// a single sync. Either every document becomes visible or none does.
    pub fn insert_many(&self, batch: Vec<Map>) -> HoardResult<Vec<Document>> {
        if batch.is_empty() {
            if self.is_closed() {
                return Err(HoardError::closed());
            }
            return Ok(Vec::new());
        }
        self.append_documents(batch)
    }

    fn append_documents(&self, batch: Vec<Map>) -> HoardResult<Vec<Document>> {
        let mut writer = lock(&self.writer);
        let state = writer.as_mut().ok_or_else(HoardError::closed)?;

        let first_id = match state.last_id.checked_add(1) {
            Some(id) if state.last_id.checked_add(batch.len() as u64).is_some() => id,
            _ => {
                self.metrics.increment_insert_failures();
                return Err(HoardError::capacity_exceeded(&self.name));
            }
        };

        let mut docs = Vec::with_capacity(batch.len());
        let mut frames = Vec::new();
        let mut lengths = Vec::with_capacity(batch.len());
        for (i, fields) in batch.into_iter().enumerate() {
            let doc = Document::new(first_id + i as u64, fields);
            let payload = doc.encode().map_err(|e| {
                self.metrics.increment_insert_failures();
                HoardError::invalid_document(format!("Document cannot be encoded: {}", e))
            })?;
            if payload.len() > self.max_document_bytes {
                self.metrics.increment_insert_failures();
                return Err(HoardError::invalid_document(format!(
                    "Encoded document is {} bytes, limit is {}",
                    payload.len(),
                    self.max_document_bytes
                )));
            }
            RecordFrame::write_into(&payload, &mut frames);
            lengths.push(RecordFrame::frame_len(payload.len()) as u32);
            docs.push(doc);
        }

        let last_id = first_id + (docs.len() as u64 - 1);
        state.last_id = last_id;

        let offset = match state.storage.append(&frames) {
            Ok(offset) => offset,
            Err(e) => {
                self.metrics.increment_insert_failures();
                let first = first_id.to_string();
                let last = last_id.to_string();
                let error = e.to_string();
                log_event_with_fields(
                    Event::WriteFailed,
                    &[
                        ("collection", self.name.as_str()),
                        ("first_id", first.as_str()),
                        ("last_id", last.as_str()),
                        ("error", error.as_str()),
                    ],
                );
                return Err(e.into());
            }
        };

        {
            let mut index = write(&self.index);
            let mut position = offset;
            for (doc, frame_len) in docs.iter().zip(&lengths) {
                index.insert(
                    doc.id(),
                    RecordLocation {
                        offset: position,
                        frame_len: *frame_len,
                    },
                );
                position += *frame_len as u64;
            }
        }

        self.metrics
            .record_inserts(docs.len() as u64, frames.len() as u64);

        if Logger::enabled(Severity::Trace) {
            let first = first_id.to_string();
            let offset = offset.to_string();
            if docs.len() == 1 {
                log_event_with_fields(
                    Event::DocumentInserted,
                    &[
                        ("collection", self.name.as_str()),
                        ("id", first.as_str()),
                        ("offset", offset.as_str()),
                    ],
                );
            } else {
                let count = docs.len().to_string();
                log_event_with_fields(
                    Event::DocumentsInserted,
                    &[
                        ("collection", self.name.as_str()),
                        ("first_id", first.as_str()),
                        ("count", count.as_str()),
                        ("offset", offset.as_str()),
                    ],
                );
            }
        }

        Ok(docs)
    }

    /// Fetches the document with identifier `id`.
    ///
    /// # Errors
    ///
    /// - `HOARD_NOT_FOUND` if the identifier was never assigned or its write
    ///   failed
    /// - `HOARD_STORAGE_CORRUPT` if the stored frame fails verification
    pub fn get_by_id(&self, id: u64) -> HoardResult<Document> {
        let reader = read(&self.reader);
        let file = reader.as_ref().ok_or_else(HoardError::closed)?;

        let location = read(&self.index).get(&id).copied();
        let location = match location {
            Some(location) => location,
            None => {
                self.metrics.increment_read_misses();
                return Err(HoardError::document_not_found(&self.name, id));
            }
        };

        let doc = self.read_document(file, location)?;
        if doc.id() != id {
            return Err(HoardError::storage_corrupt(format!(
                "Record at indexed position for _id {} in collection '{}' holds _id {}",
                id,
                self.name,
                doc.id()
            ))
            .with_details(format!("byte_offset: {}", location.offset)));
        }

        self.metrics.increment_reads();

        if Logger::enabled(Severity::Trace) {
            let id = id.to_string();
            log_event_with_fields(
                Event::DocumentRead,
                &[("collection", self.name.as_str()), ("id", id.as_str())],
            );
        }

        Ok(doc)
    }

    fn read_document(&self, file: &File, location: RecordLocation) -> HoardResult<Document> {
        let payload = StorageReader::read_frame_at(file, location.offset, location.frame_len)?;
        Document::decode_stored(&self.name, location.offset, &payload)
    }

    /// Documents in identifier order, paged by `options`
    pub fn find_all(&self, options: ScanOptions) -> HoardResult<Vec<Document>> {
        let reader = read(&self.reader);
        let file = reader.as_ref().ok_or_else(HoardError::closed)?;

        let locations: Vec<RecordLocation> = {
            let index = read(&self.index);
            let page = index.values().skip(options.skip);
            match options.limit {
                Some(limit) => page.take(limit).copied().collect(),
                None => page.copied().collect(),
            }
        };

        locations
            .into_iter()
            .map(|location| self.read_document(file, location))
            .collect()
    }

    /// Number of documents stored
    pub fn count(&self) -> HoardResult<usize> {
        self.ensure_open()?;
        Ok(read(&self.index).len())
    }

    /// Largest identifier handed out so far, 0 for an empty collection
    pub fn last_id(&self) -> HoardResult<u64> {
        let writer = lock(&self.writer);
        writer
            .as_ref()
            .map(|state| state.last_id)
            .ok_or_else(HoardError::closed)
    }

    /// Returns whether the collection was closed
    pub fn is_closed(&self) -> bool {
        lock(&self.writer).is_none()
    }

    fn ensure_open(&self) -> HoardResult<()> {
        if self.is_closed() {
            Err(HoardError::closed())
        } else {
            Ok(())
        }
    }

    /// Syncs and releases the file handles. Later operations fail with
    /// `HOARD_CLOSED`. Closing twice is a no-op.
    pub(crate) fn close(&self) -> HoardResult<()> {
        let state = lock(&self.writer).take();
        write(&self.reader).take();

        match state {
            Some(state) => state.storage.sync().map_err(HoardError::from),
            None => Ok(()),
        }
    }

    #[cfg(test)]
    fn set_last_id(&self, last_id: u64) {
        if let Some(state) = lock(&self.writer).as_mut() {
            state.last_id = last_id;
        }
    }
}

impl std::fmt::Debug for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collection")
            .field("name", &self.name)
            .field("path", &self.path)
            .finish()
    }
}

// The index is only published after a durable append, so state behind a
// poisoned lock is still consistent.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

fn read<T>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

fn write<T>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}
