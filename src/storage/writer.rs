//! Append-only frame writer with fsync enforcement
//!
//! - Frames are only ever appended; nothing is rewritten in place
//! - Every append is followed by a sync before it is acknowledged
//! - A failed append is truncated away so the file never keeps a torn frame
//!   from a write this process reported as failed

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::errors::{StorageError, StorageResult};
use crate::crash_point::{maybe_crash, points};
use crate::observability::Logger;

/// How appends are made durable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// `fsync`: data and metadata
    #[default]
    Fsync,
    /// `fdatasync`: data and the metadata needed to read it back
    Fdatasync,
}

impl SyncMode {
    /// Returns the configuration string for this mode
    pub fn as_str(&self) -> &'static str {
        match self {
            SyncMode::Fsync => "fsync",
            SyncMode::Fdatasync => "fdatasync",
        }
    }
}

/// Append-only writer for one collection file.
pub struct StorageWriter {
    storage_path: PathBuf,
    file: File,
    /// End of the last acknowledged frame
    current_offset: u64,
    sync_mode: SyncMode,
    /// Set when a failed append could not be rolled back; the on-disk end no
    /// longer matches `current_offset`, so further appends are refused
    poisoned: bool,
}

impl StorageWriter {
    /// Opens or creates the collection file at `storage_path`.
    ///
    /// # Errors
    ///
    /// Returns `HOARD_STORAGE_IO_ERROR` if the file cannot be created or opened.
    pub fn open(storage_path: &Path, sync_mode: SyncMode) -> StorageResult<Self> {
        let existed = storage_path.exists();

        let file = OpenOptions::new()
            .create(true)
            .read(true)
            .append(true)
            .open(storage_path)
            .map_err(|e| {
                StorageError::io_error(
                    format!("Failed to open storage file: {}", storage_path.display()),
                    e,
                )
            })?;

        if !existed {
            sync_parent_dir(storage_path)?;
        }

        let current_offset = file
            .metadata()
            .map_err(|e| StorageError::io_error("Failed to read file metadata", e))?
            .len();

        Ok(Self {
            storage_path: storage_path.to_path_buf(),
            file,
            current_offset,
            sync_mode,
            poisoned: false,
        })
    }

    /// Returns the path to the storage file.
    pub fn path(&self) -> &Path {
        &self.storage_path
    }

    /// Returns the offset one past the last acknowledged frame.
    pub fn current_offset(&self) -> u64 {
        self.current_offset
    }

    /// Appends already-framed bytes and syncs them.
    ///
    /// # Returns
    ///
    /// The byte offset where the bytes begin.
    ///
    /// # Errors
    ///
    /// Returns `HOARD_STORAGE_WRITE_FAILED` if the write or the sync fails.
    /// The file is truncated back to its previous end before returning.
    pub fn append(&mut self, bytes: &[u8]) -> StorageResult<u64> {
        if self.poisoned {
            return Err(StorageError::write_failed(
                "Storage file has an unrecoverable partial append; reopen the database",
                std::io::Error::new(std::io::ErrorKind::Other, "writer poisoned"),
            ));
        }

        let offset = self.current_offset;

        maybe_crash(points::STORAGE_BEFORE_APPEND);

        if let Err(e) = self.file.write_all(bytes) {
            self.rollback(offset);
            return Err(StorageError::write_failed(
                format!("Failed to append {} bytes at offset {}", bytes.len(), offset),
                e,
            ));
        }

        maybe_crash(points::STORAGE_AFTER_APPEND);

        if let Err(e) = self.sync() {
            self.rollback(offset);
            return Err(e);
        }

        maybe_crash(points::STORAGE_AFTER_FSYNC);

        self.current_offset += bytes.len() as u64;
        Ok(offset)
    }

    /// Syncs the file according to the configured mode.
    pub fn sync(&self) -> StorageResult<()> {
        let result = match self.sync_mode {
            SyncMode::Fsync => self.file.sync_all(),
            SyncMode::Fdatasync => self.file.sync_data(),
        };
        result.map_err(|e| {
            StorageError::write_failed(
                format!("{} failed for {}", self.sync_mode.as_str(), self.storage_path.display()),
                e,
            )
        })
    }

    fn rollback(&mut self, offset: u64) {
        let truncated = self
            .file
            .set_len(offset)
            .and_then(|_| self.file.sync_all());

        if let Err(e) = truncated {
            self.poisoned = true;
            let path = self.storage_path.display().to_string();
            let offset = offset.to_string();
            let error = e.to_string();
            Logger::error(
                "STORAGE_ROLLBACK_FAILED",
                &[
                    ("path", path.as_str()),
                    ("offset", offset.as_str()),
                    ("error", error.as_str()),
                ],
            );
        }
    }
}

#[cfg(unix)]
fn sync_parent_dir(path: &Path) -> StorageResult<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => return Ok(()),
    };
    File::open(parent)
        .and_then(|dir| dir.sync_all())
        .map_err(|e| {
            StorageError::io_error(
                format!("Failed to sync directory: {}", parent.display()),
                e,
            )
        })
}

#[cfg(not(unix))]
fn sync_parent_dir(_path: &Path) -> StorageResult<()> {
    Ok(())
}
