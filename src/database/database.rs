//! Database handle
//!
//! A database is a directory. Each collection lives in `<root>/<name>.hoard`
//! and is loaded the first time it is asked for. The database is `Open`
//! until [`Database::close`], after which every operation, including those on
//! collection handles obtained earlier, fails with `HOARD_CLOSED`.

use std::collections::{BTreeSet, HashMap};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, TryLockError};

use crate::collection::{Collection, Document};
use crate::config::DatabaseConfig;
use crate::error::{HoardError, HoardResult};
use crate::observability::{
    log_event_with_fields, Event, Logger, MetricsRegistry, MetricsSnapshot, TraceGuard,
};

use super::names::{collection_file_name, validate_collection_name, COLLECTION_EXTENSION};

/// Registry entry for one name. Loading holds only this lock, so a slow scan
/// never blocks lookups of other collections.
type Slot = Arc<Mutex<Option<Arc<Collection>>>>;

/// An open database rooted at a directory.
pub struct Database {
    root: PathBuf,
    config: DatabaseConfig,
    collections: RwLock<HashMap<String, Slot>>,
    closed: AtomicBool,
    metrics: Arc<MetricsRegistry>,
    trace: Mutex<Option<TraceGuard>>,
}

impl Database {
    /// Opens the database at `path` with default settings, creating the
    /// directory if needed.
    pub fn open(path: impl AsRef<Path>) -> HoardResult<Self> {
        Self::open_with_config(DatabaseConfig::new(path.as_ref()))
    }

    /// Opens a database described by `config`.
    ///
    /// # Errors
    ///
    /// - `HOARD_CONFIG_ERROR` if the configuration is invalid
    /// - `HOARD_IO_ERROR` if the root is not a usable directory
    pub fn open_with_config(config: DatabaseConfig) -> HoardResult<Self> {
        config.validate()?;

        let trace = config.trace.then(Logger::hold_trace);

        let root = config.path.clone();
        prepare_root(&root)?;

        let root_str = root.display().to_string();
        log_event_with_fields(
            Event::DatabaseOpen,
            &[
                ("path", root_str.as_str()),
                ("sync_mode", config.sync_mode.as_str()),
            ],
        );

        Ok(Self {
            root,
            config,
            collections: RwLock::new(HashMap::new()),
            closed: AtomicBool::new(false),
            metrics: Arc::new(MetricsRegistry::new()),
            trace: Mutex::new(trace),
        })
    }

    /// Root directory
    pub fn path(&self) -> &Path {
        &self.root
    }

    /// Effective configuration
    pub fn config(&self) -> &DatabaseConfig {
        &self.config
    }

    /// Counters shared by every collection of this database
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Returns whether [`Database::close`] was called
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    fn ensure_open(&self) -> HoardResult<()> {
        if self.is_closed() {
            Err(HoardError::closed())
        } else {
            Ok(())
        }
    }

    /// Returns the collection named `name`, loading or creating it.
    ///
    /// Calling this again with the same name returns the same handle.
    pub fn create_collection(&self, name: &str) -> HoardResult<Arc<Collection>> {
        self.ensure_open()?;
        validate_collection_name(name)?;

        if let Some(existing) = self.registered(name) {
            return Ok(existing);
        }

        self.load(name)
    }

    /// Returns an existing collection.
    ///
    /// # Errors
    ///
    /// `HOARD_NOT_FOUND` if the collection was never created.
    pub fn collection(&self, name: &str) -> HoardResult<Arc<Collection>> {
        self.ensure_open()?;
        validate_collection_name(name)?;

        if let Some(existing) = self.registered(name) {
            return Ok(existing);
        }

        if !self.collection_path(name).is_file() {
            return Err(HoardError::collection_not_found(name));
        }

        self.load(name)
    }

    /// Names of every collection on disk or loaded, sorted
    pub fn list_collections(&self) -> HoardResult<Vec<String>> {
        self.ensure_open()?;

        // A slot that is mid-load is skipped; its file is picked up below
        // once it exists.
        let mut names: BTreeSet<String> = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .filter(|(_, slot)| match slot.try_lock() {
                Ok(loaded) => loaded.is_some(),
                Err(TryLockError::Poisoned(e)) => e.into_inner().is_some(),
                Err(TryLockError::WouldBlock) => false,
            })
            .map(|(name, _)| name.clone())
            .collect();

        let entries = fs::read_dir(&self.root).map_err(|e| {
            HoardError::io_error(format!("Failed to list {}", self.root.display()), e)
        })?;

        for entry in entries {
            let entry = entry.map_err(|e| {
                HoardError::io_error(format!("Failed to list {}", self.root.display()), e)
            })?;
            let path = entry.path();
            if !path.is_file()
                || path.extension().and_then(|ext| ext.to_str()) != Some(COLLECTION_EXTENSION)
            {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) {
                if validate_collection_name(stem).is_ok() {
                    names.insert(stem.to_string());
                }
            }
        }

        Ok(names.into_iter().collect())
    }

    /// Fetches document `id` from collection `collection`
    pub fn get_by_id(&self, collection: &str, id: u64) -> HoardResult<Document> {
        self.collection(collection)?.get_by_id(id)
    }

    /// Syncs and releases every collection. Closing twice is a no-op.
    ///
    /// Every collection is closed even if an earlier one fails to sync; the
    /// first failure is returned.
    pub fn close(&self) -> HoardResult<()> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Ok(());
        }

        let slots: Vec<Slot> = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .drain()
            .map(|(_, slot)| slot)
            .collect();

        // A load that passed the open check before the flag flipped finishes
        // first; locking its slot waits for it.
        let mut closed = 0usize;
        let mut first_error = None;
        for slot in &slots {
            let loaded = lock_slot(slot).take();
            if let Some(collection) = loaded {
                closed += 1;
                if let Err(e) = collection.close() {
                    first_error.get_or_insert(e);
                }
            }
        }

        let root_str = self.root.display().to_string();
        let count = closed.to_string();
        log_event_with_fields(
            Event::DatabaseClose,
            &[("path", root_str.as_str()), ("collections", count.as_str())],
        );

        drop(self.trace.lock().unwrap_or_else(PoisonError::into_inner).take());

        match first_error {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    fn registered(&self, name: &str) -> Option<Arc<Collection>> {
        let slot = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(name)
            .cloned()?;
        let loaded = lock_slot(&slot).clone();
        loaded
    }

    fn collection_path(&self, name: &str) -> PathBuf {
        self.root.join(collection_file_name(name))
    }

    // The registry lock is held only to find or add the slot; the scan runs
    // under the slot lock, so a name is opened once and other names stay
    // reachable meanwhile.
    fn load(&self, name: &str) -> HoardResult<Arc<Collection>> {
        let slot = {
            let mut collections = self
                .collections
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            self.ensure_open()?;
            Arc::clone(collections.entry(name.to_string()).or_default())
        };

        let mut loaded = lock_slot(&slot);
        if let Some(existing) = loaded.as_ref() {
            return Ok(Arc::clone(existing));
        }

        // close() may have drained the registry while we waited
        self.ensure_open()?;

        let collection = Arc::new(Collection::open(
            name,
            &self.collection_path(name),
            &self.config,
            Arc::clone(&self.metrics),
        )?);
        *loaded = Some(Arc::clone(&collection));
        Ok(collection)
    }
}

fn lock_slot(slot: &Slot) -> MutexGuard<'_, Option<Arc<Collection>>> {
    slot.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Drop for Database {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("root", &self.root)
            .field("closed", &self.is_closed())
            .finish()
    }
}

fn prepare_root(root: &Path) -> HoardResult<()> {
    if root.exists() && !root.is_dir() {
        return Err(HoardError::io_error(
            format!("Database path is not a directory: {}", root.display()),
            io::Error::new(io::ErrorKind::AlreadyExists, "not a directory"),
        ));
    }

    fs::create_dir_all(root).map_err(|e| {
        HoardError::io_error(format!("Failed to create {}", root.display()), e)
    })?;

    fs::read_dir(root).map_err(|e| {
        HoardError::io_error(format!("Database path is not readable: {}", root.display()), e)
    })?;

    let metadata = fs::metadata(root).map_err(|e| {
        HoardError::io_error(format!("Failed to stat {}", root.display()), e)
    })?;
    if metadata.permissions().readonly() {
        return Err(HoardError::io_error(
            format!("Database path is not writable: {}", root.display()),
            io::Error::new(io::ErrorKind::PermissionDenied, "read-only directory"),
        ));
    }

    Ok(())
}
