//! Observable events
//!
//! Events are explicit and typed; the string forms are what appears in the
//! `event` field of each log line.

use std::fmt;

use super::logger::Severity;

/// Observable events in hoardbase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Database lifecycle
    /// Database opened at a root directory
    DatabaseOpen,
    /// Database closed, all collections released
    DatabaseClose,
    /// Configuration file loaded and validated
    ConfigLoaded,

    // Collection lifecycle
    /// Collection scan begins
    CollectionLoadStart,
    /// Collection scanned, counter and index rebuilt
    CollectionLoaded,

    // Document operations
    /// Document appended and synced
    DocumentInserted,
    /// Batch of documents appended and synced
    DocumentsInserted,
    /// Document read by identifier
    DocumentRead,
    /// Append failed; identifier skipped
    WriteFailed,

    // Corruption
    /// Persisted bytes failed verification (FATAL)
    StorageCorruption,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::DatabaseOpen => "DATABASE_OPEN",
            Event::DatabaseClose => "DATABASE_CLOSE",
            Event::ConfigLoaded => "CONFIG_LOADED",
            Event::CollectionLoadStart => "COLLECTION_LOAD_START",
            Event::CollectionLoaded => "COLLECTION_LOADED",
            Event::DocumentInserted => "DOCUMENT_INSERTED",
            Event::DocumentsInserted => "DOCUMENTS_INSERTED",
            Event::DocumentRead => "DOCUMENT_READ",
            Event::WriteFailed => "WRITE_FAILED",
            Event::StorageCorruption => "STORAGE_CORRUPTION",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::DocumentInserted | Event::DocumentsInserted | Event::DocumentRead => {
                Severity::Trace
            }
            Event::WriteFailed => Severity::Error,
            Event::StorageCorruption => Severity::Fatal,
            _ => Severity::Info,
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
