//! Crate error type
//!
//! Error codes:
//! - HOARD_IO_ERROR (ERROR severity)
//! - HOARD_STORAGE_CORRUPT (FATAL severity)
//! - HOARD_CORRUPT_RECORD (ERROR severity)
//! - HOARD_NOT_FOUND (ERROR severity)
//! - HOARD_CAPACITY_EXCEEDED (FATAL severity)
//! - HOARD_CLOSED (ERROR severity)
//! - HOARD_INVALID_NAME (REJECT severity)
//! - HOARD_INVALID_DOCUMENT (REJECT severity)
//! - HOARD_CONFIG_ERROR (REJECT severity)

use std::fmt;
use std::io;

use crate::codec::CodecError;
use crate::storage::{StorageError, StorageErrorCode};

/// Severity levels for hoardbase errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Caller input rejected; nothing was attempted
    Reject,
    /// Operation failed; the database stays usable
    Error,
    /// The collection cannot continue safely
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Reject => write!(f, "REJECT"),
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Error codes surfaced by the public API
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoardErrorCode {
    /// Path unreadable or unwritable, disk full, failed sync
    IoError,
    /// A persisted record failed verification or decoding
    StorageCorrupt,
    /// Bytes handed to the codec are not one well-formed value
    CorruptRecord,
    /// Identifier or collection lookup miss
    NotFound,
    /// Identifier counter would overflow
    CapacityExceeded,
    /// Operation on a closed database
    Closed,
    /// Collection name not usable as a file name
    InvalidName,
    /// Document not storable (too large, not a map)
    InvalidDocument,
    /// Configuration missing or invalid
    ConfigError,
}

impl HoardErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            HoardErrorCode::IoError => "HOARD_IO_ERROR",
            HoardErrorCode::StorageCorrupt => "HOARD_STORAGE_CORRUPT",
            HoardErrorCode::CorruptRecord => "HOARD_CORRUPT_RECORD",
            HoardErrorCode::NotFound => "HOARD_NOT_FOUND",
            HoardErrorCode::CapacityExceeded => "HOARD_CAPACITY_EXCEEDED",
            HoardErrorCode::Closed => "HOARD_CLOSED",
            HoardErrorCode::InvalidName => "HOARD_INVALID_NAME",
            HoardErrorCode::InvalidDocument => "HOARD_INVALID_DOCUMENT",
            HoardErrorCode::ConfigError => "HOARD_CONFIG_ERROR",
        }
    }

    /// Returns the severity level for this code
    pub fn severity(&self) -> Severity {
        match self {
            HoardErrorCode::StorageCorrupt | HoardErrorCode::CapacityExceeded => Severity::Fatal,
            HoardErrorCode::InvalidName
            | HoardErrorCode::InvalidDocument
            | HoardErrorCode::ConfigError => Severity::Reject,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for HoardErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// hoardbase error with code, message and optional context
#[derive(Debug)]
pub struct HoardError {
    code: HoardErrorCode,
    message: String,
    details: Option<String>,
    source: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
}

impl HoardError {
    fn new(code: HoardErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Attach context details
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }

    fn with_source(mut self, source: impl std::error::Error + Send + Sync + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    /// Create an I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self::new(HoardErrorCode::IoError, message).with_source(source)
    }

    /// Create a storage corruption error (FATAL)
    pub fn storage_corrupt(message: impl Into<String>) -> Self {
        Self::new(HoardErrorCode::StorageCorrupt, message)
    }

    /// Create a storage corruption error caused by a record that did not decode
    pub fn storage_corrupt_record(collection: &str, offset: u64, source: CodecError) -> Self {
        Self::new(
            HoardErrorCode::StorageCorrupt,
            format!("Record in collection '{}' failed to decode: {}", collection, source),
        )
        .with_details(format!("byte_offset: {}", offset))
        .with_source(source)
    }

    /// Create a not found error for a document identifier
    pub fn document_not_found(collection: &str, id: u64) -> Self {
        Self::new(
            HoardErrorCode::NotFound,
            format!("No document with _id {} in collection '{}'", id, collection),
        )
    }

    /// Create a not found error for a collection
    pub fn collection_not_found(collection: &str) -> Self {
        Self::new(
            HoardErrorCode::NotFound,
            format!("No collection named '{}'", collection),
        )
    }

    /// Create a capacity exceeded error (FATAL)
    pub fn capacity_exceeded(collection: &str) -> Self {
        Self::new(
            HoardErrorCode::CapacityExceeded,
            format!("Identifier space exhausted in collection '{}'", collection),
        )
    }

    /// Create a closed error
    pub fn closed() -> Self {
        Self::new(HoardErrorCode::Closed, "Database is closed")
    }

    /// Create an invalid collection name error
    pub fn invalid_name(name: &str, reason: impl Into<String>) -> Self {
        Self::new(
            HoardErrorCode::InvalidName,
            format!("Invalid collection name '{}': {}", name, reason.into()),
        )
    }

    /// Create an invalid document error
    pub fn invalid_document(message: impl Into<String>) -> Self {
        Self::new(HoardErrorCode::InvalidDocument, message)
    }

    /// Create a configuration error
    pub fn config_error(message: impl Into<String>) -> Self {
        Self::new(HoardErrorCode::ConfigError, message)
    }

    /// Returns the error code
    pub fn code(&self) -> HoardErrorCode {
        self.code
    }

    /// Returns the severity level
    pub fn severity(&self) -> Severity {
        self.code.severity()
    }

    /// Returns the error message
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Returns additional error details
    pub fn details(&self) -> Option<&str> {
        self.details.as_deref()
    }

    /// Returns whether this error is fatal for the collection involved
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Returns whether this is an ordinary lookup miss
    pub fn is_not_found(&self) -> bool {
        self.code == HoardErrorCode::NotFound
    }
}

impl fmt::Display for HoardError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}",
            self.code.severity(),
            self.code.code(),
            self.message
        )?;
        if let Some(ref details) = self.details {
            write!(f, " ({})", details)?;
        }
        Ok(())
    }
}

impl std::error::Error for HoardError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source
            .as_ref()
            .map(|e| e.as_ref() as &(dyn std::error::Error + 'static))
    }
}

impl From<StorageError> for HoardError {
    fn from(err: StorageError) -> Self {
        let (code, message, details, source) = err.into_parts();
        let code = match code {
            StorageErrorCode::HoardDataCorruption => HoardErrorCode::StorageCorrupt,
            StorageErrorCode::HoardStorageIoError
            | StorageErrorCode::HoardStorageWriteFailed
            | StorageErrorCode::HoardStorageReadFailed => HoardErrorCode::IoError,
        };
        let mut lifted = Self::new(code, message);
        lifted.details = details;
        if let Some(source) = source {
            lifted = lifted.with_source(source);
        }
        lifted
    }
}

impl From<CodecError> for HoardError {
    fn from(err: CodecError) -> Self {
        Self::new(HoardErrorCode::CorruptRecord, err.to_string()).with_source(err)
    }
}

/// Result type for hoardbase operations
pub type HoardResult<T> = Result<T, HoardError>;
