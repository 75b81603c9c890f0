//! Storage error types
//!
//! Error codes:
//! - HOARD_STORAGE_IO_ERROR (ERROR severity)
//! - HOARD_STORAGE_WRITE_FAILED (ERROR severity)
//! - HOARD_STORAGE_READ_FAILED (ERROR severity)
//! - HOARD_DATA_CORRUPTION (FATAL severity)

use std::fmt;
use std::io;

/// Severity levels for storage errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Operation fails, the database stays usable
    Error,
    /// Persisted state cannot be trusted
    Fatal,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Fatal => write!(f, "FATAL"),
        }
    }
}

/// Storage-specific error codes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StorageErrorCode {
    /// Disk I/O failure outside of a read or write (open, metadata)
    HoardStorageIoError,
    /// Frame append or fsync failed
    HoardStorageWriteFailed,
    /// Frame read failed at the OS level
    HoardStorageReadFailed,
    /// Bytes on disk do not form a valid frame
    HoardDataCorruption,
}

impl StorageErrorCode {
    /// Returns the string code
    pub fn code(&self) -> &'static str {
        match self {
            StorageErrorCode::HoardStorageIoError => "HOARD_STORAGE_IO_ERROR",
            StorageErrorCode::HoardStorageWriteFailed => "HOARD_STORAGE_WRITE_FAILED",
            StorageErrorCode::HoardStorageReadFailed => "HOARD_STORAGE_READ_FAILED",
            StorageErrorCode::HoardDataCorruption => "HOARD_DATA_CORRUPTION",
        }
    }

    /// Returns the severity level for this error
    pub fn severity(&self) -> Severity {
        match self {
            StorageErrorCode::HoardDataCorruption => Severity::Fatal,
            _ => Severity::Error,
        }
    }
}

impl fmt::Display for StorageErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

/// Storage error with code, message and optional context
#[derive(Debug)]
pub struct StorageError {
    code: StorageErrorCode,
    message: String,
    details: Option<String>,
    source: Option<io::Error>,
}

impl StorageError {
    /// Create a new storage I/O error
    pub fn io_error(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::HoardStorageIoError,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new write failed error
    pub fn write_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::HoardStorageWriteFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a new read failed error
    pub fn read_failed(message: impl Into<String>, source: io::Error) -> Self {
        Self {
            code: StorageErrorCode::HoardStorageReadFailed,
            message: message.into(),
            details: None,
            source: Some(source),
        }
    }

    /// Create a data corruption error (FATAL)
    pub fn data_corruption(message: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::HoardDataCorruption,
            message: message.into(),
            details: None,
            source: None,
        }
    }

    /// Create a data corruption error with byte offset context
    pub fn corruption_at_offset(offset: u64, reason: impl Into<String>) -> Self {
        Self {
            code: StorageErrorCode::HoardDataCorruption,
            message: reason.into(),
            details: Some(format!("byte_offset: {}", offset)),
            source: None,
        }
    }

    /// Returns the error code
    pub fn code(&self) -> StorageErrorCode {
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

    /// Returns whether this error means the persisted data is corrupt
    pub fn is_fatal(&self) -> bool {
        self.severity() == Severity::Fatal
    }

    /// Splits the error into its parts, used when lifting into the crate error
    pub(crate) fn into_parts(self) -> (StorageErrorCode, String, Option<String>, Option<io::Error>) {
        (self.code, self.message, self.details, self.source)
    }
}

impl fmt::Display for StorageError {
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

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        self.source.as_ref().map(|e| e as &(dyn std::error::Error + 'static))
    }
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(StorageErrorCode::HoardStorageIoError.code(), "HOARD_STORAGE_IO_ERROR");
        assert_eq!(StorageErrorCode::HoardStorageWriteFailed.code(), "HOARD_STORAGE_WRITE_FAILED");
        assert_eq!(StorageErrorCode::HoardStorageReadFailed.code(), "HOARD_STORAGE_READ_FAILED");
        assert_eq!(StorageErrorCode::HoardDataCorruption.code(), "HOARD_DATA_CORRUPTION");
    }

    #[test]
    fn test_only_corruption_is_fatal() {
        assert!(StorageError::data_corruption("bad frame").is_fatal());
        assert!(!StorageError::write_failed(
            "disk full",
            io::Error::new(io::ErrorKind::Other, "disk full"),
        )
        .is_fatal());
    }

    #[test]
    fn test_display_contains_offset() {
        let err = StorageError::corruption_at_offset(512, "checksum mismatch");
        let display = err.to_string();
        assert!(display.contains("HOARD_DATA_CORRUPTION"));
        assert!(display.contains("FATAL"));
        assert!(display.contains("checksum mismatch"));
        assert!(display.contains("byte_offset: 512"));
    }

    #[test]
    fn test_source_is_exposed() {
        use std::error::Error;
        let err = StorageError::read_failed("read", io::Error::new(io::ErrorKind::Other, "eio"));
        assert!(err.source().is_some());
        assert!(StorageError::data_corruption("x").source().is_none());
    }
}
