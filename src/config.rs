//! Database configuration
//!
//! A configuration can be built in code or loaded from a JSON file:
//!
//! ```json
//! {
//!   "path": "./data/app.hoard",
//!   "sync_mode": "fsync",
//!   "max_document_bytes": 16777216,
//!   "trace": false
//! }
//! ```
//!
//! Only `path` is required.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{HoardError, HoardResult};
use crate::observability::{log_event_with_fields, Event};
use crate::storage::{SyncMode, MAX_PAYLOAD_LEN};

/// Default cap on the encoded size of a single document (16 MiB)
pub const DEFAULT_MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

fn default_max_document_bytes() -> usize {
    DEFAULT_MAX_DOCUMENT_BYTES
}

/// Configuration for one database instance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Root directory holding one file per collection
    pub path: PathBuf,

    /// How appends are made durable (default "fsync")
    #[serde(default)]
    pub sync_mode: SyncMode,

    /// Largest accepted encoded document, in bytes
    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: usize,

    /// Emit per-operation TRACE log events.
    ///
    /// The log threshold is process-wide: while a database opened with this
    /// flag is open, TRACE events from every database are written. Closing
    /// it restores the previous threshold.
    #[serde(default)]
    pub trace: bool,
}

impl DatabaseConfig {
    /// Default configuration rooted at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            sync_mode: SyncMode::default(),
            max_document_bytes: DEFAULT_MAX_DOCUMENT_BYTES,
            trace: false,
        }
    }

    /// Set the sync mode
    pub fn sync_mode(mut self, mode: SyncMode) -> Self {
        self.sync_mode = mode;
        self
    }

    /// Set the maximum encoded document size
    pub fn max_document_bytes(mut self, bytes: usize) -> Self {
        self.max_document_bytes = bytes;
        self
    }

    /// Enable or disable per-operation tracing
    pub fn trace(mut self, enabled: bool) -> Self {
        self.trace = enabled;
        self
    }

    /// Load and validate a configuration file.
    ///
    /// A relative `path` inside the file is resolved against the file's
    /// directory.
    pub fn load(config_path: &Path) -> HoardResult<Self> {
        let content = fs::read_to_string(config_path).map_err(|e| {
            HoardError::config_error(format!(
                "Failed to read config {}: {}",
                config_path.display(),
                e
            ))
        })?;

        let mut config: DatabaseConfig = serde_json::from_str(&content)
            .map_err(|e| HoardError::config_error(format!("Invalid config JSON: {}", e)))?;

        if config.path.is_relative() {
            if let Some(base) = config_path.parent() {
                config.path = base.join(&config.path);
            }
        }

        config.validate()?;

        let file = config_path.display().to_string();
        let root = config.path.display().to_string();
        log_event_with_fields(
            Event::ConfigLoaded,
            &[("file", file.as_str()), ("path", root.as_str())],
        );

        Ok(config)
    }

    /// Validate field ranges
    pub fn validate(&self) -> HoardResult<()> {
        if self.path.as_os_str().is_empty() {
            return Err(HoardError::config_error("path must not be empty"));
        }

        if self.max_document_bytes == 0 {
            return Err(HoardError::config_error("max_document_bytes must be > 0"));
        }

        if self.max_document_bytes > MAX_PAYLOAD_LEN {
            return Err(HoardError::config_error(format!(
                "max_document_bytes must be <= {}",
                MAX_PAYLOAD_LEN
            )));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::HoardErrorCode;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = DatabaseConfig::new("/tmp/db");
        assert_eq!(config.sync_mode, SyncMode::Fsync);
        assert_eq!(config.max_document_bytes, DEFAULT_MAX_DOCUMENT_BYTES);
        assert!(!config.trace);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = DatabaseConfig::new("/tmp/db")
            .sync_mode(SyncMode::Fdatasync)
            .max_document_bytes(1024)
            .trace(true);
        assert_eq!(config.sync_mode, SyncMode::Fdatasync);
        assert_eq!(config.max_document_bytes, 1024);
        assert!(config.trace);
    }

    #[test]
    fn test_load_minimal_file_resolves_relative_path() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("hoardbase.json");
        fs::write(&config_path, r#"{"path": "data"}"#).unwrap();

        let config = DatabaseConfig::load(&config_path).unwrap();
        assert_eq!(config.path, temp_dir.path().join("data"));
        assert_eq!(config.sync_mode, SyncMode::Fsync);
        assert_eq!(config.max_document_bytes, DEFAULT_MAX_DOCUMENT_BYTES);
    }

    #[test]
    fn test_load_full_file() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("hoardbase.json");
        fs::write(
            &config_path,
            r#"{"path": "/var/lib/hoard", "sync_mode": "fdatasync", "max_document_bytes": 4096, "trace": true}"#,
        )
        .unwrap();

        let config = DatabaseConfig::load(&config_path).unwrap();
        assert_eq!(config.path, PathBuf::from("/var/lib/hoard"));
        assert_eq!(config.sync_mode, SyncMode::Fdatasync);
        assert_eq!(config.max_document_bytes, 4096);
        assert!(config.trace);
    }

    #[test]
    fn test_invalid_sync_mode_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("hoardbase.json");
        fs::write(&config_path, r#"{"path": "data", "sync_mode": "never"}"#).unwrap();

        let err = DatabaseConfig::load(&config_path).unwrap_err();
        assert_eq!(err.code(), HoardErrorCode::ConfigError);
    }

    #[test]
    fn test_zero_document_size_rejected() {
        let err = DatabaseConfig::new("/tmp/db")
            .max_document_bytes(0)
            .validate()
            .unwrap_err();
        assert_eq!(err.code(), HoardErrorCode::ConfigError);
    }

    #[test]
    fn test_missing_file() {
        let temp_dir = TempDir::new().unwrap();
        let err = DatabaseConfig::load(&temp_dir.path().join("absent.json")).unwrap_err();
        assert_eq!(err.code(), HoardErrorCode::ConfigError);
    }
}
