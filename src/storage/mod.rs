//! Collection file storage for hoardbase
//!
//! Each collection is one append-only file of checksummed frames. This layer
//! knows nothing about documents or identifiers: it moves verified byte
//! payloads to and from disk.
//!
//! # Design Principles
//!
//! - Append-only (no in-place updates, no compaction)
//! - Checksum-verified on every read
//! - Sync before acknowledgment
//! - Halt on corruption: a bad frame is an error, never skipped

mod checksum;
mod errors;
mod reader;
mod record;
mod writer;

pub use checksum::{compute_checksum, verify_checksum};
pub use errors::{Severity, StorageError, StorageErrorCode, StorageResult};
pub use reader::{ScannedFrame, StorageReader};
pub use record::{RecordFrame, FRAME_OVERHEAD, MAX_PAYLOAD_LEN};
pub use writer::{StorageWriter, SyncMode};
