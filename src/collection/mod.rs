//! Collections and their documents
//!
//! A [`Collection`] owns one append-only file and assigns each inserted
//! document a `u64` `_id`, starting at 1 and increasing by one per insert.

mod document;
mod store;

pub use document::{Document, ID_FIELD};
pub use store::{Collection, ScanOptions};
