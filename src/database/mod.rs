//! Database lifecycle and the collection registry

#[allow(clippy::module_inception)]
mod database;
mod names;

pub use database::Database;
pub use names::{validate_collection_name, COLLECTION_EXTENSION, MAX_NAME_LEN};
