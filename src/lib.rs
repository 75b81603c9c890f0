//! hoardbase - An embedded, file-persisted document store
//!
//! A [`Database`] is a directory; each [`Collection`] is one append-only file
//! inside it. Inserted documents get a `u64` `_id` that starts at 1 and grows
//! by one per insert, recovered on open by scanning the file.
//!
//! ```no_run
//! use hoardbase::{Database, Map};
//!
//! let db = Database::open("./data")?;
//! let users = db.create_collection("users")?;
//! let doc = users.insert_one(Map::new().with("name", "ada"))?;
//! assert_eq!(users.get_by_id(doc.id())?, doc);
//! db.close()?;
//! # Ok::<(), hoardbase::HoardError>(())
//! ```

pub mod cli;
pub mod codec;
pub mod collection;
pub mod config;
pub mod crash_point;
pub mod database;
pub mod error;
pub mod observability;
pub mod storage;

pub use codec::{Map, Value};
pub use collection::{Collection, Document, ScanOptions};
pub use config::DatabaseConfig;
pub use database::Database;
pub use error::{HoardError, HoardErrorCode, HoardResult};
pub use storage::SyncMode;
