//! CLI module for hoardbase
//!
//! Provides command-line interface for:
//! - insert: Store JSON documents read from stdin
//! - get: Fetch one document by _id
//! - dump: List documents in _id order
//! - collections: List collection names

mod args;
mod commands;
mod errors;
mod io;

pub use args::{Cli, Command, Target};
pub use commands::{collections, dump, get, insert, run, run_command};
pub use errors::{CliError, CliErrorCode, CliResult};
pub use io::{read_values, write_error, write_response};
