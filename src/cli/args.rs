//! CLI argument definitions using clap
//!
//! Commands:
//! - hoardbase insert --path <dir> --collection <name>
//! - hoardbase get --path <dir> --collection <name> --id <n>
//! - hoardbase dump --path <dir> --collection <name> [--limit <n>] [--skip <n>]
//! - hoardbase collections --path <dir>
//!
//! `--config <file>` can be given instead of `--path` on every command.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// hoardbase - An embedded, file-persisted document store
#[derive(Parser, Debug)]
#[command(name = "hoardbase")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// Which database to open
#[derive(Args, Debug, Clone)]
#[group(required = true, multiple = false)]
pub struct Target {
    /// Database root directory
    #[arg(long)]
    pub path: Option<PathBuf>,

    /// Path to a JSON configuration file
    #[arg(long)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Insert JSON documents read from stdin, one object per line
    Insert {
        #[command(flatten)]
        target: Target,

        /// Collection to insert into (created if missing)
        #[arg(long)]
        collection: String,
    },

    /// Print the document with the given _id
    Get {
        #[command(flatten)]
        target: Target,

        /// Collection to read from
        #[arg(long)]
        collection: String,

        /// Document identifier
        #[arg(long)]
        id: u64,
    },

    /// Print the documents of a collection in _id order
    Dump {
        #[command(flatten)]
        target: Target,

        /// Collection to read from
        #[arg(long)]
        collection: String,

        /// Maximum number of documents
        #[arg(long)]
        limit: Option<usize>,

        /// Documents to skip first
        #[arg(long, default_value_t = 0)]
        skip: usize,
    },

    /// List collection names
    Collections {
        #[command(flatten)]
        target: Target,
    },
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Cli::parse()
    }
}
