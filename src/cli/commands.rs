//! CLI command implementations
//!
//! Every command opens the database, does one thing, closes it and writes
//! one JSON response per result to stdout. `insert` writes one response per
//! input line.

use std::io::{self, BufRead, Write};

use serde_json::Value;

use crate::codec::Map;
use crate::collection::ScanOptions;
use crate::config::DatabaseConfig;
use crate::database::Database;

use super::args::{Command, Target};
use super::errors::{CliError, CliResult};
use super::io::{read_values, write_error, write_response};

/// Main CLI entry point
///
/// Parses arguments and dispatches to the appropriate command. A failure is
/// also reported as an error response on stdout.
pub fn run() -> CliResult<()> {
    let cli = super::args::Cli::parse_args();
    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    let result = run_command(cli.command, stdin.lock(), &mut out);
    if let Err(ref e) = result {
        write_error(&mut out, e.code_str(), e.message())?;
    }
    result
}

/// Run the appropriate command based on CLI args
pub fn run_command<R: BufRead, W: Write>(cmd: Command, input: R, out: &mut W) -> CliResult<()> {
    match cmd {
        Command::Insert { target, collection } => insert(&target, &collection, input, out),
        Command::Get {
            target,
            collection,
            id,
        } => get(&target, &collection, id, out),
        Command::Dump {
            target,
            collection,
            limit,
            skip,
        } => {
            let mut options = ScanOptions::new().skip(skip);
            options.limit = limit;
            dump(&target, &collection, options, out)
        }
        Command::Collections { target } => collections(&target, out),
    }
}

/// Insert every JSON object read from `input` into `collection`
pub fn insert<R: BufRead, W: Write>(
    target: &Target,
    collection: &str,
    input: R,
    out: &mut W,
) -> CliResult<()> {
    let db = open_database(target)?;
    let col = db.create_collection(collection)?;

    for entry in read_values(input) {
        let (line, value) = entry?;
        let object = match value {
            Value::Object(object) => object,
            other => {
                return Err(CliError::invalid_input(
                    line,
                    format!("expected a JSON object, found {}", json_kind(&other)),
                ))
            }
        };
        let fields = Map::from_json(object).map_err(|e| CliError::invalid_input(line, e.to_string()))?;
        let doc = col.insert_one(fields)?;
        write_response(out, doc.to_json())?;
    }

    db.close()?;
    Ok(())
}

/// Print one document
pub fn get<W: Write>(target: &Target, collection: &str, id: u64, out: &mut W) -> CliResult<()> {
    let db = open_database(target)?;
    let doc = db.get_by_id(collection, id)?;
    db.close()?;

    write_response(out, doc.to_json())
}

/// Print a page of documents in _id order
pub fn dump<W: Write>(
    target: &Target,
    collection: &str,
    options: ScanOptions,
    out: &mut W,
) -> CliResult<()> {
    let db = open_database(target)?;
    let docs = db.collection(collection)?.find_all(options)?;
    db.close()?;

    let data = Value::Array(docs.iter().map(|doc| doc.to_json()).collect());
    write_response(out, data)
}

/// Print the sorted collection names
pub fn collections<W: Write>(target: &Target, out: &mut W) -> CliResult<()> {
    let db = open_database(target)?;
    let names = db.list_collections()?;
    db.close()?;

    write_response(out, serde_json::json!(names))
}

fn open_database(target: &Target) -> CliResult<Database> {
    let config = match (&target.config, &target.path) {
        (Some(file), _) => DatabaseConfig::load(file)?,
        (None, Some(path)) => DatabaseConfig::new(path),
        (None, None) => {
            return Err(CliError::from(crate::error::HoardError::config_error(
                "one of --path or --config is required",
            )))
        }
    };
    Ok(Database::open_with_config(config)?)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
