//! Crash recovery tests
//!
//! Each test runs the `hoardbase` binary with `HOARDBASE_CRASH_POINT` set so
//! the child aborts mid-insert, then reopens the database in this process and
//! checks what survived and which identifier comes next.

use hoardbase::crash_point::{points, CRASH_POINT_ENV};
use hoardbase::{Database, Map};
use std::io::Write;
use std::path::Path;
use std::process::{Command, Output, Stdio};
use tempfile::TempDir;

// =============================================================================
// Test Utilities
// =============================================================================

fn insert_via_cli(root: &Path, crash_point: Option<&str>, lines: &str) -> Output {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_hoardbase"));
    cmd.arg("insert")
        .arg("--path")
        .arg(root)
        .arg("--collection")
        .arg("test")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    match crash_point {
        Some(point) => cmd.env(CRASH_POINT_ENV, point),
        None => cmd.env_remove(CRASH_POINT_ENV),
    };

    let mut child = cmd.spawn().expect("Failed to spawn hoardbase");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(lines.as_bytes())
        .unwrap();
    child.wait_with_output().unwrap()
}

// =============================================================================
// Clean Run
// =============================================================================

#[test]
fn test_cli_insert_without_crash() {
    let temp_dir = TempDir::new().unwrap();
    let output = insert_via_cli(temp_dir.path(), None, "{\"a\":1}\n{\"a\":2}\n");
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let responses: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(responses.len(), 2);
    assert_eq!(responses[1]["data"]["_id"], 2);
}

// =============================================================================
// Crash Points
// =============================================================================

#[test]
fn test_crash_before_append_loses_only_pending_insert() {
    let temp_dir = TempDir::new().unwrap();
    {
        let db = Database::open(temp_dir.path()).unwrap();
        db.create_collection("test")
            .unwrap()
            .insert_one(Map::new().with("kept", true))
            .unwrap();
    }

    let output = insert_via_cli(
        temp_dir.path(),
        Some(points::STORAGE_BEFORE_APPEND),
        "{\"lost\":true}\n",
    );
    assert!(!output.status.success());

    let db = Database::open(temp_dir.path()).unwrap();
    let test = db.create_collection("test").unwrap();
    assert_eq!(test.count().unwrap(), 1);
    assert_eq!(test.insert_one(Map::new()).unwrap().id(), 2);
}

#[test]
fn test_crash_before_append_on_empty_collection() {
    let temp_dir = TempDir::new().unwrap();

    let output = insert_via_cli(
        temp_dir.path(),
        Some(points::STORAGE_BEFORE_APPEND),
        "{\"lost\":true}\n",
    );
    assert!(!output.status.success());

    let db = Database::open(temp_dir.path()).unwrap();
    let test = db.create_collection("test").unwrap();
    assert_eq!(test.count().unwrap(), 0);
    assert_eq!(test.insert_one(Map::new()).unwrap().id(), 1);
}

#[test]
fn test_crash_after_fsync_keeps_document() {
    let temp_dir = TempDir::new().unwrap();

    let output = insert_via_cli(
        temp_dir.path(),
        Some(points::STORAGE_AFTER_FSYNC),
        "{\"durable\":true}\n",
    );
    assert!(!output.status.success());

    let db = Database::open(temp_dir.path()).unwrap();
    let test = db.create_collection("test").unwrap();
    assert_eq!(test.count().unwrap(), 1);
    assert_eq!(
        test.get_by_id(1).unwrap().get("durable"),
        Some(hoardbase::Value::Bool(true))
    );
    assert_eq!(test.insert_one(Map::new()).unwrap().id(), 2);
}

#[test]
fn test_crash_after_append_recovers_consistently() {
    let temp_dir = TempDir::new().unwrap();

    let output = insert_via_cli(
        temp_dir.path(),
        Some(points::STORAGE_AFTER_APPEND),
        "{\"maybe\":true}\n",
    );
    assert!(!output.status.success());

    // The bytes were written but not synced; a process abort keeps them in
    // the page cache, so either outcome is a complete frame or nothing.
    let db = Database::open(temp_dir.path()).unwrap();
    let test = db.create_collection("test").unwrap();
    let count = test.count().unwrap() as u64;
    assert!(count <= 1);
    assert_eq!(test.insert_one(Map::new()).unwrap().id(), count + 1);
}
