//! Concurrency tests
//!
//! Many threads inserting into one collection must produce a dense,
//! duplicate-free identifier set, and the file order must match it.

use hoardbase::{Database, Map, ScanOptions};
use std::collections::BTreeSet;
use std::sync::{Arc, Barrier};
use std::thread;
use tempfile::TempDir;

const THREADS: usize = 8;
const PER_THREAD: usize = 50;

#[test]
fn test_concurrent_inserts_dense_and_unique() {
    let temp_dir = TempDir::new().unwrap();
    let db = Arc::new(Database::open(temp_dir.path()).unwrap());
    let barrier = Arc::new(Barrier::new(THREADS));

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let db = Arc::clone(&db);
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let col = db.create_collection("shared").unwrap();
                barrier.wait();
                (0..PER_THREAD)
                    .map(|i| {
                        col.insert_one(Map::new().with("thread", t as i64).with("i", i as i64))
                            .unwrap()
                            .id()
                    })
                    .collect::<Vec<u64>>()
            })
        })
        .collect();

    let mut ids = BTreeSet::new();
    for handle in handles {
        let thread_ids = handle.join().unwrap();
        // Ids seen by one thread increase in call order
        assert!(thread_ids.windows(2).all(|w| w[0] < w[1]));
        for id in thread_ids {
            assert!(ids.insert(id), "duplicate id {}", id);
        }
    }

    let total = (THREADS * PER_THREAD) as u64;
    assert_eq!(ids, (1..=total).collect::<BTreeSet<u64>>());

    db.close().unwrap();

    // Reopening rescans the file: ids must be strictly increasing on disk
    let db = Database::open(temp_dir.path()).unwrap();
    let col = db.collection("shared").unwrap();
    assert_eq!(col.last_id().unwrap(), total);

    let docs = col.find_all(ScanOptions::new()).unwrap();
    assert_eq!(docs.len(), total as usize);
    assert!(docs.windows(2).all(|w| w[0].id() + 1 == w[1].id()));
}

#[test]
fn test_reads_run_alongside_inserts() {
    let temp_dir = TempDir::new().unwrap();
    let db = Database::open(temp_dir.path()).unwrap();
    let col = db.create_collection("mixed").unwrap();
    col.insert_one(Map::new().with("seed", true)).unwrap();

    thread::scope(|scope| {
        let writer = Arc::clone(&col);
        scope.spawn(move || {
            for i in 0..100i64 {
                writer.insert_one(Map::new().with("i", i)).unwrap();
            }
        });

        for _ in 0..4 {
            let reader = Arc::clone(&col);
            scope.spawn(move || {
                for _ in 0..100 {
                    let seed = reader.get_by_id(1).unwrap();
                    assert_eq!(seed.id(), 1);
                }
            });
        }
    });

    assert_eq!(col.count().unwrap(), 101);
}
