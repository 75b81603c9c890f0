//! Operational counters
//!
//! - Counters only, monotonic, reset on process start
//! - Relaxed atomics; a snapshot is not a consistent cut across counters

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by a database and its collections
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    documents_inserted: AtomicU64,
    insert_failures: AtomicU64,
    bytes_written: AtomicU64,
    reads: AtomicU64,
    read_misses: AtomicU64,
    collections_loaded: AtomicU64,
    records_scanned: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `count` documents and `bytes` frame bytes made durable
    pub fn record_inserts(&self, count: u64, bytes: u64) {
        self.documents_inserted.fetch_add(count, Ordering::Relaxed);
        self.bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    /// Record a failed insert call
    pub fn increment_insert_failures(&self) {
        self.insert_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a successful read by identifier
    pub fn increment_reads(&self) {
        self.reads.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a lookup of an identifier that was never assigned
    pub fn increment_read_misses(&self) {
        self.read_misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a collection loaded from disk with `records` frames
    pub fn record_collection_loaded(&self, records: u64) {
        self.collections_loaded.fetch_add(1, Ordering::Relaxed);
        self.records_scanned.fetch_add(records, Ordering::Relaxed);
    }

    /// Take a point-in-time copy of all counters
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_inserted: self.documents_inserted.load(Ordering::Relaxed),
            insert_failures: self.insert_failures.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            reads: self.reads.load(Ordering::Relaxed),
            read_misses: self.read_misses.load(Ordering::Relaxed),
            collections_loaded: self.collections_loaded.load(Ordering::Relaxed),
            records_scanned: self.records_scanned.load(Ordering::Relaxed),
        }
    }
}

/// Copy of the counters at one point in time
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub documents_inserted: u64,
    pub insert_failures: u64,
    pub bytes_written: u64,
    pub reads: u64,
    pub read_misses: u64,
    pub collections_loaded: u64,
    pub records_scanned: u64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_new_registry_is_zero() {
        assert_eq!(MetricsRegistry::new().snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = MetricsRegistry::new();
        metrics.record_inserts(2, 100);
        metrics.record_inserts(1, 50);
        metrics.increment_reads();
        metrics.increment_read_misses();
        metrics.record_collection_loaded(3);

        let snap = metrics.snapshot();
        assert_eq!(snap.documents_inserted, 3);
        assert_eq!(snap.bytes_written, 150);
        assert_eq!(snap.reads, 1);
        assert_eq!(snap.read_misses, 1);
        assert_eq!(snap.collections_loaded, 1);
        assert_eq!(snap.records_scanned, 3);
    }

    #[test]
    fn test_concurrent_increments() {
        let metrics = Arc::new(MetricsRegistry::new());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let metrics = Arc::clone(&metrics);
                thread::spawn(move || {
                    for _ in 0..1000 {
                        metrics.increment_reads();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(metrics.snapshot().reads, 4000);
    }
}
