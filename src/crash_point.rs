//! Crash point injection for durability testing
//!
//! When `HOARDBASE_CRASH_POINT` names one of the points below, the process
//! aborts on reaching it: no cleanup, no unwinding, no buffered flushes.
//!
//! ```bash
//! HOARDBASE_CRASH_POINT=storage_after_append hoardbase insert --path db --collection users
//! ```

use std::sync::OnceLock;

/// Environment variable naming the active crash point
pub const CRASH_POINT_ENV: &str = "HOARDBASE_CRASH_POINT";

static CRASH_POINT: OnceLock<Option<String>> = OnceLock::new();

#[inline]
fn get_crash_point() -> Option<&'static str> {
    CRASH_POINT
        .get_or_init(|| std::env::var(CRASH_POINT_ENV).ok())
        .as_deref()
}

/// Returns true if `HOARDBASE_CRASH_POINT` equals the given name.
#[inline]
pub fn crash_point_enabled(name: &str) -> bool {
    get_crash_point().map(|p| p == name).unwrap_or(false)
}

/// Aborts the process if the named crash point is enabled.
///
/// No-op when the environment variable is unset or names another point.
#[inline]
pub fn maybe_crash(name: &str) {
    if crash_point_enabled(name) {
        eprintln!("[CRASH] Triggering crash at point: {}", name);
        std::process::abort();
    }
}

/// All defined crash point names
pub mod points {
    /// Frame bytes built, nothing written yet
    pub const STORAGE_BEFORE_APPEND: &str = "storage_before_append";
    /// Frame bytes handed to the OS, not yet synced
    pub const STORAGE_AFTER_APPEND: &str = "storage_after_append";
    /// Frame durable, not yet acknowledged or indexed
    pub const STORAGE_AFTER_FSYNC: &str = "storage_after_fsync";

    /// Get all crash point names
    pub fn all() -> &'static [&'static str] {
        &[STORAGE_BEFORE_APPEND, STORAGE_AFTER_APPEND, STORAGE_AFTER_FSYNC]
    }
}
