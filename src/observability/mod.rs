//! Observability for hoardbase
//!
//! - Structured logging (JSON lines on stderr)
//! - Typed lifecycle events
//! - Operational counters
//!
//! Observability is read-only: it never changes the outcome of an operation,
//! and a failure to write a log line is ignored.
//!
//! ```ignore
//! use hoardbase::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::CollectionLoaded, &[("collection", "users")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity, TraceGuard};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields at its own severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
