//! Observability subsystem for campusdb
//!
//! - Structured logging (JSON lines)
//! - Counter metrics
//! - Typed lifecycle events
//!
//! Observability is read-only: it never changes what a query returns.
//!
//! # Usage
//!
//! ```ignore
//! use campusdb::observability::{Logger, Event, MetricsRegistry, log_event_with_fields};
//!
//! Logger::info("QUERY_COMPLETE", &[("rows", "42")]);
//! log_event_with_fields(Event::DatasetAdded, &[("id", "courses")]);
//!
//! let metrics = MetricsRegistry::new();
//! metrics.record_query(42);
//! ```

mod events;
mod logger;
mod metrics;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};
pub use scope::{ObservationScope, Timer};

fn severity_of(event: Event) -> Severity {
    if event.is_failure() {
        Severity::Warn
    } else {
        Severity::Info
    }
}

/// Log a lifecycle event
pub fn log_event(event: Event) {
    Logger::log(severity_of(event), event.as_str(), &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(severity_of(event), event.as_str(), fields);
}
