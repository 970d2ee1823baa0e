//! Observability for the contact service
//!
//! - Structured logging (one JSON object per line)
//! - Typed lifecycle events
//! - Monotonic counters
//!
//! Observability never fails the operation it observes.
//!
//! ```ignore
//! use contactd::observability::{log_event_with_fields, Event};
//!
//! log_event_with_fields(Event::ContactCreated, &[("id", "42")]);
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Log a lifecycle event at its default severity
pub fn log_event(event: Event) {
    Logger::log(event.severity(), event.as_str(), &[]);
}

/// Log a lifecycle event with fields at its default severity
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}
