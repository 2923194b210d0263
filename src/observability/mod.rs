//! Observability subsystem for aerofeed
//!
//! - Structured logging (JSON lines, delivered through `tracing`)
//! - Scan counters
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on scan execution
//! 3. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use aerofeed::observability::{Event, Logger, ScanMetrics};
//!
//! Logger::info(Event::CatchUpScanBegin, &[("span", "[\"a\", \"z\")")]);
//!
//! let metrics = ScanMetrics::new();
//! metrics.increment_values_emitted();
//! ```

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity, LOG_TARGET};
pub use metrics::{ScanMetrics, ScanMetricsSnapshot};

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = if event.is_fatal() {
        Severity::Fatal
    } else {
        Severity::Info
    };
    Logger::log(severity, event, fields);
}
