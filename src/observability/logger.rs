//! Structured JSON logger for aerofeed
//!
//! - One log line = one event
//! - Deterministic key ordering: event, severity, then fields sorted by key
//! - Explicit severity levels
//! - Lines are handed to `tracing`, so the host's subscriber decides where
//!   they go

use std::fmt;

use super::Event;

/// Log target used for every line.
pub const LOG_TARGET: &str = "aerofeed";

/// Log severity levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Normal operations
    Info = 0,
    /// Recoverable issues
    Warn = 1,
    /// Operation failures
    Error = 2,
    /// Unrecoverable for the owning processor
    Fatal = 3,
}

impl Severity {
    /// Returns the string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
            Severity::Fatal => "FATAL",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A structured logger that outputs JSON lines
pub struct Logger;

impl Logger {
    /// Log an event with the given severity and fields
    pub fn log(severity: Severity, event: Event, fields: &[(&str, &str)]) {
        let line = Self::render(severity, event, fields);
        match severity {
            Severity::Info => tracing::info!(target: LOG_TARGET, "{}", line),
            Severity::Warn => tracing::warn!(target: LOG_TARGET, "{}", line),
            Severity::Error | Severity::Fatal => {
                tracing::error!(target: LOG_TARGET, "{}", line)
            }
        }
    }

    /// Render one JSON log line (without trailing newline)
    pub fn render(severity: Severity, event: Event, fields: &[(&str, &str)]) -> String {
        let mut output = String::with_capacity(128);

        output.push_str("{\"event\":");
        push_json_str(&mut output, event.as_str());
        output.push_str(",\"severity\":");
        push_json_str(&mut output, severity.as_str());

        let mut sorted_fields: Vec<_> = fields.iter().collect();
        sorted_fields.sort_by_key(|(k, _)| *k);

        for (key, value) in sorted_fields {
            output.push(',');
            push_json_str(&mut output, key);
            output.push(':');
            push_json_str(&mut output, value);
        }

        output.push('}');
        output
    }

    /// Log at INFO level
    pub fn info(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Info, event, fields);
    }

    /// Log at WARN level
    pub fn warn(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Warn, event, fields);
    }

    /// Log at ERROR level
    pub fn error(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Error, event, fields);
    }

    /// Log at FATAL level
    pub fn fatal(event: Event, fields: &[(&str, &str)]) {
        Self::log(Severity::Fatal, event, fields);
    }
}

fn push_json_str(output: &mut String, s: &str) {
    // Serializing a &str cannot fail.
    match serde_json::to_string(s) {
        Ok(quoted) => output.push_str(&quoted),
        Err(_) => output.push_str("\"\""),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_ordering() {
        assert!(Severity::Info < Severity::Warn);
        assert!(Severity::Warn < Severity::Error);
        assert!(Severity::Error < Severity::Fatal);
    }

    #[test]
    fn test_render_json_format() {
        let output = Logger::render(Severity::Info, Event::InitScanBegin, &[]);

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["event"], "INIT_SCAN_BEGIN");
        assert_eq!(parsed["severity"], "INFO");
    }

    #[test]
    fn test_render_deterministic_ordering() {
        let output1 = Logger::render(
            Severity::Error,
            Event::CatchUpScanFailed,
            &[("span", "1"), ("error", "2"), ("registration", "3")],
        );
        let output2 = Logger::render(
            Severity::Error,
            Event::CatchUpScanFailed,
            &[("registration", "3"), ("span", "1"), ("error", "2")],
        );
        assert_eq!(output1, output2);

        let event_pos = output1.find("\"event\"").unwrap();
        let error_pos = output1.find("\"error\"").unwrap();
        let reg_pos = output1.find("\"registration\"").unwrap();
        let span_pos = output1.find("\"span\"").unwrap();
        assert!(event_pos < error_pos);
        assert!(error_pos < reg_pos);
        assert!(reg_pos < span_pos);
    }

    #[test]
    fn test_render_escapes_special_chars() {
        let output = Logger::render(
            Severity::Fatal,
            Event::InitScanFailed,
            &[("error", "bad \"meta\"\nat key")],
        );

        let parsed: serde_json::Value = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed["error"], "bad \"meta\"\nat key");
        assert!(!output.contains('\n'));
    }

    #[test]
    fn test_log_without_subscriber_does_not_panic() {
        Logger::info(Event::ConfigLoaded, &[("max_concurrent_scans", "8")]);
        Logger::fatal(Event::InitScanFailed, &[]);
    }
}
