//! Observability events for aerofeed
//!
//! Every log line names exactly one of these events. Events are explicit
//! and typed; free-form event strings are not accepted by the logger.

use std::fmt;

/// Observable events in the backfill scans
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Initial resolved timestamp scan
    /// Initialization scan started
    InitScanBegin,
    /// Initialization scan covered the whole span
    InitScanComplete,
    /// Initialization scan failed (FATAL to the processor)
    InitScanFailed,

    // Catch-up scan
    /// Catch-up scan started for one registration
    CatchUpScanBegin,
    /// Catch-up scan delivered all qualifying versions
    CatchUpScanComplete,
    /// Catch-up scan failed for one registration
    CatchUpScanFailed,

    // Task lifecycle
    /// Scan discarded before it ran
    ScanCancelled,
    /// Runner refused or dropped work because it is stopping
    RunnerStopped,

    // Processor boundary
    /// A scan signalled a processor whose inbox is gone
    ProcessorInboxClosed,

    // Configuration
    /// Configuration loaded
    ConfigLoaded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::InitScanBegin => "INIT_SCAN_BEGIN",
            Event::InitScanComplete => "INIT_SCAN_COMPLETE",
            Event::InitScanFailed => "INIT_SCAN_FAILED",

            Event::CatchUpScanBegin => "CATCH_UP_SCAN_BEGIN",
            Event::CatchUpScanComplete => "CATCH_UP_SCAN_COMPLETE",
            Event::CatchUpScanFailed => "CATCH_UP_SCAN_FAILED",

            Event::ScanCancelled => "SCAN_CANCELLED",
            Event::RunnerStopped => "RUNNER_STOPPED",

            Event::ProcessorInboxClosed => "PROCESSOR_INBOX_CLOSED",

            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }

    /// Returns true if this event indicates a fatal condition
    pub fn is_fatal(&self) -> bool {
        matches!(self, Event::InitScanFailed)
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
