//! # Rangefeed Errors
//!
//! Error types for the backfill scans.

use std::fmt;

use thiserror::Error;

/// Result type for rangefeed operations
pub type RangefeedResult<T> = Result<T, RangefeedError>;

/// Which scan an error came out of
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanPhase {
    /// Initial resolved timestamp scan
    InitResolvedTs,
    /// Per-registration catch-up scan
    CatchUp,
}

impl fmt::Display for ScanPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPhase::InitResolvedTs => write!(f, "initial resolved timestamp scan"),
            ScanPhase::CatchUp => write!(f, "catch-up scan"),
        }
    }
}

/// Rangefeed errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangefeedError {
    // ==================
    // Scan Errors
    // ==================
    /// Metadata entry could not be decoded
    #[error("unmarshaling mvcc meta at {key}: {message}")]
    Decode { key: String, message: String },

    /// Snapshot iteration failed
    #[error("snapshot iteration: {0}")]
    Iteration(String),

    /// Registration stream rejected an event
    #[error("delivery: {0}")]
    Delivery(String),

    /// A scan-level failure, wrapped with the scan it happened in
    #[error("{phase} failed: {source}")]
    ScanFailed {
        phase: ScanPhase,
        #[source]
        source: Box<RangefeedError>,
    },

    // ==================
    // Setup Errors
    // ==================
    /// Span does not cover any key
    #[error("invalid span: {0}")]
    InvalidSpan(String),

    /// Configuration error
    #[error("configuration error: {0}")]
    ConfigError(String),

    /// Task runner no longer accepts work
    #[error("task runner is stopping")]
    RunnerStopped,
}

impl RangefeedError {
    /// Wraps `self` with the scan it failed in
    pub fn in_scan(self, phase: ScanPhase) -> Self {
        RangefeedError::ScanFailed {
            phase,
            source: Box::new(self),
        }
    }

    /// Returns the scan this error ended, if any
    pub fn phase(&self) -> Option<ScanPhase> {
        match self {
            RangefeedError::ScanFailed { phase, .. } => Some(*phase),
            _ => None,
        }
    }

    /// Strips scan context, returning the original failure
    pub fn root_cause(&self) -> &RangefeedError {
        match self {
            RangefeedError::ScanFailed { source, .. } => source.root_cause(),
            other => other,
        }
    }
}
