//! # Processor Boundary
//!
//! The scans never touch processor state directly. They report through four
//! entry points, and those entry points are the processor's only
//! concurrency boundary: they may be called from any scan thread while the
//! live logical-op stream is also feeding the processor.
//!
//! `ProcessorHandle` implements the boundary actor-style: every call becomes
//! a `ProcessorInput` message on an unbounded channel drained by the single
//! loop that owns intent tracking and registrations.

use tokio::sync::mpsc;

use super::errors::{RangefeedError, RangefeedResult};
use super::event::LogicalOp;
use super::registration::RegistrationId;
use crate::observability::{Event, Logger};

/// Entry points the backfill scans report into
pub trait Processor: Send + Sync {
    /// Hands one logical op to intent tracking.
    fn consume_logical_ops(&self, op: LogicalOp);

    /// All pre-existing intents have been observed; the resolved timestamp
    /// may be initialized. Called once, by a successful initialization scan.
    fn set_resolved_ts_initialized(&self);

    /// Stops the whole processor. Called once, by a failed initialization
    /// scan.
    fn stop_with_err(&self, err: RangefeedError);

    /// Reports the outcome of one registration's catch-up scan.
    fn deliver_catch_up_scan_res(&self, registration: RegistrationId, result: RangefeedResult<()>);
}

/// A message for the processor loop
#[derive(Debug, Clone, PartialEq)]
pub enum ProcessorInput {
    /// A logical op to track
    LogicalOp(LogicalOp),
    /// The initialization scan finished
    ResolvedTsInitialized,
    /// The processor must stop
    Stop(RangefeedError),
    /// A catch-up scan finished
    CatchUpScanResult {
        registration: RegistrationId,
        result: RangefeedResult<()>,
    },
}

/// Cloneable sender side of the processor loop
#[derive(Debug, Clone)]
pub struct ProcessorHandle {
    tx: mpsc::UnboundedSender<ProcessorInput>,
}

/// Receiver side, owned by the processor loop
#[derive(Debug)]
pub struct ProcessorInbox {
    rx: mpsc::UnboundedReceiver<ProcessorInput>,
}

impl ProcessorHandle {
    /// Creates a connected handle and inbox
    pub fn channel() -> (ProcessorHandle, ProcessorInbox) {
        let (tx, rx) = mpsc::unbounded_channel();
        (ProcessorHandle { tx }, ProcessorInbox { rx })
    }

    /// Returns true once the inbox has been dropped
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, input: ProcessorInput) {
        if let Err(mpsc::error::SendError(input)) = self.tx.send(input) {
            let kind = match input {
                ProcessorInput::LogicalOp(_) => "logical_op",
                ProcessorInput::ResolvedTsInitialized => "resolved_ts_initialized",
                ProcessorInput::Stop(_) => "stop",
                ProcessorInput::CatchUpScanResult { .. } => "catch_up_scan_result",
            };
            Logger::warn(Event::ProcessorInboxClosed, &[("input", kind)]);
        }
    }
}

impl Processor for ProcessorHandle {
    fn consume_logical_ops(&self, op: LogicalOp) {
        self.send(ProcessorInput::LogicalOp(op));
    }

    fn set_resolved_ts_initialized(&self) {
        self.send(ProcessorInput::ResolvedTsInitialized);
    }

    fn stop_with_err(&self, err: RangefeedError) {
        self.send(ProcessorInput::Stop(err));
    }

    fn deliver_catch_up_scan_res(&self, registration: RegistrationId, result: RangefeedResult<()>) {
        self.send(ProcessorInput::CatchUpScanResult {
            registration,
            result,
        });
    }
}

impl ProcessorInbox {
    /// Waits for the next input; `None` once every handle is gone
    pub async fn recv(&mut self) -> Option<ProcessorInput> {
        self.rx.recv().await
    }

    /// Takes the next input if one is queued
    pub fn try_recv(&mut self) -> Option<ProcessorInput> {
        self.rx.try_recv().ok()
    }

    /// Drains everything queued right now
    pub fn drain(&mut self) -> Vec<ProcessorInput> {
        let mut inputs = Vec::new();
        while let Some(input) = self.try_recv() {
            inputs.push(input);
        }
        inputs
    }
}
