//! # Initial Resolved Timestamp Scan
//!
//! Scans every key in the processor's span and informs the processor of any
//! intents. This backfills the processor's intent tracking with intents
//! written before it was hooked up to the live stream of logical ops. Once
//! the scan completes, the processor knows it is tracking every intent in
//! its span and can initialize its resolved timestamp.
//!
//! ## Snapshot contract
//!
//! The snapshot must observe every intent in the processor's span. If it is
//! time-bounded, its lower bound cannot be above the span's largest known
//! resolved timestamp.
//!
//! ## Failure
//!
//! A missed intent would silently break the resolved timestamp for the whole
//! span, so any failure stops the processor.

use std::sync::Arc;

use super::errors::{RangefeedError, RangefeedResult, ScanPhase};
use super::event::LogicalOp;
use super::processor::Processor;
use super::snapshot::SnapshotGuard;
use super::task::{Runnable, TaskContext};
use crate::mvcc::{MvccEntry, MvccMetadata, Span};
use crate::observability::{Event, Logger, ScanMetrics};

/// Scan that reports pre-existing intents to the processor
pub struct InitResolvedTsScan {
    processor: Arc<dyn Processor>,
    span: Span,
    snapshot: SnapshotGuard,
    metrics: Arc<ScanMetrics>,
}

impl InitResolvedTsScan {
    /// Creates the scan over the processor's full span.
    ///
    /// On error the snapshot is released before returning.
    pub fn new(
        processor: Arc<dyn Processor>,
        span: Span,
        snapshot: SnapshotGuard,
    ) -> RangefeedResult<Self> {
        span.validate().map_err(RangefeedError::InvalidSpan)?;
        Ok(Self {
            processor,
            span,
            snapshot,
            metrics: Arc::new(ScanMetrics::new()),
        })
    }

    /// Counts the scan's work in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<ScanMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// The span this scan covers
    pub fn span(&self) -> &Span {
        &self.span
    }

    fn scan(&self) -> RangefeedResult<()> {
        let processor = &self.processor;
        let metrics = &self.metrics;

        self.snapshot.iterate(&self.span, &mut |entry| {
            if let MvccEntry::Meta { key, raw } = entry {
                // Found a metadata key. Inform the processor if it's an intent.
                let meta = MvccMetadata::decode(&raw).map_err(|e| RangefeedError::Decode {
                    key: key.to_string(),
                    message: e.to_string(),
                })?;

                if let Some(txn) = meta.txn {
                    processor.consume_logical_ops(LogicalOp::write_intent(
                        txn.id,
                        txn.key,
                        txn.timestamp,
                    ));
                    metrics.increment_intents_observed();
                }
            }
            Ok(false)
        })
    }
}

impl Runnable for InitResolvedTsScan {
    fn run(self: Box<Self>, ctx: &TaskContext) {
        let _enter = ctx.span().enter();
        let span = self.span.to_string();
        Logger::info(Event::InitScanBegin, &[("span", span.as_str())]);

        let result = self.scan();

        let InitResolvedTsScan {
            processor,
            snapshot,
            metrics,
            ..
        } = *self;
        snapshot.release();

        match result {
            Ok(()) => {
                metrics.increment_init_scans_completed();
                Logger::info(Event::InitScanComplete, &[("span", span.as_str())]);
                processor.set_resolved_ts_initialized();
            }
            Err(err) => {
                let err = err.in_scan(ScanPhase::InitResolvedTs);
                metrics.increment_init_scans_failed();
                Logger::fatal(
                    Event::InitScanFailed,
                    &[("error", err.to_string().as_str()), ("span", span.as_str())],
                );
                processor.stop_with_err(err);
            }
        }
    }

    fn cancel(self: Box<Self>) {
        let span = self.span.to_string();
        self.metrics.increment_scans_cancelled();
        self.snapshot.release();
        Logger::info(
            Event::ScanCancelled,
            &[("scan", "init_resolved_ts"), ("span", span.as_str())],
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::mvcc::{Key, Timestamp, TxnId, TxnMeta};
    use crate::rangefeed::registration::RegistrationId;
    use crate::rangefeed::snapshot::MemorySnapshot;

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
        ops: Mutex<Vec<LogicalOp>>,
    }

    impl Processor for Recorder {
        fn consume_logical_ops(&self, op: LogicalOp) {
            self.calls.lock().unwrap().push("op".into());
            self.ops.lock().unwrap().push(op);
        }

        fn set_resolved_ts_initialized(&self) {
            self.calls.lock().unwrap().push("initialized".into());
        }

        fn stop_with_err(&self, err: RangefeedError) {
            self.calls.lock().unwrap().push(format!("stop: {}", err));
        }

        fn deliver_catch_up_scan_res(&self, _: RegistrationId, _: RangefeedResult<()>) {
            self.calls.lock().unwrap().push("catch_up".into());
        }
    }

    #[test]
    fn test_reports_intents_then_initializes() {
        let recorder = Arc::new(Recorder::default());
        let txn = TxnMeta::new(TxnId::new_random(), "a", Timestamp::from_wall(5));
        let snap = MemorySnapshot::builder()
            .put_intent("a", txn.clone(), "provisional")
            .put_value("b", Timestamp::from_wall(3), "committed")
            .put_inline("c", "inline")
            .build();

        let scan = InitResolvedTsScan::new(recorder.clone(), Span::new("a", "z"), snap.into())
            .unwrap();
        Box::new(scan).run(&TaskContext::none());

        assert_eq!(*recorder.calls.lock().unwrap(), vec!["op", "initialized"]);
        assert_eq!(
            recorder.ops.lock().unwrap()[0],
            LogicalOp::write_intent(txn.id, Key::from("a"), Timestamp::from_wall(5))
        );
    }

    #[test]
    fn test_decode_failure_stops_processor() {
        let recorder = Arc::new(Recorder::default());
        let snap = MemorySnapshot::builder()
            .put_raw_meta("a", "{not json")
            .build();

        let scan = InitResolvedTsScan::new(recorder.clone(), Span::new("a", "z"), snap.into())
            .unwrap();
        Box::new(scan).run(&TaskContext::none());

        let calls = recorder.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert!(calls[0].starts_with("stop: initial resolved timestamp scan failed"));
    }

    #[test]
    fn test_invalid_span_rejected() {
        let recorder = Arc::new(Recorder::default());
        let result = InitResolvedTsScan::new(
            recorder,
            Span::new("z", "a"),
            MemorySnapshot::builder().build().into(),
        );
        assert!(matches!(result, Err(RangefeedError::InvalidSpan(_))));
    }

    #[test]
    fn test_cancel_does_not_touch_processor() {
        let recorder = Arc::new(Recorder::default());
        let metrics = Arc::new(ScanMetrics::new());
        let scan = InitResolvedTsScan::new(
            recorder.clone(),
            Span::new("a", "z"),
            MemorySnapshot::builder().build().into(),
        )
        .unwrap()
        .with_metrics(Arc::clone(&metrics));

        Box::new(scan).cancel();

        assert!(recorder.calls.lock().unwrap().is_empty());
        assert_eq!(metrics.snapshot().scans_cancelled, 1);
    }
}
