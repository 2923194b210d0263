//! # Catch-Up Scan
//!
//! Scans a registration's snapshot and publishes committed values to the
//! registration's stream. This backfill lets a registration request a
//! starting timestamp in the past and observe writes that already happened.
//!
//! ## Snapshot contract
//!
//! The snapshot must expose every version in the registration's span, not
//! just the newest one per key. Versions beneath the starting timestamp are
//! skipped here, but every version at or above it must be present: a
//! time-bounded snapshot's lower bound cannot exceed the starting timestamp.
//! Multiple versions of one key may arrive in any order.
//!
//! ## Failure
//!
//! A failure ends this registration only. The processor and every other
//! registration carry on.

use std::sync::Arc;

use super::errors::{RangefeedError, RangefeedResult, ScanPhase};
use super::event::RangeFeedEvent;
use super::processor::Processor;
use super::registration::{Registration, RegistrationId, Stream};
use super::snapshot::SnapshotGuard;
use super::task::{Runnable, TaskContext};
use crate::mvcc::{MvccEntry, MvccMetadata, Span, Timestamp};
use crate::observability::{Event, Logger, ScanMetrics};

/// Scan that replays history to one registration
pub struct CatchUpScan {
    processor: Arc<dyn Processor>,
    registration: RegistrationId,
    span: Span,
    start_ts: Timestamp,
    stream: Arc<dyn Stream>,
    snapshot: SnapshotGuard,
    metrics: Arc<ScanMetrics>,
}

impl CatchUpScan {
    /// Creates a scan over `span`, delivering versions at or above
    /// `start_ts` to `stream`.
    ///
    /// On error the snapshot is released before returning.
    pub fn new(
        processor: Arc<dyn Processor>,
        registration: RegistrationId,
        span: Span,
        start_ts: Timestamp,
        stream: Arc<dyn Stream>,
        snapshot: SnapshotGuard,
    ) -> RangefeedResult<Self> {
        span.validate().map_err(RangefeedError::InvalidSpan)?;
        Ok(Self {
            processor,
            registration,
            span,
            start_ts,
            stream,
            snapshot,
            metrics: Arc::new(ScanMetrics::new()),
        })
    }

    /// Detaches the registration's catch-up snapshot into a new scan.
    ///
    /// Returns `Ok(None)` if the registration has nothing to catch up on.
    pub fn from_registration(
        processor: Arc<dyn Processor>,
        registration: &mut Registration,
    ) -> RangefeedResult<Option<Self>> {
        let Some(snapshot) = registration.take_catch_up_snapshot() else {
            return Ok(None);
        };
        Self::new(
            processor,
            registration.id,
            registration.span.clone(),
            registration.start_ts,
            Arc::clone(&registration.stream),
            snapshot,
        )
        .map(Some)
    }

    /// Counts the scan's work in `metrics`
    pub fn with_metrics(mut self, metrics: Arc<ScanMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// The registration this scan reports for
    pub fn registration(&self) -> RegistrationId {
        self.registration
    }

    fn scan(&self) -> RangefeedResult<()> {
        let start_ts = self.start_ts;
        let stream = &self.stream;
        let metrics = &self.metrics;

        self.snapshot.iterate(&self.span, &mut |entry| {
            let (key, raw, timestamp) = match entry {
                MvccEntry::Meta { key, raw } => {
                    let meta = MvccMetadata::decode(&raw).map_err(|e| RangefeedError::Decode {
                        key: key.to_string(),
                        message: e.to_string(),
                    })?;

                    // Inline writes have no timestamp, so they are not
                    // filtered on the starting timestamp. Everything else
                    // behind a metadata key is an intent: not published.
                    if !meta.is_inline() {
                        return Ok(false);
                    }
                    (key, meta.raw_bytes.unwrap_or_default(), Timestamp::ZERO)
                }
                MvccEntry::Value {
                    key,
                    timestamp,
                    raw,
                } => {
                    if timestamp.less(start_ts) {
                        metrics.increment_values_skipped();
                        return Ok(false);
                    }
                    (key, raw, timestamp)
                }
            };

            stream.send(RangeFeedEvent::value(key, raw, timestamp))?;
            metrics.increment_values_emitted();
            Ok(false)
        })
    }
}

impl Runnable for CatchUpScan {
    fn run(self: Box<Self>, ctx: &TaskContext) {
        let _enter = ctx.span().enter();
        let registration = self.registration.to_string();
        let span = self.span.to_string();
        let start_ts = self.start_ts.to_string();
        Logger::info(
            Event::CatchUpScanBegin,
            &[
                ("registration", registration.as_str()),
                ("span", span.as_str()),
                ("start_ts", start_ts.as_str()),
            ],
        );

        let result = self.scan();

        let CatchUpScan {
            processor,
            registration: id,
            snapshot,
            metrics,
            ..
        } = *self;
        snapshot.release();

        match result {
            Ok(()) => {
                metrics.increment_catch_up_scans_completed();
                Logger::info(
                    Event::CatchUpScanComplete,
                    &[("registration", registration.as_str())],
                );
                processor.deliver_catch_up_scan_res(id, Ok(()));
            }
            Err(err) => {
                let err = err.in_scan(ScanPhase::CatchUp);
                metrics.increment_catch_up_scans_failed();
                Logger::error(
                    Event::CatchUpScanFailed,
                    &[
                        ("error", err.to_string().as_str()),
                        ("registration", registration.as_str()),
                    ],
                );
                processor.deliver_catch_up_scan_res(id, Err(err));
            }
        }
    }

    fn cancel(self: Box<Self>) {
        let registration = self.registration.to_string();
        self.metrics.increment_scans_cancelled();
        self.snapshot.release();
        Logger::info(
            Event::ScanCancelled,
            &[("registration", registration.as_str()), ("scan", "catch_up")],
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::mvcc::{Key, TxnId, TxnMeta};
    use crate::rangefeed::event::LogicalOp;
    use crate::rangefeed::snapshot::MemorySnapshot;

    #[derive(Default)]
    struct Recorder {
        results: Mutex<Vec<(RegistrationId, RangefeedResult<()>)>>,
        other_calls: Mutex<usize>,
    }

    impl Processor for Recorder {
        fn consume_logical_ops(&self, _: LogicalOp) {
            *self.other_calls.lock().unwrap() += 1;
        }

        fn set_resolved_ts_initialized(&self) {
            *self.other_calls.lock().unwrap() += 1;
        }

        fn stop_with_err(&self, _: RangefeedError) {
            *self.other_calls.lock().unwrap() += 1;
        }

        fn deliver_catch_up_scan_res(&self, id: RegistrationId, result: RangefeedResult<()>) {
            self.results.lock().unwrap().push((id, result));
        }
    }

    #[derive(Default)]
    struct VecStream {
        events: Mutex<Vec<RangeFeedEvent>>,
    }

    impl Stream for VecStream {
        fn send(&self, event: RangeFeedEvent) -> RangefeedResult<()> {
            self.events.lock().unwrap().push(event);
            Ok(())
        }
    }

    fn scan_with(
        snap: MemorySnapshot,
        start_ts: Timestamp,
    ) -> (Arc<Recorder>, Arc<VecStream>, Arc<ScanMetrics>) {
        let recorder = Arc::new(Recorder::default());
        let stream = Arc::new(VecStream::default());
        let metrics = Arc::new(ScanMetrics::new());
        let scan = CatchUpScan::new(
            recorder.clone(),
            RegistrationId::new(1),
            Span::new("a", "z"),
            start_ts,
            stream.clone(),
            snap.into(),
        )
        .unwrap()
        .with_metrics(Arc::clone(&metrics));

        Box::new(scan).run(&TaskContext::none());
        (recorder, stream, metrics)
    }

    #[test]
    fn test_filters_on_start_ts_inclusive() {
        let snap = MemorySnapshot::builder()
            .put_value("a", Timestamp::from_wall(9), "old")
            .put_value("b", Timestamp::from_wall(10), "at")
            .put_value("c", Timestamp::from_wall(11), "new")
            .build();

        let (recorder, stream, metrics) = scan_with(snap, Timestamp::from_wall(10));

        let events = stream.events.lock().unwrap();
        let keys: Vec<_> = events
            .iter()
            .map(|e| e.as_value().unwrap().key.clone())
            .collect();
        assert_eq!(keys, vec![Key::from("b"), Key::from("c")]);
        assert_eq!(metrics.snapshot().values_skipped, 1);
        assert_eq!(
            *recorder.results.lock().unwrap(),
            vec![(RegistrationId::new(1), Ok(()))]
        );
    }

    #[test]
    fn test_intents_are_not_published() {
        let txn = TxnMeta::new(TxnId::new_random(), "a", Timestamp::from_wall(20));
        let snap = MemorySnapshot::builder()
            .put_intent("a", txn, "provisional")
            .build();

        let (recorder, stream, _) = scan_with(snap, Timestamp::from_wall(1));

        // The provisional version is still a versioned value in the
        // snapshot; only the metadata entry is skipped.
        let events = stream.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].as_value().unwrap().value.timestamp, Timestamp::from_wall(20));
        assert_eq!(*recorder.other_calls.lock().unwrap(), 0);
    }

    #[test]
    fn test_metadata_without_inline_value_is_skipped() {
        let snap = MemorySnapshot::builder()
            .put_raw_meta("a", "{}")
            .put_value("b", Timestamp::from_wall(5), "v")
            .build();

        let (recorder, stream, metrics) = scan_with(snap, Timestamp::from_wall(1));

        let events = stream.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![RangeFeedEvent::value(Key::from("b"), b"v".to_vec(), Timestamp::from_wall(5))]
        );
        assert_eq!(metrics.snapshot().values_emitted, 1);
        assert_eq!(
            *recorder.results.lock().unwrap(),
            vec![(RegistrationId::new(1), Ok(()))]
        );
    }

    #[test]
    fn test_inline_ignores_start_ts() {
        let snap = MemorySnapshot::builder().put_inline("k", "X").build();

        let (_, stream, _) = scan_with(snap, Timestamp::from_wall(i64::MAX));

        let events = stream.events.lock().unwrap();
        assert_eq!(
            *events,
            vec![RangeFeedEvent::value(Key::from("k"), b"X".to_vec(), Timestamp::ZERO)]
        );
    }

    #[test]
    fn test_decode_failure_reported_for_registration() {
        let snap = MemorySnapshot::builder().put_raw_meta("a", "\u{1}").build();

        let (recorder, stream, metrics) = scan_with(snap, Timestamp::from_wall(1));

        assert!(stream.events.lock().unwrap().is_empty());
        let results = recorder.results.lock().unwrap();
        assert_eq!(results.len(), 1);
        let err = results[0].1.clone().unwrap_err();
        assert_eq!(err.phase(), Some(ScanPhase::CatchUp));
        assert!(matches!(err.root_cause(), RangefeedError::Decode { .. }));
        assert_eq!(*recorder.other_calls.lock().unwrap(), 0);
        assert_eq!(metrics.snapshot().catch_up_scans_failed, 1);
    }

    #[test]
    fn test_from_registration_detaches_snapshot() {
        let recorder: Arc<dyn Processor> = Arc::new(Recorder::default());
        let stream: Arc<dyn Stream> = Arc::new(VecStream::default());
        let mut reg = Registration::new(
            RegistrationId::new(4),
            Span::new("a", "z"),
            Timestamp::from_wall(1),
            stream,
        )
        .with_catch_up_snapshot(MemorySnapshot::builder().build().into());

        let scan = CatchUpScan::from_registration(Arc::clone(&recorder), &mut reg)
            .unwrap()
            .unwrap();
        assert_eq!(scan.registration(), RegistrationId::new(4));
        assert!(!reg.needs_catch_up());

        assert!(CatchUpScan::from_registration(recorder, &mut reg)
            .unwrap()
            .is_none());
        Box::new(scan).cancel();
    }
}
