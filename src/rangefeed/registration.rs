//! # Registrations
//!
//! A registration is one subscriber's interest in a span, starting at some
//! timestamp. If that timestamp is in the past, the registration arrives
//! carrying a catch-up snapshot, which the catch-up scan detaches and owns
//! from then on.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use super::config::{RangefeedConfig, MAX_SETTING};
use super::errors::{RangefeedError, RangefeedResult};
use super::event::RangeFeedEvent;
use super::snapshot::SnapshotGuard;
use crate::mvcc::{Span, Timestamp};

/// Identity of a registration within its processor
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct RegistrationId(u64);

impl RegistrationId {
    #[inline]
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Allocates a process-unique id
    pub fn next() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        Self(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for RegistrationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "r{}", self.0)
    }
}

/// Delivery sink for one registration.
///
/// `send` may block under backpressure. An error means the subscriber can no
/// longer accept events.
pub trait Stream: Send + Sync {
    fn send(&self, event: RangeFeedEvent) -> RangefeedResult<()>;
}

/// A `Stream` backed by a bounded channel
#[derive(Debug, Clone)]
pub struct ChannelStream {
    tx: mpsc::Sender<RangeFeedEvent>,
}

impl ChannelStream {
    /// Creates a stream and the receiver the subscriber reads from.
    /// `capacity` is clamped to `1..=MAX_SETTING`.
    pub fn channel(capacity: usize) -> (ChannelStream, mpsc::Receiver<RangeFeedEvent>) {
        let (tx, rx) = mpsc::channel(capacity.clamp(1, MAX_SETTING));
        (ChannelStream { tx }, rx)
    }

    /// Creates a stream sized by `config.catch_up_buffer`
    pub fn for_config(
        config: &RangefeedConfig,
    ) -> (ChannelStream, mpsc::Receiver<RangeFeedEvent>) {
        Self::channel(config.catch_up_buffer)
    }
}

impl Stream for ChannelStream {
    /// Blocks the calling thread while the channel is full. Must not be
    /// called from inside an async task; see `Runnable::run`.
    fn send(&self, event: RangeFeedEvent) -> RangefeedResult<()> {
        self.tx
            .blocking_send(event)
            .map_err(|_| RangefeedError::Delivery("registration stream closed".into()))
    }
}

/// One subscriber's registration
pub struct Registration {
    pub id: RegistrationId,
    pub span: Span,
    /// Versions strictly below this timestamp are not delivered by catch-up.
    pub start_ts: Timestamp,
    pub stream: Arc<dyn Stream>,
    catch_up_snapshot: Option<SnapshotGuard>,
}

impl Registration {
    /// Creates a registration that needs no catch-up scan
    pub fn new(
        id: RegistrationId,
        span: Span,
        start_ts: Timestamp,
        stream: Arc<dyn Stream>,
    ) -> Self {
        Self {
            id,
            span,
            start_ts,
            stream,
            catch_up_snapshot: None,
        }
    }

    /// Attaches the snapshot a catch-up scan will read
    pub fn with_catch_up_snapshot(mut self, snapshot: SnapshotGuard) -> Self {
        self.catch_up_snapshot = Some(snapshot);
        self
    }

    /// Returns true while a catch-up snapshot is still attached
    pub fn needs_catch_up(&self) -> bool {
        self.catch_up_snapshot.is_some()
    }

    /// Detaches the catch-up snapshot; the caller becomes its owner
    pub(crate) fn take_catch_up_snapshot(&mut self) -> Option<SnapshotGuard> {
        self.catch_up_snapshot.take()
    }
}

impl fmt::Debug for Registration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registration")
            .field("id", &self.id)
            .field("span", &self.span)
            .field("start_ts", &self.start_ts)
            .field("needs_catch_up", &self.needs_catch_up())
            .finish()
    }
}
