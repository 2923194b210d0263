//! # Versioned Snapshots
//!
//! A `Snapshot` is an atomic view of every versioned key within a key range.
//! Scans own their snapshot exclusively and release it exactly once, on
//! every exit path.
//!
//! Release is modelled by ownership: `Snapshot::close` consumes the boxed
//! snapshot, and `SnapshotGuard` closes it on `release()` or on drop,
//! whichever comes first.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::mvcc::{Key, MvccEntry, MvccKey, MvccMetadata, Span, Timestamp, TxnMeta};

use super::errors::{RangefeedError, RangefeedResult};

/// Per-entry callback. `Ok(true)` stops the iteration without an error.
pub type Visitor<'a> = dyn FnMut(MvccEntry) -> RangefeedResult<bool> + 'a;

/// An atomic view of all versioned keys within a key range.
pub trait Snapshot: Send {
    /// Scans `[start, end)` in storage order, invoking `visit` on each entry.
    ///
    /// Stops at the first entry for which `visit` returns `Ok(true)` (result
    /// `Ok(())`) or an error (result is that error). Storage failures are
    /// returned as errors. No entry is visited after a stop.
    fn iterate(&self, start: &Key, end: &Key, visit: &mut Visitor<'_>) -> RangefeedResult<()>;

    /// Frees the snapshot's resources.
    fn close(self: Box<Self>);
}

/// Exclusive owner of a snapshot that closes it exactly once.
pub struct SnapshotGuard {
    snap: Option<Box<dyn Snapshot>>,
}

impl SnapshotGuard {
    /// Takes ownership of `snap`.
    pub fn new(snap: Box<dyn Snapshot>) -> Self {
        Self { snap: Some(snap) }
    }

    /// Iterates the snapshot over `span`.
    pub fn iterate(&self, span: &Span, visit: &mut Visitor<'_>) -> RangefeedResult<()> {
        match &self.snap {
            Some(snap) => snap.iterate(&span.key, &span.end_key, visit),
            None => Err(RangefeedError::Iteration("snapshot already released".into())),
        }
    }

    /// Closes the snapshot now.
    pub fn release(mut self) {
        self.close_once();
    }

    fn close_once(&mut self) {
        if let Some(snap) = self.snap.take() {
            snap.close();
        }
    }
}

impl Drop for SnapshotGuard {
    fn drop(&mut self) {
        self.close_once();
    }
}

impl fmt::Debug for SnapshotGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SnapshotGuard")
            .field("open", &self.snap.is_some())
            .finish()
    }
}

impl<S: Snapshot + 'static> From<S> for SnapshotGuard {
    fn from(snap: S) -> Self {
        Self::new(Box::new(snap))
    }
}

type CloseHook = Box<dyn FnOnce() + Send>;

/// An immutable in-memory snapshot.
pub struct MemorySnapshot {
    data: Arc<BTreeMap<MvccKey, Vec<u8>>>,
    fail_after: Option<(usize, String)>,
    on_close: Option<CloseHook>,
}

impl MemorySnapshot {
    /// Starts building a snapshot.
    pub fn builder() -> MemorySnapshotBuilder {
        MemorySnapshotBuilder::default()
    }

    /// Snapshot over an existing sorted view.
    pub fn from_data(data: Arc<BTreeMap<MvccKey, Vec<u8>>>) -> Self {
        Self {
            data,
            fail_after: None,
            on_close: None,
        }
    }

    /// Runs `hook` when the snapshot is closed.
    pub fn with_close_hook(mut self, hook: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(hook));
        self
    }

    /// Simulates a storage failure after `after` entries have been visited.
    pub fn with_iteration_error(mut self, after: usize, message: impl Into<String>) -> Self {
        self.fail_after = Some((after, message.into()));
        self
    }
}

impl Snapshot for MemorySnapshot {
    fn iterate(&self, start: &Key, end: &Key, visit: &mut Visitor<'_>) -> RangefeedResult<()> {
        let mut visited = 0usize;
        for (key, raw) in self.data.range(MvccKey::meta(start.clone())..) {
            if &key.key >= end {
                break;
            }
            if let Some((after, message)) = &self.fail_after {
                if visited >= *after {
                    return Err(RangefeedError::Iteration(message.clone()));
                }
            }
            visited += 1;
            if visit(MvccEntry::from_kv(key.clone(), raw.clone()))? {
                break;
            }
        }
        Ok(())
    }

    fn close(self: Box<Self>) {
        let this = *self;
        if let Some(hook) = this.on_close {
            hook();
        }
    }
}

impl fmt::Debug for MemorySnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemorySnapshot")
            .field("entries", &self.data.len())
            .finish()
    }
}

/// Builder for [`MemorySnapshot`].
#[derive(Debug, Default)]
pub struct MemorySnapshotBuilder {
    data: BTreeMap<MvccKey, Vec<u8>>,
}

impl MemorySnapshotBuilder {
    /// Adds a committed version.
    pub fn put_value(
        mut self,
        key: impl Into<Key>,
        timestamp: Timestamp,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        self.data
            .insert(MvccKey::versioned(key, timestamp), value.into());
        self
    }

    /// Adds intent metadata for `key` together with its provisional value.
    pub fn put_intent(
        mut self,
        key: impl Into<Key>,
        txn: TxnMeta,
        value: impl Into<Vec<u8>>,
    ) -> Self {
        let key = key.into();
        let timestamp = txn.timestamp;
        self.data
            .insert(MvccKey::versioned(key.clone(), timestamp), value.into());
        self.put_meta(key, &MvccMetadata::intent(txn))
    }

    /// Adds an inline (non-versioned) value.
    pub fn put_inline(self, key: impl Into<Key>, value: impl Into<Vec<u8>>) -> Self {
        self.put_meta(key, &MvccMetadata::inline(value))
    }

    /// Adds an arbitrary metadata entry.
    pub fn put_meta(self, key: impl Into<Key>, meta: &MvccMetadata) -> Self {
        // Encoding plain data structs to JSON cannot fail.
        let raw = meta.encode().unwrap_or_default();
        self.put_raw_meta(key, raw)
    }

    /// Adds a metadata entry with raw, possibly malformed, bytes.
    pub fn put_raw_meta(mut self, key: impl Into<Key>, raw: impl Into<Vec<u8>>) -> Self {
        self.data.insert(MvccKey::meta(key), raw.into());
        self
    }

    /// Freezes the contents into a snapshot.
    pub fn build(self) -> MemorySnapshot {
        MemorySnapshot::from_data(Arc::new(self.data))
    }
}
