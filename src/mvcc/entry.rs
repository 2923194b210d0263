//! MvccEntry - One record of a snapshot scan
//!
//! A scan yields either a metadata entry (no timestamp, carries encoded
//! `MvccMetadata`) or a versioned value. The distinction is an explicit enum
//! variant, not a zero-timestamp check at every call site.

use super::{Key, MvccKey, Timestamp};

/// A record read from a versioned snapshot.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MvccEntry {
    /// Encoded metadata for `key`.
    Meta {
        key: Key,
        raw: Vec<u8>,
    },
    /// The version of `key` written at `timestamp`.
    Value {
        key: Key,
        timestamp: Timestamp,
        raw: Vec<u8>,
    },
}

impl MvccEntry {
    /// Builds an entry from its storage form.
    pub fn from_kv(key: MvccKey, raw: Vec<u8>) -> Self {
        if key.is_value() {
            MvccEntry::Value {
                key: key.key,
                timestamp: key.timestamp,
                raw,
            }
        } else {
            MvccEntry::Meta { key: key.key, raw }
        }
    }

    /// Returns the user key.
    pub fn key(&self) -> &Key {
        match self {
            MvccEntry::Meta { key, .. } | MvccEntry::Value { key, .. } => key,
        }
    }

    /// Returns the version timestamp, zero for metadata.
    pub fn timestamp(&self) -> Timestamp {
        match self {
            MvccEntry::Meta { .. } => Timestamp::ZERO,
            MvccEntry::Value { timestamp, .. } => *timestamp,
        }
    }

    /// Returns true for metadata entries.
    #[inline]
    pub fn is_meta(&self) -> bool {
        matches!(self, MvccEntry::Meta { .. })
    }
}
