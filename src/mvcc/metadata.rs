//! Intent metadata
//!
//! A metadata entry sits in front of a key's version history. It carries
//! one of two things:
//!
//! - a transaction descriptor, meaning the newest version is an unresolved
//!   intent written by that transaction
//! - inline bytes, meaning the key holds a single non-versioned value
//!
//! Metadata is stored JSON-encoded.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Key, Timestamp};

/// Transaction identity.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct TxnId(Uuid);

impl TxnId {
    /// Generates a random transaction id.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for TxnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The part of a transaction record that an intent carries with it.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TxnMeta {
    /// Transaction id.
    pub id: TxnId,
    /// The transaction's anchor key, where its record lives.
    pub key: Key,
    /// Provisional commit timestamp.
    pub timestamp: Timestamp,
    /// Restart epoch.
    #[serde(default)]
    pub epoch: u32,
}

impl TxnMeta {
    /// Creates a descriptor at epoch zero.
    pub fn new(id: TxnId, key: impl Into<Key>, timestamp: Timestamp) -> Self {
        Self {
            id,
            key: key.into(),
            timestamp,
            epoch: 0,
        }
    }
}

/// Decoded contents of a metadata entry.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct MvccMetadata {
    /// Present when the key has an unresolved intent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub txn: Option<TxnMeta>,

    /// Timestamp of the newest version, zero for inline values.
    #[serde(default)]
    pub timestamp: Timestamp,

    /// Value bytes for inline (non-versioned) keys.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub raw_bytes: Option<Vec<u8>>,

    #[serde(default)]
    pub key_bytes: u64,

    #[serde(default)]
    pub val_bytes: u64,
}

impl MvccMetadata {
    /// Metadata for an intent written by `txn`.
    pub fn intent(txn: TxnMeta) -> Self {
        let timestamp = txn.timestamp;
        Self {
            txn: Some(txn),
            timestamp,
            ..Self::default()
        }
    }

    /// Metadata holding an inline value.
    pub fn inline(raw_bytes: impl Into<Vec<u8>>) -> Self {
        let raw_bytes = raw_bytes.into();
        Self {
            val_bytes: raw_bytes.len() as u64,
            raw_bytes: Some(raw_bytes),
            ..Self::default()
        }
    }

    /// An inline value has no version timestamp and is always current.
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.raw_bytes.is_some()
    }

    /// Decodes a stored metadata entry.
    pub fn decode(raw: &[u8]) -> serde_json::Result<Self> {
        serde_json::from_slice(raw)
    }

    /// Encodes the metadata for storage.
    pub fn encode(&self) -> serde_json::Result<Vec<u8>> {
        serde_json::to_vec(self)
    }
}
