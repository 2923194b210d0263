//! Keys, spans and versioned keys
//!
//! - `Key` is an opaque byte string
//! - `Span` is a half-open key range `[key, end_key)`
//! - `MvccKey` pairs a key with a version timestamp; a zero timestamp marks
//!   the key's metadata entry

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::Timestamp;

/// An opaque, byte-ordered key.
#[derive(Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
pub struct Key(Vec<u8>);

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Self(s.into_bytes())
    }
}

impl From<&[u8]> for Key {
    fn from(b: &[u8]) -> Self {
        Self(b.to_vec())
    }
}

impl From<Vec<u8>> for Key {
    fn from(b: Vec<u8>) -> Self {
        Self(b)
    }
}

impl AsRef<[u8]> for Key {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.0.escape_ascii())
    }
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// A half-open key range `[key, end_key)`.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct Span {
    /// Inclusive start.
    pub key: Key,
    /// Exclusive end.
    pub end_key: Key,
}

impl Span {
    /// Creates a span. Use [`Span::validate`] before scanning it.
    pub fn new(key: impl Into<Key>, end_key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            end_key: end_key.into(),
        }
    }

    /// A span must cover at least one key.
    pub fn validate(&self) -> Result<(), String> {
        if self.key >= self.end_key {
            return Err(format!(
                "span start {} must sort before end {}",
                self.key, self.end_key
            ));
        }
        Ok(())
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {})", self.key, self.end_key)
    }
}

/// A key qualified by a version timestamp.
///
/// Storage order: keys ascend; within one key the metadata entry (zero
/// timestamp) comes first, followed by versions newest-first.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct MvccKey {
    /// The user key.
    pub key: Key,
    /// Version timestamp, zero for metadata.
    pub timestamp: Timestamp,
}

impl MvccKey {
    /// The metadata key for `key`.
    pub fn meta(key: impl Into<Key>) -> Self {
        Self {
            key: key.into(),
            timestamp: Timestamp::ZERO,
        }
    }

    /// A versioned key.
    pub fn versioned(key: impl Into<Key>, timestamp: Timestamp) -> Self {
        Self {
            key: key.into(),
            timestamp,
        }
    }

    /// Returns true if this key addresses a versioned value rather than
    /// metadata.
    #[inline]
    pub fn is_value(&self) -> bool {
        !self.timestamp.is_empty()
    }
}

impl Ord for MvccKey {
    fn cmp(&self, other: &Self) -> Ordering {
        self.key.cmp(&other.key).then_with(|| {
            match (self.timestamp.is_empty(), other.timestamp.is_empty()) {
                (true, true) => Ordering::Equal,
                (true, false) => Ordering::Less,
                (false, true) => Ordering::Greater,
                (false, false) => other.timestamp.cmp(&self.timestamp),
            }
        })
    }
}

impl PartialOrd for MvccKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for MvccKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_value() {
            write!(f, "{}/{}", self.key, self.timestamp)
        } else {
            write!(f, "{}", self.key)
        }
    }
}
