//! Timestamp - Totally ordered version timestamp
//!
//! Every committed value in the store is tagged with the timestamp it was
//! written at. Timestamps order by wall time first and logical counter second.
//!
//! The zero timestamp is reserved: it is carried by metadata keys, which have
//! no version of their own.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A hybrid-logical version timestamp.
///
/// Field order matters: the derived `Ord` compares `wall_time` before
/// `logical`.
#[derive(
    Copy, Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize,
)]
pub struct Timestamp {
    /// Physical component, in nanoseconds.
    pub wall_time: i64,
    /// Logical counter that breaks ties within one wall time.
    pub logical: i32,
}

impl Timestamp {
    /// The empty timestamp carried by metadata keys.
    pub const ZERO: Timestamp = Timestamp {
        wall_time: 0,
        logical: 0,
    };

    /// Creates a timestamp from its two components.
    #[inline]
    pub fn new(wall_time: i64, logical: i32) -> Self {
        Self { wall_time, logical }
    }

    /// Creates a timestamp with a zero logical component.
    #[inline]
    pub fn from_wall(wall_time: i64) -> Self {
        Self::new(wall_time, 0)
    }

    /// Returns true for the zero timestamp.
    #[inline]
    pub fn is_empty(&self) -> bool {
        *self == Self::ZERO
    }

    /// Returns true if `self` orders strictly before `other`.
    #[inline]
    pub fn less(&self, other: Timestamp) -> bool {
        *self < other
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:010}", self.wall_time, self.logical)
    }
}
