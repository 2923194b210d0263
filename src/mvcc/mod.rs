//! MVCC Domain Types
//!
//! The versioned data model the backfill scans read:
//! - `Timestamp` - Totally ordered version timestamp
//! - `Key` / `Span` - Byte keys and half-open key ranges
//! - `MvccKey` - Key qualified by version, metadata sorts first
//! - `MvccEntry` - Tagged metadata-or-value record
//! - `MvccMetadata` / `TxnMeta` - Decoded intent and inline metadata

mod entry;
mod key;
mod metadata;
mod timestamp;

pub use entry::MvccEntry;
pub use key::{Key, MvccKey, Span};
pub use metadata::{MvccMetadata, TxnId, TxnMeta};
pub use timestamp::Timestamp;
