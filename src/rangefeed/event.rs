//! # Rangefeed Events
//!
//! Two vocabularies flow out of the backfill scans:
//!
//! - `LogicalOp` goes into the processor's intake, alongside the live stream
//!   of logical operations
//! - `RangeFeedEvent` goes out to a single registration's stream

use serde::{Deserialize, Serialize};

use crate::mvcc::{Key, Span, Timestamp, TxnId};

/// A committed value was written
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteValueOp {
    pub key: Key,
    pub timestamp: Timestamp,
    pub value: Vec<u8>,
}

/// A transaction wrote an intent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteIntentOp {
    pub txn_id: TxnId,
    pub txn_key: Key,
    pub timestamp: Timestamp,
}

/// A transaction moved its intent's provisional timestamp
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateIntentOp {
    pub txn_id: TxnId,
    pub timestamp: Timestamp,
}

/// An intent was resolved as committed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitIntentOp {
    pub txn_id: TxnId,
    pub key: Key,
    pub timestamp: Timestamp,
    pub value: Vec<u8>,
}

/// An intent was resolved as aborted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AbortIntentOp {
    pub txn_id: TxnId,
}

/// A storage-level mutation, as consumed by the processor
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum LogicalOp {
    WriteValue(WriteValueOp),
    WriteIntent(WriteIntentOp),
    UpdateIntent(UpdateIntentOp),
    CommitIntent(CommitIntentOp),
    AbortIntent(AbortIntentOp),
}

impl LogicalOp {
    /// The op the initialization scan reports for a pre-existing intent
    pub fn write_intent(txn_id: TxnId, txn_key: Key, timestamp: Timestamp) -> Self {
        LogicalOp::WriteIntent(WriteIntentOp {
            txn_id,
            txn_key,
            timestamp,
        })
    }
}

/// A versioned value payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Value {
    pub raw_bytes: Vec<u8>,
    pub timestamp: Timestamp,
}

/// A value observed at a key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RangeFeedValue {
    pub key: Key,
    pub value: Value,
}

/// An event delivered to a registration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RangeFeedEvent {
    /// A committed (or inline) value
    Value(RangeFeedValue),
    /// The span's resolved timestamp advanced
    Checkpoint { span: Span, resolved_ts: Timestamp },
    /// The feed terminated
    Error { message: String },
}

impl RangeFeedEvent {
    /// Builds a value event
    pub fn value(key: Key, raw_bytes: Vec<u8>, timestamp: Timestamp) -> Self {
        RangeFeedEvent::Value(RangeFeedValue {
            key,
            value: Value {
                raw_bytes,
                timestamp,
            },
        })
    }

    /// Returns the value payload for value events
    pub fn as_value(&self) -> Option<&RangeFeedValue> {
        match self {
            RangeFeedEvent::Value(v) => Some(v),
            _ => None,
        }
    }
}
