//! # Rangefeed Backfill
//!
//! Point-in-time scans that run alongside a rangefeed processor's live
//! stream of logical ops.
//!
//! ## Architecture
//!
//! - **Snapshot**: immutable view of a span, released exactly once
//! - **Runnable**: run once, or cancel once, never both
//! - **InitResolvedTsScan**: reports pre-existing intents, then unlocks the
//!   resolved timestamp; failure stops the processor
//! - **CatchUpScan**: replays history to one registration; failure ends
//!   only that registration
//! - **Processor**: the four entry points scans report through
//! - **TaskRunner**: bounded scheduling on a tokio runtime

pub mod catch_up;
pub mod config;
pub mod errors;
pub mod event;
pub mod init_scan;
pub mod processor;
pub mod registration;
pub mod snapshot;
pub mod task;

pub use catch_up::CatchUpScan;
pub use config::{RangefeedConfig, MAX_SETTING};
pub use errors::{RangefeedError, RangefeedResult, ScanPhase};
pub use event::{LogicalOp, RangeFeedEvent, RangeFeedValue, Value, WriteIntentOp};
pub use init_scan::InitResolvedTsScan;
pub use processor::{Processor, ProcessorHandle, ProcessorInbox, ProcessorInput};
pub use registration::{ChannelStream, Registration, RegistrationId, Stream};
pub use snapshot::{MemorySnapshot, MemorySnapshotBuilder, Snapshot, SnapshotGuard, Visitor};
pub use task::{Runnable, TaskContext, TaskRunner};
