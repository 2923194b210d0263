//! aerofeed - Backfill scans for a change-feed processor
//!
//! A rangefeed processor streams live logical ops over a key span of a
//! multi-versioned store. Two things need a point-in-time scan instead:
//! discovering intents that existed before the processor started, and
//! replaying history to registrations that start in the past.

pub mod mvcc;
pub mod observability;
pub mod rangefeed;
