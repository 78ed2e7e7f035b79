//! History Core - Call Record Aggregation
//!
//! Collapses the raw call log into one displayed row per distinct caller.
//!
//! # Architecture
//!
//! ```text
//! CallLogSource (newest-first rows)
//!     ↓
//! CallAggregator (linear-scan merge, first equivalent entry wins)
//!     ↓  uses matcher::equivalent (contact id → canonical → sloppy suffix)
//! Vec<AggregatedEntry> (one per caller, occurrence-counted)
//! ```
//!
//! The list is rebuilt in full on every ingest; entries are never mutated
//! after the pass that produced them.

pub mod aggregator;
pub mod entry;
pub mod matcher;
pub mod record;
pub mod summary;

pub use aggregator::CallAggregator;
pub use entry::{AggregatedEntry, UNKNOWN_CONTACT};
pub use matcher::{equivalent, CallerRef};
pub use record::{CallRecord, CallType};
pub use summary::{summarize, CallTotals};
