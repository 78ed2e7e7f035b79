//! Aggregated call-history rows

use super::matcher::CallerRef;
use super::record::{CallRecord, CallType};
use serde::Serialize;

/// Contact id value meaning "no directory match known".
pub const UNKNOWN_CONTACT: i64 = -1;

/// One deduplicated, counted row of the displayed call history.
///
/// Built by the aggregator within a single ingestion pass and immutable
/// afterward. The merge anchor is the first-seen number/contact id, and the
/// timestamp, duration and call type are frozen at the first-seen record —
/// with a newest-first source that is the most recent occurrence.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedEntry {
    pub number: String,
    pub call_type: CallType,
    pub name: Option<String>,
    pub number_type: i64,
    pub number_label: Option<String>,
    pub timestamp_ms: i64,
    pub duration_secs: i64,
    pub occurrence_count: u32,
    pub contact_id: i64,
}

impl AggregatedEntry {
    pub fn from_record(record: &CallRecord, contact_id: i64) -> Self {
        Self {
            number: record.number.clone(),
            call_type: record.call_type,
            name: record.cached_name.clone(),
            number_type: record.cached_number_type,
            number_label: record.cached_number_label.clone(),
            timestamp_ms: record.timestamp_ms,
            duration_secs: record.duration_secs,
            occurrence_count: 1,
            contact_id,
        }
    }

    pub fn caller_ref(&self) -> CallerRef<'_> {
        CallerRef {
            number: &self.number,
            contact_id: self.contact_id,
        }
    }

    /// True when the entry already carries a usable display name.
    pub fn has_name(&self) -> bool {
        matches!(&self.name, Some(name) if !name.is_empty())
    }
}
