//! On-demand duration totals over the raw call log

use super::record::{CallRecord, CallType};
use serde::Serialize;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CallTotals {
    pub total_incoming_secs: i64,
    pub total_outgoing_secs: i64,
}

/// Sum incoming and outgoing talk time. Missed calls carry no duration worth
/// counting. Computed fresh from the records on every call; there is no
/// process-wide accumulator to reset.
pub fn summarize(records: &[CallRecord]) -> CallTotals {
    let mut totals = CallTotals::default();

    for record in records {
        match record.call_type {
            CallType::Incoming => totals.total_incoming_secs += record.duration_secs,
            CallType::Outgoing => totals.total_outgoing_secs += record.duration_secs,
            CallType::Missed => {}
        }
    }

    totals
}

/// "3 mins 25 secs" style rendering for the totals dialog.
pub fn format_minutes_seconds(total_secs: i64) -> String {
    format!("{} mins {} secs", total_secs / 60, total_secs % 60)
}
