//! Full-rebuild merge of raw call records into aggregated entries

use super::entry::AggregatedEntry;
use super::matcher::{equivalent, CallerRef};
use super::record::CallRecord;

/// Merges an ordered (newest-first) record sequence into one entry per
/// distinct caller.
pub struct CallAggregator;

impl CallAggregator {
    pub fn new() -> Self {
        Self
    }

    /// Rebuild the aggregated list from scratch.
    ///
    /// For each record in order, the existing entries are scanned linearly for
    /// the first one whose caller reference is equivalent; a match bumps its
    /// occurrence count, otherwise the record starts a new entry. A matched
    /// entry with no name yet adopts the record's name, number type and label
    /// (first name wins — once set, later records never overwrite it, and the
    /// entry's timestamp/duration stay frozen at the first-seen record).
    ///
    /// `contact_id_of` supplies the directory contact id for a number, or
    /// [`super::UNKNOWN_CONTACT`] when unknown; it is consulted once per
    /// record. O(n²) in the entry count, accepted for bounded call-history
    /// sizes — callers needing larger scale should pre-index by canonical
    /// number.
    pub fn ingest<F>(&self, records: &[CallRecord], mut contact_id_of: F) -> Vec<AggregatedEntry>
    where
        F: FnMut(&str) -> i64,
    {
        let mut entries: Vec<AggregatedEntry> = Vec::new();

        for record in records {
            let contact_id = contact_id_of(&record.number);
            let candidate = CallerRef {
                number: &record.number,
                contact_id,
            };

            let mut merged = false;
            for entry in entries.iter_mut() {
                if equivalent(&entry.caller_ref(), &candidate) {
                    entry.occurrence_count += 1;
                    if !entry.has_name() && record.has_cached_name() {
                        entry.name = record.cached_name.clone();
                        entry.number_type = record.cached_number_type;
                        entry.number_label = record.cached_number_label.clone();
                    }
                    merged = true;
                    break;
                }
            }

            if !merged {
                entries.push(AggregatedEntry::from_record(record, contact_id));
            }
        }

        entries
    }
}

impl Default for CallAggregator {
    fn default() -> Self {
        Self::new()
    }
}
