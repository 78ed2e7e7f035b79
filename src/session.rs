//! Presentation-side session over the aggregation and resolution pipeline
//!
//! A `CallHistorySession` is what a list view talks to: it rebuilds the
//! aggregated entries from the call log on activation, answers `bind` calls
//! immediately with whatever identity data is available, and lets the
//! background worker fill in the rest. Binding never blocks — a cache miss
//! renders the row from the record's own cached columns and queues a lookup.

use crate::history_core::{
    summarize, AggregatedEntry, CallAggregator, CallTotals, CallType, UNKNOWN_CONTACT,
};
use crate::resolver_core::{
    refresh_channel, ContactDirectory, IdentityCache, LookupRequest, RequestQueue,
    ResolutionState, ResolutionWorker, RefreshReceiver,
};
use crate::store::{CallLogSource, DeleteFilter, StoreError};
use crate::telephony::{self, NumberClass};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// Everything a row needs to render, assembled at bind time.
#[derive(Debug, Clone, Serialize)]
pub struct RowBinding {
    pub name: Option<String>,
    pub number_type: i64,
    pub number_label: Option<String>,
    pub display_number: String,
    pub number_class: NumberClass,
    pub call_type: CallType,
    pub timestamp_ms: i64,
    pub duration_secs: i64,
    pub occurrence_count: u32,
    pub contact_id: i64,
    /// Whether the identity came from the directory rather than the call
    /// log's own cached columns.
    pub from_directory: bool,
}

/// One activation cycle of the call history view.
///
/// The aggregated entries, identity cache, request queue and worker all
/// belong to the current activation; `deactivate` tears them down and the
/// next `activate` starts cold.
pub struct CallHistorySession {
    call_log: Arc<dyn CallLogSource>,
    directory: Arc<dyn ContactDirectory>,
    voicemail_number: Option<String>,
    worker_start_delay: Duration,
    entries: Vec<AggregatedEntry>,
    cache: IdentityCache,
    queue: RequestQueue,
    worker: Option<ResolutionWorker>,
    refresh: Option<RefreshReceiver>,
    first_frame_seen: bool,
    active: bool,
}

impl CallHistorySession {
    pub fn new(
        call_log: Arc<dyn CallLogSource>,
        directory: Arc<dyn ContactDirectory>,
        voicemail_number: Option<String>,
        worker_start_delay: Duration,
    ) -> Self {
        Self {
            call_log,
            directory,
            voicemail_number,
            worker_start_delay,
            entries: Vec::new(),
            cache: IdentityCache::new(),
            queue: RequestQueue::new(),
            worker: None,
            refresh: None,
            first_frame_seen: false,
            active: false,
        }
    }

    /// Begin a session: fresh cache, queue and worker, entries rebuilt from
    /// the store, missed calls acknowledged. Resolution starts cold — looked
    /// up numbers from the previous activation may have changed since.
    pub fn activate(&mut self) -> Result<(), StoreError> {
        if self.active {
            self.deactivate();
        }

        self.cache = IdentityCache::new();
        self.queue = RequestQueue::new();
        let (notifier, receiver) = refresh_channel();
        self.worker = Some(ResolutionWorker::new(
            self.queue.clone(),
            self.cache.clone(),
            Arc::clone(&self.directory),
            Arc::clone(&self.call_log),
            notifier,
        ));
        self.refresh = Some(receiver);
        self.first_frame_seen = false;
        self.active = true;

        self.reload()?;

        if let Err(e) = self.call_log.mark_missed_as_seen() {
            log::warn!("Failed to acknowledge missed calls: {}", e);
        }

        Ok(())
    }

    /// End the session. The worker is stopped cooperatively and whatever it
    /// had not processed is dropped along with the queue and cache.
    pub fn deactivate(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop();
        }
        self.refresh = None;
        self.active = false;
    }

    /// Rebuild the aggregated list from the call log. The ingest-time contact
    /// id comes from a synchronous directory probe per record, which is what
    /// lets the merge join two numbers belonging to one contact.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        let records = self.call_log.recent_calls()?;
        let directory = Arc::clone(&self.directory);
        self.entries = CallAggregator::new().ingest(&records, move |number| {
            match directory.lookup_by_number(number) {
                Ok(Some(found)) => found.contact_id,
                Ok(None) => UNKNOWN_CONTACT,
                Err(e) => {
                    log::warn!("Contact probe failed for {}: {}", number, e);
                    UNKNOWN_CONTACT
                }
            }
        });
        log::debug!(
            "Aggregated call history rebuilt: {} entries",
            self.entries.len()
        );
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, index: usize) -> Option<&AggregatedEntry> {
        self.entries.get(index)
    }

    /// Resolution state pass-through for presentation code that only needs to
    /// know whether a number has been looked up.
    pub fn resolution(&self, number: &str) -> ResolutionState {
        self.cache.get(number)
    }

    /// The view has drawn its first frame; schedule the worker after the
    /// configured delay so lookups do not compete with initial rendering.
    pub fn on_first_frame(&mut self) {
        if self.first_frame_seen || !self.active {
            return;
        }
        self.first_frame_seen = true;
        if let Some(worker) = &self.worker {
            worker.start_after(self.worker_start_delay);
        }
    }

    /// Start the worker immediately, skipping the first-frame deferral.
    pub fn start_resolution_now(&self) {
        if let Some(worker) = &self.worker {
            worker.start();
        }
    }

    /// Produce the row for `index`, never blocking on resolution.
    ///
    /// On a cache miss the row renders from the record's cached columns and a
    /// lookup is queued; the miss is marked in the cache first so rebinding
    /// the same number cannot queue it twice. A resolved identity that no
    /// longer matches the stored snapshot queues a repair-only request so the
    /// store gets reconciled.
    pub fn bind(&self, index: usize) -> Option<RowBinding> {
        let entry = self.entries.get(index)?;

        let binding = match self.cache.get(&entry.number) {
            ResolutionState::NotQueried => {
                self.cache
                    .put(&entry.number, ResolutionState::QueriedNoMatch);
                self.queue.enqueue(LookupRequest {
                    number: entry.number.clone(),
                    position: index,
                    name: entry.name.clone(),
                    number_type: entry.number_type,
                    number_label: entry.number_label.clone(),
                    repair_only: false,
                });
                self.raw_binding(entry)
            }
            ResolutionState::QueriedNoMatch => self.raw_binding(entry),
            ResolutionState::Resolved(identity) => {
                if !identity.matches_snapshot(
                    entry.name.as_deref(),
                    entry.number_type,
                    entry.number_label.as_deref(),
                ) {
                    self.queue.enqueue(LookupRequest {
                        number: entry.number.clone(),
                        position: index,
                        name: entry.name.clone(),
                        number_type: entry.number_type,
                        number_label: entry.number_label.clone(),
                        repair_only: true,
                    });
                }

                let mut binding = self.raw_binding(entry);
                if identity.has_name() {
                    binding.name = identity.name.clone();
                    binding.number_type = identity.number_type;
                    binding.number_label = identity.number_label.clone();
                }
                binding.contact_id = identity.contact_id;
                binding.display_number = identity.formatted_number().to_string();
                binding.from_directory = true;
                binding
            }
        };

        Some(binding)
    }

    /// Degraded render straight from the aggregated entry.
    fn raw_binding(&self, entry: &AggregatedEntry) -> RowBinding {
        RowBinding {
            name: entry.name.clone().filter(|n| !n.is_empty()),
            number_type: entry.number_type,
            number_label: entry.number_label.clone(),
            display_number: telephony::format_number(&entry.number),
            number_class: telephony::classify(&entry.number, self.voicemail_number.as_deref()),
            call_type: entry.call_type,
            timestamp_ms: entry.timestamp_ms,
            duration_secs: entry.duration_secs,
            occurrence_count: entry.occurrence_count,
            contact_id: entry.contact_id,
            from_directory: false,
        }
    }

    /// Drain pending refresh notifications; true when the worker finished a
    /// burst since the last poll.
    pub fn poll_refresh(&self) -> bool {
        self.refresh.as_ref().map(RefreshReceiver::poll).unwrap_or(false)
    }

    /// Block up to `timeout` for the next coalesced refresh.
    pub fn wait_refresh(&self, timeout: Duration) -> bool {
        self.refresh
            .as_ref()
            .map(|r| r.wait(timeout))
            .unwrap_or(false)
    }

    /// Talk-time totals, recomputed from the store on demand.
    pub fn call_totals(&self) -> Result<CallTotals, StoreError> {
        Ok(summarize(&self.call_log.recent_calls()?))
    }

    /// Delete rows and rebuild the list.
    pub fn delete(&mut self, filter: DeleteFilter) -> Result<usize, StoreError> {
        let deleted = self.call_log.delete_where(filter)?;
        self.reload()?;
        Ok(deleted)
    }

    /// The number to actually dial for an entry. Caller-id sometimes delivers
    /// a number the network cannot route back (roaming, missing country
    /// code); when the directory stores a better-qualified form of the same
    /// number, prefer it. Returns `None` for undialable entries.
    pub fn better_dialing_number(&self, index: usize) -> Option<String> {
        let entry = self.entries.get(index)?;
        let number = &entry.number;

        if !telephony::is_callable(number, self.voicemail_number.as_deref()) {
            return None;
        }

        // Outgoing calls were already dialed successfully as stored
        if number.starts_with('+') || entry.call_type == CallType::Outgoing {
            return Some(number.clone());
        }

        let stored = match self.cache.get(number) {
            ResolutionState::Resolved(identity) => Some(identity.number.clone()),
            _ => match self.directory.lookup_by_number(number) {
                Ok(found) => found.map(|f| f.matched_number),
                Err(e) => {
                    log::warn!("Contact probe failed for {}: {}", number, e);
                    None
                }
            },
        };

        match stored {
            Some(contact_number)
                if telephony::prefer_contact_number(number, &contact_number) =>
            {
                Some(contact_number)
            }
            _ => Some(number.clone()),
        }
    }
}

impl Drop for CallHistorySession {
    fn drop(&mut self) {
        self.deactivate();
    }
}
