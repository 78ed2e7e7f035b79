//! Background caller-id resolution worker

use super::cache::IdentityCache;
use super::directory::ContactDirectory;
use super::identity::{Identity, ResolutionState};
use super::queue::{LookupRequest, RequestQueue};
use super::refresh::RefreshNotifier;
use crate::store::CallLogSource;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// Bounded wait on the request queue. This is the worker's only suspension
/// point, so shutdown is never delayed by more than one tick.
pub const LOOKUP_WAIT: Duration = Duration::from_secs(1);

struct WorkerShared {
    queue: RequestQueue,
    cache: IdentityCache,
    directory: Arc<dyn ContactDirectory>,
    call_log: Arc<dyn CallLogSource>,
    notifier: RefreshNotifier,
    done: AtomicBool,
    started: AtomicBool,
    handle: Mutex<Option<JoinHandle<()>>>,
}

/// One worker per active session. Drains the request queue, resolves numbers
/// against the contacts directory, updates the identity cache, repairs stale
/// cached identity columns in the call log, and signals one coalesced refresh
/// whenever the queue runs dry.
///
/// The worker is never reused: deactivation stops it for good, and the next
/// activation builds a fresh one together with a fresh cache and queue.
pub struct ResolutionWorker {
    shared: Arc<WorkerShared>,
}

impl ResolutionWorker {
    pub fn new(
        queue: RequestQueue,
        cache: IdentityCache,
        directory: Arc<dyn ContactDirectory>,
        call_log: Arc<dyn CallLogSource>,
        notifier: RefreshNotifier,
    ) -> Self {
        Self {
            shared: Arc::new(WorkerShared {
                queue,
                cache,
                directory,
                call_log,
                notifier,
                done: AtomicBool::new(false),
                started: AtomicBool::new(false),
                handle: Mutex::new(None),
            }),
        }
    }

    /// Spawn the worker thread now. Safe to call more than once; only the
    /// first call after construction does anything, and a stopped worker
    /// never restarts.
    pub fn start(&self) {
        Self::start_shared(&self.shared);
    }

    /// Spawn the worker thread after `delay`, so resolution does not compete
    /// with whatever the caller is doing right now (typically the first
    /// render). A stop that lands before the delay expires wins.
    pub fn start_after(&self, delay: Duration) {
        let shared = Arc::clone(&self.shared);
        thread::spawn(move || {
            thread::sleep(delay);
            ResolutionWorker::start_shared(&shared);
        });
    }

    fn start_shared(shared: &Arc<WorkerShared>) {
        if shared.done.load(Ordering::SeqCst) {
            return;
        }
        if shared.started.swap(true, Ordering::SeqCst) {
            return;
        }

        let run_shared = Arc::clone(shared);
        // std offers no portable way to lower the thread's scheduling
        // priority; the 1 s bounded wait keeps it cheap instead.
        let spawned = thread::Builder::new()
            .name("caller-id".to_string())
            .spawn(move || run_loop(&run_shared));

        match spawned {
            Ok(handle) => {
                *shared.handle.lock().unwrap() = Some(handle);
            }
            Err(e) => {
                log::error!("Failed to spawn caller-id worker: {}", e);
            }
        }
    }

    /// Cooperative shutdown: set the done flag, wake the bounded wait, drop
    /// whatever is still queued, and join. Pending requests are abandoned —
    /// there is no drain guarantee.
    pub fn stop(&self) {
        self.shared.done.store(true, Ordering::SeqCst);
        self.shared.queue.close();
        if let Some(handle) = self.shared.handle.lock().unwrap().take() {
            let _ = handle.join();
        }
    }
}

fn run_loop(shared: &WorkerShared) {
    log::debug!("Caller-id worker started");

    while !shared.done.load(Ordering::SeqCst) {
        let Some(request) = shared.queue.dequeue(LOOKUP_WAIT) else {
            continue;
        };

        process_request(shared, &request);

        // One refresh per drained burst, never one per request
        if shared.queue.is_empty() {
            shared.notifier.notify();
        }
    }

    log::debug!("Caller-id worker stopped");
}

fn process_request(shared: &WorkerShared, request: &LookupRequest) {
    if request.repair_only {
        if let ResolutionState::Resolved(identity) = shared.cache.get(&request.number) {
            repair_if_stale(shared, request, &identity);
        }
        return;
    }

    // A prior request in the same burst may already have resolved this number
    if let ResolutionState::Resolved(identity) = shared.cache.get(&request.number) {
        repair_if_stale(shared, request, &identity);
        return;
    }

    match shared.directory.lookup_by_number(&request.number) {
        Ok(Some(found)) => {
            // Keep the number the call log dialed, not the directory's form;
            // the formatted rendering is filled lazily at bind time
            let identity = Arc::new(Identity::new(
                found.contact_id,
                found.name,
                found.number_type,
                found.number_label,
                request.number.clone(),
            ));
            shared.cache.put(
                &request.number,
                ResolutionState::Resolved(Arc::clone(&identity)),
            );
            repair_if_stale(shared, request, &identity);
        }
        Ok(None) => {
            shared
                .cache
                .put(&request.number, ResolutionState::QueriedNoMatch);
        }
        Err(e) => {
            // Same as no match: negative-cache it, no retry this session
            log::warn!("Contact lookup failed for {}: {}", request.number, e);
            shared
                .cache
                .put(&request.number, ResolutionState::QueriedNoMatch);
        }
    }
}

fn repair_if_stale(shared: &WorkerShared, request: &LookupRequest, identity: &Identity) {
    if identity.matches_snapshot(
        request.name.as_deref(),
        request.number_type,
        request.number_label.as_deref(),
    ) {
        return;
    }

    if let Err(e) = shared.call_log.update_cached_identity(
        &request.number,
        identity.name.as_deref(),
        identity.number_type,
        identity.number_label.as_deref(),
    ) {
        // The view in memory is already correct; the store catches up on a
        // later cycle
        log::warn!("Failed to repair cached identity for {}: {}", request.number, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolver_core::directory::{ContactMatch, DirectoryError};
    use crate::resolver_core::refresh::{refresh_channel, RefreshReceiver};
    use crate::store::{DeleteFilter, StoreError};
    use std::collections::HashMap;
    use std::sync::atomic::AtomicUsize;

    struct StubDirectory {
        matches: HashMap<String, ContactMatch>,
        calls: AtomicUsize,
        fail: bool,
    }

    impl StubDirectory {
        fn empty() -> Self {
            Self {
                matches: HashMap::new(),
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn with_contact(number: &str, name: &str) -> Self {
            let mut matches = HashMap::new();
            matches.insert(
                number.to_string(),
                ContactMatch {
                    contact_id: 7,
                    name: Some(name.to_string()),
                    number_type: 2,
                    number_label: Some("mobile".to_string()),
                    matched_number: number.to_string(),
                },
            );
            Self {
                matches,
                calls: AtomicUsize::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::empty()
            }
        }

        fn call_count(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    impl ContactDirectory for StubDirectory {
        fn lookup_by_number(&self, number: &str) -> Result<Option<ContactMatch>, DirectoryError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(DirectoryError::Database("lost the database".to_string()));
            }
            Ok(self.matches.get(number).cloned())
        }
    }

    #[derive(Default)]
    struct StubCallLog {
        repairs: Mutex<Vec<(String, Option<String>)>>,
        fail_writes: bool,
    }

    impl StubCallLog {
        fn failing() -> Self {
            Self {
                fail_writes: true,
                ..Self::default()
            }
        }

        fn repair_count(&self) -> usize {
            self.repairs.lock().unwrap().len()
        }
    }

    impl CallLogSource for StubCallLog {
        fn recent_calls(&self) -> Result<Vec<crate::history_core::CallRecord>, StoreError> {
            Ok(Vec::new())
        }

        fn update_cached_identity(
            &self,
            number: &str,
            name: Option<&str>,
            _number_type: i64,
            _number_label: Option<&str>,
        ) -> Result<(), StoreError> {
            if self.fail_writes {
                return Err(StoreError::Io(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    "disk full",
                )));
            }
            self.repairs
                .lock()
                .unwrap()
                .push((number.to_string(), name.map(|n| n.to_string())));
            Ok(())
        }

        fn delete_where(&self, _filter: DeleteFilter) -> Result<usize, StoreError> {
            Ok(0)
        }

        fn mark_missed_as_seen(&self) -> Result<usize, StoreError> {
            Ok(0)
        }
    }

    struct Fixture {
        queue: RequestQueue,
        cache: IdentityCache,
        directory: Arc<StubDirectory>,
        call_log: Arc<StubCallLog>,
        worker: ResolutionWorker,
        receiver: RefreshReceiver,
    }

    fn fixture(directory: StubDirectory, call_log: StubCallLog) -> Fixture {
        let queue = RequestQueue::new();
        let cache = IdentityCache::new();
        let directory = Arc::new(directory);
        let call_log = Arc::new(call_log);
        let (notifier, receiver) = refresh_channel();
        let worker = ResolutionWorker::new(
            queue.clone(),
            cache.clone(),
            Arc::clone(&directory) as Arc<dyn ContactDirectory>,
            Arc::clone(&call_log) as Arc<dyn CallLogSource>,
            notifier,
        );
        Fixture {
            queue,
            cache,
            directory,
            call_log,
            worker,
            receiver,
        }
    }

    fn lookup(number: &str) -> LookupRequest {
        LookupRequest {
            number: number.to_string(),
            position: 0,
            name: None,
            number_type: 0,
            number_label: None,
            repair_only: false,
        }
    }

    fn lookup_with_snapshot(number: &str, name: &str) -> LookupRequest {
        LookupRequest {
            number: number.to_string(),
            position: 0,
            name: Some(name.to_string()),
            number_type: 2,
            number_label: Some("mobile".to_string()),
            repair_only: false,
        }
    }

    #[test]
    fn test_resolves_match_and_caches_negative() {
        let f = fixture(StubDirectory::with_contact("5551234", "Alice"), StubCallLog::default());

        f.queue.enqueue(lookup("5551234"));
        f.queue.enqueue(lookup("5559999"));
        f.worker.start();

        assert!(f.receiver.wait(Duration::from_secs(5)));
        assert!(f.cache.get("5551234").is_resolved());
        assert!(matches!(
            f.cache.get("5559999"),
            ResolutionState::QueriedNoMatch
        ));
        assert_eq!(f.directory.call_count(), 2);

        f.worker.stop();
    }

    #[test]
    fn test_burst_for_same_number_queries_directory_once() {
        let f = fixture(StubDirectory::with_contact("5551234", "Alice"), StubCallLog::default());

        // Snapshot already matches the directory, so no repair fires either
        f.queue.enqueue(lookup_with_snapshot("5551234", "Alice"));
        f.queue.enqueue(lookup_with_snapshot("5551234", "Alice"));
        f.worker.start();

        assert!(f.receiver.wait(Duration::from_secs(5)));
        f.worker.stop();

        assert_eq!(f.directory.call_count(), 1);
        assert_eq!(f.call_log.repair_count(), 0);
    }

    #[test]
    fn test_repair_written_when_snapshot_stale() {
        let f = fixture(StubDirectory::with_contact("5551234", "Alice"), StubCallLog::default());

        // The call log row has no cached name yet
        f.queue.enqueue(lookup("5551234"));
        f.worker.start();

        assert!(f.receiver.wait(Duration::from_secs(5)));
        f.worker.stop();

        let repairs = f.call_log.repairs.lock().unwrap();
        assert_eq!(repairs.len(), 1);
        assert_eq!(repairs[0].0, "5551234");
        assert_eq!(repairs[0].1.as_deref(), Some("Alice"));
    }

    #[test]
    fn test_repair_suppressed_when_snapshot_current() {
        let f = fixture(StubDirectory::with_contact("5551234", "Alice"), StubCallLog::default());

        f.queue.enqueue(lookup_with_snapshot("5551234", "Alice"));
        f.worker.start();

        assert!(f.receiver.wait(Duration::from_secs(5)));
        f.worker.stop();

        assert_eq!(f.call_log.repair_count(), 0);
    }

    #[test]
    fn test_repair_only_skips_directory() {
        let f = fixture(StubDirectory::empty(), StubCallLog::default());

        let identity = Arc::new(Identity::new(
            7,
            Some("Alice".to_string()),
            2,
            Some("mobile".to_string()),
            "5551234".to_string(),
        ));
        f.cache
            .put("5551234", ResolutionState::Resolved(identity));

        let mut request = lookup("5551234");
        request.repair_only = true;
        f.queue.enqueue(request);
        f.worker.start();

        assert!(f.receiver.wait(Duration::from_secs(5)));
        f.worker.stop();

        assert_eq!(f.directory.call_count(), 0);
        assert_eq!(f.call_log.repair_count(), 1);
    }

    #[test]
    fn test_repair_failure_is_swallowed() {
        let f = fixture(StubDirectory::with_contact("5551234", "Alice"), StubCallLog::failing());

        f.queue.enqueue(lookup("5551234"));
        f.worker.start();

        // Still resolves, still signals; the failed write is only logged
        assert!(f.receiver.wait(Duration::from_secs(5)));
        assert!(f.cache.get("5551234").is_resolved());

        f.worker.stop();
    }

    #[test]
    fn test_directory_error_becomes_negative_cache() {
        let f = fixture(StubDirectory::failing(), StubCallLog::default());

        f.queue.enqueue(lookup("5551234"));
        f.worker.start();

        assert!(f.receiver.wait(Duration::from_secs(5)));
        f.worker.stop();

        assert!(matches!(
            f.cache.get("5551234"),
            ResolutionState::QueriedNoMatch
        ));
        assert_eq!(f.directory.call_count(), 1);
    }

    #[test]
    fn test_stop_abandons_queued_requests() {
        let f = fixture(StubDirectory::with_contact("5551234", "Alice"), StubCallLog::default());

        f.queue.enqueue(lookup("5551234"));
        f.queue.enqueue(lookup("5559999"));

        // Stop before the worker ever ran; a later start must be a no-op
        f.worker.stop();
        f.worker.start();
        thread::sleep(Duration::from_millis(50));

        assert_eq!(f.directory.call_count(), 0);
        assert!(f.queue.is_empty());
        assert!(matches!(f.cache.get("5551234"), ResolutionState::NotQueried));
    }

    #[test]
    fn test_deferred_start_cancelled_by_stop() {
        let f = fixture(StubDirectory::with_contact("5551234", "Alice"), StubCallLog::default());

        f.queue.enqueue(lookup("5551234"));
        f.worker.start_after(Duration::from_millis(100));
        f.worker.stop();

        thread::sleep(Duration::from_millis(200));
        assert_eq!(f.directory.call_count(), 0);
    }
}
