//! Lookup request FIFO between the presentation side and the worker

use std::collections::VecDeque;
use std::sync::{Arc, Condvar, Mutex};
use std::time::{Duration, Instant};

/// One unit of work for the resolution worker.
///
/// Carries the identity snapshot embedded in the call-log row at bind time so
/// the worker can decide whether the stored columns need repairing. Consumed
/// exactly once, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LookupRequest {
    pub number: String,
    /// Index of the originating entry at bind time.
    pub position: usize,
    pub name: Option<String>,
    pub number_type: i64,
    pub number_label: Option<String>,
    /// Skip the directory query; only reconcile the stored snapshot against
    /// the already-cached identity.
    pub repair_only: bool,
}

struct QueueInner {
    items: Mutex<QueueState>,
    available: Condvar,
}

struct QueueState {
    pending: VecDeque<LookupRequest>,
    closed: bool,
}

/// FIFO of lookup requests with a bounded blocking dequeue.
///
/// The presentation side enqueues; the single worker dequeues. Closing the
/// queue drops everything still pending and wakes any blocked dequeue — the
/// shutdown path gives no drain guarantee.
pub struct RequestQueue {
    inner: Arc<QueueInner>,
}

impl RequestQueue {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(QueueInner {
                items: Mutex::new(QueueState {
                    pending: VecDeque::new(),
                    closed: false,
                }),
                available: Condvar::new(),
            }),
        }
    }

    /// Append a request and wake a waiting consumer. Requests sent after
    /// `close` are discarded.
    pub fn enqueue(&self, request: LookupRequest) {
        let mut state = self.inner.items.lock().unwrap();
        if state.closed {
            return;
        }
        state.pending.push_back(request);
        self.inner.available.notify_all();
    }

    /// Wait up to `timeout` for a request. Returns `None` on timeout or after
    /// `close`, without error — the caller's loop decides what to do next.
    pub fn dequeue(&self, timeout: Duration) -> Option<LookupRequest> {
        let deadline = Instant::now() + timeout;
        let mut state = self.inner.items.lock().unwrap();

        loop {
            if let Some(request) = state.pending.pop_front() {
                return Some(request);
            }
            if state.closed {
                return None;
            }

            let remaining = deadline.checked_duration_since(Instant::now())?;
            let (guard, wait) = self
                .inner
                .available
                .wait_timeout(state, remaining)
                .unwrap();
            state = guard;
            if wait.timed_out() {
                return state.pending.pop_front();
            }
        }
    }

    /// Drop all pending requests and wake every blocked dequeue. Used on
    /// session shutdown; a closed queue accepts nothing further.
    pub fn close(&self) {
        let mut state = self.inner.items.lock().unwrap();
        state.closed = true;
        state.pending.clear();
        self.inner.available.notify_all();
    }

    pub fn is_empty(&self) -> bool {
        self.inner.items.lock().unwrap().pending.is_empty()
    }

    pub fn len(&self) -> usize {
        self.inner.items.lock().unwrap().pending.len()
    }
}

impl Clone for RequestQueue {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl Default for RequestQueue {
    fn default() -> Self {
        Self::new()
    }
}
