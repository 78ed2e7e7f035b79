//! Coalesced data-changed signaling from the worker to the presentation side

use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::Duration;

/// Sending half, held by the resolution worker. Notifying after the receiver
/// is gone (session deactivated) is a no-op.
pub struct RefreshNotifier {
    tx: Sender<()>,
}

impl RefreshNotifier {
    pub fn notify(&self) {
        let _ = self.tx.send(());
    }
}

impl Clone for RefreshNotifier {
    fn clone(&self) -> Self {
        Self {
            tx: self.tx.clone(),
        }
    }
}

/// Receiving half, polled by the presentation side. A burst of notifications
/// collapses into a single observed refresh.
pub struct RefreshReceiver {
    rx: Receiver<()>,
}

impl RefreshReceiver {
    /// Non-blocking: drain everything pending, report whether anything was
    /// there.
    pub fn poll(&self) -> bool {
        let mut seen = false;
        while self.rx.try_recv().is_ok() {
            seen = true;
        }
        seen
    }

    /// Block up to `timeout` for at least one notification, then drain the
    /// rest of the burst.
    pub fn wait(&self, timeout: Duration) -> bool {
        match self.rx.recv_timeout(timeout) {
            Ok(()) => {
                self.poll();
                true
            }
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => false,
        }
    }
}

pub fn refresh_channel() -> (RefreshNotifier, RefreshReceiver) {
    let (tx, rx) = mpsc::channel();
    (RefreshNotifier { tx }, RefreshReceiver { rx })
}
