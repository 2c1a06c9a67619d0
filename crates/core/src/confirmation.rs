//! Rendezvous between a paused pipeline and the observer's decision.

use parking_lot::Mutex;
use tokio::sync::oneshot;

/// Holds at most one pending confirmation.
///
/// The pipeline opens the gate and awaits the receiver; an inbound
/// confirmation resolves it exactly once. Resolving with nothing pending does
/// nothing.
#[derive(Default)]
pub struct ConfirmationGate {
    pending: Mutex<Option<oneshot::Sender<bool>>>,
}

impl ConfirmationGate {
    pub fn new() -> Self {
        Self {
            pending: Mutex::new(None),
        }
    }

    pub fn open(&self) -> oneshot::Receiver<bool> {
        let (tx, rx) = oneshot::channel();
        if self.pending.lock().replace(tx).is_some() {
            tracing::warn!("Replacing a confirmation that was never answered");
        }
        rx
    }

    /// Returns `true` if a waiting pipeline received the decision.
    pub fn resolve(&self, confirmed: bool) -> bool {
        match self.pending.lock().take() {
            Some(tx) => tx.send(confirmed).is_ok(),
            None => false,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending.lock().is_some()
    }

    /// Drops the pending sender; the waiting side sees a closed channel.
    pub fn cancel(&self) -> bool {
        self.pending.lock().take().is_some()
    }
}
