//! Lifecycle cancellation signal shared by the bus and its owner.

use std::sync::Arc;

use tokio::sync::watch;

/// A cloneable, idempotent shutdown signal.
///
/// Every clone observes the same signal. Triggering it stops the bus
/// loops from accepting further commands and events; handling tasks that
/// are already running are left to finish.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: Arc<watch::Sender<bool>>,
    rx: watch::Receiver<bool>,
}

impl Shutdown {
    /// Creates a signal that has not been triggered.
    pub fn new() -> Self {
        let (tx, rx) = watch::channel(false);
        Self {
            tx: Arc::new(tx),
            rx,
        }
    }

    /// Triggers the signal. Calling it again has no effect.
    pub fn trigger(&self) {
        self.tx.send_replace(true);
    }

    /// Returns true once the signal has been triggered.
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once the signal has been triggered.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        // The sender lives as long as any clone, so this only ends on trigger.
        let _ = rx.wait_for(|triggered| *triggered).await;
    }
}

impl Default for Shutdown {
    fn default() -> Self {
        Self::new()
    }
}
