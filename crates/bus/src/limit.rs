//! Explicit bound on concurrently running handling tasks.

use std::sync::Arc;

use tokio::sync::{OwnedSemaphorePermit, Semaphore};

/// Caps how many handling tasks a loop may have in flight.
///
/// `None` means unlimited: one task per message with no admission control.
#[derive(Debug, Clone)]
pub struct ConcurrencyLimit {
    max: Option<usize>,
    semaphore: Option<Arc<Semaphore>>,
}

/// Slot held by a running handling task; dropping it frees the slot.
#[derive(Debug)]
pub struct Permit {
    _permit: Option<OwnedSemaphorePermit>,
}

impl ConcurrencyLimit {
    /// Creates a limit of `max` concurrent tasks, or unlimited for `None`.
    ///
    /// A limit of zero is treated as one so the loop can make progress.
    pub fn new(max: Option<usize>) -> Self {
        let max = max.map(|max| max.max(1));
        Self {
            max,
            semaphore: max.map(|max| Arc::new(Semaphore::new(max))),
        }
    }

    /// Creates a limit that never makes a task wait.
    pub fn unlimited() -> Self {
        Self::new(None)
    }

    /// Returns the configured bound, if any.
    pub fn max(&self) -> Option<usize> {
        self.max
    }

    /// Returns how many more tasks may start right now, if bounded.
    pub fn available(&self) -> Option<usize> {
        self.semaphore.as_ref().map(|s| s.available_permits())
    }

    /// Waits for a free slot.
    pub async fn acquire(&self) -> Permit {
        let permit = match &self.semaphore {
            // Never closed, so this cannot fail.
            Some(semaphore) => Arc::clone(semaphore).acquire_owned().await.ok(),
            None => None,
        };
        Permit { _permit: permit }
    }
}
