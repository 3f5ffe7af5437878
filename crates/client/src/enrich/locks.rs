//! Per-identity async locks.

use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Serializes work on the same identity while letting distinct identities
/// proceed in parallel.
#[derive(Debug, Default)]
pub(crate) struct IdentityLocks {
    slots: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl IdentityLocks {
    /// Wait for exclusive access to `identity`.
    ///
    /// Slots nobody holds or waits on are dropped on each call.
    pub(crate) async fn acquire(&self, identity: &str) -> OwnedMutexGuard<()> {
        let slot = {
            let mut slots = self.slots.lock().await;
            slots.retain(|_, slot| Arc::strong_count(slot) > 1);
            slots.entry(identity.to_string()).or_default().clone()
        };
        slot.lock_owned().await
    }

    #[cfg(test)]
    pub(crate) async fn len(&self) -> usize {
        self.slots.lock().await.len()
    }
}
