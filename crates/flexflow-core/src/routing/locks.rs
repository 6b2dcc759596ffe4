//! Per-item exclusive locks.
//!
//! Decisions on placements of the same item read and then rewrite the same
//! placement set, so they are serialized on an item-scoped async mutex.
//! Items never share a mutex, so decisions on different items proceed in
//! parallel.

use std::sync::Arc;

use dashmap::DashMap;
use flexflow_types::id::ItemId;
use tokio::sync::{Mutex, OwnedMutexGuard};

/// Registry of one async mutex per item currently being decided on.
#[derive(Debug, Default)]
pub struct ItemLocks {
    locks: DashMap<ItemId, Arc<Mutex<()>>>,
}

impl ItemLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `item_id`. Released when the guard drops.
    pub async fn acquire(&self, item_id: ItemId) -> OwnedMutexGuard<()> {
        // Clone the Arc out so the shard lock is released before awaiting.
        let mutex = self
            .locks
            .entry(item_id)
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        mutex.lock_owned().await
    }

    /// Drop registry entries nobody holds or waits on.
    pub fn prune(&self) {
        self.locks.retain(|_, mutex| Arc::strong_count(mutex) > 1);
    }

    pub fn len(&self) -> usize {
        self.locks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks.is_empty()
    }
}
