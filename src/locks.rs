use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

use crate::entities::EntityKey;

type Slot = Arc<AsyncMutex<()>>;
type SlotTable = Arc<Mutex<HashMap<EntityKey, Slot>>>;

fn lock_table(table: &SlotTable) -> MutexGuard<'_, HashMap<EntityKey, Slot>> {
    // the table holds no invariant a panicking holder could break
    table.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Held entity locks.
///
/// Dropping the guard releases the locks and removes every slot that no
/// other transaction holds or waits on, so the table only tracks live keys.
#[derive(Debug)]
pub struct LockGuard {
    keys: Vec<EntityKey>,
    guards: Vec<OwnedMutexGuard<()>>,
    table: SlotTable,
}

impl LockGuard {
    pub fn keys(&self) -> &[EntityKey] {
        &self.keys
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        self.guards.clear();
        let mut table = lock_table(&self.table);
        for key in &self.keys {
            if table
                .get(key)
                .is_some_and(|slot| Arc::strong_count(slot) == 1)
            {
                table.remove(key);
            }
        }
    }
}

/// Per-identity async mutexes.
///
/// `acquire` locks keys in sorted order. Callers that take a second batch
/// while holding a first must only ever do so with the loan lock in the
/// first batch, so no two transactions wait on each other.
#[derive(Debug, Default)]
pub struct EntityLocks {
    slots: SlotTable,
}

impl EntityLocks {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn acquire(&self, keys: &[EntityKey]) -> LockGuard {
        let mut keys = keys.to_vec();
        keys.sort();
        keys.dedup();

        let slots: Vec<Slot> = {
            let mut table = lock_table(&self.slots);
            keys.iter()
                .map(|key| Arc::clone(table.entry(key.clone()).or_default()))
                .collect()
        };

        let mut guards = Vec::with_capacity(slots.len());
        for slot in slots {
            guards.push(slot.lock_owned().await);
        }
        tracing::debug!(keys = ?keys, "entity locks acquired");

        LockGuard {
            keys,
            guards,
            table: Arc::clone(&self.slots),
        }
    }

    /// keys currently held or waited on
    pub fn tracked(&self) -> usize {
        lock_table(&self.slots).len()
    }
}
