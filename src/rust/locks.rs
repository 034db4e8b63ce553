//! Name-scoped mutual exclusion.
//!
//! Every classifier name gets its own asynchronous mutex, created the first time
//! the name is locked and dropped from the [`NameLocks`] table once nobody holds
//! or waits for it. Work addressing one name is serialized; work addressing
//! different names never shares a lock. Waiters on the same name are served in
//! FIFO order.

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type SlotTable = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LockError {
    #[error("Timed out after {waited:?} waiting for the lock on '{name}'")]
    Timeout { name: String, waited: Duration },
    #[error("Lock table is poisoned")]
    Poisoned,
}

/// Proof that the holder has exclusive access to one name. Dropping it
/// releases the lock.
#[derive(Debug)]
pub struct NameGuard {
    name: String,
    guard: Option<OwnedMutexGuard<()>>,
    slots: SlotTable,
}

impl NameGuard {
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for NameGuard {
    fn drop(&mut self) {
        // The inner guard owns a reference to the slot; it must go first.
        drop(self.guard.take());
        release_slot(&self.slots, &self.name);
        log::trace!("Released lock on '{}'", self.name);
    }
}

/// Removes the slot for `name` when the table holds its only reference.
///
/// Acquirers clone the slot under the same table lock, so a slot that is not
/// referenced outside the table has no holder and no waiter.
fn release_slot(slots: &SlotTable, name: &str) {
    if let Ok(mut slots) = slots.lock() {
        if slots.get(name).is_some_and(|slot| Arc::strong_count(slot) == 1) {
            slots.remove(name);
        }
    }
}

#[derive(Debug, Default)]
pub struct NameLocks {
    slots: SlotTable,
    timeout: Option<Duration>,
}

impl NameLocks {
    /// Creates an empty lock table. With `timeout` set, acquisitions that wait
    /// longer than it fail with [`LockError::Timeout`].
    pub fn new(timeout: Option<Duration>) -> Self {
        Self {
            slots: SlotTable::default(),
            timeout,
        }
    }

    /// Number of names currently held or waited for
    pub fn tracked_names(&self) -> usize {
        self.slots.lock().map(|slots| slots.len()).unwrap_or(0)
    }

    fn slot(&self, name: &str) -> Result<Arc<AsyncMutex<()>>, LockError> {
        // The table lock is only held to look up or insert a slot, never across an await.
        let mut slots = self.slots.lock().map_err(|_| LockError::Poisoned)?;
        Ok(Arc::clone(slots.entry(name.to_string()).or_default()))
    }

    /// Waits for exclusive access to `name`.
    pub async fn acquire(&self, name: &str) -> Result<NameGuard, LockError> {
        let slot = self.slot(name)?;
        let guard = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, slot.lock_owned()).await {
                Ok(guard) => guard,
                Err(_) => {
                    // The abandoned wait dropped its slot reference
                    release_slot(&self.slots, name);
                    return Err(LockError::Timeout {
                        name: name.to_string(),
                        waited: limit,
                    });
                }
            },
            None => slot.lock_owned().await,
        };
        log::trace!("Acquired lock on '{}'", name);
        Ok(NameGuard {
            name: name.to_string(),
            guard: Some(guard),
            slots: Arc::clone(&self.slots),
        })
    }

    /// Runs the future produced by `work` while holding the lock on `name`.
    ///
    /// The lock is released when `work` finishes, whatever it returns, and also
    /// if it panics or the returned future is dropped before completion.
    pub async fn run<F, Fut, T>(&self, name: &str, work: F) -> Result<T, LockError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T>,
    {
        let _guard = self.acquire(name).await?;
        Ok(work().await)
    }
}
