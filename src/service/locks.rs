//! Per-key mutation locks.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = Arc<Mutex<HashMap<String, Arc<AsyncMutex<()>>>>>;

/// Serializes mutations to the same flag key while leaving other keys free.
///
/// A key's entry lives only while someone holds or waits for its lock.
#[derive(Debug, Default)]
pub struct KeyLocks {
    locks: LockMap,
}

impl KeyLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for exclusive access to `key`; released when the guard drops.
    pub async fn acquire(&self, key: &str) -> KeyGuard {
        let lock = {
            let mut locks = self
                .locks
                .lock()
                .unwrap_or_else(|poisoned| poisoned.into_inner());
            locks.entry(key.to_string()).or_default().clone()
        };
        KeyGuard {
            key: key.to_string(),
            guard: Some(lock.lock_owned().await),
            locks: self.locks.clone(),
        }
    }

    /// Number of keys currently held or awaited.
    pub fn len(&self) -> usize {
        self.locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// == Key Guard ==
/// Exclusive access to one key. Dropping it removes the key's entry when no
/// other task is waiting on it.
#[derive(Debug)]
pub struct KeyGuard {
    key: String,
    guard: Option<OwnedMutexGuard<()>>,
    locks: LockMap,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        let Some(guard) = self.guard.take() else {
            return;
        };
        let lock = Arc::clone(OwnedMutexGuard::mutex(&guard));
        drop(guard);

        let mut locks = self
            .locks
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        // One reference in the map, one in `lock`; any more is a waiter
        let idle = locks
            .get(&self.key)
            .is_some_and(|entry| Arc::ptr_eq(entry, &lock) && Arc::strong_count(&lock) == 2);
        if idle {
            locks.remove(&self.key);
        }
    }
}
