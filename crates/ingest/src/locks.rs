//! Per-block-number async locks.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, PoisonError},
};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockMap = HashMap<u64, Arc<AsyncMutex<()>>>;

/// A registry of async locks keyed by block number.
///
/// The scanner and the worker hold the lock of a number around every read-decide-write
/// sequence on its state. Entries are created on demand and dropped with the last guard, so the
/// registry only holds numbers that are locked or waited on.
#[derive(Debug, Clone, Default)]
pub struct BlockLocks {
    inner: Arc<Mutex<LockMap>>,
}

impl BlockLocks {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits for and acquires the lock of `number`.
    pub async fn lock(&self, number: u64) -> BlockGuard {
        let mutex = self.map().entry(number).or_default().clone();
        let guard = mutex.lock_owned().await;
        BlockGuard { number, locks: self.clone(), guard: Some(guard) }
    }

    /// Returns the number of block numbers currently locked or waited on.
    pub fn len(&self) -> usize {
        self.map().len()
    }

    /// Returns `true` if no lock is held or waited on.
    pub fn is_empty(&self) -> bool {
        self.map().is_empty()
    }

    fn map(&self) -> std::sync::MutexGuard<'_, LockMap> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the lock of a single block number until dropped.
#[derive(Debug)]
pub struct BlockGuard {
    number: u64,
    locks: BlockLocks,
    guard: Option<OwnedMutexGuard<()>>,
}

impl BlockGuard {
    /// The locked block number.
    pub const fn number(&self) -> u64 {
        self.number
    }
}

impl Drop for BlockGuard {
    fn drop(&mut self) {
        let mut map = self.locks.map();
        drop(self.guard.take());
        // Waiters clone the entry under the map lock, so a count of one means nobody else wants it.
        if map.get(&self.number).is_some_and(|mutex| Arc::strong_count(mutex) == 1) {
            map.remove(&self.number);
        }
    }
}
