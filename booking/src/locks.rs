//! Per-class mutual exclusion.
//!
//! Every operation that reads a class's seat state and then writes it (book,
//! cancel, delete class) runs while holding that class's lock, so two requests
//! for the same class are serialized inside this process. Requests for
//! different classes never contend.
//!
//! Locks are created on first use. The entry goes away when the last guard is
//! released with nobody waiting, or when the last waiter gives up before it
//! got the lock.

use fitbook_core::ClassId;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};

type LockTable = HashMap<ClassId, Arc<AsyncMutex<()>>>;

/// Table of per-class async locks. Cloning shares the table.
#[derive(Clone, Default, Debug)]
pub struct ClassLocks {
    table: Arc<Mutex<LockTable>>,
}

impl ClassLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for exclusive access to `class`.
    ///
    /// The lock is released when the returned guard is dropped.
    pub async fn lock(&self, class: ClassId) -> ClassLockGuard {
        let mutex = {
            let mut table = self.table.lock().unwrap_or_else(PoisonError::into_inner);
            Arc::clone(table.entry(class).or_default())
        };

        // Declared before the await so it drops after the pending acquire.
        let _waiter = Waiter {
            class,
            table: &self.table,
        };
        let guard = mutex.lock_owned().await;

        ClassLockGuard {
            class,
            table: Arc::clone(&self.table),
            _guard: guard,
        }
    }

    /// Number of classes with a live lock entry.
    #[must_use]
    pub fn active(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

/// Exclusive access to one class. Releases on drop.
#[derive(Debug)]
pub struct ClassLockGuard {
    class: ClassId,
    table: Arc<Mutex<LockTable>>,
    _guard: OwnedMutexGuard<()>,
}

impl ClassLockGuard {
    /// The locked class.
    #[must_use]
    pub const fn class(&self) -> ClassId {
        self.class
    }
}

impl Drop for ClassLockGuard {
    fn drop(&mut self) {
        // Our guard still holds one reference.
        prune(&self.table, self.class, 1);
    }
}

/// Cleans up after a `lock` call that was dropped mid-wait.
struct Waiter<'a> {
    class: ClassId,
    table: &'a Mutex<LockTable>,
}

impl Drop for Waiter<'_> {
    fn drop(&mut self) {
        prune(self.table, self.class, 0);
    }
}

/// Drop `class`'s entry if nothing beyond the table and `held` references
/// points at it.
fn prune(table: &Mutex<LockTable>, class: ClassId, held: usize) {
    let mut table = table.lock().unwrap_or_else(PoisonError::into_inner);
    if table
        .get(&class)
        .is_some_and(|entry| Arc::strong_count(entry) <= 1 + held)
    {
        table.remove(&class);
    }
}
