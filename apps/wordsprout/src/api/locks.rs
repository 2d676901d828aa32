//! Per-child async locks.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::OwnedMutexGuard;
use wordsprout_core::ChildId;

type Slots = BTreeMap<ChildId, Arc<tokio::sync::Mutex<()>>>;

/// One async mutex per child, created on first use.
///
/// Holding a child's guard serializes every level-writing sequence for that
/// child. Different children never contend. An entry lives only while some
/// request holds or waits for it.
#[derive(Debug, Clone, Default)]
pub struct ChildLocks {
    inner: Arc<Mutex<Slots>>,
}

/// Exclusive access to one child. Releasing it evicts the map entry when no
/// other request is waiting.
#[derive(Debug)]
pub struct ChildGuard {
    child: ChildId,
    guard: Option<OwnedMutexGuard<()>>,
    slots: Arc<Mutex<Slots>>,
}

impl ChildLocks {
    fn slots(&self) -> MutexGuard<'_, Slots> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Wait for exclusive access to `child`.
    pub async fn lock(&self, child: ChildId) -> ChildGuard {
        let lock = Arc::clone(self.slots().entry(child).or_default());
        ChildGuard {
            child,
            guard: Some(lock.lock_owned().await),
            slots: Arc::clone(&self.inner),
        }
    }

    /// Number of children with a lock entry.
    pub fn tracked(&self) -> usize {
        self.slots().len()
    }
}

impl Drop for ChildGuard {
    fn drop(&mut self) {
        drop(self.guard.take());
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        // The map's own handle is the last one: nobody holds or awaits it.
        if slots
            .get(&self.child)
            .is_some_and(|lock| Arc::strong_count(lock) == 1)
        {
            slots.remove(&self.child);
        }
    }
}
