use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use worboo_primitives::stats::{LeaderboardEntry, PlayerStats};

use crate::reconciler::Reconciler;

/// Shared handle to a [`Reconciler`] and the cursor it reflects.
///
/// The sync side writes through [`update`](Self::update); any number of
/// readers may rank or look up players concurrently and observe whatever has
/// been reconciled so far.
#[derive(Clone, Debug, Default)]
pub struct LeaderboardHandle {
    reconciler: Arc<RwLock<Reconciler>>,
    last_synced_position: Arc<AtomicU64>,
}

impl LeaderboardHandle {
    #[must_use]
    pub fn new(reconciler: Reconciler, last_synced_position: u64) -> Self {
        Self {
            reconciler: Arc::new(RwLock::new(reconciler)),
            last_synced_position: Arc::new(AtomicU64::new(last_synced_position)),
        }
    }

    #[must_use]
    pub fn rank(&self, limit: Option<usize>) -> Vec<LeaderboardEntry> {
        self.reconciler.read().rank(limit)
    }

    #[must_use]
    pub fn player(&self, address: &str) -> Option<PlayerStats> {
        self.reconciler.read().player(address).cloned()
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.reconciler.read().len()
    }

    #[must_use]
    pub fn last_synced_position(&self) -> u64 {
        self.last_synced_position.load(Ordering::Acquire)
    }

    pub fn set_last_synced_position(&self, position: u64) {
        self.last_synced_position.store(position, Ordering::Release);
    }

    pub fn update<R>(&self, f: impl FnOnce(&mut Reconciler) -> R) -> R {
        f(&mut self.reconciler.write())
    }

    pub fn replace(&self, reconciler: Reconciler) {
        *self.reconciler.write() = reconciler;
    }
}
