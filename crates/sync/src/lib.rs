//! Drives records from an [`EventSource`](worboo_ledger::EventSource)
//! through the cache into the leaderboard.

use core::time::Duration;

pub mod orchestrator;
pub mod scheduler;

pub use orchestrator::{SyncError, SyncOrchestrator, SyncReport};
pub use scheduler::run_periodic;

#[cfg(test)]
mod tests;

#[derive(Copy, Clone, Debug)]
pub struct SyncConfig {
    /// Upper bound on the number of positions fetched per request.
    pub batch_size: u64,
    /// Delay between two periodic syncs.
    pub interval: Duration,
}
