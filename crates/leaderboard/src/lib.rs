//! Reconciliation and ranking, shared by the indexer service and the
//! one-shot report generator.
//!
//! - [`Reconciler`]: last-writer-wins fold of game records into player stats
//! - [`ranking::rank`]: deterministic, optionally truncated leaderboard
//! - [`LeaderboardHandle`]: concurrent read access for HTTP handlers

pub mod handle;
pub mod ranking;
pub mod reconciler;

pub use handle::LeaderboardHandle;
pub use reconciler::{ApplyOutcome, Reconciler};
