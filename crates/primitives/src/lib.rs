//! Shared data model of the Worboo leaderboard indexer.
//!
//! - [`GameRecord`](record::GameRecord): one decoded "game recorded" snapshot.
//! - [`PlayerStats`](stats::PlayerStats): the reconciled state of one player.
//! - [`LeaderboardEntry`](stats::LeaderboardEntry): a ranked projection of it.

pub mod address;
pub mod record;
pub mod stats;
