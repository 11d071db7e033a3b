#[cfg(test)]
#[path = "tests/record.rs"]
mod tests;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::address::PlayerAddress;

/// Where a record's `timestamp` was taken from.
#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum TimestampSource {
    /// The timestamp of the ledger block containing the event.
    #[default]
    Ledger,
    /// The block could not be resolved; the decoder's local clock was used.
    LocalClock,
}

/// Identity of a single event on the ledger.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct EventKey {
    pub position: u64,
    pub log_index: u64,
}

/// One decoded snapshot of a player's cumulative game state.
///
/// `streak`, `total_games` and `total_wins` are absolute values as of this
/// record, never deltas. Timestamps are unix milliseconds.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GameRecord {
    pub player: PlayerAddress,
    pub day_id: u64,
    pub victory: bool,
    pub streak: u64,
    pub total_games: u64,
    pub total_wins: u64,
    #[serde(alias = "blockNumber")]
    pub position: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub log_index: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
    pub timestamp: u64,
    #[serde(default)]
    pub timestamp_source: TimestampSource,
}

#[derive(Clone, Copy, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum RecordError {
    #[error("total wins ({wins}) exceed total games ({games})")]
    WinsExceedGames { wins: u64, games: u64 },
    #[error("streak ({streak}) exceeds total games ({games})")]
    StreakExceedsGames { streak: u64, games: u64 },
}

impl GameRecord {
    /// Checks the counter invariants every snapshot must satisfy.
    pub const fn validate(&self) -> Result<(), RecordError> {
        if self.total_wins > self.total_games {
            return Err(RecordError::WinsExceedGames {
                wins: self.total_wins,
                games: self.total_games,
            });
        }

        if self.streak > self.total_games {
            return Err(RecordError::StreakExceedsGames {
                streak: self.streak,
                games: self.total_games,
            });
        }

        Ok(())
    }

    /// The ledger identity of the event this record was decoded from, if the
    /// source reported a log index for it.
    #[must_use]
    pub fn event_key(&self) -> Option<EventKey> {
        self.log_index.map(|log_index| EventKey {
            position: self.position,
            log_index,
        })
    }

    #[must_use]
    pub const fn losses(&self) -> u64 {
        self.total_games.saturating_sub(self.total_wins)
    }
}
