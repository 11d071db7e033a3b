#[cfg(test)]
#[path = "tests/stats.rs"]
mod tests;

use serde::{Deserialize, Serialize};

use crate::address::PlayerAddress;
use crate::record::GameRecord;

/// Decimal places kept in a reported victory rate.
pub const VICTORY_RATE_SCALE: u32 = 10_000;

/// The current reconciled state of a single player.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerStats {
    pub address: PlayerAddress,
    pub total_games: u64,
    pub total_wins: u64,
    pub current_streak: u64,
    pub last_game_day_id: u64,
    pub last_seen_at: u64,
    pub last_position: u64,
}

impl PlayerStats {
    #[must_use]
    pub fn from_record(record: &GameRecord) -> Self {
        Self {
            address: record.player.clone(),
            total_games: record.total_games,
            total_wins: record.total_wins,
            current_streak: record.streak,
            last_game_day_id: record.day_id,
            last_seen_at: record.timestamp,
            last_position: record.position,
        }
    }

    /// Overwrites every snapshot field with the values carried by `record`.
    pub fn assign(&mut self, record: &GameRecord) {
        self.total_games = record.total_games;
        self.total_wins = record.total_wins;
        self.current_streak = record.streak;
        self.last_game_day_id = record.day_id;
        self.last_seen_at = record.timestamp;
        self.last_position = record.position;
    }

    #[must_use]
    pub const fn losses(&self) -> u64 {
        self.total_games.saturating_sub(self.total_wins)
    }

    #[must_use]
    pub fn victory_rate(&self) -> f64 {
        victory_rate(self.total_wins, self.total_games)
    }
}

/// `wins / games` rounded half-up to four decimal places; `0` when no game
/// has been played.
///
/// Rounding is done on the exact rational, so values such as `2/3` come out
/// as `0.6667` with no floating-point drift.
#[must_use]
pub fn victory_rate(wins: u64, games: u64) -> f64 {
    if games == 0 {
        return 0.0;
    }

    let wins = u128::from(wins.min(games));
    let games = u128::from(games);
    let scale = u128::from(VICTORY_RATE_SCALE);

    let scaled = (wins * scale * 2 + games) / (games * 2);
    let scaled = u32::try_from(scaled).unwrap_or(VICTORY_RATE_SCALE);

    f64::from(scaled) / f64::from(VICTORY_RATE_SCALE)
}

/// A ranked projection of a player's current state.
#[derive(Clone, Debug, Deserialize, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntry {
    pub player: PlayerAddress,
    pub streak: u64,
    pub total_wins: u64,
    pub total_games: u64,
    pub losses: u64,
    pub victory_rate: f64,
    pub last_day_id: u64,
    pub last_updated_at: u64,
}

impl From<&PlayerStats> for LeaderboardEntry {
    fn from(stats: &PlayerStats) -> Self {
        Self {
            player: stats.address.clone(),
            streak: stats.current_streak,
            total_wins: stats.total_wins,
            total_games: stats.total_games,
            losses: stats.losses(),
            victory_rate: stats.victory_rate(),
            last_day_id: stats.last_game_day_id,
            last_updated_at: stats.last_seen_at,
        }
    }
}
