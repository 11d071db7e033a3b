use core::cmp::Ordering;
use std::collections::hash_map::Entry;
use std::collections::HashMap;

use tracing::debug;
use worboo_primitives::address::PlayerAddress;
use worboo_primitives::record::GameRecord;
use worboo_primitives::stats::{LeaderboardEntry, PlayerStats};

use crate::ranking;

/// What [`Reconciler::apply`] did with a record.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ApplyOutcome {
    /// First record seen for the player.
    Inserted,
    /// The record was at least as recent as the held snapshot and replaced it.
    Replaced,
    /// The record was older than the held snapshot and was discarded.
    Stale,
}

/// Folds [`GameRecord`]s into one [`PlayerStats`] per player.
///
/// The held snapshot is replaced only by a record that is at least as recent,
/// where recency compares `total_games` first and `day_id` second (ties on
/// `day_id` replace). Cumulative counters are monotonic on the ledger, so the
/// final state does not depend on delivery order or on redelivery.
#[derive(Clone, Debug, Default)]
pub struct Reconciler {
    players: HashMap<PlayerAddress, PlayerStats>,
    stale_discarded: u64,
}

impl Reconciler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds state from scratch by applying `records` in order.
    pub fn replay<'a, I>(records: I) -> Self
    where
        I: IntoIterator<Item = &'a GameRecord>,
    {
        let mut reconciler = Self::new();

        for record in records {
            let _outcome = reconciler.apply(record);
        }

        reconciler
    }

    pub fn apply(&mut self, record: &GameRecord) -> ApplyOutcome {
        match self.players.entry(record.player.clone()) {
            Entry::Vacant(entry) => {
                let _ignored = entry.insert(PlayerStats::from_record(record));

                ApplyOutcome::Inserted
            }
            Entry::Occupied(mut entry) => {
                let held = entry.get_mut();

                if !supersedes(record, held) {
                    debug!(
                        player = %record.player,
                        held_games = held.total_games,
                        record_games = record.total_games,
                        position = record.position,
                        "Discarding stale record"
                    );

                    self.stale_discarded = self.stale_discarded.saturating_add(1);

                    return ApplyOutcome::Stale;
                }

                held.assign(record);

                ApplyOutcome::Replaced
            }
        }
    }

    /// Looks up a player by address, in any casing.
    #[must_use]
    pub fn player(&self, address: &str) -> Option<&PlayerStats> {
        self.players.get(&PlayerAddress::new(address))
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerStats> {
        self.players.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.players.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    /// Number of records discarded as stale since this instance was created.
    #[must_use]
    pub const fn stale_discarded(&self) -> u64 {
        self.stale_discarded
    }

    #[must_use]
    pub fn rank(&self, limit: Option<usize>) -> Vec<LeaderboardEntry> {
        ranking::rank(self.players.values(), limit)
    }
}

fn supersedes(record: &GameRecord, held: &PlayerStats) -> bool {
    match record.total_games.cmp(&held.total_games) {
        Ordering::Greater => true,
        Ordering::Equal => record.day_id >= held.last_game_day_id,
        Ordering::Less => false,
    }
}
