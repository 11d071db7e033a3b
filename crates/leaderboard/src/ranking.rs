use core::cmp::Ordering;

use worboo_primitives::stats::{LeaderboardEntry, PlayerStats};

/// Produces the leaderboard for `players`.
///
/// Entries are ordered by streak, wins and games (all descending), then by
/// address ascending, which makes the order total. `limit` only truncates the
/// sorted result.
pub fn rank<'a, I>(players: I, limit: Option<usize>) -> Vec<LeaderboardEntry>
where
    I: IntoIterator<Item = &'a PlayerStats>,
{
    let mut entries: Vec<LeaderboardEntry> =
        players.into_iter().map(LeaderboardEntry::from).collect();

    entries.sort_unstable_by(compare);

    if let Some(limit) = limit {
        entries.truncate(limit);
    }

    entries
}

#[must_use]
pub fn compare(a: &LeaderboardEntry, b: &LeaderboardEntry) -> Ordering {
    b.streak
        .cmp(&a.streak)
        .then_with(|| b.total_wins.cmp(&a.total_wins))
        .then_with(|| b.total_games.cmp(&a.total_games))
        .then_with(|| a.player.cmp(&b.player))
}
