use clap::ValueEnum;
use comfy_table::{Cell, Color, Table};
use serde::Serialize;
use worboo_primitives::stats::{LeaderboardEntry, PlayerStats};
use worboo_sync::SyncReport;

use crate::cli::report::LeaderboardReport;

#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum Format {
    Json,
    #[default]
    PlainText,
}

#[derive(Debug, Default)]
pub struct Output {
    format: Format,
}

pub trait Report {
    fn report(&self);
}

impl Output {
    pub const fn new(format: Format) -> Self {
        Self { format }
    }

    pub fn write<T: Serialize + Report>(&self, value: &T) {
        match self.format {
            Format::Json => match serde_json::to_string_pretty(value) {
                Ok(json) => println!("{json}"),
                Err(err) => eprintln!("Failed to serialize to JSON: {err}"),
            },
            Format::PlainText => value.report(),
        }
    }
}

fn header(names: &[&str]) -> Vec<Cell> {
    names.iter().map(|name| Cell::new(name).fg(Color::Blue)).collect()
}

fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}

/// One-line summary for a sync that fetched nothing, `None` otherwise.
fn sync_headline(report: &SyncReport) -> Option<String> {
    if report.batches > 0 {
        return None;
    }

    if report.cancelled {
        return Some(format!(
            "Sync cancelled before the first batch, still at block {} (head {})",
            report.last_synced_position, report.head
        ));
    }

    Some(format!(
        "Already up to date at block {} (head {})",
        report.last_synced_position, report.head
    ))
}

impl Report for SyncReport {
    fn report(&self) {
        if let Some(headline) = sync_headline(self) {
            println!("{headline}");
            return;
        }

        let mut table = Table::new();
        let _ = table.set_header(header(&["Field", "Value"]));

        let rows: [(&str, String); 9] = [
            ("Head", self.head.to_string()),
            ("Synced from", self.start_position.to_string()),
            ("Synced to", self.last_synced_position.to_string()),
            ("Batches", self.batches.to_string()),
            ("Events", self.events.to_string()),
            ("New records", self.appended.to_string()),
            ("Duplicates skipped", self.duplicates.to_string()),
            ("Stale records", self.stale.to_string()),
            ("Cancelled", self.cancelled.to_string()),
        ];

        for (field, value) in rows {
            let _ = table.add_row(vec![field.to_owned(), value]);
        }

        println!("{table}");
    }
}

impl Report for PlayerStats {
    fn report(&self) {
        let mut table = Table::new();
        let _ = table.set_header(header(&[
            "Player", "Streak", "Wins", "Games", "Losses", "Win rate", "Last day", "Last block",
        ]));

        let _ = table.add_row(vec![
            self.address.to_string(),
            self.current_streak.to_string(),
            self.total_wins.to_string(),
            self.total_games.to_string(),
            self.losses().to_string(),
            percent(self.victory_rate()),
            self.last_game_day_id.to_string(),
            self.last_position.to_string(),
        ]);

        println!("{table}");
    }
}

impl Report for [LeaderboardEntry] {
    fn report(&self) {
        if self.is_empty() {
            println!("No players recorded yet");
            return;
        }

        let mut table = Table::new();
        let _ = table.set_header(header(&[
            "#", "Player", "Streak", "Wins", "Games", "Losses", "Win rate", "Last day",
        ]));

        for (rank, entry) in (1_usize..).zip(self) {
            let _ = table.add_row(vec![
                rank.to_string(),
                entry.player.to_string(),
                entry.streak.to_string(),
                entry.total_wins.to_string(),
                entry.total_games.to_string(),
                entry.losses.to_string(),
                percent(entry.victory_rate),
                entry.last_day_id.to_string(),
            ]);
        }

        println!("{table}");
    }
}

impl Report for LeaderboardReport {
    fn report(&self) {
        println!(
            "Leaderboard for registry {} at block {} ({} players, generated {})",
            self.registry,
            self.last_synced_position,
            self.total_players,
            self.generated_at.format("%Y-%m-%d %H:%M:%S UTC"),
        );

        self.entries.report();
    }
}

#[cfg(test)]
mod tests;
