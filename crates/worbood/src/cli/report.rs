use chrono::{DateTime, Utc};
use clap::Parser;
use eyre::{bail, Result as EyreResult};
use serde::Serialize;
use tracing::info;
use worboo_leaderboard::Reconciler;
use worboo_primitives::record::GameRecord;
use worboo_primitives::stats::LeaderboardEntry;

use crate::cli::RootArgs;

/// Generate a leaderboard report
#[derive(Debug, Parser)]
pub struct ReportCommand {
    /// Use the cache as is, without syncing first
    #[arg(long)]
    pub offline: bool,

    /// Only count records at or after this block
    #[arg(long, value_name = "BLOCK")]
    pub from: Option<u64>,

    /// Only count records at or before this block
    #[arg(long, value_name = "BLOCK")]
    pub to: Option<u64>,

    /// Number of entries, defaults to `leaderboard.report_limit`
    #[arg(long, value_name = "N")]
    pub limit: Option<usize>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardReport {
    pub generated_at: DateTime<Utc>,
    pub registry: String,
    pub last_synced_position: u64,
    pub total_players: usize,
    pub entries: Vec<LeaderboardEntry>,
}

impl ReportCommand {
    pub async fn run(self, root_args: &RootArgs) -> EyreResult<()> {
        if let (Some(from), Some(to)) = (self.from, self.to) {
            if from > to {
                bail!("--from ({from}) must not be greater than --to ({to})");
            }
        }

        let config = root_args.load_config()?;

        let cache = if self.offline {
            root_args.open_cache(&config)?
        } else {
            let mut orchestrator = root_args.orchestrator(&config)?;
            let report = orchestrator.sync(config.sync.batch_size).await?;

            info!(
                head = report.head,
                appended = report.appended,
                "Synced before generating report"
            );

            orchestrator.into_cache()
        };

        let reconciler = Reconciler::replay(
            cache
                .records()
                .iter()
                .filter(|record| self.includes(record)),
        );

        let report = LeaderboardReport {
            generated_at: Utc::now(),
            registry: config.ledger.registry,
            last_synced_position: cache.last_synced_position(),
            total_players: reconciler.len(),
            entries: reconciler.rank(Some(
                self.limit.unwrap_or(config.leaderboard.report_limit),
            )),
        };

        root_args.output().write(&report);

        Ok(())
    }

    pub(crate) fn includes(&self, record: &GameRecord) -> bool {
        self.from.is_none_or(|from| record.position >= from)
            && self.to.is_none_or(|to| record.position <= to)
    }
}
