use core::num::NonZeroU64;

use serde::Serialize;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use worboo_leaderboard::{ApplyOutcome, LeaderboardHandle, Reconciler};
use worboo_ledger::decode::{system_clock, Clock};
use worboo_ledger::{DecodeError, EventSource, LedgerError, RecordDecoder};
use worboo_store::{StoreError, SyncCache};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SyncError {
    #[error("batch size must be greater than zero")]
    InvalidBatchSize,
    #[error(transparent)]
    Ledger(#[from] LedgerError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// What a single [`SyncOrchestrator::sync`] call did.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncReport {
    /// Head position observed at the start of the call.
    pub head: u64,
    pub start_position: u64,
    pub last_synced_position: u64,
    pub batches: u64,
    pub events: usize,
    pub appended: usize,
    pub duplicates: usize,
    pub inserted: usize,
    pub replaced: usize,
    pub stale: usize,
    pub cancelled: bool,
}

impl SyncReport {
    /// Nothing was fetched because the cursor already reached the head.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.batches == 0 && !self.cancelled
    }
}

/// Owns the cache and is the single writer of the leaderboard behind it.
///
/// Syncs take `&mut self`, so two syncs against one cache cannot overlap.
#[derive(Debug)]
pub struct SyncOrchestrator<S> {
    source: S,
    cache: SyncCache,
    leaderboard: LeaderboardHandle,
    clock: Clock,
}

impl<S: EventSource> SyncOrchestrator<S> {
    /// Rebuilds the leaderboard from every cached record.
    pub fn new(source: S, cache: SyncCache) -> Self {
        let reconciler = Reconciler::replay(cache.records());

        info!(
            players = reconciler.len(),
            records = cache.records().len(),
            last_synced_position = cache.last_synced_position(),
            "Restored leaderboard from cache"
        );

        let leaderboard = LeaderboardHandle::new(reconciler, cache.last_synced_position());

        Self {
            source,
            cache,
            leaderboard,
            clock: system_clock,
        }
    }

    /// Replaces the clock used when a block timestamp cannot be resolved.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn leaderboard(&self) -> LeaderboardHandle {
        self.leaderboard.clone()
    }

    #[must_use]
    pub const fn cache(&self) -> &SyncCache {
        &self.cache
    }

    #[must_use]
    pub fn into_cache(self) -> SyncCache {
        self.cache
    }

    #[must_use]
    pub const fn last_synced_position(&self) -> u64 {
        self.cache.last_synced_position()
    }

    pub async fn sync(&mut self, batch_size: u64) -> Result<SyncReport, SyncError> {
        self.sync_cancellable(batch_size, &CancellationToken::new())
            .await
    }

    /// Catches up with the source head, one batch at a time.
    ///
    /// Each batch is fetched, decoded, committed to the cache and only then
    /// folded into the leaderboard. Any failure leaves the cursor where the
    /// last committed batch put it. `cancel` is checked between batches.
    pub async fn sync_cancellable(
        &mut self,
        batch_size: u64,
        cancel: &CancellationToken,
    ) -> Result<SyncReport, SyncError> {
        let batch_size = NonZeroU64::new(batch_size).ok_or(SyncError::InvalidBatchSize)?;

        let head = self.source.head_position().await?;
        let start = self.cache.last_synced_position();

        let mut report = SyncReport {
            head,
            start_position: start,
            last_synced_position: start,
            ..SyncReport::default()
        };

        if head <= start {
            debug!(head, last_synced_position = start, "Already up to date");
            return Ok(report);
        }

        let decoder = RecordDecoder::new(&self.source).with_clock(self.clock);
        let mut cursor = start;

        while cursor < head {
            if cancel.is_cancelled() {
                info!(last_synced_position = cursor, head, "Sync cancelled");
                report.cancelled = true;
                break;
            }

            let from = cursor.saturating_add(1);
            let to = cursor.saturating_add(batch_size.get()).min(head);

            let events = self.source.events(from, to).await?;
            let records = decoder.decode_batch(&events).await?;
            let commit = self.cache.commit_batch(records, to)?;

            let (inserted, replaced, stale) = self.leaderboard.update(|reconciler| {
                let mut tally = (0_usize, 0_usize, 0_usize);
                for record in &commit.appended {
                    match reconciler.apply(record) {
                        ApplyOutcome::Inserted => tally.0 = tally.0.saturating_add(1),
                        ApplyOutcome::Replaced => tally.1 = tally.1.saturating_add(1),
                        ApplyOutcome::Stale => tally.2 = tally.2.saturating_add(1),
                    }
                }
                tally
            });
            self.leaderboard.set_last_synced_position(to);

            info!(
                from,
                to,
                events = events.len(),
                appended = commit.appended.len(),
                duplicates = commit.duplicates,
                stale,
                "Synced batch"
            );

            cursor = to;
            report.last_synced_position = to;
            report.batches = report.batches.saturating_add(1);
            report.events = report.events.saturating_add(events.len());
            report.appended = report.appended.saturating_add(commit.appended.len());
            report.duplicates = report.duplicates.saturating_add(commit.duplicates);
            report.inserted = report.inserted.saturating_add(inserted);
            report.replaced = report.replaced.saturating_add(replaced);
            report.stale = report.stale.saturating_add(stale);
        }

        Ok(report)
    }
}
