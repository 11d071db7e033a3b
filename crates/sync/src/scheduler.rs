use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use worboo_ledger::EventSource;

use crate::orchestrator::SyncOrchestrator;
use crate::SyncConfig;

/// Syncs every `config.interval` (non-zero) until `cancel` fires.
///
/// The first sync happens one interval from now. A failed sync is logged and
/// the same range is retried on the next tick.
pub async fn run_periodic<S: EventSource>(
    orchestrator: &mut SyncOrchestrator<S>,
    config: SyncConfig,
    cancel: CancellationToken,
) {
    let mut ticker = time::interval_at(Instant::now() + config.interval, config.interval);

    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        match orchestrator
            .sync_cancellable(config.batch_size, &cancel)
            .await
        {
            Ok(report) if report.is_noop() => {
                debug!(head = report.head, "No new blocks");
            }
            Ok(report) => info!(
                head = report.head,
                last_synced_position = report.last_synced_position,
                appended = report.appended,
                "Periodic sync complete"
            ),
            Err(err) => warn!(
                %err,
                last_synced_position = orchestrator.last_synced_position(),
                "Periodic sync failed, retrying next cycle"
            ),
        }
    }

    debug!("Sync scheduler stopped");
}
