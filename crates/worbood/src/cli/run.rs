use clap::Parser;
use eyre::Result as EyreResult;
use tokio::signal::ctrl_c;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use worboo_server::{start, ServerConfig};
use worboo_sync::{run_periodic, SyncConfig};

use crate::cli::RootArgs;

/// Serve the leaderboard and keep it in sync with the ledger
#[derive(Debug, Parser)]
pub struct RunCommand {
    /// Serve the cached leaderboard without an initial sync
    #[arg(long)]
    pub skip_initial_sync: bool,
}

impl RunCommand {
    pub async fn run(self, root_args: &RootArgs) -> EyreResult<()> {
        let config = root_args.load_config()?;
        let mut orchestrator = root_args.orchestrator(&config)?;

        let shutdown = CancellationToken::new();
        let signal = tokio::spawn(wait_for_signal(shutdown.clone()));

        let sync_config = SyncConfig {
            batch_size: config.sync.batch_size,
            interval: config.sync.interval,
        };

        if !self.skip_initial_sync {
            match orchestrator
                .sync_cancellable(sync_config.batch_size, &shutdown)
                .await
            {
                Ok(report) => info!(
                    head = report.head,
                    last_synced_position = report.last_synced_position,
                    appended = report.appended,
                    "Initial sync complete"
                ),
                Err(err) => warn!(%err, "Initial sync failed, serving cached leaderboard"),
            }
        }

        let server_config = ServerConfig::new(
            config.server.listen,
            config.ledger.registry.clone(),
            config.ledger.rpc_url.to_string(),
            config.leaderboard.default_limit,
        );

        let leaderboard = orchestrator.leaderboard();
        let server_shutdown = shutdown.clone();

        let server = async move {
            let result = start(server_config, leaderboard, server_shutdown.clone()).await;
            server_shutdown.cancel();
            result
        };

        let scheduler = run_periodic(&mut orchestrator, sync_config, shutdown.clone());

        let (result, ()) = tokio::join!(server, scheduler);

        shutdown.cancel();
        let _ignored = signal.await;

        result
    }
}

async fn wait_for_signal(shutdown: CancellationToken) {
    tokio::select! {
        () = shutdown.cancelled() => {}
        result = ctrl_c() => match result {
            Ok(()) => {
                info!("Shutting down");
                shutdown.cancel();
            }
            Err(err) => warn!(%err, "Failed to listen for shutdown signal"),
        }
    }
}
