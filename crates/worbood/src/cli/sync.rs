use clap::Parser;
use eyre::Result as EyreResult;

use crate::cli::RootArgs;

/// Catch up with the ledger once and exit
#[derive(Debug, Parser)]
pub struct SyncCommand {
    /// Override `sync.batch_size` for this run
    #[arg(long, value_name = "BLOCKS")]
    pub batch_size: Option<u64>,
}

impl SyncCommand {
    pub async fn run(self, root_args: &RootArgs) -> EyreResult<()> {
        let config = root_args.load_config()?;
        let mut orchestrator = root_args.orchestrator(&config)?;

        let report = orchestrator
            .sync(self.batch_size.unwrap_or(config.sync.batch_size))
            .await?;

        root_args.output().write(&report);

        Ok(())
    }
}
