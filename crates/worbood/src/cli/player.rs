use clap::Parser;
use eyre::{bail, Result as EyreResult};
use worboo_leaderboard::Reconciler;

use crate::cli::RootArgs;

/// Show a player's current stats from the cache
#[derive(Debug, Parser)]
pub struct PlayerCommand {
    /// Player address, any casing
    #[arg(value_name = "ADDRESS")]
    pub address: String,
}

impl PlayerCommand {
    pub fn run(self, root_args: &RootArgs) -> EyreResult<()> {
        let config = root_args.load_config()?;
        let cache = root_args.open_cache(&config)?;

        let reconciler = Reconciler::replay(cache.records());

        let Some(stats) = reconciler.player(&self.address) else {
            bail!("Player not found: {}", self.address);
        };

        root_args.output().write(stats);

        Ok(())
    }
}
