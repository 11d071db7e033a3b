use camino::Utf8PathBuf;
use clap::{Parser, Subcommand};
use const_format::concatcp;
use eyre::{bail, Result as EyreResult, WrapErr};
use worboo_config::ConfigFile;
use worboo_ledger::{EvmSource, EvmSourceConfig};
use worboo_store::{StoreConfig, SyncCache};
use worboo_sync::SyncOrchestrator;

use crate::defaults;
use crate::output::{Format, Output};

mod init;
mod player;
pub mod report;
mod run;
mod sync;

use init::InitCommand;
use player::PlayerCommand;
use report::ReportCommand;
use run::RunCommand;
use sync::SyncCommand;

#[cfg(test)]
mod tests;

pub const EXAMPLES: &str = r"
  # Initialize the indexer home
  $ worbood --home data/ init --rpc-url http://127.0.0.1:8545 --registry 0x5FbDB2315678afecb367f032d93F642f64180aa3

  # Serve the leaderboard, syncing periodically
  $ worbood --home data/ run

  # Catch up once and print what was synced
  $ worbood --home data/ sync

  # Print the top 20 players as JSON without touching the ledger
  $ worbood --home data/ --output-format json report --offline
";

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
#[command(after_help = concatcp!(
    "Environment variables:\n",
    "  WORBOO_HOME                  Directory for config and cache\n",
    "  WORBOO_INDEXER_RPC_URL       Override ledger.rpc_url\n",
    "  WORBOO_INDEXER_REGISTRY      Override ledger.registry\n",
    "  WORBOO_INDEXER_FROM_BLOCK    Override ledger.from_block\n",
    "  WORBOO_INDEXER_CACHE         Override cache.path\n",
    "  WORBOO_INDEXER_LISTEN        Override server.listen\n\n",
    "Examples:",
    EXAMPLES
))]
pub struct RootCommand {
    #[command(flatten)]
    pub args: RootArgs,

    #[command(subcommand)]
    pub action: SubCommands,
}

#[derive(Debug, Subcommand)]
pub enum SubCommands {
    Init(InitCommand),
    #[command(alias = "up")]
    Run(RunCommand),
    Sync(SyncCommand),
    #[command(alias = "leaderboard")]
    Report(ReportCommand),
    Player(PlayerCommand),
}

#[derive(Debug, Parser)]
pub struct RootArgs {
    /// Directory for config and cache
    #[arg(long, value_name = "PATH", default_value_t = defaults::default_home_dir())]
    #[arg(env = "WORBOO_HOME", hide_env_values = true)]
    pub home: Utf8PathBuf,

    #[arg(long, value_name = "FORMAT", default_value_t, value_enum)]
    pub output_format: Format,
}

impl RootArgs {
    pub const fn output(&self) -> Output {
        Output::new(self.output_format)
    }

    /// Loads `config.toml`, applies environment overrides and validates.
    pub fn load_config(&self) -> EyreResult<ConfigFile> {
        if !ConfigFile::exists(&self.home) {
            bail!(
                "Indexer is not initialized in {:?}, run `worbood init` first",
                self.home
            );
        }

        let mut config = ConfigFile::load(&self.home)?;

        config.apply_env_overrides();
        config
            .validate()
            .wrap_err("invalid indexer configuration")?;

        Ok(config)
    }

    pub fn open_cache(&self, config: &ConfigFile) -> EyreResult<SyncCache> {
        let store = StoreConfig::new(config.cache.resolve(&self.home))
            .with_initial_position(config.ledger.initial_position());

        SyncCache::open(&store)
            .wrap_err_with(|| format!("failed to open sync cache at {:?}", store.path))
    }

    pub fn orchestrator(&self, config: &ConfigFile) -> EyreResult<SyncOrchestrator<EvmSource>> {
        let source = EvmSource::new(&EvmSourceConfig {
            rpc_url: config.ledger.rpc_url.clone(),
            registry: config.ledger.registry.clone(),
            timeout: config.ledger.timeout,
        })?;

        Ok(SyncOrchestrator::new(source, self.open_cache(config)?))
    }
}

impl RootCommand {
    pub async fn run(self) -> EyreResult<()> {
        match self.action {
            SubCommands::Init(init) => init.run(&self.args),
            SubCommands::Run(run) => run.run(&self.args).await,
            SubCommands::Sync(sync) => sync.run(&self.args).await,
            SubCommands::Report(report) => report.run(&self.args).await,
            SubCommands::Player(player) => player.run(&self.args),
        }
    }
}
