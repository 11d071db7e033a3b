use core::net::SocketAddr;
use core::time::Duration;
use std::fs::create_dir_all;

use camino::Utf8PathBuf;
use clap::Parser;
use eyre::{bail, Result as EyreResult, WrapErr};
use tracing::{info, warn};
use url::Url;
use worboo_config::{
    CacheConfig, ConfigFile, LedgerConfig, ServerConfig, DEFAULT_BATCH_SIZE, DEFAULT_CACHE_FILE,
    DEFAULT_LISTEN, DEFAULT_SYNC_INTERVAL_MS,
};

use crate::cli::RootArgs;

/// Initialize the indexer home directory
#[derive(Debug, Parser)]
pub struct InitCommand {
    /// JSON-RPC endpoint of the ledger
    #[arg(long, value_name = "URL")]
    pub rpc_url: Url,

    /// Address of the registry contract emitting `GameRecorded`
    #[arg(long, value_name = "ADDRESS")]
    pub registry: String,

    /// First block to index
    #[arg(long, value_name = "BLOCK", default_value_t = 0)]
    pub from_block: u64,

    /// Cache file, relative to the home directory unless absolute
    #[arg(long, value_name = "PATH", default_value = DEFAULT_CACHE_FILE)]
    pub cache: Utf8PathBuf,

    /// Address the HTTP API listens on
    #[arg(long, value_name = "ADDR", default_value_t = DEFAULT_LISTEN)]
    pub listen: SocketAddr,

    /// Maximum number of blocks fetched per request
    #[arg(long, value_name = "BLOCKS", default_value_t = DEFAULT_BATCH_SIZE)]
    pub batch_size: u64,

    /// Delay between periodic syncs, in milliseconds
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_SYNC_INTERVAL_MS)]
    pub interval_ms: u64,

    /// Overwrite an existing configuration
    #[arg(long)]
    pub force: bool,
}

impl InitCommand {
    pub fn run(self, root_args: &RootArgs) -> EyreResult<()> {
        let home = &root_args.home;

        if ConfigFile::exists(home) {
            if !self.force {
                bail!("Indexer is already initialized in {:?}, pass --force to overwrite", home);
            }
            warn!(%home, "Overwriting existing configuration");
        }

        let mut config = ConfigFile::new(LedgerConfig::new(
            self.rpc_url,
            self.registry,
            self.from_block,
        ));

        config.cache = CacheConfig::new(self.cache);
        config.server = ServerConfig::new(self.listen);
        config.sync.batch_size = self.batch_size;
        config.sync.interval = Duration::from_millis(self.interval_ms);

        config
            .validate()
            .wrap_err("refusing to write an invalid configuration")?;

        create_dir_all(home).wrap_err_with(|| format!("failed to create {home:?}"))?;

        config.save(home)?;

        info!(%home, registry = %config.ledger.registry, "Initialized indexer");

        Ok(())
    }
}
