use core::net::{IpAddr, Ipv4Addr, SocketAddr};
use core::time::Duration;
use std::env;
use std::fs::{read_to_string, write};

use camino::{Utf8Path, Utf8PathBuf};
use eyre::{Result as EyreResult, WrapErr};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;
use url::Url;


pub const CONFIG_FILE: &str = "config.toml";
pub const DEFAULT_CACHE_FILE: &str = "leaderboard-cache.json";

pub const DEFAULT_BATCH_SIZE: u64 = 2_000;
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 15_000;
pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_LISTEN: SocketAddr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 4000);
pub const DEFAULT_LEADERBOARD_LIMIT: usize = 10;
pub const DEFAULT_REPORT_LIMIT: usize = 20;

pub const ENV_RPC_URL: &str = "WORBOO_INDEXER_RPC_URL";
pub const ENV_REGISTRY: &str = "WORBOO_INDEXER_REGISTRY";
pub const ENV_FROM_BLOCK: &str = "WORBOO_INDEXER_FROM_BLOCK";
pub const ENV_CACHE: &str = "WORBOO_INDEXER_CACHE";
pub const ENV_LISTEN: &str = "WORBOO_INDEXER_LISTEN";

#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[non_exhaustive]
pub enum ConfigError {
    #[error("registry address `{0}` is not a 20-byte hex address")]
    InvalidRegistry(String),
    #[error("registry address must not be the zero address")]
    ZeroRegistry,
    #[error("rpc url `{0}` must use http or https")]
    UnsupportedRpcScheme(Url),
    #[error("sync batch size must be greater than zero")]
    ZeroBatchSize,
    #[error("sync interval must be greater than zero")]
    ZeroSyncInterval,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct ConfigFile {
    pub ledger: LedgerConfig,
    #[serde(default)]
    pub sync: SyncConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub leaderboard: LeaderboardConfig,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct LedgerConfig {
    pub rpc_url: Url,
    pub registry: String,
    /// First block that may contain registry events.
    #[serde(default)]
    pub from_block: u64,
    #[serde(
        rename = "timeout_ms",
        with = "serde_duration",
        default = "default_request_timeout"
    )]
    pub timeout: Duration,
}

impl LedgerConfig {
    #[must_use]
    pub const fn new(rpc_url: Url, registry: String, from_block: u64) -> Self {
        Self {
            rpc_url,
            registry,
            from_block,
            timeout: Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS),
        }
    }

    /// Cursor for an empty cache: the block before `from_block`, clamped at
    /// 0. The first fetched block is therefore never below 1; the genesis
    /// block carries no contract logs.
    #[must_use]
    pub const fn initial_position(&self) -> u64 {
        self.from_block.saturating_sub(1)
    }
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct SyncConfig {
    pub batch_size: u64,
    #[serde(rename = "interval_ms", with = "serde_duration")]
    pub interval: Duration,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            batch_size: DEFAULT_BATCH_SIZE,
            interval: Duration::from_millis(DEFAULT_SYNC_INTERVAL_MS),
        }
    }
}

#[derive(Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct CacheConfig {
    /// Relative paths are resolved against the home directory.
    pub path: Utf8PathBuf,
}

impl CacheConfig {
    #[must_use]
    pub const fn new(path: Utf8PathBuf) -> Self {
        Self { path }
    }

    #[must_use]
    pub fn resolve(&self, home: &Utf8Path) -> Utf8PathBuf {
        if self.path.is_absolute() {
            self.path.clone()
        } else {
            home.join(&self.path)
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new(DEFAULT_CACHE_FILE.into())
    }
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
#[non_exhaustive]
pub struct ServerConfig {
    pub listen: SocketAddr,
}

impl ServerConfig {
    #[must_use]
    pub const fn new(listen: SocketAddr) -> Self {
        Self { listen }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_LISTEN)
    }
}

#[derive(Copy, Clone, Debug, Deserialize, Serialize)]
#[serde(default)]
pub struct LeaderboardConfig {
    /// Entries returned by the HTTP leaderboard when no limit is given.
    pub default_limit: usize,
    /// Entries included in a generated report when no limit is given.
    pub report_limit: usize,
}

impl Default for LeaderboardConfig {
    fn default() -> Self {
        Self {
            default_limit: DEFAULT_LEADERBOARD_LIMIT,
            report_limit: DEFAULT_REPORT_LIMIT,
        }
    }
}

impl ConfigFile {
    #[must_use]
    pub fn new(ledger: LedgerConfig) -> Self {
        Self {
            ledger,
            sync: SyncConfig::default(),
            cache: CacheConfig::default(),
            server: ServerConfig::default(),
            leaderboard: LeaderboardConfig::default(),
        }
    }

    #[must_use]
    pub fn exists(dir: &Utf8Path) -> bool {
        dir.join(CONFIG_FILE).is_file()
    }

    pub fn load(dir: &Utf8Path) -> EyreResult<Self> {
        let path = dir.join(CONFIG_FILE);
        let content = read_to_string(&path)
            .wrap_err_with(|| format!("failed to read configuration from {path:?}"))?;

        toml::from_str(&content)
            .wrap_err_with(|| format!("failed to parse configuration at {path:?}"))
    }

    pub fn save(&self, dir: &Utf8Path) -> EyreResult<()> {
        let path = dir.join(CONFIG_FILE);
        let content = toml::to_string_pretty(self)?;

        write(&path, content)
            .wrap_err_with(|| format!("failed to write configuration to {path:?}"))?;

        Ok(())
    }

    /// Applies the `WORBOO_INDEXER_*` overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(key).ok());
    }

    /// Applies overrides read through `lookup`. Values that fail to parse
    /// are ignored with a warning.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(value) = lookup(ENV_RPC_URL) {
            match value.parse::<Url>() {
                Ok(url) => self.ledger.rpc_url = url,
                Err(err) => warn!(key = ENV_RPC_URL, %value, %err, "Ignoring invalid override"),
            }
        }

        if let Some(value) = lookup(ENV_REGISTRY) {
            match check_registry(&value) {
                Ok(()) => self.ledger.registry = value,
                Err(err) => warn!(key = ENV_REGISTRY, %value, %err, "Ignoring invalid override"),
            }
        }

        if let Some(value) = lookup(ENV_FROM_BLOCK) {
            match value.trim().parse::<u64>() {
                Ok(block) => self.ledger.from_block = block,
                Err(err) => warn!(key = ENV_FROM_BLOCK, %value, %err, "Ignoring invalid override"),
            }
        }

        if let Some(value) = lookup(ENV_CACHE) {
            if value.trim().is_empty() {
                warn!(key = ENV_CACHE, "Ignoring empty override");
            } else {
                self.cache.path = value.into();
            }
        }

        if let Some(value) = lookup(ENV_LISTEN) {
            match value.parse::<SocketAddr>() {
                Ok(listen) => self.server.listen = listen,
                Err(err) => warn!(key = ENV_LISTEN, %value, %err, "Ignoring invalid override"),
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_registry(&self.ledger.registry)?;

        if !matches!(self.ledger.rpc_url.scheme(), "http" | "https") {
            return Err(ConfigError::UnsupportedRpcScheme(self.ledger.rpc_url.clone()));
        }

        if self.sync.batch_size == 0 {
            return Err(ConfigError::ZeroBatchSize);
        }

        if self.sync.interval.is_zero() {
            return Err(ConfigError::ZeroSyncInterval);
        }

        Ok(())
    }
}

/// Checks that `registry` is a `0x`-prefixed, non-zero 20-byte hex address.
pub fn check_registry(registry: &str) -> Result<(), ConfigError> {
    let digits = registry
        .strip_prefix("0x")
        .or_else(|| registry.strip_prefix("0X"))
        .filter(|digits| digits.len() == 40 && digits.bytes().all(|b| b.is_ascii_hexdigit()))
        .ok_or_else(|| ConfigError::InvalidRegistry(registry.to_owned()))?;

    if digits.bytes().all(|b| b == b'0') {
        return Err(ConfigError::ZeroRegistry);
    }

    Ok(())
}

const fn default_request_timeout() -> Duration {
    Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS)
}

mod serde_duration {
    use core::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(u64::try_from(duration.as_millis()).unwrap_or(u64::MAX))
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
