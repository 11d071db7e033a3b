//! Durable cache of every decoded record plus the sync cursor.
//!
//! The cache is a single JSON document written atomically: a temporary
//! file in the same directory is fully written, synced and then renamed
//! over the previous version.

use std::collections::HashSet;
use std::fs;
use std::io::{self, BufWriter, ErrorKind, Write};

use camino::{Utf8Path, Utf8PathBuf};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tracing::{debug, info, warn};
use worboo_primitives::record::{EventKey, GameRecord};

pub mod config;

pub use config::StoreConfig;


/// Suffix appended to a cache file that could not be parsed.
pub const CORRUPT_SUFFIX: &str = "corrupt";

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StoreError {
    #[error("failed to read cache at {path}")]
    Read {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to write cache at {path}")]
    Write {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to quarantine unreadable cache at {path}")]
    Quarantine {
        path: Utf8PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to encode cache")]
    Encode(#[from] serde_json::Error),
    #[error("cursor cannot move backwards from {current} to {requested}")]
    CursorRegression { current: u64, requested: u64 },
}

/// On-disk layout of the cache.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheState {
    #[serde(alias = "lastSyncedBlock")]
    pub last_synced_position: u64,
    #[serde(default)]
    pub records: Vec<GameRecord>,
}

/// Result of a successful [`SyncCache::commit_batch`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Commit {
    /// Records that were not already present, in batch order.
    pub appended: Vec<GameRecord>,
    /// Records dropped because their event was already cached.
    pub duplicates: usize,
}

#[derive(Debug)]
pub struct SyncCache {
    path: Utf8PathBuf,
    state: CacheState,
    seen: HashSet<EventKey>,
}

impl SyncCache {
    /// Loads the cache at `config.path`.
    ///
    /// A missing file yields an empty cache positioned at
    /// `config.initial_position`. A file that cannot be parsed is renamed
    /// to `<path>.corrupt` and treated as missing.
    pub fn open(config: &StoreConfig) -> Result<Self, StoreError> {
        let path = config.path.clone();
        let fresh = CacheState {
            last_synced_position: config.initial_position,
            records: Vec::new(),
        };

        let state = match fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<CacheState>(&content) {
                Ok(state) => {
                    info!(
                        %path,
                        records = state.records.len(),
                        last_synced_position = state.last_synced_position,
                        "Loaded sync cache"
                    );
                    state
                }
                Err(err) => {
                    let quarantined = quarantine(&path)?;
                    warn!(
                        %path,
                        %quarantined,
                        %err,
                        "Sync cache is unreadable, starting from scratch"
                    );
                    fresh
                }
            },
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(%path, "No sync cache found, starting from scratch");
                fresh
            }
            Err(source) => return Err(StoreError::Read { path, source }),
        };

        let seen = state.records.iter().filter_map(GameRecord::event_key).collect();

        Ok(Self { path, state, seen })
    }

    #[must_use]
    pub fn path(&self) -> &Utf8Path {
        &self.path
    }

    #[must_use]
    pub const fn last_synced_position(&self) -> u64 {
        self.state.last_synced_position
    }

    #[must_use]
    pub fn records(&self) -> &[GameRecord] {
        &self.state.records
    }

    #[must_use]
    pub const fn state(&self) -> &CacheState {
        &self.state
    }

    /// Appends `records` and advances the cursor to `upper`, then persists.
    ///
    /// Records whose event is already cached are skipped. If persisting
    /// fails nothing changes, in memory or on disk.
    pub fn commit_batch(
        &mut self,
        records: Vec<GameRecord>,
        upper: u64,
    ) -> Result<Commit, StoreError> {
        let current = self.state.last_synced_position;

        if upper < current {
            return Err(StoreError::CursorRegression {
                current,
                requested: upper,
            });
        }

        let previous_len = self.state.records.len();
        let mut inserted = Vec::new();
        let mut duplicates: usize = 0;

        for record in records {
            if let Some(key) = record.event_key() {
                if !self.seen.insert(key) {
                    debug!(
                        position = key.position,
                        log_index = key.log_index,
                        "Skipping already cached event"
                    );
                    duplicates = duplicates.saturating_add(1);
                    continue;
                }
                inserted.push(key);
            }

            self.state.records.push(record);
        }

        self.state.last_synced_position = upper;

        if let Err(err) = self.persist() {
            self.state.records.truncate(previous_len);
            self.state.last_synced_position = current;
            for key in &inserted {
                let _ignored = self.seen.remove(key);
            }
            return Err(err);
        }

        Ok(Commit {
            appended: self.state.records[previous_len..].to_vec(),
            duplicates,
        })
    }

    /// Writes the current state to disk atomically.
    pub fn persist(&self) -> Result<(), StoreError> {
        let write_err = |source| StoreError::Write {
            path: self.path.clone(),
            source,
        };

        let dir = match self.path.parent() {
            Some(dir) if !dir.as_str().is_empty() => dir,
            _ => Utf8Path::new("."),
        };

        fs::create_dir_all(dir).map_err(write_err)?;

        let mut file = NamedTempFile::new_in(dir).map_err(write_err)?;

        {
            let mut writer = BufWriter::new(&mut file);
            serde_json::to_writer_pretty(&mut writer, &self.state)?;
            writer.flush().map_err(write_err)?;
        }

        file.as_file().sync_all().map_err(write_err)?;
        let _file = file.persist(&self.path).map_err(|err| write_err(err.error))?;

        debug!(
            path = %self.path,
            records = self.state.records.len(),
            last_synced_position = self.state.last_synced_position,
            "Persisted sync cache"
        );

        Ok(())
    }
}

fn quarantine(path: &Utf8Path) -> Result<Utf8PathBuf, StoreError> {
    let target = Utf8PathBuf::from(format!("{path}.{CORRUPT_SUFFIX}"));

    fs::rename(path, &target).map_err(|source| StoreError::Quarantine {
        path: path.to_owned(),
        source,
    })?;

    Ok(target)
}
