use std::collections::BTreeMap;

use alloy_sol_types::{sol, SolEvent};
use thiserror::Error;
use tracing::warn;
use worboo_primitives::address::PlayerAddress;
use worboo_primitives::record::{GameRecord, RecordError, TimestampSource};

use crate::source::{EventSource, RawEvent};

sol! {
    #[derive(Debug, PartialEq, Eq)]
    event GameRecorded(
        address indexed player,
        uint64 indexed dayId,
        bytes32 wordHash,
        uint8 guesses,
        bool victory,
        uint64 streak,
        uint64 totalGames,
        uint64 totalWins
    );
}

/// Source of the fallback timestamp, in unix milliseconds.
pub type Clock = fn() -> u64;

#[must_use]
pub fn system_clock() -> u64 {
    u64::try_from(chrono::Utc::now().timestamp_millis()).unwrap_or_default()
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum DecodeError {
    #[error("malformed event payload at position {position}: {reason}")]
    Malformed { position: u64, reason: String },
    #[error("record at position {position} is inconsistent: {source}")]
    InvalidRecord {
        position: u64,
        #[source]
        source: RecordError,
    },
}

/// Turns [`RawEvent`]s into [`GameRecord`]s, resolving block timestamps
/// through the event source.
#[derive(Debug)]
pub struct RecordDecoder<'a, S: ?Sized> {
    source: &'a S,
    clock: Clock,
}

impl<'a, S: EventSource + ?Sized> RecordDecoder<'a, S> {
    pub fn new(source: &'a S) -> Self {
        Self {
            source,
            clock: system_clock,
        }
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Decodes a whole batch; the first malformed event fails the batch.
    ///
    /// Timestamps are resolved once per block.
    pub async fn decode_batch(&self, events: &[RawEvent]) -> Result<Vec<GameRecord>, DecodeError> {
        let mut timestamps = BTreeMap::new();
        let mut records = Vec::with_capacity(events.len());

        for event in events {
            let decoded = decode_payload(event)?;

            let timestamp = match timestamps.get(&event.position) {
                Some(&timestamp) => timestamp,
                None => {
                    let timestamp = self.resolve_timestamp(event).await;
                    let _ignored = timestamps.insert(event.position, timestamp);
                    timestamp
                }
            };

            records.push(build_record(event, &decoded, timestamp)?);
        }

        Ok(records)
    }

    pub async fn decode(&self, event: &RawEvent) -> Result<GameRecord, DecodeError> {
        let decoded = decode_payload(event)?;
        let timestamp = self.resolve_timestamp(event).await;

        build_record(event, &decoded, timestamp)
    }

    async fn resolve_timestamp(&self, event: &RawEvent) -> (u64, TimestampSource) {
        if let Some(timestamp) = event.block_timestamp {
            return (timestamp, TimestampSource::Ledger);
        }

        match self.source.block_timestamp(event.position).await {
            Ok(Some(timestamp)) => (timestamp, TimestampSource::Ledger),
            Ok(None) => {
                warn!(
                    position = event.position,
                    "Block not found, using local clock for record timestamp"
                );
                ((self.clock)(), TimestampSource::LocalClock)
            }
            Err(err) => {
                warn!(
                    position = event.position,
                    %err,
                    "Failed to resolve block, using local clock for record timestamp"
                );
                ((self.clock)(), TimestampSource::LocalClock)
            }
        }
    }
}

fn decode_payload(event: &RawEvent) -> Result<GameRecorded, DecodeError> {
    GameRecorded::decode_log_data(&event.data).map_err(|err| DecodeError::Malformed {
        position: event.position,
        reason: err.to_string(),
    })
}

fn build_record(
    event: &RawEvent,
    decoded: &GameRecorded,
    (timestamp, timestamp_source): (u64, TimestampSource),
) -> Result<GameRecord, DecodeError> {
    let record = GameRecord {
        player: PlayerAddress::new(decoded.player.to_string()),
        day_id: decoded.dayId,
        victory: decoded.victory,
        streak: decoded.streak,
        total_games: decoded.totalGames,
        total_wins: decoded.totalWins,
        position: event.position,
        log_index: event.log_index,
        transaction_hash: event.transaction_hash.map(|hash| hash.to_string()),
        timestamp,
        timestamp_source,
    };

    record
        .validate()
        .map_err(|source| DecodeError::InvalidRecord {
            position: event.position,
            source,
        })?;

    Ok(record)
}
