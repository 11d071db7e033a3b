use core::time::Duration;
use std::sync::Arc;

use alloy::primitives::{LogData, B256};
use async_trait::async_trait;
use thiserror::Error;

/// A `GameRecorded` log as returned by the ledger, not yet decoded.
#[derive(Clone, Debug)]
pub struct RawEvent {
    /// Block height of the block containing the event.
    pub position: u64,
    pub log_index: Option<u64>,
    pub transaction_hash: Option<B256>,
    /// Block timestamp in unix milliseconds, when the source includes it.
    pub block_timestamp: Option<u64>,
    pub data: LogData,
}

/// Read-only query capability over the external ledger.
///
/// Implementations hold no sync state; the same range may be requested any
/// number of times.
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Current head position of the ledger.
    async fn head_position(&self) -> Result<u64, LedgerError>;

    /// Events with `from <= position <= to`, ordered by position then log index.
    async fn events(&self, from: u64, to: u64) -> Result<Vec<RawEvent>, LedgerError>;

    /// Timestamp of the block at `position` in unix milliseconds, or `None`
    /// if the ledger does not know that block.
    async fn block_timestamp(&self, position: u64) -> Result<Option<u64>, LedgerError>;
}

#[async_trait]
impl<S: EventSource + ?Sized> EventSource for Arc<S> {
    async fn head_position(&self) -> Result<u64, LedgerError> {
        (**self).head_position().await
    }

    async fn events(&self, from: u64, to: u64) -> Result<Vec<RawEvent>, LedgerError> {
        (**self).events(from, to).await
    }

    async fn block_timestamp(&self, position: u64) -> Result<Option<u64>, LedgerError> {
        (**self).block_timestamp(position).await
    }
}

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LedgerError {
    #[error("invalid registry address `{0}`")]
    InvalidRegistry(String),
    #[error("timed out after {timeout:?} while {operation}")]
    Timeout {
        operation: ErrorOperation,
        timeout: Duration,
    },
    #[error("invalid response from RPC while {operation}: {reason}")]
    InvalidResponse {
        operation: ErrorOperation,
        reason: String,
    },
    #[error("error while {operation}: {reason}")]
    Custom {
        operation: ErrorOperation,
        reason: String,
    },
}

impl LedgerError {
    /// Whether retrying the same request later may succeed.
    #[must_use]
    pub const fn is_transient(&self) -> bool {
        !matches!(self, Self::InvalidRegistry(_))
    }
}

#[derive(Copy, Clone, Debug, Error)]
#[non_exhaustive]
pub enum ErrorOperation {
    #[error("fetching head position")]
    Head,
    #[error("fetching events in [{from}, {to}]")]
    Events { from: u64, to: u64 },
    #[error("fetching block {0}")]
    Block(u64),
}
