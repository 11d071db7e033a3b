use core::future::{Future, IntoFuture};
use core::time::Duration;

use alloy::eips::BlockNumberOrTag;
use alloy::network::Ethereum as EthereumNetwork;
use alloy::primitives::Address;
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::Filter;
use alloy::transports::TransportResult;
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use tokio::time::timeout;
use tracing::debug;
use url::Url;

use crate::decode::GameRecorded;
use crate::source::{ErrorOperation, EventSource, LedgerError, RawEvent};

/// Default bound on a single JSON-RPC request.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone, Debug)]
pub struct EvmSourceConfig {
    pub rpc_url: Url,
    pub registry: String,
    pub timeout: Duration,
}

/// [`EventSource`] backed by an EVM JSON-RPC endpoint, reading
/// `GameRecorded` logs emitted by the registry contract.
#[derive(Clone, Debug)]
pub struct EvmSource {
    provider: DynProvider<EthereumNetwork>,
    registry: Address,
    timeout: Duration,
}

impl EvmSource {
    pub fn new(config: &EvmSourceConfig) -> Result<Self, LedgerError> {
        let registry = config
            .registry
            .parse::<Address>()
            .map_err(|_| LedgerError::InvalidRegistry(config.registry.clone()))?;

        if registry == Address::ZERO {
            return Err(LedgerError::InvalidRegistry(config.registry.clone()));
        }

        let provider = ProviderBuilder::new()
            .connect_http(config.rpc_url.clone())
            .erased();

        Ok(Self {
            provider,
            registry,
            timeout: config.timeout,
        })
    }

    #[must_use]
    pub const fn registry(&self) -> Address {
        self.registry
    }

    async fn bounded<T>(
        &self,
        operation: ErrorOperation,
        request: impl Future<Output = TransportResult<T>> + Send,
    ) -> Result<T, LedgerError> {
        timeout(self.timeout, request)
            .await
            .map_err(|_| LedgerError::Timeout {
                operation,
                timeout: self.timeout,
            })?
            .map_err(|err| LedgerError::Custom {
                operation,
                reason: err.to_string(),
            })
    }
}

#[async_trait]
impl EventSource for EvmSource {
    async fn head_position(&self) -> Result<u64, LedgerError> {
        self.bounded(ErrorOperation::Head, self.provider.get_block_number())
            .await
    }

    async fn events(&self, from: u64, to: u64) -> Result<Vec<RawEvent>, LedgerError> {
        let operation = ErrorOperation::Events { from, to };

        let filter = Filter::new()
            .address(self.registry)
            .event_signature(GameRecorded::SIGNATURE_HASH)
            .from_block(from)
            .to_block(to);

        let logs = self
            .bounded(operation, self.provider.get_logs(&filter))
            .await?;

        debug!(from, to, logs = logs.len(), "Fetched registry logs");

        let mut events = Vec::with_capacity(logs.len());

        for log in logs {
            if log.removed {
                continue;
            }

            let Some(position) = log.block_number else {
                return Err(LedgerError::InvalidResponse {
                    operation,
                    reason: "log without block number".to_owned(),
                });
            };

            events.push(RawEvent {
                position,
                log_index: log.log_index,
                transaction_hash: log.transaction_hash,
                block_timestamp: log
                    .block_timestamp
                    .map(|secs| secs.saturating_mul(1_000)),
                data: log.inner.data,
            });
        }

        events.sort_by_key(|event| (event.position, event.log_index));

        Ok(events)
    }

    async fn block_timestamp(&self, position: u64) -> Result<Option<u64>, LedgerError> {
        let block = self
            .bounded(
                ErrorOperation::Block(position),
                self.provider
                    .get_block_by_number(BlockNumberOrTag::Number(position))
                    .into_future(),
            )
            .await?;

        Ok(block.map(|block| block.header.timestamp.saturating_mul(1_000)))
    }
}
