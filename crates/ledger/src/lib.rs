//! Access to the external ledger: fetching `GameRecorded` events by block
//! range and decoding them into [`GameRecord`](worboo_primitives::record::GameRecord)s.

pub mod decode;
pub mod evm;
#[cfg(any(test, feature = "testing"))]
pub mod mock;
pub mod source;

pub use decode::{DecodeError, GameRecorded, RecordDecoder};
pub use evm::{EvmSource, EvmSourceConfig};
pub use source::{ErrorOperation, EventSource, LedgerError, RawEvent};
