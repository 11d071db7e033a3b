//! In-memory ledger for driving the sync pipeline in tests.

use std::collections::BTreeMap;

use alloy::primitives::{Address, B256};
use alloy_sol_types::SolEvent;
use async_trait::async_trait;
use parking_lot::Mutex;

use crate::decode::GameRecorded;
use crate::source::{ErrorOperation, EventSource, LedgerError, RawEvent};

#[derive(Debug, Default)]
struct MemoryState {
    head: u64,
    events: Vec<RawEvent>,
    blocks: BTreeMap<u64, u64>,
    fail_head: bool,
    fail_at: Option<u64>,
    fetched: Vec<(u64, u64)>,
}

#[derive(Debug, Default)]
pub struct MemorySource {
    state: Mutex<MemoryState>,
}

/// Builds a `GameRecorded` event with the given counters.
#[must_use]
pub fn game(player: Address, day_id: u64, streak: u64, wins: u64, games: u64) -> GameRecorded {
    GameRecorded {
        player,
        dayId: day_id,
        wordHash: B256::ZERO,
        guesses: 4,
        victory: streak > 0,
        streak,
        totalGames: games,
        totalWins: wins,
    }
}

impl MemorySource {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends `event` at `position`, raising the head if needed.
    pub fn push_game(&self, position: u64, event: &GameRecorded) {
        let mut state = self.state.lock();

        let log_index = state
            .events
            .iter()
            .filter(|raw| raw.position == position)
            .count();

        state.events.push(RawEvent {
            position,
            log_index: u64::try_from(log_index).ok(),
            transaction_hash: None,
            block_timestamp: None,
            data: event.encode_log_data(),
        });

        state.head = state.head.max(position);
    }

    pub fn push_raw(&self, event: RawEvent) {
        let mut state = self.state.lock();

        state.head = state.head.max(event.position);
        state.events.push(event);
    }

    pub fn set_head(&self, head: u64) {
        self.state.lock().head = head;
    }

    pub fn set_block_timestamp(&self, position: u64, timestamp: u64) {
        let _ignored = self.state.lock().blocks.insert(position, timestamp);
    }

    /// Makes every `events` call whose range covers `position` fail.
    pub fn fail_events_at(&self, position: u64) {
        self.state.lock().fail_at = Some(position);
    }

    pub fn fail_head(&self, fail: bool) {
        self.state.lock().fail_head = fail;
    }

    pub fn clear_failures(&self) {
        let mut state = self.state.lock();
        state.fail_at = None;
        state.fail_head = false;
    }

    /// Every `[from, to]` range requested so far, failed ones included.
    #[must_use]
    pub fn fetched_ranges(&self) -> Vec<(u64, u64)> {
        self.state.lock().fetched.clone()
    }
}

#[async_trait]
impl EventSource for MemorySource {
    async fn head_position(&self) -> Result<u64, LedgerError> {
        let state = self.state.lock();

        if state.fail_head {
            return Err(LedgerError::Custom {
                operation: ErrorOperation::Head,
                reason: "injected failure".to_owned(),
            });
        }

        Ok(state.head)
    }

    async fn events(&self, from: u64, to: u64) -> Result<Vec<RawEvent>, LedgerError> {
        let mut state = self.state.lock();

        state.fetched.push((from, to));

        if state.fail_at.is_some_and(|at| from <= at && at <= to) {
            return Err(LedgerError::Custom {
                operation: ErrorOperation::Events { from, to },
                reason: "injected failure".to_owned(),
            });
        }

        let mut events: Vec<RawEvent> = state
            .events
            .iter()
            .filter(|event| from <= event.position && event.position <= to)
            .cloned()
            .collect();

        events.sort_by_key(|event| (event.position, event.log_index));

        Ok(events)
    }

    async fn block_timestamp(&self, position: u64) -> Result<Option<u64>, LedgerError> {
        Ok(self.state.lock().blocks.get(&position).copied())
    }
}
