use core::time::Duration;
use std::fs;
use std::sync::Arc;

use alloy::primitives::{address, Address, Bytes, LogData};
use alloy_sol_types::SolEvent;
use camino::Utf8PathBuf;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use worboo_ledger::mock::{game, MemorySource};
use worboo_ledger::{GameRecorded, RawEvent};
use worboo_store::{StoreConfig, SyncCache};

use super::*;

const ALICE: Address = address!("00000000000000000000000000000000000a11ce");
const BOB: Address = address!("0000000000000000000000000000000000000b0b");

const ALICE_KEY: &str = "0x00000000000000000000000000000000000a11ce";
const BOB_KEY: &str = "0x0000000000000000000000000000000000000b0b";

fn fixed_clock() -> u64 {
    7
}

struct Fixture {
    dir: TempDir,
    source: Arc<MemorySource>,
}

impl Fixture {
    fn new() -> Self {
        Self {
            dir: tempfile::tempdir().unwrap(),
            source: Arc::new(MemorySource::new()),
        }
    }

    fn path(&self) -> Utf8PathBuf {
        Utf8PathBuf::from_path_buf(self.dir.path().join("cache.json")).unwrap()
    }

    fn orchestrator(&self, initial_position: u64) -> SyncOrchestrator<Arc<MemorySource>> {
        let config = StoreConfig::new(self.path()).with_initial_position(initial_position);
        let cache = SyncCache::open(&config).unwrap();

        SyncOrchestrator::new(Arc::clone(&self.source), cache).with_clock(fixed_clock)
    }
}

// ---------------------------------------------------------------------------
// Batching
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_noop_when_head_not_ahead() {
    let fixture = Fixture::new();
    fixture.source.set_head(10);

    let mut orchestrator = fixture.orchestrator(10);
    let report = orchestrator.sync(100).await.unwrap();

    assert!(report.is_noop());
    assert_eq!(report.last_synced_position, 10);
    assert!(fixture.source.fetched_ranges().is_empty());
    assert!(!fixture.path().exists(), "a no-op sync must not persist");
}

#[tokio::test]
async fn test_batches_cover_range_up_to_head() {
    let fixture = Fixture::new();
    fixture.source.push_game(3, &game(ALICE, 1, 1, 1, 1));
    fixture.source.push_game(9, &game(ALICE, 2, 2, 2, 2));
    fixture.source.set_head(25);

    let mut orchestrator = fixture.orchestrator(0);
    let report = orchestrator.sync(10).await.unwrap();

    assert_eq!(
        fixture.source.fetched_ranges(),
        [(1, 10), (11, 20), (21, 25)]
    );
    assert_eq!(report.batches, 3);
    assert_eq!(report.head, 25);
    assert_eq!(report.last_synced_position, 25);
    assert_eq!(report.appended, 2);
    assert_eq!(report.inserted, 1);
    assert_eq!(report.replaced, 1);

    let leaderboard = orchestrator.leaderboard();
    assert_eq!(leaderboard.last_synced_position(), 25);

    let alice = leaderboard.player(ALICE_KEY).unwrap();
    assert_eq!(alice.total_games, 2);
    assert_eq!(alice.current_streak, 2);
}

#[tokio::test]
async fn test_starts_after_initial_position() {
    let fixture = Fixture::new();
    fixture.source.push_game(4, &game(ALICE, 1, 1, 1, 1));
    fixture.source.push_game(6, &game(BOB, 1, 1, 1, 1));

    let mut orchestrator = fixture.orchestrator(4);
    let _report = orchestrator.sync(100).await.unwrap();

    assert_eq!(fixture.source.fetched_ranges(), [(5, 6)]);
    assert!(orchestrator.leaderboard().player(ALICE_KEY).is_none());
    assert!(orchestrator.leaderboard().player(BOB_KEY).is_some());
}

#[tokio::test]
async fn test_zero_batch_size_rejected() {
    let fixture = Fixture::new();
    fixture.source.set_head(5);

    let mut orchestrator = fixture.orchestrator(0);
    let err = orchestrator.sync(0).await.unwrap_err();

    assert!(matches!(err, SyncError::InvalidBatchSize));
    assert!(fixture.source.fetched_ranges().is_empty());
}

#[tokio::test]
async fn test_cursor_never_exceeds_observed_head() {
    let fixture = Fixture::new();
    fixture.source.set_head(7);

    let mut orchestrator = fixture.orchestrator(0);
    let report = orchestrator.sync(1_000).await.unwrap();

    assert_eq!(report.last_synced_position, 7);
    assert_eq!(fixture.source.fetched_ranges(), [(1, 7)]);

    fixture.source.set_head(9);
    let report = orchestrator.sync(1_000).await.unwrap();

    assert_eq!(report.start_position, 7);
    assert_eq!(report.last_synced_position, 9);
}

// ---------------------------------------------------------------------------
// Failures
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_fetch_failure_keeps_last_committed_batch() {
    let fixture = Fixture::new();
    fixture.source.push_game(2, &game(ALICE, 1, 1, 1, 1));
    fixture.source.push_game(12, &game(ALICE, 2, 2, 2, 2));
    fixture.source.set_head(20);
    fixture.source.fail_events_at(12);

    let mut orchestrator = fixture.orchestrator(0);
    let err = orchestrator.sync(10).await.unwrap_err();

    assert!(matches!(err, SyncError::Ledger(_)), "unexpected error: {err:?}");
    assert_eq!(orchestrator.last_synced_position(), 10);
    assert_eq!(orchestrator.leaderboard().last_synced_position(), 10);

    let reopened = SyncCache::open(&StoreConfig::new(fixture.path())).unwrap();
    assert_eq!(reopened.last_synced_position(), 10);
    assert_eq!(reopened.records().len(), 1);

    fixture.source.clear_failures();
    let report = orchestrator.sync(10).await.unwrap();

    assert_eq!(report.start_position, 10);
    assert_eq!(report.last_synced_position, 20);
    assert_eq!(
        fixture.source.fetched_ranges(),
        [(1, 10), (11, 20), (11, 20)]
    );
    assert_eq!(
        orchestrator.leaderboard().player(ALICE_KEY).unwrap().total_games,
        2
    );
}

#[tokio::test]
async fn test_decode_failure_aborts_batch() {
    let fixture = Fixture::new();
    fixture.source.push_game(3, &game(ALICE, 1, 1, 1, 1));
    fixture.source.push_raw(RawEvent {
        position: 4,
        log_index: Some(0),
        transaction_hash: None,
        block_timestamp: None,
        data: LogData::new_unchecked(
            vec![GameRecorded::SIGNATURE_HASH],
            Bytes::from_static(&[0xff]),
        ),
    });

    let mut orchestrator = fixture.orchestrator(0);
    let err = orchestrator.sync(100).await.unwrap_err();

    assert!(matches!(err, SyncError::Decode(_)), "unexpected error: {err:?}");
    assert_eq!(orchestrator.last_synced_position(), 0);
    assert_eq!(orchestrator.leaderboard().player_count(), 0);
    assert!(orchestrator.cache().records().is_empty());
}

#[tokio::test]
async fn test_head_failure_propagates() {
    let fixture = Fixture::new();
    fixture.source.fail_head(true);

    let mut orchestrator = fixture.orchestrator(0);
    let err = orchestrator.sync(10).await.unwrap_err();

    assert!(matches!(err, SyncError::Ledger(_)));
}

#[tokio::test]
async fn test_persist_failure_leaves_leaderboard_untouched() {
    let fixture = Fixture::new();
    let state_dir = Utf8PathBuf::from_path_buf(fixture.dir.path().join("state")).unwrap();
    let path = state_dir.join("cache.json");

    fixture.source.push_game(2, &game(ALICE, 1, 1, 1, 1));

    let cache = SyncCache::open(&StoreConfig::new(path)).unwrap();
    let mut orchestrator =
        SyncOrchestrator::new(Arc::clone(&fixture.source), cache).with_clock(fixed_clock);
    let _report = orchestrator.sync(100).await.unwrap();

    let leaderboard = orchestrator.leaderboard();
    let ranked = leaderboard.rank(None);
    let players = leaderboard.player_count();

    // A regular file where the cache directory should be makes the next
    // persist fail.
    fs::remove_dir_all(&state_dir).unwrap();
    fs::write(&state_dir, b"").unwrap();

    fixture.source.push_game(5, &game(BOB, 1, 1, 1, 1));
    fixture.source.push_game(6, &game(ALICE, 2, 2, 2, 2));

    let err = orchestrator.sync(100).await.unwrap_err();

    assert!(matches!(err, SyncError::Store(_)), "unexpected error: {err:?}");
    assert_eq!(leaderboard.rank(None), ranked);
    assert_eq!(leaderboard.player_count(), players);
    assert_eq!(leaderboard.last_synced_position(), 2);
    assert_eq!(orchestrator.last_synced_position(), 2);
    assert_eq!(orchestrator.cache().records().len(), 1);

    fs::remove_file(&state_dir).unwrap();
    let report = orchestrator.sync(100).await.unwrap();

    assert_eq!(report.start_position, 2);
    assert_eq!(fixture.source.fetched_ranges(), [(1, 2), (3, 6), (3, 6)]);
    assert_eq!(leaderboard.player_count(), 2);
    assert_eq!(leaderboard.last_synced_position(), 6);
}

// ---------------------------------------------------------------------------
// Resume
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_resume_restores_leaderboard_from_cache() {
    let fixture = Fixture::new();
    fixture.source.push_game(2, &game(ALICE, 1, 1, 1, 1));
    fixture.source.push_game(3, &game(BOB, 1, 0, 0, 1));

    {
        let mut orchestrator = fixture.orchestrator(0);
        let _report = orchestrator.sync(100).await.unwrap();
    }

    let orchestrator = fixture.orchestrator(0);
    let leaderboard = orchestrator.leaderboard();

    assert_eq!(leaderboard.last_synced_position(), 3);
    assert_eq!(leaderboard.player_count(), 2);

    let ranked: Vec<_> = leaderboard
        .rank(None)
        .into_iter()
        .map(|entry| entry.player.as_str().to_owned())
        .collect();
    assert_eq!(ranked, [ALICE_KEY, BOB_KEY]);
}

#[tokio::test]
async fn test_refetched_batch_is_tolerated() {
    let fixture = Fixture::new();
    fixture.source.push_game(2, &game(ALICE, 1, 1, 1, 1));
    fixture.source.push_game(5, &game(ALICE, 2, 2, 2, 2));

    let mut orchestrator = fixture.orchestrator(0);
    let _report = orchestrator.sync(100).await.unwrap();
    let before = orchestrator.leaderboard().rank(None);

    // Simulate a crash that lost the cursor advance but kept the records.
    let mut state = orchestrator.cache().state().clone();
    state.last_synced_position = 0;
    fs::write(fixture.path(), serde_json::to_vec(&state).unwrap()).unwrap();

    let mut orchestrator = fixture.orchestrator(0);
    let report = orchestrator.sync(100).await.unwrap();

    assert_eq!(report.events, 2);
    assert_eq!(report.duplicates, 2);
    assert_eq!(report.appended, 0);
    assert_eq!(orchestrator.cache().records().len(), 2);
    assert_eq!(orchestrator.leaderboard().rank(None), before);
}

#[tokio::test]
async fn test_out_of_order_events_do_not_regress_stats() {
    let fixture = Fixture::new();
    fixture.source.push_game(2, &game(ALICE, 2, 2, 2, 2));
    fixture.source.push_game(3, &game(ALICE, 1, 1, 1, 1));

    let mut orchestrator = fixture.orchestrator(0);
    let report = orchestrator.sync(100).await.unwrap();

    assert_eq!(report.stale, 1);
    assert_eq!(
        orchestrator.leaderboard().player(ALICE_KEY).unwrap().total_games,
        2
    );
}

#[tokio::test]
async fn test_block_timestamps_and_clock_fallback() {
    let fixture = Fixture::new();
    fixture.source.push_game(2, &game(ALICE, 1, 1, 1, 1));
    fixture.source.push_game(3, &game(BOB, 1, 1, 1, 1));
    fixture.source.set_block_timestamp(2, 2_000);

    let mut orchestrator = fixture.orchestrator(0);
    let _report = orchestrator.sync(100).await.unwrap();

    let leaderboard = orchestrator.leaderboard();
    assert_eq!(leaderboard.player(ALICE_KEY).unwrap().last_seen_at, 2_000);
    assert_eq!(leaderboard.player(BOB_KEY).unwrap().last_seen_at, 7);
}

// ---------------------------------------------------------------------------
// Cancellation and scheduling
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cancelled_sync_stops_between_batches() {
    let fixture = Fixture::new();
    fixture.source.set_head(50);

    let cancel = CancellationToken::new();
    cancel.cancel();

    let mut orchestrator = fixture.orchestrator(0);
    let report = orchestrator.sync_cancellable(10, &cancel).await.unwrap();

    assert!(report.cancelled);
    assert!(!report.is_noop(), "a cancelled sync is not up to date");
    assert_eq!(report.last_synced_position, 0);
    assert!(fixture.source.fetched_ranges().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_periodic_sync_picks_up_new_events() {
    let fixture = Fixture::new();
    let mut orchestrator = fixture.orchestrator(0);
    let leaderboard = orchestrator.leaderboard();

    let config = SyncConfig {
        batch_size: 100,
        interval: Duration::from_secs(5),
    };
    let cancel = CancellationToken::new();

    let driver = async {
        fixture.source.push_game(1, &game(ALICE, 1, 1, 1, 1));
        tokio::time::sleep(Duration::from_secs(6)).await;
        assert_eq!(leaderboard.player_count(), 1);

        fixture.source.fail_head(true);
        fixture.source.push_game(2, &game(BOB, 1, 1, 1, 1));
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(leaderboard.player_count(), 1, "failed cycle changes nothing");

        fixture.source.clear_failures();
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(leaderboard.player_count(), 2);
        assert_eq!(leaderboard.last_synced_position(), 2);

        cancel.cancel();
    };

    let ((), ()) = tokio::join!(
        run_periodic(&mut orchestrator, config, cancel.clone()),
        driver
    );
}
