use super::*;

#[test]
fn test_headline_when_up_to_date() {
    let report = SyncReport {
        head: 10,
        start_position: 10,
        last_synced_position: 10,
        ..SyncReport::default()
    };

    assert_eq!(
        sync_headline(&report).as_deref(),
        Some("Already up to date at block 10 (head 10)")
    );
}

#[test]
fn test_headline_when_cancelled_before_first_batch() {
    let report = SyncReport {
        head: 50,
        start_position: 4,
        last_synced_position: 4,
        cancelled: true,
        ..SyncReport::default()
    };

    assert_eq!(
        sync_headline(&report).as_deref(),
        Some("Sync cancelled before the first batch, still at block 4 (head 50)")
    );
}

#[test]
fn test_no_headline_once_a_batch_ran() {
    let report = SyncReport {
        head: 50,
        start_position: 4,
        last_synced_position: 20,
        batches: 1,
        cancelled: true,
        ..SyncReport::default()
    };

    assert_eq!(sync_headline(&report), None);
}
