//! Integration tests for the table session facade.

use poker_sync::{
    InMemoryLedger, SessionConfig, SessionContext, SessionPhase, TableSession,
    decrypt::AuthorizationStore,
    ledger::{Address, EventKind, LedgerEvent, ReadKind, TableSetup},
};
use std::{sync::Arc, time::Duration};

fn contract() -> Address {
    Address::from_bytes([0xcc; 20])
}

fn setup(ledger: &InMemoryLedger) -> TableSession {
    let ctx = SessionContext::builder(SessionConfig {
        contract_address: Some(contract()),
        ..SessionConfig::default()
    })
    .contract(Arc::new(ledger.clone()))
    .events(Arc::new(ledger.clone()))
    .signer(Arc::new(ledger.signer(Address::from_bytes([0x11; 20]))))
    .build();
    TableSession::new(ctx, Arc::new(AuthorizationStore::new()))
}

#[tokio::test(start_paused = true)]
async fn test_phase_follows_tracking() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    let session = setup(&ledger);
    let mut phases = session.watch_phase();
    assert_eq!(session.phase(), SessionPhase::Idle);

    session.track_table(table_id).await;
    assert_eq!(session.phase(), SessionPhase::Subscribed);
    assert!(phases.has_changed().unwrap());
    assert_eq!(*phases.borrow_and_update(), SessionPhase::Subscribed);

    session.leave().await;
    assert_eq!(session.phase(), SessionPhase::TornDown);
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(ledger.subscriber_count().await, 0);
}

#[tokio::test(start_paused = true)]
async fn test_switching_tables_clears_and_resubscribes() {
    let ledger = InMemoryLedger::new(contract());
    let first = ledger.insert_table(TableSetup::default()).await;
    let second = ledger.insert_table(TableSetup::default()).await;
    ledger
        .seat_player(first, &Address::from_bytes([1; 20]), 100)
        .await
        .unwrap();
    let session = setup(&ledger);

    session.track_table(first).await;
    assert_eq!(session.snapshot().await.players.len(), 1);

    session.track_table(second).await;
    let view = session.snapshot().await;
    assert_eq!(view.table_id, Some(second));
    assert!(view.players.is_empty());
    assert!(view.player_states.is_empty());
    assert_eq!(view.table_state.unwrap().table_id, second);

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert_eq!(ledger.subscriber_count().await, 1);

    // Events for the old table no longer refresh anything
    let before = ledger.read_count(ReadKind::TableState).await;
    ledger.emit(LedgerEvent::new(first, EventKind::FlopDealt)).await;
    tokio::time::sleep(Duration::from_secs(2)).await;
    assert_eq!(ledger.read_count(ReadKind::TableState).await, before);
}

#[tokio::test(start_paused = true)]
async fn test_tracking_same_table_twice_is_noop() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    let session = setup(&ledger);

    session.track_table(table_id).await;
    session.track_table(table_id).await;

    assert_eq!(ledger.read_count(ReadKind::TableState).await, 1);
}

#[tokio::test(start_paused = true)]
async fn test_manual_refresh_bypasses_debounce() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    let session = setup(&ledger);
    session.track_table(table_id).await;

    session.refresh().await;
    session.refresh().await;

    assert_eq!(ledger.read_count(ReadKind::TableState).await, 3);
}

#[tokio::test(start_paused = true)]
async fn test_refresh_without_table_reads_nothing() {
    let ledger = InMemoryLedger::new(contract());
    let session = setup(&ledger);

    session.refresh().await;

    assert_eq!(ledger.read_count(ReadKind::TableState).await, 0);
    assert!(session.snapshot().await.table_id.is_none());
}
