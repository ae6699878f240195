//! Integration tests for action submission.
//!
//! Tests table creation and adoption, the failure taxonomy, the soft
//! ALREADY_SEATED path and the per-session single-flight guard.

use poker_sync::{
    ActionOutcome, ActionSubmitter, CreateTableParams, InMemoryLedger, SessionConfig,
    SessionContext, SessionPhase, StatusLevel, TableSession, parse_ether,
    actions::NOT_CONFIGURED_MESSAGE,
    decrypt::AuthorizationStore,
    ledger::{Address, ContractCall, ContractReader, RevertCode, TableSetup},
};
use std::{sync::Arc, time::Duration};

fn contract() -> Address {
    Address::from_bytes([0xcc; 20])
}

fn me() -> Address {
    Address::from_bytes([0x11; 20])
}

fn context_for(ledger: &InMemoryLedger, identity: Address) -> Arc<SessionContext> {
    SessionContext::builder(SessionConfig {
        contract_address: Some(contract()),
        ..SessionConfig::default()
    })
    .contract(Arc::new(ledger.clone()))
    .events(Arc::new(ledger.clone()))
    .signer(Arc::new(ledger.signer(identity)))
    .build()
}

fn session_for(ledger: &InMemoryLedger, identity: Address) -> TableSession {
    TableSession::new(
        context_for(ledger, identity),
        Arc::new(AuthorizationStore::new()),
    )
}

fn status_text(session: &TableSession) -> (StatusLevel, String) {
    let message = session.context().status().current().unwrap();
    (message.level, message.text)
}

fn ether(text: &str) -> u128 {
    parse_ether(text).unwrap()
}

#[tokio::test]
async fn test_create_table_tracks_new_table() {
    let ledger = InMemoryLedger::new(contract());
    ledger.insert_table(TableSetup::default()).await;
    let session = session_for(&ledger, me());

    let params = CreateTableParams::from_ether("0.2", 6, "0.005", "0.01").unwrap();
    let outcome = session.create_table(params).await;

    let ActionOutcome::Confirmed {
        table_id: Some(table_id),
        ..
    } = outcome
    else {
        panic!("unexpected outcome {outcome:?}");
    };
    assert_eq!(table_id, 2);
    assert_eq!(session.current_table().await, Some(table_id));
    assert_eq!(session.phase(), SessionPhase::Subscribed);

    let (level, text) = status_text(&session);
    assert_eq!(level, StatusLevel::Success);
    assert!(text.contains(&table_id.to_string()));

    let state = session.snapshot().await.table_state.unwrap();
    assert_eq!(state.min_buy_in, ether("0.2"));
    assert_eq!(state.max_players, 6);
}

#[tokio::test]
async fn test_join_table_tracks_table() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    let session = session_for(&ledger, me());

    let outcome = session.join_table(table_id, ether("0.5")).await;

    assert!(outcome.is_success());
    assert_eq!(session.current_table().await, Some(table_id));
    assert_eq!(
        status_text(&session).1,
        format!("Successfully joined table {table_id}!")
    );
    assert!(session.snapshot().await.has_player(&me()));
}

#[tokio::test]
async fn test_already_seated_is_warning_and_still_tracked() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    ledger.seat_player(table_id, &me(), ether("1")).await.unwrap();
    let session = session_for(&ledger, me());

    let outcome = session.join_table(table_id, ether("1")).await;

    assert_eq!(outcome, ActionOutcome::AlreadySeated { table_id });
    assert_eq!(session.current_table().await, Some(table_id));
    let (level, text) = status_text(&session);
    assert_eq!(level, StatusLevel::Warning);
    assert_eq!(text, "You are already seated at this table!");
}

#[tokio::test]
async fn test_create_table_rule_failures() {
    let ledger = InMemoryLedger::new(contract());
    let session = session_for(&ledger, me());

    let cases = [
        (("0.1", 6, "0.005", "0.01"), RevertCode::BuyInTooLow, "20× the Big Blind"),
        (("0.2", 6, "0.01", "0.01"), RevertCode::InvalidBlinds, "Big Blind must be larger"),
        (("0.2", 11, "0.005", "0.01"), RevertCode::InvalidMaxPlayers, "between 2 and 10"),
        (("0", 6, "0.005", "0.01"), RevertCode::InvalidBuyIn, "greater than 0"),
    ];

    for ((min_buy_in, max_players, small_blind, big_blind), code, expected) in cases {
        let params =
            CreateTableParams::from_ether(min_buy_in, max_players, small_blind, big_blind)
                .unwrap();
        let outcome = session.create_table(params).await;

        assert_eq!(outcome.failure().and_then(|f| f.code()), Some(code));
        let (level, text) = status_text(&session);
        assert_eq!(level, StatusLevel::Error);
        assert!(text.contains(expected), "{text}");
    }
    assert_eq!(session.current_table().await, None);
}

#[tokio::test]
async fn test_join_table_rule_failures() {
    let ledger = InMemoryLedger::new(contract());
    let full = ledger
        .insert_table(TableSetup {
            max_players: 2,
            ..TableSetup::default()
        })
        .await;
    ledger.seat_player(full, &Address::from_bytes([1; 20]), 1).await.unwrap();
    ledger.seat_player(full, &Address::from_bytes([2; 20]), 1).await.unwrap();
    let open = ledger.insert_table(TableSetup::default()).await;
    let session = session_for(&ledger, me());

    let outcome = session.join_table(full, ether("1")).await;
    assert_eq!(outcome.failure().and_then(|f| f.code()), Some(RevertCode::TableFull));
    assert_eq!(status_text(&session).1, "This table is full. Try another table.");

    let outcome = session.join_table(open, ether("0.01")).await;
    assert_eq!(
        outcome.failure().and_then(|f| f.code()),
        Some(RevertCode::InsufficientBuyIn)
    );
    assert_eq!(status_text(&session).1, "Buy-in amount is too low for this table.");
    assert_eq!(session.current_table().await, None);
}

#[tokio::test]
async fn test_unknown_revert_reason_is_generic() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    ledger.revert_next("fold", "NOT_YOUR_TURN").await;
    let ctx = context_for(&ledger, me());
    let submitter = ActionSubmitter::new(Arc::clone(&ctx));

    let outcome = submitter.fold(table_id).await;

    assert!(matches!(outcome, ActionOutcome::Failed(_)));
    let message = ctx.status().current().unwrap();
    assert_eq!(message.level, StatusLevel::Error);
    assert_eq!(message.text, "Failed to fold: Execution reverted: NOT_YOUR_TURN");
}

#[tokio::test]
async fn test_already_seated_on_hand_action_is_an_error() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    ledger.revert_next("fold", "ALREADY_SEATED").await;
    let ctx = context_for(&ledger, me());
    let submitter = ActionSubmitter::new(Arc::clone(&ctx));

    let outcome = submitter.fold(table_id).await;

    assert_eq!(
        outcome.failure().and_then(|failure| failure.code()),
        Some(RevertCode::AlreadySeated)
    );
    assert_eq!(outcome.table_to_track(), None);
    assert_eq!(ctx.status().current().unwrap().level, StatusLevel::Error);
}

#[tokio::test]
async fn test_missing_signer_blocks_before_submission() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    let ctx = SessionContext::builder(SessionConfig {
        contract_address: Some(contract()),
        ..SessionConfig::default()
    })
    .contract(Arc::new(ledger.clone()))
    .build();
    let submitter = ActionSubmitter::new(Arc::clone(&ctx));

    assert_eq!(submitter.join_table(table_id, 1).await, ActionOutcome::NotConfigured);
    assert_eq!(ctx.status().current().unwrap().text, NOT_CONFIGURED_MESSAGE);
    assert!(ledger.submitted_calls().await.is_empty());
}

#[tokio::test]
async fn test_missing_contract_address_blocks() {
    let ledger = InMemoryLedger::new(contract());
    let ctx = SessionContext::builder(SessionConfig::default())
        .signer(Arc::new(ledger.signer(me())))
        .build();
    let submitter = ActionSubmitter::new(ctx);

    let params = CreateTableParams::from_ether("0.2", 6, "0.005", "0.01").unwrap();
    assert_eq!(submitter.create_table(params).await, ActionOutcome::NotConfigured);
    assert!(ledger.submitted_calls().await.is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_second_action_while_in_flight_is_busy() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    ledger.set_confirmation_delay(Duration::from_secs(3)).await;
    let ctx = context_for(&ledger, me());
    let submitter = Arc::new(ActionSubmitter::new(Arc::clone(&ctx)));

    let first = {
        let submitter = Arc::clone(&submitter);
        tokio::spawn(async move { submitter.join_table(table_id, ether("1")).await })
    };
    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(submitter.is_busy());
    let waiting = ctx.status().current().unwrap().text;
    assert!(waiting.starts_with("Waiting for transaction: 0x"));

    // Single flight is per session, not per table
    assert_eq!(submitter.fold(table_id + 1).await, ActionOutcome::Busy);
    assert_eq!(ctx.status().current().unwrap().text, waiting);

    assert!(first.await.unwrap().is_success());
    assert!(!submitter.is_busy());
    assert_eq!(ledger.submitted_calls().await.len(), 1);
}

#[tokio::test]
async fn test_guard_released_after_failure() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    let ctx = context_for(&ledger, me());
    let submitter = ActionSubmitter::new(ctx);

    assert!(!submitter.join_table(table_id, 1).await.is_success());
    assert!(!submitter.is_busy());
    assert!(submitter.join_table(table_id, ether("1")).await.is_success());
}

#[tokio::test]
async fn test_hand_actions_on_current_table() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    let alice = session_for(&ledger, me());
    let bob = session_for(&ledger, Address::from_bytes([0x22; 20]));

    assert!(alice.join_table(table_id, ether("1")).await.is_success());
    assert!(bob.join_table(table_id, ether("1")).await.is_success());

    assert!(alice.advance_game().await.is_success());
    assert_eq!(status_text(&alice).1, "Game advanced! Loading table...");
    let betting = alice.snapshot().await.betting_info.unwrap();
    assert_eq!(betting.current_bet, ether("0.01"));

    assert!(alice.raise(ether("0.05")).await.is_success());
    assert_eq!(status_text(&alice).1, "Raised 0.05 ETH!");
    assert!(bob.call().await.is_success());
    assert_eq!(status_text(&bob).1, "Called!");
    assert!(alice.check().await.is_success());
    assert_eq!(status_text(&alice).1, "Checked!");
    assert!(bob.fold().await.is_success());
    assert_eq!(status_text(&bob).1, "Folded!");

    let state = ledger.get_player_betting_state(table_id, &me()).await.unwrap();
    assert_eq!(state.current_bet, ether("0.06"));

    let methods: Vec<&str> = ledger
        .submitted_calls()
        .await
        .iter()
        .map(|(_, call)| call.method())
        .collect();
    assert_eq!(
        methods,
        vec!["joinTable", "joinTable", "advanceGame", "raise", "call", "check", "fold"]
    );
}

#[tokio::test]
async fn test_start_new_round_after_finish() {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    let session = session_for(&ledger, me());
    session.join_table(table_id, ether("1")).await;
    ledger.finish_game(table_id, &me()).await.unwrap();

    let outcome = session.start_new_round().await;

    assert!(outcome.is_success());
    assert_eq!(status_text(&session).1, "New round started!");
    assert!(matches!(
        ledger.submitted_calls().await.last(),
        Some((_, ContractCall::StartNewRound { .. }))
    ));
}

#[tokio::test]
async fn test_action_without_table_is_reported() {
    let ledger = InMemoryLedger::new(contract());
    let session = session_for(&ledger, me());

    assert!(!session.fold().await.is_success());
    assert_eq!(status_text(&session).0, StatusLevel::Error);
    assert!(ledger.submitted_calls().await.is_empty());
}
