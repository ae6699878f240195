//! Integration tests for hole-card decryption.
//!
//! Tests authorization reuse and expiry, failure handling and retry, and
//! clearing revealed cards when the table is left.

use chrono::{Duration as ChronoDuration, Utc};
use poker_sync::{
    InMemoryDecryptor, InMemoryLedger, SessionConfig, SessionContext, SessionPhase, StatusLevel,
    TableSession,
    decrypt::{AuthorizationStore, DecryptionAuthorization, DecryptionSessionManager, RevealState},
    ledger::{Address, CiphertextHandle, ContractSigner, ReadKind, TableId, TableSetup},
};
use std::{sync::Arc, time::Duration};

fn contract() -> Address {
    Address::from_bytes([0xcc; 20])
}

fn me() -> Address {
    Address::from_bytes([0x11; 20])
}

struct Fixture {
    ledger: InMemoryLedger,
    decryptor: Arc<InMemoryDecryptor>,
    ctx: Arc<SessionContext>,
    table_id: TableId,
    handles: [CiphertextHandle; 2],
}

/// Helper to seat the caller and register cleartext 0 and 51 for their hole cards
async fn setup() -> Fixture {
    let ledger = InMemoryLedger::new(contract());
    let table_id = ledger.insert_table(TableSetup::default()).await;
    ledger.seat_player(table_id, &me(), 1_000).await.unwrap();
    let handles = ledger.signer(me()).get_my_hole_cards(table_id).await.unwrap();

    let decryptor = Arc::new(InMemoryDecryptor::new());
    decryptor.set_value(handles[0], 0).await;
    decryptor.set_value(handles[1], 51).await;

    let ctx = SessionContext::builder(SessionConfig {
        contract_address: Some(contract()),
        ..SessionConfig::default()
    })
    .contract(Arc::new(ledger.clone()))
    .events(Arc::new(ledger.clone()))
    .signer(Arc::new(ledger.signer(me())))
    .decryptor(decryptor.clone())
    .build();

    Fixture {
        ledger,
        decryptor,
        ctx,
        table_id,
        handles,
    }
}

fn manager(fixture: &Fixture) -> DecryptionSessionManager {
    DecryptionSessionManager::new(
        Arc::clone(&fixture.ctx),
        Arc::new(AuthorizationStore::new()),
    )
}

#[tokio::test]
async fn test_reveal_decrypts_hole_cards() {
    let fixture = setup().await;
    let manager = manager(&fixture);
    assert_eq!(manager.state().await, RevealState::Hidden);

    let state = manager.reveal(fixture.table_id).await;

    assert_eq!(state, RevealState::Revealed);
    let cards = manager.hole_cards().await;
    assert_eq!(cards.len(), 2);
    assert_eq!(cards[0].handle, fixture.handles[0]);
    assert_eq!(cards[0].card.unwrap().to_string(), "2♥");
    assert_eq!(cards[1].card.unwrap().to_string(), "A♠");
    assert_eq!(
        manager.card_for(&fixture.handles[1]).await.unwrap().to_string(),
        "A♠"
    );

    let message = fixture.ctx.status().current().unwrap();
    assert_eq!(message.level, StatusLevel::Success);
    assert_eq!(message.text, "Cards decrypted!");
}

#[tokio::test]
async fn test_authorization_is_reused() {
    let fixture = setup().await;
    let manager = manager(&fixture);

    manager.reveal(fixture.table_id).await;
    manager.reveal(fixture.table_id).await;

    assert_eq!(fixture.decryptor.sign_count(), 1);
    assert_eq!(fixture.decryptor.decrypt_count(), 2);
    assert_eq!(manager.store().len().await, 1);
}

#[tokio::test]
async fn test_expired_authorization_is_signed_again() {
    let fixture = setup().await;
    let store = Arc::new(AuthorizationStore::new());
    store
        .save(DecryptionAuthorization {
            public_key: "0x01".into(),
            private_key: "0x02".into(),
            signature: "0x03".into(),
            contract_addresses: vec![contract()],
            user_address: me(),
            start_timestamp: (Utc::now() - ChronoDuration::days(30)).timestamp(),
            duration_days: 7,
        })
        .await;
    let manager = DecryptionSessionManager::new(Arc::clone(&fixture.ctx), Arc::clone(&store));

    assert_eq!(manager.reveal(fixture.table_id).await, RevealState::Revealed);
    assert_eq!(fixture.decryptor.sign_count(), 1);

    let fresh = store.load(&contract(), &me(), Utc::now()).await.unwrap();
    assert_eq!(fresh.duration_days, 365);
}

#[tokio::test]
async fn test_decrypt_failure_is_retryable() {
    let fixture = setup().await;
    let manager = manager(&fixture);
    fixture.decryptor.fail_next_decrypt("relayer unavailable").await;

    let state = manager.reveal(fixture.table_id).await;

    let RevealState::Failed(message) = state else {
        panic!("unexpected state {state:?}");
    };
    assert!(message.starts_with("Failed to decrypt cards: "));
    assert!(message.contains("relayer unavailable"));
    assert!(manager.hole_cards().await.is_empty());
    assert!(!manager.is_decrypting());
    assert_eq!(
        fixture.ctx.status().current().unwrap().level,
        StatusLevel::Error
    );

    assert_eq!(manager.reveal(fixture.table_id).await, RevealState::Revealed);
    assert_eq!(manager.hole_cards().await.len(), 2);
}

#[tokio::test]
async fn test_refused_signature_fails_without_storing() {
    let fixture = setup().await;
    let manager = manager(&fixture);
    fixture.decryptor.fail_next_sign("user rejected").await;

    let state = manager.reveal(fixture.table_id).await;

    assert!(matches!(state, RevealState::Failed(ref m) if m.contains("Unable to build decryption authorization")));
    assert!(manager.store().is_empty().await);
    assert_eq!(fixture.decryptor.decrypt_count(), 0);
}

#[tokio::test]
async fn test_out_of_range_value_fails() {
    let fixture = setup().await;
    fixture.decryptor.set_value(fixture.handles[1], 52).await;
    let manager = manager(&fixture);

    let state = manager.reveal(fixture.table_id).await;

    assert!(matches!(state, RevealState::Failed(ref m) if m.contains("52")));
    assert!(manager.card_for(&fixture.handles[0]).await.is_none());
}

#[tokio::test]
async fn test_not_seated_fails() {
    let fixture = setup().await;
    let other = fixture.ledger.insert_table(TableSetup::default()).await;
    let manager = manager(&fixture);

    assert!(matches!(
        manager.reveal(other).await,
        RevealState::Failed(_)
    ));
    assert_eq!(fixture.decryptor.sign_count(), 0);
}

#[tokio::test]
async fn test_missing_decryptor_does_nothing() {
    let fixture = setup().await;
    let ctx = SessionContext::builder(SessionConfig {
        contract_address: Some(contract()),
        ..SessionConfig::default()
    })
    .signer(Arc::new(fixture.ledger.signer(me())))
    .build();
    let manager = DecryptionSessionManager::new(ctx, Arc::new(AuthorizationStore::new()));

    assert_eq!(manager.reveal(fixture.table_id).await, RevealState::Hidden);
}

#[tokio::test]
async fn test_leaving_table_clears_revealed_cards() {
    let fixture = setup().await;
    let session = TableSession::new(
        Arc::clone(&fixture.ctx),
        Arc::new(AuthorizationStore::new()),
    );
    session.track_table(fixture.table_id).await;

    assert_eq!(session.reveal_hole_cards().await, RevealState::Revealed);
    assert_eq!(session.hole_cards().await.len(), 2);

    session.leave().await;

    assert!(session.hole_cards().await.is_empty());
    assert_eq!(session.decryption().state().await, RevealState::Hidden);
    assert_eq!(session.phase(), SessionPhase::TornDown);
    assert_eq!(session.current_table().await, None);
}

#[tokio::test(start_paused = true)]
async fn test_concurrent_reveal_is_single_flight() {
    let fixture = setup().await;
    fixture
        .ledger
        .delay_next_read(ReadKind::HoleCards, Duration::from_millis(300))
        .await;
    let manager = manager(&fixture);

    let (first, second) = tokio::join!(
        manager.reveal(fixture.table_id),
        manager.reveal(fixture.table_id)
    );

    assert_eq!(first, RevealState::Revealed);
    assert_eq!(second, RevealState::Decrypting);
    assert_eq!(fixture.decryptor.sign_count(), 1);
    assert_eq!(fixture.decryptor.decrypt_count(), 1);
    assert!(!manager.is_decrypting());
}

#[tokio::test(start_paused = true)]
async fn test_reveal_overtaken_by_leave_keeps_nothing() {
    let fixture = setup().await;
    let session = TableSession::new(
        Arc::clone(&fixture.ctx),
        Arc::new(AuthorizationStore::new()),
    );
    session.track_table(fixture.table_id).await;
    fixture
        .ledger
        .delay_next_read(ReadKind::HoleCards, Duration::from_millis(300))
        .await;

    let (state, _) = tokio::join!(session.reveal_hole_cards(), async {
        tokio::time::sleep(Duration::from_millis(100)).await;
        session.leave().await;
    });

    assert_eq!(state, RevealState::Hidden);
    assert!(session.hole_cards().await.is_empty());
    assert!(
        session
            .decryption()
            .card_for(&fixture.handles[0])
            .await
            .is_none()
    );

    // A later reveal at the same table works again
    session.track_table(fixture.table_id).await;
    assert_eq!(session.reveal_hole_cards().await, RevealState::Revealed);
}
