//! Table session facade.
//!
//! Composes cache, change feed, action submitter and decryption manager
//! around one [`SessionContext`] and keeps them pointed at the same table.

use super::context::SessionContext;
use crate::{
    actions::{ActionFailure, ActionOutcome, ActionSubmitter, CreateTableParams},
    amount::Wei,
    decrypt::{AuthorizationStore, DecryptedCard, DecryptionSessionManager, RevealState},
    feed::ChangeFeed,
    ledger::TableId,
    table::TableView,
};
use std::sync::Arc;
use tokio::sync::{Mutex, watch};

/// Lifecycle of the tracked table's synchronization
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SessionPhase {
    /// No table tracked yet
    #[default]
    Idle,
    /// Baseline refresh running
    Loading,
    /// Listening for events
    Subscribed,
    /// Table left; nothing runs until another is tracked
    TornDown,
}

/// Message posted when a table action is attempted with no table tracked
pub const NO_TABLE_MESSAGE: &str = "No table selected";

/// Everything one wallet session needs to follow and play one table
pub struct TableSession {
    ctx: Arc<SessionContext>,
    submitter: ActionSubmitter,
    decryption: DecryptionSessionManager,
    feed: Mutex<Option<ChangeFeed>>,
    phase: watch::Sender<SessionPhase>,
}

impl TableSession {
    pub fn new(ctx: Arc<SessionContext>, authorizations: Arc<AuthorizationStore>) -> Self {
        let (phase, _) = watch::channel(SessionPhase::Idle);
        Self {
            submitter: ActionSubmitter::new(Arc::clone(&ctx)),
            decryption: DecryptionSessionManager::new(Arc::clone(&ctx), authorizations),
            ctx,
            feed: Mutex::new(None),
            phase,
        }
    }

    pub fn context(&self) -> &Arc<SessionContext> {
        &self.ctx
    }

    pub fn submitter(&self) -> &ActionSubmitter {
        &self.submitter
    }

    pub fn decryption(&self) -> &DecryptionSessionManager {
        &self.decryption
    }

    pub fn phase(&self) -> SessionPhase {
        *self.phase.borrow()
    }

    pub fn watch_phase(&self) -> watch::Receiver<SessionPhase> {
        self.phase.subscribe()
    }

    pub async fn current_table(&self) -> Option<TableId> {
        self.ctx.cache().tracked_table().await
    }

    /// Make `table_id` the tracked table.
    ///
    /// Tracking a different table tears down the previous feed, clears the
    /// cache and revealed cards, runs a baseline refresh and subscribes to
    /// the new table's events. Tracking the current table again is a no-op.
    pub async fn track_table(&self, table_id: TableId) {
        let mut feed = self.feed.lock().await;
        let same_table = self.ctx.cache().tracked_table().await == Some(table_id);
        if same_table && feed.as_ref().is_some_and(ChangeFeed::is_listening) {
            return;
        }

        if let Some(mut previous) = feed.take() {
            previous.teardown();
        }
        self.ctx.cache().switch_table(Some(table_id)).await;
        if !same_table {
            self.decryption.clear().await;
        }

        log::info!("Table {}: tracking", table_id);
        self.phase.send_replace(SessionPhase::Loading);
        *feed = Some(ChangeFeed::start(&self.ctx, table_id).await);
        self.phase.send_replace(SessionPhase::Subscribed);
    }

    /// Stop following the current table and drop everything cached for it
    pub async fn leave(&self) {
        let mut feed = self.feed.lock().await;
        if let Some(mut previous) = feed.take() {
            previous.teardown();
        }
        self.ctx.cache().switch_table(None).await;
        self.decryption.clear().await;
        self.phase.send_replace(SessionPhase::TornDown);
    }

    /// Refresh the tracked table now, bypassing the debounce
    pub async fn refresh(&self) {
        if let Some(table_id) = self.current_table().await {
            self.ctx.reader().refresh_all(table_id).await;
        }
    }

    /// Copy of everything cached for the tracked table
    pub async fn snapshot(&self) -> TableView {
        self.ctx.cache().snapshot().await
    }

    /// Create a table and track it once confirmed
    pub async fn create_table(&self, params: CreateTableParams) -> ActionOutcome {
        let outcome = self.submitter.create_table(params).await;
        self.adopt(&outcome).await;
        outcome
    }

    /// Join a table and track it; also tracked when already seated there
    pub async fn join_table(&self, table_id: TableId, buy_in: Wei) -> ActionOutcome {
        let outcome = self.submitter.join_table(table_id, buy_in).await;
        self.adopt(&outcome).await;
        outcome
    }

    pub async fn fold(&self) -> ActionOutcome {
        match self.require_table().await {
            Ok(table_id) => self.submitter.fold(table_id).await,
            Err(outcome) => outcome,
        }
    }

    pub async fn check(&self) -> ActionOutcome {
        match self.require_table().await {
            Ok(table_id) => self.submitter.check(table_id).await,
            Err(outcome) => outcome,
        }
    }

    pub async fn call(&self) -> ActionOutcome {
        match self.require_table().await {
            Ok(table_id) => self.submitter.call(table_id).await,
            Err(outcome) => outcome,
        }
    }

    pub async fn raise(&self, amount: Wei) -> ActionOutcome {
        match self.require_table().await {
            Ok(table_id) => self.submitter.raise(table_id, amount).await,
            Err(outcome) => outcome,
        }
    }

    /// Advance the game and reload the table once confirmed
    pub async fn advance_game(&self) -> ActionOutcome {
        let table_id = match self.require_table().await {
            Ok(table_id) => table_id,
            Err(outcome) => return outcome,
        };
        let outcome = self.submitter.advance_game(table_id).await;
        if outcome.is_success() {
            self.ctx.reader().refresh_all(table_id).await;
        }
        outcome
    }

    pub async fn start_new_round(&self) -> ActionOutcome {
        match self.require_table().await {
            Ok(table_id) => self.submitter.start_new_round(table_id).await,
            Err(outcome) => outcome,
        }
    }

    /// Decrypt the caller's hole cards at the tracked table
    pub async fn reveal_hole_cards(&self) -> RevealState {
        match self.current_table().await {
            Some(table_id) => self.decryption.reveal(table_id).await,
            None => self.decryption.state().await,
        }
    }

    pub async fn hole_cards(&self) -> Vec<DecryptedCard> {
        self.decryption.hole_cards().await
    }

    async fn adopt(&self, outcome: &ActionOutcome) {
        if let Some(table_id) = outcome.table_to_track() {
            self.track_table(table_id).await;
        }
    }

    async fn require_table(&self) -> Result<TableId, ActionOutcome> {
        match self.current_table().await {
            Some(table_id) => Ok(table_id),
            None => {
                self.ctx.status().error(NO_TABLE_MESSAGE);
                Err(ActionOutcome::Failed(ActionFailure::Other(
                    NO_TABLE_MESSAGE.to_string(),
                )))
            }
        }
    }
}
