//! Hole-card reveal.

use super::{
    authorization::{AuthorizationStore, DecryptionAuthorization},
    provider::{DecryptError, DecryptionProvider},
};
use crate::{
    cards::Card,
    ledger::{Address, CiphertextHandle, ContractSigner, TableId},
    session::{InFlightGuard, SessionContext},
};
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
};
use tokio::sync::RwLock;

/// Reveal progress of the caller's hole cards
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RevealState {
    #[default]
    Hidden,
    Decrypting,
    Revealed,
    /// Last attempt failed; another reveal may be requested
    Failed(String),
}

/// A hole card and, once revealed, its value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecryptedCard {
    pub handle: CiphertextHandle,
    pub card: Option<Card>,
}

#[derive(Debug, Default)]
struct RevealInner {
    state: RevealState,
    hole_cards: Vec<DecryptedCard>,
    revealed: HashMap<CiphertextHandle, Card>,
}

/// Reveals the caller's hole cards, reusing decryption authorizations
pub struct DecryptionSessionManager {
    ctx: Arc<SessionContext>,
    store: Arc<AuthorizationStore>,
    decrypting: AtomicBool,
    /// Bumped by `clear`; a reveal started under an older value is dropped
    generation: AtomicU64,
    inner: RwLock<RevealInner>,
}

impl DecryptionSessionManager {
    /// Create a new manager.
    ///
    /// # Arguments
    ///
    /// * `ctx` - Session bindings
    /// * `store` - Authorization store; may be shared across sessions of one wallet
    pub fn new(ctx: Arc<SessionContext>, store: Arc<AuthorizationStore>) -> Self {
        Self {
            ctx,
            store,
            decrypting: AtomicBool::new(false),
            generation: AtomicU64::new(0),
            inner: RwLock::new(RevealInner::default()),
        }
    }

    pub fn store(&self) -> &Arc<AuthorizationStore> {
        &self.store
    }

    pub async fn state(&self) -> RevealState {
        self.inner.read().await.state.clone()
    }

    /// Hole cards from the last successful reveal
    pub async fn hole_cards(&self) -> Vec<DecryptedCard> {
        self.inner.read().await.hole_cards.clone()
    }

    pub async fn card_for(&self, handle: &CiphertextHandle) -> Option<Card> {
        self.inner.read().await.revealed.get(handle).copied()
    }

    /// Forget every revealed card, including those of a reveal still running
    pub async fn clear(&self) {
        let mut inner = self.inner.write().await;
        self.generation.fetch_add(1, Ordering::AcqRel);
        *inner = RevealInner::default();
    }

    /// Reveal the caller's hole cards at `table_id`.
    ///
    /// Does nothing while another reveal is running or when the session lacks
    /// a contract, signer or decryption service. Failures are posted to the
    /// status board and leave the cards hidden. A reveal overtaken by
    /// [`clear`](Self::clear) keeps nothing.
    pub async fn reveal(&self, table_id: TableId) -> RevealState {
        let (contract, signer, decryptor) = match (
            self.ctx.contract_address(),
            self.ctx.signer(),
            self.ctx.decryptor(),
        ) {
            (Some(contract), Some(signer), Some(decryptor)) => {
                (contract.clone(), Arc::clone(signer), Arc::clone(decryptor))
            }
            _ => {
                log::debug!("Table {}: reveal skipped, {}", table_id, DecryptError::NotConfigured);
                return self.state().await;
            }
        };

        let Some(_guard) = InFlightGuard::acquire(&self.decrypting) else {
            log::debug!("Table {}: reveal already in progress", table_id);
            return self.state().await;
        };

        let generation = {
            let mut inner = self.inner.write().await;
            inner.state = RevealState::Decrypting;
            self.generation.load(Ordering::Acquire)
        };
        let result = self
            .decrypt_hole_cards(table_id, &contract, signer.as_ref(), decryptor.as_ref())
            .await;

        let mut inner = self.inner.write().await;
        if self.generation.load(Ordering::Acquire) != generation {
            log::debug!("Table {}: reveal finished after cards were cleared, dropping it", table_id);
            return inner.state.clone();
        }
        let state = match result {
            Ok(cards) => {
                for card in &cards {
                    if let Some(value) = card.card {
                        inner.revealed.insert(card.handle, value);
                    }
                }
                inner.hole_cards = cards;
                self.ctx.status().success("Cards decrypted!");
                RevealState::Revealed
            }
            Err(e) => {
                let message = format!("Failed to decrypt cards: {e}");
                self.ctx.status().error(message.clone());
                RevealState::Failed(message)
            }
        };
        inner.state = state.clone();
        state
    }

    /// Whether a reveal is running
    pub fn is_decrypting(&self) -> bool {
        self.decrypting.load(Ordering::Acquire)
    }

    async fn decrypt_hole_cards(
        &self,
        table_id: TableId,
        contract: &Address,
        signer: &dyn ContractSigner,
        decryptor: &dyn DecryptionProvider,
    ) -> Result<Vec<DecryptedCard>, DecryptError> {
        let status = self.ctx.status();
        status.info("Fetching encrypted cards...");
        let handles = signer.get_my_hole_cards(table_id).await?;

        status.info("Decrypting cards...");
        let authorization = self
            .load_or_sign(contract, signer.identity(), decryptor)
            .await?;
        let values = decryptor
            .user_decrypt(&handles, contract, &authorization)
            .await?;

        handles
            .into_iter()
            .map(|handle| -> Result<DecryptedCard, DecryptError> {
                let value = values
                    .get(&handle)
                    .copied()
                    .ok_or(DecryptError::MissingValue(handle))?;
                Ok(DecryptedCard {
                    handle,
                    card: Some(Card::decode(value)?),
                })
            })
            .collect()
    }

    /// Reuse a stored authorization that is still valid, otherwise sign a new one
    async fn load_or_sign(
        &self,
        contract: &Address,
        user: &Address,
        decryptor: &dyn DecryptionProvider,
    ) -> Result<DecryptionAuthorization, DecryptError> {
        if let Some(authorization) = self.store.load(contract, user, Utc::now()).await {
            log::debug!("Reusing decryption authorization for {}", user);
            return Ok(authorization);
        }

        let authorization = decryptor
            .sign_authorization(
                std::slice::from_ref(contract),
                user,
                self.ctx.config().decrypt_auth_days,
            )
            .await?;
        log::info!("Signed new decryption authorization for {}", user);
        self.store.save(authorization.clone()).await;
        Ok(authorization)
    }
}
