//! External decryption capability.

use super::authorization::DecryptionAuthorization;
use crate::{
    cards::InvalidCard,
    ledger::{Address, CiphertextHandle, LedgerError},
};
use async_trait::async_trait;
use std::collections::HashMap;
use thiserror::Error;

/// Errors raised while revealing hole cards
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecryptError {
    #[error("Contract, signer or decryption service not available")]
    NotConfigured,

    #[error("Unable to build decryption authorization: {0}")]
    Authorization(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error("Decryption failed: {0}")]
    Decrypt(String),

    #[error("No cleartext returned for {0}")]
    MissingValue(CiphertextHandle),

    #[error(transparent)]
    InvalidCard(#[from] InvalidCard),
}

/// Signs authorizations and exchanges ciphertext handles for cleartext
#[async_trait]
pub trait DecryptionProvider: Send + Sync {
    /// Issue a new authorization for `user` over `contracts`; prompts the wallet
    async fn sign_authorization(
        &self,
        contracts: &[Address],
        user: &Address,
        duration_days: u32,
    ) -> Result<DecryptionAuthorization, DecryptError>;

    /// Decrypt `handles` of `contract`, returning cleartext keyed by handle
    async fn user_decrypt(
        &self,
        handles: &[CiphertextHandle],
        contract: &Address,
        authorization: &DecryptionAuthorization,
    ) -> Result<HashMap<CiphertextHandle, u64>, DecryptError>;
}
