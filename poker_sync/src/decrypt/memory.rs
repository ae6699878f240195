//! In-process decryption service.
//!
//! Stands in for the external decryption capability: cleartext values are
//! registered per handle, authorizations are generated locally and checked on
//! every decrypt, and failures can be scripted.

use super::{
    authorization::DecryptionAuthorization,
    provider::{DecryptError, DecryptionProvider},
};
use crate::ledger::{Address, CiphertextHandle};
use async_trait::async_trait;
use chrono::Utc;
use std::{
    collections::HashMap,
    sync::atomic::{AtomicUsize, Ordering},
};
use tokio::sync::Mutex;

#[derive(Debug, Default)]
struct DecryptorState {
    values: HashMap<CiphertextHandle, u64>,
    fail_next_sign: Option<String>,
    fail_next_decrypt: Option<String>,
}

/// Decryptor backed by a handle-to-value table
#[derive(Debug, Default)]
pub struct InMemoryDecryptor {
    state: Mutex<DecryptorState>,
    sign_count: AtomicUsize,
    decrypt_count: AtomicUsize,
}

fn random_hex(len: usize) -> String {
    let bytes: Vec<u8> = (0..len).map(|_| rand::random::<u8>()).collect();
    format!("0x{}", hex::encode(bytes))
}

impl InMemoryDecryptor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the cleartext behind `handle`
    pub async fn set_value(&self, handle: CiphertextHandle, value: u64) {
        self.state.lock().await.values.insert(handle, value);
    }

    /// Refuse the next signing request
    pub async fn fail_next_sign(&self, reason: &str) {
        self.state.lock().await.fail_next_sign = Some(reason.to_string());
    }

    /// Fail the next decryption request
    pub async fn fail_next_decrypt(&self, reason: &str) {
        self.state.lock().await.fail_next_decrypt = Some(reason.to_string());
    }

    /// Authorizations signed so far
    pub fn sign_count(&self) -> usize {
        self.sign_count.load(Ordering::SeqCst)
    }

    pub fn decrypt_count(&self) -> usize {
        self.decrypt_count.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl DecryptionProvider for InMemoryDecryptor {
    async fn sign_authorization(
        &self,
        contracts: &[Address],
        user: &Address,
        duration_days: u32,
    ) -> Result<DecryptionAuthorization, DecryptError> {
        if let Some(reason) = self.state.lock().await.fail_next_sign.take() {
            return Err(DecryptError::Authorization(reason));
        }
        self.sign_count.fetch_add(1, Ordering::SeqCst);
        Ok(DecryptionAuthorization {
            public_key: random_hex(32),
            private_key: random_hex(32),
            signature: random_hex(65),
            contract_addresses: contracts.to_vec(),
            user_address: user.clone(),
            start_timestamp: Utc::now().timestamp(),
            duration_days,
        })
    }

    async fn user_decrypt(
        &self,
        handles: &[CiphertextHandle],
        contract: &Address,
        authorization: &DecryptionAuthorization,
    ) -> Result<HashMap<CiphertextHandle, u64>, DecryptError> {
        let mut state = self.state.lock().await;
        self.decrypt_count.fetch_add(1, Ordering::SeqCst);
        if let Some(reason) = state.fail_next_decrypt.take() {
            return Err(DecryptError::Decrypt(reason));
        }
        if !authorization.contract_addresses.contains(contract) || !authorization.is_valid_at(Utc::now()) {
            return Err(DecryptError::Authorization(
                "authorization does not cover this contract".to_string(),
            ));
        }

        Ok(handles
            .iter()
            .filter_map(|handle| state.values.get(handle).map(|value| (*handle, *value)))
            .collect())
    }
}
