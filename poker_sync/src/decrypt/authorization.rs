//! Decryption authorizations and their storage.
//!
//! An authorization is a signed, time-boxed grant letting one account decrypt
//! values of a set of contracts. Signing one prompts the wallet, so issued
//! authorizations are kept and reused until they expire.

use crate::ledger::Address;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, fmt};
use tokio::sync::RwLock;

/// Signed grant to decrypt on behalf of `user_address`
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptionAuthorization {
    pub public_key: String,
    pub private_key: String,
    pub signature: String,
    pub contract_addresses: Vec<Address>,
    pub user_address: Address,
    /// Unix seconds
    pub start_timestamp: i64,
    pub duration_days: u32,
}

impl DecryptionAuthorization {
    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.start_timestamp, 0)?
            .checked_add_signed(Duration::days(i64::from(self.duration_days)))
    }

    /// Whether `now` falls inside the validity window
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.start_timestamp
            && self.expires_at().is_some_and(|expires| now < expires)
    }

    /// Whether this authorization lets `user` decrypt values of `contract`
    pub fn covers(&self, contract: &Address, user: &Address) -> bool {
        &self.user_address == user && self.contract_addresses.contains(contract)
    }
}

impl fmt::Debug for DecryptionAuthorization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptionAuthorization")
            .field("public_key", &self.public_key)
            .field("private_key", &"<redacted>")
            .field("contract_addresses", &self.contract_addresses)
            .field("user_address", &self.user_address)
            .field("start_timestamp", &self.start_timestamp)
            .field("duration_days", &self.duration_days)
            .finish()
    }
}

/// Issued authorizations keyed by (contract, user)
#[derive(Debug, Default)]
pub struct AuthorizationStore {
    entries: RwLock<HashMap<(Address, Address), DecryptionAuthorization>>,
}

impl AuthorizationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Authorization for `contract` and `user` still valid at `now`.
    ///
    /// An expired entry found on the way is removed.
    pub async fn load(
        &self,
        contract: &Address,
        user: &Address,
        now: DateTime<Utc>,
    ) -> Option<DecryptionAuthorization> {
        let key = (contract.clone(), user.clone());
        let mut entries = self.entries.write().await;
        match entries.get(&key) {
            Some(auth) if auth.is_valid_at(now) => Some(auth.clone()),
            Some(_) => {
                log::debug!("Decryption authorization for {} expired", user);
                entries.remove(&key);
                None
            }
            None => None,
        }
    }

    /// Keep `auth` for every contract it covers
    pub async fn save(&self, auth: DecryptionAuthorization) {
        let mut entries = self.entries.write().await;
        for contract in &auth.contract_addresses {
            entries.insert((contract.clone(), auth.user_address.clone()), auth.clone());
        }
    }

    /// Drop every authorization expired at `now`; returns how many were removed
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> usize {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, auth| auth.is_valid_at(now));
        before - entries.len()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
    }

    /// Serialize every stored authorization
    pub async fn export_json(&self) -> serde_json::Result<String> {
        let entries = self.entries.read().await;
        let mut unique: Vec<&DecryptionAuthorization> = Vec::new();
        for auth in entries.values() {
            if !unique.contains(&auth) {
                unique.push(auth);
            }
        }
        serde_json::to_string(&unique)
    }

    /// Load authorizations produced by [`export_json`](Self::export_json).
    ///
    /// Entries already expired at `now` are skipped. Returns how many were kept.
    pub async fn import_json(&self, json: &str, now: DateTime<Utc>) -> serde_json::Result<usize> {
        let imported: Vec<DecryptionAuthorization> = serde_json::from_str(json)?;
        let mut kept = 0;
        for auth in imported.into_iter().filter(|auth| auth.is_valid_at(now)) {
            self.save(auth).await;
            kept += 1;
        }
        Ok(kept)
    }
}
