//! Session-scoped collaborators.
//!
//! One [`SessionContext`] is created per connected wallet session and shared
//! by reference with every subcomponent. It owns the table cache and status
//! board, and holds the optional bindings to the contract, its event stream,
//! the signer and the decryption capability.

use super::status::StatusBoard;
use crate::{
    config::SessionConfig,
    decrypt::DecryptionProvider,
    ledger::{Address, ContractReader, ContractSigner, EventSource},
    table::{RemoteTableReader, TableCache},
};
use std::sync::Arc;

/// Shared state and bindings of one session
pub struct SessionContext {
    config: SessionConfig,
    contract: Option<Arc<dyn ContractReader>>,
    events: Option<Arc<dyn EventSource>>,
    signer: Option<Arc<dyn ContractSigner>>,
    decryptor: Option<Arc<dyn DecryptionProvider>>,
    cache: Arc<TableCache>,
    status: StatusBoard,
}

impl SessionContext {
    pub fn builder(config: SessionConfig) -> SessionContextBuilder {
        SessionContextBuilder {
            config,
            contract: None,
            events: None,
            signer: None,
            decryptor: None,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn contract_address(&self) -> Option<&Address> {
        self.config.contract_address.as_ref()
    }

    /// Contract reader, present only when an address is configured as well
    pub fn contract(&self) -> Option<&Arc<dyn ContractReader>> {
        self.contract_address().and(self.contract.as_ref())
    }

    pub fn events(&self) -> Option<&Arc<dyn EventSource>> {
        self.events.as_ref()
    }

    pub fn signer(&self) -> Option<&Arc<dyn ContractSigner>> {
        self.signer.as_ref()
    }

    pub fn decryptor(&self) -> Option<&Arc<dyn DecryptionProvider>> {
        self.decryptor.as_ref()
    }

    pub fn cache(&self) -> &Arc<TableCache> {
        &self.cache
    }

    pub fn status(&self) -> &StatusBoard {
        &self.status
    }

    /// Reader writing into this session's cache
    pub fn reader(&self) -> RemoteTableReader {
        RemoteTableReader::new(self.contract().cloned(), self.cache.clone())
    }
}

/// Builder for [`SessionContext`]
pub struct SessionContextBuilder {
    config: SessionConfig,
    contract: Option<Arc<dyn ContractReader>>,
    events: Option<Arc<dyn EventSource>>,
    signer: Option<Arc<dyn ContractSigner>>,
    decryptor: Option<Arc<dyn DecryptionProvider>>,
}

impl SessionContextBuilder {
    pub fn contract(mut self, contract: Arc<dyn ContractReader>) -> Self {
        self.contract = Some(contract);
        self
    }

    pub fn events(mut self, events: Arc<dyn EventSource>) -> Self {
        self.events = Some(events);
        self
    }

    pub fn signer(mut self, signer: Arc<dyn ContractSigner>) -> Self {
        self.signer = Some(signer);
        self
    }

    pub fn decryptor(mut self, decryptor: Arc<dyn DecryptionProvider>) -> Self {
        self.decryptor = Some(decryptor);
        self
    }

    pub fn build(self) -> Arc<SessionContext> {
        Arc::new(SessionContext {
            config: self.config,
            contract: self.contract,
            events: self.events,
            signer: self.signer,
            decryptor: self.decryptor,
            cache: Arc::new(TableCache::new()),
            status: StatusBoard::new(),
        })
    }
}
