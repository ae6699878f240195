//! Remote ledger boundary: identifiers, events, errors and the contract traits.

pub mod contract;
pub mod errors;
pub mod events;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod types;

pub use contract::{ContractCall, ContractReader, ContractSigner, EventSource, Receipt};
pub use errors::{LedgerError, LedgerResult, RevertCode};
pub use events::{EventKind, LedgerEvent};
#[cfg(any(test, feature = "test-util"))]
pub use memory::{InMemoryLedger, MemorySigner, ReadKind, TableSetup};
pub use types::{Address, CiphertextHandle, InvalidAddress, InvalidHandle, TableId, TxHash};
