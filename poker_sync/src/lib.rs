//! # Poker Sync
//!
//! Client-side synchronization engine for a poker contract whose
//! authoritative state lives on a remote ledger.
//!
//! The engine keeps a render-ready snapshot of one table consistent while
//! change notifications arrive in bursts, reads of a single table are split
//! across several independent calls, and mutations take seconds to confirm.
//! Hole cards are stored encrypted on the ledger and are revealed on request
//! through a time-boxed decryption authorization.
//!
//! ## Core Modules
//!
//! - [`table`]: Cached table state and the remote reads that fill it
//! - [`feed`]: Event subscription and refresh debouncing
//! - [`actions`]: Transaction submission and failure classification
//! - [`decrypt`]: Decryption authorizations and hole-card reveal
//! - [`session`]: Session context, status line and the [`TableSession`] facade
//! - [`ledger`]: Contract traits, events and errors
//!
//! The `test-util` feature adds in-memory implementations of the contract and
//! the decryption service for driving the engine in tests.
//!
//! ## Example
//!
//! ```
//! use poker_sync::{
//!     InMemoryLedger, SessionConfig, SessionContext, TableSession,
//!     decrypt::AuthorizationStore, ledger::Address,
//! };
//! use std::sync::Arc;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() {
//! let contract = Address::from_bytes([0xcc; 20]);
//! let ledger = InMemoryLedger::new(contract.clone());
//! let config = SessionConfig {
//!     contract_address: Some(contract),
//!     ..SessionConfig::default()
//! };
//! let ctx = SessionContext::builder(config)
//!     .contract(Arc::new(ledger.clone()))
//!     .events(Arc::new(ledger.clone()))
//!     .signer(Arc::new(ledger.signer(Address::from_bytes([1; 20]))))
//!     .build();
//!
//! let session = TableSession::new(ctx, Arc::new(AuthorizationStore::new()));
//! assert!(session.current_table().await.is_none());
//! # }
//! ```

pub mod actions;
pub mod amount;
pub mod cards;
pub mod config;
pub mod decrypt;
pub mod feed;
pub mod ledger;
pub mod logging;
pub mod session;
pub mod table;

pub use actions::{ActionOutcome, ActionSubmitter, CreateTableParams};
pub use amount::{Wei, format_ether, parse_ether};
pub use cards::{Card, Rank, Suit};
pub use config::{ConfigError, SessionConfig};
pub use decrypt::DecryptionSessionManager;
#[cfg(any(test, feature = "test-util"))]
pub use decrypt::InMemoryDecryptor;
pub use feed::ChangeFeed;
pub use ledger::{Address, LedgerError, TableId};
#[cfg(any(test, feature = "test-util"))]
pub use ledger::InMemoryLedger;
pub use session::{SessionContext, SessionPhase, StatusLevel, TableSession};
pub use table::{RemoteTableReader, TableCache, TableView};
