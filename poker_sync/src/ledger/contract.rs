//! Trait definitions for the remote poker contract.
//!
//! The engine only ever talks to the ledger through these traits, which keeps
//! the transport (JSON-RPC, websocket, in-process fake) swappable and lets the
//! tests run without a node.

use super::{
    errors::LedgerResult,
    events::{EventKind, LedgerEvent},
    types::{Address, CiphertextHandle, TableId, TxHash},
};
use crate::{
    amount::Wei,
    table::{BettingInfo, CommunityCards, PlayerBettingState, TableStateRecord},
};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Read-only contract calls
#[async_trait]
pub trait ContractReader: Send + Sync {
    /// Lifecycle, seating and countdown data for a table
    async fn get_table_state(&self, table_id: TableId) -> LedgerResult<TableStateRecord>;

    /// Pot, current bet and whose turn it is
    async fn get_betting_info(&self, table_id: TableId) -> LedgerResult<BettingInfo>;

    /// Seated player addresses in seat order
    async fn get_players(&self, table_id: TableId) -> LedgerResult<Vec<Address>>;

    /// Betting position of one seated player
    async fn get_player_betting_state(
        &self,
        table_id: TableId,
        player: &Address,
    ) -> LedgerResult<PlayerBettingState>;

    /// Board cards; reverts with `COMMUNITY_CARDS_NOT_DEALT` before the flop
    async fn get_community_cards(&self, table_id: TableId) -> LedgerResult<CommunityCards>;

    /// Winner from the raw table record; zero address while undecided
    async fn get_table_winner(&self, table_id: TableId) -> LedgerResult<Option<Address>>;
}

/// State-changing contract calls
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContractCall {
    CreateTable {
        min_buy_in: Wei,
        max_players: u64,
        small_blind: Wei,
        big_blind: Wei,
    },
    JoinTable {
        table_id: TableId,
        buy_in: Wei,
    },
    Fold {
        table_id: TableId,
    },
    Check {
        table_id: TableId,
    },
    Call {
        table_id: TableId,
    },
    Raise {
        table_id: TableId,
        amount: Wei,
    },
    AdvanceGame {
        table_id: TableId,
    },
    StartNewRound {
        table_id: TableId,
    },
}

impl ContractCall {
    /// Contract method name
    pub fn method(&self) -> &'static str {
        match self {
            ContractCall::CreateTable { .. } => "createTable",
            ContractCall::JoinTable { .. } => "joinTable",
            ContractCall::Fold { .. } => "fold",
            ContractCall::Check { .. } => "check",
            ContractCall::Call { .. } => "call",
            ContractCall::Raise { .. } => "raise",
            ContractCall::AdvanceGame { .. } => "advanceGame",
            ContractCall::StartNewRound { .. } => "startNewRound",
        }
    }

    pub fn table_id(&self) -> Option<TableId> {
        match self {
            ContractCall::CreateTable { .. } => None,
            ContractCall::JoinTable { table_id, .. }
            | ContractCall::Fold { table_id }
            | ContractCall::Check { table_id }
            | ContractCall::Call { table_id }
            | ContractCall::Raise { table_id, .. }
            | ContractCall::AdvanceGame { table_id }
            | ContractCall::StartNewRound { table_id } => Some(*table_id),
        }
    }

    /// Value attached to the transaction (only the buy-in is payable).
    pub fn value(&self) -> Wei {
        match self {
            ContractCall::JoinTable { buy_in, .. } => *buy_in,
            _ => 0,
        }
    }
}

/// Confirmation of a mined transaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    pub tx_hash: TxHash,
    pub block_number: u64,
    /// Events emitted by the contract in this transaction
    pub events: Vec<LedgerEvent>,
}

impl Receipt {
    /// Table id assigned by a `createTable` transaction.
    pub fn created_table_id(&self) -> Option<TableId> {
        self.events.iter().find_map(|event| match event.kind {
            EventKind::TableCreated { .. } => Some(event.table_id),
            _ => None,
        })
    }
}

/// Calls made on behalf of the connected account
#[async_trait]
pub trait ContractSigner: Send + Sync {
    /// Address of the signing account
    fn identity(&self) -> &Address;

    /// Send a mutation; returns once the transaction is accepted
    async fn submit(&self, call: ContractCall) -> LedgerResult<TxHash>;

    /// Wait until the transaction is mined; reverts surface as errors
    async fn wait_for_receipt(&self, tx_hash: TxHash) -> LedgerResult<Receipt>;

    /// Encrypted hole-card handles of the signing account
    async fn get_my_hole_cards(&self, table_id: TableId) -> LedgerResult<[CiphertextHandle; 2]>;
}

/// Push notifications from the contract
#[async_trait]
pub trait EventSource: Send + Sync {
    /// Attach listeners for every poker event of `contract`.
    ///
    /// Dropping the receiver detaches the listeners.
    async fn subscribe(&self, contract: &Address) -> LedgerResult<mpsc::Receiver<LedgerEvent>>;
}
