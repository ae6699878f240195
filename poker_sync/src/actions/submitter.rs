//! Submission of user actions to the contract.
//!
//! Every action follows the same protocol: check that a contract and signer
//! are bound, claim the session's single in-flight slot, submit, wait for the
//! receipt, then post the outcome to the status board. Errors never escape;
//! they come back as an [`ActionOutcome`].

use super::failure::{ActionFailure, ActionKind};
use crate::{
    amount::{AmountError, Wei, format_ether, parse_ether},
    ledger::{ContractCall, ContractSigner, LedgerResult, Receipt, TableId, TxHash},
    session::{InFlightGuard, SessionContext},
};
use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

/// Posted when an action is attempted without a contract or signer
pub const NOT_CONFIGURED_MESSAGE: &str = "Contract not deployed or signer not available";

/// Arguments of `createTable`, in wei
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CreateTableParams {
    pub min_buy_in: Wei,
    pub max_players: u64,
    pub small_blind: Wei,
    pub big_blind: Wei,
}

impl CreateTableParams {
    /// Build parameters from ether amounts as typed by the user
    ///
    /// # Arguments
    ///
    /// * `min_buy_in` - Minimum buy-in in ether (e.g. `"0.2"`)
    /// * `max_players` - Seat count
    /// * `small_blind` - Small blind in ether
    /// * `big_blind` - Big blind in ether
    ///
    /// # Returns
    ///
    /// * `Result<CreateTableParams, AmountError>` - Parameters or the first malformed amount
    pub fn from_ether(
        min_buy_in: &str,
        max_players: u64,
        small_blind: &str,
        big_blind: &str,
    ) -> Result<Self, AmountError> {
        Ok(Self {
            min_buy_in: parse_ether(min_buy_in)?,
            max_players,
            small_blind: parse_ether(small_blind)?,
            big_blind: parse_ether(big_blind)?,
        })
    }
}

/// Result of one action attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionOutcome {
    /// Transaction mined; `table_id` is the table to track after a create or join
    Confirmed {
        tx_hash: TxHash,
        table_id: Option<TableId>,
    },
    /// Join reverted because the account is already seated; the table is still usable
    AlreadySeated { table_id: TableId },
    /// Submission or confirmation failed
    Failed(ActionFailure),
    /// No contract or signer bound
    NotConfigured,
    /// Another action of this session is still in flight
    Busy,
}

impl ActionOutcome {
    pub fn is_success(&self) -> bool {
        matches!(
            self,
            ActionOutcome::Confirmed { .. } | ActionOutcome::AlreadySeated { .. }
        )
    }

    /// Table the caller should make current
    pub fn table_to_track(&self) -> Option<TableId> {
        match self {
            ActionOutcome::Confirmed { table_id, .. } => *table_id,
            ActionOutcome::AlreadySeated { table_id } => Some(*table_id),
            _ => None,
        }
    }

    pub fn failure(&self) -> Option<&ActionFailure> {
        match self {
            ActionOutcome::Failed(failure) => Some(failure),
            _ => None,
        }
    }
}

/// Submits actions for one session
pub struct ActionSubmitter {
    ctx: Arc<SessionContext>,
    in_flight: AtomicBool,
}

impl ActionSubmitter {
    pub fn new(ctx: Arc<SessionContext>) -> Self {
        Self {
            ctx,
            in_flight: AtomicBool::new(false),
        }
    }

    /// Whether an action is awaiting confirmation
    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    pub async fn create_table(&self, params: CreateTableParams) -> ActionOutcome {
        let call = ContractCall::CreateTable {
            min_buy_in: params.min_buy_in,
            max_players: params.max_players,
            small_blind: params.small_blind,
            big_blind: params.big_blind,
        };
        self.execute(ActionKind::CreateTable, call).await
    }

    pub async fn join_table(&self, table_id: TableId, buy_in: Wei) -> ActionOutcome {
        self.execute(ActionKind::JoinTable, ContractCall::JoinTable { table_id, buy_in })
            .await
    }

    pub async fn fold(&self, table_id: TableId) -> ActionOutcome {
        self.execute(ActionKind::Fold, ContractCall::Fold { table_id })
            .await
    }

    pub async fn check(&self, table_id: TableId) -> ActionOutcome {
        self.execute(ActionKind::Check, ContractCall::Check { table_id })
            .await
    }

    pub async fn call(&self, table_id: TableId) -> ActionOutcome {
        self.execute(ActionKind::Call, ContractCall::Call { table_id })
            .await
    }

    pub async fn raise(&self, table_id: TableId, amount: Wei) -> ActionOutcome {
        self.execute(ActionKind::Raise, ContractCall::Raise { table_id, amount })
            .await
    }

    pub async fn advance_game(&self, table_id: TableId) -> ActionOutcome {
        self.execute(ActionKind::AdvanceGame, ContractCall::AdvanceGame { table_id })
            .await
    }

    pub async fn start_new_round(&self, table_id: TableId) -> ActionOutcome {
        self.execute(ActionKind::StartNewRound, ContractCall::StartNewRound { table_id })
            .await
    }

    async fn execute(&self, kind: ActionKind, call: ContractCall) -> ActionOutcome {
        let status = self.ctx.status();

        let signer = match (self.ctx.contract_address(), self.ctx.signer()) {
            (Some(_), Some(signer)) => Arc::clone(signer),
            _ => {
                status.error(NOT_CONFIGURED_MESSAGE);
                return ActionOutcome::NotConfigured;
            }
        };

        let Some(_guard) = InFlightGuard::acquire(&self.in_flight) else {
            log::debug!("Ignoring {}: another action is in flight", call.method());
            return ActionOutcome::Busy;
        };

        status.info(kind.progress_message());
        match self.submit_and_wait(signer.as_ref(), call.clone()).await {
            Ok(receipt) => self.on_confirmed(kind, &call, receipt),
            Err(e) => {
                log::warn!("{} failed: {}", call.method(), e);
                self.on_failed(kind, &call, ActionFailure::classify(&e))
            }
        }
    }

    async fn submit_and_wait(
        &self,
        signer: &dyn ContractSigner,
        call: ContractCall,
    ) -> LedgerResult<Receipt> {
        let tx_hash = signer.submit(call).await?;
        self.ctx
            .status()
            .info(format!("Waiting for transaction: {tx_hash}"));
        signer.wait_for_receipt(tx_hash).await
    }

    fn on_confirmed(&self, kind: ActionKind, call: &ContractCall, receipt: Receipt) -> ActionOutcome {
        let status = self.ctx.status();
        let tx_hash = receipt.tx_hash;

        let table_id = match call {
            ContractCall::CreateTable { .. } => match receipt.created_table_id() {
                Some(table_id) => {
                    status.success(format!("Table created! ID: {table_id}"));
                    Some(table_id)
                }
                None => {
                    status.warning(format!(
                        "Transaction {tx_hash} confirmed but no TableCreated event was found"
                    ));
                    None
                }
            },
            ContractCall::JoinTable { table_id, .. } => {
                status.success(format!("Successfully joined table {table_id}!"));
                Some(*table_id)
            }
            ContractCall::Raise { amount, .. } => {
                status.success(format!("Raised {} ETH!", format_ether(*amount)));
                None
            }
            _ => {
                status.success(match kind {
                    ActionKind::Fold => "Folded!",
                    ActionKind::Check => "Checked!",
                    ActionKind::Call => "Called!",
                    ActionKind::AdvanceGame => "Game advanced! Loading table...",
                    _ => "New round started!",
                });
                None
            }
        };

        log::info!("{} confirmed in block {}", call.method(), receipt.block_number);
        ActionOutcome::Confirmed { tx_hash, table_id }
    }

    fn on_failed(&self, kind: ActionKind, call: &ContractCall, failure: ActionFailure) -> ActionOutcome {
        self.ctx
            .status()
            .post(failure.level(kind), failure.message(kind));

        match call {
            ContractCall::JoinTable { table_id, .. } if failure.is_soft(kind) => {
                ActionOutcome::AlreadySeated {
                    table_id: *table_id,
                }
            }
            _ => ActionOutcome::Failed(failure),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_from_ether() {
        let params = CreateTableParams::from_ether("0.2", 6, "0.005", "0.01").unwrap();
        assert_eq!(params.min_buy_in, 200_000_000_000_000_000);
        assert_eq!(params.small_blind, 5_000_000_000_000_000);
        assert_eq!(params.big_blind, 10_000_000_000_000_000);
        assert!(CreateTableParams::from_ether("abc", 6, "0.005", "0.01").is_err());
    }

    #[test]
    fn test_outcome_tracking() {
        let confirmed = ActionOutcome::Confirmed {
            tx_hash: TxHash([0; 32]),
            table_id: Some(4),
        };
        assert!(confirmed.is_success());
        assert_eq!(confirmed.table_to_track(), Some(4));
        assert_eq!(
            ActionOutcome::AlreadySeated { table_id: 2 }.table_to_track(),
            Some(2)
        );
        assert!(!ActionOutcome::Busy.is_success());
        assert_eq!(ActionOutcome::NotConfigured.table_to_track(), None);
    }
}
