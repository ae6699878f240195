//! Failure taxonomy for submitted actions.

use crate::{
    ledger::{LedgerError, RevertCode},
    session::StatusLevel,
};

/// User intents that become contract transactions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionKind {
    CreateTable,
    JoinTable,
    Fold,
    Check,
    Call,
    Raise,
    AdvanceGame,
    StartNewRound,
}

impl ActionKind {
    /// Verb used in generic failure messages
    pub fn verb(self) -> &'static str {
        match self {
            ActionKind::CreateTable => "create table",
            ActionKind::JoinTable => "join table",
            ActionKind::Fold => "fold",
            ActionKind::Check => "check",
            ActionKind::Call => "call",
            ActionKind::Raise => "raise",
            ActionKind::AdvanceGame => "advance game",
            ActionKind::StartNewRound => "start new round",
        }
    }

    /// Message posted while the transaction is being submitted
    pub fn progress_message(self) -> &'static str {
        match self {
            ActionKind::CreateTable => "Creating poker table...",
            ActionKind::JoinTable => "Joining table...",
            ActionKind::Fold => "Folding...",
            ActionKind::Check => "Checking...",
            ActionKind::Call => "Calling...",
            ActionKind::Raise => "Raising...",
            ActionKind::AdvanceGame => "Advancing game...",
            ActionKind::StartNewRound => "Starting new round...",
        }
    }
}

/// Classified reason an action did not go through
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ActionFailure {
    /// The contract rejected the call with a known rule code
    Rule(RevertCode),
    /// Anything else; carries the raw error text
    Other(String),
}

impl ActionFailure {
    /// Classify a ledger error
    pub fn classify(error: &LedgerError) -> Self {
        match error.revert_code() {
            Some(code) if code != RevertCode::CommunityCardsNotDealt => ActionFailure::Rule(code),
            _ => ActionFailure::Other(error.to_string()),
        }
    }

    pub fn code(&self) -> Option<RevertCode> {
        match self {
            ActionFailure::Rule(code) => Some(*code),
            ActionFailure::Other(_) => None,
        }
    }

    /// Joining a table the caller already sits at is reported as a warning
    pub fn is_soft(&self, kind: ActionKind) -> bool {
        kind == ActionKind::JoinTable && self.code() == Some(RevertCode::AlreadySeated)
    }

    pub fn level(&self, kind: ActionKind) -> StatusLevel {
        if self.is_soft(kind) {
            StatusLevel::Warning
        } else {
            StatusLevel::Error
        }
    }

    /// User-facing text for a failure of `kind`
    pub fn message(&self, kind: ActionKind) -> String {
        match self {
            ActionFailure::Rule(code) => match code {
                RevertCode::BuyInTooLow => "Min Buy-In must be at least 20× the Big Blind!".to_string(),
                RevertCode::InvalidBlinds => "Big Blind must be larger than Small Blind!".to_string(),
                RevertCode::InvalidMaxPlayers => "Max players must be between 2 and 10!".to_string(),
                RevertCode::InvalidBuyIn => "Buy-In amount must be greater than 0!".to_string(),
                RevertCode::AlreadySeated => "You are already seated at this table!".to_string(),
                RevertCode::TableFull => "This table is full. Try another table.".to_string(),
                RevertCode::InsufficientBuyIn => {
                    "Buy-in amount is too low for this table.".to_string()
                }
                RevertCode::CommunityCardsNotDealt => {
                    format!("Failed to {}: {}", kind.verb(), code)
                }
            },
            ActionFailure::Other(reason) => format!("Failed to {}: {}", kind.verb(), reason),
        }
    }
}
