//! Ledger error types.

use super::types::TxHash;
use thiserror::Error;

/// Revert reasons the poker contract is known to raise.
///
/// The contract reports rule violations as short upper-case tokens embedded in
/// the revert text. They are recognised once, when the error is built, so the
/// rest of the crate only ever matches on this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RevertCode {
    BuyInTooLow,
    InvalidBlinds,
    InvalidMaxPlayers,
    InvalidBuyIn,
    AlreadySeated,
    TableFull,
    InsufficientBuyIn,
    CommunityCardsNotDealt,
}

impl RevertCode {
    /// Codes in matching order; the first token found in a revert text wins.
    pub const ALL: [RevertCode; 8] = [
        RevertCode::BuyInTooLow,
        RevertCode::InvalidBlinds,
        RevertCode::InvalidMaxPlayers,
        RevertCode::InvalidBuyIn,
        RevertCode::AlreadySeated,
        RevertCode::TableFull,
        RevertCode::InsufficientBuyIn,
        RevertCode::CommunityCardsNotDealt,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RevertCode::BuyInTooLow => "BUY_IN_TOO_LOW",
            RevertCode::InvalidBlinds => "INVALID_BLINDS",
            RevertCode::InvalidMaxPlayers => "INVALID_MAX_PLAYERS",
            RevertCode::InvalidBuyIn => "INVALID_BUY_IN",
            RevertCode::AlreadySeated => "ALREADY_SEATED",
            RevertCode::TableFull => "TABLE_FULL",
            RevertCode::InsufficientBuyIn => "INSUFFICIENT_BUY_IN",
            RevertCode::CommunityCardsNotDealt => "COMMUNITY_CARDS_NOT_DEALT",
        }
    }

    /// Find the first known code mentioned in a revert text.
    pub fn find(text: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|code| text.contains(code.as_str()))
    }
}

impl std::fmt::Display for RevertCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Errors raised by remote reads, writes and subscriptions
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    /// The contract rejected the call
    #[error("Execution reverted: {reason}")]
    Reverted {
        reason: String,
        code: Option<RevertCode>,
    },

    /// The node or connection failed
    #[error("Transport error: {0}")]
    Transport(String),

    /// The wallet declined to sign
    #[error("User rejected the request")]
    Rejected,

    /// A submitted transaction never confirmed
    #[error("Transaction {0} was dropped before confirmation")]
    Dropped(TxHash),

    /// The response could not be decoded into the expected shape
    #[error("Malformed response: {0}")]
    Decode(String),

    /// Event listeners could not be attached
    #[error("Subscription failed: {0}")]
    Subscription(String),
}

impl LedgerError {
    /// Build a revert error, recognising any known code in the reason.
    pub fn reverted(reason: impl Into<String>) -> Self {
        let reason = reason.into();
        let code = RevertCode::find(&reason);
        LedgerError::Reverted { reason, code }
    }

    pub fn revert_code(&self) -> Option<RevertCode> {
        match self {
            LedgerError::Reverted { code, .. } => *code,
            _ => None,
        }
    }

    /// Whether this is the contract's "community cards not dealt yet" signal.
    pub fn is_not_dealt(&self) -> bool {
        self.revert_code() == Some(RevertCode::CommunityCardsNotDealt)
    }
}

/// Result type for ledger operations
pub type LedgerResult<T> = Result<T, LedgerError>;
