//! Ether amount conversion.
//!
//! The contract accounts in wei. Users type ether as decimal text, so buy-ins,
//! blinds and raises are converted here before they reach the ledger.

use thiserror::Error;

/// Amount in wei.
pub type Wei = u128;

/// Number of fractional digits in one ether.
pub const ETHER_DECIMALS: usize = 18;

const WEI_PER_ETHER: Wei = 1_000_000_000_000_000_000;

/// Errors produced while parsing an ether amount
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    #[error("Amount is empty")]
    Empty,

    #[error("Invalid amount '{0}': expected a non-negative decimal number")]
    Malformed(String),

    #[error("Invalid amount '{0}': at most {ETHER_DECIMALS} decimal places are allowed")]
    TooPrecise(String),

    #[error("Amount '{0}' is too large")]
    Overflow(String),
}

/// Parse decimal ether text (e.g. `"0.005"`) into wei.
pub fn parse_ether(text: &str) -> Result<Wei, AmountError> {
    let text = text.trim();
    if text.is_empty() {
        return Err(AmountError::Empty);
    }

    let (whole, fraction) = match text.split_once('.') {
        Some((whole, fraction)) => (whole, fraction),
        None => (text, ""),
    };

    if whole.is_empty() && fraction.is_empty() {
        return Err(AmountError::Malformed(text.to_string()));
    }
    if !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.chars().all(|c| c.is_ascii_digit())
    {
        return Err(AmountError::Malformed(text.to_string()));
    }
    if fraction.len() > ETHER_DECIMALS {
        return Err(AmountError::TooPrecise(text.to_string()));
    }

    let whole_wei = if whole.is_empty() {
        0
    } else {
        whole
            .parse::<Wei>()
            .ok()
            .and_then(|w| w.checked_mul(WEI_PER_ETHER))
            .ok_or_else(|| AmountError::Overflow(text.to_string()))?
    };

    let fraction_wei = if fraction.is_empty() {
        0
    } else {
        let padded = format!("{fraction:0<width$}", width = ETHER_DECIMALS);
        padded
            .parse::<Wei>()
            .map_err(|_| AmountError::Malformed(text.to_string()))?
    };

    whole_wei
        .checked_add(fraction_wei)
        .ok_or_else(|| AmountError::Overflow(text.to_string()))
}

/// Render wei as decimal ether text without trailing zeros.
pub fn format_ether(wei: Wei) -> String {
    let whole = wei / WEI_PER_ETHER;
    let fraction = wei % WEI_PER_ETHER;
    if fraction == 0 {
        return whole.to_string();
    }
    let digits = format!("{fraction:0>width$}", width = ETHER_DECIMALS);
    format!("{whole}.{}", digits.trim_end_matches('0'))
}
