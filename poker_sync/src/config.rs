//! Session configuration management.
//!
//! Consolidates all environment variable reads and provides validated configuration.

use crate::ledger::Address;
use std::time::Duration;

/// Default refresh debounce window in milliseconds
pub const DEFAULT_REFRESH_DEBOUNCE_MS: u64 = 500;

/// Default validity of a decryption authorization in days
pub const DEFAULT_DECRYPT_AUTH_DAYS: u32 = 365;

/// Session configuration loaded from environment variables
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionConfig {
    /// Poker contract address; actions and reads are blocked without it
    pub contract_address: Option<Address>,
    /// Minimum spacing between event-triggered refreshes
    pub refresh_debounce: Duration,
    /// Validity requested for new decryption authorizations
    pub decrypt_auth_days: u32,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            contract_address: None,
            refresh_debounce: Duration::from_millis(DEFAULT_REFRESH_DEBOUNCE_MS),
            decrypt_auth_days: DEFAULT_DECRYPT_AUTH_DAYS,
        }
    }
}

impl SessionConfig {
    /// Load `.env` if present, then read the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        if let Err(e) = dotenvy::dotenv()
            && !e.not_found()
        {
            log::warn!("Failed to read .env file: {}", e);
        }
        let config = Self::from_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables
    ///
    /// # Returns
    ///
    /// * `Result<SessionConfig, ConfigError>` - Loaded configuration or error
    ///
    /// # Errors
    ///
    /// Returns error if a variable is present but cannot be parsed
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    ///
    /// # Arguments
    ///
    /// * `lookup` - Returns the value of a variable, or `None` when unset
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let contract_address = match lookup("POKER_CONTRACT_ADDRESS") {
            Some(value) if !value.trim().is_empty() => {
                Some(Address::parse(&value).map_err(|e| ConfigError::Invalid {
                    var: "POKER_CONTRACT_ADDRESS".to_string(),
                    reason: e.to_string(),
                })?)
            }
            _ => None,
        };

        let debounce_ms = parse_var_or(
            &lookup,
            "POKER_REFRESH_DEBOUNCE_MS",
            DEFAULT_REFRESH_DEBOUNCE_MS,
        )?;

        Ok(SessionConfig {
            contract_address,
            refresh_debounce: Duration::from_millis(debounce_ms),
            decrypt_auth_days: parse_var_or(
                &lookup,
                "POKER_DECRYPT_AUTH_DAYS",
                DEFAULT_DECRYPT_AUTH_DAYS,
            )?,
        })
    }

    /// Validate configuration after loading
    ///
    /// # Returns
    ///
    /// * `Result<(), ConfigError>` - Success or validation error
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.refresh_debounce.is_zero() {
            return Err(ConfigError::Invalid {
                var: "POKER_REFRESH_DEBOUNCE_MS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        if self.decrypt_auth_days == 0 {
            return Err(ConfigError::Invalid {
                var: "POKER_DECRYPT_AUTH_DAYS".to_string(),
                reason: "Must be greater than 0".to_string(),
            });
        }

        Ok(())
    }

    /// Contract address, or the error explaining that it is missing
    pub fn require_contract(&self) -> Result<&Address, ConfigError> {
        self.contract_address
            .as_ref()
            .ok_or_else(|| ConfigError::MissingRequired {
                var: "POKER_CONTRACT_ADDRESS".to_string(),
                hint: "Set it to the deployed poker contract address".to_string(),
            })
    }
}

/// Configuration error types
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {var}\nHint: {hint}")]
    MissingRequired { var: String, hint: String },

    #[error("Invalid configuration for {var}: {reason}")]
    Invalid { var: String, reason: String },
}

/// Parse a variable, falling back to `default` when it is unset
fn parse_var_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value.trim().parse().map_err(|_| ConfigError::Invalid {
            var: key.to_string(),
            reason: format!("'{value}' is not a valid number"),
        }),
    }
}
