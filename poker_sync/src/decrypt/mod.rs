//! Hole-card decryption.

pub mod authorization;
pub mod manager;
#[cfg(any(test, feature = "test-util"))]
pub mod memory;
pub mod provider;

pub use authorization::{AuthorizationStore, DecryptionAuthorization};
pub use manager::{DecryptedCard, DecryptionSessionManager, RevealState};
#[cfg(any(test, feature = "test-util"))]
pub use memory::InMemoryDecryptor;
pub use provider::{DecryptError, DecryptionProvider};
