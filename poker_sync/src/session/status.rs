//! User-facing status line.
//!
//! Actions, refreshes and decryption never return errors to their caller.
//! They report progress and outcome here instead, and the UI renders the
//! latest message.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;

/// Severity of a status message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One status line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusMessage {
    pub level: StatusLevel,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

impl StatusMessage {
    pub fn new(level: StatusLevel, text: impl Into<String>) -> Self {
        Self {
            level,
            text: text.into(),
            posted_at: Utc::now(),
        }
    }
}

/// Latest status message of a session
#[derive(Debug)]
pub struct StatusBoard {
    sender: watch::Sender<Option<StatusMessage>>,
}

impl Default for StatusBoard {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusBoard {
    pub fn new() -> Self {
        let (sender, _) = watch::channel(None);
        Self { sender }
    }

    /// Replace the current message.
    pub fn post(&self, level: StatusLevel, text: impl Into<String>) {
        let message = StatusMessage::new(level, text);
        match level {
            StatusLevel::Error => log::warn!("{}", message.text),
            _ => log::info!("{}", message.text),
        }
        self.sender.send_replace(Some(message));
    }

    pub fn info(&self, text: impl Into<String>) {
        self.post(StatusLevel::Info, text);
    }

    pub fn success(&self, text: impl Into<String>) {
        self.post(StatusLevel::Success, text);
    }

    pub fn warning(&self, text: impl Into<String>) {
        self.post(StatusLevel::Warning, text);
    }

    pub fn error(&self, text: impl Into<String>) {
        self.post(StatusLevel::Error, text);
    }

    pub fn clear(&self) {
        self.sender.send_replace(None);
    }

    pub fn current(&self) -> Option<StatusMessage> {
        self.sender.borrow().clone()
    }

    /// Watch for new messages
    pub fn subscribe(&self) -> watch::Receiver<Option<StatusMessage>> {
        self.sender.subscribe()
    }
}
