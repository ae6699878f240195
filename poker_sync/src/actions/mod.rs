//! User actions submitted as contract transactions.

pub mod failure;
pub mod submitter;

pub use failure::{ActionFailure, ActionKind};
pub use submitter::{ActionOutcome, ActionSubmitter, CreateTableParams, NOT_CONFIGURED_MESSAGE};
