//! Contract event subscription and refresh debouncing.

pub mod change_feed;
pub mod debounce;

pub use change_feed::ChangeFeed;
pub use debounce::{Debouncer, Trigger};
