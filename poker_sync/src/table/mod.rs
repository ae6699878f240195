//! Cached table state and the reads that populate it.

pub mod cache;
pub mod models;
pub mod reader;

pub use cache::{RefreshTicket, TableCache};
pub use models::{
    BettingInfo, CommunityCards, GameState, PlayerBettingState, Street, TableSnapshot,
    TableStateRecord, TableView,
};
pub use reader::RemoteTableReader;
