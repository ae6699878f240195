//! Last-known state of the tracked table.
//!
//! The cache holds at most one table. Each field is replaced wholesale by the
//! refresh that fetched it, and every write carries a [`RefreshTicket`]. A
//! ticket records the table it was issued for, the tracking epoch and a
//! sequence number that grows with every refresh. Writes from a refresh that
//! started before the field's current value are dropped, as are writes for a
//! table that is no longer tracked, so a slow refresh can never overwrite
//! fresher data or leak into another table.

use super::models::{BettingInfo, CommunityCards, PlayerBettingState, TableSnapshot, TableView};
use crate::ledger::{Address, TableId};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Stamp carried by every write of one refresh
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RefreshTicket {
    pub table_id: TableId,
    epoch: u64,
    seq: u64,
}

impl RefreshTicket {
    pub fn seq(&self) -> u64 {
        self.seq
    }
}

#[derive(Debug, Clone)]
struct Stamped<T> {
    value: T,
    seq: u64,
}

/// Replace `slot` unless it already holds a value from a later refresh.
fn store<T>(slot: &mut Option<Stamped<T>>, seq: u64, value: T) -> bool {
    if slot.as_ref().is_some_and(|current| current.seq > seq) {
        return false;
    }
    *slot = Some(Stamped { value, seq });
    true
}

#[derive(Debug, Default)]
struct CacheState {
    table_id: Option<TableId>,
    epoch: u64,
    next_seq: u64,
    table_state: Option<Stamped<TableSnapshot>>,
    betting_info: Option<Stamped<BettingInfo>>,
    players: Option<Stamped<Vec<Address>>>,
    /// Sequence of the last full player-state replacement
    player_states_seq: u64,
    player_states: HashMap<Address, Stamped<PlayerBettingState>>,
    community_cards: Option<Stamped<CommunityCards>>,
}

impl CacheState {
    fn accepts(&self, ticket: &RefreshTicket) -> bool {
        self.table_id == Some(ticket.table_id) && self.epoch == ticket.epoch
    }

    fn clear(&mut self) {
        self.table_state = None;
        self.betting_info = None;
        self.players = None;
        self.player_states_seq = 0;
        self.player_states.clear();
        self.community_cards = None;
    }
}

/// Shared snapshot of one table
#[derive(Debug, Default)]
pub struct TableCache {
    state: RwLock<CacheState>,
}

impl TableCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently tracked table, if any
    pub async fn tracked_table(&self) -> Option<TableId> {
        self.state.read().await.table_id
    }

    /// Track a different table (or none).
    ///
    /// Every cached field is cleared under one write lock, so readers observe
    /// either the old table's data or an empty cache for the new one.
    /// Returns `false` when `table_id` is already tracked.
    pub async fn switch_table(&self, table_id: Option<TableId>) -> bool {
        let mut state = self.state.write().await;
        if state.table_id == table_id {
            return false;
        }
        log::debug!("Cache switching from {:?} to {:?}", state.table_id, table_id);
        state.table_id = table_id;
        state.epoch += 1;
        state.clear();
        true
    }

    /// Issue a ticket for a refresh of `table_id`.
    ///
    /// Returns `None` when that table is not the tracked one.
    pub async fn begin_refresh(&self, table_id: TableId) -> Option<RefreshTicket> {
        let mut state = self.state.write().await;
        if state.table_id != Some(table_id) {
            return None;
        }
        state.next_seq += 1;
        Some(RefreshTicket {
            table_id,
            epoch: state.epoch,
            seq: state.next_seq,
        })
    }

    pub async fn apply_table_state(&self, ticket: &RefreshTicket, snapshot: TableSnapshot) -> bool {
        let mut state = self.state.write().await;
        let applied = state.accepts(ticket) && store(&mut state.table_state, ticket.seq, snapshot);
        log_discard(ticket, "table state", applied);
        applied
    }

    pub async fn apply_betting_info(&self, ticket: &RefreshTicket, betting: BettingInfo) -> bool {
        let mut state = self.state.write().await;
        let applied = state.accepts(ticket) && store(&mut state.betting_info, ticket.seq, betting);
        log_discard(ticket, "betting info", applied);
        applied
    }

    pub async fn apply_players(&self, ticket: &RefreshTicket, players: Vec<Address>) -> bool {
        let mut state = self.state.write().await;
        let applied = state.accepts(ticket) && store(&mut state.players, ticket.seq, players);
        log_discard(ticket, "players", applied);
        applied
    }

    pub async fn apply_community_cards(&self, ticket: &RefreshTicket, cards: CommunityCards) -> bool {
        let mut state = self.state.write().await;
        let applied = state.accepts(ticket) && store(&mut state.community_cards, ticket.seq, cards);
        log_discard(ticket, "community cards", applied);
        applied
    }

    /// Replace the whole player-state mapping.
    pub async fn apply_player_states(
        &self,
        ticket: &RefreshTicket,
        player_states: HashMap<Address, PlayerBettingState>,
    ) -> bool {
        let mut state = self.state.write().await;
        let applied = state.accepts(ticket) && state.player_states_seq <= ticket.seq;
        if applied {
            state.player_states_seq = ticket.seq;
            state.player_states = player_states
                .into_iter()
                .map(|(address, value)| (address, Stamped { value, seq: ticket.seq }))
                .collect();
        }
        log_discard(ticket, "player states", applied);
        applied
    }

    /// Replace one player's entry.
    pub async fn apply_player_state(
        &self,
        ticket: &RefreshTicket,
        address: Address,
        player_state: PlayerBettingState,
    ) -> bool {
        let mut state = self.state.write().await;
        let newer_than_entry = state
            .player_states
            .get(&address)
            .is_none_or(|current| current.seq <= ticket.seq);
        let applied = state.accepts(ticket)
            && state.player_states_seq <= ticket.seq
            && newer_than_entry;
        if applied {
            state.player_states.insert(
                address,
                Stamped {
                    value: player_state,
                    seq: ticket.seq,
                },
            );
        }
        log_discard(ticket, "player state", applied);
        applied
    }

    pub async fn table_state(&self) -> Option<TableSnapshot> {
        self.state.read().await.table_state.as_ref().map(|s| s.value.clone())
    }

    pub async fn betting_info(&self) -> Option<BettingInfo> {
        self.state.read().await.betting_info.as_ref().map(|s| s.value.clone())
    }

    /// Cached player list; empty when none has been fetched
    pub async fn players(&self) -> Vec<Address> {
        self.state
            .read()
            .await
            .players
            .as_ref()
            .map(|s| s.value.clone())
            .unwrap_or_default()
    }

    pub async fn player_state(&self, address: &Address) -> Option<PlayerBettingState> {
        self.state
            .read()
            .await
            .player_states
            .get(address)
            .map(|s| s.value.clone())
    }

    pub async fn community_cards(&self) -> Option<CommunityCards> {
        self.state.read().await.community_cards.as_ref().map(|s| s.value.clone())
    }

    /// Consistent copy of every cached field
    pub async fn snapshot(&self) -> TableView {
        let state = self.state.read().await;
        TableView {
            table_id: state.table_id,
            table_state: state.table_state.as_ref().map(|s| s.value.clone()),
            betting_info: state.betting_info.as_ref().map(|s| s.value.clone()),
            players: state
                .players
                .as_ref()
                .map(|s| s.value.clone())
                .unwrap_or_default(),
            player_states: state
                .player_states
                .iter()
                .map(|(address, s)| (address.clone(), s.value.clone()))
                .collect(),
            community_cards: state.community_cards.as_ref().map(|s| s.value.clone()),
        }
    }
}

fn log_discard(ticket: &RefreshTicket, field: &str, applied: bool) {
    if !applied {
        log::debug!(
            "Table {}: discarded stale {} from refresh #{}",
            ticket.table_id,
            field,
            ticket.seq
        );
    }
}
