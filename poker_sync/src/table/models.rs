//! Table data models.
//!
//! Every record here is replaced wholesale when a fresh read arrives; nothing
//! is edited in place.

use crate::{
    amount::Wei,
    cards::Card,
    ledger::{Address, TableId},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Table lifecycle as reported by the contract
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameState {
    Waiting,
    Countdown,
    Playing,
    Finished,
}

impl std::fmt::Display for GameState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GameState::Waiting => write!(f, "Waiting for Players"),
            GameState::Countdown => write!(f, "Countdown"),
            GameState::Playing => write!(f, "Playing"),
            GameState::Finished => write!(f, "Finished"),
        }
    }
}

/// Betting street
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Street {
    #[default]
    PreFlop,
    Flop,
    Turn,
    River,
    Showdown,
}

impl Street {
    /// Community cards face up on this street.
    pub fn visible_card_count(self) -> usize {
        match self {
            Street::PreFlop => 0,
            Street::Flop => 3,
            Street::Turn => 4,
            Street::River | Street::Showdown => 5,
        }
    }
}

impl std::fmt::Display for Street {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Street::PreFlop => write!(f, "Pre-Flop"),
            Street::Flop => write!(f, "Flop"),
            Street::Turn => write!(f, "Turn"),
            Street::River => write!(f, "River"),
            Street::Showdown => write!(f, "Showdown"),
        }
    }
}

/// Raw result of the contract's table-state read
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableStateRecord {
    pub state: GameState,
    pub num_players: u64,
    pub max_players: u64,
    pub min_buy_in: Wei,
    pub countdown_start: u64,
    pub countdown_duration: u64,
    pub current_round: u64,
    pub is_seated: bool,
}

/// Last known state of one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableSnapshot {
    pub table_id: TableId,
    pub game_state: GameState,
    pub num_players: u64,
    pub max_players: u64,
    pub min_buy_in: Wei,
    /// Unix seconds
    pub countdown_start: u64,
    /// Seconds
    pub countdown_duration: u64,
    pub current_round: u64,
    pub winner: Option<Address>,
    pub is_seated: bool,
}

impl TableSnapshot {
    pub fn from_record(table_id: TableId, record: TableStateRecord, winner: Option<Address>) -> Self {
        Self {
            table_id,
            game_state: record.state,
            num_players: record.num_players,
            max_players: record.max_players,
            min_buy_in: record.min_buy_in,
            countdown_start: record.countdown_start,
            countdown_duration: record.countdown_duration,
            current_round: record.current_round,
            winner,
            is_seated: record.is_seated,
        }
    }

    /// Seconds left on the start countdown at `now` (unix seconds).
    pub fn countdown_remaining(&self, now: u64) -> Option<u64> {
        if self.game_state != GameState::Countdown {
            return None;
        }
        let ends_at = self.countdown_start.saturating_add(self.countdown_duration);
        Some(ends_at.saturating_sub(now))
    }

    pub fn is_full(&self) -> bool {
        self.num_players >= self.max_players
    }
}

/// Pot and turn information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BettingInfo {
    pub pot: Wei,
    pub current_bet: Wei,
    pub current_player: Address,
    pub current_player_index: u64,
}

/// One player's betting position
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerBettingState {
    pub chips: Wei,
    pub current_bet: Wei,
    pub total_bet: Wei,
    pub has_folded: bool,
    pub has_acted: bool,
    pub is_current_player: bool,
}

/// Board cards and the street they belong to.
///
/// Before the flop the contract refuses the read outright; that refusal is
/// stored as [`CommunityCards::not_dealt`], which is present but all zero. Card
/// value 0 is a real card (Two of Hearts), so callers decide what is face up
/// from `current_street`, never from the card values.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityCards {
    pub current_street: Street,
    pub flop_card1: u8,
    pub flop_card2: u8,
    pub flop_card3: u8,
    pub turn_card: u8,
    pub river_card: u8,
}

impl CommunityCards {
    pub fn not_dealt() -> Self {
        Self::default()
    }

    pub fn raw(&self) -> [u8; 5] {
        [
            self.flop_card1,
            self.flop_card2,
            self.flop_card3,
            self.turn_card,
            self.river_card,
        ]
    }

    /// Cards face up on the current street; invalid values are skipped.
    pub fn visible_cards(&self) -> Vec<Card> {
        self.raw()
            .into_iter()
            .take(self.current_street.visible_card_count())
            .filter_map(|value| Card::try_from(value).ok())
            .collect()
    }
}

/// Read-only copy of everything cached for the tracked table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TableView {
    pub table_id: Option<TableId>,
    pub table_state: Option<TableSnapshot>,
    pub betting_info: Option<BettingInfo>,
    pub players: Vec<Address>,
    pub player_states: HashMap<Address, PlayerBettingState>,
    pub community_cards: Option<CommunityCards>,
}

impl TableView {
    /// Membership by player list, which tracks the ledger more closely than `is_seated`.
    pub fn has_player(&self, address: &Address) -> bool {
        self.players.contains(address)
    }

    pub fn player_state(&self, address: &Address) -> Option<&PlayerBettingState> {
        self.player_states.get(address)
    }

    /// Amount `address` must add to match the current bet.
    pub fn amount_to_call(&self, address: &Address) -> Option<Wei> {
        let betting = self.betting_info.as_ref()?;
        let player = self.player_states.get(address)?;
        Some(betting.current_bet.saturating_sub(player.current_bet))
    }

    pub fn is_turn_of(&self, address: &Address) -> bool {
        self.betting_info
            .as_ref()
            .is_some_and(|betting| &betting.current_player == address)
    }
}
