//! Contract events.
//!
//! Every event the poker contract emits carries the table it concerns as an
//! indexed topic. The table id is therefore a mandatory field of
//! [`LedgerEvent`] rather than something each handler digs out of the payload.

use super::types::{Address, TableId};
use crate::{amount::Wei, table::Street};
use serde::{Deserialize, Serialize};

/// Event payloads, one variant per contract event
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    TableCreated {
        creator: Address,
        min_buy_in: Wei,
        max_players: u64,
    },
    PlayerJoined {
        player: Address,
        buy_in: Wei,
    },
    CountdownStarted {
        start_time: u64,
    },
    GameStarted {
        round: u64,
    },
    CardsDealt {
        player: Address,
    },
    FlopDealt,
    TurnDealt,
    RiverDealt,
    StreetAdvanced {
        new_street: Street,
    },
    PlayerFolded {
        player: Address,
    },
    PlayerCalled {
        player: Address,
        amount: Wei,
    },
    PlayerRaised {
        player: Address,
        amount: Wei,
    },
    PlayerChecked {
        player: Address,
    },
    PlayerAllIn {
        player: Address,
        amount: Wei,
    },
    GameFinished {
        winner: Address,
    },
    PlayerLeft {
        player: Address,
    },
}

impl EventKind {
    /// Contract-side event name.
    pub fn name(&self) -> &'static str {
        match self {
            EventKind::TableCreated { .. } => "TableCreated",
            EventKind::PlayerJoined { .. } => "PlayerJoined",
            EventKind::CountdownStarted { .. } => "CountdownStarted",
            EventKind::GameStarted { .. } => "GameStarted",
            EventKind::CardsDealt { .. } => "CardsDealt",
            EventKind::FlopDealt => "FlopDealt",
            EventKind::TurnDealt => "TurnDealt",
            EventKind::RiverDealt => "RiverDealt",
            EventKind::StreetAdvanced { .. } => "StreetAdvanced",
            EventKind::PlayerFolded { .. } => "PlayerFolded",
            EventKind::PlayerCalled { .. } => "PlayerCalled",
            EventKind::PlayerRaised { .. } => "PlayerRaised",
            EventKind::PlayerChecked { .. } => "PlayerChecked",
            EventKind::PlayerAllIn { .. } => "PlayerAllIn",
            EventKind::GameFinished { .. } => "GameFinished",
            EventKind::PlayerLeft { .. } => "PlayerLeft",
        }
    }
}

/// An event scoped to one table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LedgerEvent {
    pub table_id: TableId,
    #[serde(flatten)]
    pub kind: EventKind,
}

impl LedgerEvent {
    pub fn new(table_id: TableId, kind: EventKind) -> Self {
        Self { table_id, kind }
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_json_shape() {
        let event = LedgerEvent::new(4, EventKind::FlopDealt);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["table_id"], 4);
        assert_eq!(json["type"], "flop_dealt");
        assert_eq!(event.name(), "FlopDealt");
    }
}
