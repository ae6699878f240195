//! Card encoding shared with the poker contract.
//!
//! The contract stores every card as a single integer in `0..52` computed as
//! `rank * 4 + suit`. Ranks run from Two (0) to Ace (12) and suits are ordered
//! Hearts, Diamonds, Clubs, Spades. This layout crosses the ledger boundary and
//! must not change.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Number of distinct encoded cards.
pub const DECK_SIZE: u8 = 52;

/// Raised when an encoded card falls outside `0..52`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("Invalid card value {0}: expected 0..{DECK_SIZE}")]
pub struct InvalidCard(pub u64);

/// Card suit in contract order.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Suit {
    Heart,
    Diamond,
    Club,
    Spade,
}

impl Suit {
    pub const ALL: [Suit; 4] = [Suit::Heart, Suit::Diamond, Suit::Club, Suit::Spade];

    pub fn index(self) -> u8 {
        self as u8
    }

    pub fn is_red(self) -> bool {
        matches!(self, Suit::Heart | Suit::Diamond)
    }
}

impl fmt::Display for Suit {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let repr = match self {
            Self::Heart => "♥",
            Self::Diamond => "♦",
            Self::Club => "♣",
            Self::Spade => "♠",
        };
        write!(f, "{repr}")
    }
}

/// Card rank, Two lowest.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
pub enum Rank {
    Two,
    Three,
    Four,
    Five,
    Six,
    Seven,
    Eight,
    Nine,
    Ten,
    Jack,
    Queen,
    King,
    Ace,
}

impl Rank {
    pub const ALL: [Rank; 13] = [
        Rank::Two,
        Rank::Three,
        Rank::Four,
        Rank::Five,
        Rank::Six,
        Rank::Seven,
        Rank::Eight,
        Rank::Nine,
        Rank::Ten,
        Rank::Jack,
        Rank::Queen,
        Rank::King,
        Rank::Ace,
    ];

    pub fn index(self) -> u8 {
        self as u8
    }

    /// Short label used on card faces ("2" through "10", then "J", "Q", "K", "A").
    pub fn symbol(self) -> &'static str {
        match self {
            Rank::Two => "2",
            Rank::Three => "3",
            Rank::Four => "4",
            Rank::Five => "5",
            Rank::Six => "6",
            Rank::Seven => "7",
            Rank::Eight => "8",
            Rank::Nine => "9",
            Rank::Ten => "10",
            Rank::Jack => "J",
            Rank::Queen => "Q",
            Rank::King => "K",
            Rank::Ace => "A",
        }
    }
}

/// A card in contract encoding.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Card(u8);

impl Card {
    pub fn new(rank: Rank, suit: Suit) -> Self {
        Self(rank.index() * 4 + suit.index())
    }

    /// Decode a raw contract value, accepting any integer width the ledger returns.
    pub fn decode(value: u64) -> Result<Self, InvalidCard> {
        if value < DECK_SIZE as u64 {
            Ok(Self(value as u8))
        } else {
            Err(InvalidCard(value))
        }
    }

    pub fn index(self) -> u8 {
        self.0
    }

    pub fn rank(self) -> Rank {
        Rank::ALL[(self.0 / 4) as usize]
    }

    pub fn suit(self) -> Suit {
        Suit::ALL[(self.0 % 4) as usize]
    }
}

impl TryFrom<u8> for Card {
    type Error = InvalidCard;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::decode(value as u64)
    }
}

impl From<Card> for u8 {
    fn from(card: Card) -> Self {
        card.0
    }
}

impl fmt::Display for Card {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}{}", self.rank().symbol(), self.suit())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_lowest_card() {
        let card = Card::decode(0).unwrap();
        assert_eq!(card.rank().symbol(), "2");
        assert_eq!(card.suit(), Suit::Heart);
    }

    #[test]
    fn test_decode_highest_card() {
        let card = Card::decode(51).unwrap();
        assert_eq!(card.rank().symbol(), "A");
        assert_eq!(card.suit(), Suit::Spade);
    }

    #[test]
    fn test_decode_rejects_out_of_range() {
        assert_eq!(Card::decode(52), Err(InvalidCard(52)));
        assert!(Card::try_from(255u8).is_err());
    }

    #[test]
    fn test_ten_and_suits() {
        // 8 * 4 + 2 = Ten of Clubs
        let card = Card::decode(34).unwrap();
        assert_eq!(card.rank(), Rank::Ten);
        assert_eq!(card.suit(), Suit::Club);
        assert_eq!(card.to_string(), "10♣");
        assert!(!card.suit().is_red());
        assert!(Card::new(Rank::Queen, Suit::Diamond).suit().is_red());
    }

    #[test]
    fn test_serde_uses_contract_value() {
        let card = Card::new(Rank::King, Suit::Spade);
        let json = serde_json::to_string(&card).unwrap();
        assert_eq!(json, "47");
        let back: Card = serde_json::from_str(&json).unwrap();
        assert_eq!(back, card);
        assert!(serde_json::from_str::<Card>("60").is_err());
    }
}
