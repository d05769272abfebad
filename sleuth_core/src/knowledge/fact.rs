//! Fact definitions - what the agent believes about each (player, card) pair.

use board_rules::{CardGroup, CardId, PlayerId};
use serde::{Deserialize, Serialize};

/// Belief about whether a player holds a card.
///
/// `Holding` and `NotHolding` are certain and never revert. The suspected
/// values are hints left behind by must-have-one constraints and may change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Fact {
    #[default]
    Unknown,
    Holding,
    NotHolding,
    SuspectedHolding,
    SuspectedNotHolding,
}

impl Fact {
    /// Whether the fact is settled.
    pub fn is_certain(self) -> bool {
        matches!(self, Fact::Holding | Fact::NotHolding)
    }

    /// Whether the fact is one of the suspected values.
    pub fn is_suspicion(self) -> bool {
        matches!(self, Fact::SuspectedHolding | Fact::SuspectedNotHolding)
    }

    /// One-character mark for notebook tables.
    pub fn mark(self) -> char {
        match self {
            Fact::Unknown => '.',
            Fact::Holding => 'X',
            Fact::NotHolding => '-',
            Fact::SuspectedHolding => '?',
            Fact::SuspectedNotHolding => '~',
        }
    }
}

/// Per-card summary maintained alongside the fact table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CardStatus {
    /// The card's whereabouts are settled: held by a known player, face up,
    /// or part of the solution.
    pub known: bool,
    /// Players with a certain fact about this card.
    pub known_count: usize,
    /// The card is part of the solution.
    pub correct: bool,
    /// The agent holds the card.
    pub mine: bool,
    /// The card lies face up for everyone.
    pub shared: bool,
}

/// A player holds at least one of `cards`, but nobody told us which.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MustHaveOne {
    pub player: PlayerId,
    pub cards: Vec<CardId>,
}

/// A single fact to record, as queued by the propagation worklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Derivation {
    pub player: PlayerId,
    pub card: CardId,
    pub fact: Fact,
}

impl Derivation {
    pub fn new(player: PlayerId, card: CardId, fact: Fact) -> Self {
        Self { player, card, fact }
    }
}

/// The deduced solution; each group is filled in once it is certain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Solution {
    pub suspect: Option<CardId>,
    pub weapon: Option<CardId>,
    pub room: Option<CardId>,
}

impl Solution {
    /// All three cards are known.
    pub fn is_complete(&self) -> bool {
        self.suspect.is_some() && self.weapon.is_some() && self.room.is_some()
    }

    /// The deduced card of `group`, if any.
    pub fn card(&self, group: CardGroup) -> Option<CardId> {
        match group {
            CardGroup::Suspect => self.suspect,
            CardGroup::Weapon => self.weapon,
            CardGroup::Room => self.room,
        }
    }
}
