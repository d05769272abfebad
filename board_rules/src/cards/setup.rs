//! Game setup: seats, hand sizes and face-up cards.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;

use super::{CardGroup, CardId, Deck, SOLUTION_SIZE};

pub const MIN_PLAYERS: usize = 2;
pub const MAX_PLAYERS: usize = 6;

/// Seat index of a player, in turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub usize);

impl PlayerId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "P{}", self.0)
    }
}

/// Errors raised while validating a game setup.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SetupError {
    #[error("Player count {count} is outside [{min}, {max}]", min = MIN_PLAYERS, max = MAX_PLAYERS)]
    PlayerCount { count: usize },

    #[error("Deck has no {group} card")]
    EmptyGroup { group: CardGroup },

    #[error("Expected {expected} face-up cards, got {actual}")]
    SharedCount { expected: usize, actual: usize },

    #[error("Hand has {actual} cards, expected {expected}")]
    HandSize { expected: usize, actual: usize },

    #[error("Card {card} is not in the deck")]
    UnknownCard { card: CardId },

    #[error("Card {card} is listed more than once")]
    DuplicateCard { card: CardId },
}

/// How the deck is dealt for a given number of players.
///
/// After the three solution cards are removed, the rest is dealt evenly; the
/// remainder of that division is laid face up for everyone to see.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameSetup {
    player_count: usize,
    deck_size: usize,
    hand_size: usize,
    shared: Vec<CardId>,
}

impl GameSetup {
    /// Compute hand sizes for `player_count` players and no face-up cards yet.
    pub fn new(deck: &Deck, player_count: usize) -> Result<Self, SetupError> {
        if !(MIN_PLAYERS..=MAX_PLAYERS).contains(&player_count) {
            return Err(SetupError::PlayerCount {
                count: player_count,
            });
        }
        for group in CardGroup::ALL {
            if deck.group(group).next().is_none() {
                return Err(SetupError::EmptyGroup { group });
            }
        }
        let dealt = deck.len() - SOLUTION_SIZE;
        Ok(Self {
            player_count,
            deck_size: deck.len(),
            hand_size: dealt / player_count,
            shared: Vec::new(),
        })
    }

    /// Attach the face-up cards. Their count must equal the deal remainder.
    pub fn with_shared(mut self, deck: &Deck, shared: Vec<CardId>) -> Result<Self, SetupError> {
        let expected = self.shared_count();
        if shared.len() != expected {
            return Err(SetupError::SharedCount {
                expected,
                actual: shared.len(),
            });
        }
        check_distinct(deck, &shared)?;
        self.shared = shared;
        Ok(self)
    }

    /// Number of players at the table.
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// All seats in turn order.
    pub fn players(&self) -> impl Iterator<Item = PlayerId> {
        (0..self.player_count).map(PlayerId)
    }

    /// Cards dealt to each player.
    pub fn hand_size(&self) -> usize {
        self.hand_size
    }

    /// Number of playable cards, solution included.
    pub fn deck_size(&self) -> usize {
        self.deck_size
    }

    /// How many cards are laid face up.
    pub fn shared_count(&self) -> usize {
        (self.deck_size - SOLUTION_SIZE) % self.player_count
    }

    /// The face-up cards.
    pub fn shared(&self) -> &[CardId] {
        &self.shared
    }

    /// Validate a dealt hand against this setup.
    pub fn check_hand(&self, deck: &Deck, hand: &[CardId]) -> Result<(), SetupError> {
        if hand.len() != self.hand_size {
            return Err(SetupError::HandSize {
                expected: self.hand_size,
                actual: hand.len(),
            });
        }
        check_distinct(deck, hand)?;
        if let Some(card) = hand.iter().find(|c| self.shared.contains(c)) {
            return Err(SetupError::DuplicateCard { card: *card });
        }
        Ok(())
    }
}

fn check_distinct(deck: &Deck, cards: &[CardId]) -> Result<(), SetupError> {
    let mut seen = HashSet::new();
    for &card in cards {
        if deck.get(card).is_none() {
            return Err(SetupError::UnknownCard { card });
        }
        if !seen.insert(card) {
            return Err(SetupError::DuplicateCard { card });
        }
    }
    Ok(())
}
