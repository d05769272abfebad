//! Card definitions: the three disjoint groups and the deck built from them.

mod setup;

pub use setup::*;

use serde::{Deserialize, Serialize};

/// Number of cards sealed in the solution envelope (one per group).
pub const SOLUTION_SIZE: usize = 3;

/// The three disjoint card groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum CardGroup {
    Suspect,
    Weapon,
    Room,
}

impl CardGroup {
    /// All groups in deck order.
    pub const ALL: [CardGroup; 3] = [CardGroup::Suspect, CardGroup::Weapon, CardGroup::Room];
}

impl std::fmt::Display for CardGroup {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CardGroup::Suspect => "suspect",
            CardGroup::Weapon => "weapon",
            CardGroup::Room => "room",
        };
        f.write_str(name)
    }
}

/// Dense index of a card inside its [`Deck`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub usize);

impl CardId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// An immutable playing card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub group: CardGroup,
}

/// The full, fixed set of playable cards.
///
/// Cards are stored in insertion order and identified by their position, so a
/// `CardId` is only meaningful together with the deck that issued it.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Create an empty deck.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a deck from suspect, weapon and room names, in that order.
    pub fn from_names<S, W, R>(suspects: S, weapons: W, rooms: R) -> Self
    where
        S: IntoIterator,
        S::Item: Into<String>,
        W: IntoIterator,
        W::Item: Into<String>,
        R: IntoIterator,
        R::Item: Into<String>,
    {
        let mut deck = Self::new();
        for name in suspects {
            deck.add(name, CardGroup::Suspect);
        }
        for name in weapons {
            deck.add(name, CardGroup::Weapon);
        }
        for name in rooms {
            deck.add(name, CardGroup::Room);
        }
        deck
    }

    /// The reference deck: six suspects, six weapons and the eight rooms that
    /// are not the accusation room.
    pub fn reference() -> Self {
        Self::from_names(
            [
                "Miss Scarlett",
                "Colonel Mustard",
                "Mrs White",
                "Reverend Green",
                "Mrs Peacock",
                "Professor Plum",
            ],
            ["Candlestick", "Dagger", "Lead Pipe", "Revolver", "Rope", "Spanner"],
            [
                "Kitchen",
                "Ballroom",
                "Conservatory",
                "Dining Room",
                "Billiard Room",
                "Library",
                "Lounge",
                "Study",
            ],
        )
    }

    /// Append a card and return its id.
    pub fn add(&mut self, name: impl Into<String>, group: CardGroup) -> CardId {
        let id = CardId(self.cards.len());
        self.cards.push(Card {
            id,
            name: name.into(),
            group,
        });
        id
    }

    /// Get a card by id.
    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.get(id.0)
    }

    /// Name of a card, or `"?"` for an id from another deck.
    pub fn name(&self, id: CardId) -> &str {
        self.get(id).map(|c| c.name.as_str()).unwrap_or("?")
    }

    /// Find a card by its exact name.
    pub fn find(&self, name: &str) -> Option<CardId> {
        self.cards.iter().find(|c| c.name == name).map(|c| c.id)
    }

    /// Group of a card, `None` for an id this deck did not issue.
    pub fn group_of(&self, id: CardId) -> Option<CardGroup> {
        self.get(id).map(|c| c.group)
    }

    /// All cards in deck order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Ids of every card.
    pub fn ids(&self) -> impl Iterator<Item = CardId> + '_ {
        self.cards.iter().map(|c| c.id)
    }

    /// Ids of the cards of one group, in deck order.
    pub fn group(&self, group: CardGroup) -> impl Iterator<Item = CardId> + '_ {
        self.cards
            .iter()
            .filter(move |c| c.group == group)
            .map(|c| c.id)
    }

    /// Number of cards.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Whether the deck has no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_deck_sizes() {
        let deck = Deck::reference();
        assert_eq!(deck.len(), 20);
        assert_eq!(deck.group(CardGroup::Suspect).count(), 6);
        assert_eq!(deck.group(CardGroup::Weapon).count(), 6);
        assert_eq!(deck.group(CardGroup::Room).count(), 8);
    }

    #[test]
    fn test_find_by_name() {
        let deck = Deck::reference();
        let rope = deck.find("Rope").unwrap();
        assert_eq!(deck.name(rope), "Rope");
        assert_eq!(deck.group_of(rope), Some(CardGroup::Weapon));
        assert!(deck.find("Cellar").is_none());
    }

    #[test]
    fn test_ids_are_dense() {
        let mut deck = Deck::new();
        let a = deck.add("A", CardGroup::Suspect);
        let b = deck.add("B", CardGroup::Room);
        assert_eq!(a, CardId(0));
        assert_eq!(b, CardId(1));
        assert_eq!(deck.ids().collect::<Vec<_>>(), vec![a, b]);
    }
}
