//! Board definitions loaded from TOML.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::{Board, BoardError, Coord, Door, Room, RoomId, Tile};
use crate::cards::{CardGroup, Deck};

const REFERENCE_BOARD: &str = include_str!("../../boards/reference.toml");

/// Serialized form of a board.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardSpec {
    /// One string per row. `#` is blocked, `.` is corridor, any other
    /// character is the key of a room.
    pub layout: Vec<String>,
    pub rooms: Vec<RoomSpec>,
}

/// Serialized form of a room.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoomSpec {
    pub key: char,
    pub name: String,
    /// Name of the matching room card; defaults to the room name.
    #[serde(default)]
    pub card: Option<String>,
    /// Corridor tiles in front of each doorway, as `[row, col]`.
    #[serde(default)]
    pub doors: Vec<[i32; 2]>,
    /// Key of the room at the other end of the secret passage.
    #[serde(default)]
    pub passage: Option<char>,
    #[serde(default)]
    pub accusation: bool,
}

impl BoardSpec {
    /// Parse a board definition from TOML.
    pub fn from_toml_str(source: &str) -> Result<Self, BoardError> {
        Ok(toml::from_str(source)?)
    }
}

impl Board {
    /// Parse and validate a TOML board definition against `deck`.
    pub fn from_toml_str(source: &str, deck: &Deck) -> Result<Self, BoardError> {
        Self::from_spec(&BoardSpec::from_toml_str(source)?, deck)
    }

    /// The bundled reference board.
    pub fn reference(deck: &Deck) -> Result<Self, BoardError> {
        Self::from_toml_str(REFERENCE_BOARD, deck)
    }

    /// Build a board from its definition.
    ///
    /// Every room except the accusation room must map onto a room card of
    /// `deck`, and every room card must have a room.
    pub fn from_spec(spec: &BoardSpec, deck: &Deck) -> Result<Self, BoardError> {
        let rows = spec.layout.len();
        let cols = spec.layout.first().map(|r| r.chars().count()).unwrap_or(0);
        if rows == 0 || cols == 0 {
            return Err(BoardError::EmptyLayout);
        }

        let mut ids: HashMap<char, RoomId> = HashMap::new();
        for (index, room) in spec.rooms.iter().enumerate() {
            if ids.insert(room.key, RoomId(index)).is_some() {
                return Err(BoardError::DuplicateRoomKey { key: room.key });
            }
        }

        let mut tiles = Vec::with_capacity(rows * cols);
        let mut members: Vec<Vec<Coord>> = vec![Vec::new(); spec.rooms.len()];
        for (row, line) in spec.layout.iter().enumerate() {
            let width = line.chars().count();
            if width != cols {
                return Err(BoardError::RaggedRow {
                    row,
                    expected: cols,
                    actual: width,
                });
            }
            for (col, ch) in line.chars().enumerate() {
                let tile = match ch {
                    '#' => Tile::Blocked,
                    '.' => Tile::Corridor,
                    key => {
                        let id = *ids
                            .get(&key)
                            .ok_or(BoardError::UndeclaredRoomKey { key })?;
                        members[id.0].push(Coord::new(row as i32, col as i32));
                        Tile::Room(id)
                    }
                };
                tiles.push(tile);
            }
        }

        let mut board = Board {
            rows,
            cols,
            tiles,
            rooms: Vec::with_capacity(spec.rooms.len()),
            accusation_room: RoomId(0),
        };

        let accusation_rooms: Vec<usize> = spec
            .rooms
            .iter()
            .enumerate()
            .filter(|(_, r)| r.accusation)
            .map(|(i, _)| i)
            .collect();
        if accusation_rooms.len() != 1 {
            return Err(BoardError::AccusationRoomCount {
                count: accusation_rooms.len(),
            });
        }
        board.accusation_room = RoomId(accusation_rooms[0]);

        for (index, (room_spec, room_tiles)) in spec.rooms.iter().zip(members).enumerate() {
            let id = RoomId(index);
            if room_tiles.is_empty() {
                return Err(BoardError::EmptyRoom {
                    room: room_spec.name.clone(),
                });
            }

            let mut doors = Vec::with_capacity(room_spec.doors.len());
            for &[row, col] in &room_spec.doors {
                let outside = Coord::new(row, col);
                if !board.is_corridor(outside) {
                    return Err(BoardError::DoorNotCorridor {
                        room: room_spec.name.clone(),
                        at: outside,
                    });
                }
                let inside = outside
                    .neighbors()
                    .map(|(_, c)| c)
                    .find(|c| board.room_at(*c) == Some(id))
                    .ok_or(BoardError::DoorNotAdjacent {
                        room: room_spec.name.clone(),
                        at: outside,
                    })?;
                doors.push(Door { outside, inside });
            }

            let passage = match room_spec.passage {
                Some(key) => Some(*ids.get(&key).ok_or(BoardError::UnknownPassage {
                    room: room_spec.name.clone(),
                    key,
                })?),
                None => None,
            };

            let card = if room_spec.accusation {
                None
            } else {
                let card_name = room_spec.card.as_deref().unwrap_or(&room_spec.name);
                let card = deck
                    .find(card_name)
                    .filter(|c| deck.group_of(*c) == Some(CardGroup::Room))
                    .ok_or_else(|| BoardError::MissingRoomCard {
                        room: room_spec.name.clone(),
                        card: card_name.to_string(),
                    })?;
                Some(card)
            };

            board.rooms.push(Room {
                id,
                key: room_spec.key,
                name: room_spec.name.clone(),
                card,
                tiles: room_tiles,
                doors,
                passage,
                accusation: room_spec.accusation,
            });
        }

        for card in deck.group(CardGroup::Room) {
            if board.room_by_card(card).is_none() {
                return Err(BoardError::UnplacedRoomCard {
                    card: deck.name(card).to_string(),
                });
            }
        }

        Ok(board)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_deck() -> Deck {
        Deck::from_names(["Plum"], ["Rope"], ["Den"])
    }

    #[test]
    fn test_reference_board_loads() {
        let deck = Deck::reference();
        let board = Board::reference(&deck).unwrap();

        assert_eq!(board.rows(), 15);
        assert_eq!(board.cols(), 15);
        assert_eq!(board.rooms().len(), 9);

        let cellar = board.room(board.accusation_room()).unwrap();
        assert_eq!(cellar.name, "Cellar");
        assert!(cellar.card.is_none());

        let kitchen = board.room_by_name("Kitchen").unwrap();
        let study = board.room_by_name("Study").unwrap();
        assert_eq!(kitchen.passage, Some(study.id));
        assert_eq!(study.passage, Some(kitchen.id));
        assert_eq!(kitchen.card, deck.find("Kitchen"));
    }

    #[test]
    fn test_doors_resolve_inside_tiles() {
        let deck = Deck::reference();
        let board = Board::reference(&deck).unwrap();
        let billiard = board.room_by_name("Billiard Room").unwrap();
        assert_eq!(billiard.doors.len(), 2);
        assert_eq!(billiard.doors[0].inside, Coord::new(5, 11));
        assert_eq!(billiard.doors[1].inside, Coord::new(6, 12));
        assert!(billiard.has_multiple_doors());
    }

    #[test]
    fn test_door_must_touch_room() {
        let source = r#"
            layout = ["AA.", "...", "X.."]
            [[rooms]]
            key = "A"
            name = "Den"
            doors = [[2, 2]]
            [[rooms]]
            key = "X"
            name = "Vault"
            accusation = true
            doors = [[2, 1]]
        "#;
        let err = Board::from_toml_str(source, &small_deck()).unwrap_err();
        assert!(matches!(err, BoardError::DoorNotAdjacent { .. }));
    }

    #[test]
    fn test_layout_validation() {
        let ragged = r#"
            layout = ["AA.", ".."]
            [[rooms]]
            key = "A"
            name = "Den"
            accusation = true
        "#;
        assert!(matches!(
            Board::from_toml_str(ragged, &small_deck()),
            Err(BoardError::RaggedRow { row: 1, .. })
        ));

        let undeclared = r#"
            layout = ["AQ."]
            [[rooms]]
            key = "A"
            name = "Den"
        "#;
        assert!(matches!(
            Board::from_toml_str(undeclared, &small_deck()),
            Err(BoardError::UndeclaredRoomKey { key: 'Q' })
        ));

        let no_accusation = r#"
            layout = ["A.."]
            [[rooms]]
            key = "A"
            name = "Den"
            doors = [[0, 1]]
        "#;
        assert!(matches!(
            Board::from_toml_str(no_accusation, &small_deck()),
            Err(BoardError::AccusationRoomCount { count: 0 })
        ));
    }

    #[test]
    fn test_room_cards_must_be_placed() {
        let source = r#"
            layout = ["X.A"]
            [[rooms]]
            key = "X"
            name = "Vault"
            accusation = true
            doors = [[0, 1]]
            [[rooms]]
            key = "A"
            name = "Attic"
            doors = [[0, 1]]
        "#;
        let err = Board::from_toml_str(source, &small_deck()).unwrap_err();
        assert!(matches!(err, BoardError::MissingRoomCard { .. }));

        let only_vault = r#"
            layout = ["X.."]
            [[rooms]]
            key = "X"
            name = "Vault"
            accusation = true
            doors = [[0, 1]]
        "#;
        let err = Board::from_toml_str(only_vault, &small_deck()).unwrap_err();
        assert!(matches!(err, BoardError::UnplacedRoomCard { .. }));
    }
}
