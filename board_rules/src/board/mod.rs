//! Board topology: a grid of corridor, room and blocked tiles.
//!
//! Rooms are entered and left only through their doors. A door pairs the
//! corridor tile a pawn stands on with the room tile it steps onto.

mod layout;

pub use layout::*;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::cards::CardId;

/// Grid coordinate. Row 0 is the top edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Coord {
    pub row: i32,
    pub col: i32,
}

impl Coord {
    pub const fn new(row: i32, col: i32) -> Self {
        Self { row, col }
    }

    /// The neighbouring coordinate in `direction`.
    pub fn step(self, direction: Direction) -> Self {
        let (dr, dc) = direction.offset();
        Self::new(self.row + dr, self.col + dc)
    }

    /// Manhattan distance; an exact lower bound of moves on an open grid.
    pub fn manhattan(self, other: Coord) -> u32 {
        self.row.abs_diff(other.row) + self.col.abs_diff(other.col)
    }

    /// Direction leading to an orthogonally adjacent coordinate.
    pub fn direction_to(self, other: Coord) -> Option<Direction> {
        Direction::ALL.into_iter().find(|d| self.step(*d) == other)
    }

    /// The four neighbours, in [`Direction::ALL`] order.
    pub fn neighbors(self) -> impl Iterator<Item = (Direction, Coord)> {
        Direction::ALL.into_iter().map(move |d| (d, self.step(d)))
    }
}

impl std::fmt::Display for Coord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

/// The four cardinal movement directions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Single-character movement token.
    pub fn token(self) -> char {
        match self {
            Direction::Up => 'u',
            Direction::Down => 'd',
            Direction::Left => 'l',
            Direction::Right => 'r',
        }
    }

    /// Parse a movement token.
    pub fn from_token(token: char) -> Option<Self> {
        match token {
            'u' => Some(Direction::Up),
            'd' => Some(Direction::Down),
            'l' => Some(Direction::Left),
            'r' => Some(Direction::Right),
            _ => None,
        }
    }

    /// (row, col) delta.
    pub fn offset(self) -> (i32, i32) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }
}

/// Index of a room on its board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RoomId(pub usize);

impl std::fmt::Display for RoomId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "room#{}", self.0)
    }
}

/// What occupies a grid cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Tile {
    Corridor,
    Room(RoomId),
    Blocked,
}

/// A doorway between a corridor tile and a room tile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Door {
    /// Corridor tile in front of the doorway.
    pub outside: Coord,
    /// Room tile behind the doorway.
    pub inside: Coord,
}

/// A room of the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    /// Layout character of the room's tiles.
    pub key: char,
    pub name: String,
    /// The matching room card. `None` only for the accusation room.
    pub card: Option<CardId>,
    pub tiles: Vec<Coord>,
    /// Doors in declaration order; door numbers shown to players are 1-based.
    pub doors: Vec<Door>,
    /// Room reached by the secret passage, if any.
    pub passage: Option<RoomId>,
    /// Whether final accusations are made here.
    pub accusation: bool,
}

impl Room {
    /// Whether leaving this room needs a door number.
    pub fn has_multiple_doors(&self) -> bool {
        self.doors.len() > 1
    }

    /// Zero-based index of the door whose inside tile is `inside`.
    pub fn door_by_inside(&self, inside: Coord) -> Option<usize> {
        self.doors.iter().position(|d| d.inside == inside)
    }
}

/// Where a pawn can be: on a corridor tile or inside a room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Location {
    Tile(Coord),
    Room(RoomId),
}

/// Board errors: malformed layouts and invalid movement strings.
#[derive(Debug, Error)]
pub enum BoardError {
    #[error("Failed to parse board definition: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Board layout is empty")]
    EmptyLayout,

    #[error("Layout row {row} has {actual} columns, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        actual: usize,
    },

    #[error("Layout uses undeclared room key '{key}'")]
    UndeclaredRoomKey { key: char },

    #[error("Room key '{key}' is declared more than once")]
    DuplicateRoomKey { key: char },

    #[error("Room '{room}' has no tiles in the layout")]
    EmptyRoom { room: String },

    #[error("Door {at} of room '{room}' is not a corridor tile")]
    DoorNotCorridor { room: String, at: Coord },

    #[error("Door {at} of room '{room}' does not touch the room")]
    DoorNotAdjacent { room: String, at: Coord },

    #[error("Room '{room}' has a passage to undeclared room key '{key}'")]
    UnknownPassage { room: String, key: char },

    #[error("Board needs exactly one accusation room, found {count}")]
    AccusationRoomCount { count: usize },

    #[error("Room '{room}' has no matching room card '{card}'")]
    MissingRoomCard { room: String, card: String },

    #[error("Room card '{card}' has no room on the board")]
    UnplacedRoomCard { card: String },

    #[error("Unknown room {room}")]
    UnknownRoom { room: RoomId },

    #[error("Invalid movement token '{token}'")]
    InvalidToken { token: char },

    #[error("Move from {from} runs into {to}")]
    Obstructed { from: Coord, to: Coord },

    #[error("Room '{room}' has no door {number}")]
    NoSuchDoor { room: String, number: u32 },

    #[error("Leaving room '{room}' needs a door number")]
    MissingDoorNumber { room: String },

    #[error("Movement continues after entering room '{room}'")]
    MoveAfterEntering { room: String },
}

/// Immutable board topology.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Board {
    rows: usize,
    cols: usize,
    tiles: Vec<Tile>,
    rooms: Vec<Room>,
    accusation_room: RoomId,
}

impl Board {
    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// Tile at `coord`; anything off the grid is blocked.
    pub fn tile(&self, coord: Coord) -> Tile {
        if coord.row < 0 || coord.col < 0 {
            return Tile::Blocked;
        }
        let (row, col) = (coord.row as usize, coord.col as usize);
        if row >= self.rows || col >= self.cols {
            return Tile::Blocked;
        }
        self.tiles[row * self.cols + col]
    }

    pub fn is_corridor(&self, coord: Coord) -> bool {
        self.tile(coord) == Tile::Corridor
    }

    /// Room owning `coord`, if it is a room tile.
    pub fn room_at(&self, coord: Coord) -> Option<RoomId> {
        match self.tile(coord) {
            Tile::Room(id) => Some(id),
            _ => None,
        }
    }

    /// All rooms in declaration order.
    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn room(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id.0)
    }

    pub fn room_by_name(&self, name: &str) -> Option<&Room> {
        self.rooms.iter().find(|r| r.name == name)
    }

    /// Room whose card is `card`.
    pub fn room_by_card(&self, card: CardId) -> Option<&Room> {
        self.rooms.iter().find(|r| r.card == Some(card))
    }

    /// The room where accusations are made.
    pub fn accusation_room(&self) -> RoomId {
        self.accusation_room
    }

    /// Rewrite a tile location on a room tile as the room itself.
    pub fn normalize(&self, location: Location) -> Location {
        match location {
            Location::Tile(coord) => match self.room_at(coord) {
                Some(room) => Location::Room(room),
                None => location,
            },
            room => room,
        }
    }

    /// Corridor tiles orthogonally adjacent to `coord`.
    pub fn corridor_neighbors(&self, coord: Coord) -> impl Iterator<Item = Coord> + '_ {
        coord
            .neighbors()
            .map(|(_, c)| c)
            .filter(move |c| self.is_corridor(*c))
    }

    /// Replay a movement string from `start` and return every tile visited.
    ///
    /// Starting in a room, the first tile is the inside tile of the door used
    /// to leave it; an empty string from a room visits nothing. Entering a
    /// room ends the movement.
    pub fn follow(&self, start: Location, moves: &str) -> Result<Vec<Coord>, BoardError> {
        let mut visited = Vec::new();
        let mut position = match self.normalize(start) {
            Location::Tile(coord) => {
                visited.push(coord);
                Some(coord)
            }
            Location::Room(_) => None,
        };
        let mut room = match self.normalize(start) {
            Location::Room(id) => Some(id),
            Location::Tile(_) => None,
        };
        let mut door_number: Option<u32> = None;

        for token in moves.chars() {
            if let Some(digit) = token.to_digit(10) {
                let in_room = room
                    .filter(|_| position.is_none())
                    .ok_or(BoardError::InvalidToken { token })?;
                let current = self.room_or_err(in_room)?;
                if digit == 0 || digit as usize > current.doors.len() {
                    return Err(BoardError::NoSuchDoor {
                        room: current.name.clone(),
                        number: digit,
                    });
                }
                door_number = Some(digit);
                continue;
            }

            let direction = Direction::from_token(token).ok_or(BoardError::InvalidToken { token })?;
            match position {
                None => {
                    let Some(in_room) = room else {
                        return Err(BoardError::InvalidToken { token });
                    };
                    let current = self.room_or_err(in_room)?;
                    let door = match door_number.take() {
                        Some(number) => current.doors[number as usize - 1],
                        None if current.doors.len() == 1 => current.doors[0],
                        None => {
                            return Err(BoardError::MissingDoorNumber {
                                room: current.name.clone(),
                            })
                        }
                    };
                    if door.inside.step(direction) != door.outside {
                        return Err(BoardError::Obstructed {
                            from: door.inside,
                            to: door.inside.step(direction),
                        });
                    }
                    visited.push(door.inside);
                    visited.push(door.outside);
                    position = Some(door.outside);
                    room = None;
                }
                Some(from) => {
                    if let Some(entered) = room {
                        let current = self.room_or_err(entered)?;
                        return Err(BoardError::MoveAfterEntering {
                            room: current.name.clone(),
                        });
                    }
                    let to = from.step(direction);
                    match self.tile(to) {
                        Tile::Corridor => {
                            visited.push(to);
                            position = Some(to);
                        }
                        Tile::Room(id) => {
                            let target = self.room_or_err(id)?;
                            let through_door = target
                                .doors
                                .iter()
                                .any(|d| d.outside == from && d.inside == to);
                            if !through_door {
                                return Err(BoardError::Obstructed { from, to });
                            }
                            visited.push(to);
                            room = Some(id);
                        }
                        Tile::Blocked => return Err(BoardError::Obstructed { from, to }),
                    }
                }
            }
        }
        Ok(visited)
    }

    fn room_or_err(&self, id: RoomId) -> Result<&Room, BoardError> {
        self.room(id).ok_or(BoardError::UnknownRoom { room: id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Deck;

    #[test]
    fn test_coord_geometry() {
        let a = Coord::new(2, 3);
        assert_eq!(a.step(Direction::Up), Coord::new(1, 3));
        assert_eq!(a.manhattan(Coord::new(5, 1)), 5);
        assert_eq!(a.direction_to(Coord::new(2, 4)), Some(Direction::Right));
        assert_eq!(a.direction_to(Coord::new(3, 4)), None);
    }

    #[test]
    fn test_direction_tokens() {
        for direction in Direction::ALL {
            assert_eq!(Direction::from_token(direction.token()), Some(direction));
        }
        assert_eq!(Direction::from_token('x'), None);
    }

    #[test]
    fn test_off_grid_is_blocked() {
        let board = Board::reference(&Deck::reference()).unwrap();
        assert_eq!(board.tile(Coord::new(-1, 0)), Tile::Blocked);
        assert_eq!(board.tile(Coord::new(0, 99)), Tile::Blocked);
    }

    #[test]
    fn test_follow_corridor_and_enter_room() {
        let board = Board::reference(&Deck::reference()).unwrap();
        let kitchen = board.room_by_name("Kitchen").unwrap().id;

        // (3, 3) -> (3, 2) -> (3, 1) -> into the kitchen at (2, 1)
        let visited = board
            .follow(Location::Tile(Coord::new(3, 3)), "llu")
            .unwrap();
        assert_eq!(
            visited,
            vec![
                Coord::new(3, 3),
                Coord::new(3, 2),
                Coord::new(3, 1),
                Coord::new(2, 1)
            ]
        );
        assert_eq!(board.room_at(Coord::new(2, 1)), Some(kitchen));

        let err = board
            .follow(Location::Tile(Coord::new(3, 1)), "ur")
            .unwrap_err();
        assert!(matches!(err, BoardError::MoveAfterEntering { .. }));
    }

    #[test]
    fn test_follow_rejects_walls() {
        let board = Board::reference(&Deck::reference()).unwrap();
        // (3, 2) up is a kitchen tile without a door.
        let err = board
            .follow(Location::Tile(Coord::new(3, 2)), "u")
            .unwrap_err();
        assert!(matches!(err, BoardError::Obstructed { .. }));
    }

    #[test]
    fn test_follow_leaving_multi_door_room() {
        let board = Board::reference(&Deck::reference()).unwrap();
        let ballroom = board.room_by_name("Ballroom").unwrap().id;

        let err = board.follow(Location::Room(ballroom), "d").unwrap_err();
        assert!(matches!(err, BoardError::MissingDoorNumber { .. }));

        let visited = board.follow(Location::Room(ballroom), "2dr").unwrap();
        assert_eq!(
            visited,
            vec![Coord::new(2, 8), Coord::new(3, 8), Coord::new(3, 9)]
        );

        let err = board.follow(Location::Room(ballroom), "3d").unwrap_err();
        assert!(matches!(err, BoardError::NoSuchDoor { number: 3, .. }));
    }

    #[test]
    fn test_normalize_room_tile() {
        let board = Board::reference(&Deck::reference()).unwrap();
        let kitchen = board.room_by_name("Kitchen").unwrap().id;
        assert_eq!(
            board.normalize(Location::Tile(Coord::new(0, 0))),
            Location::Room(kitchen)
        );
        assert_eq!(
            board.normalize(Location::Tile(Coord::new(3, 0))),
            Location::Tile(Coord::new(3, 0))
        );
    }
}
