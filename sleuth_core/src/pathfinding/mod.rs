//! Path finder - shortest routes across the board.
//!
//! A* over four-way grid moves with the Manhattan distance as heuristic. Only
//! corridor tiles are expanded: a room tile can only be the first tile of a
//! path (leaving through one of its doors) or the last one (entering it).

use board_rules::{Board, Coord, Location, RoomId, Tile};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap, HashSet};
use thiserror::Error;

/// Errors converting a path into a movement string.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PathError {
    #[error("Path steps from {from} to {to}, which are not adjacent")]
    NotAdjacent { from: Coord, to: Coord },

    #[error("Path leaves a room at {at}, which is not behind a door")]
    NotADoor { at: Coord },

    #[error("Door {number} of room '{room}' cannot be written as a single digit")]
    DoorNumberTooLarge { room: String, number: usize },
}

/// A sequence of orthogonally adjacent tiles, start included.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Path {
    tiles: Vec<Coord>,
}

impl Path {
    pub fn new(tiles: Vec<Coord>) -> Self {
        Self { tiles }
    }

    pub fn tiles(&self) -> &[Coord] {
        &self.tiles
    }

    /// Number of moves.
    pub fn steps(&self) -> usize {
        self.tiles.len().saturating_sub(1)
    }

    pub fn start(&self) -> Option<Coord> {
        self.tiles.first().copied()
    }

    pub fn end(&self) -> Option<Coord> {
        self.tiles.last().copied()
    }

    /// Keep only the first `steps` moves.
    pub fn truncate(&mut self, steps: usize) {
        self.tiles.truncate(steps + 1);
    }
}

/// Shortest-path queries over one board.
#[derive(Debug, Clone, Copy)]
pub struct PathFinder<'a> {
    board: &'a Board,
}

impl<'a> PathFinder<'a> {
    pub fn new(board: &'a Board) -> Self {
        Self { board }
    }

    pub fn board(&self) -> &'a Board {
        self.board
    }

    /// Shortest path between two tiles.
    ///
    /// Standing still is not a move, so `from == to` yields a two-step detour
    /// out and back, or `None` when there is nowhere to step.
    pub fn tile_path(&self, from: Coord, to: Coord) -> Option<Path> {
        if from == to {
            return self.tile_detour(from);
        }
        self.search(from, to)
    }

    /// Shortest path between two locations, trying every door of the rooms
    /// involved. `None` means the target cannot be reached.
    pub fn shortest_path(&self, from: Location, to: Location) -> Option<Path> {
        match (self.board.normalize(from), self.board.normalize(to)) {
            (Location::Tile(a), Location::Tile(b)) => self.tile_path(a, b),
            (Location::Tile(a), Location::Room(room)) => {
                self.shortest_between(&[a], &self.door_insides(room))
            }
            (Location::Room(room), Location::Tile(b)) => {
                self.shortest_between(&self.door_insides(room), &[b])
            }
            (Location::Room(a), Location::Room(b)) if a == b => self.room_detour(a),
            (Location::Room(a), Location::Room(b)) => {
                self.shortest_between(&self.door_insides(a), &self.door_insides(b))
            }
        }
    }

    /// Number of moves of the shortest path, if any.
    pub fn distance(&self, from: Location, to: Location) -> Option<usize> {
        self.shortest_path(from, to).map(|p| p.steps())
    }

    /// Encode a path as direction tokens.
    ///
    /// A path leaving a room with several doors starts with the 1-based
    /// number of the door used.
    pub fn movement_string(&self, path: &Path) -> Result<String, PathError> {
        let mut moves = String::with_capacity(path.tiles.len());
        if let Some(start) = path.start() {
            if let Some(room) = self.board.room_at(start).and_then(|id| self.board.room(id)) {
                let index = room
                    .door_by_inside(start)
                    .ok_or(PathError::NotADoor { at: start })?;
                if room.has_multiple_doors() {
                    let number = index + 1;
                    let digit = char::from_digit(number as u32, 10)
                        .filter(|_| number < 10)
                        .ok_or_else(|| PathError::DoorNumberTooLarge {
                            room: room.name.clone(),
                            number,
                        })?;
                    moves.push(digit);
                }
            }
        }
        for pair in path.tiles.windows(2) {
            let (from, to) = (pair[0], pair[1]);
            let direction = from
                .direction_to(to)
                .ok_or(PathError::NotAdjacent { from, to })?;
            moves.push(direction.token());
        }
        Ok(moves)
    }

    fn door_insides(&self, room: RoomId) -> Vec<Coord> {
        self.board
            .room(room)
            .map(|r| r.doors.iter().map(|d| d.inside).collect())
            .unwrap_or_default()
    }

    fn shortest_between(&self, starts: &[Coord], goals: &[Coord]) -> Option<Path> {
        let mut best: Option<Path> = None;
        for &start in starts {
            for &goal in goals {
                if start == goal {
                    continue;
                }
                if let Some(path) = self.search(start, goal) {
                    if best.as_ref().map_or(true, |b| path.steps() < b.steps()) {
                        best = Some(path);
                    }
                }
            }
        }
        best
    }

    fn tile_detour(&self, at: Coord) -> Option<Path> {
        if !self.board.is_corridor(at) {
            return None;
        }
        let next = self.board.corridor_neighbors(at).next()?;
        Some(Path::new(vec![at, next, at]))
    }

    fn room_detour(&self, room: RoomId) -> Option<Path> {
        let door = self.board.room(room)?.doors.first().copied()?;
        Some(Path::new(vec![door.inside, door.outside, door.inside]))
    }

    fn search(&self, start: Coord, goal: Coord) -> Option<Path> {
        if self.board.tile(start) == Tile::Blocked || self.board.tile(goal) == Tile::Blocked {
            return None;
        }

        let mut cost: HashMap<Coord, u32> = HashMap::from([(start, 0)]);
        let mut came_from: HashMap<Coord, Coord> = HashMap::new();
        let mut closed: HashSet<Coord> = HashSet::new();
        let mut frontier = BinaryHeap::new();
        // Insertion counter; equal estimates pop in insertion order.
        let mut sequence = 0u64;
        frontier.push(Reverse((start.manhattan(goal), sequence, start)));

        while let Some(Reverse((_, _, current))) = frontier.pop() {
            if current == goal {
                return Some(rebuild(&came_from, start, goal));
            }
            if !closed.insert(current) {
                continue;
            }
            let Some(&so_far) = cost.get(&current) else {
                continue;
            };
            for next in self.successors(current, start, goal) {
                let next_cost = so_far + 1;
                if cost.get(&next).map_or(true, |&known| next_cost < known) {
                    cost.insert(next, next_cost);
                    came_from.insert(next, current);
                    sequence += 1;
                    frontier.push(Reverse((next_cost + next.manhattan(goal), sequence, next)));
                }
            }
        }
        None
    }

    fn successors(&self, current: Coord, start: Coord, goal: Coord) -> Vec<Coord> {
        if let Some(room) = self.board.room_at(current).and_then(|id| self.board.room(id)) {
            if current != start {
                return Vec::new();
            }
            return room
                .doors
                .iter()
                .filter(|d| d.inside == current)
                .map(|d| d.outside)
                .collect();
        }

        let mut next: Vec<Coord> = self.board.corridor_neighbors(current).collect();
        if let Some(room) = self.board.room_at(goal).and_then(|id| self.board.room(id)) {
            if room
                .doors
                .iter()
                .any(|d| d.outside == current && d.inside == goal)
            {
                next.push(goal);
            }
        }
        next
    }
}

fn rebuild(came_from: &HashMap<Coord, Coord>, start: Coord, goal: Coord) -> Path {
    let mut tiles = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(&previous) => {
                tiles.push(previous);
                current = previous;
            }
            None => break,
        }
    }
    tiles.reverse();
    Path::new(tiles)
}
