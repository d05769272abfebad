//! Turn strategy - where to go this turn, and what to do once there.
//!
//! A turn runs through [`TurnPhase`]s in order:
//!
//! ```text
//! AwaitingTurn -> Rolling | UsingPassage -> Moving -> Questioning | Accusing -> Done
//! ```
//!
//! Each call on [`TurnStrategy`] checks the phase it expects, so an
//! out-of-order call is an error instead of a silently wrong plan.

mod disclosure;

pub use disclosure::*;

use board_rules::{Board, CardGroup, CardId, Location, RoomId};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RuleConfig;
use crate::knowledge::KnowledgeBase;
use crate::pathfinding::{Path, PathError, PathFinder};

#[derive(Debug, Error)]
pub enum StrategyError {
    #[error("Expected turn phase {expected:?}, but the turn is in {actual:?}")]
    UnexpectedPhase {
        expected: TurnPhase,
        actual: TurnPhase,
    },

    #[error("The agent is not standing in a room with a card")]
    NotInRoom,

    #[error("Room {room} has no secret passage")]
    NoPassage { room: RoomId },

    #[error("No {group} card left to ask about")]
    NoCandidate { group: CardGroup },

    #[error("Accusing needs the full solution and the accusation room")]
    NotReadyToAccuse,

    #[error(transparent)]
    Path(#[from] PathError),
}

/// Where the agent is within its own turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnPhase {
    AwaitingTurn,
    Rolling,
    UsingPassage,
    Moving,
    Questioning,
    Accusing,
    Done,
}

/// What the agent tells the game to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnCommand {
    Roll,
    #[serde(rename = "use-passage")]
    Passage,
    #[serde(rename = "pose-question")]
    Question,
    Accuse,
    Done,
}

impl TurnCommand {
    pub fn token(self) -> &'static str {
        match self {
            TurnCommand::Roll => "roll",
            TurnCommand::Passage => "use-passage",
            TurnCommand::Question => "pose-question",
            TurnCommand::Accuse => "accuse",
            TurnCommand::Done => "done",
        }
    }
}

impl std::fmt::Display for TurnCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.token())
    }
}

/// A question to pose in the current room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Suggestion {
    pub suspect: CardId,
    pub weapon: CardId,
    pub room: CardId,
}

/// The final accusation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accusation {
    pub suspect: CardId,
    pub weapon: CardId,
    pub room: CardId,
}

/// The movement chosen for a roll.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MovePlan {
    /// Direction tokens, with a door number when leaving a multi-door room.
    pub moves: String,
    pub path: Path,
    /// Where the pawn ends up.
    pub destination: Location,
}

#[derive(Debug, Clone)]
pub struct TurnStrategy {
    rules: RuleConfig,
    phase: TurnPhase,
    position: Option<Location>,
    /// Room the agent wants to question in.
    target: Option<RoomId>,
    /// Room the agent is walking to; differs from `target` when a passage
    /// into the target is closer than the target itself.
    goal: Option<RoomId>,
    last_questioned: Option<RoomId>,
}

impl TurnStrategy {
    pub fn new(rules: RuleConfig) -> Self {
        Self {
            rules,
            phase: TurnPhase::AwaitingTurn,
            position: None,
            target: None,
            goal: None,
            last_questioned: None,
        }
    }

    pub fn rules(&self) -> &RuleConfig {
        &self.rules
    }

    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    pub fn position(&self) -> Option<Location> {
        self.position
    }

    pub fn target(&self) -> Option<RoomId> {
        self.target
    }

    pub fn goal(&self) -> Option<RoomId> {
        self.goal
    }

    pub fn last_questioned(&self) -> Option<RoomId> {
        self.last_questioned
    }

    /// Start a turn at `position`: choose the target room and the opening
    /// command.
    pub fn begin_turn(
        &mut self,
        knowledge: &KnowledgeBase,
        finder: &PathFinder<'_>,
        position: Location,
    ) -> Result<TurnCommand, StrategyError> {
        self.expect(TurnPhase::AwaitingTurn)?;
        let board = finder.board();
        let position = board.normalize(position);
        self.position = Some(position);

        let target = self.select_target(knowledge, finder, position);
        self.target = Some(target);
        self.goal = Some(target);
        info!(room = room_name(board, target), "turn target chosen");

        if position == Location::Room(target) {
            if target == board.accusation_room() && knowledge.solution().is_complete() {
                self.phase = TurnPhase::Accusing;
                return Ok(TurnCommand::Accuse);
            }
            if self.rules.requestion_in_room {
                self.phase = TurnPhase::Questioning;
                return Ok(TurnCommand::Question);
            }
        }

        if let Location::Room(current) = position {
            if let Some(passage) = board.room(current).and_then(|r| r.passage) {
                if self.prefer_passage(finder, current, passage, target) {
                    debug!(to = room_name(board, passage), "taking the passage");
                    self.phase = TurnPhase::UsingPassage;
                    return Ok(TurnCommand::Passage);
                }
            }
        }

        if let Some(entry) = self.passage_into(finder, position, target) {
            debug!(
                via = room_name(board, entry),
                "heading for the passage into the target"
            );
            self.goal = Some(entry);
        }

        self.phase = TurnPhase::Rolling;
        Ok(TurnCommand::Roll)
    }

    /// Plan the movement for a roll of `roll` steps.
    pub fn plan_move(
        &mut self,
        knowledge: &KnowledgeBase,
        finder: &PathFinder<'_>,
        roll: usize,
    ) -> Result<MovePlan, StrategyError> {
        self.expect(TurnPhase::Rolling)?;
        let board = finder.board();
        let position = self.current_position()?;
        let goal = self.goal.unwrap_or_else(|| board.accusation_room());

        let Some(mut path) = finder.shortest_path(position, Location::Room(goal)) else {
            warn!(goal = room_name(board, goal), "goal unreachable, staying put");
            self.phase = TurnPhase::Moving;
            return Ok(MovePlan {
                moves: String::new(),
                path: Path::default(),
                destination: position,
            });
        };

        if path.steps() > roll {
            let remaining = path.steps() - roll;
            if let Some(detour) = self.detour(knowledge, finder, position, goal, remaining, roll) {
                path = detour;
            }
        }
        path.truncate(roll);

        let moves = finder.movement_string(&path)?;
        let destination = path
            .end()
            .map(|end| board.normalize(Location::Tile(end)))
            .unwrap_or(position);
        debug!(%moves, steps = path.steps(), "movement planned");
        self.phase = TurnPhase::Moving;
        Ok(MovePlan {
            moves,
            path,
            destination,
        })
    }

    /// Move through the current room's secret passage.
    pub fn take_passage(
        &mut self,
        knowledge: &KnowledgeBase,
        board: &Board,
    ) -> Result<(RoomId, TurnCommand), StrategyError> {
        self.expect(TurnPhase::UsingPassage)?;
        let current = match self.current_position()? {
            Location::Room(room) => room,
            Location::Tile(_) => return Err(StrategyError::NotInRoom),
        };
        let destination = board
            .room(current)
            .and_then(|r| r.passage)
            .ok_or(StrategyError::NoPassage { room: current })?;
        let command = self.arrive(knowledge, board, Location::Room(destination));
        Ok((destination, command))
    }

    /// Record where the pawn stopped after moving.
    pub fn finish_move(
        &mut self,
        knowledge: &KnowledgeBase,
        board: &Board,
        position: Location,
    ) -> Result<TurnCommand, StrategyError> {
        self.expect(TurnPhase::Moving)?;
        Ok(self.arrive(knowledge, board, position))
    }

    /// Build the question for the room the agent stands in.
    ///
    /// For a group still open, the least known candidate is asked about. For a
    /// solved group the agent names a card of its own hand, which tells the
    /// other players nothing, or else the solved card.
    pub fn question(
        &mut self,
        knowledge: &KnowledgeBase,
        board: &Board,
    ) -> Result<Suggestion, StrategyError> {
        self.expect(TurnPhase::Questioning)?;
        let room_id = match self.current_position()? {
            Location::Room(room) => room,
            Location::Tile(_) => return Err(StrategyError::NotInRoom),
        };
        let room = board
            .room(room_id)
            .and_then(|r| r.card)
            .ok_or(StrategyError::NotInRoom)?;

        let suggestion = Suggestion {
            suspect: pick_card(knowledge, CardGroup::Suspect)?,
            weapon: pick_card(knowledge, CardGroup::Weapon)?,
            room,
        };
        let deck = knowledge.deck();
        info!(
            suspect = deck.name(suggestion.suspect),
            weapon = deck.name(suggestion.weapon),
            room = deck.name(room),
            "posing question"
        );
        self.last_questioned = Some(room_id);
        self.phase = TurnPhase::Done;
        Ok(suggestion)
    }

    /// The accusation, once the solution is complete and the agent stands in
    /// the accusation room.
    pub fn accusation(
        &mut self,
        knowledge: &KnowledgeBase,
        board: &Board,
    ) -> Result<Accusation, StrategyError> {
        self.expect(TurnPhase::Accusing)?;
        if self.current_position()? != Location::Room(board.accusation_room()) {
            return Err(StrategyError::NotReadyToAccuse);
        }
        let solution = knowledge.solution();
        let (Some(suspect), Some(weapon), Some(room)) =
            (solution.suspect, solution.weapon, solution.room)
        else {
            return Err(StrategyError::NotReadyToAccuse);
        };
        self.phase = TurnPhase::Done;
        Ok(Accusation {
            suspect,
            weapon,
            room,
        })
    }

    /// Close the turn from any phase.
    pub fn end_turn(&mut self) -> TurnCommand {
        self.phase = TurnPhase::AwaitingTurn;
        TurnCommand::Done
    }

    fn expect(&self, expected: TurnPhase) -> Result<(), StrategyError> {
        if self.phase != expected {
            return Err(StrategyError::UnexpectedPhase {
                expected,
                actual: self.phase,
            });
        }
        Ok(())
    }

    fn current_position(&self) -> Result<Location, StrategyError> {
        self.position.ok_or(StrategyError::UnexpectedPhase {
            expected: TurnPhase::AwaitingTurn,
            actual: self.phase,
        })
    }

    fn arrive(&mut self, knowledge: &KnowledgeBase, board: &Board, position: Location) -> TurnCommand {
        let position = board.normalize(position);
        self.position = Some(position);
        match position {
            Location::Room(room) if room == board.accusation_room() => {
                if knowledge.solution().is_complete() {
                    self.phase = TurnPhase::Accusing;
                    TurnCommand::Accuse
                } else {
                    self.phase = TurnPhase::Done;
                    TurnCommand::Done
                }
            }
            Location::Room(_) => {
                self.phase = TurnPhase::Questioning;
                TurnCommand::Question
            }
            Location::Tile(_) => {
                self.phase = TurnPhase::Done;
                TurnCommand::Done
            }
        }
    }

    fn select_target(
        &self,
        knowledge: &KnowledgeBase,
        finder: &PathFinder<'_>,
        position: Location,
    ) -> RoomId {
        let board = finder.board();
        if knowledge.solution().is_complete() {
            return board.accusation_room();
        }

        let current = match position {
            Location::Room(room) => Some(room),
            Location::Tile(_) => None,
        };
        let unresolved: Vec<RoomId> = knowledge
            .unresolved_rooms()
            .into_iter()
            .filter_map(|card| board.room_by_card(card))
            .map(|room| room.id)
            .collect();

        if self.rules.requestion_in_room {
            if let Some(room) = current.filter(|r| unresolved.contains(r)) {
                return room;
            }
        }

        let passage = current.and_then(|r| board.room(r)).and_then(|r| r.passage);
        let mut costed: Vec<(usize, RoomId)> = Vec::new();
        for &room in unresolved.iter().filter(|r| Some(**r) != current) {
            let cost = if Some(room) == passage {
                0
            } else if Some(room) == self.last_questioned {
                usize::MAX
            } else {
                match finder.distance(position, Location::Room(room)) {
                    Some(steps) => steps,
                    None => {
                        warn!(room = room_name(board, room), "room unreachable");
                        continue;
                    }
                }
            };
            costed.push((cost, room));
        }

        if let Some(&(best, _)) = costed.iter().min_by_key(|(cost, _)| *cost) {
            let tied: Vec<CardId> = costed
                .iter()
                .filter(|(cost, _)| *cost == best)
                .filter_map(|(_, room)| board.room(*room).and_then(|r| r.card))
                .collect();
            if let Some(room) = knowledge
                .least_known_room(&tied)
                .and_then(|card| board.room_by_card(card))
            {
                return room.id;
            }
        }

        self.fallback_target(knowledge, finder)
    }

    /// With every room settled, wait near the accusation room in a room the
    /// agent's own hand covers, or in the solution room.
    fn fallback_target(&self, knowledge: &KnowledgeBase, finder: &PathFinder<'_>) -> RoomId {
        let board = finder.board();
        let accusation = Location::Room(board.accusation_room());
        let mut rooms: Vec<RoomId> = knowledge
            .my_cards()
            .filter_map(|card| board.room_by_card(card))
            .map(|room| room.id)
            .collect();
        if let Some(room) = knowledge
            .solution()
            .room
            .and_then(|card| board.room_by_card(card))
        {
            rooms.push(room.id);
        }

        rooms
            .into_iter()
            .filter_map(|room| {
                finder
                    .distance(Location::Room(room), accusation)
                    .map(|steps| (steps, room))
            })
            .min_by_key(|(steps, _)| *steps)
            .map(|(_, room)| room)
            .unwrap_or_else(|| board.accusation_room())
    }

    /// Whether the passage out of `current` beats walking to `target` by more
    /// than an average roll.
    fn prefer_passage(
        &self,
        finder: &PathFinder<'_>,
        current: RoomId,
        passage: RoomId,
        target: RoomId,
    ) -> bool {
        if passage == target {
            return true;
        }
        if current == target {
            return false;
        }
        let direct = finder.distance(Location::Room(current), Location::Room(target));
        let via = finder.distance(Location::Room(passage), Location::Room(target));
        match (direct, via) {
            (Some(direct), Some(via)) => via + self.rules.average_roll < direct,
            (None, Some(_)) => true,
            _ => false,
        }
    }

    /// A room with a passage into `target` that is cheaper to reach, by more
    /// than an average roll, than `target` itself.
    fn passage_into(
        &self,
        finder: &PathFinder<'_>,
        position: Location,
        target: RoomId,
    ) -> Option<RoomId> {
        let board = finder.board();
        if position == Location::Room(target) {
            return None;
        }
        let direct = finder.distance(position, Location::Room(target));
        board
            .rooms()
            .iter()
            .filter(|room| room.passage == Some(target) && Location::Room(room.id) != position)
            .filter_map(|room| {
                finder
                    .distance(position, Location::Room(room.id))
                    .map(|steps| (steps, room.id))
            })
            .filter(|(steps, _)| match direct {
                Some(direct) => steps + self.rules.average_roll < direct,
                None => true,
            })
            .min_by_key(|(steps, _)| *steps)
            .map(|(_, room)| room)
    }

    /// An unresolved room reachable within `roll` from which the goal is
    /// closer than the `remaining` distance of the direct route.
    fn detour(
        &self,
        knowledge: &KnowledgeBase,
        finder: &PathFinder<'_>,
        position: Location,
        goal: RoomId,
        remaining: usize,
        roll: usize,
    ) -> Option<Path> {
        let board = finder.board();
        let mut best: Option<(usize, Path)> = None;
        for card in knowledge.unresolved_rooms() {
            let Some(room) = board.room_by_card(card) else {
                continue;
            };
            if room.id == goal || Location::Room(room.id) == position {
                continue;
            }
            let Some(hop) = finder.shortest_path(position, Location::Room(room.id)) else {
                continue;
            };
            if hop.steps() > roll {
                continue;
            }
            let Some(rest) = finder.distance(Location::Room(room.id), Location::Room(goal)) else {
                continue;
            };
            if rest < remaining && best.as_ref().map_or(true, |(b, _)| rest < *b) {
                best = Some((rest, hop));
            }
        }
        if let Some((rest, _)) = &best {
            debug!(rest, "detouring through an unresolved room");
        }
        best.map(|(_, hop)| hop)
    }
}

fn pick_card(knowledge: &KnowledgeBase, group: CardGroup) -> Result<CardId, StrategyError> {
    match knowledge.solution().card(group) {
        Some(solved) => Ok(knowledge
            .my_cards()
            .find(|c| knowledge.deck().group_of(*c) == Some(group))
            .unwrap_or(solved)),
        None => knowledge
            .least_known_card(group)
            .ok_or(StrategyError::NoCandidate { group }),
    }
}

fn room_name(board: &Board, room: RoomId) -> &str {
    board.room(room).map(|r| r.name.as_str()).unwrap_or("?")
}
