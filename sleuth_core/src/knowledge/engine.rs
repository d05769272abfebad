//! Knowledge engine - constraint propagation over "does player P hold card C".
//!
//! Every update is turned into [`Derivation`]s on a worklist. Applying one
//! derivation may queue more; once the queue drains, open must-have-one
//! constraints are re-evaluated, and their conclusions go back on the queue.
//! The loop ends when a full constraint pass derives nothing new.

use board_rules::{CardGroup, CardId, Deck, GameSetup, PlayerId, SetupError};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};

use super::{CardStatus, Derivation, Fact, MustHaveOne, Notebook, NotebookEntry, Solution};

/// Inconsistencies detected while recording facts.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KnowledgeError {
    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error("Unknown player {player}")]
    UnknownPlayer { player: PlayerId },

    #[error("Unknown card {card}")]
    UnknownCard { card: CardId },

    #[error("Cannot record {attempted:?} for {player} and card {card}: already {current:?}")]
    Contradiction {
        player: PlayerId,
        card: CardId,
        current: Fact,
        attempted: Fact,
    },

    #[error("Card {card} is held by both {first} and {second}")]
    MultipleHolders {
        card: CardId,
        first: PlayerId,
        second: PlayerId,
    },

    #[error("{player} would hold more than {hand_size} cards")]
    HandOverflow { player: PlayerId, hand_size: usize },

    #[error("{player} would hold fewer than {hand_size} cards")]
    HandUnderflow { player: PlayerId, hand_size: usize },

    #[error("Card {card} is part of the solution and cannot be held")]
    HeldSolution { card: CardId },

    #[error("Cards {first} and {second} cannot both be the {group} solution")]
    SecondSolution {
        group: CardGroup,
        first: CardId,
        second: CardId,
    },

    #[error("No {group} card is left to be the solution")]
    NoSolutionCandidate { group: CardGroup },

    #[error("Card {card} is not the solution but no player can hold it")]
    NoHolder { card: CardId },

    #[error("{player} must hold one of {cards:?} but holds none of them")]
    Unsatisfiable { player: PlayerId, cards: Vec<CardId> },

    #[error("Constraint for {player} lists no cards")]
    EmptyConstraint { player: PlayerId },
}

/// Mutable part of the knowledge base, cloned for rollback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct KnowledgeState {
    /// Row-major `player × card` fact table.
    facts: Vec<Fact>,
    statuses: Vec<CardStatus>,
    constraints: Vec<MustHaveOne>,
}

/// The agent's beliefs about every card.
///
/// Updates are transactional: an update that hits a contradiction returns an
/// error and leaves the knowledge base as it was before the call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeBase {
    deck: Deck,
    setup: GameSetup,
    me: PlayerId,
    state: KnowledgeState,
}

impl KnowledgeBase {
    /// Create a knowledge base seeded with the agent's hand and the face-up
    /// cards of `setup`.
    pub fn new(
        deck: Deck,
        setup: GameSetup,
        me: PlayerId,
        hand: &[CardId],
    ) -> Result<Self, KnowledgeError> {
        setup.check_hand(&deck, hand)?;
        if me.index() >= setup.player_count() {
            return Err(KnowledgeError::UnknownPlayer { player: me });
        }

        let cards = deck.len();
        let mut base = Self {
            state: KnowledgeState {
                facts: vec![Fact::Unknown; cards * setup.player_count()],
                statuses: vec![CardStatus::default(); cards],
                constraints: Vec::new(),
            },
            deck,
            setup,
            me,
        };

        for &card in hand {
            base.state.statuses[card.index()].mine = true;
        }
        let shared = base.setup.shared().to_vec();
        for &card in &shared {
            let status = &mut base.state.statuses[card.index()];
            status.shared = true;
            status.known = true;
        }

        let mut queue = VecDeque::new();
        for &card in &shared {
            for player in base.setup.players() {
                queue.push_back(Derivation::new(player, card, Fact::NotHolding));
            }
        }
        for card in base.deck.ids() {
            let fact = if hand.contains(&card) {
                Fact::Holding
            } else {
                Fact::NotHolding
            };
            queue.push_back(Derivation::new(me, card, fact));
        }
        for group in CardGroup::ALL {
            base.check_group(group, &mut queue)?;
        }
        base.run(queue)?;
        Ok(base)
    }

    /// The deck the facts refer to.
    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    /// Seats and hand sizes.
    pub fn setup(&self) -> &GameSetup {
        &self.setup
    }

    /// The agent's own seat.
    pub fn me(&self) -> PlayerId {
        self.me
    }

    /// Current fact for a (player, card) pair.
    pub fn fact(&self, player: PlayerId, card: CardId) -> Fact {
        self.state
            .facts
            .get(self.slot(player, card))
            .copied()
            .unwrap_or_default()
    }

    /// Status of a card.
    pub fn status(&self, card: CardId) -> CardStatus {
        self.state
            .statuses
            .get(card.index())
            .copied()
            .unwrap_or_default()
    }

    /// Open must-have-one constraints.
    pub fn constraints(&self) -> &[MustHaveOne] {
        &self.state.constraints
    }

    /// The player known to hold `card`.
    pub fn holder(&self, card: CardId) -> Option<PlayerId> {
        self.setup
            .players()
            .find(|p| self.fact(*p, card) == Fact::Holding)
    }

    /// Cards in the agent's hand.
    pub fn my_cards(&self) -> impl Iterator<Item = CardId> + '_ {
        self.deck.ids().filter(|c| self.status(*c).mine)
    }

    /// Record one fact and everything it implies.
    ///
    /// Returns whether anything changed.
    pub fn set_fact(
        &mut self,
        player: PlayerId,
        card: CardId,
        fact: Fact,
    ) -> Result<bool, KnowledgeError> {
        self.transaction(|kb| {
            kb.check_ids(player, card)?;
            kb.run(VecDeque::from([Derivation::new(player, card, fact)]))
        })
    }

    /// Record the same fact about one card for several players.
    pub fn set_fact_for_players(
        &mut self,
        players: &[PlayerId],
        card: CardId,
        fact: Fact,
    ) -> Result<bool, KnowledgeError> {
        self.transaction(|kb| {
            let mut queue = VecDeque::with_capacity(players.len());
            for &player in players {
                kb.check_ids(player, card)?;
                queue.push_back(Derivation::new(player, card, fact));
            }
            kb.run(queue)
        })
    }

    /// Record the same fact about several cards for one player.
    pub fn set_fact_for_cards(
        &mut self,
        player: PlayerId,
        cards: &[CardId],
        fact: Fact,
    ) -> Result<bool, KnowledgeError> {
        self.transaction(|kb| {
            let mut queue = VecDeque::with_capacity(cards.len());
            for &card in cards {
                kb.check_ids(player, card)?;
                queue.push_back(Derivation::new(player, card, fact));
            }
            kb.run(queue)
        })
    }

    /// Record that `player` holds at least one of `cards`.
    ///
    /// Every listed card that is not settled yet becomes `SuspectedHolding`
    /// for the player, then the constraint is resolved as far as possible.
    pub fn add_must_have_one(
        &mut self,
        player: PlayerId,
        cards: &[CardId],
    ) -> Result<bool, KnowledgeError> {
        self.transaction(|kb| {
            if cards.is_empty() {
                return Err(KnowledgeError::EmptyConstraint { player });
            }
            for &card in cards {
                kb.check_ids(player, card)?;
            }
            let constraint = MustHaveOne {
                player,
                cards: cards.to_vec(),
            };
            if kb.state.constraints.contains(&constraint) {
                return Ok(false);
            }
            debug!(%player, ?cards, "must-have-one constraint added");
            kb.state.constraints.push(constraint);
            for &card in cards {
                kb.set_suspicion(player, card, Fact::SuspectedHolding);
            }
            kb.run(VecDeque::new())?;
            Ok(true)
        })
    }

    /// Run `update` and restore the previous state if it fails.
    pub(crate) fn transaction<T>(
        &mut self,
        update: impl FnOnce(&mut Self) -> Result<T, KnowledgeError>,
    ) -> Result<T, KnowledgeError> {
        let snapshot = self.state.clone();
        let result = update(self);
        if result.is_err() {
            self.state = snapshot;
        }
        result
    }

    /// The groups deduced so far.
    pub fn solution(&self) -> Solution {
        let correct = |group| {
            self.deck
                .group(group)
                .find(|c| self.status(*c).correct)
        };
        Solution {
            suspect: correct(CardGroup::Suspect),
            weapon: correct(CardGroup::Weapon),
            room: correct(CardGroup::Room),
        }
    }

    /// Whether a card's whereabouts are settled.
    pub fn is_resolved(&self, card: CardId) -> bool {
        self.status(card).known
    }

    /// Room cards whose whereabouts are still open.
    pub fn unresolved_rooms(&self) -> Vec<CardId> {
        self.deck
            .group(CardGroup::Room)
            .filter(|c| !self.is_resolved(*c))
            .collect()
    }

    /// Among the unresolved room cards in `candidates`, the one fewest players
    /// have been ruled in or out for. Ties keep candidate order.
    pub fn least_known_room(&self, candidates: &[CardId]) -> Option<CardId> {
        self.least_known(
            candidates
                .iter()
                .copied()
                .filter(|c| self.deck.group_of(*c) == Some(CardGroup::Room)),
        )
    }

    /// The least known unresolved card of a group, in deck order on ties.
    pub fn least_known_card(&self, group: CardGroup) -> Option<CardId> {
        self.least_known(self.deck.group(group))
    }

    fn least_known(&self, cards: impl Iterator<Item = CardId>) -> Option<CardId> {
        let mut best: Option<(usize, CardId)> = None;
        for card in cards.filter(|c| !self.is_resolved(*c)) {
            let count = self.status(card).known_count;
            if best.map_or(true, |(best_count, _)| count < best_count) {
                best = Some((count, card));
            }
        }
        best.map(|(_, card)| card)
    }

    /// Snapshot of the whole table for display.
    pub fn notebook(&self) -> Notebook {
        Notebook {
            players: self.setup.player_count(),
            me: self.me,
            entries: self
                .deck
                .cards()
                .iter()
                .map(|card| NotebookEntry {
                    card: card.name.clone(),
                    group: card.group,
                    status: self.status(card.id),
                    facts: self
                        .setup
                        .players()
                        .map(|p| self.fact(p, card.id))
                        .collect(),
                })
                .collect(),
            solution: self.solution(),
            open_constraints: self.state.constraints.len(),
        }
    }

    fn slot(&self, player: PlayerId, card: CardId) -> usize {
        player.index() * self.deck.len() + card.index()
    }

    fn check_ids(&self, player: PlayerId, card: CardId) -> Result<(), KnowledgeError> {
        if player.index() >= self.setup.player_count() {
            return Err(KnowledgeError::UnknownPlayer { player });
        }
        if self.deck.get(card).is_none() {
            return Err(KnowledgeError::UnknownCard { card });
        }
        Ok(())
    }

    fn count_facts(&self, player: PlayerId, fact: Fact) -> usize {
        self.deck
            .ids()
            .filter(|c| self.fact(player, *c) == fact)
            .count()
    }

    fn set_suspicion(&mut self, player: PlayerId, card: CardId, fact: Fact) -> bool {
        let slot = self.slot(player, card);
        let current = self.state.facts[slot];
        if current.is_certain() || current == fact {
            return false;
        }
        self.state.facts[slot] = fact;
        true
    }

    /// Drain the worklist, then re-check constraints until nothing changes.
    fn run(&mut self, mut queue: VecDeque<Derivation>) -> Result<bool, KnowledgeError> {
        let mut changed = false;
        loop {
            while let Some(derivation) = queue.pop_front() {
                changed |= self.apply(derivation, &mut queue)?;
            }
            let (resolved, derived) = self.resolve_constraints()?;
            changed |= resolved;
            if derived.is_empty() {
                return Ok(changed);
            }
            queue.extend(derived);
        }
    }

    fn apply(
        &mut self,
        derivation: Derivation,
        queue: &mut VecDeque<Derivation>,
    ) -> Result<bool, KnowledgeError> {
        let Derivation { player, card, fact } = derivation;
        let slot = self.slot(player, card);
        let current = self.state.facts[slot];
        if current == fact {
            return Ok(false);
        }

        match fact {
            Fact::SuspectedHolding | Fact::SuspectedNotHolding => {
                Ok(self.set_suspicion(player, card, fact))
            }
            Fact::Unknown | Fact::Holding | Fact::NotHolding if current.is_certain() => {
                Err(KnowledgeError::Contradiction {
                    player,
                    card,
                    current,
                    attempted: fact,
                })
            }
            Fact::Unknown => {
                self.state.facts[slot] = Fact::Unknown;
                Ok(true)
            }
            Fact::Holding | Fact::NotHolding => {
                self.state.facts[slot] = fact;
                self.state.statuses[card.index()].known_count += 1;
                debug!(
                    %player,
                    card = self.deck.name(card),
                    ?fact,
                    "fact recorded"
                );
                if fact == Fact::Holding {
                    self.on_holding(player, card, queue)?;
                } else {
                    self.on_not_holding(player, card, queue)?;
                }
                Ok(true)
            }
        }
    }

    fn on_holding(
        &mut self,
        player: PlayerId,
        card: CardId,
        queue: &mut VecDeque<Derivation>,
    ) -> Result<(), KnowledgeError> {
        if self.status(card).correct {
            return Err(KnowledgeError::HeldSolution { card });
        }
        if let Some(other) = self
            .setup
            .players()
            .find(|p| *p != player && self.fact(*p, card) == Fact::Holding)
        {
            return Err(KnowledgeError::MultipleHolders {
                card,
                first: other,
                second: player,
            });
        }
        self.state.statuses[card.index()].known = true;

        for other in self.setup.players().filter(|p| *p != player) {
            if self.fact(other, card) != Fact::NotHolding {
                queue.push_back(Derivation::new(other, card, Fact::NotHolding));
            }
        }

        let hand_size = self.setup.hand_size();
        let held = self.count_facts(player, Fact::Holding);
        if held > hand_size {
            return Err(KnowledgeError::HandOverflow { player, hand_size });
        }
        if held == hand_size {
            for other_card in self.deck.ids() {
                if !self.fact(player, other_card).is_certain() {
                    queue.push_back(Derivation::new(player, other_card, Fact::NotHolding));
                }
            }
        }

        match self.deck.group_of(card) {
            Some(group) => self.check_group(group, queue),
            None => Ok(()),
        }
    }

    fn on_not_holding(
        &mut self,
        player: PlayerId,
        card: CardId,
        queue: &mut VecDeque<Derivation>,
    ) -> Result<(), KnowledgeError> {
        let hand_size = self.setup.hand_size();
        let limit = self.deck.len() - hand_size;
        let not_held = self.count_facts(player, Fact::NotHolding);
        if not_held > limit {
            return Err(KnowledgeError::HandUnderflow { player, hand_size });
        }
        if not_held == limit {
            for other_card in self.deck.ids() {
                if !self.fact(player, other_card).is_certain() {
                    queue.push_back(Derivation::new(player, other_card, Fact::Holding));
                }
            }
        }

        let nobody_holds = self
            .setup
            .players()
            .all(|p| self.fact(p, card) == Fact::NotHolding);
        if nobody_holds {
            if !self.status(card).shared {
                self.mark_solution(card, queue)?;
            }
            return Ok(());
        }
        self.check_sole_holder(card, queue)
    }

    /// Mark `card` as the solution of its group.
    fn mark_solution(
        &mut self,
        card: CardId,
        queue: &mut VecDeque<Derivation>,
    ) -> Result<(), KnowledgeError> {
        if self.status(card).correct {
            return Ok(());
        }
        let Some(group) = self.deck.group_of(card) else {
            return Err(KnowledgeError::UnknownCard { card });
        };
        if let Some(first) = self
            .deck
            .group(group)
            .find(|c| *c != card && self.status(*c).correct)
        {
            return Err(KnowledgeError::SecondSolution {
                group,
                first,
                second: card,
            });
        }
        if self.holder(card).is_some() || self.status(card).shared {
            return Err(KnowledgeError::HeldSolution { card });
        }

        let status = &mut self.state.statuses[card.index()];
        status.correct = true;
        status.known = true;
        info!(%group, card = self.deck.name(card), "solution card deduced");

        for player in self.setup.players() {
            if self.fact(player, card) != Fact::NotHolding {
                queue.push_back(Derivation::new(player, card, Fact::NotHolding));
            }
        }
        let others: Vec<CardId> = self.deck.group(group).filter(|c| *c != card).collect();
        for other in others {
            self.check_sole_holder(other, queue)?;
        }
        Ok(())
    }

    /// A non-solution card that only one player may still hold is theirs.
    fn check_sole_holder(
        &mut self,
        card: CardId,
        queue: &mut VecDeque<Derivation>,
    ) -> Result<(), KnowledgeError> {
        let status = self.status(card);
        if status.correct || status.shared || self.holder(card).is_some() {
            return Ok(());
        }
        let Some(group) = self.deck.group_of(card) else {
            return Ok(());
        };
        let group_solved = self.deck.group(group).any(|c| self.status(c).correct);
        if !group_solved {
            return Ok(());
        }

        let mut possible = self
            .setup
            .players()
            .filter(|p| self.fact(*p, card) != Fact::NotHolding);
        match (possible.next(), possible.next()) {
            (None, _) => Err(KnowledgeError::NoHolder { card }),
            (Some(player), None) => {
                queue.push_back(Derivation::new(player, card, Fact::Holding));
                Ok(())
            }
            _ => Ok(()),
        }
    }

    /// When a single card of `group` can still be the solution, it is.
    fn check_group(
        &mut self,
        group: CardGroup,
        queue: &mut VecDeque<Derivation>,
    ) -> Result<(), KnowledgeError> {
        if self.deck.group(group).any(|c| self.status(c).correct) {
            return Ok(());
        }
        let candidates: Vec<CardId> = self
            .deck
            .group(group)
            .filter(|c| !self.is_resolved(*c))
            .collect();
        match candidates.as_slice() {
            [] => Err(KnowledgeError::NoSolutionCandidate { group }),
            [card] => self.mark_solution(*card, queue),
            _ => Ok(()),
        }
    }

    /// One pass over the open constraints.
    ///
    /// Returns whether any constraint closed, plus the certain facts the
    /// closed constraints imply.
    fn resolve_constraints(&mut self) -> Result<(bool, Vec<Derivation>), KnowledgeError> {
        let constraints = std::mem::take(&mut self.state.constraints);
        let mut open = Vec::with_capacity(constraints.len());
        let mut derived = Vec::new();
        let mut changed = false;

        for constraint in constraints {
            let player = constraint.player;
            let satisfied = constraint
                .cards
                .iter()
                .any(|c| self.fact(player, *c) == Fact::Holding);
            if satisfied {
                for &card in &constraint.cards {
                    self.set_suspicion(player, card, Fact::SuspectedNotHolding);
                }
                debug!(%player, cards = ?constraint.cards, "constraint satisfied");
                changed = true;
                continue;
            }

            let remaining: Vec<CardId> = constraint
                .cards
                .iter()
                .copied()
                .filter(|c| self.fact(player, *c) != Fact::NotHolding)
                .collect();
            match remaining.as_slice() {
                [] => {
                    return Err(KnowledgeError::Unsatisfiable {
                        player,
                        cards: constraint.cards,
                    })
                }
                [card] => {
                    debug!(
                        %player,
                        card = self.deck.name(*card),
                        "constraint narrowed to one card"
                    );
                    derived.push(Derivation::new(player, *card, Fact::Holding));
                    changed = true;
                }
                _ => open.push(constraint),
            }
        }

        self.state.constraints = open;
        Ok((changed, derived))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference deck ids:
    // suspects 0..=5  Scarlett, Mustard, White, Green, Peacock, Plum
    // weapons  6..=11 Candlestick, Dagger, Lead Pipe, Revolver, Rope, Spanner
    // rooms   12..=19 Kitchen, Ballroom, Conservatory, Dining Room,
    //                 Billiard Room, Library, Lounge, Study
    const ME: PlayerId = PlayerId(0);
    const BOB: PlayerId = PlayerId(1);
    const CAROL: PlayerId = PlayerId(2);

    fn c(index: usize) -> CardId {
        CardId(index)
    }

    /// Three players; the agent holds Scarlett, Mustard, White, Green and the
    /// Candlestick; the Dagger and Lead Pipe lie face up.
    fn three_player_base() -> KnowledgeBase {
        let deck = Deck::reference();
        let setup = GameSetup::new(&deck, 3)
            .unwrap()
            .with_shared(&deck, vec![c(7), c(8)])
            .unwrap();
        KnowledgeBase::new(deck, setup, ME, &[c(0), c(1), c(2), c(3), c(6)]).unwrap()
    }

    #[test]
    fn test_seeding_from_hand_and_shared_cards() {
        let kb = three_player_base();

        for card in [0, 1, 2, 3, 6] {
            assert_eq!(kb.fact(ME, c(card)), Fact::Holding);
            assert_eq!(kb.fact(BOB, c(card)), Fact::NotHolding);
            assert_eq!(kb.fact(CAROL, c(card)), Fact::NotHolding);
            assert!(kb.status(c(card)).mine);
        }
        for card in [7, 8] {
            assert!(kb.status(c(card)).shared);
            assert!(kb.status(c(card)).known);
            assert!(!kb.status(c(card)).correct);
            assert_eq!(kb.fact(BOB, c(card)), Fact::NotHolding);
        }
        assert_eq!(kb.fact(ME, c(12)), Fact::NotHolding);
        assert_eq!(kb.fact(BOB, c(12)), Fact::Unknown);
        assert_eq!(kb.solution(), Solution::default());
        assert_eq!(kb.my_cards().count(), 5);
    }

    #[test]
    fn test_holding_rules_out_other_players() {
        let mut kb = three_player_base();
        assert!(kb.set_fact(BOB, c(12), Fact::Holding).unwrap());
        assert_eq!(kb.fact(CAROL, c(12)), Fact::NotHolding);
        assert_eq!(kb.holder(c(12)), Some(BOB));
        assert!(kb.status(c(12)).known);
        assert_eq!(kb.status(c(12)).known_count, 3);

        // Repeating a fact changes nothing.
        assert!(!kb.set_fact(BOB, c(12), Fact::Holding).unwrap());
    }

    #[test]
    fn test_full_hand_rules_out_everything_else() {
        let mut kb = three_player_base();
        kb.set_fact_for_cards(BOB, &[c(4), c(9), c(12), c(13), c(14)], Fact::Holding)
            .unwrap();

        for card in [5, 10, 11, 15, 16, 17, 18, 19] {
            assert_eq!(kb.fact(BOB, c(card)), Fact::NotHolding);
        }
    }

    #[test]
    fn test_exhausted_not_holding_forces_holding() {
        let mut kb = three_player_base();
        // Carol already cannot hold the agent's five cards or the two face-up
        // ones. Ruling out eight more leaves exactly her hand of five.
        kb.set_fact_for_cards(
            CAROL,
            &[c(4), c(9), c(10), c(12), c(13), c(14), c(15)],
            Fact::NotHolding,
        )
        .unwrap();
        assert_eq!(kb.fact(CAROL, c(5)), Fact::Unknown);

        kb.set_fact(CAROL, c(16), Fact::NotHolding).unwrap();
        for card in [5, 11, 17, 18, 19] {
            assert_eq!(kb.fact(CAROL, c(card)), Fact::Holding);
            assert_eq!(kb.fact(BOB, c(card)), Fact::NotHolding);
        }
        // Everyone else's suspects are accounted for, so Peacock is the one.
        assert_eq!(kb.solution().suspect, Some(c(4)));
    }

    #[test]
    fn test_nobody_holding_is_the_solution() {
        let mut kb = three_player_base();
        kb.set_fact_for_players(&[BOB, CAROL], c(15), Fact::NotHolding)
            .unwrap();

        assert!(kb.status(c(15)).correct);
        assert_eq!(kb.solution().room, Some(c(15)));
        assert!(!kb.solution().is_complete());
    }

    #[test]
    fn test_last_candidate_of_group_is_the_solution() {
        let mut kb = three_player_base();
        // Weapons: 6 mine, 7 and 8 face up. Revolver and Rope get holders.
        kb.set_fact(BOB, c(9), Fact::Holding).unwrap();
        assert_eq!(kb.solution().weapon, None);

        kb.set_fact(CAROL, c(10), Fact::Holding).unwrap();
        assert_eq!(kb.solution().weapon, Some(c(11)));
        assert_eq!(kb.fact(BOB, c(11)), Fact::NotHolding);
        assert_eq!(kb.fact(CAROL, c(11)), Fact::NotHolding);
    }

    #[test]
    fn test_solved_group_assigns_sole_remaining_holder() {
        let mut kb = three_player_base();
        // Peacock is the suspect; Plum must then be Bob's or Carol's.
        kb.set_fact_for_players(&[BOB, CAROL], c(4), Fact::NotHolding)
            .unwrap();
        assert_eq!(kb.solution().suspect, Some(c(4)));

        kb.set_fact(BOB, c(5), Fact::NotHolding).unwrap();
        assert_eq!(kb.fact(CAROL, c(5)), Fact::Holding);
    }

    #[test]
    fn test_must_have_one_narrows_to_last_card() {
        let mut kb = three_player_base();
        kb.add_must_have_one(BOB, &[c(4), c(9), c(12)]).unwrap();
        assert_eq!(kb.constraints().len(), 1);
        assert_eq!(kb.fact(BOB, c(4)), Fact::SuspectedHolding);

        kb.set_fact(BOB, c(4), Fact::NotHolding).unwrap();
        assert_eq!(kb.constraints().len(), 1);

        kb.set_fact(BOB, c(12), Fact::NotHolding).unwrap();
        assert!(kb.constraints().is_empty());
        assert_eq!(kb.fact(BOB, c(9)), Fact::Holding);
        assert_eq!(kb.fact(CAROL, c(9)), Fact::NotHolding);
    }

    #[test]
    fn test_must_have_one_closes_on_known_holding() {
        let mut kb = three_player_base();
        kb.add_must_have_one(BOB, &[c(4), c(9), c(12)]).unwrap();
        kb.set_fact(BOB, c(9), Fact::Holding).unwrap();

        assert!(kb.constraints().is_empty());
        assert_eq!(kb.fact(BOB, c(4)), Fact::SuspectedNotHolding);
        assert_eq!(kb.fact(BOB, c(12)), Fact::SuspectedNotHolding);
    }

    #[test]
    fn test_constraint_already_resolved_on_arrival() {
        let mut kb = three_player_base();
        kb.set_fact_for_cards(BOB, &[c(4), c(12)], Fact::NotHolding)
            .unwrap();
        kb.add_must_have_one(BOB, &[c(4), c(9), c(12)]).unwrap();
        assert!(kb.constraints().is_empty());
        assert_eq!(kb.fact(BOB, c(9)), Fact::Holding);
    }

    #[test]
    fn test_chained_constraints_reach_fixed_point() {
        let mut kb = three_player_base();
        kb.add_must_have_one(BOB, &[c(4), c(9), c(12)]).unwrap();
        kb.add_must_have_one(CAROL, &[c(9), c(10), c(13)]).unwrap();
        kb.set_fact(CAROL, c(10), Fact::NotHolding).unwrap();
        kb.set_fact(CAROL, c(13), Fact::NotHolding).unwrap();

        // Carol holds the Revolver, so Bob does not, which leaves Bob's
        // constraint open on Peacock and the Kitchen.
        assert_eq!(kb.fact(CAROL, c(9)), Fact::Holding);
        assert_eq!(kb.fact(BOB, c(9)), Fact::NotHolding);
        assert_eq!(kb.constraints().len(), 1);

        kb.set_fact(BOB, c(4), Fact::NotHolding).unwrap();
        assert_eq!(kb.fact(BOB, c(12)), Fact::Holding);
        assert!(kb.constraints().is_empty());
    }

    #[test]
    fn test_contradiction_rolls_back() {
        let mut kb = three_player_base();
        kb.set_fact(BOB, c(12), Fact::Holding).unwrap();
        let before = kb.clone();

        let err = kb.set_fact(CAROL, c(12), Fact::Holding).unwrap_err();
        assert!(matches!(err, KnowledgeError::Contradiction { .. }));
        assert_eq!(kb, before);

        let err = kb.set_fact(ME, c(0), Fact::NotHolding).unwrap_err();
        assert!(matches!(err, KnowledgeError::Contradiction { .. }));
        assert_eq!(kb, before);
    }

    #[test]
    fn test_batch_failure_rolls_back_whole_batch() {
        let mut kb = three_player_base();
        let before = kb.clone();
        let err = kb
            .set_fact_for_cards(BOB, &[c(12), c(0)], Fact::Holding)
            .unwrap_err();
        assert!(matches!(err, KnowledgeError::Contradiction { .. }));
        assert_eq!(kb.fact(BOB, c(12)), Fact::Unknown);
        assert_eq!(kb, before);
    }

    #[test]
    fn test_unsatisfiable_constraint_is_rejected() {
        let mut kb = three_player_base();
        kb.set_fact_for_cards(BOB, &[c(4), c(9), c(12)], Fact::NotHolding)
            .unwrap();
        let err = kb.add_must_have_one(BOB, &[c(4), c(9), c(12)]).unwrap_err();
        assert!(matches!(err, KnowledgeError::Unsatisfiable { .. }));
        assert!(kb.constraints().is_empty());

        let err = kb.add_must_have_one(BOB, &[]).unwrap_err();
        assert_eq!(err, KnowledgeError::EmptyConstraint { player: BOB });
    }

    #[test]
    fn test_unknown_ids_are_rejected() {
        let mut kb = three_player_base();
        assert_eq!(
            kb.set_fact(PlayerId(3), c(0), Fact::Holding),
            Err(KnowledgeError::UnknownPlayer {
                player: PlayerId(3)
            })
        );
        assert_eq!(
            kb.set_fact(BOB, c(20), Fact::Holding),
            Err(KnowledgeError::UnknownCard { card: c(20) })
        );
    }

    #[test]
    fn test_certain_facts_never_revert() {
        let mut kb = three_player_base();
        kb.set_fact(BOB, c(12), Fact::Holding).unwrap();

        assert!(!kb.set_fact(BOB, c(12), Fact::SuspectedNotHolding).unwrap());
        assert_eq!(kb.fact(BOB, c(12)), Fact::Holding);
        assert!(kb.set_fact(BOB, c(12), Fact::Unknown).is_err());
        assert_eq!(kb.fact(BOB, c(12)), Fact::Holding);
    }

    #[test]
    fn test_single_holder_and_single_solution_invariants() {
        let mut kb = three_player_base();
        kb.add_must_have_one(BOB, &[c(4), c(9), c(12)]).unwrap();
        kb.add_must_have_one(CAROL, &[c(5), c(10), c(13)]).unwrap();
        kb.set_fact_for_players(&[BOB, CAROL], c(14), Fact::NotHolding)
            .unwrap();
        kb.set_fact(CAROL, c(5), Fact::Holding).unwrap();
        kb.set_fact_for_cards(BOB, &[c(4), c(12)], Fact::NotHolding)
            .unwrap();

        for card in kb.deck().ids() {
            let holders = kb
                .setup()
                .players()
                .filter(|p| kb.fact(*p, card) == Fact::Holding)
                .count();
            assert!(holders <= 1);
        }
        for group in CardGroup::ALL {
            let correct = kb
                .deck()
                .group(group)
                .filter(|c| kb.status(*c).correct)
                .count();
            assert!(correct <= 1);
        }
        assert_eq!(kb.solution().room, Some(c(14)));
        assert_eq!(kb.solution().suspect, Some(c(4)));
        assert_eq!(kb.fact(BOB, c(9)), Fact::Holding);
        // With the room solved, the Kitchen can only be Carol's.
        assert_eq!(kb.fact(CAROL, c(12)), Fact::Holding);
    }

    #[test]
    fn test_weapon_deduced_after_constraint_and_eliminations() {
        let mut kb = three_player_base();
        // Bob asked Carol about Peacock / Revolver / Kitchen and was shown a card.
        kb.add_must_have_one(CAROL, &[c(4), c(9), c(12)]).unwrap();

        // Peacock and the Kitchen are later ruled out for every player.
        kb.set_fact_for_players(&[BOB, CAROL], c(4), Fact::NotHolding)
            .unwrap();
        kb.set_fact_for_players(&[BOB, CAROL], c(12), Fact::NotHolding)
            .unwrap();
        assert_eq!(kb.solution().suspect, Some(c(4)));
        assert_eq!(kb.solution().room, Some(c(12)));
        assert_eq!(kb.fact(CAROL, c(9)), Fact::Holding);

        // Rope turns up in Bob's hand; Spanner is the last weapon standing.
        kb.set_fact(BOB, c(10), Fact::Holding).unwrap();
        assert_eq!(kb.solution().weapon, Some(c(11)));
        assert!(kb.solution().is_complete());
    }

    #[test]
    fn test_least_known_room() {
        let mut kb = three_player_base();
        let rooms = kb.unresolved_rooms();
        assert_eq!(rooms.len(), 8);
        assert_eq!(kb.least_known_room(&rooms), Some(c(12)));

        kb.set_fact(BOB, c(12), Fact::NotHolding).unwrap();
        kb.set_fact(BOB, c(13), Fact::Holding).unwrap();
        let rooms = kb.unresolved_rooms();
        assert!(!rooms.contains(&c(13)));
        assert_eq!(kb.least_known_room(&rooms), Some(c(14)));
        assert_eq!(kb.least_known_room(&[c(12)]), Some(c(12)));
        assert_eq!(kb.least_known_room(&[c(0), c(13)]), None);
        assert_eq!(kb.least_known_card(CardGroup::Weapon), Some(c(9)));
    }
}
