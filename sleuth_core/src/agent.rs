//! The agent - one seat at the table, wiring knowledge, log reading,
//! movement planning and disclosure together.

use board_rules::{Board, CardId, Deck, Location, PlayerId, RoomId};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::info;

use crate::config::SessionConfig;
use crate::error::SleuthError;
use crate::events::{Exchange, LogReader, Roster};
use crate::knowledge::{KnowledgeBase, Notebook, Solution};
use crate::pathfinding::PathFinder;
use crate::strategy::{
    Accusation, DisclosurePolicy, MovePlan, Suggestion, TurnCommand, TurnStrategy,
};

/// An autonomous player.
///
/// The agent owns everything it reasons with; nothing is shared between
/// agents. Its knowledge is rebuilt from the game log, so a new agent fed the
/// same log ends up in the same state.
#[derive(Debug)]
pub struct Agent<R = StdRng> {
    board: Board,
    roster: Roster,
    knowledge: KnowledgeBase,
    reader: LogReader,
    strategy: TurnStrategy,
    disclosure: DisclosurePolicy<R>,
}

impl Agent<StdRng> {
    /// An agent for `session` whose random disclosure choices are seeded from
    /// the operating system.
    pub fn from_session(board: Board, deck: Deck, session: &SessionConfig) -> Result<Self, SleuthError> {
        Self::with_rng(board, deck, session, StdRng::from_entropy())
    }
}

impl<R: Rng> Agent<R> {
    /// An agent for `session` using `rng` to break disclosure ties.
    ///
    /// `board` must have been built against `deck`.
    pub fn with_rng(
        board: Board,
        deck: Deck,
        session: &SessionConfig,
        rng: R,
    ) -> Result<Self, SleuthError> {
        let roster = session.roster()?;
        let me = session.me()?;
        let hand = session.hand(&deck)?;
        let setup = session.setup(&deck)?;
        let knowledge = KnowledgeBase::new(deck, setup, me, &hand)?;
        info!(
            players = roster.len(),
            me = roster.name(me),
            hand = hand.len(),
            "agent seated"
        );

        Ok(Self {
            board,
            roster,
            knowledge,
            reader: LogReader::new()?,
            strategy: TurnStrategy::new(session.rules),
            disclosure: DisclosurePolicy::new(hand, rng),
        })
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn roster(&self) -> &Roster {
        &self.roster
    }

    pub fn knowledge(&self) -> &KnowledgeBase {
        &self.knowledge
    }

    pub fn strategy(&self) -> &TurnStrategy {
        &self.strategy
    }

    pub fn disclosure(&self) -> &DisclosurePolicy<R> {
        &self.disclosure
    }

    pub fn me(&self) -> PlayerId {
        self.knowledge.me()
    }

    /// Read the log lines added since the last call.
    pub fn observe<S: AsRef<str>>(&mut self, log: &[S]) -> Result<Vec<Exchange>, SleuthError> {
        Ok(self.reader.poll(log, &self.roster, &mut self.knowledge)?)
    }

    /// Number of log lines processed so far.
    pub fn lines_consumed(&self) -> usize {
        self.reader.consumed()
    }

    pub fn solution(&self) -> Solution {
        self.knowledge.solution()
    }

    pub fn notebook(&self) -> Notebook {
        self.knowledge.notebook()
    }

    pub fn begin_turn(&mut self, position: Location) -> Result<TurnCommand, SleuthError> {
        let finder = PathFinder::new(&self.board);
        Ok(self.strategy.begin_turn(&self.knowledge, &finder, position)?)
    }

    pub fn plan_move(&mut self, roll: usize) -> Result<MovePlan, SleuthError> {
        let finder = PathFinder::new(&self.board);
        Ok(self.strategy.plan_move(&self.knowledge, &finder, roll)?)
    }

    pub fn take_passage(&mut self) -> Result<(RoomId, TurnCommand), SleuthError> {
        Ok(self.strategy.take_passage(&self.knowledge, &self.board)?)
    }

    pub fn finish_move(&mut self, position: Location) -> Result<TurnCommand, SleuthError> {
        Ok(self
            .strategy
            .finish_move(&self.knowledge, &self.board, position)?)
    }

    pub fn question(&mut self) -> Result<Suggestion, SleuthError> {
        Ok(self.strategy.question(&self.knowledge, &self.board)?)
    }

    pub fn accusation(&mut self) -> Result<Accusation, SleuthError> {
        Ok(self.strategy.accusation(&self.knowledge, &self.board)?)
    }

    pub fn end_turn(&mut self) -> TurnCommand {
        self.strategy.end_turn()
    }

    /// Answer `asker`'s question about `cards`: the card to show, or `None`
    /// when the agent holds none of them. The shown card is remembered.
    pub fn answer(&mut self, asker: PlayerId, cards: &[CardId]) -> Result<Option<CardId>, SleuthError> {
        let matches: Vec<CardId> = cards
            .iter()
            .copied()
            .filter(|c| self.knowledge.status(*c).mine)
            .collect();
        if matches.is_empty() {
            return Ok(None);
        }
        let card = self.disclosure.choose(asker, &matches)?;
        self.disclosure.reveal(asker, card)?;
        info!(
            to = self.roster.name(asker),
            card = self.knowledge.deck().name(card),
            "showing card"
        );
        Ok(Some(card))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::Fact;
    use crate::events::LogError;

    const SESSION: &str = r#"
        players = ["Alice", "Bob", "Carol"]
        me = "Alice"
        hand = ["Miss Scarlett", "Colonel Mustard", "Mrs White", "Reverend Green", "Candlestick"]
        shared = ["Dagger", "Lead Pipe"]
    "#;

    const LOG: [&str; 9] = [
        "Alice (Miss Scarlett) questioned Carol (Mrs White) about Professor Plum with the Rope in the Ballroom.",
        "Carol (Mrs White) showed one card: Rope.",
        "Carol (Mrs White) questioned Bob (Colonel Mustard) about Mrs Peacock with the Revolver in the Kitchen.",
        "Bob (Colonel Mustard) showed one card.",
        "Bob (Colonel Mustard) moved to the Hall.",
        "Alice (Miss Scarlett) questioned Bob (Colonel Mustard) about Mrs Peacock with the Spanner in the Kitchen.",
        "Bob (Colonel Mustard) did not show any cards.",
        "Alice (Miss Scarlett) questioned Carol (Mrs White) about Mrs Peacock with the Spanner in the Kitchen.",
        "Carol (Mrs White) did not show any cards.",
    ];

    fn agent(seed: u64) -> Agent<StdRng> {
        let deck = Deck::reference();
        let board = Board::reference(&deck).unwrap();
        let session = SessionConfig::from_toml_str(SESSION).unwrap();
        Agent::with_rng(board, deck, &session, StdRng::seed_from_u64(seed)).unwrap()
    }

    fn card(agent: &Agent<StdRng>, name: &str) -> CardId {
        agent.knowledge().deck().find(name).unwrap()
    }

    #[test]
    fn test_replayed_log_deduces_solution() {
        let mut agent = agent(3);
        let bob = agent.roster().player("Bob").unwrap();

        agent.observe(&LOG[..4]).unwrap();
        assert_eq!(agent.knowledge().constraints().len(), 1);
        assert_eq!(agent.solution(), Solution::default());

        agent.observe(&LOG[..7]).unwrap();
        // Bob lacks the Peacock and the Kitchen, so he showed the Revolver,
        // which leaves the Spanner as the only weapon nobody can hold.
        assert_eq!(
            agent.knowledge().fact(bob, card(&agent, "Revolver")),
            Fact::Holding
        );
        assert!(agent.knowledge().constraints().is_empty());
        assert_eq!(agent.solution().weapon, Some(card(&agent, "Spanner")));

        agent.observe(&LOG).unwrap();
        assert_eq!(agent.lines_consumed(), 9);
        let solution = agent.solution();
        assert!(solution.is_complete());
        assert_eq!(solution.suspect, Some(card(&agent, "Mrs Peacock")));
        assert_eq!(solution.room, Some(card(&agent, "Kitchen")));
    }

    #[test]
    fn test_solved_agent_accuses_from_accusation_room() {
        let mut agent = agent(3);
        agent.observe(&LOG).unwrap();
        let cellar = agent.board().accusation_room();

        assert_eq!(
            agent.begin_turn(Location::Room(cellar)).unwrap(),
            TurnCommand::Accuse
        );
        let accusation = agent.accusation().unwrap();
        assert_eq!(accusation.suspect, card(&agent, "Mrs Peacock"));
        assert_eq!(accusation.weapon, card(&agent, "Spanner"));
        assert_eq!(accusation.room, card(&agent, "Kitchen"));
        assert_eq!(agent.end_turn(), TurnCommand::Done);
    }

    #[test]
    fn test_answer_shows_held_cards_consistently() {
        let mut agent = agent(11);
        let bob = agent.roster().player("Bob").unwrap();
        let carol = agent.roster().player("Carol").unwrap();
        let asked = [
            card(&agent, "Miss Scarlett"),
            card(&agent, "Candlestick"),
            card(&agent, "Study"),
        ];

        let first = agent.answer(carol, &asked).unwrap().unwrap();
        assert!(first == asked[0] || first == asked[1]);
        assert_eq!(agent.answer(bob, &asked).unwrap(), Some(first));
        assert_eq!(agent.disclosure().times_shown(first), 2);

        let nothing = [
            card(&agent, "Mrs Peacock"),
            card(&agent, "Rope"),
            card(&agent, "Study"),
        ];
        assert_eq!(agent.answer(carol, &nothing).unwrap(), None);
    }

    #[test]
    fn test_inconsistent_log_is_rejected() {
        let mut agent = agent(3);
        let log = [
            "Bob (Colonel Mustard) questioned Alice (Miss Scarlett) about Mrs Peacock with the Rope in the Study.",
            "Carol (Mrs White) did not show any cards.",
        ];
        let err = agent.observe(&log).unwrap_err();
        assert!(matches!(
            err,
            SleuthError::Log(LogError::ResponderMismatch { .. })
        ));
        assert_eq!(agent.lines_consumed(), 0);
    }
}
