//! Incremental reader of the append-only game log.

use tracing::{debug, warn};

use super::{Answer, Exchange, LogError, LogGrammar, Roster};
use crate::knowledge::{Fact, KnowledgeBase, KnowledgeError};

/// Remembers how far into the log it has read; each poll only looks at the
/// lines appended since.
#[derive(Debug, Clone)]
pub struct LogReader {
    grammar: LogGrammar,
    consumed: usize,
}

impl LogReader {
    pub fn new() -> Result<Self, LogError> {
        Ok(Self {
            grammar: LogGrammar::new()?,
            consumed: 0,
        })
    }

    /// Number of lines fully processed.
    pub fn consumed(&self) -> usize {
        self.consumed
    }

    /// Process every complete exchange appended since the last poll.
    ///
    /// A question whose answer has not been written yet stays pending. On
    /// error the offending exchange is left unconsumed and the knowledge base
    /// is unchanged by it.
    pub fn poll<S: AsRef<str>>(
        &mut self,
        lines: &[S],
        roster: &Roster,
        knowledge: &mut KnowledgeBase,
    ) -> Result<Vec<Exchange>, LogError> {
        let mut exchanges = Vec::new();
        while self.consumed < lines.len() {
            let index = self.consumed;
            let deck = knowledge.deck();
            let Some(question) =
                self.grammar
                    .parse_question(lines[index].as_ref(), index + 1, roster, deck)?
            else {
                self.consumed += 1;
                continue;
            };
            let Some(answer_line) = lines.get(index + 1) else {
                break;
            };

            let answer =
                self.grammar
                    .parse_answer(answer_line.as_ref(), index + 2, roster, deck)?;
            if answer.responder() != question.asked {
                return Err(LogError::ResponderMismatch {
                    line: index + 2,
                    expected: roster.name(question.asked).to_string(),
                    actual: roster.name(answer.responder()).to_string(),
                });
            }
            if let Answer::ShowedCard {
                card: Some(card), ..
            } = answer
            {
                if !question.cards().contains(&card) {
                    return Err(LogError::ShownCardNotAsked {
                        line: index + 2,
                        name: deck.name(card).to_string(),
                    });
                }
            }

            let exchange = Exchange { question, answer };
            apply_exchange(knowledge, &exchange).map_err(|source| {
                warn!(line = index + 1, %source, "log event rejected");
                LogError::Knowledge {
                    line: index + 1,
                    source,
                }
            })?;
            debug!(
                asker = roster.name(question.asker),
                asked = roster.name(question.asked),
                "exchange processed"
            );
            exchanges.push(exchange);
            self.consumed += 2;
        }
        Ok(exchanges)
    }
}

/// Turn one exchange into knowledge updates, all or nothing.
pub fn apply_exchange(
    knowledge: &mut KnowledgeBase,
    exchange: &Exchange,
) -> Result<(), KnowledgeError> {
    let me = knowledge.me();
    let cards = exchange.question.cards();
    knowledge.transaction(|kb| {
        match exchange.answer {
            Answer::NoCards { responder } => {
                kb.set_fact_for_cards(responder, &cards, Fact::NotHolding)?;
            }
            Answer::ShowedCard {
                responder,
                card: Some(card),
            } => {
                kb.set_fact(responder, card, Fact::Holding)?;
            }
            Answer::ShowedCard {
                responder,
                card: None,
            } => {
                if responder != me {
                    kb.add_must_have_one(responder, &cards)?;
                }
            }
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use board_rules::{CardId, Deck, GameSetup, PlayerId};

    const ALICE: PlayerId = PlayerId(0);
    const BOB: PlayerId = PlayerId(1);
    const CAROL: PlayerId = PlayerId(2);

    fn c(index: usize) -> CardId {
        CardId(index)
    }

    fn setup() -> (Roster, KnowledgeBase) {
        let deck = Deck::reference();
        let setup = GameSetup::new(&deck, 3)
            .unwrap()
            .with_shared(&deck, vec![c(7), c(8)])
            .unwrap();
        let kb = KnowledgeBase::new(deck, setup, ALICE, &[c(0), c(1), c(2), c(3), c(6)]).unwrap();
        (Roster::new(["Alice", "Bob", "Carol"]), kb)
    }

    #[test]
    fn test_poll_applies_exchanges_and_waits_for_answers() {
        let (roster, mut kb) = setup();
        let mut reader = LogReader::new().unwrap();
        let mut log = vec![
            "Alice (Miss Scarlett) rolled a 9.".to_string(),
            "Alice (Miss Scarlett) questioned Bob (Colonel Mustard) about Mrs Peacock with the Rope in the Kitchen.".to_string(),
            "Bob (Colonel Mustard) showed one card: Rope.".to_string(),
            "Bob (Colonel Mustard) questioned Carol (Mrs White) about Professor Plum with the Revolver in the Ballroom.".to_string(),
            "Carol (Mrs White) did not show any cards.".to_string(),
            "Carol (Mrs White) questioned Bob (Colonel Mustard) about Mrs Peacock with the Spanner in the Study.".to_string(),
        ];

        let exchanges = reader.poll(&log, &roster, &mut kb).unwrap();
        assert_eq!(exchanges.len(), 2);
        assert_eq!(reader.consumed(), 5);
        assert_eq!(kb.fact(BOB, c(10)), Fact::Holding);
        for card in [5, 9, 13] {
            assert_eq!(kb.fact(CAROL, c(card)), Fact::NotHolding);
        }
        assert!(kb.constraints().is_empty());

        log.push("Bob (Colonel Mustard) showed one card.".to_string());
        let exchanges = reader.poll(&log, &roster, &mut kb).unwrap();
        assert_eq!(exchanges.len(), 1);
        assert_eq!(reader.consumed(), 7);
        assert_eq!(kb.constraints().len(), 1);
        assert_eq!(kb.constraints()[0].player, BOB);
        assert_eq!(kb.fact(BOB, c(4)), Fact::SuspectedHolding);

        assert!(reader.poll(&log, &roster, &mut kb).unwrap().is_empty());
    }

    #[test]
    fn test_agent_as_responder_records_nothing() {
        let (roster, mut kb) = setup();
        let before = kb.clone();
        let mut reader = LogReader::new().unwrap();
        let log = [
            "Carol (Mrs White) questioned Alice (Miss Scarlett) about Miss Scarlett with the Rope in the Kitchen.",
            "Alice (Miss Scarlett) showed one card.",
        ];

        reader.poll(&log, &roster, &mut kb).unwrap();
        assert_eq!(reader.consumed(), 2);
        assert_eq!(kb, before);
    }

    #[test]
    fn test_responder_mismatch_is_fatal() {
        let (roster, mut kb) = setup();
        let mut reader = LogReader::new().unwrap();
        let log = [
            "Alice (Miss Scarlett) questioned Bob (Colonel Mustard) about Mrs Peacock with the Rope in the Kitchen.",
            "Carol (Mrs White) did not show any cards.",
        ];

        let err = reader.poll(&log, &roster, &mut kb).unwrap_err();
        assert!(matches!(err, LogError::ResponderMismatch { line: 2, .. }));
        assert_eq!(reader.consumed(), 0);
    }

    #[test]
    fn test_contradicting_event_leaves_knowledge_untouched() {
        let (roster, mut kb) = setup();
        let before = kb.clone();
        let mut reader = LogReader::new().unwrap();
        let log = [
            "Alice (Miss Scarlett) questioned Bob (Colonel Mustard) about Miss Scarlett with the Rope in the Kitchen.",
            "Bob (Colonel Mustard) showed one card: Miss Scarlett.",
        ];

        let err = reader.poll(&log, &roster, &mut kb).unwrap_err();
        assert!(matches!(
            err,
            LogError::Knowledge {
                line: 1,
                source: KnowledgeError::Contradiction { .. }
            }
        ));
        assert_eq!(kb, before);
        assert_eq!(reader.consumed(), 0);
    }

    #[test]
    fn test_shown_card_must_be_one_asked_about() {
        let (roster, mut kb) = setup();
        let mut reader = LogReader::new().unwrap();
        let log = [
            "Alice (Miss Scarlett) questioned Bob (Colonel Mustard) about Mrs Peacock with the Rope in the Kitchen.",
            "Bob (Colonel Mustard) showed one card: Study.",
        ];

        let err = reader.poll(&log, &roster, &mut kb).unwrap_err();
        assert!(matches!(err, LogError::ShownCardNotAsked { .. }));
    }
}
