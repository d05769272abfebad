//! Game events - the question/answer lines of the shared game log.
//!
//! The log is a sequence of line pairs:
//!
//! ```text
//! Alice (Miss Scarlett) questioned Bob (Colonel Mustard) about Mrs White with the Rope in the Kitchen.
//! Bob (Colonel Mustard) showed one card: Rope.
//! ```
//!
//! The card name after "showed one card" is only present in the asker's copy
//! of the log. Any line that is not a question is irrelevant and skipped.

mod reader;

pub use reader::*;

use board_rules::{CardGroup, CardId, Deck, PlayerId};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::knowledge::KnowledgeError;

const QUESTION_PATTERN: &str = r"^(?P<asker>.+?) \((?P<asker_character>[^)]*)\) questioned (?P<asked>.+?) \((?P<asked_character>[^)]*)\) about (?P<suspect>.+?) with the (?P<weapon>.+?) in the (?P<room>.+?)\.$";
const NO_CARDS_PATTERN: &str =
    r"^(?P<responder>.+?) \((?P<character>[^)]*)\) did not show any cards\.$";
const SHOWED_PATTERN: &str =
    r"^(?P<responder>.+?) \((?P<character>[^)]*)\) showed one card(?:: (?P<card>.+?))?\.$";

/// Errors raised while reading the game log.
#[derive(Debug, Error)]
pub enum LogError {
    #[error("Invalid log grammar: {0}")]
    Grammar(#[from] regex::Error),

    #[error("Line {line}: unknown player '{name}'")]
    UnknownPlayer { line: usize, name: String },

    #[error("Line {line}: unknown card '{name}'")]
    UnknownCard { line: usize, name: String },

    #[error("Line {line}: '{name}' is not a {expected} card")]
    WrongGroup {
        line: usize,
        name: String,
        expected: CardGroup,
    },

    #[error("Line {line}: expected an answer, found '{text}'")]
    MalformedAnswer { line: usize, text: String },

    #[error("Line {line}: answer from {actual}, but {expected} was asked")]
    ResponderMismatch {
        line: usize,
        expected: String,
        actual: String,
    },

    #[error("Line {line}: shown card '{name}' was not part of the question")]
    ShownCardNotAsked { line: usize, name: String },

    #[error("Line {line}: {source}")]
    Knowledge {
        line: usize,
        #[source]
        source: KnowledgeError,
    },
}

/// Player names in seat order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Roster {
    names: Vec<String>,
}

impl Roster {
    pub fn new<I>(names: I) -> Self
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Seat of a player by name.
    pub fn player(&self, name: &str) -> Option<PlayerId> {
        self.names.iter().position(|n| n == name).map(PlayerId)
    }

    /// Name of a seat.
    pub fn name(&self, player: PlayerId) -> &str {
        self.names
            .get(player.index())
            .map(String::as_str)
            .unwrap_or("?")
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

/// A question put by one player to another.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub asker: PlayerId,
    pub asked: PlayerId,
    pub suspect: CardId,
    pub weapon: CardId,
    pub room: CardId,
}

impl Question {
    /// The three cards asked about.
    pub fn cards(&self) -> [CardId; 3] {
        [self.suspect, self.weapon, self.room]
    }
}

/// The reply to a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Answer {
    NoCards { responder: PlayerId },
    /// `card` is only known to the asker.
    ShowedCard {
        responder: PlayerId,
        card: Option<CardId>,
    },
}

impl Answer {
    pub fn responder(&self) -> PlayerId {
        match self {
            Answer::NoCards { responder } | Answer::ShowedCard { responder, .. } => *responder,
        }
    }
}

/// A question together with its answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exchange {
    pub question: Question,
    pub answer: Answer,
}

/// Compiled line patterns.
#[derive(Debug, Clone)]
pub struct LogGrammar {
    question: Regex,
    no_cards: Regex,
    showed: Regex,
}

impl LogGrammar {
    pub fn new() -> Result<Self, LogError> {
        Ok(Self {
            question: Regex::new(QUESTION_PATTERN)?,
            no_cards: Regex::new(NO_CARDS_PATTERN)?,
            showed: Regex::new(SHOWED_PATTERN)?,
        })
    }

    /// Parse a question line. `Ok(None)` means the line is not a question.
    ///
    /// `line` is the 1-based line number used in error messages.
    pub fn parse_question(
        &self,
        text: &str,
        line: usize,
        roster: &Roster,
        deck: &Deck,
    ) -> Result<Option<Question>, LogError> {
        let Some(caps) = self.question.captures(text.trim()) else {
            return Ok(None);
        };
        Ok(Some(Question {
            asker: lookup_player(roster, &caps["asker"], line)?,
            asked: lookup_player(roster, &caps["asked"], line)?,
            suspect: lookup_card(deck, &caps["suspect"], CardGroup::Suspect, line)?,
            weapon: lookup_card(deck, &caps["weapon"], CardGroup::Weapon, line)?,
            room: lookup_card(deck, &caps["room"], CardGroup::Room, line)?,
        }))
    }

    /// Parse the answer line that follows a question.
    pub fn parse_answer(
        &self,
        text: &str,
        line: usize,
        roster: &Roster,
        deck: &Deck,
    ) -> Result<Answer, LogError> {
        let text = text.trim();
        if let Some(caps) = self.no_cards.captures(text) {
            return Ok(Answer::NoCards {
                responder: lookup_player(roster, &caps["responder"], line)?,
            });
        }
        if let Some(caps) = self.showed.captures(text) {
            let card = match caps.name("card") {
                Some(name) => Some(deck.find(name.as_str()).ok_or_else(|| {
                    LogError::UnknownCard {
                        line,
                        name: name.as_str().to_string(),
                    }
                })?),
                None => None,
            };
            return Ok(Answer::ShowedCard {
                responder: lookup_player(roster, &caps["responder"], line)?,
                card,
            });
        }
        Err(LogError::MalformedAnswer {
            line,
            text: text.to_string(),
        })
    }
}

fn lookup_player(roster: &Roster, name: &str, line: usize) -> Result<PlayerId, LogError> {
    roster.player(name).ok_or_else(|| LogError::UnknownPlayer {
        line,
        name: name.to_string(),
    })
}

fn lookup_card(
    deck: &Deck,
    name: &str,
    expected: CardGroup,
    line: usize,
) -> Result<CardId, LogError> {
    let card = deck.find(name).ok_or_else(|| LogError::UnknownCard {
        line,
        name: name.to_string(),
    })?;
    if deck.group_of(card) != Some(expected) {
        return Err(LogError::WrongGroup {
            line,
            name: name.to_string(),
            expected,
        });
    }
    Ok(card)
}
