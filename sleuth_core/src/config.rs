//! Session and rule configuration loaded from TOML.
//!
//! ```toml
//! players = ["Alice", "Bob", "Carol"]
//! me = "Alice"
//! hand = ["Miss Scarlett", "Colonel Mustard", "Mrs White", "Reverend Green", "Candlestick"]
//! shared = ["Dagger", "Lead Pipe"]
//!
//! [rules]
//! requestion_in_room = false
//! average_roll = 7
//! ```

use board_rules::{CardId, Deck, GameSetup, PlayerId, SetupError};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::events::Roster;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Parse(#[from] toml::de::Error),

    #[error("Player '{name}' is not seated at the table")]
    UnknownPlayer { name: String },

    #[error("Player '{name}' is seated twice")]
    DuplicatePlayer { name: String },

    #[error("Unknown card '{name}'")]
    UnknownCard { name: String },

    #[error(transparent)]
    Setup(#[from] SetupError),
}

/// House rules that change how the agent plays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Whether a question may be asked again in the room the agent is
    /// already standing in, without leaving it first.
    pub requestion_in_room: bool,
    /// Expected movement of one roll; the passage heuristics compare routes
    /// against it.
    pub average_roll: usize,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            requestion_in_room: false,
            average_roll: 7,
        }
    }
}

/// Everything the agent needs to know about the table it sits at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Player names in seat order, as they appear in the game log.
    pub players: Vec<String>,
    /// Which of `players` the agent is.
    pub me: String,
    /// Names of the cards dealt to the agent.
    pub hand: Vec<String>,
    /// Names of the cards lying face up.
    #[serde(default)]
    pub shared: Vec<String>,
    #[serde(default)]
    pub rules: RuleConfig,
}

impl SessionConfig {
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(source)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let source = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&source)
    }

    /// The seating as a roster, rejecting repeated names.
    pub fn roster(&self) -> Result<Roster, ConfigError> {
        for (index, name) in self.players.iter().enumerate() {
            if self.players[..index].contains(name) {
                return Err(ConfigError::DuplicatePlayer { name: name.clone() });
            }
        }
        Ok(Roster::new(self.players.iter().cloned()))
    }

    /// The agent's seat.
    pub fn me(&self) -> Result<PlayerId, ConfigError> {
        self.players
            .iter()
            .position(|n| *n == self.me)
            .map(PlayerId)
            .ok_or_else(|| ConfigError::UnknownPlayer {
                name: self.me.clone(),
            })
    }

    pub fn hand(&self, deck: &Deck) -> Result<Vec<CardId>, ConfigError> {
        resolve_cards(deck, &self.hand)
    }

    pub fn shared(&self, deck: &Deck) -> Result<Vec<CardId>, ConfigError> {
        resolve_cards(deck, &self.shared)
    }

    /// Game setup for this table, face-up cards included.
    pub fn setup(&self, deck: &Deck) -> Result<GameSetup, ConfigError> {
        let setup = GameSetup::new(deck, self.players.len())?;
        Ok(setup.with_shared(deck, self.shared(deck)?)?)
    }
}

fn resolve_cards(deck: &Deck, names: &[String]) -> Result<Vec<CardId>, ConfigError> {
    names
        .iter()
        .map(|name| {
            deck.find(name)
                .ok_or_else(|| ConfigError::UnknownCard { name: name.clone() })
        })
        .collect()
}
