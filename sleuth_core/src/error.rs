//! Crate-level error type.

use board_rules::{BoardError, SetupError};
use thiserror::Error;

use crate::config::ConfigError;
use crate::events::LogError;
use crate::knowledge::KnowledgeError;
use crate::pathfinding::PathError;
use crate::strategy::{DisclosureError, StrategyError};

/// Any failure of the agent. Each variant wraps the error of one component.
#[derive(Debug, Error)]
pub enum SleuthError {
    #[error(transparent)]
    Board(#[from] BoardError),

    #[error(transparent)]
    Setup(#[from] SetupError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Knowledge(#[from] KnowledgeError),

    #[error(transparent)]
    Log(#[from] LogError),

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Strategy(#[from] StrategyError),

    #[error(transparent)]
    Disclosure(#[from] DisclosureError),
}
