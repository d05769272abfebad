//! # Board Rules
//!
//! Static data of the whodunit board game - cards, game setup, and board topology.
//! This crate is the single source of truth for the game's fixed structure and does not contain any AI logic.

pub mod board;
pub mod cards;

pub use board::*;
pub use cards::*;
