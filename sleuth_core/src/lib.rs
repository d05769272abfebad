//! # Sleuth Core
//!
//! The reasoning and planning engine of an autonomous whodunit player. This
//! crate reads the shared game log, deduces who holds which card, and plans
//! each turn on the board described by `board_rules`.
//!
//! ## Core Components
//!
//! - **knowledge**: Constraint propagation over "does player P hold card C"
//! - **events**: Question/answer lines of the game log and the incremental log reader
//! - **pathfinding**: A* routes between tiles and rooms, encoded as movement strings
//! - **strategy**: Per-turn target choice, movement budget, questions, accusations and card disclosure
//! - **agent**: One seat at the table, wiring the components together
//!
//! ## Design Philosophy
//!
//! - **Log-Driven**: Knowledge is rebuilt by replaying the log; there is no other persisted state
//! - **All-or-Nothing Updates**: An event that contradicts what is known is rejected and leaves the knowledge untouched
//! - **Deterministic**: The only randomness is an injected generator, so a seeded agent always plays the same way

pub mod agent;
pub mod config;
pub mod error;
pub mod events;
pub mod knowledge;
pub mod pathfinding;
pub mod strategy;

pub use agent::*;
pub use config::*;
pub use error::*;
pub use events::*;
pub use knowledge::*;
pub use pathfinding::*;
pub use strategy::*;
