//! Knowledge module - who holds which card, deduced from what the table reveals.
//!
//! The knowledge base consists of:
//! - **Facts**: one belief per (player, card) pair
//! - **Card statuses**: per-card summary, including the deduced solution
//! - **Constraints**: "this player holds at least one of these cards"

mod engine;
mod fact;
mod notebook;

pub use engine::*;
pub use fact::*;
pub use notebook::*;
