//! Detective notebook - a read-only export of the knowledge table.

use board_rules::{CardGroup, PlayerId};
use serde::{Deserialize, Serialize};

use super::{CardStatus, Fact, Solution};

/// One row of the notebook.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotebookEntry {
    pub card: String,
    pub group: CardGroup,
    pub status: CardStatus,
    /// One fact per player, in seat order.
    pub facts: Vec<Fact>,
}

/// Snapshot of everything the agent knows, for display by the host UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notebook {
    pub players: usize,
    pub me: PlayerId,
    pub entries: Vec<NotebookEntry>,
    pub solution: Solution,
    pub open_constraints: usize,
}

impl Notebook {
    /// Serialize as pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Render as a fixed-width text table, one column per player.
    pub fn to_table_string(&self) -> String {
        let width = self
            .entries
            .iter()
            .map(|e| e.card.chars().count())
            .max()
            .unwrap_or(0);
        let mut output = String::new();

        output.push_str(&format!("{:width$} ", "", width = width));
        for player in 0..self.players {
            let marker = if player == self.me.index() { '*' } else { ' ' };
            output.push_str(&format!(" P{}{}", player, marker));
        }
        output.push('\n');

        let mut group = None;
        for entry in &self.entries {
            if group != Some(entry.group) {
                output.push_str(&format!("-- {} --\n", entry.group));
                group = Some(entry.group);
            }
            let flag = if entry.status.correct {
                '!'
            } else if entry.status.shared {
                '='
            } else {
                ' '
            };
            output.push_str(&format!("{:width$}{}", entry.card, flag, width = width));
            for fact in &entry.facts {
                output.push_str(&format!("  {} ", fact.mark()));
            }
            output.push('\n');
        }
        output
    }
}
