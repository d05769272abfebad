//! Which card to show when the agent has to answer a question.

use board_rules::{CardId, PlayerId};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DisclosureError {
    #[error("No matching card to show")]
    NoCandidates,

    #[error("Card {card} is not in the agent's hand")]
    NotInHand { card: CardId },
}

/// A card the agent has shown, and to whom.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disclosure {
    pub to: PlayerId,
    pub card: CardId,
}

/// Picks the card that leaks the least, preferring cards observers have
/// already seen.
#[derive(Debug, Clone)]
pub struct DisclosurePolicy<R> {
    hand: Vec<CardId>,
    history: Vec<Disclosure>,
    remembered: HashMap<Vec<CardId>, CardId>,
    rng: R,
}

impl<R: Rng> DisclosurePolicy<R> {
    pub fn new(hand: Vec<CardId>, rng: R) -> Self {
        Self {
            hand,
            history: Vec::new(),
            remembered: HashMap::new(),
            rng,
        }
    }

    /// Every card shown so far, oldest first.
    pub fn history(&self) -> &[Disclosure] {
        &self.history
    }

    pub fn was_shown_to(&self, player: PlayerId, card: CardId) -> bool {
        self.history.iter().any(|d| d.to == player && d.card == card)
    }

    pub fn times_shown(&self, card: CardId) -> usize {
        self.history.iter().filter(|d| d.card == card).count()
    }

    /// Choose which of `candidates` to show `asker`. Does not record it.
    pub fn choose(&mut self, asker: PlayerId, candidates: &[CardId]) -> Result<CardId, DisclosureError> {
        let mut matches = candidates.to_vec();
        matches.sort();
        matches.dedup();
        if let Some(&card) = matches.iter().find(|c| !self.hand.contains(c)) {
            return Err(DisclosureError::NotInHand { card });
        }
        match matches.as_slice() {
            [] => return Err(DisclosureError::NoCandidates),
            [only] => return Ok(*only),
            _ => {}
        }

        if let Some(&card) = matches.iter().find(|c| self.was_shown_to(asker, **c)) {
            debug!(%asker, %card, "showing a card the asker has seen");
            return Ok(card);
        }

        let mut most_shown: Option<(usize, CardId)> = None;
        for &card in &matches {
            let times = self.times_shown(card);
            if times > 0 && most_shown.map_or(true, |(best, _)| times > best) {
                most_shown = Some((times, card));
            }
        }
        if let Some((_, card)) = most_shown {
            debug!(%asker, %card, "showing a card others have seen");
            return Ok(card);
        }

        if let Some(&card) = self.remembered.get(&matches) {
            return Ok(card);
        }
        let card = matches[self.rng.gen_range(0..matches.len())];
        self.remembered.insert(matches, card);
        Ok(card)
    }

    /// Record that `card` was shown to `asker`.
    pub fn reveal(&mut self, asker: PlayerId, card: CardId) -> Result<(), DisclosureError> {
        if !self.hand.contains(&card) {
            return Err(DisclosureError::NotInHand { card });
        }
        self.history.push(Disclosure { to: asker, card });
        Ok(())
    }
}
