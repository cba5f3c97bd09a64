use serde::{Deserialize, Serialize};

use crate::{EdgeShape, Session};

/// The edge-compatibility predicate: which shape pairs may legally abut.
///
/// The validator calls this once per occupied neighbor and is agnostic to the
/// definition. Swapping the game's matching rule means swapping the
/// implementation, nothing else.
pub trait MatchRule: Send + Sync {
    fn edges_match(&self, a: EdgeShape, b: EdgeShape) -> bool;
    fn name(&self) -> &'static str;
}

/// Two edges abut legally iff they carry the same shape tag.
pub struct SameShape;

impl MatchRule for SameShape {
    fn edges_match(&self, a: EdgeShape, b: EdgeShape) -> bool {
        a == b
    }

    fn name(&self) -> &'static str {
        "same-shape"
    }
}

/// Every edge pair abuts legally. Useful for exercising the surrounding
/// machinery without shape constraints.
pub struct AnyShape;

impl MatchRule for AnyShape {
    fn edges_match(&self, _a: EdgeShape, _b: EdgeShape) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "any-shape"
    }
}

/// A terminal score line, as broadcast in the `END` message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreEntry {
    pub color: String,
    pub score: i64,
}

/// Computes the final scores of an ended game.
///
/// Must be deterministic in the session state; called exactly once, at the
/// moment the session ends.
pub trait ScorePolicy: Send + Sync {
    fn score(&self, session: &Session) -> Vec<ScoreEntry>;
    fn name(&self) -> &'static str;
}

/// Each participant scores the summed dot count of their placements.
pub struct PlacedDots;

impl ScorePolicy for PlacedDots {
    fn score(&self, session: &Session) -> Vec<ScoreEntry> {
        session
            .participants()
            .iter()
            .map(|p| {
                let score: i64 = session
                    .board()
                    .iter()
                    .filter(|(_, placement)| placement.owner == p.id)
                    .map(|(_, placement)| i64::from(placement.card.dots))
                    .sum();
                ScoreEntry {
                    color: p.color.clone(),
                    score,
                }
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "placed-dots"
    }
}

/// Each participant scores the negated dot count of the cards left in their
/// hand, so an emptied hand scores zero and stragglers go negative.
pub struct RemainingDotsPenalty;

impl ScorePolicy for RemainingDotsPenalty {
    fn score(&self, session: &Session) -> Vec<ScoreEntry> {
        session
            .participants()
            .iter()
            .map(|p| {
                let penalty: i64 = p.hand.iter().map(|card| i64::from(card.dots)).sum();
                ScoreEntry {
                    color: p.color.clone(),
                    score: -penalty,
                }
            })
            .collect()
    }

    fn name(&self) -> &'static str {
        "remaining-dots-penalty"
    }
}

/// What happens to a participant whose connection drops mid-game.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum DisconnectPolicy {
    /// The participant leaves the turn rotation permanently. Their placements
    /// keep counting for scoring.
    #[default]
    Forfeit,
    /// The participant keeps their hand but is skipped while disconnected.
    SkipTurns,
}
