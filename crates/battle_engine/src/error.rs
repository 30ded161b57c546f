//! Engine error taxonomy.
//!
//! Everything here is an *expected outcome* surfaced to the caller, not a
//! panic. Content-level problems (unknown move, banned move, choice lock)
//! are narrated inside the turn log instead and never reach this enum.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BattleError {
    /// No live session exists for the given battle id.
    #[error("Battle not found")]
    NotFound,

    /// The battler id does not belong to either side of the session.
    #[error("battler {id} is not part of this battle")]
    InvalidBattler { id: i64 },

    /// The action type is illegal in the current phase, e.g. a move
    /// submitted while a forced switch is pending.
    #[error("{reason}")]
    WrongPhase { reason: String },

    /// An action arrived after the battle ended.
    #[error("Battle is already over")]
    BattleOver,

    /// Switch target out of range, fainted, or already on the field.
    #[error("{reason}")]
    InvalidTarget { reason: String },

    /// A side was started with an empty party.
    #[error("{side} must bring at least one creature")]
    InvalidParty { side: &'static str },

    /// A descriptor lookup failed while building a combatant.
    #[error("missing data: {0}")]
    MissingData(String),
}

impl BattleError {
    pub(crate) fn wrong_phase(reason: impl Into<String>) -> Self {
        BattleError::WrongPhase {
            reason: reason.into(),
        }
    }

    pub(crate) fn invalid_target(reason: impl Into<String>) -> Self {
        BattleError::InvalidTarget {
            reason: reason.into(),
        }
    }
}
