//! Engine error types.
//!
//! Two failure classes are kept apart so callers can route them:
//!
//! - [`ValidationError`]: the action is illegal in the current state. Show
//!   the player a message; the state is untouched.
//! - [`LookupError`]: a referenced card, unit or slot does not exist. This is
//!   a caller or data bug; log it and investigate.
//!
//! Malformed card effects are not errors at all; they resolve as no-ops.

use thiserror::Error;

use crate::cards::CardId;
use crate::core::{Phase, PlayerId};

/// An action rejected by the rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    #[error("action not allowed in {actual:?} phase (requires {expected:?})")]
    WrongPhase { expected: Phase, actual: Phase },

    #[error("{0} is not the active player")]
    NotActivePlayer(PlayerId),

    #[error("{0} does not hold the attack token")]
    NoAttackToken(PlayerId),

    #[error("{unit} is not controlled by {player}")]
    NotOwner { unit: CardId, player: PlayerId },

    #[error("{0} has summoning sickness")]
    SummoningSickness(CardId),

    #[error("{0} has already attacked this turn")]
    AlreadyAttacked(CardId),

    #[error("a taunt unit must be attacked first")]
    TauntBlocks,

    #[error("{0} is not a valid attack target")]
    InvalidTarget(CardId),

    #[error("not enough mana: requires {required}, available {available}")]
    InsufficientMana { required: i32, available: i32 },

    #[error("no free battlefield slot")]
    BoardFull,

    #[error("battlefield slot {0} is occupied")]
    SlotOccupied(usize),

    #[error("{0} has already completed the mulligan")]
    MulliganAlreadyComplete(PlayerId),

    #[error("the game is over")]
    GameOver,
}

/// A reference to something that does not exist.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LookupError {
    #[error("{card} is not in {player}'s hand")]
    CardNotInHand { card: CardId, player: PlayerId },

    #[error("attacker {0} not found on the battlefield")]
    AttackerNotFound(CardId),

    #[error("target {0} not found on the battlefield")]
    TargetNotFound(CardId),

    #[error("unit {0} not found on the battlefield")]
    UnitNotFound(CardId),

    #[error("slot {slot} out of range (max {max})")]
    SlotOutOfRange { slot: usize, max: usize },

    #[error("card template {0} not in catalog")]
    TemplateNotFound(CardId),

    #[error("unit {0} is already on the battlefield")]
    DuplicateUnit(CardId),

    #[error("card template {0} is already in the catalog")]
    DuplicateTemplate(CardId),
}

/// Any error returned by an engine operation.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error(transparent)]
    Rejected(#[from] ValidationError),

    #[error(transparent)]
    NotFound(#[from] LookupError),
}

impl EngineError {
    /// True for rule rejections (user-facing).
    #[must_use]
    pub fn is_validation(&self) -> bool {
        matches!(self, EngineError::Rejected(_))
    }

    /// True for missing references (log and investigate).
    #[must_use]
    pub fn is_lookup(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }
}

/// Failure reported by an event listener. Logged by the bus, never propagated.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("listener failed: {0}")]
pub struct ListenerError(pub String);

impl ListenerError {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
