//! Match-level rules: the engine facade, win conditions, transactions.
//!
//! ## Key Types
//!
//! - `GameEngine`: Owns the services of a match and runs player actions
//! - `WinEvaluator` / `WinCondition`: Pluggable victory checks
//! - `TransactionManager`: Begin / commit / rollback around each action

pub mod engine;
pub mod transaction;
pub mod win;

pub use engine::{GameEngine, PlayCardRequest, SWEEP_PRIORITY};
pub use transaction::{Operation, TransactionManager};
pub use win::{
    BoardDomination, ConditionHistory, ConditionProgress, ElementalMastery, HealthDepletion, WinCheck, WinCondition,
    WinEvaluator, WinResult, BOARD_DOMINATION, ELEMENTAL_MASTERY, HEALTH_DEPLETION,
};
