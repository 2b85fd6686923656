//! Turn structure.
//!
//! ```text
//! Mulligan -> RoundStart -> Action <-> CombatResolution
//!                 ^           |
//!                 +- EndRound <+
//!
//! any non-terminal phase -> GameOver (once an outcome is recorded)
//! ```

mod machine;

pub use machine::{PhaseMachine, Transition, TransitionGuard, TransitionStep};
