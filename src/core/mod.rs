//! Core engine types: players, state, RNG, configuration.
//!
//! Everything here is plain data. The rules that transform it live in
//! `combat`, `phase`, `effects` and `rules`.

pub mod config;
pub mod player;
pub mod rng;
pub mod state;

pub use config::{EngineConfig, GameMode};
pub use player::{PlayerId, PlayerMap};
pub use rng::{GameRng, GameRngState};
pub use state::{DrawOutcome, GameState, Phase, PlayerState};
