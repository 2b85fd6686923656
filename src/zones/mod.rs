//! Card locations on the battlefield.
//!
//! Hands and decks are ordered sequences on `PlayerState`; the battlefield
//! is the only zone with positional rules.
//!
//! ## Key Types
//!
//! - `Battlefield`: Two fixed-length slot rows
//! - `SlotPosition`: Side + slot index of a unit
//! - `ElementCounts`: Per-element unit tally used by synergy bonuses

pub mod battlefield;

pub use battlefield::{Battlefield, ElementCounts, SlotPosition, MAX_SLOTS};
