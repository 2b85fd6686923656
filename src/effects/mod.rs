//! Effect system for card abilities and spells.
//!
//! - `EffectAction` / `EffectSpec`: Structured effect definitions
//! - `parser`: Text interpreter producing the same actions
//! - `EffectExecutor`: Applies actions to a working state
//! - `PersistentEffect`: Timed stat modifiers and their sweep
//!
//! Structured actions and interpreted text run through the same executor,
//! so combat and ability code never care where an effect came from.

mod action;
pub mod parser;
pub mod persistent;
mod resolver;

pub use action::{EffectAction, EffectSource, EffectSpec, EffectSpeed, TargetScope};
pub use parser::parse_effect_text;
pub use persistent::{
    apply_persistent_effect, attack_modifier, damage_reduction_modifier, remove_persistent_effect, sweep,
    EffectDuration, EffectId, PersistentEffect, StatModifiers,
};
pub use resolver::{damage_unit, draw_with_events, remove_dead_units, resolve_units, EffectExecutor};
