//! Combat: attack validation, target selection, damage resolution.
//!
//! ## Key Types
//!
//! - `AttackRequest` / `AttackTarget`: What the active player wants to hit
//! - `ValidTargets`: Units and nexus an attacker may choose
//! - `CombatReport`: Damage, healing and deaths of one resolved attack
//!
//! Stats are recomputed from the state on every attack (persistent effects,
//! reversed penalty, cosmic alignment, element synergy); no combat value is
//! ever cached on a unit.

pub mod modifiers;
mod resolver;
mod targeting;

pub use modifiers::{
    combat_damage, damage_reduction, effective_attack, effective_health, synergy_bonus, SynergyBonus,
    SYNERGY_SPECIAL_THRESHOLD,
};
pub use resolver::{declare_attack, resolve_attack, validate_attack, AttackRequest, AttackTarget, CombatReport};
pub use targeting::{get_valid_targets, ValidTargets};
