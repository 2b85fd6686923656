//! Combat stat modifiers.
//!
//! Everything here is computed fresh from the current state; nothing is
//! cached on units.
//!
//! ## Effective attack
//!
//! ```text
//! base attack
//!   + persistent attack modifiers
//!   - reversed penalty
//!   + cosmic alignment bonus (if enabled)
//!   + element synergy attack bonus
//! ```
//!
//! ## Damage reduction (defender)
//!
//! ```text
//!   tough (1)
//!   + persistent damage reduction
//!   + earth durability (4+ earth units, earth defenders)
//! ```
//!
//! ## Effective health
//!
//! ```text
//! current health + element synergy health bonus
//! ```
//!
//! The synergy health is extra health for the exchange only. Damage eats it
//! first; the rest comes off `current_health`.

use crate::cards::{Element, Keyword, UnitInstance};
use crate::core::{EngineConfig, GameState};
use crate::effects::{attack_modifier, damage_reduction_modifier};

/// Synergy bonus granted to each unit of an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SynergyBonus {
    pub attack: i32,
    pub health: i32,
}

/// Bonus for `count` same-element units on one side.
#[must_use]
pub const fn synergy_bonus(count: usize) -> SynergyBonus {
    match count {
        0 | 1 => SynergyBonus { attack: 0, health: 0 },
        2 => SynergyBonus { attack: 1, health: 0 },
        3 => SynergyBonus { attack: 1, health: 1 },
        _ => SynergyBonus { attack: 2, health: 1 },
    }
}

/// Same-element count that unlocks the standing special.
pub const SYNERGY_SPECIAL_THRESHOLD: usize = 4;

/// Synergy bonus for one unit, from its side of the battlefield.
#[must_use]
pub fn unit_synergy(state: &GameState, unit: &UnitInstance) -> SynergyBonus {
    let counts = state.battlefield.count_units_by_element(unit.owner);
    synergy_bonus(counts.get(unit.card.element))
}

/// True if the unit's side has the standing special of its element.
#[must_use]
pub fn has_synergy_special(state: &GameState, unit: &UnitInstance, element: Element) -> bool {
    unit.card.element == element
        && state.battlefield.count_units_by_element(unit.owner).get(element) >= SYNERGY_SPECIAL_THRESHOLD
}

/// +1 attack for units of the round's aligned element, when enabled.
#[must_use]
pub fn cosmic_bonus(state: &GameState, config: &EngineConfig, unit: &UnitInstance) -> i32 {
    if config.cosmic_alignment && unit.card.element == Element::aligned_for_round(state.round) {
        1
    } else {
        0
    }
}

/// Attack before the defender's reduction. Never negative.
#[must_use]
pub fn effective_attack(state: &GameState, config: &EngineConfig, unit: &UnitInstance) -> i32 {
    let attack = unit.card.attack + attack_modifier(state, unit.id()) - unit.card.reversed_penalty()
        + cosmic_bonus(state, config, unit)
        + unit_synergy(state, unit).attack;
    attack.max(0)
}

/// Damage subtracted from every hit the unit takes in combat.
#[must_use]
pub fn damage_reduction(state: &GameState, unit: &UnitInstance) -> i32 {
    let tough = i32::from(unit.has_keyword(Keyword::Tough));
    let durability = i32::from(has_synergy_special(state, unit, Element::Earth));
    tough + damage_reduction_modifier(state, unit.id()) + durability
}

/// Health the unit fights with: current health plus its synergy health.
#[must_use]
pub fn effective_health(state: &GameState, unit: &UnitInstance) -> i32 {
    unit.current_health + unit_synergy(state, unit).health
}

/// Combat damage `attacker` deals to `defender`, before shield and keywords.
#[must_use]
pub fn combat_damage(state: &GameState, config: &EngineConfig, attacker: &UnitInstance, defender: &UnitInstance) -> i32 {
    (effective_attack(state, config, attacker) - damage_reduction(state, defender)).max(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, CardId};
    use crate::core::PlayerId;
    use crate::effects::{apply_persistent_effect, EffectDuration, PersistentEffect, StatModifiers};

    fn place(state: &mut GameState, id: u32, owner: PlayerId, card: Card) -> UnitInstance {
        let card = card.with_id(CardId::new(id));
        state.battlefield.place(UnitInstance::place(card, owner), None).unwrap();
        state.battlefield.get(CardId::new(id)).cloned().unwrap()
    }

    fn unit(attack: i32, element: Element) -> Card {
        Card::unit(CardId::new(0), "Unit", 3, attack, 5).with_element(element)
    }

    #[test]
    fn test_synergy_table() {
        assert_eq!(synergy_bonus(1), SynergyBonus { attack: 0, health: 0 });
        assert_eq!(synergy_bonus(2), SynergyBonus { attack: 1, health: 0 });
        assert_eq!(synergy_bonus(3), SynergyBonus { attack: 1, health: 1 });
        assert_eq!(synergy_bonus(6), SynergyBonus { attack: 2, health: 1 });
    }

    #[test]
    fn test_plain_attack() {
        let mut state = GameState::new(&EngineConfig::default());
        let attacker = place(&mut state, 1, PlayerId::PLAYER, unit(4, Element::Fire));
        let defender = place(&mut state, 2, PlayerId::OPPONENT, unit(2, Element::Water));

        assert_eq!(effective_attack(&state, &EngineConfig::default(), &attacker), 4);
        assert_eq!(combat_damage(&state, &EngineConfig::default(), &attacker, &defender), 4);
    }

    #[test]
    fn test_reversed_penalty_and_floor() {
        let mut state = GameState::new(&EngineConfig::default());
        let reversed = place(&mut state, 1, PlayerId::PLAYER, unit(4, Element::Fire).reversed());
        assert_eq!(effective_attack(&state, &EngineConfig::default(), &reversed), 3);

        let weak = place(&mut state, 2, PlayerId::PLAYER, Card::unit(CardId::new(0), "Weak", 9, 1, 1).reversed());
        assert_eq!(effective_attack(&state, &EngineConfig::default(), &weak), 0);
    }

    #[test]
    fn test_synergy_counts_own_side_only() {
        let mut state = GameState::new(&EngineConfig::default());
        let a = place(&mut state, 1, PlayerId::PLAYER, unit(2, Element::Air));
        place(&mut state, 2, PlayerId::PLAYER, unit(2, Element::Air));
        place(&mut state, 3, PlayerId::OPPONENT, unit(2, Element::Air));

        assert_eq!(unit_synergy(&state, &a), SynergyBonus { attack: 1, health: 0 });
        assert_eq!(effective_attack(&state, &EngineConfig::default(), &a), 3);
    }

    #[test]
    fn test_reduction_sources() {
        let mut state = GameState::new(&EngineConfig::default());
        let tough = place(&mut state, 1, PlayerId::OPPONENT, unit(1, Element::Water).with_keyword(Keyword::Tough));
        assert_eq!(damage_reduction(&state, &tough), 1);

        let id = state.next_effect_id();
        apply_persistent_effect(
            &mut state,
            PersistentEffect::new(id, None, EffectDuration::Permanent, vec![CardId::new(1)], StatModifiers::new(0, 0).with_damage_reduction(2)),
        );
        let tough = state.battlefield.get(CardId::new(1)).cloned().unwrap();
        assert_eq!(damage_reduction(&state, &tough), 3);
    }

    #[test]
    fn test_earth_durability() {
        let mut state = GameState::new(&EngineConfig::default());
        for id in 1..=4 {
            place(&mut state, id, PlayerId::OPPONENT, unit(1, Element::Earth));
        }
        let earth = state.battlefield.get(CardId::new(1)).cloned().unwrap();

        // 4+ synergy: +1 durability, +1 health.
        assert_eq!(damage_reduction(&state, &earth), 1);
        assert_eq!(effective_health(&state, &earth), 6);
        assert!(has_synergy_special(&state, &earth, Element::Earth));
    }

    #[test]
    fn test_synergy_health_is_not_reduction() {
        let mut state = GameState::new(&EngineConfig::default());
        for id in 1..=3 {
            place(&mut state, id, PlayerId::OPPONENT, unit(0, Element::Water));
        }
        let attacker = place(&mut state, 9, PlayerId::PLAYER, unit(1, Element::Fire));
        let water = state.battlefield.get(CardId::new(1)).cloned().unwrap();

        assert_eq!(damage_reduction(&state, &water), 0);
        assert_eq!(combat_damage(&state, &EngineConfig::default(), &attacker, &water), 1);
        assert_eq!(effective_health(&state, &water), 6);
    }

    #[test]
    fn test_cosmic_alignment_toggle() {
        let mut state = GameState::new(&EngineConfig::default());
        let aligned = Element::aligned_for_round(state.round);
        let unit = place(&mut state, 1, PlayerId::PLAYER, unit(2, aligned));

        assert_eq!(cosmic_bonus(&state, &EngineConfig::default(), &unit), 0);
        let config = EngineConfig::default().with_cosmic_alignment();
        assert_eq!(effective_attack(&state, &config, &unit), 3);
    }
}
