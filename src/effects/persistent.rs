//! Persistent effects: stat modifiers that outlive the action creating them.
//!
//! Attack and damage-reduction modifiers are read on demand by combat. Health
//! modifiers change `current_health`/`max_health` when the effect is applied
//! and are reverted when it expires.
//!
//! ## Sweep rules
//!
//! `sweep` runs on `turn_start`, `turn_end` and `phase_changed`. Every sweep:
//!
//! - counts numeric `remaining_duration` down; 0 expires.
//! - expires `end_of_turn` effects.
//! - expires `while_on_battlefield` effects whose source is gone, and any
//!   effect whose targets have all left play.
//!
//! A `phase_changed` out of combat resolution also expires
//! `until_combat_ends` effects.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cards::CardId;
use crate::core::{GameState, Phase};
use crate::events::{EventData, EventDraft, EventRef, GameEvent, GameEventType};

/// Persistent effect identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId(pub u32);

impl EffectId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

/// How long a persistent effect lasts.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectDuration {
    #[default]
    Permanent,
    EndOfTurn,
    WhileOnBattlefield,
    UntilCombatEnds,
}

/// Stat deltas carried by an effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StatModifiers {
    #[serde(default)]
    pub attack: i32,
    #[serde(default)]
    pub health: i32,
    /// Subtracted from every hit taken.
    #[serde(default)]
    pub damage_reduction: i32,
}

impl StatModifiers {
    #[must_use]
    pub const fn new(attack: i32, health: i32) -> Self {
        Self {
            attack,
            health,
            damage_reduction: 0,
        }
    }

    #[must_use]
    pub const fn with_damage_reduction(mut self, amount: i32) -> Self {
        self.damage_reduction = amount;
        self
    }
}

/// An active modifier on one or more units.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PersistentEffect {
    pub id: EffectId,
    pub source_card_id: Option<CardId>,
    pub duration: EffectDuration,
    pub targets: Vec<CardId>,
    pub stat_modifiers: StatModifiers,
    /// Sweep countdown, independent of `duration`.
    pub remaining_duration: Option<u32>,
}

impl PersistentEffect {
    #[must_use]
    pub fn new(
        id: EffectId,
        source_card_id: Option<CardId>,
        duration: EffectDuration,
        targets: Vec<CardId>,
        stat_modifiers: StatModifiers,
    ) -> Self {
        Self {
            id,
            source_card_id,
            duration,
            targets,
            stat_modifiers,
            remaining_duration: None,
        }
    }

    /// Expire after `sweeps` sweeps (builder pattern).
    #[must_use]
    pub fn for_sweeps(mut self, sweeps: u32) -> Self {
        self.remaining_duration = Some(sweeps);
        self
    }

    #[must_use]
    pub fn affects(&self, unit: CardId) -> bool {
        self.targets.contains(&unit)
    }
}

/// Sum of attack modifiers on a unit.
#[must_use]
pub fn attack_modifier(state: &GameState, unit: CardId) -> i32 {
    state
        .effects
        .iter()
        .filter(|e| e.affects(unit))
        .map(|e| e.stat_modifiers.attack)
        .sum()
}

/// Sum of damage-reduction modifiers on a unit.
#[must_use]
pub fn damage_reduction_modifier(state: &GameState, unit: CardId) -> i32 {
    state
        .effects
        .iter()
        .filter(|e| e.affects(unit))
        .map(|e| e.stat_modifiers.damage_reduction)
        .sum()
}

/// Register an effect and apply its health modifier to the targets.
pub fn apply_persistent_effect(state: &mut GameState, effect: PersistentEffect) -> EffectId {
    let health = effect.stat_modifiers.health;
    if health != 0 {
        for &target in &effect.targets {
            if let Some(unit) = state.battlefield.get_mut(target) {
                unit.max_health += health;
                unit.current_health += health;
            }
        }
    }
    let id = effect.id;
    state.effects.push_back(effect);
    id
}

/// Remove an effect, reverting its health modifier.
///
/// A unit never drops below 1 health from an expiring buff.
pub fn remove_persistent_effect(state: &mut GameState, id: EffectId) -> Option<PersistentEffect> {
    let index = state.effects.iter().position(|e| e.id == id)?;
    let effect = state.effects.remove(index);

    let health = effect.stat_modifiers.health;
    if health != 0 {
        for &target in &effect.targets {
            if let Some(unit) = state.battlefield.get_mut(target) {
                unit.max_health -= health;
                if health > 0 {
                    unit.current_health = unit.current_health.min(unit.max_health).max(1);
                } else {
                    unit.current_health -= health;
                }
            }
        }
    }
    Some(effect)
}

/// Expire effects in response to `event`. Returns `effect_expired` drafts.
pub fn sweep(state: &mut GameState, event: &GameEvent) -> Vec<EventDraft> {
    let leaving_combat = matches!(
        event.data,
        EventData::PhaseChange { from: Phase::CombatResolution, .. }
    );

    let mut expired = Vec::new();
    let mut countdowns = Vec::new();

    for effect in state.effects.iter() {
        let targets_gone = !effect.targets.is_empty()
            && effect.targets.iter().all(|&t| !state.battlefield.contains(t));
        let source_gone = effect.duration == EffectDuration::WhileOnBattlefield
            && effect.source_card_id.map_or(true, |s| !state.battlefield.contains(s));

        let by_duration = match effect.duration {
            EffectDuration::EndOfTurn => true,
            EffectDuration::UntilCombatEnds => leaving_combat,
            _ => false,
        };

        let counted_out = effect.remaining_duration.is_some_and(|n| n <= 1);

        if targets_gone || source_gone || by_duration || counted_out {
            expired.push(effect.id);
        } else if effect.remaining_duration.is_some() {
            countdowns.push(effect.id);
        }
    }

    for effect in state.effects.iter_mut() {
        if countdowns.contains(&effect.id) {
            if let Some(n) = effect.remaining_duration.as_mut() {
                *n -= 1;
            }
        }
    }

    expired
        .into_iter()
        .filter_map(|id| remove_persistent_effect(state, id))
        .map(|effect| {
            debug!(effect = effect.id.raw(), trigger = %event.event_type, "persistent effect expired");
            let draft = EventDraft::new(GameEventType::EffectExpired).with_amount(effect.id.raw() as i32);
            match effect.source_card_id {
                Some(card) => draft.with_source(EventRef::Card(card)),
                None => draft,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, UnitInstance};
    use crate::core::{EngineConfig, PlayerId};
    use crate::events::EventId;

    fn setup() -> GameState {
        let mut state = GameState::new(&EngineConfig::default());
        for id in 1..=2 {
            let card = Card::unit(CardId::new(id), "Unit", 2, 2, 3);
            state.battlefield.place(UnitInstance::place(card, PlayerId::PLAYER), None).unwrap();
        }
        state
    }

    fn event(state: &GameState, event_type: GameEventType, data: EventData) -> GameEvent {
        GameEvent::build(EventId::new(0), 0, EventDraft::new(event_type).with_data(data), state)
    }

    fn add(state: &mut GameState, duration: EffectDuration, modifiers: StatModifiers) -> EffectId {
        let id = state.next_effect_id();
        let effect = PersistentEffect::new(id, Some(CardId::new(1)), duration, vec![CardId::new(2)], modifiers);
        apply_persistent_effect(state, effect)
    }

    #[test]
    fn test_modifiers_sum() {
        let mut state = setup();
        add(&mut state, EffectDuration::Permanent, StatModifiers::new(2, 0));
        add(&mut state, EffectDuration::Permanent, StatModifiers::new(1, 0).with_damage_reduction(1));

        assert_eq!(attack_modifier(&state, CardId::new(2)), 3);
        assert_eq!(damage_reduction_modifier(&state, CardId::new(2)), 1);
        assert_eq!(attack_modifier(&state, CardId::new(1)), 0);
    }

    #[test]
    fn test_health_modifier_applied_and_reverted() {
        let mut state = setup();
        let id = add(&mut state, EffectDuration::Permanent, StatModifiers::new(0, 2));

        let unit = state.battlefield.get(CardId::new(2)).unwrap();
        assert_eq!((unit.current_health, unit.max_health), (5, 5));

        state.battlefield.get_mut(CardId::new(2)).unwrap().current_health = 2;
        remove_persistent_effect(&mut state, id);

        let unit = state.battlefield.get(CardId::new(2)).unwrap();
        assert_eq!((unit.current_health, unit.max_health), (2, 3));
    }

    #[test]
    fn test_expiring_buff_never_kills() {
        let mut state = setup();
        let id = add(&mut state, EffectDuration::Permanent, StatModifiers::new(0, 4));
        state.battlefield.get_mut(CardId::new(2)).unwrap().current_health = 1;

        remove_persistent_effect(&mut state, id);
        assert_eq!(state.battlefield.get(CardId::new(2)).unwrap().current_health, 1);
    }

    #[test]
    fn test_end_of_turn_expires_on_any_sweep() {
        for trigger in [GameEventType::TurnStart, GameEventType::TurnEnd, GameEventType::PhaseChanged] {
            let mut state = setup();
            add(&mut state, EffectDuration::EndOfTurn, StatModifiers::new(1, 0));
            add(&mut state, EffectDuration::Permanent, StatModifiers::new(1, 0));

            let tick = event(&state, trigger, EventData::None);
            assert_eq!(sweep(&mut state, &tick).len(), 1);
            assert_eq!(state.effects.len(), 1);
            assert_eq!(state.effects[0].duration, EffectDuration::Permanent);
        }
    }

    #[test]
    fn test_until_combat_ends() {
        let mut state = setup();
        add(&mut state, EffectDuration::UntilCombatEnds, StatModifiers::new(2, 0));

        let into = event(&state, GameEventType::PhaseChanged, EventData::PhaseChange { from: Phase::Action, to: Phase::CombatResolution });
        sweep(&mut state, &into);
        assert_eq!(state.effects.len(), 1);

        let out = event(&state, GameEventType::PhaseChanged, EventData::PhaseChange { from: Phase::CombatResolution, to: Phase::Action });
        sweep(&mut state, &out);
        assert!(state.effects.is_empty());
    }

    #[test]
    fn test_while_on_battlefield_follows_source() {
        let mut state = setup();
        add(&mut state, EffectDuration::WhileOnBattlefield, StatModifiers::new(1, 0));

        let tick = event(&state, GameEventType::TurnStart, EventData::None);
        sweep(&mut state, &tick);
        assert_eq!(state.effects.len(), 1);

        state.battlefield.remove(CardId::new(1));
        sweep(&mut state, &tick);
        assert!(state.effects.is_empty());
    }

    #[test]
    fn test_numeric_countdown() {
        let mut state = setup();
        let id = state.next_effect_id();
        let effect = PersistentEffect::new(id, None, EffectDuration::Permanent, vec![CardId::new(2)], StatModifiers::new(1, 0))
            .for_sweeps(3);
        apply_persistent_effect(&mut state, effect);

        let start = event(&state, GameEventType::TurnStart, EventData::None);
        let change = event(&state, GameEventType::PhaseChanged, EventData::PhaseChange { from: Phase::RoundStart, to: Phase::Action });
        let end = event(&state, GameEventType::TurnEnd, EventData::None);

        sweep(&mut state, &start);
        assert_eq!(state.effects[0].remaining_duration, Some(2));

        sweep(&mut state, &change);
        assert_eq!(state.effects[0].remaining_duration, Some(1));

        assert_eq!(sweep(&mut state, &end).len(), 1);
        assert!(state.effects.is_empty());
    }

    #[test]
    fn test_effects_on_departed_targets_are_dropped() {
        let mut state = setup();
        add(&mut state, EffectDuration::Permanent, StatModifiers::new(1, 0));
        state.battlefield.remove(CardId::new(2));

        let tick = event(&state, GameEventType::TurnStart, EventData::None);
        sweep(&mut state, &tick);
        assert!(state.effects.is_empty());
    }
}
