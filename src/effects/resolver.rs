//! Effect execution.
//!
//! `EffectExecutor` applies an [`EffectSpec`] to a working state. Every
//! action is resolved against the state as it stands when that action runs,
//! so a later action sees the results of an earlier one. Events describing
//! each change are pushed to the caller's buffer.
//!
//! Execution never fails. Scopes that resolve to nothing, and text the
//! interpreter cannot read, simply do nothing.

use tracing::debug;

use super::action::{EffectAction, EffectSource, EffectSpec, TargetScope};
use super::persistent::{apply_persistent_effect, PersistentEffect};
use crate::cards::{CardId, Keyword, UnitInstance};
use crate::core::{DrawOutcome, GameState, PlayerId};
use crate::events::{EventDraft, EventRef, GameEventType};
use crate::zones::SlotPosition;

/// Applies effects to game state.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EffectExecutor {
    max_hand_size: usize,
    max_mana: i32,
}

impl Default for EffectExecutor {
    fn default() -> Self {
        Self::new(10, 10)
    }
}

impl EffectExecutor {
    #[must_use]
    pub const fn new(max_hand_size: usize, max_mana: i32) -> Self {
        Self { max_hand_size, max_mana }
    }

    /// Execute every action of `spec`. Returns the number of actions run.
    pub fn execute(
        &self,
        spec: &EffectSpec,
        source: &EffectSource,
        state: &mut GameState,
        events: &mut Vec<EventDraft>,
    ) -> usize {
        let actions = spec.resolve_actions();
        if actions.is_empty() {
            debug!(card = ?source.card, "effect resolved to no actions");
        }
        for action in &actions {
            self.apply(action, source, state, events);
        }
        actions.len()
    }

    /// Execute a single action.
    pub fn apply(&self, action: &EffectAction, source: &EffectSource, state: &mut GameState, events: &mut Vec<EventDraft>) {
        let origin = source
            .card
            .map_or(EventRef::Player(source.controller), EventRef::Card);

        match action {
            EffectAction::Damage { amount, scope } => {
                if let Some(player) = nexus_of(*scope, source.controller) {
                    state.players[player].health -= *amount;
                    events.push(
                        EventDraft::new(GameEventType::NexusDamaged)
                            .with_source(origin)
                            .with_target(EventRef::Player(player))
                            .with_amount(*amount),
                    );
                } else {
                    for unit in resolve_units(*scope, source, state) {
                        damage_unit(state, unit, *amount, origin, events);
                    }
                    remove_dead_units(state, events);
                }
            }

            EffectAction::Heal { amount, scope } => {
                if let Some(player) = nexus_of(*scope, source.controller) {
                    state.players[player].health += *amount;
                    events.push(
                        EventDraft::new(GameEventType::PlayerHealed)
                            .with_source(origin)
                            .with_target(EventRef::Player(player))
                            .with_amount(*amount),
                    );
                } else {
                    for id in resolve_units(*scope, source, state) {
                        let Some(unit) = state.battlefield.get_mut(id) else {
                            continue;
                        };
                        let healed = unit.heal(*amount);
                        if healed > 0 {
                            events.push(
                                EventDraft::new(GameEventType::UnitHealed)
                                    .with_source(origin)
                                    .with_target(EventRef::Card(id))
                                    .with_amount(healed),
                            );
                        }
                    }
                }
            }

            EffectAction::Draw { count } => {
                for _ in 0..*count {
                    draw_with_events(state, source.controller, self.max_hand_size, events);
                }
            }

            EffectAction::GainMana { amount } => {
                let player = &mut state.players[source.controller];
                player.mana = (player.mana + amount).clamp(0, self.max_mana);
                events.push(
                    EventDraft::new(GameEventType::ManaGained)
                        .with_source(origin)
                        .with_target(EventRef::Player(source.controller))
                        .with_amount(*amount),
                );
            }

            EffectAction::ModifyStats { modifiers, scope, duration } => {
                let targets = resolve_units(*scope, source, state);
                if targets.is_empty() {
                    return;
                }
                let id = state.next_effect_id();
                let effect = PersistentEffect::new(id, source.card, *duration, targets, *modifiers);
                apply_persistent_effect(state, effect);
                events.push(
                    EventDraft::new(GameEventType::EffectApplied)
                        .with_source(origin)
                        .with_amount(id.raw() as i32),
                );
            }

            EffectAction::GrantKeyword { keyword, scope } => {
                for id in resolve_units(*scope, source, state) {
                    let Some(unit) = state.battlefield.get_mut(id) else {
                        continue;
                    };
                    unit.card.keywords.insert(*keyword);
                    if *keyword == Keyword::DivineShield {
                        unit.divine_shield = true;
                    }
                    events.push(
                        EventDraft::new(GameEventType::KeywordGranted)
                            .with_source(origin)
                            .with_target(EventRef::Card(id)),
                    );
                }
            }

            EffectAction::Destroy { scope } => {
                for id in resolve_units(*scope, source, state) {
                    if let Some(unit) = state.battlefield.get_mut(id) {
                        unit.current_health = 0;
                    }
                }
                remove_dead_units(state, events);
            }
        }
    }
}

/// The nexus a scope names, relative to `controller`.
fn nexus_of(scope: TargetScope, controller: PlayerId) -> Option<PlayerId> {
    match scope {
        TargetScope::OwnNexus => Some(controller),
        TargetScope::EnemyNexus => Some(controller.opponent()),
        _ => None,
    }
}

/// Units a scope names. Enemy units with spell ward are never picked by
/// single-target scopes.
#[must_use]
pub fn resolve_units(scope: TargetScope, source: &EffectSource, state: &mut GameState) -> Vec<CardId> {
    let controller = source.controller;
    let enemy = controller.opponent();
    let field = &state.battlefield;

    let warded = |id: CardId| {
        field
            .get(id)
            .is_some_and(|u| u.owner != controller && u.has_keyword(Keyword::SpellWard))
    };
    let single = |id: Option<CardId>| -> Vec<CardId> {
        id.filter(|&id| field.contains(id) && !warded(id)).into_iter().collect()
    };
    let side = |player: PlayerId| -> Vec<CardId> { field.units(player).map(|(_, u)| u.id()).collect() };

    match scope {
        TargetScope::Source => source.card.filter(|&id| field.contains(id)).into_iter().collect(),
        TargetScope::Chosen => single(source.chosen),
        TargetScope::EventSource => single(source.event_source.and_then(EventRef::card)),
        TargetScope::EventTarget => single(source.event_target.and_then(EventRef::card)),
        TargetScope::AllAllies => side(controller),
        TargetScope::AllEnemies => side(enemy),
        TargetScope::AllUnits => {
            let mut all = side(controller);
            all.extend(side(enemy));
            all
        }
        TargetScope::RandomEnemy => {
            let candidates: Vec<CardId> = side(enemy).into_iter().filter(|&id| !warded(id)).collect();
            match state.rng.choose_index(candidates.len()) {
                Some(index) => vec![candidates[index]],
                None => Vec::new(),
            }
        }
        TargetScope::OwnNexus | TargetScope::EnemyNexus => Vec::new(),
    }
}

/// Deal non-combat damage to a unit. Divine shield absorbs it.
pub fn damage_unit(state: &mut GameState, id: CardId, amount: i32, origin: EventRef, events: &mut Vec<EventDraft>) {
    if amount <= 0 {
        return;
    }
    let Some(unit) = state.battlefield.get_mut(id) else {
        return;
    };
    if unit.divine_shield {
        unit.divine_shield = false;
        events.push(
            EventDraft::new(GameEventType::DivineShieldBroken)
                .with_source(origin)
                .with_target(EventRef::Card(id)),
        );
        return;
    }
    unit.current_health -= amount;
    events.push(EventDraft::damage(origin, EventRef::Card(id), amount));
}

/// Draw one card, reporting what happened.
pub fn draw_with_events(state: &mut GameState, player: PlayerId, max_hand_size: usize, events: &mut Vec<EventDraft>) {
    match state.draw_card(player, max_hand_size) {
        DrawOutcome::Drawn(card) => events.push(
            EventDraft::new(GameEventType::CardDrawn)
                .with_source(EventRef::Card(card))
                .with_target(EventRef::Player(player)),
        ),
        DrawOutcome::Burned(card) => events.push(
            EventDraft::new(GameEventType::CardBurned)
                .with_source(EventRef::Card(card))
                .with_target(EventRef::Player(player)),
        ),
        DrawOutcome::Empty => {}
    }
}

/// Remove dead units from the battlefield, announcing each death.
pub fn remove_dead_units(state: &mut GameState, events: &mut Vec<EventDraft>) -> Vec<(SlotPosition, UnitInstance)> {
    let dead = state.battlefield.remove_dead();
    for (pos, unit) in &dead {
        debug!(unit = %unit.id(), side = %pos.side, slot = pos.slot, "unit died");
        events.push(
            EventDraft::new(GameEventType::UnitDied)
                .with_source(EventRef::Card(unit.id()))
                .with_target(EventRef::Player(unit.owner)),
        );
    }
    dead
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Card;
    use crate::core::EngineConfig;
    use crate::effects::{EffectDuration, StatModifiers};

    fn setup() -> GameState {
        let mut state = GameState::new(&EngineConfig::default());
        let units = [
            (1, PlayerId::PLAYER, 2),
            (2, PlayerId::PLAYER, 3),
            (10, PlayerId::OPPONENT, 2),
            (11, PlayerId::OPPONENT, 4),
        ];
        for (id, owner, health) in units {
            let card = Card::unit(CardId::new(id), "Unit", 1, 1, health);
            state.battlefield.place(UnitInstance::place(card, owner), None).unwrap();
        }
        state
    }

    fn run(state: &mut GameState, spec: EffectSpec, source: &EffectSource) -> Vec<EventDraft> {
        let mut events = Vec::new();
        EffectExecutor::default().execute(&spec, source, state, &mut events);
        events
    }

    fn count(events: &[EventDraft], event_type: GameEventType) -> usize {
        events.iter().filter(|e| e.event_type == event_type).count()
    }

    #[test]
    fn test_damage_all_enemies_kills() {
        let mut state = setup();
        let source = EffectSource::card(CardId::new(1), PlayerId::PLAYER);

        let events = run(&mut state, EffectSpec::text("Deal 2 damage to all enemies"), &source);

        assert!(!state.battlefield.contains(CardId::new(10)));
        assert_eq!(state.battlefield.get(CardId::new(11)).unwrap().current_health, 2);
        assert_eq!(count(&events, GameEventType::DamageDealt), 2);
        assert_eq!(count(&events, GameEventType::UnitDied), 1);
    }

    #[test]
    fn test_damage_nexus_relative_to_controller() {
        let mut state = setup();
        let source = EffectSource::player(PlayerId::OPPONENT);

        run(&mut state, EffectSpec::actions(vec![EffectAction::damage_enemy_nexus(3)]), &source);

        assert_eq!(state.players[PlayerId::PLAYER].health, 17);
        assert_eq!(state.players[PlayerId::OPPONENT].health, 20);
    }

    #[test]
    fn test_shield_absorbs_effect_damage() {
        let mut state = setup();
        state.battlefield.get_mut(CardId::new(11)).unwrap().divine_shield = true;

        let events = run(
            &mut state,
            EffectSpec::actions(vec![EffectAction::damage(3, TargetScope::AllEnemies)]),
            &EffectSource::player(PlayerId::PLAYER),
        );

        let unit = state.battlefield.get(CardId::new(11)).unwrap();
        assert_eq!(unit.current_health, 4);
        assert!(!unit.divine_shield);
        assert_eq!(count(&events, GameEventType::DivineShieldBroken), 1);
    }

    #[test]
    fn test_heal_caps_and_reports() {
        let mut state = setup();
        state.battlefield.get_mut(CardId::new(2)).unwrap().current_health = 1;

        let events = run(
            &mut state,
            EffectSpec::text("Heal all allies for 5"),
            &EffectSource::player(PlayerId::PLAYER),
        );

        assert_eq!(state.battlefield.get(CardId::new(2)).unwrap().current_health, 3);
        assert_eq!(count(&events, GameEventType::UnitHealed), 1);
    }

    #[test]
    fn test_draw_and_mana() {
        let mut state = setup();
        state.players[PlayerId::PLAYER].deck = (100..103).map(|id| Card::unit(CardId::new(id), "Card", 1, 1, 1)).collect();

        run(
            &mut state,
            EffectSpec::actions(vec![EffectAction::draw(2), EffectAction::GainMana { amount: 3 }]),
            &EffectSource::player(PlayerId::PLAYER),
        );

        let player = &state.players[PlayerId::PLAYER];
        assert_eq!(player.hand.len(), 2);
        assert_eq!(player.deck.len(), 1);
        assert_eq!(player.mana, 3);
    }

    #[test]
    fn test_buff_creates_persistent_effect() {
        let mut state = setup();
        let source = EffectSource::card(CardId::new(1), PlayerId::PLAYER);

        run(
            &mut state,
            EffectSpec::actions(vec![EffectAction::ModifyStats {
                modifiers: StatModifiers::new(2, 1),
                scope: TargetScope::AllAllies,
                duration: EffectDuration::WhileOnBattlefield,
            }]),
            &source,
        );

        assert_eq!(state.effects.len(), 1);
        assert_eq!(state.effects[0].targets, vec![CardId::new(1), CardId::new(2)]);
        assert_eq!(state.battlefield.get(CardId::new(2)).unwrap().current_health, 4);
    }

    #[test]
    fn test_grant_keyword_sets_live_shield() {
        let mut state = setup();
        let source = EffectSource::player(PlayerId::PLAYER).with_chosen(Some(CardId::new(2)));

        run(&mut state, EffectSpec::actions(vec![EffectAction::grant(Keyword::DivineShield, TargetScope::Chosen)]), &source);

        let unit = state.battlefield.get(CardId::new(2)).unwrap();
        assert!(unit.has_keyword(Keyword::DivineShield));
        assert!(unit.divine_shield);
    }

    #[test]
    fn test_spell_ward_blocks_single_target() {
        let mut state = setup();
        state.battlefield.get_mut(CardId::new(10)).unwrap().card.keywords.insert(Keyword::SpellWard);
        let source = EffectSource::player(PlayerId::PLAYER).with_chosen(Some(CardId::new(10)));

        run(&mut state, EffectSpec::actions(vec![EffectAction::Destroy { scope: TargetScope::Chosen }]), &source);
        assert!(state.battlefield.contains(CardId::new(10)));

        run(&mut state, EffectSpec::actions(vec![EffectAction::Destroy { scope: TargetScope::AllEnemies }]), &source);
        assert!(!state.battlefield.contains(CardId::new(10)));
    }

    #[test]
    fn test_random_enemy_is_deterministic() {
        let pick = || {
            let mut state = setup();
            run(
                &mut state,
                EffectSpec::actions(vec![EffectAction::Destroy { scope: TargetScope::RandomEnemy }]),
                &EffectSource::player(PlayerId::PLAYER),
            );
            state.battlefield.unit_count(PlayerId::OPPONENT)
        };
        assert_eq!(pick(), 1);
        assert_eq!(pick(), pick());
    }

    #[test]
    fn test_unparsable_text_is_noop() {
        let mut state = setup();
        let before = state.clone();

        let mut events = Vec::new();
        let ran = EffectExecutor::default().execute(
            &EffectSpec::text("Invoke the nameless arcana"),
            &EffectSource::player(PlayerId::PLAYER),
            &mut state,
            &mut events,
        );

        assert_eq!(ran, 0);
        assert!(events.is_empty());
        assert_eq!(state, before);
    }
}
