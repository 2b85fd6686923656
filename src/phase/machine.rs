//! Phase transition table.
//!
//! Each legal `(from, to)` pair has one record with a guard and an
//! execute step. The execute step holds the bookkeeping that belongs to
//! entering the new phase (start-of-turn refresh, end-of-turn banking,
//! hand-over to the next player).

use tracing::debug;

use crate::cards::{Element, Keyword};
use crate::combat::SYNERGY_SPECIAL_THRESHOLD;
use crate::core::{EngineConfig, GameState, Phase, PlayerId};
use crate::effects::{damage_unit, draw_with_events, remove_dead_units};
use crate::events::{EventData, EventDraft, EventRef, GameEventType};

/// Guard deciding whether a transition may run.
pub type TransitionGuard = fn(&GameState) -> bool;

/// Bookkeeping performed when a transition runs.
pub type TransitionStep = fn(&mut GameState, &EngineConfig, &mut Vec<EventDraft>);

/// One legal phase change.
#[derive(Clone, Copy)]
pub struct Transition {
    pub from: Phase,
    pub to: Phase,
    pub validate: TransitionGuard,
    pub execute: TransitionStep,
}

impl std::fmt::Debug for Transition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Transition")
            .field("from", &self.from)
            .field("to", &self.to)
            .finish_non_exhaustive()
    }
}

const NON_TERMINAL: [Phase; 5] = [
    Phase::Mulligan,
    Phase::RoundStart,
    Phase::Action,
    Phase::CombatResolution,
    Phase::EndRound,
];

/// The phase state machine.
///
/// ## Example
///
/// ```
/// use arcana_rules::core::{EngineConfig, GameState, Phase, PlayerId};
/// use arcana_rules::phase::PhaseMachine;
///
/// let config = EngineConfig::default();
/// let machine = PhaseMachine::new(&config);
/// let mut state = GameState::new(&config);
///
/// // Nobody has finished the mulligan yet.
/// assert_eq!(machine.try_transition(&state, Phase::RoundStart).phase, Phase::Mulligan);
///
/// for player in PlayerId::both() {
///     state.players[player].mulligan_complete = true;
/// }
/// assert_eq!(machine.auto_advance_phase(&state).phase, Phase::RoundStart);
/// ```
#[derive(Clone, Debug)]
pub struct PhaseMachine {
    transitions: Vec<Transition>,
    config: EngineConfig,
}

impl PhaseMachine {
    /// The standard transition table.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let mut transitions: Vec<Transition> = NON_TERMINAL
            .iter()
            .map(|&from| Transition {
                from,
                to: Phase::GameOver,
                validate: outcome_recorded,
                execute: no_op,
            })
            .collect();

        transitions.extend([
            Transition {
                from: Phase::Mulligan,
                to: Phase::RoundStart,
                validate: mulligans_done,
                execute: no_op,
            },
            Transition {
                from: Phase::RoundStart,
                to: Phase::Action,
                validate: always,
                execute: start_turn,
            },
            Transition {
                from: Phase::Action,
                to: Phase::CombatResolution,
                validate: attack_in_flight,
                execute: no_op,
            },
            Transition {
                from: Phase::CombatResolution,
                to: Phase::Action,
                validate: always,
                execute: finish_combat,
            },
            Transition {
                from: Phase::Action,
                to: Phase::EndRound,
                validate: turn_ended,
                execute: end_turn,
            },
            Transition {
                from: Phase::EndRound,
                to: Phase::RoundStart,
                validate: always,
                execute: hand_over,
            },
        ]);

        Self {
            transitions,
            config: config.clone(),
        }
    }

    /// All transition records.
    #[must_use]
    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    /// Phases reachable from `from`, valid or not.
    #[must_use]
    pub fn allowed_targets(&self, from: Phase) -> Vec<Phase> {
        self.transitions.iter().filter(|t| t.from == from).map(|t| t.to).collect()
    }

    fn find(&self, from: Phase, to: Phase) -> Option<&Transition> {
        self.transitions.iter().find(|t| t.from == from && t.to == to)
    }

    /// Move `state` to `target` if the pair exists and its guard passes.
    ///
    /// Returns false, leaving `state` alone, otherwise.
    pub fn transition_in_place(&self, state: &mut GameState, target: Phase, events: &mut Vec<EventDraft>) -> bool {
        let from = state.phase;
        let Some(transition) = self.find(from, target) else {
            debug!(%from, to = %target, "no such transition");
            return false;
        };
        if !(transition.validate)(state) {
            debug!(%from, to = %target, "transition guard failed");
            return false;
        }
        self.run(transition, state, events);
        true
    }

    /// Pure form of [`Self::transition_in_place`]. A refused transition
    /// returns an unchanged copy.
    #[must_use]
    pub fn try_transition(&self, state: &GameState, target: Phase) -> GameState {
        let mut next = state.clone();
        let mut events = Vec::new();
        self.transition_in_place(&mut next, target, &mut events);
        next
    }

    /// Apply the first valid transition out of the current phase.
    ///
    /// Returns the phase entered, if any. Never takes more than one step.
    pub fn advance_in_place(&self, state: &mut GameState, events: &mut Vec<EventDraft>) -> Option<Phase> {
        let from = state.phase;
        let transition = self
            .transitions
            .iter()
            .find(|t| t.from == from && (t.validate)(state))?;
        self.run(transition, state, events);
        Some(transition.to)
    }

    /// Pure form of [`Self::advance_in_place`].
    #[must_use]
    pub fn auto_advance_phase(&self, state: &GameState) -> GameState {
        let mut next = state.clone();
        let mut events = Vec::new();
        self.advance_in_place(&mut next, &mut events);
        next
    }

    /// Only the active player may act, and only in the action phase.
    #[must_use]
    pub fn can_player_act(&self, state: &GameState, player: PlayerId) -> bool {
        state.phase == Phase::Action && state.active_player == player && !state.is_over()
    }

    fn run(&self, transition: &Transition, state: &mut GameState, events: &mut Vec<EventDraft>) {
        debug!(from = %transition.from, to = %transition.to, turn = state.turn, "phase transition");
        state.phase = transition.to;
        events.push(EventDraft::new(GameEventType::PhaseChanged).with_data(EventData::PhaseChange {
            from: transition.from,
            to: transition.to,
        }));
        (transition.execute)(state, &self.config, events);
    }
}

fn always(_: &GameState) -> bool {
    true
}

fn outcome_recorded(state: &GameState) -> bool {
    state.outcome.is_some()
}

fn mulligans_done(state: &GameState) -> bool {
    PlayerId::both().all(|p| state.players[p].mulligan_complete)
}

fn attack_in_flight(state: &GameState) -> bool {
    state.attacking_player.is_some()
}

fn turn_ended(state: &GameState) -> bool {
    state.turn_ended
}

fn no_op(_: &mut GameState, _: &EngineConfig, _: &mut Vec<EventDraft>) {}

/// Refresh the incoming active player: mana, draw, units, synergy specials.
fn start_turn(state: &mut GameState, config: &EngineConfig, events: &mut Vec<EventDraft>) {
    let active = state.active_player;
    state.turn_ended = false;

    let player = &mut state.players[active];
    player.max_mana = (player.max_mana + 1).min(config.max_mana);
    player.mana = player.max_mana;
    let mana = player.mana;

    events.push(EventDraft::new(GameEventType::TurnStart).with_source(EventRef::Player(active)));
    events.push(
        EventDraft::new(GameEventType::ManaGained)
            .with_target(EventRef::Player(active))
            .with_amount(mana),
    );

    draw_with_events(state, active, config.max_hand_size, events);
    for unit in state.battlefield.units_mut(active) {
        unit.refresh();
    }

    apply_synergy_specials(state, config, events);
}

/// Standing effects of four or more same-element units.
fn apply_synergy_specials(state: &mut GameState, config: &EngineConfig, events: &mut Vec<EventDraft>) {
    let active = state.active_player;
    let counts = state.battlefield.count_units_by_element(active);
    let special = |element: Element| counts.get(element) >= SYNERGY_SPECIAL_THRESHOLD;

    if special(Element::Fire) {
        let enemies: Vec<_> = state.battlefield.units(active.opponent()).map(|(_, u)| u.id()).collect();
        for id in enemies {
            damage_unit(state, id, 1, EventRef::Player(active), events);
        }
        remove_dead_units(state, events);
    }

    if special(Element::Water) {
        let mut healed = Vec::new();
        for unit in state.battlefield.units_mut(active) {
            let amount = unit.heal(1);
            if amount > 0 {
                healed.push((unit.id(), amount));
            }
        }
        for (id, amount) in healed {
            events.push(
                EventDraft::new(GameEventType::UnitHealed)
                    .with_source(EventRef::Player(active))
                    .with_target(EventRef::Card(id))
                    .with_amount(amount),
            );
        }
    }

    if special(Element::Air) {
        draw_with_events(state, active, config.max_hand_size, events);
    }
}

/// Leave combat: the attack is no longer in flight.
fn finish_combat(state: &mut GameState, _: &EngineConfig, _: &mut Vec<EventDraft>) {
    state.attacking_player = None;
}

/// End-of-turn bookkeeping for the outgoing active player.
fn end_turn(state: &mut GameState, config: &EngineConfig, events: &mut Vec<EventDraft>) {
    let active = state.active_player;
    events.push(EventDraft::new(GameEventType::TurnEnd).with_source(EventRef::Player(active)));

    let player = &mut state.players[active];
    let banked = player.mana.max(0).min((config.spell_mana_cap - player.spell_mana).max(0));
    player.spell_mana += banked;
    player.mana = 0;

    for unit in state.battlefield.units_mut(active) {
        if unit.has_keyword(Keyword::Regenerate) {
            unit.current_health = unit.max_health;
        }
        if unit.has_keyword(Keyword::Ephemeral) {
            unit.current_health = 0;
        }
    }
    remove_dead_units(state, events);
}

/// Pass the turn. Every second turn starts a new round and swaps the token.
fn hand_over(state: &mut GameState, _: &EngineConfig, events: &mut Vec<EventDraft>) {
    state.active_player = state.active_player.opponent();
    state.turn += 1;
    state.turn_ended = false;

    if state.turn % 2 == 1 {
        state.round += 1;
        state.swap_attack_token();
        events.push(EventDraft::new(GameEventType::RoundStart).with_amount(state.round as i32));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::{Card, CardId, UnitInstance};
    use crate::rules::WinResult;

    fn machine() -> PhaseMachine {
        PhaseMachine::new(&EngineConfig::default())
    }

    fn at(phase: Phase) -> GameState {
        let mut state = GameState::new(&EngineConfig::default());
        state.phase = phase;
        state
    }

    #[test]
    fn test_unknown_pair_is_no_op() {
        let state = at(Phase::Mulligan);
        let next = machine().try_transition(&state, Phase::CombatResolution);
        assert_eq!(next, state);
    }

    #[test]
    fn test_mulligan_needs_both_players() {
        let mut state = at(Phase::Mulligan);
        state.players[PlayerId::PLAYER].mulligan_complete = true;
        assert_eq!(machine().try_transition(&state, Phase::RoundStart).phase, Phase::Mulligan);

        state.players[PlayerId::OPPONENT].mulligan_complete = true;
        assert_eq!(machine().try_transition(&state, Phase::RoundStart).phase, Phase::RoundStart);
    }

    #[test]
    fn test_auto_advance_single_step() {
        let mut state = at(Phase::Mulligan);
        for p in PlayerId::both() {
            state.players[p].mulligan_complete = true;
        }
        let next = machine().auto_advance_phase(&state);
        assert_eq!(next.phase, Phase::RoundStart);
        let next = machine().auto_advance_phase(&next);
        assert_eq!(next.phase, Phase::Action);
    }

    #[test]
    fn test_action_waits_for_end_turn() {
        let state = at(Phase::Action);
        assert_eq!(machine().auto_advance_phase(&state), state);
    }

    #[test]
    fn test_combat_requires_attack() {
        let mut state = at(Phase::Action);
        assert_eq!(machine().try_transition(&state, Phase::CombatResolution).phase, Phase::Action);

        state.attacking_player = Some(PlayerId::PLAYER);
        let combat = machine().try_transition(&state, Phase::CombatResolution);
        assert_eq!(combat.phase, Phase::CombatResolution);

        let back = machine().try_transition(&combat, Phase::Action);
        assert_eq!(back.phase, Phase::Action);
        assert_eq!(back.attacking_player, None);
    }

    #[test]
    fn test_start_turn_bookkeeping() {
        let mut state = at(Phase::RoundStart);
        state.players[PlayerId::PLAYER].deck = (1..4).map(|id| Card::unit(CardId::new(id), "C", 1, 1, 1)).collect();
        state
            .battlefield
            .place(UnitInstance::place(Card::unit(CardId::new(9), "U", 1, 1, 1), PlayerId::PLAYER), None).unwrap();
        state.turn_ended = true;

        let mut events = Vec::new();
        assert!(machine().transition_in_place(&mut state, Phase::Action, &mut events));

        let player = &state.players[PlayerId::PLAYER];
        assert_eq!((player.mana, player.max_mana), (1, 1));
        assert_eq!(player.hand.len(), 1);
        assert!(!state.turn_ended);
        assert!(!state.battlefield.get(CardId::new(9)).unwrap().has_summoning_sickness);
        assert_eq!(events[0].event_type, GameEventType::PhaseChanged);
        assert!(events.iter().any(|e| e.event_type == GameEventType::TurnStart));
    }

    #[test]
    fn test_max_mana_caps() {
        let mut state = at(Phase::RoundStart);
        state.players[PlayerId::PLAYER].max_mana = 10;
        let next = machine().try_transition(&state, Phase::Action);
        assert_eq!(next.players[PlayerId::PLAYER].max_mana, 10);
    }

    #[test]
    fn test_end_turn_banks_spell_mana() {
        let mut state = at(Phase::Action);
        state.players[PlayerId::PLAYER].mana = 5;
        state.players[PlayerId::PLAYER].spell_mana = 1;
        state.turn_ended = true;

        let next = machine().try_transition(&state, Phase::EndRound);
        assert_eq!(next.phase, Phase::EndRound);
        assert_eq!(next.players[PlayerId::PLAYER].spell_mana, 3);
    }

    #[test]
    fn test_end_turn_regenerate_and_ephemeral() {
        let mut state = at(Phase::Action);
        let regen = Card::unit(CardId::new(1), "R", 1, 1, 5).with_keyword(Keyword::Regenerate);
        let fleeting = Card::unit(CardId::new(2), "E", 1, 1, 5).with_keyword(Keyword::Ephemeral);
        let theirs = Card::unit(CardId::new(3), "T", 1, 1, 5).with_keyword(Keyword::Ephemeral);
        state.battlefield.place(UnitInstance::place(regen, PlayerId::PLAYER), None).unwrap();
        state.battlefield.place(UnitInstance::place(fleeting, PlayerId::PLAYER), None).unwrap();
        state.battlefield.place(UnitInstance::place(theirs, PlayerId::OPPONENT), None).unwrap();
        state.battlefield.get_mut(CardId::new(1)).unwrap().current_health = 1;
        state.turn_ended = true;

        let next = machine().try_transition(&state, Phase::EndRound);
        assert_eq!(next.battlefield.get(CardId::new(1)).unwrap().current_health, 5);
        assert!(!next.battlefield.contains(CardId::new(2)));
        assert!(next.battlefield.contains(CardId::new(3)));
    }

    #[test]
    fn test_round_parity_and_token() {
        let m = machine();
        let mut state = at(Phase::EndRound);

        let turn2 = m.try_transition(&state, Phase::RoundStart);
        assert_eq!((turn2.turn, turn2.round), (2, 1));
        assert_eq!(turn2.active_player, PlayerId::OPPONENT);
        assert_eq!(turn2.token_holder(), Some(PlayerId::PLAYER));

        state = turn2;
        state.phase = Phase::EndRound;
        let turn3 = m.try_transition(&state, Phase::RoundStart);
        assert_eq!((turn3.turn, turn3.round), (3, 2));
        assert_eq!(turn3.active_player, PlayerId::PLAYER);
        assert_eq!(turn3.token_holder(), Some(PlayerId::OPPONENT));
    }

    #[test]
    fn test_game_over_from_any_phase() {
        let m = machine();
        for phase in NON_TERMINAL {
            let mut state = at(phase);
            assert_eq!(m.try_transition(&state, Phase::GameOver).phase, phase);

            state.outcome = Some(WinResult::draw("test", "draw"));
            assert_eq!(m.auto_advance_phase(&state).phase, Phase::GameOver);
        }
        assert!(m.allowed_targets(Phase::GameOver).is_empty());
    }

    #[test]
    fn test_can_player_act() {
        let m = machine();
        let state = at(Phase::Action);
        assert!(m.can_player_act(&state, PlayerId::PLAYER));
        assert!(!m.can_player_act(&state, PlayerId::OPPONENT));
        assert!(!m.can_player_act(&at(Phase::EndRound), PlayerId::PLAYER));
    }

    #[test]
    fn test_fire_synergy_special() {
        let mut state = at(Phase::RoundStart);
        for id in 1..=4 {
            let card = Card::unit(CardId::new(id), "F", 1, 1, 3).with_element(Element::Fire);
            state.battlefield.place(UnitInstance::place(card, PlayerId::PLAYER), None).unwrap();
        }
        let foe = Card::unit(CardId::new(10), "W", 1, 1, 1).with_element(Element::Water);
        state.battlefield.place(UnitInstance::place(foe, PlayerId::OPPONENT), None).unwrap();

        let next = machine().try_transition(&state, Phase::Action);
        assert!(!next.battlefield.contains(CardId::new(10)));
    }
}
