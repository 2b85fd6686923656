//! Attack validation and resolution.
//!
//! Unit combat is simultaneous: both hits are computed from the pre-combat
//! snapshot of the two units, then applied together. Deaths are collected
//! only after every hit (primary, retaliation, splash) has landed.

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::modifiers::{combat_damage, effective_attack, effective_health, unit_synergy};
use super::targeting::get_valid_targets;
use crate::cards::{ceil_div, CardId, Keyword, UnitInstance};
use crate::core::{EngineConfig, GameState, Phase, PlayerId};
use crate::effects::{damage_unit, remove_dead_units};
use crate::error::{EngineResult, LookupError, ValidationError};
use crate::events::{EventDraft, EventRef, GameEventType};

/// What an attack is aimed at.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum AttackTarget {
    Unit(CardId),
    Nexus,
}

/// An attack declared by the active player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttackRequest {
    pub attacker_id: CardId,
    pub target: AttackTarget,
}

impl AttackRequest {
    #[must_use]
    pub const fn unit(attacker_id: CardId, target: CardId) -> Self {
        Self {
            attacker_id,
            target: AttackTarget::Unit(target),
        }
    }

    #[must_use]
    pub const fn nexus(attacker_id: CardId) -> Self {
        Self {
            attacker_id,
            target: AttackTarget::Nexus,
        }
    }
}

/// Summary of one resolved attack.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CombatReport {
    /// Damage the attacker's hit dealt to its target (unit or nexus).
    pub damage_dealt: i32,

    /// Retaliation damage the attacker took.
    pub damage_taken: i32,

    /// Splash hits on units adjacent to the defender.
    pub splash: Vec<(CardId, i32)>,

    /// Overwhelm spill onto the defending nexus.
    pub overflow: i32,

    /// Health restored to the attacking player.
    pub healed: i32,

    /// Units removed after the exchange.
    pub deaths: Vec<CardId>,
}

/// Check every attack precondition without changing anything.
///
/// The first failing check wins, in this order: phase, attack token,
/// attacker existence, ownership, summoning sickness, attack count,
/// target existence, target visibility, taunt.
pub fn validate_attack(state: &GameState, request: &AttackRequest) -> EngineResult<()> {
    if state.phase != Phase::Action {
        return Err(ValidationError::WrongPhase {
            expected: Phase::Action,
            actual: state.phase,
        }
        .into());
    }

    let player = state.active_player;
    if !state.players[player].has_attack_token {
        return Err(ValidationError::NoAttackToken(player).into());
    }

    let attacker = state
        .battlefield
        .get(request.attacker_id)
        .ok_or(LookupError::AttackerNotFound(request.attacker_id))?;
    if attacker.owner != player {
        return Err(ValidationError::NotOwner {
            unit: request.attacker_id,
            player,
        }
        .into());
    }
    if attacker.is_sick() {
        return Err(ValidationError::SummoningSickness(request.attacker_id).into());
    }
    if attacker.attacks_this_turn >= attacker.max_attacks() {
        return Err(ValidationError::AlreadyAttacked(request.attacker_id).into());
    }

    let Some(attacker_pos) = state.battlefield.position_of(request.attacker_id) else {
        return Err(LookupError::AttackerNotFound(request.attacker_id).into());
    };
    let valid = get_valid_targets(&state.battlefield, attacker_pos);

    match request.target {
        AttackTarget::Nexus => {
            if !valid.can_attack_nexus {
                return Err(ValidationError::TauntBlocks.into());
            }
        }
        AttackTarget::Unit(target) => {
            let defender = state
                .battlefield
                .get(target)
                .ok_or(LookupError::TargetNotFound(target))?;
            if defender.owner == player || defender.is_hidden() {
                return Err(ValidationError::InvalidTarget(target).into());
            }
            if !valid.contains_unit(&state.battlefield, target) {
                return Err(ValidationError::TauntBlocks.into());
            }
        }
    }

    Ok(())
}

/// Resolve an already validated attack in place.
///
/// Only existence is re-checked here; a caller that skips
/// [`validate_attack`] gets whatever the rules would have rejected.
pub fn resolve_attack(
    state: &mut GameState,
    request: &AttackRequest,
    config: &EngineConfig,
    events: &mut Vec<EventDraft>,
) -> EngineResult<CombatReport> {
    let attacker = state
        .battlefield
        .get(request.attacker_id)
        .cloned()
        .ok_or(LookupError::AttackerNotFound(request.attacker_id))?;

    let target_ref = match request.target {
        AttackTarget::Unit(id) => EventRef::Card(id),
        AttackTarget::Nexus => EventRef::Player(attacker.owner.opponent()),
    };
    events.push(
        EventDraft::new(GameEventType::AttackDeclared)
            .with_source(EventRef::Card(attacker.id()))
            .with_target(target_ref),
    );

    let mut report = match request.target {
        AttackTarget::Nexus => strike_nexus(state, config, &attacker, events),
        AttackTarget::Unit(target) => {
            let defender = state
                .battlefield
                .get(target)
                .cloned()
                .ok_or(LookupError::TargetNotFound(target))?;
            fight(state, config, &attacker, &defender, events)
        }
    };

    report.deaths = remove_dead_units(state, events)
        .into_iter()
        .map(|(_, unit)| unit.id())
        .collect();

    if let Some(unit) = state.battlefield.get_mut(attacker.id()) {
        unit.attacks_this_turn = unit.attacks_this_turn.saturating_add(1);
    }

    debug!(
        attacker = %attacker.id(),
        target = ?request.target,
        dealt = report.damage_dealt,
        taken = report.damage_taken,
        deaths = report.deaths.len(),
        "attack resolved"
    );
    events.push(
        EventDraft::new(GameEventType::CombatResolved)
            .with_source(EventRef::Card(attacker.id()))
            .with_target(target_ref)
            .with_amount(report.damage_dealt),
    );
    Ok(report)
}

/// Validate and resolve on a copy of `state`.
///
/// Returns the new state and the events the attack produced, or the first
/// failed precondition with `state` untouched.
pub fn declare_attack(
    state: &GameState,
    request: &AttackRequest,
    config: &EngineConfig,
) -> EngineResult<(GameState, Vec<EventDraft>)> {
    validate_attack(state, request)?;
    let mut next = state.clone();
    let mut events = Vec::new();
    resolve_attack(&mut next, request, config, &mut events)?;
    Ok((next, events))
}

/// A hit after shield and poison.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct Hit {
    damage: i32,
    /// Part of `damage` eaten by the victim's synergy health.
    absorbed: i32,
    shield_broken: bool,
}

impl Hit {
    const NONE: Self = Self {
        damage: 0,
        absorbed: 0,
        shield_broken: false,
    };
}

/// Apply shield then poison to a raw hit on `victim`.
///
/// A consumed shield stops the hit entirely, poison included. A poisoned
/// hit deals exactly the victim's effective health.
fn land(state: &GameState, raw: i32, victim: &UnitInstance, poisonous: bool) -> Hit {
    if raw <= 0 {
        return Hit::NONE;
    }
    if victim.divine_shield {
        return Hit {
            shield_broken: true,
            ..Hit::NONE
        };
    }
    let bonus = unit_synergy(state, victim).health;
    let damage = if poisonous { effective_health(state, victim) } else { raw };
    Hit {
        damage,
        absorbed: bonus.min(damage),
        shield_broken: false,
    }
}

fn fight(
    state: &mut GameState,
    config: &EngineConfig,
    attacker: &UnitInstance,
    defender: &UnitInstance,
    events: &mut Vec<EventDraft>,
) -> CombatReport {
    let mut outgoing = land(
        state,
        combat_damage(state, config, attacker, defender),
        defender,
        attacker.has_keyword(Keyword::Poisonous),
    );
    if attacker.has_keyword(Keyword::ElementalFury) && attacker.card.element.opposes(defender.card.element) {
        outgoing.damage *= 2;
    }
    let incoming = land(
        state,
        combat_damage(state, config, defender, attacker),
        attacker,
        defender.has_keyword(Keyword::Poisonous),
    );

    let splash_amount = if attacker.has_keyword(Keyword::SolarRadiance) && outgoing.damage > 0 {
        ceil_div(outgoing.damage, 2)
    } else {
        0
    };
    let splash_targets = match state.battlefield.position_of(defender.id()) {
        Some(pos) if splash_amount > 0 => state.battlefield.adjacent_units(pos.side, pos.slot),
        _ => Vec::new(),
    };
    let overflow = if attacker.has_keyword(Keyword::Overwhelm) {
        (outgoing.damage - effective_health(state, defender)).max(0)
    } else {
        0
    };

    // Everything above read the snapshot; now write.
    apply_hit(state, attacker.id(), defender.id(), outgoing, events);
    apply_hit(state, defender.id(), attacker.id(), incoming, events);

    let mut splash = Vec::with_capacity(splash_targets.len());
    for id in splash_targets {
        damage_unit(state, id, splash_amount, EventRef::Card(attacker.id()), events);
        splash.push((id, splash_amount));
    }

    if overflow > 0 {
        damage_nexus(state, attacker.id(), defender.owner, overflow, events);
    }

    let healed = if attacker.has_keyword(Keyword::Lifesteal) {
        heal_player(state, attacker, outgoing.damage, events)
    } else {
        0
    };

    CombatReport {
        damage_dealt: outgoing.damage,
        damage_taken: incoming.damage,
        splash,
        overflow,
        healed,
        deaths: Vec::new(),
    }
}

fn strike_nexus(
    state: &mut GameState,
    config: &EngineConfig,
    attacker: &UnitInstance,
    events: &mut Vec<EventDraft>,
) -> CombatReport {
    let damage = effective_attack(state, config, attacker);
    let defender = attacker.owner.opponent();
    if damage > 0 {
        damage_nexus(state, attacker.id(), defender, damage, events);
    }
    let healed = if attacker.has_keyword(Keyword::Lifesteal) {
        heal_player(state, attacker, damage, events)
    } else {
        0
    };
    CombatReport {
        damage_dealt: damage,
        healed,
        ..CombatReport::default()
    }
}

fn apply_hit(state: &mut GameState, from: CardId, to: CardId, hit: Hit, events: &mut Vec<EventDraft>) {
    let Some(unit) = state.battlefield.get_mut(to) else {
        return;
    };
    if hit.shield_broken {
        unit.divine_shield = false;
        events.push(
            EventDraft::new(GameEventType::DivineShieldBroken)
                .with_source(EventRef::Card(from))
                .with_target(EventRef::Card(to)),
        );
    }
    if hit.damage > 0 {
        unit.current_health -= hit.damage - hit.absorbed;
        events.push(EventDraft::damage(EventRef::Card(from), EventRef::Card(to), hit.damage));
    }
}

fn damage_nexus(state: &mut GameState, from: CardId, player: PlayerId, amount: i32, events: &mut Vec<EventDraft>) {
    state.players[player].health -= amount;
    events.push(
        EventDraft::new(GameEventType::NexusDamaged)
            .with_source(EventRef::Card(from))
            .with_target(EventRef::Player(player))
            .with_amount(amount),
    );
}

fn heal_player(state: &mut GameState, attacker: &UnitInstance, amount: i32, events: &mut Vec<EventDraft>) -> i32 {
    if amount <= 0 {
        return 0;
    }
    state.players[attacker.owner].health += amount;
    events.push(
        EventDraft::new(GameEventType::PlayerHealed)
            .with_source(EventRef::Card(attacker.id()))
            .with_target(EventRef::Player(attacker.owner))
            .with_amount(amount),
    );
    amount
}
