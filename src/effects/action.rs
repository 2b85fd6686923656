//! Effect definitions.
//!
//! An [`EffectSpec`] is what a card carries: a list of structured
//! [`EffectAction`]s, or a text description the interpreter turns into one.
//! Each action names an amount and a [`TargetScope`]; scopes are resolved
//! against the state at execution time.

use serde::{Deserialize, Serialize};

use super::persistent::{EffectDuration, StatModifiers};
use crate::cards::{CardId, Keyword};
use crate::core::PlayerId;
use crate::events::{EventRef, GameEvent};

/// Who or what an action applies to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetScope {
    /// The card carrying the effect.
    Source,
    /// The unit chosen when the card was played.
    Chosen,
    /// The source of the triggering event.
    EventSource,
    /// The target of the triggering event.
    EventTarget,
    AllAllies,
    AllEnemies,
    AllUnits,
    RandomEnemy,
    /// The controller's nexus.
    OwnNexus,
    EnemyNexus,
}

impl TargetScope {
    /// Scopes that pick exactly one enemy, blocked by spell ward.
    #[must_use]
    pub fn is_single_target(self) -> bool {
        matches!(
            self,
            TargetScope::Chosen | TargetScope::EventSource | TargetScope::EventTarget | TargetScope::RandomEnemy
        )
    }
}

/// One structured effect step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum EffectAction {
    Damage { amount: i32, scope: TargetScope },
    Heal { amount: i32, scope: TargetScope },
    /// The controller draws.
    Draw { count: u32 },
    /// The controller gains mana this turn.
    GainMana { amount: i32 },
    /// Create a persistent stat modifier.
    ModifyStats {
        modifiers: StatModifiers,
        scope: TargetScope,
        duration: EffectDuration,
    },
    GrantKeyword { keyword: Keyword, scope: TargetScope },
    Destroy { scope: TargetScope },
}

impl EffectAction {
    #[must_use]
    pub fn damage(amount: i32, scope: TargetScope) -> Self {
        Self::Damage { amount, scope }
    }

    /// Damage the opposing nexus.
    #[must_use]
    pub fn damage_enemy_nexus(amount: i32) -> Self {
        Self::damage(amount, TargetScope::EnemyNexus)
    }

    #[must_use]
    pub fn heal(amount: i32, scope: TargetScope) -> Self {
        Self::Heal { amount, scope }
    }

    #[must_use]
    pub fn draw(count: u32) -> Self {
        Self::Draw { count }
    }

    #[must_use]
    pub fn buff(attack: i32, health: i32, scope: TargetScope, duration: EffectDuration) -> Self {
        Self::ModifyStats {
            modifiers: StatModifiers::new(attack, health),
            scope,
            duration,
        }
    }

    #[must_use]
    pub fn grant(keyword: Keyword, scope: TargetScope) -> Self {
        Self::GrantKeyword { keyword, scope }
    }
}

/// Dispatch speed of a triggered effect.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectSpeed {
    #[default]
    Normal,
    /// Fires ahead of normal effects on the same event.
    Instant,
}

/// What a card does.
///
/// ## Example
///
/// ```
/// use arcana_rules::effects::{EffectAction, EffectSpec, TargetScope};
///
/// let explicit = EffectSpec::actions(vec![EffectAction::damage(2, TargetScope::AllEnemies)]);
/// let described = EffectSpec::text("Deal 2 damage to all enemies");
///
/// assert_eq!(explicit.resolve_actions(), described.resolve_actions());
/// ```
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectSpec {
    #[serde(default)]
    pub actions: Vec<EffectAction>,
    /// Designer text. Interpreted only when `actions` is empty.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub speed: EffectSpeed,
}

impl EffectSpec {
    /// Structured effect.
    #[must_use]
    pub fn actions(actions: Vec<EffectAction>) -> Self {
        Self {
            actions,
            ..Self::default()
        }
    }

    /// Effect described in text only.
    #[must_use]
    pub fn text(description: impl Into<String>) -> Self {
        Self {
            description: Some(description.into()),
            ..Self::default()
        }
    }

    /// Mark as instant (builder pattern).
    #[must_use]
    pub fn instant(mut self) -> Self {
        self.speed = EffectSpeed::Instant;
        self
    }

    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.speed == EffectSpeed::Instant
    }

    /// The action list to execute: the structured actions if present,
    /// otherwise whatever the text interpreter recognises.
    #[must_use]
    pub fn resolve_actions(&self) -> Vec<EffectAction> {
        if !self.actions.is_empty() {
            return self.actions.clone();
        }
        self.description
            .as_deref()
            .map(super::parser::parse_effect_text)
            .unwrap_or_default()
    }
}

/// Where an effect comes from, for resolving relative scopes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EffectSource {
    pub card: Option<CardId>,
    pub controller: PlayerId,
    /// Unit picked by the player for `Chosen`.
    pub chosen: Option<CardId>,
    pub event_source: Option<EventRef>,
    pub event_target: Option<EventRef>,
}

impl EffectSource {
    /// An effect controlled by `controller` with no card attached.
    #[must_use]
    pub fn player(controller: PlayerId) -> Self {
        Self {
            card: None,
            controller,
            chosen: None,
            event_source: None,
            event_target: None,
        }
    }

    /// An effect from a card.
    #[must_use]
    pub fn card(card: CardId, controller: PlayerId) -> Self {
        Self {
            card: Some(card),
            ..Self::player(controller)
        }
    }

    /// An ability responding to `event`.
    #[must_use]
    pub fn triggered(card: CardId, controller: PlayerId, event: &GameEvent) -> Self {
        Self {
            event_source: event.source,
            event_target: event.target,
            ..Self::card(card, controller)
        }
    }

    #[must_use]
    pub fn with_chosen(mut self, target: Option<CardId>) -> Self {
        self.chosen = target;
        self
    }
}
