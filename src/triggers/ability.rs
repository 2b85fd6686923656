//! Triggered ability definitions.

use serde::{Deserialize, Serialize};
use smallvec::{smallvec, SmallVec};

use super::condition::AbilityCondition;
use crate::cards::CardId;
use crate::effects::EffectSpec;
use crate::events::GameEventType;

/// Unique identifier for an ability within its card.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct AbilityId(pub u32);

impl AbilityId {
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for AbilityId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Ability({})", self.0)
    }
}

/// An ability that fires in response to events while its card is in play.
///
/// ## Example
///
/// ```
/// use arcana_rules::effects::EffectSpec;
/// use arcana_rules::events::GameEventType;
/// use arcana_rules::triggers::{AbilityCondition, AbilityId, TriggeredAbility};
///
/// // "When this unit is summoned, deal 1 damage to all enemies."
/// let ability = TriggeredAbility::new(
///     AbilityId::new(1),
///     GameEventType::UnitSummoned,
///     EffectSpec::text("Deal 1 damage to all enemies"),
/// )
/// .with_condition(AbilityCondition::SourceIsSelf);
///
/// assert!(ability.listens_to(GameEventType::UnitSummoned));
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TriggeredAbility {
    pub id: AbilityId,

    /// Owning card. Set when the ability is attached to a card.
    #[serde(default = "unowned")]
    pub card_id: CardId,

    pub triggers: SmallVec<[GameEventType; 2]>,

    #[serde(default)]
    pub condition: AbilityCondition,

    pub effect: EffectSpec,

    /// Fires only if the decision hook accepts it.
    #[serde(default)]
    pub optional: bool,
}

fn unowned() -> CardId {
    CardId::new(0)
}

impl TriggeredAbility {
    #[must_use]
    pub fn new(id: AbilityId, trigger: GameEventType, effect: EffectSpec) -> Self {
        Self {
            id,
            card_id: unowned(),
            triggers: smallvec![trigger],
            condition: AbilityCondition::Always,
            effect,
            optional: false,
        }
    }

    /// Listen to an additional event type (builder pattern).
    #[must_use]
    pub fn with_trigger(mut self, trigger: GameEventType) -> Self {
        if !self.triggers.contains(&trigger) {
            self.triggers.push(trigger);
        }
        self
    }

    #[must_use]
    pub fn with_condition(mut self, condition: AbilityCondition) -> Self {
        self.condition = condition;
        self
    }

    /// Mark as optional (builder pattern).
    #[must_use]
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    #[must_use]
    pub fn listens_to(&self, event_type: GameEventType) -> bool {
        self.triggers.contains(&event_type)
    }

    #[must_use]
    pub fn is_instant(&self) -> bool {
        self.effect.is_instant()
    }
}
