//! Ability conditions.
//!
//! A condition is checked after the event type has matched. It sees the
//! event, the id of the card owning the ability and that card's controller.

use serde::{Deserialize, Serialize};

use crate::cards::CardId;
use crate::core::PlayerId;
use crate::events::{EventRef, GameEvent};

/// Extra requirement for an ability to fire.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AbilityCondition {
    /// No filter.
    #[default]
    Always,

    /// The event's source is the owning card.
    SourceIsSelf,

    /// The event's target is the owning card.
    TargetIsSelf,

    /// The event's source is a card other than the owning card.
    SourceIsOther,

    /// It is the controller's turn.
    ControllerActive,

    /// It is the opponent's turn.
    OpponentActive,

    /// The event targets the controller's nexus.
    TargetsOwnNexus,

    /// The event targets the opposing nexus.
    TargetsEnemyNexus,

    // === Combinators ===
    All(Vec<AbilityCondition>),
    Any(Vec<AbilityCondition>),
    Not(Box<AbilityCondition>),
}

impl AbilityCondition {
    /// Create an AND condition.
    pub fn all(conditions: impl IntoIterator<Item = AbilityCondition>) -> Self {
        Self::All(conditions.into_iter().collect())
    }

    /// Create an OR condition.
    pub fn any(conditions: impl IntoIterator<Item = AbilityCondition>) -> Self {
        Self::Any(conditions.into_iter().collect())
    }

    /// Negate this condition.
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// Add another condition with AND.
    #[must_use]
    pub fn and(self, other: AbilityCondition) -> Self {
        match self {
            Self::All(mut conditions) => {
                conditions.push(other);
                Self::All(conditions)
            }
            _ => Self::All(vec![self, other]),
        }
    }

    /// Check the condition for an ability of `card`, controlled by `controller`.
    #[must_use]
    pub fn matches(&self, event: &GameEvent, card: CardId, controller: PlayerId) -> bool {
        match self {
            Self::Always => true,
            Self::SourceIsSelf => event.source == Some(EventRef::Card(card)),
            Self::TargetIsSelf => event.target == Some(EventRef::Card(card)),
            Self::SourceIsOther => event.source_card().is_some_and(|c| c != card),
            Self::ControllerActive => event.active_player == controller,
            Self::OpponentActive => event.active_player != controller,
            Self::TargetsOwnNexus => event.target == Some(EventRef::Player(controller)),
            Self::TargetsEnemyNexus => event.target == Some(EventRef::Player(controller.opponent())),
            Self::All(conditions) => conditions.iter().all(|c| c.matches(event, card, controller)),
            Self::Any(conditions) => conditions.iter().any(|c| c.matches(event, card, controller)),
            Self::Not(inner) => !inner.matches(event, card, controller),
        }
    }
}
