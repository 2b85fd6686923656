//! Triggered abilities.
//!
//! Cards carry [`TriggeredAbility`] definitions. While a card is in play the
//! [`AbilityRegistry`] keeps one event bus listener per ability; when a
//! matching event is dispatched the listener checks the ability's
//! [`AbilityCondition`] and runs its effect through the shared executor.
//!
//! ## Example Usage
//!
//! ```
//! use arcana_rules::cards::{Card, CardId, UnitInstance};
//! use arcana_rules::core::{EngineConfig, GameState, PlayerId};
//! use arcana_rules::effects::{EffectAction, EffectExecutor, EffectSpec};
//! use arcana_rules::events::{EventBus, EventDraft, GameEventType};
//! use arcana_rules::triggers::{AbilityId, AbilityRegistry, TriggeredAbility};
//!
//! // "At the start of each turn, deal 1 damage to the enemy nexus."
//! let card = Card::unit(CardId::new(1), "The Tower", 4, 3, 5).with_ability(TriggeredAbility::new(
//!     AbilityId::new(1),
//!     GameEventType::TurnStart,
//!     EffectSpec::actions(vec![EffectAction::damage_enemy_nexus(1)]),
//! ));
//!
//! let mut state = GameState::new(&EngineConfig::default());
//! state.battlefield.place(UnitInstance::place(card, PlayerId::PLAYER), None).unwrap();
//!
//! let mut bus = EventBus::default();
//! let mut registry = AbilityRegistry::new(EffectExecutor::default());
//! registry.sync(&mut bus, &state);
//!
//! bus.emit(&mut state, EventDraft::new(GameEventType::TurnStart));
//! assert_eq!(state.players[PlayerId::OPPONENT].health, 19);
//! ```

mod ability;
mod condition;
mod registry;

pub use ability::{AbilityId, TriggeredAbility};
pub use condition::AbilityCondition;
pub use registry::{AbilityRegistry, DecisionHook, INSTANT_PRIORITY, NORMAL_PRIORITY};
