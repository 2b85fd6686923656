//! Ability registry.
//!
//! Keeps the event bus subscriptions of every triggered ability in play.
//! Each ability gets one listener, filtered to its trigger types. Instant
//! abilities subscribe at a higher priority so they fire before normal ones
//! on the same event.
//!
//! Registration follows the battlefield: `sync` subscribes abilities of units
//! that entered play and drops those of units that left. Listeners also
//! re-check that their card is still in play before firing, so a unit that
//! dies mid-dispatch never triggers.

use std::cell::RefCell;
use std::rc::Rc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;
use tracing::debug;

use super::ability::TriggeredAbility;
use crate::cards::{CardId, UnitInstance};
use crate::core::GameState;
use crate::effects::{EffectExecutor, EffectSource};
use crate::events::{EventBus, EventFilter, GameEvent, Listener, SubscribeOptions, SubscriptionId};

/// Dispatch priority of instant abilities.
pub const INSTANT_PRIORITY: i32 = 100;

/// Dispatch priority of normal abilities.
pub const NORMAL_PRIORITY: i32 = 50;

/// Accepts or declines an optional ability.
pub type DecisionHook = Rc<dyn Fn(&TriggeredAbility, &GameEvent, &GameState) -> bool>;

/// Tracks which cards have live ability subscriptions.
pub struct AbilityRegistry {
    registered: FxHashMap<CardId, SmallVec<[SubscriptionId; 2]>>,
    executor: EffectExecutor,
    decision_hook: Rc<RefCell<Option<DecisionHook>>>,
}

impl AbilityRegistry {
    #[must_use]
    pub fn new(executor: EffectExecutor) -> Self {
        Self {
            registered: FxHashMap::default(),
            executor,
            decision_hook: Rc::new(RefCell::new(None)),
        }
    }

    /// Install the hook deciding optional abilities. Applies to abilities
    /// already registered too.
    pub fn set_decision_hook(&mut self, hook: DecisionHook) {
        *self.decision_hook.borrow_mut() = Some(hook);
    }

    pub fn clear_decision_hook(&mut self) {
        *self.decision_hook.borrow_mut() = None;
    }

    #[must_use]
    pub fn is_registered(&self, card: CardId) -> bool {
        self.registered.contains_key(&card)
    }

    /// Live subscriptions for a card.
    #[must_use]
    pub fn subscriptions(&self, card: CardId) -> &[SubscriptionId] {
        self.registered.get(&card).map(|subs| subs.as_slice()).unwrap_or(&[])
    }

    /// Number of cards with registered abilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.registered.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.registered.is_empty()
    }

    /// Subscribe every ability of a unit entering play.
    pub fn register_unit(&mut self, bus: &mut EventBus, unit: &UnitInstance) {
        if unit.card.abilities.is_empty() || self.is_registered(unit.id()) {
            return;
        }
        let subs = unit
            .card
            .abilities
            .iter()
            .map(|ability| {
                let priority = if ability.is_instant() { INSTANT_PRIORITY } else { NORMAL_PRIORITY };
                // Bound to the unit in play, whatever the template said.
                let mut ability = ability.clone();
                ability.card_id = unit.id();
                bus.subscribe(
                    EventFilter::of(ability.triggers.iter().copied()),
                    self.listener(ability),
                    SubscribeOptions::new().with_priority(priority),
                )
            })
            .collect();
        debug!(card = %unit.id(), abilities = unit.card.abilities.len(), "abilities registered");
        self.registered.insert(unit.id(), subs);
    }

    /// Drop every subscription of a card. Returns how many were removed.
    pub fn unregister(&mut self, bus: &mut EventBus, card: CardId) -> usize {
        let Some(subs) = self.registered.remove(&card) else {
            return 0;
        };
        let removed = subs.into_iter().filter(|&sub| bus.unsubscribe(sub)).count();
        debug!(card = %card, removed, "abilities unregistered");
        removed
    }

    /// Match registrations to the units in play.
    pub fn sync(&mut self, bus: &mut EventBus, state: &GameState) {
        let departed: Vec<CardId> = self
            .registered
            .keys()
            .copied()
            .filter(|&card| !state.battlefield.contains(card))
            .collect();
        for card in departed {
            self.unregister(bus, card);
        }

        for unit in state.battlefield.all_units() {
            self.register_unit(bus, unit);
        }
    }

    fn listener(&self, ability: TriggeredAbility) -> Listener {
        let executor = self.executor;
        let hook = Rc::clone(&self.decision_hook);
        let card = ability.card_id;

        Box::new(move |event, ctx| {
            let Some(controller) = ctx.state.battlefield.get(card).map(|u| u.owner) else {
                return Ok(());
            };
            if !ability.condition.matches(event, card, controller) {
                return Ok(());
            }
            if ability.optional {
                let accepted = hook
                    .borrow()
                    .as_ref()
                    .is_some_and(|decide| decide(&ability, event, &*ctx.state));
                if !accepted {
                    debug!(card = %card, ability = %ability.id, "optional ability declined");
                    return Ok(());
                }
            }

            let source = EffectSource::triggered(card, controller, event);
            let (state, events) = ctx.state_and_events();
            executor.execute(&ability.effect, &source, state, events);
            Ok(())
        })
    }
}

impl std::fmt::Debug for AbilityRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AbilityRegistry")
            .field("registered", &self.registered)
            .field("executor", &self.executor)
            .field("has_decision_hook", &self.decision_hook.borrow().is_some())
            .finish()
    }
}
