//! Subscription filters.
//!
//! A filter matches on a set of event types (empty = any type), optional
//! exact source and target references, and an optional predicate over the
//! whole event. All present parts must match.

use std::rc::Rc;

use smallvec::SmallVec;

use super::event::{EventRef, GameEvent, GameEventType};

/// Predicate over an event.
pub type EventPredicate = Rc<dyn Fn(&GameEvent) -> bool>;

/// Which events a subscription receives.
///
/// ## Example
///
/// ```
/// use arcana_rules::cards::CardId;
/// use arcana_rules::events::{EventFilter, EventRef, GameEventType};
///
/// let filter = EventFilter::of([GameEventType::DamageDealt, GameEventType::UnitDied])
///     .with_source(EventRef::Card(CardId::new(3)));
///
/// assert!(filter.accepts_type(GameEventType::UnitDied));
/// assert!(!filter.accepts_type(GameEventType::TurnStart));
/// ```
#[derive(Clone, Default)]
pub struct EventFilter {
    types: SmallVec<[GameEventType; 4]>,
    source: Option<EventRef>,
    target: Option<EventRef>,
    predicate: Option<EventPredicate>,
}

impl EventFilter {
    /// Match every event.
    #[must_use]
    pub fn any() -> Self {
        Self::default()
    }

    /// Match the given event types.
    #[must_use]
    pub fn of(types: impl IntoIterator<Item = GameEventType>) -> Self {
        Self {
            types: types.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Match a single event type.
    #[must_use]
    pub fn event(event_type: GameEventType) -> Self {
        Self::of([event_type])
    }

    #[must_use]
    pub fn with_source(mut self, source: EventRef) -> Self {
        self.source = Some(source);
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: EventRef) -> Self {
        self.target = Some(target);
        self
    }

    #[must_use]
    pub fn with_predicate(mut self, predicate: impl Fn(&GameEvent) -> bool + 'static) -> Self {
        self.predicate = Some(Rc::new(predicate));
        self
    }

    /// Whether the type set admits `event_type`.
    #[must_use]
    pub fn accepts_type(&self, event_type: GameEventType) -> bool {
        self.types.is_empty() || self.types.contains(&event_type)
    }

    #[must_use]
    pub fn matches(&self, event: &GameEvent) -> bool {
        if !self.accepts_type(event.event_type) {
            return false;
        }
        if self.source.is_some() && event.source != self.source {
            return false;
        }
        if self.target.is_some() && event.target != self.target {
            return false;
        }
        self.predicate.as_ref().map_or(true, |p| p(event))
    }
}

impl std::fmt::Debug for EventFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventFilter")
            .field("types", &self.types)
            .field("source", &self.source)
            .field("target", &self.target)
            .field("predicate", &self.predicate.is_some())
            .finish()
    }
}
