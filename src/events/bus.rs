//! The event bus.
//!
//! Synchronous publish/subscribe with priorities and queued re-entrancy.
//!
//! ## Dispatch
//!
//! `emit` stamps the draft into a [`GameEvent`], appends it to the ring
//! history and queues it. If no dispatch is running, the queue is drained:
//! each event goes to every matching subscription, highest priority first,
//! ties in subscription order.
//!
//! Listeners cannot reach the bus directly. They get a [`ListenerContext`]
//! holding the working state; events they emit and subscriptions they drop
//! are applied once the listener returns, so new events always land behind
//! the in-flight dispatch (FIFO).
//!
//! A listener returning `Err` or panicking is logged and skipped; its
//! siblings and the queued events still run.

use std::any::Any;
use std::collections::VecDeque;
use std::panic::{self, AssertUnwindSafe};

use tracing::{debug, warn};

use super::event::{EventDraft, EventId, GameEvent};
use super::filter::EventFilter;
use crate::core::GameState;
use crate::error::ListenerError;

/// Boxed listener callback.
pub type Listener = Box<dyn FnMut(&GameEvent, &mut ListenerContext<'_>) -> Result<(), ListenerError>>;

/// Handle returned by `subscribe`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Subscription options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SubscribeOptions {
    /// Higher fires first.
    pub priority: i32,
    /// Remove after the first delivery.
    pub once: bool,
}

impl SubscribeOptions {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_priority(mut self, priority: i32) -> Self {
        self.priority = priority;
        self
    }

    #[must_use]
    pub fn once(mut self) -> Self {
        self.once = true;
        self
    }
}

/// What a listener may touch while handling an event.
pub struct ListenerContext<'a> {
    /// The working state. Changes are visible to later listeners.
    pub state: &'a mut GameState,
    subscription: SubscriptionId,
    emitted: Vec<EventDraft>,
    unsubscribed: Vec<SubscriptionId>,
}

impl<'a> ListenerContext<'a> {
    fn new(state: &'a mut GameState, subscription: SubscriptionId) -> Self {
        Self {
            state,
            subscription,
            emitted: Vec::new(),
            unsubscribed: Vec::new(),
        }
    }

    /// The subscription being invoked.
    #[must_use]
    pub fn subscription_id(&self) -> SubscriptionId {
        self.subscription
    }

    /// Queue an event behind the current dispatch.
    pub fn emit(&mut self, draft: EventDraft) {
        self.emitted.push(draft);
    }

    /// Drop a subscription once this listener returns.
    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.unsubscribed.push(id);
    }

    /// Split borrow: the state and the outgoing event buffer.
    pub fn state_and_events(&mut self) -> (&mut GameState, &mut Vec<EventDraft>) {
        (&mut *self.state, &mut self.emitted)
    }
}

struct Subscription {
    id: SubscriptionId,
    filter: EventFilter,
    /// Taken out while the listener runs.
    listener: Option<Listener>,
    priority: i32,
    once: bool,
}

/// Position in the event history, for discarding events of a rolled-back
/// operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct HistoryMark(EventId);

/// Event bus instance. One per engine.
pub struct EventBus {
    subscriptions: Vec<Subscription>,
    history: VecDeque<GameEvent>,
    capacity: usize,
    pending: VecDeque<GameEvent>,
    dispatching: bool,
    next_event_id: u64,
    next_subscription_id: u64,
    clock: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(100)
    }
}

impl EventBus {
    /// Create a bus keeping at most `history_capacity` past events.
    #[must_use]
    pub fn new(history_capacity: usize) -> Self {
        Self {
            subscriptions: Vec::new(),
            history: VecDeque::with_capacity(history_capacity),
            capacity: history_capacity,
            pending: VecDeque::new(),
            dispatching: false,
            next_event_id: 0,
            next_subscription_id: 0,
            clock: 0,
        }
    }

    /// Register a listener.
    pub fn subscribe(&mut self, filter: EventFilter, listener: Listener, options: SubscribeOptions) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription_id);
        self.next_subscription_id += 1;
        self.subscriptions.push(Subscription {
            id,
            filter,
            listener: Some(listener),
            priority: options.priority,
            once: options.once,
        });
        id
    }

    /// Remove a subscription. Returns false if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        match self.index_of(id) {
            Some(index) => {
                self.subscriptions.remove(index);
                true
            }
            None => false,
        }
    }

    #[must_use]
    pub fn is_subscribed(&self, id: SubscriptionId) -> bool {
        self.index_of(id).is_some()
    }

    #[must_use]
    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    #[must_use]
    pub fn is_dispatching(&self) -> bool {
        self.dispatching
    }

    /// Emit an event against `state`.
    ///
    /// Listeners run before this returns unless a dispatch is already in
    /// progress, in which case the event waits in the queue.
    pub fn emit(&mut self, state: &mut GameState, draft: EventDraft) -> EventId {
        let event = self.record(draft, state);
        let id = event.id;
        self.pending.push_back(event);

        if !self.dispatching {
            self.drain(state);
        }
        id
    }

    /// Emit several events in order.
    pub fn emit_all(&mut self, state: &mut GameState, drafts: impl IntoIterator<Item = EventDraft>) {
        for draft in drafts {
            self.emit(state, draft);
        }
    }

    fn drain(&mut self, state: &mut GameState) {
        self.dispatching = true;
        while let Some(event) = self.pending.pop_front() {
            self.dispatch(&event, state);
        }
        self.dispatching = false;
    }

    fn dispatch(&mut self, event: &GameEvent, state: &mut GameState) {
        let mut targets: Vec<(i32, SubscriptionId)> = self
            .subscriptions
            .iter()
            .filter(|s| s.filter.matches(event))
            .map(|s| (s.priority, s.id))
            .collect();
        // Stable: equal priorities keep subscription order.
        targets.sort_by_key(|&(priority, _)| std::cmp::Reverse(priority));

        for (_, id) in targets {
            // Dropped by an earlier listener of this dispatch.
            let Some(index) = self.index_of(id) else {
                continue;
            };
            let Some(mut listener) = self.subscriptions[index].listener.take() else {
                continue;
            };
            let once = self.subscriptions[index].once;

            let mut ctx = ListenerContext::new(state, id);
            let outcome = panic::catch_unwind(AssertUnwindSafe(|| listener(event, &mut ctx)))
                .unwrap_or_else(|payload| Err(ListenerError::new(panic_message(payload.as_ref()))));
            if let Err(err) = outcome {
                warn!(
                    subscription = id.raw(),
                    event = %event.event_type,
                    error = %err,
                    "event listener failed"
                );
            }
            let ListenerContext { emitted, unsubscribed, .. } = ctx;

            if let Some(index) = self.index_of(id) {
                if once {
                    self.subscriptions.remove(index);
                } else {
                    self.subscriptions[index].listener = Some(listener);
                }
            }
            for sub in unsubscribed {
                self.unsubscribe(sub);
            }
            for draft in emitted {
                let queued = self.record(draft, state);
                self.pending.push_back(queued);
            }
        }
    }

    fn record(&mut self, draft: EventDraft, state: &GameState) -> GameEvent {
        let id = EventId::new(self.next_event_id);
        self.next_event_id += 1;
        self.clock += 1;

        let event = GameEvent::build(id, self.clock, draft, state);
        debug!(id = id.raw(), event = %event.event_type, "event emitted");

        if self.capacity > 0 {
            if self.history.len() == self.capacity {
                self.history.pop_front();
            }
            self.history.push_back(event.clone());
        }
        event
    }

    fn index_of(&self, id: SubscriptionId) -> Option<usize> {
        self.subscriptions.iter().position(|s| s.id == id)
    }

    /// Retained events, oldest first.
    pub fn history(&self) -> impl Iterator<Item = &GameEvent> {
        self.history.iter()
    }

    #[must_use]
    pub fn history_len(&self) -> usize {
        self.history.len()
    }

    #[must_use]
    pub fn last_event(&self) -> Option<&GameEvent> {
        self.history.back()
    }

    /// Retained events emitted after `id`.
    pub fn events_since(&self, id: EventId) -> impl Iterator<Item = &GameEvent> {
        self.history.iter().filter(move |e| e.id > id)
    }

    /// Current end of the history.
    #[must_use]
    pub fn mark(&self) -> HistoryMark {
        HistoryMark(EventId::new(self.next_event_id))
    }

    /// Drop every retained event emitted at or after `mark`.
    pub fn discard_since(&mut self, mark: HistoryMark) {
        while self.history.back().is_some_and(|e| e.id >= mark.0) {
            self.history.pop_back();
        }
    }
}

impl std::fmt::Debug for EventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventBus")
            .field("subscriptions", &self.subscriptions.len())
            .field("history", &self.history.len())
            .field("capacity", &self.capacity)
            .field("pending", &self.pending.len())
            .field("dispatching", &self.dispatching)
            .finish()
    }
}


fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
