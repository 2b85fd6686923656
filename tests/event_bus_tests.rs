//! Event bus integration tests.
//!
//! Covers delivery order, queued re-entrant emission, one-shot
//! subscriptions, listener failure isolation and the bounded history.

use std::cell::RefCell;
use std::rc::Rc;

use arcana_rules::cards::CardId;
use arcana_rules::core::{EngineConfig, GameState, PlayerId};
use arcana_rules::error::ListenerError;
use arcana_rules::events::{
    EventBus, EventDraft, EventFilter, EventRef, GameEvent, GameEventType, ListenerContext, SubscribeOptions,
};

type Log = Rc<RefCell<Vec<String>>>;

fn state() -> GameState {
    GameState::new(&EngineConfig::default())
}

fn recorder(log: &Log, tag: &'static str) -> Box<dyn FnMut(&GameEvent, &mut ListenerContext<'_>) -> Result<(), ListenerError>> {
    let log = Rc::clone(log);
    Box::new(move |event, _ctx| {
        log.borrow_mut().push(format!("{tag}:{}", event.event_type));
        Ok(())
    })
}

// =============================================================================
// Ordering
// =============================================================================

/// Test that higher priority listeners run first and ties keep subscription order.
#[test]
fn test_priority_order() {
    let mut bus = EventBus::new(50);
    let mut s = state();
    let log: Log = Rc::default();

    bus.subscribe(EventFilter::any(), recorder(&log, "low"), SubscribeOptions::new().with_priority(5));
    bus.subscribe(EventFilter::any(), recorder(&log, "high"), SubscribeOptions::new().with_priority(10));
    bus.subscribe(EventFilter::any(), recorder(&log, "low2"), SubscribeOptions::new().with_priority(5));

    bus.emit(&mut s, EventDraft::new(GameEventType::TurnStart));

    assert_eq!(*log.borrow(), vec!["high:turn_start", "low:turn_start", "low2:turn_start"]);
}

/// Test that events emitted from a listener wait until the current event is
/// fully delivered.
#[test]
fn test_reentrant_emission_is_fifo() {
    let mut bus = EventBus::new(50);
    let mut s = state();
    let log: Log = Rc::default();

    let chain = Rc::clone(&log);
    bus.subscribe(
        EventFilter::event(GameEventType::UnitSummoned),
        Box::new(move |_event, ctx| {
            chain.borrow_mut().push("summon-a".into());
            ctx.emit(EventDraft::new(GameEventType::CardDrawn));
            ctx.emit(EventDraft::new(GameEventType::ManaGained));
            Ok(())
        }),
        SubscribeOptions::new().with_priority(1),
    );
    bus.subscribe(
        EventFilter::event(GameEventType::UnitSummoned),
        recorder(&log, "summon-b"),
        SubscribeOptions::new(),
    );
    bus.subscribe(
        EventFilter::of([GameEventType::CardDrawn, GameEventType::ManaGained]),
        recorder(&log, "follow"),
        SubscribeOptions::new(),
    );

    bus.emit(&mut s, EventDraft::new(GameEventType::UnitSummoned));

    assert_eq!(
        *log.borrow(),
        vec!["summon-a", "summon-b:unit_summoned", "follow:card_drawn", "follow:mana_gained"]
    );
    assert!(!bus.is_dispatching());
    assert_eq!(bus.history_len(), 3);
}

/// Test that listeners see state changes made by earlier listeners.
#[test]
fn test_state_changes_visible_downstream() {
    let mut bus = EventBus::new(10);
    let mut s = state();

    bus.subscribe(
        EventFilter::any(),
        Box::new(|_event, ctx| {
            ctx.state.players[PlayerId::OPPONENT].health -= 4;
            Ok(())
        }),
        SubscribeOptions::new().with_priority(2),
    );
    let seen = Rc::new(RefCell::new(0));
    let seen_in = Rc::clone(&seen);
    bus.subscribe(
        EventFilter::any(),
        Box::new(move |_event, ctx| {
            *seen_in.borrow_mut() = ctx.state.players[PlayerId::OPPONENT].health;
            Ok(())
        }),
        SubscribeOptions::new(),
    );

    bus.emit(&mut s, EventDraft::new(GameEventType::SpellCast));
    assert_eq!(*seen.borrow(), 16);
    assert_eq!(s.players[PlayerId::OPPONENT].health, 16);
}

// =============================================================================
// Subscription lifecycle
// =============================================================================

/// Test that a once subscription fires a single time and is removed.
#[test]
fn test_once_subscription() {
    let mut bus = EventBus::new(10);
    let mut s = state();
    let log: Log = Rc::default();

    let id = bus.subscribe(EventFilter::any(), recorder(&log, "once"), SubscribeOptions::new().once());
    bus.emit(&mut s, EventDraft::new(GameEventType::TurnStart));
    bus.emit(&mut s, EventDraft::new(GameEventType::TurnEnd));

    assert_eq!(log.borrow().len(), 1);
    assert!(!bus.is_subscribed(id));
    assert_eq!(bus.subscription_count(), 0);
}

/// Test that a listener can drop a lower priority sibling mid-dispatch.
#[test]
fn test_unsubscribe_during_dispatch() {
    let mut bus = EventBus::new(10);
    let mut s = state();
    let log: Log = Rc::default();

    let victim = bus.subscribe(EventFilter::any(), recorder(&log, "victim"), SubscribeOptions::new());
    bus.subscribe(
        EventFilter::any(),
        Box::new(move |_event, ctx| {
            ctx.unsubscribe(victim);
            Ok(())
        }),
        SubscribeOptions::new().with_priority(9),
    );

    bus.emit(&mut s, EventDraft::new(GameEventType::TurnStart));
    assert!(log.borrow().is_empty());
    assert!(!bus.is_subscribed(victim));
    assert!(!bus.unsubscribe(victim));
}

/// Test that a failing listener does not stop its siblings.
#[test]
fn test_listener_error_isolated() {
    let mut bus = EventBus::new(10);
    let mut s = state();
    let log: Log = Rc::default();

    bus.subscribe(
        EventFilter::any(),
        Box::new(|_event, _ctx| Err(ListenerError::new("boom"))),
        SubscribeOptions::new().with_priority(3),
    );
    bus.subscribe(EventFilter::any(), recorder(&log, "after"), SubscribeOptions::new());

    bus.emit(&mut s, EventDraft::new(GameEventType::DamageDealt));
    bus.emit(&mut s, EventDraft::new(GameEventType::DamageDealt));
    assert_eq!(log.borrow().len(), 2);
    assert_eq!(bus.subscription_count(), 2);
}

/// Test that a panicking listener is contained like a failing one: siblings
/// run, the bus keeps dispatching later events, and the listener stays
/// subscribed.
#[test]
fn test_listener_panic_isolated() {
    let mut bus = EventBus::new(10);
    let mut s = state();
    let log: Log = Rc::default();

    bus.subscribe(
        EventFilter::event(GameEventType::TurnStart),
        Box::new(|_event, _ctx| panic!("listener bug")),
        SubscribeOptions::new().with_priority(3),
    );
    bus.subscribe(EventFilter::any(), recorder(&log, "sibling"), SubscribeOptions::new());

    bus.emit(&mut s, EventDraft::new(GameEventType::TurnStart));
    assert!(!bus.is_dispatching());
    bus.emit(&mut s, EventDraft::new(GameEventType::TurnEnd));
    bus.emit(&mut s, EventDraft::new(GameEventType::TurnStart));

    assert_eq!(
        *log.borrow(),
        vec!["sibling:turn_start", "sibling:turn_end", "sibling:turn_start"]
    );
    assert_eq!(bus.subscription_count(), 2);
}

// =============================================================================
// Filtering and history
// =============================================================================

/// Test that source, target and predicate filters combine.
#[test]
fn test_filter_fields() {
    let mut bus = EventBus::new(10);
    let mut s = state();
    let log: Log = Rc::default();
    let hero = CardId::new(7);

    let filter = EventFilter::event(GameEventType::DamageDealt)
        .with_source(EventRef::Card(hero))
        .with_predicate(|event| event.data.amount() >= 3);
    bus.subscribe(filter, recorder(&log, "big"), SubscribeOptions::new());

    let face = EventRef::Player(PlayerId::OPPONENT);
    bus.emit(&mut s, EventDraft::damage(EventRef::Card(hero), face, 2));
    bus.emit(&mut s, EventDraft::damage(EventRef::Card(CardId::new(8)), face, 5));
    bus.emit(&mut s, EventDraft::damage(EventRef::Card(hero), face, 5));

    assert_eq!(log.borrow().len(), 1);
}

/// Test that the history keeps only the newest events.
#[test]
fn test_history_ring() {
    let mut bus = EventBus::new(3);
    let mut s = state();
    for _ in 0..5 {
        bus.emit(&mut s, EventDraft::new(GameEventType::CardDrawn));
    }

    let ids: Vec<u64> = bus.history().map(|e| e.id.raw()).collect();
    assert_eq!(ids, vec![2, 3, 4]);
    assert_eq!(bus.events_since(bus.history().next().unwrap().id).count(), 2);
}

/// Test that events carry the turn context of the state they were emitted on.
#[test]
fn test_event_context_and_discard() {
    let mut bus = EventBus::new(10);
    let mut s = state();
    s.turn = 4;
    s.round = 2;
    s.active_player = PlayerId::OPPONENT;

    bus.emit(&mut s, EventDraft::new(GameEventType::TurnStart));
    let mark = bus.mark();
    bus.emit(&mut s, EventDraft::new(GameEventType::TurnEnd));
    bus.emit(&mut s, EventDraft::new(GameEventType::TurnEnd));

    bus.discard_since(mark);
    let last = bus.last_event().unwrap();
    assert_eq!(last.event_type, GameEventType::TurnStart);
    assert_eq!((last.turn, last.round, last.active_player), (4, 2, PlayerId::OPPONENT));
    assert!(last.timestamp > 0);
}
