//! Event system: typed game events and the publish/subscribe bus.
//!
//! Every state change the engine makes is announced here. Triggered
//! abilities, the persistent-effect sweep and win-progress reporting all
//! listen on the bus; the animation layer reads the history.
//!
//! ## Key Types
//!
//! - [`GameEventType`]: What happened
//! - [`EventDraft`]: An event before the bus stamps it
//! - [`GameEvent`]: An emitted, immutable event record
//! - [`EventFilter`]: Type set, source/target and predicate matching
//! - [`EventBus`]: Priority dispatch, queued re-entrancy, ring history

mod bus;
mod event;
mod filter;

pub use bus::{EventBus, HistoryMark, Listener, ListenerContext, SubscribeOptions, SubscriptionId};
pub use event::{EventData, EventDraft, EventId, EventRef, GameEvent, GameEventType};
pub use filter::{EventFilter, EventPredicate};
