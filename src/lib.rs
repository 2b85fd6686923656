//! # arcana-rules
//!
//! Rules engine for a two-player tarot card battler.
//!
//! ## Design Principles
//!
//! 1. **Values In, Values Out**: Every player action takes a `&GameState`
//!    and returns a new state or an error. The input is never modified.
//!
//! 2. **Atomic Actions**: Actions run inside a transaction on a working
//!    copy. A failure anywhere rolls everything back, including the events
//!    the action emitted.
//!
//! 3. **Explicit Services**: The event bus, ability registry, phase
//!    machine and win evaluator are plain values owned by a `GameEngine`.
//!    Nothing is global.
//!
//! ## Architecture
//!
//! - **Persistent Data Structures**: O(1) state snapshots via `im-rs`, so
//!   transactions and returned states share structure.
//!
//! - **Event-Driven Abilities**: Triggered abilities are ordinary event bus
//!   listeners. Re-entrant emission is queued and drained FIFO.
//!
//! - **Derived Combat Stats**: Effective attack and damage reduction are
//!   recomputed from the state on every attack; nothing is cached on units.
//!
//! ## Modules
//!
//! - `core`: Players, state, phases, RNG, configuration
//! - `zones`: The slotted battlefield
//! - `cards`: Card definitions, keywords, elements, unit instances
//! - `events`: Event types, filters and the event bus
//! - `effects`: Effect actions, the text interpreter, persistent effects
//! - `triggers`: Triggered abilities and their registry
//! - `combat`: Attack validation, targeting, damage resolution
//! - `phase`: The phase state machine
//! - `rules`: Engine facade, win conditions, transactions
//! - `error`: Validation and lookup errors

pub mod cards;
pub mod combat;
pub mod core;
pub mod effects;
pub mod error;
pub mod events;
pub mod phase;
pub mod rules;
pub mod triggers;
pub mod zones;

// Re-export commonly used types
pub use crate::core::{
    DrawOutcome, EngineConfig, GameMode, GameRng, GameRngState, GameState, Phase, PlayerId, PlayerMap, PlayerState,
};

pub use crate::zones::{Battlefield, SlotPosition, MAX_SLOTS};

pub use crate::cards::{Card, CardCatalog, CardId, CardType, Element, Keyword, KeywordSet, UnitInstance};

pub use crate::events::{
    EventBus, EventData, EventDraft, EventFilter, EventId, EventRef, GameEvent, GameEventType, ListenerContext,
    SubscribeOptions, SubscriptionId,
};

pub use crate::effects::{
    EffectAction, EffectDuration, EffectExecutor, EffectSource, EffectSpec, PersistentEffect, StatModifiers,
    TargetScope,
};

pub use crate::triggers::{AbilityCondition, AbilityId, AbilityRegistry, TriggeredAbility};

pub use crate::combat::{AttackRequest, AttackTarget, CombatReport, ValidTargets};

pub use crate::phase::PhaseMachine;

pub use crate::rules::{GameEngine, PlayCardRequest, TransactionManager, WinCondition, WinEvaluator, WinResult};

pub use crate::error::{EngineError, EngineResult, ListenerError, LookupError, ValidationError};
