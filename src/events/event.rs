//! Game event records.
//!
//! A `GameEvent` is built by the bus at emit time from an [`EventDraft`] plus
//! the turn context of the state it was emitted against. Once built it is
//! never modified.

use serde::{Deserialize, Serialize};

use crate::cards::CardId;
use crate::core::{GameState, Phase, PlayerId};

/// Unique, monotonically increasing event identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EventId(pub u64);

impl EventId {
    #[must_use]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Event({})", self.0)
    }
}

/// Kinds of event the engine announces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameEventType {
    GameStart,
    MulliganComplete,
    PhaseChanged,
    TurnStart,
    TurnEnd,
    RoundStart,
    CardDrawn,
    CardBurned,
    CardPlayed,
    SpellCast,
    UnitSummoned,
    AttackDeclared,
    CombatResolved,
    DamageDealt,
    NexusDamaged,
    DivineShieldBroken,
    UnitHealed,
    PlayerHealed,
    UnitDied,
    KeywordGranted,
    ManaGained,
    EffectApplied,
    EffectExpired,
    WinProgress,
    GameOver,
}

impl GameEventType {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            GameEventType::GameStart => "game_start",
            GameEventType::MulliganComplete => "mulligan_complete",
            GameEventType::PhaseChanged => "phase_changed",
            GameEventType::TurnStart => "turn_start",
            GameEventType::TurnEnd => "turn_end",
            GameEventType::RoundStart => "round_start",
            GameEventType::CardDrawn => "card_drawn",
            GameEventType::CardBurned => "card_burned",
            GameEventType::CardPlayed => "card_played",
            GameEventType::SpellCast => "spell_cast",
            GameEventType::UnitSummoned => "unit_summoned",
            GameEventType::AttackDeclared => "attack_declared",
            GameEventType::CombatResolved => "combat_resolved",
            GameEventType::DamageDealt => "damage_dealt",
            GameEventType::NexusDamaged => "nexus_damaged",
            GameEventType::DivineShieldBroken => "divine_shield_broken",
            GameEventType::UnitHealed => "unit_healed",
            GameEventType::PlayerHealed => "player_healed",
            GameEventType::UnitDied => "unit_died",
            GameEventType::KeywordGranted => "keyword_granted",
            GameEventType::ManaGained => "mana_gained",
            GameEventType::EffectApplied => "effect_applied",
            GameEventType::EffectExpired => "effect_expired",
            GameEventType::WinProgress => "win_progress",
            GameEventType::GameOver => "game_over",
        }
    }
}

impl std::fmt::Display for GameEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Typed reference to an event participant.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum EventRef {
    Card(CardId),
    Player(PlayerId),
}

impl EventRef {
    /// The card id, if this refers to a card.
    #[must_use]
    pub fn card(self) -> Option<CardId> {
        match self {
            EventRef::Card(id) => Some(id),
            EventRef::Player(_) => None,
        }
    }

    /// The player id, if this refers to a player.
    #[must_use]
    pub fn player(self) -> Option<PlayerId> {
        match self {
            EventRef::Player(id) => Some(id),
            EventRef::Card(_) => None,
        }
    }
}

/// Event payload.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventData {
    #[default]
    None,
    /// Damage, healing, cards or mana.
    Amount(i32),
    PhaseChange { from: Phase, to: Phase },
    /// Win-condition progress in percent.
    Progress { condition: String, player: PlayerId, percent: u8 },
    Outcome { winner: Option<PlayerId>, message: String },
}

impl EventData {
    /// The numeric amount, or zero.
    #[must_use]
    pub fn amount(&self) -> i32 {
        match self {
            EventData::Amount(n) => *n,
            _ => 0,
        }
    }
}

/// An event to be emitted. The bus stamps it into a [`GameEvent`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDraft {
    pub event_type: GameEventType,
    pub source: Option<EventRef>,
    pub target: Option<EventRef>,
    pub data: EventData,
}

impl EventDraft {
    #[must_use]
    pub fn new(event_type: GameEventType) -> Self {
        Self {
            event_type,
            source: None,
            target: None,
            data: EventData::None,
        }
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
    pub fn with_data(mut self, data: EventData) -> Self {
        self.data = data;
        self
    }

    #[must_use]
    pub fn with_amount(self, amount: i32) -> Self {
        self.with_data(EventData::Amount(amount))
    }

    /// Damage from one participant to another.
    #[must_use]
    pub fn damage(source: EventRef, target: EventRef, amount: i32) -> Self {
        Self::new(GameEventType::DamageDealt)
            .with_source(source)
            .with_target(target)
            .with_amount(amount)
    }
}

/// An emitted event.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameEvent {
    pub id: EventId,
    pub event_type: GameEventType,
    /// Logical tick of the bus clock.
    pub timestamp: u64,
    pub source: Option<EventRef>,
    pub target: Option<EventRef>,
    pub data: EventData,
    pub phase: Phase,
    pub active_player: PlayerId,
    pub turn: u32,
    pub round: u32,
}

impl GameEvent {
    /// Stamp a draft with an id, a tick and the turn context of `state`.
    #[must_use]
    pub fn build(id: EventId, timestamp: u64, draft: EventDraft, state: &GameState) -> Self {
        Self {
            id,
            event_type: draft.event_type,
            timestamp,
            source: draft.source,
            target: draft.target,
            data: draft.data,
            phase: state.phase,
            active_player: state.active_player,
            turn: state.turn,
            round: state.round,
        }
    }

    /// Source card id, if the source is a card.
    #[must_use]
    pub fn source_card(&self) -> Option<CardId> {
        self.source.and_then(EventRef::card)
    }

    /// Target card id, if the target is a card.
    #[must_use]
    pub fn target_card(&self) -> Option<CardId> {
        self.target.and_then(EventRef::card)
    }
}
