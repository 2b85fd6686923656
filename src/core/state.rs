//! Game state: the root aggregate the engine transforms.
//!
//! ## GameState
//!
//! - Turn bookkeeping: round, turn, phase, active and attacking player
//! - Per-player state: nexus health, mana, hand, deck, attack token
//! - The shared battlefield
//! - Active persistent effects
//! - Deterministic RNG and the recorded outcome
//!
//! Collections use `im` persistent structures, so cloning a state for a
//! transaction snapshot is O(1) and the snapshot shares structure with the
//! working copy.

use im::Vector;
use serde::{Deserialize, Serialize};

use super::config::EngineConfig;
use super::player::{PlayerId, PlayerMap};
use super::rng::GameRng;
use crate::cards::{Card, CardId};
use crate::effects::{EffectId, PersistentEffect};
use crate::error::ValidationError;
use crate::rules::win::WinResult;
use crate::zones::Battlefield;

/// Match phase.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Mulligan,
    RoundStart,
    Action,
    CombatResolution,
    EndRound,
    GameOver,
}

impl Phase {
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Phase::Mulligan => "mulligan",
            Phase::RoundStart => "round_start",
            Phase::Action => "action",
            Phase::CombatResolution => "combat_resolution",
            Phase::EndRound => "end_round",
            Phase::GameOver => "game_over",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// What happened when a card was drawn.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrawOutcome {
    /// Added to hand.
    Drawn(CardId),
    /// Hand was full; the card is gone.
    Burned(CardId),
    /// Deck was empty.
    Empty,
}

/// One player's side of the game.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlayerState {
    /// Nexus health. Not clamped: may dip below zero before the win check.
    pub health: i32,
    pub mana: i32,
    pub max_mana: i32,
    /// Banked mana usable only for spells.
    pub spell_mana: i32,
    pub hand: Vector<Card>,
    /// Front is the next draw.
    pub deck: Vector<Card>,
    pub has_attack_token: bool,
    pub mulligan_complete: bool,
}

impl PlayerState {
    #[must_use]
    pub fn new(health: i32) -> Self {
        Self {
            health,
            mana: 0,
            max_mana: 0,
            spell_mana: 0,
            hand: Vector::new(),
            deck: Vector::new(),
            has_attack_token: false,
            mulligan_complete: false,
        }
    }

    /// Position of a card in hand.
    #[must_use]
    pub fn hand_position(&self, card: CardId) -> Option<usize> {
        self.hand.iter().position(|c| c.id == card)
    }

    /// Take a card out of hand.
    pub fn remove_from_hand(&mut self, card: CardId) -> Option<Card> {
        let index = self.hand_position(card)?;
        Some(self.hand.remove(index))
    }

    /// Mana available for a card. Spells may also use spell mana.
    #[must_use]
    pub fn available_mana(&self, is_spell: bool) -> i32 {
        if is_spell {
            self.mana + self.spell_mana
        } else {
            self.mana
        }
    }

    /// Pay a cost. Spells draw on spell mana first.
    pub fn spend_mana(&mut self, cost: i32, is_spell: bool) -> Result<(), ValidationError> {
        let cost = cost.max(0);
        let available = self.available_mana(is_spell);
        if cost > available {
            return Err(ValidationError::InsufficientMana { required: cost, available });
        }

        let mut remaining = cost;
        if is_spell {
            let from_spell = remaining.min(self.spell_mana);
            self.spell_mana -= from_spell;
            remaining -= from_spell;
        }
        self.mana -= remaining;
        Ok(())
    }

    /// Draw the top card of the deck.
    pub fn draw(&mut self, max_hand_size: usize) -> DrawOutcome {
        let Some(card) = self.deck.pop_front() else {
            return DrawOutcome::Empty;
        };
        let id = card.id;
        if self.hand.len() >= max_hand_size {
            DrawOutcome::Burned(id)
        } else {
            self.hand.push_back(card);
            DrawOutcome::Drawn(id)
        }
    }
}

/// Complete game state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GameState {
    /// Starts at 1; increments every two turns.
    pub round: u32,

    /// Starts at 1; increments on every hand-over of the active player.
    pub turn: u32,

    pub phase: Phase,

    /// Whose turn it is.
    pub active_player: PlayerId,

    /// Set while an attack is being resolved.
    pub attacking_player: Option<PlayerId>,

    pub players: PlayerMap<PlayerState>,

    pub battlefield: Battlefield,

    /// Active persistent effects, in creation order.
    pub effects: Vector<PersistentEffect>,

    /// The active player has asked to end the turn.
    pub turn_ended: bool,

    /// Recorded once a win condition is met.
    pub outcome: Option<WinResult>,

    pub rng: GameRng,

    next_effect_id: u32,
}

impl GameState {
    /// Fresh state in the mulligan phase. Decks and hands are empty.
    #[must_use]
    pub fn new(config: &EngineConfig) -> Self {
        let mut players = PlayerMap::new(|_| PlayerState::new(config.starting_health));
        players[PlayerId::PLAYER].has_attack_token = true;

        Self {
            round: 1,
            turn: 1,
            phase: Phase::Mulligan,
            active_player: PlayerId::PLAYER,
            attacking_player: None,
            players,
            battlefield: Battlefield::new(),
            effects: Vector::new(),
            turn_ended: false,
            outcome: None,
            rng: GameRng::new(config.seed),
            next_effect_id: 0,
        }
    }

    #[must_use]
    pub fn player(&self, player: PlayerId) -> &PlayerState {
        &self.players[player]
    }

    pub fn player_mut(&mut self, player: PlayerId) -> &mut PlayerState {
        &mut self.players[player]
    }

    /// The player currently holding the attack token.
    #[must_use]
    pub fn token_holder(&self) -> Option<PlayerId> {
        PlayerId::both().find(|&p| self.players[p].has_attack_token)
    }

    /// Hand the attack token to the other player.
    pub fn swap_attack_token(&mut self) {
        for (_, player) in self.players.iter_mut() {
            player.has_attack_token = !player.has_attack_token;
        }
    }

    #[must_use]
    pub fn is_over(&self) -> bool {
        self.phase == Phase::GameOver || self.outcome.is_some()
    }

    /// Allocate a persistent-effect id.
    pub fn next_effect_id(&mut self) -> EffectId {
        let id = EffectId::new(self.next_effect_id);
        self.next_effect_id += 1;
        id
    }

    /// Draw for a player, respecting the hand limit.
    pub fn draw_card(&mut self, player: PlayerId, max_hand_size: usize) -> DrawOutcome {
        self.players[player].draw(max_hand_size)
    }
}
