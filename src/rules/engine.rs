//! The engine facade.
//!
//! `GameEngine` owns the services a match needs (event bus, ability
//! registry, phase machine, win evaluator, transaction manager) and exposes
//! the four player actions. Each action takes a `&GameState` and returns a
//! new state or an error:
//!
//! ```text
//! check over / phase / actor
//!   -> begin transaction, clone working state
//!   -> run the action, emitting events (listeners may change the state)
//!   -> check win conditions
//!   -> commit and return the working state
//!
//! any failure
//!   -> roll back, drop the action's events, resync abilities
//!   -> return the error; the input state is untouched
//! ```
//!
//! ## Example
//!
//! ```
//! use arcana_rules::cards::{Card, CardId};
//! use arcana_rules::core::{EngineConfig, Phase, PlayerId};
//! use arcana_rules::rules::GameEngine;
//!
//! let deck = |base: u32| -> Vec<Card> {
//!     (0..10).map(|i| Card::unit(CardId::new(base + i), "Page", 1, 1, 1)).collect()
//! };
//!
//! let mut engine = GameEngine::new(EngineConfig::default().with_seed(3));
//! let state = engine.new_game(deck(100), deck(200));
//! let state = engine.complete_mulligan(&state, PlayerId::PLAYER, &[]).unwrap();
//! let state = engine.complete_mulligan(&state, PlayerId::OPPONENT, &[]).unwrap();
//!
//! assert_eq!(state.phase, Phase::Action);
//! assert_eq!(state.players[PlayerId::PLAYER].mana, 1);
//! ```

use im::Vector;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::transaction::TransactionManager;
use super::win::{WinEvaluator, WinResult};
use crate::cards::{Card, CardCatalog, CardId, Keyword, UnitInstance};
use crate::combat::{self, get_valid_targets, AttackRequest, CombatReport, ValidTargets};
use crate::core::{EngineConfig, GameState, Phase, PlayerId};
use crate::effects::{draw_with_events, sweep, EffectExecutor, EffectSource};
use crate::error::{EngineError, EngineResult, LookupError, ValidationError};
use crate::events::{
    EventBus, EventData, EventDraft, EventFilter, EventRef, GameEventType, Listener, SubscribeOptions,
    SubscriptionId,
};
use crate::phase::PhaseMachine;
use crate::triggers::{AbilityRegistry, DecisionHook};
use crate::zones::MAX_SLOTS;

/// Dispatch priority of the persistent-effect sweep. Runs before abilities.
pub const SWEEP_PRIORITY: i32 = 1000;

/// A card played from hand.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayCardRequest {
    pub card_id: CardId,
    /// Battlefield slot for a unit. `None` takes the first free slot.
    #[serde(default)]
    pub slot: Option<usize>,
    /// Chosen unit for a targeted spell.
    #[serde(default)]
    pub target: Option<CardId>,
}

impl PlayCardRequest {
    #[must_use]
    pub const fn new(card_id: CardId) -> Self {
        Self {
            card_id,
            slot: None,
            target: None,
        }
    }

    #[must_use]
    pub const fn in_slot(mut self, slot: usize) -> Self {
        self.slot = Some(slot);
        self
    }

    #[must_use]
    pub const fn targeting(mut self, target: CardId) -> Self {
        self.target = Some(target);
        self
    }
}

/// Rules engine for one match at a time.
pub struct GameEngine {
    config: EngineConfig,
    bus: EventBus,
    abilities: AbilityRegistry,
    phases: PhaseMachine,
    wins: WinEvaluator,
    transactions: TransactionManager,
    executor: EffectExecutor,
    last_combat: Option<CombatReport>,
}

impl GameEngine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        let executor = EffectExecutor::new(config.max_hand_size, config.max_mana);
        let mut bus = EventBus::new(config.event_history_capacity);
        bus.subscribe(
            EventFilter::of([GameEventType::TurnStart, GameEventType::TurnEnd, GameEventType::PhaseChanged]),
            Box::new(|event, ctx| {
                let (state, events) = ctx.state_and_events();
                events.extend(sweep(state, event));
                Ok(())
            }),
            SubscribeOptions::new().with_priority(SWEEP_PRIORITY),
        );

        Self {
            phases: PhaseMachine::new(&config),
            wins: WinEvaluator::with_defaults(&config),
            abilities: AbilityRegistry::new(executor),
            transactions: TransactionManager::new(),
            bus,
            executor,
            last_combat: None,
            config,
        }
    }

    // === Accessors ===

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    #[must_use]
    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    /// Subscribe an external listener (UI, telemetry, scripted cards).
    pub fn subscribe(&mut self, filter: EventFilter, listener: Listener, options: SubscribeOptions) -> SubscriptionId {
        self.bus.subscribe(filter, listener, options)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.bus.unsubscribe(id)
    }

    #[must_use]
    pub fn abilities(&self) -> &AbilityRegistry {
        &self.abilities
    }

    /// Install the hook that accepts or declines optional abilities.
    pub fn set_decision_hook(&mut self, hook: DecisionHook) {
        self.abilities.set_decision_hook(hook);
    }

    #[must_use]
    pub fn phases(&self) -> &PhaseMachine {
        &self.phases
    }

    #[must_use]
    pub fn wins(&self) -> &WinEvaluator {
        &self.wins
    }

    /// Register extra conditions or switch the game mode.
    pub fn wins_mut(&mut self) -> &mut WinEvaluator {
        &mut self.wins
    }

    #[must_use]
    pub fn transactions(&self) -> &TransactionManager {
        &self.transactions
    }

    /// Report of the most recent successful attack.
    #[must_use]
    pub fn last_combat(&self) -> Option<&CombatReport> {
        self.last_combat.as_ref()
    }

    // === Setup ===

    /// Start a match with the given decks. Decks are shuffled and each
    /// player draws a starting hand. Card ids must be unique across both.
    pub fn new_game(&mut self, player_deck: Vec<Card>, opponent_deck: Vec<Card>) -> GameState {
        let mut state = GameState::new(&self.config);
        self.wins.set_mode(&self.config.game_mode);
        self.abilities.sync(&mut self.bus, &state);

        let mut events = vec![EventDraft::new(GameEventType::GameStart)];
        for (player, mut deck) in [(PlayerId::PLAYER, player_deck), (PlayerId::OPPONENT, opponent_deck)] {
            state.rng.shuffle(&mut deck);
            state.players[player].deck = deck.into_iter().collect::<Vector<Card>>();
            for _ in 0..self.config.starting_hand_size {
                draw_with_events(&mut state, player, self.config.max_hand_size, &mut events);
            }
        }
        self.bus.emit_all(&mut state, events);

        info!(seed = self.config.seed, "new game");
        state
    }

    /// Start a match from catalog template ids. Every copy gets a fresh id.
    pub fn new_game_from_catalog(
        &mut self,
        catalog: &CardCatalog,
        player_templates: &[CardId],
        opponent_templates: &[CardId],
    ) -> EngineResult<GameState> {
        let mut next_id = 1;
        let player_deck = catalog.build_deck(player_templates, &mut next_id)?;
        let opponent_deck = catalog.build_deck(opponent_templates, &mut next_id)?;
        Ok(self.new_game(player_deck, opponent_deck))
    }

    // === Actions ===

    /// Finish a player's mulligan, swapping `replace` back into the deck.
    ///
    /// Once both players are done the first turn starts.
    pub fn complete_mulligan(&mut self, state: &GameState, player: PlayerId, replace: &[CardId]) -> EngineResult<GameState> {
        Self::ensure_running(state)?;
        if state.phase != Phase::Mulligan {
            return Err(ValidationError::WrongPhase {
                expected: Phase::Mulligan,
                actual: state.phase,
            }
            .into());
        }
        if state.players[player].mulligan_complete {
            return Err(ValidationError::MulliganAlreadyComplete(player).into());
        }
        for &card in replace {
            if state.players[player].hand_position(card).is_none() {
                return Err(LookupError::CardNotInHand { card, player }.into());
            }
        }

        self.transact(state, "complete_mulligan", |engine, working| {
            let mut events = Vec::new();
            let hand = &mut working.players[player];
            let returned: Vec<Card> = replace.iter().filter_map(|&id| hand.remove_from_hand(id)).collect();
            let count = returned.len();

            let mut deck: Vec<Card> = working.players[player].deck.iter().cloned().collect();
            deck.extend(returned);
            working.rng.shuffle(&mut deck);
            working.players[player].deck = deck.into_iter().collect();
            for _ in 0..count {
                draw_with_events(working, player, engine.config.max_hand_size, &mut events);
            }

            working.players[player].mulligan_complete = true;
            events.push(
                EventDraft::new(GameEventType::MulliganComplete)
                    .with_target(EventRef::Player(player))
                    .with_amount(count as i32),
            );
            engine.bus.emit_all(working, events);

            if engine.step(working, Phase::RoundStart) {
                engine.step(working, Phase::Action);
                engine.report_progress(working);
            }
            Ok(())
        })
    }

    /// Play a card from hand: place a unit or resolve a spell.
    pub fn play_card(&mut self, state: &GameState, player: PlayerId, request: PlayCardRequest) -> EngineResult<GameState> {
        Self::ensure_running(state)?;
        self.ensure_actor(state, player)?;

        let card = state.players[player]
            .hand
            .iter()
            .find(|c| c.id == request.card_id)
            .cloned()
            .ok_or(LookupError::CardNotInHand {
                card: request.card_id,
                player,
            })?;
        let is_spell = !card.is_unit();

        if is_spell {
            if let Some(target) = request.target {
                let unit = state
                    .battlefield
                    .get(target)
                    .ok_or(LookupError::TargetNotFound(target))?;
                if unit.owner != player && unit.has_keyword(Keyword::SpellWard) {
                    return Err(ValidationError::InvalidTarget(target).into());
                }
            }
        } else {
            match request.slot {
                Some(slot) if slot >= MAX_SLOTS => {
                    return Err(LookupError::SlotOutOfRange { slot, max: MAX_SLOTS - 1 }.into());
                }
                Some(slot) if state.battlefield.unit_at(player, slot).is_some() => {
                    return Err(ValidationError::SlotOccupied(slot).into());
                }
                None if state.battlefield.first_empty_slot(player).is_none() => {
                    return Err(ValidationError::BoardFull.into());
                }
                _ => {}
            }
        }

        let available = state.players[player].available_mana(is_spell);
        if card.cost > available {
            return Err(ValidationError::InsufficientMana {
                required: card.cost,
                available,
            }
            .into());
        }

        self.transact(state, "play_card", |engine, working| {
            working.players[player].spend_mana(card.cost, is_spell)?;
            working.players[player].remove_from_hand(card.id);
            engine.bus.emit(
                working,
                EventDraft::new(GameEventType::CardPlayed)
                    .with_source(EventRef::Card(card.id))
                    .with_target(EventRef::Player(player))
                    .with_amount(card.cost),
            );

            if is_spell {
                engine.cast_spell(working, player, &card, request.target);
            } else {
                engine.summon(working, player, card, request.slot)?;
            }
            Ok(())
        })
    }

    /// Declare and resolve an attack for the active player.
    pub fn declare_attack(&mut self, state: &GameState, player: PlayerId, request: AttackRequest) -> EngineResult<GameState> {
        Self::ensure_running(state)?;
        self.ensure_actor(state, player)?;
        combat::validate_attack(state, &request)?;

        self.transact(state, "declare_attack", |engine, working| {
            working.attacking_player = Some(player);
            engine.step(working, Phase::CombatResolution);

            let mut events = Vec::new();
            let report = combat::resolve_attack(working, &request, &engine.config, &mut events)?;
            engine.bus.emit_all(working, events);

            engine.step(working, Phase::Action);
            engine.last_combat = Some(report);
            Ok(())
        })
    }

    /// End the active player's turn and start the opponent's.
    pub fn end_turn(&mut self, state: &GameState, player: PlayerId) -> EngineResult<GameState> {
        Self::ensure_running(state)?;
        self.ensure_actor(state, player)?;

        self.transact(state, "end_turn", |engine, working| {
            working.turn_ended = true;
            engine.step(working, Phase::EndRound);
            engine.step(working, Phase::RoundStart);
            engine.step(working, Phase::Action);
            engine.report_progress(working);
            Ok(())
        })
    }

    // === Queries ===

    /// Evaluate the active win conditions against `state`.
    pub fn check_win_conditions(&mut self, state: &GameState) -> Option<WinResult> {
        self.wins.check_win_conditions(state)
    }

    /// Legal targets for a unit on the battlefield.
    pub fn valid_targets(&self, state: &GameState, attacker: CardId) -> EngineResult<ValidTargets> {
        let pos = state
            .battlefield
            .position_of(attacker)
            .ok_or(LookupError::AttackerNotFound(attacker))?;
        Ok(get_valid_targets(&state.battlefield, pos))
    }

    #[must_use]
    pub fn can_player_act(&self, state: &GameState, player: PlayerId) -> bool {
        self.phases.can_player_act(state, player)
    }

    // === Internals ===

    fn ensure_running(state: &GameState) -> EngineResult<()> {
        if state.is_over() {
            return Err(ValidationError::GameOver.into());
        }
        Ok(())
    }

    fn ensure_actor(&self, state: &GameState, player: PlayerId) -> EngineResult<()> {
        if state.phase != Phase::Action {
            return Err(ValidationError::WrongPhase {
                expected: Phase::Action,
                actual: state.phase,
            }
            .into());
        }
        if !self.phases.can_player_act(state, player) {
            return Err(ValidationError::NotActivePlayer(player).into());
        }
        Ok(())
    }

    /// Run an action on a working copy inside a transaction.
    fn transact(
        &mut self,
        state: &GameState,
        description: &str,
        op: impl FnOnce(&mut Self, &mut GameState) -> EngineResult<()>,
    ) -> EngineResult<GameState> {
        let mark = self.bus.mark();
        self.transactions.begin(state);
        self.transactions.add_operation(description, Some(state));

        let mut working = state.clone();
        let result = op(self, &mut working).map(|()| {
            self.abilities.sync(&mut self.bus, &working);
            self.resolve_outcome(&mut working);
        });

        match result {
            Ok(()) => {
                self.transactions.commit();
                Ok(working)
            }
            Err(err) => {
                self.rejected(description, &err);
                self.transactions.rollback();
                self.bus.discard_since(mark);
                self.abilities.sync(&mut self.bus, state);
                Err(err)
            }
        }
    }

    fn rejected(&self, description: &str, err: &EngineError) {
        debug!(action = description, error = %err, "action rolled back");
    }

    /// Take one phase transition, emitting its events.
    fn step(&mut self, state: &mut GameState, target: Phase) -> bool {
        let mut events = Vec::new();
        let moved = self.phases.transition_in_place(state, target, &mut events);
        self.bus.emit_all(state, events);
        moved
    }

    fn summon(&mut self, state: &mut GameState, player: PlayerId, card: Card, slot: Option<usize>) -> EngineResult<()> {
        let id = card.id;
        let unit = UnitInstance::place(card, player);
        state.battlefield.place(unit.clone(), slot)?;
        self.abilities.register_unit(&mut self.bus, &unit);
        self.bus.emit(
            state,
            EventDraft::new(GameEventType::UnitSummoned)
                .with_source(EventRef::Card(id))
                .with_target(EventRef::Player(player)),
        );
        Ok(())
    }

    fn cast_spell(&mut self, state: &mut GameState, player: PlayerId, card: &Card, target: Option<CardId>) {
        let mut events = vec![EventDraft::new(GameEventType::SpellCast)
            .with_source(EventRef::Card(card.id))
            .with_target(target.map_or(EventRef::Player(player), EventRef::Card))];
        if let Some(effect) = &card.spell_effect {
            let source = EffectSource::card(card.id, player).with_chosen(target);
            self.executor.execute(effect, &source, state, &mut events);
        }
        self.bus.emit_all(state, events);
    }

    /// Emit `win_progress` for every active condition and player.
    fn report_progress(&mut self, state: &mut GameState) {
        let drafts: Vec<EventDraft> = self
            .wins
            .progress(state)
            .into_iter()
            .map(|p| {
                EventDraft::new(GameEventType::WinProgress)
                    .with_target(EventRef::Player(p.player))
                    .with_data(EventData::Progress {
                        condition: p.condition,
                        player: p.player,
                        percent: p.percent,
                    })
            })
            .collect();
        self.bus.emit_all(state, drafts);
    }

    /// Record a win and move to `GameOver` if a condition is met.
    fn resolve_outcome(&mut self, state: &mut GameState) {
        if state.outcome.is_some() {
            return;
        }
        let Some(result) = self.wins.check_win_conditions(state) else {
            return;
        };
        info!(
            winner = ?result.winner,
            condition = %result.condition_id,
            message = %result.message,
            "game over"
        );
        let data = EventData::Outcome {
            winner: result.winner,
            message: result.message.clone(),
        };
        state.outcome = Some(result);
        self.step(state, Phase::GameOver);
        self.bus.emit(state, EventDraft::new(GameEventType::GameOver).with_data(data));
    }
}

impl std::fmt::Debug for GameEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GameEngine")
            .field("config", &self.config)
            .field("bus", &self.bus)
            .field("abilities", &self.abilities)
            .field("wins", &self.wins)
            .finish_non_exhaustive()
    }
}
