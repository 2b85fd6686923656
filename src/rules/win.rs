//! Win conditions.
//!
//! Conditions are registered once and switched on by a [`GameMode`]. The
//! evaluator checks every active condition for both players and keeps the
//! highest-priority achieved result.
//!
//! ## Shipped conditions
//!
//! | id                  | priority | achieved when                               |
//! |---------------------|----------|---------------------------------------------|
//! | `health_depletion`  | 100      | the opposing nexus is at 0 or below         |
//! | `board_domination`  | 50       | N units held for K consecutive turns        |
//! | `elemental_mastery` | 40       | all four elements on your side at once      |
//!
//! Multi-turn conditions keep a start turn per `(condition, player)` in a
//! [`ConditionHistory`]. A lapse clears the entry.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::core::{EngineConfig, GameMode, GameState, PlayerId};

pub const HEALTH_DEPLETION: &str = "health_depletion";
pub const BOARD_DOMINATION: &str = "board_domination";
pub const ELEMENTAL_MASTERY: &str = "elemental_mastery";

/// The recorded outcome of a match.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WinResult {
    pub achieved: bool,
    /// `None` for a draw.
    pub winner: Option<PlayerId>,
    pub message: String,
    pub condition_id: String,
}

impl WinResult {
    #[must_use]
    pub fn win(condition_id: impl Into<String>, winner: PlayerId, message: impl Into<String>) -> Self {
        Self {
            achieved: true,
            winner: Some(winner),
            message: message.into(),
            condition_id: condition_id.into(),
        }
    }

    #[must_use]
    pub fn draw(condition_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            achieved: true,
            winner: None,
            message: message.into(),
            condition_id: condition_id.into(),
        }
    }

    #[must_use]
    pub fn is_draw(&self) -> bool {
        self.achieved && self.winner.is_none()
    }
}

/// Result of checking one condition for one player.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WinCheck {
    pub achieved: bool,
    /// Who wins if achieved. `None` with `achieved` means a draw.
    pub winner: Option<PlayerId>,
    pub message: String,
}

impl WinCheck {
    #[must_use]
    pub fn not_yet() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn won(player: PlayerId, message: impl Into<String>) -> Self {
        Self {
            achieved: true,
            winner: Some(player),
            message: message.into(),
        }
    }

    #[must_use]
    pub fn drawn(message: impl Into<String>) -> Self {
        Self {
            achieved: true,
            winner: None,
            message: message.into(),
        }
    }
}

/// Cross-turn tracking for multi-turn conditions.
#[derive(Clone, Debug, Default)]
pub struct ConditionHistory {
    started: FxHashMap<(String, PlayerId), u32>,
}

impl ConditionHistory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Turn at which `player` began meeting `condition`, if they still are.
    #[must_use]
    pub fn start_turn(&self, condition: &str, player: PlayerId) -> Option<u32> {
        self.started.get(&(condition.to_string(), player)).copied()
    }

    /// Record that `player` meets `condition` on `turn`. Keeps an earlier
    /// start. Returns the start turn.
    pub fn hold(&mut self, condition: &str, player: PlayerId, turn: u32) -> u32 {
        *self.started.entry((condition.to_string(), player)).or_insert(turn)
    }

    /// Forget a lapsed condition.
    pub fn clear(&mut self, condition: &str, player: PlayerId) {
        self.started.remove(&(condition.to_string(), player));
    }

    pub fn reset(&mut self) {
        self.started.clear();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.started.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.started.is_empty()
    }
}

/// A way to win.
pub trait WinCondition {
    fn id(&self) -> &str;

    /// Higher wins when several conditions are met at once.
    fn priority(&self) -> i32;

    /// Check whether `player` has met the condition.
    fn check(&self, state: &GameState, player: PlayerId, history: &mut ConditionHistory) -> WinCheck;

    /// Progress towards the condition, 0 to 100.
    fn progress(&self, state: &GameState, player: PlayerId, history: &ConditionHistory) -> u8;
}

fn percent(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 100;
    }
    (part.min(whole) * 100 / whole) as u8
}

/// The opposing nexus has fallen. Both nexuses falling together is a draw.
#[derive(Clone, Debug)]
pub struct HealthDepletion {
    starting_health: i32,
}

impl HealthDepletion {
    #[must_use]
    pub fn new(starting_health: i32) -> Self {
        Self { starting_health }
    }
}

impl WinCondition for HealthDepletion {
    fn id(&self) -> &str {
        HEALTH_DEPLETION
    }

    fn priority(&self) -> i32 {
        100
    }

    fn check(&self, state: &GameState, player: PlayerId, _: &mut ConditionHistory) -> WinCheck {
        let own = state.players[player].health;
        let theirs = state.players[player.opponent()].health;
        match (own <= 0, theirs <= 0) {
            (true, true) => WinCheck::drawn("Both nexuses destroyed"),
            (false, true) => WinCheck::won(player, format!("{player} destroyed the enemy nexus")),
            _ => WinCheck::not_yet(),
        }
    }

    fn progress(&self, state: &GameState, player: PlayerId, _: &ConditionHistory) -> u8 {
        let theirs = state.players[player.opponent()].health;
        let dealt = (self.starting_health - theirs).max(0) as usize;
        percent(dealt, self.starting_health.max(0) as usize)
    }
}

/// Hold at least `units` units for `turns` consecutive turns.
#[derive(Clone, Debug)]
pub struct BoardDomination {
    units: usize,
    turns: u32,
}

impl BoardDomination {
    #[must_use]
    pub fn new(units: usize, turns: u32) -> Self {
        Self {
            units,
            turns: turns.max(1),
        }
    }
}

impl WinCondition for BoardDomination {
    fn id(&self) -> &str {
        BOARD_DOMINATION
    }

    fn priority(&self) -> i32 {
        50
    }

    fn check(&self, state: &GameState, player: PlayerId, history: &mut ConditionHistory) -> WinCheck {
        if state.battlefield.unit_count(player) < self.units {
            history.clear(BOARD_DOMINATION, player);
            return WinCheck::not_yet();
        }
        let start = history.hold(BOARD_DOMINATION, player, state.turn);
        let held = state.turn.saturating_sub(start) + 1;
        if held >= self.turns {
            WinCheck::won(player, format!("{player} dominated the board for {held} turns"))
        } else {
            WinCheck::not_yet()
        }
    }

    fn progress(&self, state: &GameState, player: PlayerId, history: &ConditionHistory) -> u8 {
        let count = state.battlefield.unit_count(player);
        let board = u32::from(percent(count, self.units)) / 2;
        let held = match history.start_turn(BOARD_DOMINATION, player) {
            Some(start) if count >= self.units => state.turn.saturating_sub(start) + 1,
            _ => 0,
        };
        let time = u32::from(percent(held as usize, self.turns as usize)) / 2;
        (board + time).min(100) as u8
    }
}

/// Units of all four elements on your side at once.
#[derive(Clone, Debug, Default)]
pub struct ElementalMastery;

impl WinCondition for ElementalMastery {
    fn id(&self) -> &str {
        ELEMENTAL_MASTERY
    }

    fn priority(&self) -> i32 {
        40
    }

    fn check(&self, state: &GameState, player: PlayerId, _: &mut ConditionHistory) -> WinCheck {
        if state.battlefield.count_units_by_element(player).distinct() == 4 {
            WinCheck::won(player, format!("{player} mastered all four elements"))
        } else {
            WinCheck::not_yet()
        }
    }

    fn progress(&self, state: &GameState, player: PlayerId, _: &ConditionHistory) -> u8 {
        percent(state.battlefield.count_units_by_element(player).distinct(), 4)
    }
}

/// Progress of one active condition for one player.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConditionProgress {
    pub condition: String,
    pub player: PlayerId,
    pub percent: u8,
}

/// Evaluates registered conditions for the active game mode.
pub struct WinEvaluator {
    conditions: Vec<Box<dyn WinCondition>>,
    active: Vec<String>,
    history: ConditionHistory,
}

impl WinEvaluator {
    /// No conditions registered.
    #[must_use]
    pub fn new() -> Self {
        Self {
            conditions: Vec::new(),
            active: Vec::new(),
            history: ConditionHistory::new(),
        }
    }

    /// The shipped conditions, activated per `config.game_mode`.
    #[must_use]
    pub fn with_defaults(config: &EngineConfig) -> Self {
        let mut evaluator = Self::new();
        evaluator.register(Box::new(HealthDepletion::new(config.starting_health)));
        evaluator.register(Box::new(BoardDomination::new(config.domination_units, config.domination_turns)));
        evaluator.register(Box::new(ElementalMastery));
        evaluator.set_mode(&config.game_mode);
        evaluator
    }

    /// Register a condition. Registration does not activate it. A condition
    /// with an id already registered replaces the old one.
    pub fn register(&mut self, condition: Box<dyn WinCondition>) {
        self.conditions.retain(|c| c.id() != condition.id());
        self.conditions.push(condition);
        self.conditions.sort_by_key(|c| std::cmp::Reverse(c.priority()));
    }

    /// Activate the conditions of a mode. Unknown ids are skipped.
    pub fn set_mode(&mut self, mode: &GameMode) {
        self.active = mode
            .condition_ids()
            .into_iter()
            .filter(|id| {
                let known = self.is_registered(id);
                if !known {
                    warn!(condition = %id, "unknown win condition in game mode");
                }
                known
            })
            .collect();
        self.history.reset();
    }

    #[must_use]
    pub fn is_registered(&self, id: &str) -> bool {
        self.conditions.iter().any(|c| c.id() == id)
    }

    #[must_use]
    pub fn is_active(&self, id: &str) -> bool {
        self.active.iter().any(|a| a == id)
    }

    /// Ids of the active conditions.
    #[must_use]
    pub fn active(&self) -> &[String] {
        &self.active
    }

    #[must_use]
    pub fn history(&self) -> &ConditionHistory {
        &self.history
    }

    /// Check every active condition for both players.
    ///
    /// The highest priority achieved result wins. If two results share that
    /// priority but name different winners, the match is a draw.
    pub fn check_win_conditions(&mut self, state: &GameState) -> Option<WinResult> {
        let mut best: Option<(i32, WinResult)> = None;

        for condition in self.conditions.iter().filter(|c| self.active.iter().any(|a| a == c.id())) {
            for player in PlayerId::both() {
                let check = condition.check(state, player, &mut self.history);
                if !check.achieved {
                    continue;
                }
                let priority = condition.priority();
                let result = WinResult {
                    achieved: true,
                    winner: check.winner,
                    message: check.message,
                    condition_id: condition.id().to_string(),
                };
                best = match best.take() {
                    Some((p, current)) if p > priority => Some((p, current)),
                    Some((p, current)) if p == priority && current.winner != result.winner => Some((
                        p,
                        WinResult::draw(current.condition_id, "Simultaneous victory: the match is a draw"),
                    )),
                    Some((p, current)) if p == priority => Some((p, current)),
                    _ => Some((priority, result)),
                };
            }
        }

        best.map(|(_, result)| result)
    }

    /// Progress of every active condition for both players.
    #[must_use]
    pub fn progress(&self, state: &GameState) -> Vec<ConditionProgress> {
        self.conditions
            .iter()
            .filter(|c| self.is_active(c.id()))
            .flat_map(|condition| {
                PlayerId::both().map(move |player| ConditionProgress {
                    condition: condition.id().to_string(),
                    player,
                    percent: condition.progress(state, player, &self.history),
                })
            })
            .collect()
    }
}

impl Default for WinEvaluator {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for WinEvaluator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let ids: Vec<&str> = self.conditions.iter().map(|c| c.id()).collect();
        f.debug_struct("WinEvaluator")
            .field("conditions", &ids)
            .field("active", &self.active)
            .field("history", &self.history)
            .finish()
    }
}
