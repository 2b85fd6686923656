//! Engine configuration.
//!
//! `EngineConfig` collects every tunable number the rules use. It is plain
//! data: construct it with the builder methods or deserialize it from the
//! content layer, then hand it to `GameEngine::new`.

use serde::{Deserialize, Serialize};

use crate::rules::win::{BOARD_DOMINATION, ELEMENTAL_MASTERY, HEALTH_DEPLETION};

/// Which win conditions are active for a match.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Nexus health only.
    Classic,
    /// Nexus health plus the alternate wins.
    #[default]
    Arcana,
    /// An explicit list of condition ids.
    Custom(Vec<String>),
}

impl GameMode {
    /// Ids of the conditions this mode activates.
    #[must_use]
    pub fn condition_ids(&self) -> Vec<String> {
        match self {
            GameMode::Classic => vec![HEALTH_DEPLETION.to_string()],
            GameMode::Arcana => [HEALTH_DEPLETION, BOARD_DOMINATION, ELEMENTAL_MASTERY]
                .iter()
                .map(|id| (*id).to_string())
                .collect(),
            GameMode::Custom(ids) => ids.clone(),
        }
    }
}

/// Rules configuration.
///
/// ## Example
///
/// ```
/// use arcana_rules::core::{EngineConfig, GameMode};
///
/// let config = EngineConfig::new()
///     .with_seed(7)
///     .with_starting_health(30)
///     .with_game_mode(GameMode::Classic);
///
/// assert_eq!(config.starting_health, 30);
/// assert_eq!(config.max_mana, 10);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Nexus health at the start of a match.
    pub starting_health: i32,

    /// Ceiling for `max_mana`.
    pub max_mana: i32,

    /// Unspent mana banked as spell mana at end of turn, at most this much.
    pub spell_mana_cap: i32,

    /// Cards drawn before the mulligan.
    pub starting_hand_size: usize,

    /// Cards drawn into a full hand are burned.
    pub max_hand_size: usize,

    /// Ring buffer size of the event history.
    pub event_history_capacity: usize,

    pub game_mode: GameMode,

    /// Grant +1 attack to units of the round's aligned element.
    pub cosmic_alignment: bool,

    /// Units needed on board for board domination.
    pub domination_units: usize,

    /// Consecutive turns the board must be held.
    pub domination_turns: u32,

    /// Seed for shuffles.
    pub seed: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            starting_health: 20,
            max_mana: 10,
            spell_mana_cap: 3,
            starting_hand_size: 4,
            max_hand_size: 10,
            event_history_capacity: 100,
            game_mode: GameMode::default(),
            cosmic_alignment: false,
            domination_units: 5,
            domination_turns: 3,
            seed: 0,
        }
    }
}

impl EngineConfig {
    /// Default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    #[must_use]
    pub fn with_starting_health(mut self, health: i32) -> Self {
        self.starting_health = health;
        self
    }

    #[must_use]
    pub fn with_starting_hand_size(mut self, size: usize) -> Self {
        self.starting_hand_size = size;
        self
    }

    #[must_use]
    pub fn with_game_mode(mut self, mode: GameMode) -> Self {
        self.game_mode = mode;
        self
    }

    /// Enable the cosmic alignment bonus.
    #[must_use]
    pub fn with_cosmic_alignment(mut self) -> Self {
        self.cosmic_alignment = true;
        self
    }

    #[must_use]
    pub fn with_event_history_capacity(mut self, capacity: usize) -> Self {
        self.event_history_capacity = capacity;
        self
    }

    /// Board domination thresholds: `units` held for `turns` turns.
    #[must_use]
    pub fn with_domination(mut self, units: usize, turns: u32) -> Self {
        self.domination_units = units;
        self.domination_turns = turns;
        self
    }
}
