//! Unit instances - runtime card state on the battlefield.
//!
//! A `UnitInstance` is created exactly once, when a unit card is placed, and
//! dropped when it leaves play. Everything that only makes sense for a unit
//! in play (damage taken, sickness, attacks made, the live shield) lives
//! here rather than on [`Card`].

use serde::{Deserialize, Serialize};

use super::definition::{Card, CardId};
use super::keyword::Keyword;
use crate::core::PlayerId;

/// A unit in play.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct UnitInstance {
    /// The card this unit was played from. Granted keywords are added here.
    pub card: Card,

    /// Controlling player.
    pub owner: PlayerId,

    /// Health remaining. May briefly be zero or negative before removal.
    pub current_health: i32,

    /// Health ceiling used by healing and regeneration.
    pub max_health: i32,

    /// Placed this turn and not yet refreshed.
    pub has_summoning_sickness: bool,

    /// Attacks made during the current turn.
    pub attacks_this_turn: u8,

    /// Live divine shield. Starts set when the card has the keyword.
    pub divine_shield: bool,
}

impl UnitInstance {
    /// Place a card, attaching runtime fields.
    ///
    /// Reversed cards enter with their health bonus applied.
    #[must_use]
    pub fn place(card: Card, owner: PlayerId) -> Self {
        let max_health = card.health + card.reversed_health_bonus();
        let divine_shield = card.has_keyword(Keyword::DivineShield);
        Self {
            card,
            owner,
            current_health: max_health,
            max_health,
            has_summoning_sickness: true,
            attacks_this_turn: 0,
            divine_shield,
        }
    }

    /// Strip runtime fields, returning the card to its hand/deck form.
    #[must_use]
    pub fn into_card(self) -> Card {
        self.card
    }

    /// Unit id (the card id).
    #[must_use]
    pub fn id(&self) -> CardId {
        self.card.id
    }

    /// Check a keyword on the underlying card.
    #[must_use]
    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.card.has_keyword(keyword)
    }

    /// True once the unit has attacked this turn.
    #[must_use]
    pub fn has_attacked_this_turn(&self) -> bool {
        self.attacks_this_turn > 0
    }

    /// Attacks allowed per turn: two with windfury, otherwise one.
    #[must_use]
    pub fn max_attacks(&self) -> u8 {
        if self.has_keyword(Keyword::Windfury) {
            2
        } else {
            1
        }
    }

    /// Summoning sickness that actually blocks attacking.
    #[must_use]
    pub fn is_sick(&self) -> bool {
        self.has_summoning_sickness
            && !self.card.keywords.contains_any(&[Keyword::Charge, Keyword::AstralProjection])
    }

    /// Hidden from attackers: stealthy and not yet revealed by attacking.
    #[must_use]
    pub fn is_hidden(&self) -> bool {
        self.card.keywords.contains_any(&[Keyword::Stealth, Keyword::VeilOfIllusion])
            && !self.has_attacked_this_turn()
    }

    /// True when health has dropped to zero or below.
    #[must_use]
    pub fn is_dead(&self) -> bool {
        self.current_health <= 0
    }

    /// Heal up to `max_health`. Returns the amount actually restored.
    pub fn heal(&mut self, amount: i32) -> i32 {
        let before = self.current_health;
        self.current_health = (self.current_health + amount.max(0)).min(self.max_health).max(before);
        self.current_health - before
    }

    /// Reset per-turn flags at the start of the owner's turn.
    pub fn refresh(&mut self) {
        self.has_summoning_sickness = false;
        self.attacks_this_turn = 0;
    }
}
