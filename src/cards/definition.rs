//! Card definitions - static card data.
//!
//! `Card` holds the immutable properties of one physical card: its stats,
//! element, keywords and the abilities it grants. Battlefield-only state
//! (current health, sickness, shield) lives on `UnitInstance` instead, so a
//! card in hand or deck never carries runtime fields.

use serde::{Deserialize, Serialize};

use super::element::Element;
use super::keyword::{Keyword, KeywordSet};
use crate::effects::EffectSpec;
use crate::triggers::TriggeredAbility;

/// Unique identifier for a physical card.
///
/// Each copy in a deck has its own id; on the battlefield the id doubles as
/// the unit id, so it is unique across both slot rows.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CardId(pub u32);

impl CardId {
    /// Create a new card ID.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw ID value.
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl std::fmt::Display for CardId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Card({})", self.0)
    }
}

/// Whether a card becomes a unit or resolves immediately.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardType {
    #[default]
    Unit,
    Spell,
}

/// Static card definition.
///
/// ## Example
///
/// ```
/// use arcana_rules::cards::{Card, CardId, Element, Keyword};
///
/// let tower = Card::unit(CardId::new(16), "The Tower", 5, 4, 6)
///     .with_element(Element::Earth)
///     .with_keyword(Keyword::Taunt);
///
/// assert!(tower.has_keyword(Keyword::Taunt));
/// assert_eq!(tower.element, Element::Earth);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Card {
    pub id: CardId,
    pub name: String,
    pub card_type: CardType,
    pub cost: i32,
    pub attack: i32,
    pub health: i32,
    pub element: Element,
    #[serde(default)]
    pub keywords: KeywordSet,
    /// Drawn upside down: weaker attack, slightly sturdier.
    #[serde(default)]
    pub is_reversed: bool,
    #[serde(default)]
    pub abilities: Vec<TriggeredAbility>,
    /// What a spell does when played. Ignored for units.
    #[serde(default)]
    pub spell_effect: Option<EffectSpec>,
}

impl Card {
    /// Create a unit card with no keywords or abilities.
    #[must_use]
    pub fn unit(id: CardId, name: impl Into<String>, cost: i32, attack: i32, health: i32) -> Self {
        Self {
            id,
            name: name.into(),
            card_type: CardType::Unit,
            cost,
            attack,
            health,
            element: Element::Fire,
            keywords: KeywordSet::empty(),
            is_reversed: false,
            abilities: Vec::new(),
            spell_effect: None,
        }
    }

    /// Create a spell card.
    #[must_use]
    pub fn spell(id: CardId, name: impl Into<String>, cost: i32, effect: EffectSpec) -> Self {
        Self {
            card_type: CardType::Spell,
            spell_effect: Some(effect),
            ..Self::unit(id, name, cost, 0, 0)
        }
    }

    /// Set the element (builder pattern).
    #[must_use]
    pub fn with_element(mut self, element: Element) -> Self {
        self.element = element;
        self
    }

    /// Add a keyword (builder pattern).
    #[must_use]
    pub fn with_keyword(mut self, keyword: Keyword) -> Self {
        self.keywords.insert(keyword);
        self
    }

    /// Mark as reversed (builder pattern).
    #[must_use]
    pub fn reversed(mut self) -> Self {
        self.is_reversed = true;
        self
    }

    /// Attach a triggered ability, owned by this card (builder pattern).
    #[must_use]
    pub fn with_ability(mut self, mut ability: TriggeredAbility) -> Self {
        ability.card_id = self.id;
        self.abilities.push(ability);
        self
    }

    /// Copy this card under a new id, re-pointing its abilities.
    #[must_use]
    pub fn with_id(&self, id: CardId) -> Self {
        let mut card = self.clone();
        card.id = id;
        for ability in &mut card.abilities {
            ability.card_id = id;
        }
        card
    }

    /// Check a keyword.
    #[must_use]
    pub fn has_keyword(&self, keyword: Keyword) -> bool {
        self.keywords.contains(keyword)
    }

    /// True for unit cards.
    #[must_use]
    pub fn is_unit(&self) -> bool {
        self.card_type == CardType::Unit
    }

    /// Attack penalty for a reversed card: `max(1, ceil(cost / 3))`.
    ///
    /// Zero for upright cards.
    #[must_use]
    pub fn reversed_penalty(&self) -> i32 {
        if self.is_reversed {
            ceil_div(self.cost.max(0), 3).max(1)
        } else {
            0
        }
    }

    /// Health bonus for a reversed card: `ceil(penalty / 2)`.
    #[must_use]
    pub fn reversed_health_bonus(&self) -> i32 {
        ceil_div(self.reversed_penalty(), 2)
    }
}

/// `ceil(a / b)` for non-negative `a` and positive `b`.
pub(crate) const fn ceil_div(a: i32, b: i32) -> i32 {
    (a + b - 1) / b
}

/// Free-function keyword check, for call sites holding an optional card.
#[must_use]
pub fn has_keyword(card: &Card, keyword: Keyword) -> bool {
    card.has_keyword(keyword)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::effects::EffectAction;

    #[test]
    fn test_card_id() {
        let id = CardId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "Card(42)");
    }

    #[test]
    fn test_unit_builder() {
        let card = Card::unit(CardId::new(1), "The Fool", 1, 1, 2)
            .with_element(Element::Air)
            .with_keyword(Keyword::Charge);

        assert!(card.is_unit());
        assert_eq!(card.element, Element::Air);
        assert!(has_keyword(&card, Keyword::Charge));
        assert!(!card.has_keyword(Keyword::Taunt));
    }

    #[test]
    fn test_spell_builder() {
        let bolt = Card::spell(
            CardId::new(2),
            "Judgement",
            2,
            EffectSpec::actions(vec![EffectAction::damage_enemy_nexus(3)]),
        );

        assert!(!bolt.is_unit());
        assert!(bolt.spell_effect.is_some());
    }

    #[test]
    fn test_reversed_penalty() {
        let cheap = Card::unit(CardId::new(1), "Page", 1, 2, 2).reversed();
        assert_eq!(cheap.reversed_penalty(), 1);
        assert_eq!(cheap.reversed_health_bonus(), 1);

        let pricey = Card::unit(CardId::new(2), "Queen", 7, 6, 6).reversed();
        assert_eq!(pricey.reversed_penalty(), 3);
        assert_eq!(pricey.reversed_health_bonus(), 2);

        let upright = Card::unit(CardId::new(3), "King", 7, 6, 6);
        assert_eq!(upright.reversed_penalty(), 0);
        assert_eq!(upright.reversed_health_bonus(), 0);
    }

    #[test]
    fn test_with_id_repoints_abilities() {
        use crate::events::GameEventType;
        use crate::triggers::{AbilityId, TriggeredAbility};

        let card = Card::unit(CardId::new(1), "The Star", 3, 2, 3).with_ability(
            TriggeredAbility::new(AbilityId::new(1), GameEventType::TurnStart, EffectSpec::text("Draw 1 card")),
        );
        assert_eq!(card.abilities[0].card_id, CardId::new(1));

        let copy = card.with_id(CardId::new(77));
        assert_eq!(copy.id, CardId::new(77));
        assert_eq!(copy.abilities[0].card_id, CardId::new(77));
    }

    #[test]
    fn test_card_deserializes_with_defaults() {
        let json = r#"{
            "id": 5, "name": "Temperance", "card_type": "unit",
            "cost": 3, "attack": 2, "health": 4, "element": "water",
            "keywords": ["lifesteal"]
        }"#;
        let card: Card = serde_json::from_str(json).unwrap();

        assert_eq!(card.element, Element::Water);
        assert!(card.has_keyword(Keyword::Lifesteal));
        assert!(!card.is_reversed);
        assert!(card.abilities.is_empty());
    }
}
