//! Card catalog for template lookup.
//!
//! The content layer hands the engine validated [`Card`] templates. A deck
//! is built from template ids; every copy receives a fresh, match-unique
//! card id so the same template can appear several times.

use rustc_hash::FxHashMap;

use super::definition::{Card, CardId};
use crate::error::LookupError;

/// Registry of card templates.
///
/// ## Example
///
/// ```
/// use arcana_rules::cards::{Card, CardCatalog, CardId};
///
/// let mut catalog = CardCatalog::new();
/// catalog.register(Card::unit(CardId::new(1), "The Hermit", 3, 2, 4)).unwrap();
///
/// assert_eq!(catalog.get(CardId::new(1)).unwrap().name, "The Hermit");
/// ```
#[derive(Clone, Debug, Default)]
pub struct CardCatalog {
    cards: FxHashMap<CardId, Card>,
}

impl CardCatalog {
    /// Create a new empty catalog.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a template. Ids are unique within a catalog.
    pub fn register(&mut self, card: Card) -> Result<(), LookupError> {
        if self.cards.contains_key(&card.id) {
            return Err(LookupError::DuplicateTemplate(card.id));
        }
        self.cards.insert(card.id, card);
        Ok(())
    }

    /// Get a template by ID.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&Card> {
        self.cards.get(&id)
    }

    /// Check if a template ID is registered.
    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.cards.contains_key(&id)
    }

    /// Number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Check if the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Iterate over all templates.
    pub fn iter(&self) -> impl Iterator<Item = &Card> {
        self.cards.values()
    }

    /// Build a deck of fresh copies.
    ///
    /// `next_id` is the first id to hand out; it is advanced past every
    /// copy so a second deck built with the same counter never collides.
    pub fn build_deck(&self, template_ids: &[CardId], next_id: &mut u32) -> Result<Vec<Card>, LookupError> {
        template_ids
            .iter()
            .map(|&template| {
                let card = self.get(template).ok_or(LookupError::TemplateNotFound(template))?;
                let copy = card.with_id(CardId::new(*next_id));
                *next_id += 1;
                Ok(copy)
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> CardCatalog {
        let mut catalog = CardCatalog::new();
        catalog.register(Card::unit(CardId::new(1), "The Chariot", 4, 4, 3)).unwrap();
        catalog.register(Card::unit(CardId::new(2), "The Moon", 5, 3, 5)).unwrap();
        catalog
    }

    #[test]
    fn test_register_and_get() {
        let catalog = catalog();

        assert_eq!(catalog.len(), 2);
        assert!(catalog.contains(CardId::new(1)));
        assert!(catalog.get(CardId::new(99)).is_none());
    }

    #[test]
    fn test_duplicate_id_rejected() {
        let mut catalog = catalog();
        let err = catalog.register(Card::unit(CardId::new(1), "Duplicate", 1, 1, 1)).unwrap_err();

        assert_eq!(err, LookupError::DuplicateTemplate(CardId::new(1)));
        assert_eq!(catalog.get(CardId::new(1)).unwrap().name, "The Chariot");
    }

    #[test]
    fn test_build_deck_assigns_unique_ids() {
        let catalog = catalog();
        let mut next_id = 100;

        let deck = catalog
            .build_deck(&[CardId::new(1), CardId::new(1), CardId::new(2)], &mut next_id)
            .unwrap();

        let ids: Vec<_> = deck.iter().map(|c| c.id.raw()).collect();
        assert_eq!(ids, vec![100, 101, 102]);
        assert_eq!(deck[0].name, deck[1].name);
        assert_eq!(next_id, 103);
    }

    #[test]
    fn test_build_deck_missing_template() {
        let catalog = catalog();
        let mut next_id = 0;

        let err = catalog.build_deck(&[CardId::new(9)], &mut next_id).unwrap_err();
        assert_eq!(err, LookupError::TemplateNotFound(CardId::new(9)));
    }
}
