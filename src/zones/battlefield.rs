//! Battlefield: two fixed rows of unit slots.
//!
//! Each side has `MAX_SLOTS` positional slots. Slots are never compacted when
//! a unit leaves, so slot indices are stable for the lifetime of a unit;
//! solar radiance splash and target selection rely on that.
//!
//! Rows are `im::Vector`s so snapshots share structure.

use im::Vector;
use serde::{Deserialize, Serialize};

use crate::cards::{CardId, Element, UnitInstance};
use crate::core::PlayerId;
use crate::error::{EngineResult, LookupError, ValidationError};

/// Slots per side.
pub const MAX_SLOTS: usize = 7;

/// Location of a unit: owning side and slot index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SlotPosition {
    pub side: PlayerId,
    pub slot: usize,
}

impl SlotPosition {
    #[must_use]
    pub const fn new(side: PlayerId, slot: usize) -> Self {
        Self { side, slot }
    }
}

/// Per-element unit counts for one side.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ElementCounts([usize; 4]);

impl ElementCounts {
    fn index(element: Element) -> usize {
        match element {
            Element::Fire => 0,
            Element::Water => 1,
            Element::Earth => 2,
            Element::Air => 3,
        }
    }

    /// Units of `element`.
    #[must_use]
    pub fn get(&self, element: Element) -> usize {
        self.0[Self::index(element)]
    }

    fn add(&mut self, element: Element) {
        self.0[Self::index(element)] += 1;
    }

    /// Elements with at least one unit.
    #[must_use]
    pub fn distinct(&self) -> usize {
        self.0.iter().filter(|&&n| n > 0).count()
    }
}

/// The shared battlefield.
///
/// ## Usage
///
/// ```
/// use arcana_rules::cards::{Card, CardId, UnitInstance};
/// use arcana_rules::core::PlayerId;
/// use arcana_rules::zones::Battlefield;
///
/// let mut field = Battlefield::new();
/// let unit = UnitInstance::place(Card::unit(CardId::new(1), "The Sun", 4, 4, 4), PlayerId::PLAYER);
///
/// let slot = field.place(unit, None).unwrap();
/// assert_eq!(slot, 0);
/// assert!(field.get(CardId::new(1)).is_some());
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Battlefield {
    pub player_units: Vector<Option<UnitInstance>>,
    pub enemy_units: Vector<Option<UnitInstance>>,
}

impl Default for Battlefield {
    fn default() -> Self {
        Self::new()
    }
}

impl Battlefield {
    /// Create an empty battlefield.
    #[must_use]
    pub fn new() -> Self {
        let empty: Vector<Option<UnitInstance>> = std::iter::repeat(None).take(MAX_SLOTS).collect();
        Self {
            player_units: empty.clone(),
            enemy_units: empty,
        }
    }

    /// The slot row belonging to `side`.
    #[must_use]
    pub fn row(&self, side: PlayerId) -> &Vector<Option<UnitInstance>> {
        if side == PlayerId::PLAYER {
            &self.player_units
        } else {
            &self.enemy_units
        }
    }

    fn row_mut(&mut self, side: PlayerId) -> &mut Vector<Option<UnitInstance>> {
        if side == PlayerId::PLAYER {
            &mut self.player_units
        } else {
            &mut self.enemy_units
        }
    }

    /// Unit at a slot, if any.
    #[must_use]
    pub fn unit_at(&self, side: PlayerId, slot: usize) -> Option<&UnitInstance> {
        self.row(side).get(slot).and_then(Option::as_ref)
    }

    /// Find where a unit is.
    #[must_use]
    pub fn position_of(&self, id: CardId) -> Option<SlotPosition> {
        PlayerId::both().find_map(|side| {
            self.row(side)
                .iter()
                .position(|slot| slot.as_ref().is_some_and(|u| u.id() == id))
                .map(|slot| SlotPosition::new(side, slot))
        })
    }

    /// Look up a unit by id.
    #[must_use]
    pub fn get(&self, id: CardId) -> Option<&UnitInstance> {
        let pos = self.position_of(id)?;
        self.unit_at(pos.side, pos.slot)
    }

    /// Mutable lookup by id.
    pub fn get_mut(&mut self, id: CardId) -> Option<&mut UnitInstance> {
        let pos = self.position_of(id)?;
        self.row_mut(pos.side).get_mut(pos.slot).and_then(Option::as_mut)
    }

    /// True if the unit is in play on either side.
    #[must_use]
    pub fn contains(&self, id: CardId) -> bool {
        self.position_of(id).is_some()
    }

    /// Occupied slots on one side, in slot order.
    pub fn units(&self, side: PlayerId) -> impl Iterator<Item = (usize, &UnitInstance)> {
        self.row(side)
            .iter()
            .enumerate()
            .filter_map(|(slot, unit)| unit.as_ref().map(|u| (slot, u)))
    }

    /// Mutable access to every unit on one side.
    pub fn units_mut(&mut self, side: PlayerId) -> impl Iterator<Item = &mut UnitInstance> {
        self.row_mut(side).iter_mut().filter_map(Option::as_mut)
    }

    /// Every unit in play, local side first.
    pub fn all_units(&self) -> impl Iterator<Item = &UnitInstance> {
        self.player_units
            .iter()
            .chain(self.enemy_units.iter())
            .filter_map(Option::as_ref)
    }

    /// Number of units on one side.
    #[must_use]
    pub fn unit_count(&self, side: PlayerId) -> usize {
        self.units(side).count()
    }

    /// First empty slot on one side.
    #[must_use]
    pub fn first_empty_slot(&self, side: PlayerId) -> Option<usize> {
        self.row(side).iter().position(Option::is_none)
    }

    /// Place a unit on its owner's side.
    ///
    /// With `slot = None` the first empty slot is used. Returns the slot the
    /// unit landed in. A unit id may occupy at most one slot; placing one
    /// already in play is a [`LookupError::DuplicateUnit`].
    pub fn place(&mut self, unit: UnitInstance, slot: Option<usize>) -> EngineResult<usize> {
        if self.contains(unit.id()) {
            return Err(LookupError::DuplicateUnit(unit.id()).into());
        }

        let side = unit.owner;
        let slot = match slot {
            Some(s) if s >= MAX_SLOTS => {
                return Err(LookupError::SlotOutOfRange {
                    slot: s,
                    max: MAX_SLOTS - 1,
                }
                .into())
            }
            Some(s) if self.unit_at(side, s).is_some() => return Err(ValidationError::SlotOccupied(s).into()),
            Some(s) => s,
            None => self.first_empty_slot(side).ok_or(ValidationError::BoardFull)?,
        };
        self.row_mut(side).set(slot, Some(unit));
        Ok(slot)
    }

    /// Remove a unit, emptying its slot.
    pub fn remove(&mut self, id: CardId) -> Option<(SlotPosition, UnitInstance)> {
        let pos = self.position_of(id)?;
        let unit = self.row_mut(pos.side).set(pos.slot, None)?;
        Some((pos, unit))
    }

    /// Remove every unit at zero or less health.
    ///
    /// Returned in slot order, local side first.
    pub fn remove_dead(&mut self) -> Vec<(SlotPosition, UnitInstance)> {
        let dead: Vec<CardId> = self.all_units().filter(|u| u.is_dead()).map(UnitInstance::id).collect();
        dead.into_iter().filter_map(|id| self.remove(id)).collect()
    }

    /// Count units per element on one side.
    #[must_use]
    pub fn count_units_by_element(&self, side: PlayerId) -> ElementCounts {
        let mut counts = ElementCounts::default();
        for (_, unit) in self.units(side) {
            counts.add(unit.card.element);
        }
        counts
    }

    /// Occupied slots adjacent to `slot` on one side.
    #[must_use]
    pub fn adjacent_units(&self, side: PlayerId, slot: usize) -> Vec<CardId> {
        [slot.checked_sub(1), slot.checked_add(1)]
            .into_iter()
            .flatten()
            .filter_map(|s| self.unit_at(side, s))
            .map(UnitInstance::id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::Card;

    fn unit(id: u32, owner: PlayerId) -> UnitInstance {
        UnitInstance::place(Card::unit(CardId::new(id), "Unit", 1, 1, 1), owner)
    }

    #[test]
    fn test_new_has_fixed_rows() {
        let field = Battlefield::new();
        assert_eq!(field.player_units.len(), MAX_SLOTS);
        assert_eq!(field.enemy_units.len(), MAX_SLOTS);
        assert_eq!(field.unit_count(PlayerId::PLAYER), 0);
    }

    #[test]
    fn test_place_first_empty_and_specific() {
        let mut field = Battlefield::new();

        assert_eq!(field.place(unit(1, PlayerId::PLAYER), Some(3)), Ok(3));
        assert_eq!(field.place(unit(2, PlayerId::PLAYER), None), Ok(0));
        assert_eq!(
            field.place(unit(3, PlayerId::PLAYER), Some(3)),
            Err(ValidationError::SlotOccupied(3).into())
        );
        assert_eq!(
            field.place(unit(5, PlayerId::PLAYER), Some(MAX_SLOTS)),
            Err(LookupError::SlotOutOfRange {
                slot: MAX_SLOTS,
                max: MAX_SLOTS - 1
            }
            .into())
        );
        assert_eq!(field.place(unit(4, PlayerId::OPPONENT), None), Ok(0));

        assert_eq!(field.position_of(CardId::new(1)), Some(SlotPosition::new(PlayerId::PLAYER, 3)));
        assert_eq!(field.position_of(CardId::new(4)), Some(SlotPosition::new(PlayerId::OPPONENT, 0)));
    }

    #[test]
    fn test_row_full() {
        let mut field = Battlefield::new();
        for id in 0..MAX_SLOTS as u32 {
            assert!(field.place(unit(id, PlayerId::PLAYER), None).is_ok());
        }
        assert_eq!(field.place(unit(99, PlayerId::PLAYER), None), Err(ValidationError::BoardFull.into()));
        assert_eq!(field.first_empty_slot(PlayerId::PLAYER), None);
    }

    #[test]
    fn test_duplicate_unit_rejected() {
        let mut field = Battlefield::new();
        field.place(unit(1, PlayerId::PLAYER), None).unwrap();
        let err = field.place(unit(1, PlayerId::OPPONENT), None).unwrap_err();

        assert_eq!(err, LookupError::DuplicateUnit(CardId::new(1)).into());
        assert_eq!(field.unit_count(PlayerId::OPPONENT), 0);
    }

    #[test]
    fn test_remove_keeps_slot_positions() {
        let mut field = Battlefield::new();
        field.place(unit(1, PlayerId::PLAYER), None).unwrap();
        field.place(unit(2, PlayerId::PLAYER), None).unwrap();
        field.place(unit(3, PlayerId::PLAYER), None).unwrap();

        let (pos, removed) = field.remove(CardId::new(2)).unwrap();
        assert_eq!(pos.slot, 1);
        assert_eq!(removed.id(), CardId::new(2));

        assert!(field.unit_at(PlayerId::PLAYER, 1).is_none());
        assert_eq!(field.unit_at(PlayerId::PLAYER, 2).map(|u| u.id()), Some(CardId::new(3)));
    }

    #[test]
    fn test_remove_dead() {
        let mut field = Battlefield::new();
        field.place(unit(1, PlayerId::PLAYER), None).unwrap();
        field.place(unit(2, PlayerId::OPPONENT), None).unwrap();
        field.get_mut(CardId::new(2)).unwrap().current_health = 0;

        let dead = field.remove_dead();
        assert_eq!(dead.len(), 1);
        assert_eq!(dead[0].1.id(), CardId::new(2));
        assert!(field.contains(CardId::new(1)));
    }

    #[test]
    fn test_element_counts() {
        let mut field = Battlefield::new();
        for (id, element) in [(1, Element::Fire), (2, Element::Fire), (3, Element::Water)] {
            let card = Card::unit(CardId::new(id), "Unit", 1, 1, 1).with_element(element);
            field.place(UnitInstance::place(card, PlayerId::PLAYER), None).unwrap();
        }

        let counts = field.count_units_by_element(PlayerId::PLAYER);
        assert_eq!(counts.get(Element::Fire), 2);
        assert_eq!(counts.get(Element::Water), 1);
        assert_eq!(counts.get(Element::Air), 0);
        assert_eq!(counts.distinct(), 2);
    }

    #[test]
    fn test_adjacent_units() {
        let mut field = Battlefield::new();
        field.place(unit(1, PlayerId::OPPONENT), Some(0)).unwrap();
        field.place(unit(2, PlayerId::OPPONENT), Some(1)).unwrap();
        field.place(unit(3, PlayerId::OPPONENT), Some(3)).unwrap();

        assert_eq!(field.adjacent_units(PlayerId::OPPONENT, 0), vec![CardId::new(2)]);
        assert_eq!(field.adjacent_units(PlayerId::OPPONENT, 2), vec![CardId::new(2), CardId::new(3)]);
    }
}
