//! Attack target selection.

use serde::{Deserialize, Serialize};

use crate::cards::{CardId, Keyword};
use crate::zones::{Battlefield, SlotPosition};

/// Legal targets for one attacker.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidTargets {
    /// Candidate defender slots, in slot order.
    pub units: Vec<SlotPosition>,
    pub can_attack_nexus: bool,
}

impl ValidTargets {
    #[must_use]
    pub fn contains_unit(&self, battlefield: &Battlefield, unit: CardId) -> bool {
        battlefield
            .position_of(unit)
            .is_some_and(|pos| self.units.contains(&pos))
    }
}

/// Targets an attacker at `attacker_pos` may choose.
///
/// Hidden units (stealth or veil of illusion, not yet attacked this turn)
/// are never candidates. If a remaining candidate has taunt, only taunt
/// units are valid and the nexus is off limits.
#[must_use]
pub fn get_valid_targets(battlefield: &Battlefield, attacker_pos: SlotPosition) -> ValidTargets {
    let defender = attacker_pos.side.opponent();

    let visible: Vec<(SlotPosition, bool)> = battlefield
        .units(defender)
        .filter(|(_, unit)| !unit.is_hidden())
        .map(|(slot, unit)| (SlotPosition::new(defender, slot), unit.has_keyword(Keyword::Taunt)))
        .collect();

    let taunt = visible.iter().any(|&(_, taunt)| taunt);
    let units = visible
        .into_iter()
        .filter(|&(_, has_taunt)| !taunt || has_taunt)
        .map(|(pos, _)| pos)
        .collect();

    ValidTargets {
        units,
        can_attack_nexus: !taunt,
    }
}
