//! Elements and their fixed oppositions.

use serde::{Deserialize, Serialize};

/// A card's element.
///
/// Fire opposes water and earth opposes air. Elemental fury and the
/// element-synergy bonuses are keyed off these.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Element {
    Fire,
    Water,
    Earth,
    Air,
}

impl Element {
    /// All four elements.
    pub const ALL: [Element; 4] = [Element::Fire, Element::Water, Element::Earth, Element::Air];

    /// The fixed opposite element.
    #[must_use]
    pub const fn opposite(self) -> Element {
        match self {
            Element::Fire => Element::Water,
            Element::Water => Element::Fire,
            Element::Earth => Element::Air,
            Element::Air => Element::Earth,
        }
    }

    /// True if `other` is this element's opposite.
    #[must_use]
    pub fn opposes(self, other: Element) -> bool {
        self.opposite() == other
    }

    /// The element in cosmic alignment during `round`.
    ///
    /// Cycles fire, earth, air, water starting at round 1.
    #[must_use]
    pub const fn aligned_for_round(round: u32) -> Element {
        match round.saturating_sub(1) % 4 {
            0 => Element::Fire,
            1 => Element::Earth,
            2 => Element::Air,
            _ => Element::Water,
        }
    }

    /// Snake-case name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Element::Fire => "fire",
            Element::Water => "water",
            Element::Earth => "earth",
            Element::Air => "air",
        }
    }

    /// Parse a snake-case name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Element> {
        Element::ALL.into_iter().find(|e| e.name() == name)
    }
}

impl std::fmt::Display for Element {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}
