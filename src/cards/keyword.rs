//! Keyword taxonomy.
//!
//! Every keyword rule in the engine goes through [`Keyword`] and
//! [`KeywordSet`]; there are no string comparisons at rule sites. Card data
//! arrives with snake_case names (`"divine_shield"`), which are parsed once
//! when the card is built.

use serde::{Deserialize, Serialize};

/// A keyword capability.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Keyword {
    /// Attackers must target taunt units first; the nexus is shielded.
    Taunt,
    /// Negates the next instance of damage, then expires.
    DivineShield,
    /// Any damage dealt to a unit is lethal.
    Poisonous,
    /// Damage dealt heals the owning player.
    Lifesteal,
    /// Double damage against the opposite element.
    ElementalFury,
    /// Untargetable by attacks until it has attacked this turn.
    Stealth,
    /// Tarot variant of stealth.
    VeilOfIllusion,
    /// May attack twice per turn.
    Windfury,
    /// Ignores summoning sickness.
    Charge,
    /// Tarot variant of charge.
    AstralProjection,
    /// Splashes half damage onto units adjacent to the target.
    SolarRadiance,
    /// Takes one less damage from every hit.
    Tough,
    /// Restored to full health at its owner's end of turn.
    Regenerate,
    /// Excess combat damage spills onto the defending nexus.
    Overwhelm,
    /// Cannot be chosen by enemy single-target effects.
    SpellWard,
    /// Dies at its owner's end of turn.
    Ephemeral,
}

impl Keyword {
    /// Every keyword, in declaration order.
    pub const ALL: [Keyword; 16] = [
        Keyword::Taunt,
        Keyword::DivineShield,
        Keyword::Poisonous,
        Keyword::Lifesteal,
        Keyword::ElementalFury,
        Keyword::Stealth,
        Keyword::VeilOfIllusion,
        Keyword::Windfury,
        Keyword::Charge,
        Keyword::AstralProjection,
        Keyword::SolarRadiance,
        Keyword::Tough,
        Keyword::Regenerate,
        Keyword::Overwhelm,
        Keyword::SpellWard,
        Keyword::Ephemeral,
    ];

    /// The snake_case name used by card data.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Keyword::Taunt => "taunt",
            Keyword::DivineShield => "divine_shield",
            Keyword::Poisonous => "poisonous",
            Keyword::Lifesteal => "lifesteal",
            Keyword::ElementalFury => "elemental_fury",
            Keyword::Stealth => "stealth",
            Keyword::VeilOfIllusion => "veil_of_illusion",
            Keyword::Windfury => "windfury",
            Keyword::Charge => "charge",
            Keyword::AstralProjection => "astral_projection",
            Keyword::SolarRadiance => "solar_radiance",
            Keyword::Tough => "tough",
            Keyword::Regenerate => "regenerate",
            Keyword::Overwhelm => "overwhelm",
            Keyword::SpellWard => "spell_ward",
            Keyword::Ephemeral => "ephemeral",
        }
    }

    /// Parse a snake_case name. Accepts spaces and dashes as separators.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Keyword> {
        let normalized: String = name
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_lowercase() })
            .collect();
        Keyword::ALL.into_iter().find(|k| k.name() == normalized)
    }

    const fn bit(self) -> u32 {
        1 << (self as u32)
    }
}

impl std::fmt::Display for Keyword {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A set of keywords, stored as a bitmask.
///
/// ```
/// use arcana_rules::cards::{Keyword, KeywordSet};
///
/// let set = KeywordSet::from_names(["taunt", "lifesteal", "not_a_keyword"]);
/// assert!(set.contains(Keyword::Taunt));
/// assert!(set.contains(Keyword::Lifesteal));
/// assert_eq!(set.len(), 2);
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "Vec<Keyword>", from = "Vec<Keyword>")]
pub struct KeywordSet(u32);

impl KeywordSet {
    /// The empty set.
    #[must_use]
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Build from snake_case names, skipping unknown ones.
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let mut set = Self::empty();
        for name in names {
            match Keyword::from_name(name) {
                Some(keyword) => set.insert(keyword),
                None => tracing::warn!(keyword = name, "unknown keyword ignored"),
            }
        }
        set
    }

    /// Check membership.
    #[must_use]
    pub const fn contains(self, keyword: Keyword) -> bool {
        self.0 & keyword.bit() != 0
    }

    /// Add a keyword.
    pub fn insert(&mut self, keyword: Keyword) {
        self.0 |= keyword.bit();
    }

    /// Remove a keyword. Returns true if it was present.
    pub fn remove(&mut self, keyword: Keyword) -> bool {
        let present = self.contains(keyword);
        self.0 &= !keyword.bit();
        present
    }

    /// Add a keyword (builder pattern).
    #[must_use]
    pub fn with(mut self, keyword: Keyword) -> Self {
        self.insert(keyword);
        self
    }

    /// True if any of `keywords` is present.
    #[must_use]
    pub fn contains_any(self, keywords: &[Keyword]) -> bool {
        keywords.iter().any(|&k| self.contains(k))
    }

    /// Number of keywords in the set.
    #[must_use]
    pub const fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// True if no keywords are present.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Iterate in declaration order.
    pub fn iter(self) -> impl Iterator<Item = Keyword> {
        Keyword::ALL.into_iter().filter(move |&k| self.contains(k))
    }
}

impl FromIterator<Keyword> for KeywordSet {
    fn from_iter<I: IntoIterator<Item = Keyword>>(iter: I) -> Self {
        let mut set = Self::empty();
        for keyword in iter {
            set.insert(keyword);
        }
        set
    }
}

impl From<KeywordSet> for Vec<Keyword> {
    fn from(set: KeywordSet) -> Self {
        set.iter().collect()
    }
}

impl From<Vec<Keyword>> for KeywordSet {
    fn from(keywords: Vec<Keyword>) -> Self {
        keywords.into_iter().collect()
    }
}
