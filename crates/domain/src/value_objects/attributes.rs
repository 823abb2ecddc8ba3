//! Character attributes.
//!
//! Six integer dimensions, conventionally in `[0, 20]`. The base set is
//! fixed at character creation; effective values are always derived by
//! adding trait modifiers (see [`crate::entities::effective_attributes`]).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

/// Lowest conventional base attribute value.
pub const ATTRIBUTE_MIN: i32 = 0;
/// Highest conventional base attribute value.
pub const ATTRIBUTE_MAX: i32 = 20;
/// Value used for every dimension when a balanced default set is needed.
pub const BALANCED_ATTRIBUTE_VALUE: i32 = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Physique,
    Intellect,
    Willpower,
    Agility,
    Charisma,
    /// Political-standing aptitude.
    Politics,
}

impl Attribute {
    pub fn all() -> [Attribute; 6] {
        [
            Attribute::Physique,
            Attribute::Intellect,
            Attribute::Willpower,
            Attribute::Agility,
            Attribute::Charisma,
            Attribute::Politics,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::Physique => "physique",
            Attribute::Intellect => "intellect",
            Attribute::Willpower => "willpower",
            Attribute::Agility => "agility",
            Attribute::Charisma => "charisma",
            Attribute::Politics => "politics",
        }
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = DomainError;

    /// Accepts canonical names plus the loose spellings generators tend to emit.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace([' ', '-'], "_");
        match normalized.as_str() {
            "physique" | "physical" | "strength" | "str" => Ok(Attribute::Physique),
            "intellect" | "intelligence" | "int" => Ok(Attribute::Intellect),
            "willpower" | "will" | "resolve" => Ok(Attribute::Willpower),
            "agility" | "dexterity" | "dex" => Ok(Attribute::Agility),
            "charisma" | "cha" => Ok(Attribute::Charisma),
            "politics" | "political" | "political_aptitude" | "political_standing_aptitude" => {
                Ok(Attribute::Politics)
            }
            _ => Err(DomainError::parse(format!("Unknown attribute: {}", s))),
        }
    }
}

/// Signed per-attribute adjustments carried by a trait.
pub type AttributeModifiers = BTreeMap<Attribute, i32>;

/// A full set of the six attribute values.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttributeSet {
    pub physique: i32,
    pub intellect: i32,
    pub willpower: i32,
    pub agility: i32,
    pub charisma: i32,
    pub politics: i32,
}

impl AttributeSet {
    pub fn uniform(value: i32) -> Self {
        Self {
            physique: value,
            intellect: value,
            willpower: value,
            agility: value,
            charisma: value,
            politics: value,
        }
    }

    /// Middle-of-the-range set used when a record has no attributes at all.
    pub fn balanced() -> Self {
        Self::uniform(BALANCED_ATTRIBUTE_VALUE)
    }

    pub fn get(&self, attribute: Attribute) -> i32 {
        match attribute {
            Attribute::Physique => self.physique,
            Attribute::Intellect => self.intellect,
            Attribute::Willpower => self.willpower,
            Attribute::Agility => self.agility,
            Attribute::Charisma => self.charisma,
            Attribute::Politics => self.politics,
        }
    }

    pub fn set(&mut self, attribute: Attribute, value: i32) {
        let slot = match attribute {
            Attribute::Physique => &mut self.physique,
            Attribute::Intellect => &mut self.intellect,
            Attribute::Willpower => &mut self.willpower,
            Attribute::Agility => &mut self.agility,
            Attribute::Charisma => &mut self.charisma,
            Attribute::Politics => &mut self.politics,
        };
        *slot = value;
    }

    /// Adds each modifier to its dimension. No clamping.
    pub fn apply_modifiers(&mut self, modifiers: &AttributeModifiers) {
        for (attribute, delta) in modifiers {
            let current = self.get(*attribute);
            self.set(*attribute, current + delta);
        }
    }

    /// Copy with every dimension clamped to the conventional base range.
    pub fn clamped(&self) -> Self {
        let mut out = *self;
        for attribute in Attribute::all() {
            out.set(
                attribute,
                self.get(attribute).clamp(ATTRIBUTE_MIN, ATTRIBUTE_MAX),
            );
        }
        out
    }
}

impl Default for AttributeSet {
    fn default() -> Self {
        Self::balanced()
    }
}
