//! Actions offered to the player at the end of a turn.

use serde::{Deserialize, Serialize};

use crate::value_objects::Attribute;

/// Difficulty used when a choice does not declare one.
pub const DEFAULT_DIFFICULTY: i32 = 50;
/// Power points deducted by an intervention.
pub const INTERVENE_POWER_COST: u32 = 1;

pub const CUSTOM_CHOICE_ID: &str = "custom_action";
pub const PITY_CHOICE_ID: &str = "pity_action";
pub const INTERVENE_CHOICE_ID: &str = "intervene";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ChoiceKind {
    /// Authored by the narrative generator.
    #[default]
    Standard,
    /// Player writes the action text.
    Custom,
    /// Free zero-difficulty custom action after a long critical drought.
    Pity,
    /// Leader-only action paid for with power points.
    Intervene,
}

impl ChoiceKind {
    /// Whether the player supplies the action text.
    pub fn takes_free_text(&self) -> bool {
        matches!(self, ChoiceKind::Custom | ChoiceKind::Pity | ChoiceKind::Intervene)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    pub text: String,
    #[serde(default)]
    pub intent: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute: Option<Attribute>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub difficulty: Option<i32>,
    #[serde(default)]
    pub kind: ChoiceKind,
    #[serde(default)]
    pub power_cost: u32,
}

impl Choice {
    pub fn standard(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            intent: String::new(),
            attribute: None,
            difficulty: None,
            kind: ChoiceKind::Standard,
            power_cost: 0,
        }
    }

    pub fn custom() -> Self {
        Self {
            kind: ChoiceKind::Custom,
            intent: "custom".to_string(),
            difficulty: Some(DEFAULT_DIFFICULTY),
            ..Self::standard(CUSTOM_CHOICE_ID, "Act on your own initiative")
        }
    }

    pub fn pity() -> Self {
        Self {
            kind: ChoiceKind::Pity,
            intent: "pity".to_string(),
            difficulty: Some(0),
            ..Self::standard(PITY_CHOICE_ID, "Fortune owes you one: act freely")
        }
    }

    pub fn intervene() -> Self {
        Self {
            kind: ChoiceKind::Intervene,
            intent: "intervene".to_string(),
            attribute: Some(Attribute::Politics),
            difficulty: Some(DEFAULT_DIFFICULTY),
            power_cost: INTERVENE_POWER_COST,
            ..Self::standard(INTERVENE_CHOICE_ID, "Use your faction's power to intervene")
        }
    }

    pub fn difficulty_or_default(&self) -> i32 {
        self.difficulty.unwrap_or(DEFAULT_DIFFICULTY)
    }

    pub fn with_attribute(mut self, attribute: Attribute) -> Self {
        self.attribute = Some(attribute);
        self
    }
}
