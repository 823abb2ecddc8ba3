//! The canonical game state and its parts.
//!
//! Exactly one `GameState` is live per session. It is created at character
//! finalization and replaced wholesale every turn; history is append-only.

use serde::{Deserialize, Serialize};

use super::character_trait::{effective_attributes, Trait, TraitChange};
use super::faction::{baseline_roster, resolve_theme_color, Faction};
use crate::error::DomainError;
use crate::value_objects::{AttributeSet, CheckOutcome, GameDate, Vitals};

/// Supreme leader at game start. Not a member of any faction.
pub const FOUNDING_LEADER: &str = "The Founding Chairman";
pub const FOUNDING_SLOGAN: &str = "Serve the people";
pub const FOUNDING_SYMBOL: &str = "red_star";
/// Fate points granted to a new character.
pub const STARTING_FATE_POINTS: u32 = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Background {
    Worker,
    Peasant,
    Intellectual,
    Soldier,
    Cadre,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub birth_year: i32,
    pub vitals: Vitals,
    /// "Red stars". Soft-capped outside of the debug override.
    pub fate_points: u32,
    pub power_points: u32,
    pub faction: String,
    pub is_leader: bool,
    #[serde(default)]
    pub inventory: Vec<String>,
    /// Base attributes, fixed for the character's lifetime.
    pub attributes: AttributeSet,
    #[serde(default)]
    pub traits: Vec<Trait>,
}

impl PlayerStats {
    pub fn effective_attributes(&self) -> AttributeSet {
        effective_attributes(&self.attributes, &self.traits)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupremeLeader {
    pub name: String,
    #[serde(default)]
    pub slogan: String,
    #[serde(default)]
    pub symbol: String,
}

impl SupremeLeader {
    pub fn founding() -> Self {
        Self {
            name: FOUNDING_LEADER.to_string(),
            slogan: FOUNDING_SLOGAN.to_string(),
            symbol: FOUNDING_SYMBOL.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactionChange {
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub date: GameDate,
    pub narrative: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<CheckOutcome>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trait_changes: Vec<TraitChange>,
    /// Net fate-point change attributable to this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fate_delta: Option<i32>,
    /// Net power-point change attributable to this turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub power_delta: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub faction_change: Option<FactionChange>,
}

impl HistoryEntry {
    /// Entry with narrative only; used for openings and recovered saves.
    pub fn narrative_only(date: GameDate, narrative: impl Into<String>) -> Self {
        Self {
            date,
            narrative: narrative.into(),
            action: None,
            outcome: None,
            trait_changes: Vec::new(),
            fate_delta: None,
            power_delta: None,
            faction_change: None,
        }
    }
}

/// Inputs gathered at character finalization.
#[derive(Debug, Clone)]
pub struct NewGame {
    pub start: GameDate,
    pub background: Background,
    pub player_name: String,
    pub birth_year: i32,
    pub faction: String,
    pub attributes: AttributeSet,
    pub backstory: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub date: GameDate,
    pub background: Background,
    pub player_name: String,
    pub stats: PlayerStats,
    pub factions: Vec<Faction>,
    pub supreme_leader: SupremeLeader,
    pub history: Vec<HistoryEntry>,
    #[serde(default)]
    pub game_over: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_over_reason: Option<String>,
    #[serde(default)]
    pub backstory: String,
    /// Consecutive turns without a natural critical success.
    #[serde(default)]
    pub turns_since_critical: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub designated_successor: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub suggested_heirs: Vec<String>,
    /// Populated only when leadership ends in a game-over turn.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub successor_candidates: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_power_grant: Option<GameDate>,
}

impl GameState {
    pub fn new_game(setup: NewGame) -> Result<Self, DomainError> {
        let player_name = setup.player_name.trim().to_string();
        if player_name.is_empty() {
            return Err(DomainError::validation("Player name cannot be empty"));
        }

        let opening = HistoryEntry::narrative_only(
            setup.start,
            format!("{} enters political life.", player_name),
        );

        Ok(Self {
            date: setup.start,
            background: setup.background,
            player_name,
            stats: PlayerStats {
                birth_year: setup.birth_year,
                vitals: Vitals::baseline(),
                fate_points: STARTING_FATE_POINTS,
                power_points: 0,
                faction: setup.faction,
                is_leader: false,
                inventory: Vec::new(),
                attributes: setup.attributes.clamped(),
                traits: Vec::new(),
            },
            factions: baseline_roster(setup.start.year),
            supreme_leader: SupremeLeader::founding(),
            history: vec![opening],
            game_over: false,
            game_over_reason: None,
            backstory: setup.backstory,
            turns_since_critical: 0,
            designated_successor: None,
            suggested_heirs: Vec::new(),
            successor_candidates: Vec::new(),
            last_power_grant: None,
        })
    }

    pub fn theme_color(&self) -> &str {
        resolve_theme_color(&self.supreme_leader.name, &self.factions)
    }

    pub fn is_awaiting_succession(&self) -> bool {
        self.game_over && !self.successor_candidates.is_empty()
    }

    /// The designated successor when they are among the candidates,
    /// otherwise the first candidate.
    pub fn preferred_successor(&self) -> Option<&str> {
        if let Some(designated) = &self.designated_successor {
            if self.successor_candidates.iter().any(|c| c == designated) {
                return Some(designated.as_str());
            }
        }
        self.successor_candidates.first().map(String::as_str)
    }

    pub fn recent_history(&self, count: usize) -> &[HistoryEntry] {
        let start = self.history.len().saturating_sub(count);
        &self.history[start..]
    }
}
