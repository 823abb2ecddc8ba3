//! Political factions and the faction ledger.
//!
//! A roster is only ever replaced as a whole. Candidates that fail any
//! structural check are rejected and the previous roster stays in force;
//! the ledger never patches a roster or invents political data.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::game_state::PlayerStats;

/// Theme color used when the supreme leader sits above every faction.
pub const DEFAULT_THEME_COLOR: &str = "crimson";
/// Shares of a valid roster sum to exactly this.
pub const TOTAL_SHARE: u32 = 100;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Faction {
    pub name: String,
    /// Percentage share of power, `[0, 100]`.
    pub share: u32,
    #[serde(default)]
    pub leaders: Vec<String>,
    pub color: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alliance: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Faction {
    pub fn new(name: impl Into<String>, share: u32, color: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            share,
            leaders: Vec::new(),
            color: color.into(),
            alliance: None,
            description: None,
        }
    }

    pub fn with_leaders(mut self, leaders: &[&str]) -> Self {
        self.leaders = leaders.iter().map(|l| l.to_string()).collect();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Substring match, so "Li Wei" matches a leader entry "Li Wei (acting)".
    pub fn is_led_by(&self, person: &str) -> bool {
        let person = person.trim();
        !person.is_empty() && self.leaders.iter().any(|leader| leader.contains(person))
    }
}

/// Why a proposed roster was not accepted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RosterRejection {
    #[error("Roster is not a list of factions: {0}")]
    NotAList(String),
    #[error("Roster entry {index} is malformed: {reason}")]
    MalformedEntry { index: usize, reason: String },
    #[error("Roster is empty")]
    Empty,
    #[error("Faction at index {0} has a blank name")]
    BlankName(usize),
    #[error("Faction name appears twice: {0}")]
    DuplicateName(String),
    #[error("Faction {name} has share {share} outside [0, 100]")]
    ShareOutOfRange { name: String, share: u32 },
    #[error("Faction shares sum to {0}, expected 100")]
    ShareSum(u32),
}

/// Accepts a candidate roster unchanged, or rejects it whole.
pub fn validate_roster(candidate: Vec<Faction>) -> Result<Vec<Faction>, RosterRejection> {
    if candidate.is_empty() {
        return Err(RosterRejection::Empty);
    }

    let mut seen = HashSet::new();
    let mut total: u32 = 0;
    for (index, faction) in candidate.iter().enumerate() {
        if faction.name.trim().is_empty() {
            return Err(RosterRejection::BlankName(index));
        }
        if !seen.insert(faction.name.as_str()) {
            return Err(RosterRejection::DuplicateName(faction.name.clone()));
        }
        if faction.share > TOTAL_SHARE {
            return Err(RosterRejection::ShareOutOfRange {
                name: faction.name.clone(),
                share: faction.share,
            });
        }
        total = total.saturating_add(faction.share);
    }

    if total != TOTAL_SHARE {
        return Err(RosterRejection::ShareSum(total));
    }

    Ok(candidate)
}

/// One-way promotion: sets the leadership flag when the player's own faction
/// lists the player among its leaders. Never demotes.
pub fn sync_leadership_flag(
    mut stats: PlayerStats,
    player_name: &str,
    roster: &[Faction],
) -> PlayerStats {
    if stats.is_leader {
        return stats;
    }
    let leads_own_faction = roster
        .iter()
        .find(|f| f.name == stats.faction)
        .is_some_and(|f| f.is_led_by(player_name));
    if leads_own_faction {
        stats.is_leader = true;
    }
    stats
}

/// Color of the faction the supreme leader belongs to, or the default when
/// the leader stands above the faction system.
pub fn resolve_theme_color<'a>(supreme_leader: &str, roster: &'a [Faction]) -> &'a str {
    roster
        .iter()
        .find(|f| f.is_led_by(supreme_leader))
        .map(|f| f.color.as_str())
        .unwrap_or(DEFAULT_THEME_COLOR)
}

/// Standard roster for the era containing `year`.
pub fn baseline_roster(year: i32) -> Vec<Faction> {
    if year < 1960 {
        vec![
            Faction::new("Vanguard", 45, "red")
                .with_leaders(&["Minister Gao Shan"])
                .with_description("Guardians of the founding line"),
            Faction::new("Reformers", 30, "green")
                .with_leaders(&["Premier Lin Huai"])
                .with_description("Pragmatic economic planners"),
            Faction::new("Army", 25, "olive")
                .with_leaders(&["Marshal Peng Dao"])
                .with_description("The uniformed establishment"),
        ]
    } else if year < 1980 {
        vec![
            Faction::new("Vanguard", 35, "red")
                .with_leaders(&["Minister Gao Shan"])
                .with_description("Guardians of the founding line"),
            Faction::new("Radicals", 25, "scarlet")
                .with_leaders(&["Secretary Jiang Mei"])
                .with_description("Agitators for permanent upheaval"),
            Faction::new("Reformers", 20, "green")
                .with_leaders(&["Premier Lin Huai"])
                .with_description("Pragmatic economic planners"),
            Faction::new("Army", 20, "olive")
                .with_leaders(&["Marshal Peng Dao"])
                .with_description("The uniformed establishment"),
        ]
    } else {
        vec![
            Faction::new("Reformers", 45, "green")
                .with_leaders(&["Premier Zhao Ren"])
                .with_description("Champions of opening and markets"),
            Faction::new("Technocrats", 30, "blue")
                .with_leaders(&["Vice Premier Hu Qing"])
                .with_description("Engineers turned administrators"),
            Faction::new("Vanguard", 25, "red")
                .with_leaders(&["Elder Chen Bo"])
                .with_description("Keepers of orthodoxy"),
        ]
    }
}
