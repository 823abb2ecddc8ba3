//! Engine configuration.
//!
//! Supported environment variables:
//! - STATECRAFT_NARRATIVE_TIMEOUT_SECS: collaborator timeout (default 60)
//! - STATECRAFT_FATE_POINT_CAP: soft fate-point cap (default 5)
//! - STATECRAFT_DEBUG_FATE: pin fate points for testing (default false)
//! - STATECRAFT_DEBUG_FATE_VALUE: value pinned by the override (default 99)
//! - STATECRAFT_PITY_THRESHOLD: turns without a critical before the pity action (default 10)
//! - STATECRAFT_GRANT_COOLDOWN_MONTHS: power-point grant cooldown (default 3)
//! - STATECRAFT_REROLL_STEP: threshold reduction per reroll (default 5)
//! - STATECRAFT_HISTORY_CONTEXT: history entries sent with each request (default 6)

use std::str::FromStr;
use std::time::Duration;

use statecraft_domain::TraitRules;

use crate::use_cases::turn::MergeRules;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub narrative_timeout: Duration,
    pub fate_point_cap: u32,
    pub debug_fate: bool,
    pub debug_fate_value: u32,
    pub pity_threshold: u32,
    pub grant_cooldown_months: u32,
    pub reroll_step: i32,
    pub history_context: usize,
    pub trait_rules: TraitRules,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            narrative_timeout: Duration::from_secs(60),
            fate_point_cap: 5,
            debug_fate: false,
            debug_fate_value: 99,
            pity_threshold: 10,
            grant_cooldown_months: 3,
            reroll_step: 5,
            history_context: 6,
            trait_rules: TraitRules::default(),
        }
    }
}

impl EngineConfig {
    /// Reads the process environment. Call after `.env` has been loaded.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let read = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        Self {
            narrative_timeout: Duration::from_secs(parse_or(
                "STATECRAFT_NARRATIVE_TIMEOUT_SECS",
                read("STATECRAFT_NARRATIVE_TIMEOUT_SECS"),
                defaults.narrative_timeout.as_secs(),
            )),
            fate_point_cap: parse_or(
                "STATECRAFT_FATE_POINT_CAP",
                read("STATECRAFT_FATE_POINT_CAP"),
                defaults.fate_point_cap,
            ),
            debug_fate: parse_or(
                "STATECRAFT_DEBUG_FATE",
                read("STATECRAFT_DEBUG_FATE").map(|v| v.to_ascii_lowercase()),
                defaults.debug_fate,
            ),
            debug_fate_value: parse_or(
                "STATECRAFT_DEBUG_FATE_VALUE",
                read("STATECRAFT_DEBUG_FATE_VALUE"),
                defaults.debug_fate_value,
            ),
            pity_threshold: parse_or(
                "STATECRAFT_PITY_THRESHOLD",
                read("STATECRAFT_PITY_THRESHOLD"),
                defaults.pity_threshold,
            ),
            grant_cooldown_months: parse_or(
                "STATECRAFT_GRANT_COOLDOWN_MONTHS",
                read("STATECRAFT_GRANT_COOLDOWN_MONTHS"),
                defaults.grant_cooldown_months,
            ),
            reroll_step: parse_or(
                "STATECRAFT_REROLL_STEP",
                read("STATECRAFT_REROLL_STEP"),
                defaults.reroll_step,
            ),
            history_context: parse_or(
                "STATECRAFT_HISTORY_CONTEXT",
                read("STATECRAFT_HISTORY_CONTEXT"),
                defaults.history_context,
            ),
            trait_rules: defaults.trait_rules,
        }
    }

    pub fn merge_rules(&self) -> MergeRules {
        MergeRules {
            fate_point_cap: self.fate_point_cap,
            debug_fate: self.debug_fate.then_some(self.debug_fate_value),
            grant_cooldown_months: self.grant_cooldown_months,
            trait_rules: self.trait_rules,
        }
    }
}

fn parse_or<T>(key: &str, raw: Option<String>, default: T) -> T
where
    T: FromStr + std::fmt::Debug,
{
    let Some(raw) = raw else {
        return default;
    };
    match raw.parse::<T>() {
        Ok(value) => {
            tracing::info!(key, value = ?value, "Applied environment override");
            value
        }
        Err(_) => {
            tracing::warn!(key, val = %raw, default = ?default, "Invalid value, using default");
            default
        }
    }
}
