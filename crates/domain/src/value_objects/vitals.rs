//! Bounded character vitals and per-turn stat deltas.

use serde::{Deserialize, Serialize};

pub const VITAL_MIN: i32 = 0;
pub const VITAL_MAX: i32 = 100;

/// The three `[0, 100]` vitals. Values outside the range are corrected by
/// clamping, never reported as errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vitals {
    pub political_standing: i32,
    pub health: i32,
    pub mental: i32,
}

impl Vitals {
    /// Starting vitals for a freshly finalized character.
    pub fn baseline() -> Self {
        Self {
            political_standing: 50,
            health: 100,
            mental: 100,
        }
    }

    pub fn clamped(&self) -> Self {
        Self {
            political_standing: clamp_vital(self.political_standing),
            health: clamp_vital(self.health),
            mental: clamp_vital(self.mental),
        }
    }

    /// Applies deltas with saturating arithmetic, then clamps each vital.
    pub fn apply(&self, deltas: &StatDeltas) -> Self {
        Self {
            political_standing: self
                .political_standing
                .saturating_add(deltas.political_standing),
            health: self.health.saturating_add(deltas.health),
            mental: self.mental.saturating_add(deltas.mental),
        }
        .clamped()
    }
}

impl Default for Vitals {
    fn default() -> Self {
        Self::baseline()
    }
}

fn clamp_vital(value: i32) -> i32 {
    value.clamp(VITAL_MIN, VITAL_MAX)
}

/// Stat changes proposed for one turn.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatDeltas {
    #[serde(default)]
    pub political_standing: i32,
    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub mental: i32,
    #[serde(default)]
    pub power_points: i32,
}
