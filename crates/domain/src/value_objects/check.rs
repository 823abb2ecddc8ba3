//! Check arithmetic: thresholds, critical floors, and draw classification.
//!
//! A check draws a uniform integer in `[1, 100]`. The draw is classified in
//! priority order:
//! - `draw <= 5` is always a critical failure, even against a tiny threshold
//! - `draw >= critical_floor` is a critical success
//! - `draw > threshold` is a success
//! - anything else fails
//!
//! Attribute dominance never guarantees success. When the raw threshold
//! drops below the minimum, the shortfall widens the critical-success band
//! instead.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

pub const DRAW_MIN: i32 = 1;
pub const DRAW_MAX: i32 = 100;
pub const THRESHOLD_MIN: i32 = 5;
pub const THRESHOLD_MAX: i32 = 95;
pub const CRITICAL_FLOOR_DEFAULT: i32 = 95;
pub const CRITICAL_FLOOR_MIN: i32 = 20;
/// Draws at or below this value are critical failures.
pub const CRITICAL_FAILURE_MAX: i32 = 5;
/// Each attribute point lowers the threshold by this much.
pub const ATTRIBUTE_WEIGHT: i32 = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckOutcome {
    CriticalSuccess,
    Success,
    Failure,
    CriticalFailure,
}

impl CheckOutcome {
    pub fn as_tag(&self) -> &'static str {
        match self {
            CheckOutcome::CriticalSuccess => "CRITICAL_SUCCESS",
            CheckOutcome::Success => "SUCCESS",
            CheckOutcome::Failure => "FAILURE",
            CheckOutcome::CriticalFailure => "CRITICAL_FAILURE",
        }
    }
}

impl fmt::Display for CheckOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

impl FromStr for CheckOutcome {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "CRITICAL_SUCCESS" => Ok(CheckOutcome::CriticalSuccess),
            "SUCCESS" => Ok(CheckOutcome::Success),
            "FAILURE" => Ok(CheckOutcome::Failure),
            "CRITICAL_FAILURE" => Ok(CheckOutcome::CriticalFailure),
            _ => Err(DomainError::parse(format!("Unknown outcome: {}", s))),
        }
    }
}

/// Decision boundaries for one check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckThresholds {
    /// A draw must exceed this to succeed. Always in `[5, 95]`.
    pub threshold: i32,
    /// Draws at or above this are critical successes. Always in `[20, 95]`.
    pub critical_floor: i32,
}

impl CheckThresholds {
    /// `threshold = clamp(difficulty - attribute * 2, 5, 95)`; a raw value
    /// below 5 lowers the critical floor by the shortfall, down to 20.
    pub fn compute(base_difficulty: i32, governing_attribute: i32) -> Self {
        let raw = base_difficulty
            .saturating_sub(governing_attribute.saturating_mul(ATTRIBUTE_WEIGHT));
        let threshold = raw.clamp(THRESHOLD_MIN, THRESHOLD_MAX);
        let critical_floor = if raw < THRESHOLD_MIN {
            let overflow = THRESHOLD_MIN.saturating_sub(raw);
            CRITICAL_FLOOR_DEFAULT
                .saturating_sub(overflow)
                .max(CRITICAL_FLOOR_MIN)
        } else {
            CRITICAL_FLOOR_DEFAULT
        };
        Self {
            threshold,
            critical_floor,
        }
    }

    /// Thresholds after a fate-point reroll: the threshold drops by `step`
    /// (never below the minimum) while the critical floor is kept.
    pub fn lowered_by(&self, step: i32) -> Self {
        Self {
            threshold: self.threshold.saturating_sub(step).max(THRESHOLD_MIN),
            critical_floor: self.critical_floor,
        }
    }

    pub fn classify(&self, draw: i32) -> CheckOutcome {
        if draw <= CRITICAL_FAILURE_MAX {
            CheckOutcome::CriticalFailure
        } else if draw >= self.critical_floor {
            CheckOutcome::CriticalSuccess
        } else if draw > self.threshold {
            CheckOutcome::Success
        } else {
            CheckOutcome::Failure
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ordinary_threshold_keeps_default_floor() {
        let t = CheckThresholds::compute(60, 10);
        assert_eq!(t.threshold, 40);
        assert_eq!(t.critical_floor, CRITICAL_FLOOR_DEFAULT);
    }

    #[test]
    fn high_difficulty_clamps_to_max() {
        let t = CheckThresholds::compute(250, 0);
        assert_eq!(t.threshold, THRESHOLD_MAX);
        assert_eq!(t.critical_floor, CRITICAL_FLOOR_DEFAULT);
    }

    #[test]
    fn attribute_dominance_widens_critical_band() {
        // raw = 10 - 40 = -30, overflow = 35, floor = 60
        let t = CheckThresholds::compute(10, 20);
        assert_eq!(t.threshold, THRESHOLD_MIN);
        assert_eq!(t.critical_floor, 60);
    }

    #[test]
    fn critical_floor_never_below_minimum() {
        let t = CheckThresholds::compute(0, 1000);
        assert_eq!(t.threshold, THRESHOLD_MIN);
        assert_eq!(t.critical_floor, CRITICAL_FLOOR_MIN);
    }

    #[test]
    fn bounds_hold_across_grid() {
        for difficulty in (-50..=250).step_by(7) {
            for attribute in -10..=60 {
                let t = CheckThresholds::compute(difficulty, attribute);
                assert!((THRESHOLD_MIN..=THRESHOLD_MAX).contains(&t.threshold));
                assert!((CRITICAL_FLOOR_MIN..=CRITICAL_FLOOR_DEFAULT).contains(&t.critical_floor));
            }
        }
    }

    #[test]
    fn classify_priority_order() {
        let t = CheckThresholds::compute(0, 20);
        // extreme-failure band beats a tiny threshold
        assert_eq!(t.classify(3), CheckOutcome::CriticalFailure);
        assert_eq!(t.classify(5), CheckOutcome::CriticalFailure);
        assert_eq!(t.classify(6), CheckOutcome::Success);

        let t = CheckThresholds::compute(50, 0);
        assert_eq!(t.classify(50), CheckOutcome::Failure);
        assert_eq!(t.classify(51), CheckOutcome::Success);
        assert_eq!(t.classify(94), CheckOutcome::Success);
        assert_eq!(t.classify(95), CheckOutcome::CriticalSuccess);
        assert_eq!(t.classify(100), CheckOutcome::CriticalSuccess);
    }

    #[test]
    fn lowered_by_respects_minimum() {
        let t = CheckThresholds::compute(50, 0).lowered_by(5);
        assert_eq!(t.threshold, 45);
        assert_eq!(t.critical_floor, CRITICAL_FLOOR_DEFAULT);

        let t = CheckThresholds::compute(7, 0).lowered_by(5);
        assert_eq!(t.threshold, THRESHOLD_MIN);
    }

    #[test]
    fn outcome_tags_round_trip_through_from_str() {
        for outcome in [
            CheckOutcome::CriticalSuccess,
            CheckOutcome::Success,
            CheckOutcome::Failure,
            CheckOutcome::CriticalFailure,
        ] {
            assert_eq!(outcome.as_tag().parse::<CheckOutcome>().unwrap(), outcome);
        }
        assert_eq!(
            serde_json::to_string(&CheckOutcome::CriticalFailure).unwrap(),
            "\"CRITICAL_FAILURE\""
        );
    }
}
