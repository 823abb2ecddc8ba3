//! In-game calendar.
//!
//! The simulation advances in whole months; days are never tracked.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GameDate {
    pub year: i32,
    /// 1-based month of year.
    pub month: u8,
}

impl GameDate {
    pub fn new(year: i32, month: u8) -> Result<Self, DomainError> {
        if !(1..=12).contains(&month) {
            return Err(DomainError::validation(format!(
                "Month must be between 1 and 12, got {}",
                month
            )));
        }
        Ok(Self { year, month })
    }

    /// Months since year zero, used for all calendar arithmetic.
    fn ordinal(&self) -> i64 {
        i64::from(self.year) * 12 + i64::from(self.month) - 1
    }

    fn from_ordinal(ordinal: i64) -> Self {
        let year = ordinal.div_euclid(12);
        let month = ordinal.rem_euclid(12) + 1;
        Self {
            year: year as i32,
            month: month as u8,
        }
    }

    /// Signed number of months from `earlier` to `self`.
    pub fn months_since(&self, earlier: &GameDate) -> i64 {
        self.ordinal() - earlier.ordinal()
    }

    /// Months elapsed moving from `self` to `next`; negative deltas count as zero.
    pub fn elapsed_until(&self, next: &GameDate) -> u32 {
        let delta = next.months_since(self);
        u32::try_from(delta.max(0)).unwrap_or(u32::MAX)
    }

    pub fn plus_months(&self, months: i64) -> Self {
        Self::from_ordinal(self.ordinal() + months)
    }
}

impl fmt::Display for GameDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:02}", self.year, self.month)
    }
}
