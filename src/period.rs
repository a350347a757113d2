// src/period.rs

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PeriodError {
    #[error("Month must be between 1 and 12, got {0}")]
    InvalidMonth(u32),
}

/// One payroll month. All extract dates and archive keys are scoped to a
/// period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Period {
    pub year: i32,
    pub month: u32,
}

impl Period {
    pub fn new(year: i32, month: u32) -> Result<Self, PeriodError> {
        if !(1..=12).contains(&month) {
            return Err(PeriodError::InvalidMonth(month));
        }
        Ok(Self { year, month })
    }

    /// "MM", zero-padded — the form written into reconciled template columns.
    pub fn month_padded(&self) -> String {
        format!("{:02}", self.month)
    }

    /// "YYYYMM", used in generated file names.
    pub fn ym_compact(&self) -> String {
        format!("{}{:02}", self.year, self.month)
    }

    /// ISO date string for a day of this month, zero-padded.
    pub fn day_iso(&self, day: u32) -> String {
        format!("{}-{:02}-{:02}", self.year, self.month, day)
    }

    pub fn first_day(&self) -> Option<NaiveDate> {
        NaiveDate::from_ymd_opt(self.year, self.month, 1)
    }

    pub fn last_day(&self) -> Option<NaiveDate> {
        let (next_year, next_month) = if self.month == 12 {
            (self.year + 1, 1)
        } else {
            (self.year, self.month + 1)
        };
        NaiveDate::from_ymd_opt(next_year, next_month, 1)?.pred_opt()
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_out_of_range_month() {
        assert!(Period::new(2025, 0).is_err());
        assert!(Period::new(2025, 13).is_err());
        assert!(Period::new(2025, 12).is_ok());
    }

    #[test]
    fn day_iso_zero_pads_month_and_day() {
        let p = Period::new(2025, 3).unwrap();
        assert_eq!(p.day_iso(7), "2025-03-07");
        assert_eq!(p.ym_compact(), "202503");
    }

    #[test]
    fn last_day_handles_year_rollover() {
        let p = Period::new(2024, 12).unwrap();
        assert_eq!(p.last_day(), NaiveDate::from_ymd_opt(2024, 12, 31));
        let feb = Period::new(2024, 2).unwrap();
        assert_eq!(feb.last_day(), NaiveDate::from_ymd_opt(2024, 2, 29));
    }
}
