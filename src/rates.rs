// src/rates.rs
//
// Per-day meal rate and withholding tax rate by civil-service pay grade
// (golongan). Two schedules exist historically and disagree on grade IV;
// callers pick one explicitly, with `Standard` as the canonical default.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MealRate {
    pub rate: Decimal,
    pub tax_rate: Decimal,
}

impl MealRate {
    const fn zero() -> Self {
        Self {
            rate: dec!(0),
            tax_rate: dec!(0),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RateSchedule {
    /// Grade-tier table used by the ADK UM calculator: I..IV split, 5% tax
    /// from grade III up.
    #[default]
    Standard,
    /// Legacy table from the sheet-viewer path: I and II merged, grade IV at
    /// 41000 with 15% tax, unknown grades falling back to the base rate.
    Viewer,
}

impl RateSchedule {
    /// Rate lookup keyed on the grade-tier prefix before the slash.
    pub fn rate_for(&self, golongan: &str) -> MealRate {
        match self {
            RateSchedule::Standard => {
                if golongan.starts_with("I/") {
                    MealRate {
                        rate: dec!(35000),
                        tax_rate: dec!(0),
                    }
                } else if golongan.starts_with("II/") {
                    MealRate {
                        rate: dec!(36000),
                        tax_rate: dec!(0),
                    }
                } else if golongan.starts_with("III/") {
                    MealRate {
                        rate: dec!(37000),
                        tax_rate: dec!(0.05),
                    }
                } else if golongan.starts_with("IV/") {
                    MealRate {
                        rate: dec!(38000),
                        tax_rate: dec!(0.05),
                    }
                } else {
                    MealRate::zero()
                }
            }
            RateSchedule::Viewer => {
                let grade = golongan.to_uppercase();
                if grade.starts_with("I/") || grade.starts_with("II/") {
                    MealRate {
                        rate: dec!(35000),
                        tax_rate: dec!(0),
                    }
                } else if grade.starts_with("III/") {
                    MealRate {
                        rate: dec!(37000),
                        tax_rate: dec!(0.05),
                    }
                } else if grade.starts_with("IV/") {
                    MealRate {
                        rate: dec!(41000),
                        tax_rate: dec!(0.15),
                    }
                } else {
                    MealRate {
                        rate: dec!(35000),
                        tax_rate: dec!(0),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_rates_per_grade_tier() {
        let s = RateSchedule::Standard;
        assert_eq!(
            s.rate_for("I/c"),
            MealRate {
                rate: dec!(35000),
                tax_rate: dec!(0)
            }
        );
        assert_eq!(
            s.rate_for("II/a"),
            MealRate {
                rate: dec!(36000),
                tax_rate: dec!(0)
            }
        );
        assert_eq!(
            s.rate_for("III/a"),
            MealRate {
                rate: dec!(37000),
                tax_rate: dec!(0.05)
            }
        );
        assert_eq!(
            s.rate_for("IV/b"),
            MealRate {
                rate: dec!(38000),
                tax_rate: dec!(0.05)
            }
        );
    }

    #[test]
    fn standard_unknown_tier_rates_zero() {
        assert_eq!(RateSchedule::Standard.rate_for("V/a"), MealRate::zero());
        assert_eq!(RateSchedule::Standard.rate_for(""), MealRate::zero());
    }

    #[test]
    fn viewer_schedule_merges_low_grades_and_taxes_iv_higher() {
        let v = RateSchedule::Viewer;
        assert_eq!(v.rate_for("ii/d").rate, dec!(35000));
        assert_eq!(
            v.rate_for("IV/a"),
            MealRate {
                rate: dec!(41000),
                tax_rate: dec!(0.15)
            }
        );
        // Unknown grades fall back to the base rate instead of zero.
        assert_eq!(v.rate_for("V/a").rate, dec!(35000));
    }
}
