//! Age and gestational-age arithmetic.
//!
//! Ages are calendar differences (whole years, then whole months of the
//! remainder, then remaining days), not a flat day count divided by 365.25.
//! The decimal form is derived from the calendar form.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

use crate::constants::{
    CORRECTION_AGE_THRESHOLD_EXTREME, CORRECTION_AGE_THRESHOLD_MODERATE, DAYS_PER_YEAR,
    FULL_TERM_DAYS, MODERATE_PRETERM_THRESHOLD_WEEKS, MONTHS_PER_YEAR, PRETERM_THRESHOLD_WEEKS,
};
use crate::types::Gestation;

/// Whole-unit calendar age components.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct CalendarAge {
    pub years: i32,
    pub months: i32,
    pub days: i32,
}

/// An age in both decimal-year and calendar form.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Age {
    pub decimal_years: f64,
    pub calendar: CalendarAge,
}

/// Calendar difference between two dates: the largest whole-month shift of
/// `from` (day-of-month clamped to the target month's length) that does not
/// pass `to`, plus the remaining days. The clamping matters for month-end
/// birth dates, where naive day borrowing can leave a negative remainder.
pub fn age_between(from: NaiveDate, to: NaiveDate) -> Age {
    let mut total_months =
        (to.year() - from.year()) * 12 + (to.month() as i32 - from.month() as i32);
    let mut anchor = shift_months_clamped(from, total_months);
    if anchor > to {
        total_months -= 1;
        anchor = shift_months_clamped(from, total_months);
    }

    let days = (to - anchor).num_days() as i32;
    let years = total_months.div_euclid(12);
    let months = total_months.rem_euclid(12);

    let decimal_years =
        f64::from(years) + f64::from(months) / MONTHS_PER_YEAR + f64::from(days) / DAYS_PER_YEAR;

    Age {
        decimal_years,
        calendar: CalendarAge { years, months, days },
    }
}

/// Whether centile lookups should additionally run against a corrected age.
///
/// Term infants (≥37 weeks) are never corrected. Moderate preterm (32–36+6)
/// corrects until one year of chronological age, extreme preterm (<32 weeks)
/// until two years.
pub fn should_apply_gestation_correction(
    gestation: Option<&Gestation>,
    chronological_age_years: f64,
) -> bool {
    let Some(gestation) = gestation else {
        return false;
    };

    let total_weeks = gestation.total_weeks();

    if total_weeks >= PRETERM_THRESHOLD_WEEKS {
        return false;
    }
    if total_weeks >= MODERATE_PRETERM_THRESHOLD_WEEKS {
        return chronological_age_years <= CORRECTION_AGE_THRESHOLD_MODERATE;
    }
    chronological_age_years <= CORRECTION_AGE_THRESHOLD_EXTREME
}

/// Birth date shifted forward to the estimated 40-week due date.
pub fn corrected_birth_date(birth_date: NaiveDate, gestation: &Gestation) -> NaiveDate {
    let adjustment = FULL_TERM_DAYS - gestation.total_days();
    birth_date + Duration::days(adjustment)
}

/// Age recomputed from the estimated due date instead of the birth date.
pub fn corrected_age(
    birth_date: NaiveDate,
    measurement_date: NaiveDate,
    gestation: &Gestation,
) -> Age {
    age_between(corrected_birth_date(birth_date, gestation), measurement_date)
}

/// `date` shifted by a whole number of months, with the day-of-month clamped
/// to the length of the target month (Jan 31 + 1 month = Feb 28/29).
fn shift_months_clamped(date: NaiveDate, months: i32) -> NaiveDate {
    let zero_based = date.year() * 12 + date.month() as i32 - 1 + months;
    let year = zero_based.div_euclid(12);
    let month = zero_based.rem_euclid(12) as u32 + 1;
    let day = date.day().min(days_in_month(year, month) as u32);
    NaiveDate::from_ymd_opt(year, month, day).expect("clamped day fits the month")
}

fn days_in_month(year: i32, month: u32) -> i32 {
    let first = NaiveDate::from_ymd_opt(year, month, 1).expect("valid first of month");
    let next = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .expect("valid first of next month");
    (next - first).num_days() as i32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_exact_years() {
        let age = age_between(date(2020, 1, 1), date(2025, 1, 1));
        assert_eq!(
            age.calendar,
            CalendarAge {
                years: 5,
                months: 0,
                days: 0
            }
        );
        assert!((age.decimal_years - 5.0).abs() < 1e-9);
    }

    #[test]
    fn test_borrowing_days_and_months() {
        // 2020-01-31 -> 2020-03-01: one month (to Feb 29) plus one day.
        let age = age_between(date(2020, 1, 31), date(2020, 3, 1));
        assert_eq!(
            age.calendar,
            CalendarAge {
                years: 0,
                months: 1,
                days: 1
            }
        );
    }

    #[test]
    fn test_month_end_birth_dates_keep_days_non_negative() {
        // Day-of-month clamping: a 29th/30th/31st birth date must never leave
        // a negative days remainder, whatever the measurement month length.
        for birth_day in [29, 30, 31] {
            let birth = date(2020, 1, birth_day);
            let mut measurement = date(2020, 2, 1);
            while measurement <= date(2021, 3, 15) {
                let age = age_between(birth, measurement);
                assert!(
                    (0..12).contains(&age.calendar.months) && age.calendar.days >= 0,
                    "{birth} -> {measurement} gave {:?}",
                    age.calendar
                );
                measurement += Duration::days(7);
            }
        }
    }

    #[test]
    fn test_month_end_to_month_end() {
        // Jan 31 + 1 month clamps to Feb 29; exactly one month, zero days.
        let age = age_between(date(2020, 1, 31), date(2020, 2, 29));
        assert_eq!(
            age.calendar,
            CalendarAge {
                years: 0,
                months: 1,
                days: 0
            }
        );

        // A year later Feb has 28 days, so the 29th/30th/31st all clamp there.
        let age = age_between(date(2020, 1, 31), date(2021, 3, 1));
        assert_eq!(
            age.calendar,
            CalendarAge {
                years: 1,
                months: 1,
                days: 1
            }
        );
    }

    #[test]
    fn test_partial_year_decimal() {
        let age = age_between(date(2020, 1, 1), date(2020, 7, 16));
        assert_eq!(age.calendar.years, 0);
        assert_eq!(age.calendar.months, 6);
        assert_eq!(age.calendar.days, 15);
        assert!((age.decimal_years - (6.0 / 12.0 + 15.0 / 365.25)).abs() < 1e-9);
    }

    #[test]
    fn test_term_gestation_never_corrects() {
        for weeks in [37, 40, 44] {
            let gestation = Gestation { weeks, days: 0 };
            assert!(!should_apply_gestation_correction(Some(&gestation), 0.1));
        }
    }

    #[test]
    fn test_moderate_preterm_corrects_until_one_year() {
        let gestation = Gestation { weeks: 34, days: 0 };
        assert!(should_apply_gestation_correction(Some(&gestation), 0.5));
        assert!(should_apply_gestation_correction(Some(&gestation), 1.0));
        assert!(!should_apply_gestation_correction(Some(&gestation), 1.01));
    }

    #[test]
    fn test_extreme_preterm_corrects_until_two_years() {
        let gestation = Gestation { weeks: 28, days: 0 };
        assert!(should_apply_gestation_correction(Some(&gestation), 1.5));
        assert!(should_apply_gestation_correction(Some(&gestation), 2.0));
        assert!(!should_apply_gestation_correction(Some(&gestation), 2.5));
    }

    #[test]
    fn test_boundary_at_37_weeks_minus_a_day() {
        // 36+6 is still preterm.
        let gestation = Gestation { weeks: 36, days: 6 };
        assert!(should_apply_gestation_correction(Some(&gestation), 0.5));
    }

    #[test]
    fn test_no_gestation_no_correction() {
        assert!(!should_apply_gestation_correction(None, 0.1));
    }

    #[test]
    fn test_corrected_age_shifts_towards_due_date() {
        // 34+0 gestation: due date is 42 days after birth, so corrected age
        // is about six weeks younger.
        let gestation = Gestation { weeks: 34, days: 0 };
        let birth = date(2025, 4, 1);
        let measurement = date(2026, 1, 18);
        let chronological = age_between(birth, measurement);
        let corrected = corrected_age(birth, measurement, &gestation);
        assert!(corrected.decimal_years < chronological.decimal_years);
        let expected = chronological.decimal_years - 42.0 / 365.25;
        assert!((corrected.decimal_years - expected).abs() < 0.05);
    }

    #[test]
    fn test_corrected_birth_date_is_due_date() {
        let gestation = Gestation { weeks: 32, days: 3 };
        let shifted = corrected_birth_date(date(2025, 6, 1), &gestation);
        // 280 - 227 = 53 days.
        assert_eq!(shifted, date(2025, 6, 1) + Duration::days(53));
    }
}
