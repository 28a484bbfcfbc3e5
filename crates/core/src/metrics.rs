//! Derived-metric calculators.
//!
//! Independent, stateless functions: body-surface-area (Boyd and cBNF),
//! growth-hormone dosing, and height velocity. None of these touch the
//! growth-reference collaborator.

use chrono::NaiveDate;
use serde::Serialize;

use crate::constants::{
    DAYS_PER_MONTH, DAYS_PER_YEAR, GH_DOSE_STANDARD, MIN_VELOCITY_INTERVAL_DAYS, WEIGHT_TO_GRAMS,
};
use crate::stats::round_dp;
use crate::types::BsaMethod;

/// cBNF weight-to-BSA lookup table (kg, m²).
///
/// From the British National Formulary for Children, adapted from Sharkey I
/// et al., British Journal of Cancer 2001; 85 (1): 23–28. Values were
/// generated with the Boyd equation.
const CBNF_TABLE: &[(f64, f64)] = &[
    (1.0, 0.10),
    (1.5, 0.13),
    (2.0, 0.16),
    (2.5, 0.19),
    (3.0, 0.21),
    (3.5, 0.24),
    (4.0, 0.26),
    (4.5, 0.28),
    (5.0, 0.30),
    (5.5, 0.32),
    (6.0, 0.34),
    (6.5, 0.36),
    (7.0, 0.38),
    (7.5, 0.40),
    (8.0, 0.42),
    (8.5, 0.44),
    (9.0, 0.46),
    (9.5, 0.47),
    (10.0, 0.49),
    (11.0, 0.53),
    (12.0, 0.56),
    (13.0, 0.59),
    (14.0, 0.62),
    (15.0, 0.65),
    (16.0, 0.68),
    (17.0, 0.71),
    (18.0, 0.74),
    (19.0, 0.77),
    (20.0, 0.79),
    (21.0, 0.82),
    (22.0, 0.85),
    (23.0, 0.87),
    (24.0, 0.90),
    (25.0, 0.92),
    (26.0, 0.95),
    (27.0, 0.97),
    (28.0, 1.0),
    (29.0, 1.0),
    (30.0, 1.1),
    (31.0, 1.1),
    (32.0, 1.1),
    (33.0, 1.1),
    (34.0, 1.1),
    (35.0, 1.2),
    (36.0, 1.2),
    (37.0, 1.2),
    (38.0, 1.2),
    (39.0, 1.3),
    (40.0, 1.3),
    (41.0, 1.3),
    (42.0, 1.3),
    (43.0, 1.3),
    (44.0, 1.4),
    (45.0, 1.4),
    (46.0, 1.4),
    (47.0, 1.4),
    (48.0, 1.4),
    (49.0, 1.5),
    (50.0, 1.5),
    (51.0, 1.5),
    (52.0, 1.5),
    (53.0, 1.5),
    (54.0, 1.6),
    (55.0, 1.6),
    (56.0, 1.6),
    (57.0, 1.6),
    (58.0, 1.6),
    (59.0, 1.7),
    (60.0, 1.7),
    (61.0, 1.7),
    (62.0, 1.7),
    (63.0, 1.7),
    (64.0, 1.7),
    (65.0, 1.8),
    (66.0, 1.8),
    (67.0, 1.8),
    (68.0, 1.8),
    (69.0, 1.8),
    (70.0, 1.9),
    (71.0, 1.9),
    (72.0, 1.9),
    (73.0, 1.9),
    (74.0, 1.9),
    (75.0, 1.9),
    (76.0, 2.0),
    (77.0, 2.0),
    (78.0, 2.0),
    (79.0, 2.0),
    (80.0, 2.0),
    (81.0, 2.0),
    (82.0, 2.1),
    (83.0, 2.1),
    (84.0, 2.1),
    (85.0, 2.1),
    (86.0, 2.1),
    (87.0, 2.1),
    (88.0, 2.2),
    (89.0, 2.2),
    (90.0, 2.2),
];

/// Body surface area by the Boyd formula, rounded to 2 dp.
///
/// `BSA = 0.0003207 · height_cm^0.3 · weight_g^(0.7285 − 0.0188·log10(weight_g))`
pub fn boyd_bsa(weight_kg: f64, height_cm: f64) -> Option<f64> {
    if weight_kg <= 0.0 || height_cm <= 0.0 {
        return None;
    }

    let weight_g = weight_kg * WEIGHT_TO_GRAMS;
    let exponent = 0.7285 - 0.0188 * weight_g.log10();
    let bsa = 0.0003207 * height_cm.powf(0.3) * weight_g.powf(exponent);
    Some(round_dp(bsa, 2))
}

/// Body surface area from weight alone via the cBNF lookup table, rounded to
/// 2 dp. Non-tabulated weights interpolate linearly between the bracketing
/// rows; weights outside 1–90 kg extrapolate from the nearest two rows.
pub fn cbnf_bsa(weight_kg: f64) -> Option<f64> {
    if weight_kg <= 0.0 {
        return None;
    }

    if let Some(&(_, bsa)) = CBNF_TABLE.iter().find(|(w, _)| *w == weight_kg) {
        return Some(bsa);
    }

    let first = CBNF_TABLE[0];
    let last = CBNF_TABLE[CBNF_TABLE.len() - 1];

    let bsa = if weight_kg < first.0 {
        let (w1, b1) = first;
        let (w2, b2) = CBNF_TABLE[1];
        b1 + (b2 - b1) / (w2 - w1) * (weight_kg - w1)
    } else if weight_kg > last.0 {
        let (w1, b1) = CBNF_TABLE[CBNF_TABLE.len() - 2];
        let (w2, b2) = last;
        b2 + (b2 - b1) / (w2 - w1) * (weight_kg - w2)
    } else {
        let index = CBNF_TABLE
            .windows(2)
            .position(|pair| pair[0].0 < weight_kg && weight_kg < pair[1].0)
            .expect("weight brackets a table row");
        let (w1, b1) = CBNF_TABLE[index];
        let (w2, b2) = CBNF_TABLE[index + 1];
        b1 + (b2 - b1) / (w2 - w1) * (weight_kg - w1)
    };

    Some(round_dp(bsa, 2))
}

/// BSA method policy: Boyd when weight and height are both present, cBNF when
/// only weight is, otherwise no BSA is reported.
pub fn select_bsa(weight_kg: Option<f64>, height_cm: Option<f64>) -> Option<(f64, BsaMethod)> {
    match (weight_kg, height_cm) {
        (Some(weight), Some(height)) => boyd_bsa(weight, height).map(|bsa| (bsa, BsaMethod::Boyd)),
        (Some(weight), None) => cbnf_bsa(weight).map(|bsa| (bsa, BsaMethod::Cbnf)),
        _ => None,
    }
}

/// Growth hormone dose for the standard 7 mg/m²/week rate.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct GhDose {
    pub mg_per_day: f64,
    pub mg_m2_week: f64,
    pub mcg_kg_day: f64,
}

/// The daily dose is rounded to the nearest 0.1 mg first; the weekly rate and
/// per-kilogram rate are then back-computed from the rounded dose, so they
/// report the real-world deviation from the nominal 7 mg/m²/week.
pub fn gh_dose(bsa: Option<f64>, weight_kg: Option<f64>) -> Option<GhDose> {
    let bsa = bsa.filter(|b| *b > 0.0)?;
    let weight_kg = weight_kg.filter(|w| *w > 0.0)?;

    let mg_per_day = round_dp(GH_DOSE_STANDARD * bsa / f64::from(crate::constants::DAYS_PER_WEEK), 1);
    let mg_m2_week = mg_per_day * f64::from(crate::constants::DAYS_PER_WEEK) / bsa;
    let mcg_kg_day = mg_per_day * WEIGHT_TO_GRAMS / weight_kg;

    Some(GhDose {
        mg_per_day,
        mg_m2_week: round_dp(mg_m2_week, 1),
        mcg_kg_day: round_dp(mcg_kg_day, 1),
    })
}

/// A height velocity, or the reason one could not be computed.
#[derive(Clone, Debug, PartialEq, Serialize, utoipa::ToSchema)]
pub struct HeightVelocity {
    pub value: Option<f64>,
    pub message: Option<String>,
}

/// Annualized height velocity between two dated heights, in cm/year.
///
/// Intervals under ~4 months (122 days) are rejected with a message; so are
/// non-positive intervals.
pub fn height_velocity(
    current_height: f64,
    previous_height: f64,
    current_date: NaiveDate,
    previous_date: NaiveDate,
) -> HeightVelocity {
    let time_diff_days = (current_date - previous_date).num_days();

    if time_diff_days <= 0 {
        return HeightVelocity {
            value: None,
            message: Some(
                "Previous measurement date must be before current measurement date".into(),
            ),
        };
    }

    if time_diff_days < MIN_VELOCITY_INTERVAL_DAYS {
        let months = round_dp(time_diff_days as f64 / DAYS_PER_MONTH, 1);
        return HeightVelocity {
            value: None,
            message: Some(format!(
                "Height velocity requires at least 4 months between measurements (current interval: {months} months)"
            )),
        };
    }

    let velocity = (current_height - previous_height) / time_diff_days as f64 * DAYS_PER_YEAR;
    HeightVelocity {
        value: Some(round_dp(velocity, 1)),
        message: None,
    }
}

/// Pick a baseline from dated previous heights and compute the velocity.
///
/// Any entry postdating the current measurement produces the ordering error.
/// Otherwise the most recent entry whose interval reaches 122 days wins; if
/// none does, the most recent entry is used so the insufficient-interval
/// message reports its gap. Returns `None` when there is no previous height.
pub fn velocity_from_history(
    current_height: f64,
    current_date: NaiveDate,
    history: &[(NaiveDate, f64)],
) -> Option<HeightVelocity> {
    if history.is_empty() {
        return None;
    }

    if let Some(&(date, height)) = history.iter().find(|(date, _)| *date >= current_date) {
        return Some(height_velocity(current_height, height, current_date, date));
    }

    let qualifying = history
        .iter()
        .filter(|(date, _)| (current_date - *date).num_days() >= MIN_VELOCITY_INTERVAL_DAYS)
        .max_by_key(|(date, _)| *date);

    let &(date, height) = match qualifying {
        Some(entry) => entry,
        None => history.iter().max_by_key(|(date, _)| *date)?,
    };

    Some(height_velocity(current_height, height, current_date, date))
}
