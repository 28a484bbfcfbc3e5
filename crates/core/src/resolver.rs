//! Measurement resolution against the growth-reference collaborator.
//!
//! One uniform path for every measurement method; chronological, corrected,
//! historical and bone-age lookups all come through here. Collaborator
//! failures degrade the individual lookup to `None` with a diagnostic.

use chrono::{Duration, NaiveDate};

use crate::constants::{BONE_AGE_WINDOW_DAYS, DAYS_PER_YEAR};
use crate::reference::{GrowthReference, MeasurementParams};
use crate::stats::round_dp;

/// A resolved centile/SDS pair. `sds_raw` keeps full precision for the
/// safety gate; the rounded forms are what the result reports.
#[derive(Clone, Copy, Debug)]
pub struct Resolved {
    pub centile: Option<f64>,
    pub sds: Option<f64>,
    pub sds_raw: Option<f64>,
}

/// Resolve one observation. Returns `None` when the collaborator fails.
pub fn resolve_observation(
    reference: &dyn GrowthReference,
    params: &MeasurementParams,
) -> Option<Resolved> {
    match reference.calculated_values(params) {
        Ok(calculated) => Some(Resolved {
            centile: calculated.corrected_centile.map(|c| round_dp(c, 2)),
            sds: calculated.corrected_sds.map(|s| round_dp(s, 2)),
            sds_raw: calculated.corrected_sds,
        }),
        Err(error) => {
            tracing::warn!(
                method = params.method.to_wire(),
                %error,
                "growth reference lookup failed; dropping block"
            );
            None
        }
    }
}

/// Whether a bone-age assessment is close enough to the measurement date to
/// be plotted (±1 month).
pub fn bone_age_within_window(assessment_date: NaiveDate, measurement_date: NaiveDate) -> bool {
    let gap_days = (measurement_date - assessment_date).num_days().abs();
    gap_days as f64 <= BONE_AGE_WINDOW_DAYS
}

/// Birth date placed so the child's age at the measurement date equals the
/// bone age. This synthetic date feeds a throwaway lookup only; the real
/// birth date is never altered.
pub fn synthetic_birth_date(measurement_date: NaiveDate, bone_age_years: f64) -> NaiveDate {
    let offset_days = (bone_age_years * DAYS_PER_YEAR).round() as i64;
    measurement_date - Duration::days(offset_days)
}
