//! Bundled growth-reference engine.
//!
//! A self-contained stand-in for a full LMS reference dataset: each
//! sex/method curve is a piecewise-linear table of (age, mean, SD) points and
//! observations are scored with a plain normal approximation,
//! `z = (value - mean) / sd`. The shape of the real UK-WHO curves is
//! respected closely enough for clinically plausible inputs to land on
//! plausible centiles; it is not a substitute for the published dataset.
//!
//! Turner-syndrome and trisomy-21 charts are served from the same tables
//! with a height-mean scaling factor, so the three chart ids stay
//! distinguishable without tripling the data.

use growthcalc_core::age::age_between;
use growthcalc_core::reference::{
    CalculatedValues, GrowthReference, MeasurementParams, MidParentalEstimate, ReferenceError,
};
use growthcalc_core::stats::norm_cdf;
use growthcalc_core::types::{ChartReference, MeasurementMethod, Sex};

/// One point on a reference curve: decimal age, mean, SD.
type AgePoint = (f64, f64, f64);

const MALE_HEIGHT: &[AgePoint] = &[
    (0.0, 50.0, 2.0),
    (1.0, 76.0, 3.0),
    (2.0, 87.0, 3.5),
    (4.0, 103.0, 4.3),
    (6.0, 116.0, 5.0),
    (8.0, 128.0, 5.5),
    (10.0, 138.0, 6.0),
    (12.0, 149.0, 7.0),
    (14.0, 163.0, 8.0),
    (16.0, 173.0, 7.5),
    (18.0, 176.5, 6.8),
    (20.0, 177.0, 6.8),
];

const FEMALE_HEIGHT: &[AgePoint] = &[
    (0.0, 49.5, 2.0),
    (1.0, 74.5, 2.9),
    (2.0, 85.5, 3.4),
    (4.0, 102.0, 4.3),
    (6.0, 115.0, 5.0),
    (8.0, 127.0, 5.6),
    (10.0, 138.0, 6.3),
    (12.0, 151.0, 7.0),
    (14.0, 160.0, 6.5),
    (16.0, 162.5, 6.2),
    (18.0, 163.5, 6.0),
    (20.0, 163.5, 6.0),
];

const MALE_WEIGHT: &[AgePoint] = &[
    (0.0, 3.5, 0.5),
    (1.0, 9.6, 1.1),
    (2.0, 12.2, 1.4),
    (4.0, 16.3, 2.0),
    (6.0, 20.5, 2.7),
    (8.0, 25.4, 3.8),
    (10.0, 31.9, 5.3),
    (12.0, 39.8, 7.0),
    (14.0, 50.8, 8.8),
    (16.0, 60.8, 9.5),
    (18.0, 66.9, 10.0),
    (20.0, 70.0, 10.5),
];

const FEMALE_WEIGHT: &[AgePoint] = &[
    (0.0, 3.4, 0.5),
    (1.0, 8.9, 1.0),
    (2.0, 11.5, 1.3),
    (4.0, 15.9, 2.0),
    (6.0, 20.2, 2.8),
    (8.0, 25.2, 4.0),
    (10.0, 31.9, 5.7),
    (12.0, 40.7, 7.5),
    (14.0, 49.2, 8.2),
    (16.0, 54.0, 8.5),
    (18.0, 57.0, 9.0),
    (20.0, 58.0, 9.0),
];

const MALE_BMI: &[AgePoint] = &[
    (0.0, 13.4, 1.2),
    (1.0, 16.7, 1.3),
    (2.0, 16.2, 1.3),
    (4.0, 15.7, 1.3),
    (6.0, 15.6, 1.6),
    (8.0, 16.1, 2.0),
    (10.0, 17.1, 2.5),
    (12.0, 18.5, 2.9),
    (14.0, 20.0, 3.1),
    (16.0, 21.5, 3.2),
    (18.0, 22.5, 3.3),
    (20.0, 23.0, 3.4),
];

const FEMALE_BMI: &[AgePoint] = &[
    (0.0, 13.2, 1.2),
    (1.0, 16.2, 1.3),
    (2.0, 15.9, 1.3),
    (4.0, 15.5, 1.4),
    (6.0, 15.5, 1.7),
    (8.0, 16.2, 2.2),
    (10.0, 17.4, 2.7),
    (12.0, 19.0, 3.1),
    (14.0, 20.5, 3.2),
    (16.0, 21.5, 3.3),
    (18.0, 22.0, 3.4),
    (20.0, 22.5, 3.4),
];

const MALE_OFC: &[AgePoint] = &[
    (0.0, 35.0, 1.2),
    (0.25, 40.5, 1.2),
    (0.5, 43.5, 1.2),
    (1.0, 46.3, 1.3),
    (2.0, 48.7, 1.4),
    (4.0, 50.4, 1.4),
    (6.0, 51.5, 1.4),
    (10.0, 52.5, 1.4),
    (14.0, 54.5, 1.5),
    (18.0, 55.5, 1.5),
];

const FEMALE_OFC: &[AgePoint] = &[
    (0.0, 34.5, 1.2),
    (0.25, 39.5, 1.2),
    (0.5, 42.2, 1.2),
    (1.0, 45.0, 1.3),
    (2.0, 47.5, 1.4),
    (4.0, 49.3, 1.4),
    (6.0, 50.5, 1.4),
    (10.0, 51.5, 1.4),
    (14.0, 53.5, 1.5),
    (18.0, 54.5, 1.5),
];

/// Adult height distribution at the fixed mid-parental age.
const ADULT_AGE: f64 = 18.0;
/// Tanner parental adjustment in cm.
const PARENTAL_ADJUSTMENT_CM: f64 = 6.5;
/// Half-width of the mid-parental target range in SDS.
const TARGET_RANGE_SDS: f64 = 1.5;

/// The bundled reference engine. Stateless; one instance serves every
/// request.
#[derive(Clone, Copy, Debug, Default)]
pub struct BundledReference;

impl BundledReference {
    pub fn new() -> Self {
        Self
    }

    fn table(sex: Sex, method: MeasurementMethod) -> &'static [AgePoint] {
        match (sex, method) {
            (Sex::Male, MeasurementMethod::Height) => MALE_HEIGHT,
            (Sex::Female, MeasurementMethod::Height) => FEMALE_HEIGHT,
            (Sex::Male, MeasurementMethod::Weight) => MALE_WEIGHT,
            (Sex::Female, MeasurementMethod::Weight) => FEMALE_WEIGHT,
            (Sex::Male, MeasurementMethod::Bmi) => MALE_BMI,
            (Sex::Female, MeasurementMethod::Bmi) => FEMALE_BMI,
            (Sex::Male, MeasurementMethod::Ofc) => MALE_OFC,
            (Sex::Female, MeasurementMethod::Ofc) => FEMALE_OFC,
        }
    }

    /// Scaling applied to the height mean for the syndrome-specific charts.
    fn height_scale(reference: ChartReference) -> f64 {
        match reference {
            ChartReference::UkWho => 1.0,
            ChartReference::TurnersSyndrome => 0.93,
            ChartReference::Trisomy21 => 0.95,
        }
    }

    /// Mean and SD at an age, linearly interpolated, clamped to the table
    /// ends.
    fn curve_at(
        reference: ChartReference,
        sex: Sex,
        method: MeasurementMethod,
        age_years: f64,
    ) -> Result<(f64, f64), ReferenceError> {
        if !age_years.is_finite() || age_years < 0.0 {
            return Err(ReferenceError::OutOfRange(format!(
                "cannot score a {} observation at age {age_years}",
                method.to_wire()
            )));
        }

        let table = Self::table(sex, method);
        let scale = if method == MeasurementMethod::Height {
            Self::height_scale(reference)
        } else {
            1.0
        };

        let (first, last) = (table[0], table[table.len() - 1]);
        if age_years <= first.0 {
            return Ok((first.1 * scale, first.2));
        }
        if age_years >= last.0 {
            return Ok((last.1 * scale, last.2));
        }
        for window in table.windows(2) {
            let (a0, mean0, sd0) = window[0];
            let (a1, mean1, sd1) = window[1];
            if age_years <= a1 {
                let t = (age_years - a0) / (a1 - a0);
                return Ok(((mean0 + t * (mean1 - mean0)) * scale, sd0 + t * (sd1 - sd0)));
            }
        }
        unreachable!("age within table bounds always falls in a window");
    }

    fn adult_distribution(sex: Sex) -> (f64, f64) {
        let table = Self::table(sex, MeasurementMethod::Height);
        // ADULT_AGE is a table point, so this is an exact lookup.
        let point = table
            .iter()
            .find(|(age, _, _)| *age == ADULT_AGE)
            .expect("adult age present in height tables");
        (point.1, point.2)
    }
}

impl GrowthReference for BundledReference {
    fn calculated_values(
        &self,
        params: &MeasurementParams,
    ) -> Result<CalculatedValues, ReferenceError> {
        let age = age_between(params.birth_date, params.observation_date);
        let (mean, sd) = Self::curve_at(
            params.reference,
            params.sex,
            params.method,
            age.decimal_years,
        )?;
        let sds = (params.observation_value - mean) / sd;
        Ok(CalculatedValues {
            corrected_centile: Some(norm_cdf(sds) * 100.0),
            corrected_sds: Some(sds),
        })
    }

    fn mid_parental_height(
        &self,
        maternal_height: f64,
        paternal_height: f64,
        sex: Sex,
    ) -> Result<MidParentalEstimate, ReferenceError> {
        let midpoint = (maternal_height + paternal_height) / 2.0;
        let height_cm = match sex {
            Sex::Male => midpoint + PARENTAL_ADJUSTMENT_CM,
            Sex::Female => midpoint - PARENTAL_ADJUSTMENT_CM,
        };
        // Deriving the SDS from the estimate itself keeps the estimate and
        // its target range on one monotonic scale.
        let (mean, sd) = Self::adult_distribution(sex);
        let sds = (height_cm - mean) / sd;
        Ok(MidParentalEstimate {
            height_cm,
            sds,
            lower_limit_sds: sds - TARGET_RANGE_SDS,
            upper_limit_sds: sds + TARGET_RANGE_SDS,
        })
    }

    fn measurement_from_sds(
        &self,
        reference: ChartReference,
        requested_sds: f64,
        method: MeasurementMethod,
        sex: Sex,
        age_years: f64,
    ) -> Result<f64, ReferenceError> {
        let (mean, sd) = Self::curve_at(reference, sex, method, age_years)?;
        Ok(mean + requested_sds * sd)
    }

    fn percentage_median_bmi(
        &self,
        reference: ChartReference,
        age_years: f64,
        bmi: f64,
        sex: Sex,
    ) -> Result<f64, ReferenceError> {
        let (median, _) = Self::curve_at(reference, sex, MeasurementMethod::Bmi, age_years)?;
        Ok(bmi / median * 100.0)
    }

    fn supports(&self, _reference: ChartReference) -> bool {
        true
    }
}
