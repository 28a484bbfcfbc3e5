//! Seam to the external growth-reference engine.
//!
//! The statistical centile/SDS machinery is not part of this crate; it is an
//! external collaborator reached through [`GrowthReference`]. Implementations
//! must be side-effect-free and safe to call repeatedly with identical
//! arguments. Failures are surfaced as [`ReferenceError`] and every call site
//! in the core catches them, degrading the affected block instead of failing
//! the whole request.

use chrono::NaiveDate;

use crate::types::{ChartReference, Gestation, MeasurementMethod, Sex};

/// One centile/SDS lookup request.
#[derive(Clone, Copy, Debug)]
pub struct MeasurementParams {
    pub sex: Sex,
    pub birth_date: NaiveDate,
    pub observation_date: NaiveDate,
    pub method: MeasurementMethod,
    pub observation_value: f64,
    pub reference: ChartReference,
    pub gestation: Option<Gestation>,
}

/// Centile and SDS as returned by the reference engine. Either may be absent
/// when the observation falls outside the reference's modelled range.
#[derive(Clone, Copy, Debug, Default)]
pub struct CalculatedValues {
    pub corrected_centile: Option<f64>,
    pub corrected_sds: Option<f64>,
}

/// Mid-parental height estimate with its SDS band.
#[derive(Clone, Copy, Debug)]
pub struct MidParentalEstimate {
    pub height_cm: f64,
    pub sds: f64,
    pub lower_limit_sds: f64,
    pub upper_limit_sds: f64,
}

#[derive(Debug, thiserror::Error)]
pub enum ReferenceError {
    #[error("growth reference '{0}' is not supported")]
    UnsupportedReference(String),
    #[error("observation outside the reference range: {0}")]
    OutOfRange(String),
    #[error("growth reference failure: {0}")]
    Internal(String),
}

/// The growth-reference collaborator contract.
pub trait GrowthReference: Send + Sync {
    /// Centile and SDS for one observation.
    fn calculated_values(
        &self,
        params: &MeasurementParams,
    ) -> Result<CalculatedValues, ReferenceError>;

    /// Mid-parental height, its SDS, and the ±limit SDS band.
    fn mid_parental_height(
        &self,
        maternal_height: f64,
        paternal_height: f64,
        sex: Sex,
    ) -> Result<MidParentalEstimate, ReferenceError>;

    /// The measurement magnitude at a requested SDS, for a given age and sex.
    fn measurement_from_sds(
        &self,
        reference: ChartReference,
        requested_sds: f64,
        method: MeasurementMethod,
        sex: Sex,
        age_years: f64,
    ) -> Result<f64, ReferenceError>;

    /// BMI expressed as a percentage of the reference median at this age.
    fn percentage_median_bmi(
        &self,
        reference: ChartReference,
        age_years: f64,
        bmi: f64,
        sex: Sex,
    ) -> Result<f64, ReferenceError>;

    /// Whether this engine carries data for the given chart reference.
    fn supports(&self, reference: ChartReference) -> bool;
}
