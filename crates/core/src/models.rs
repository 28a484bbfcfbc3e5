//! Wire models for the calculate endpoint.
//!
//! The inbound request is deliberately loose: dates are strings and numeric
//! fields are raw JSON values, so the validator owns every rejection and the
//! API reports domain error kinds instead of serde messages. Numeric strings
//! (as posted by form front ends) coerce; booleans, arrays and objects do
//! not. The outbound result is strictly typed and immutable once built.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::age::CalendarAge;
use crate::error::GrowthError;
use crate::metrics::{GhDose, HeightVelocity};
use crate::types::BsaMethod;

/// Raw calculate request as posted by the client.
#[derive(Clone, Debug, Default, Deserialize, ToSchema)]
pub struct CalculateRequest {
    #[schema(example = "male")]
    pub sex: Option<String>,
    #[schema(example = "2020-01-01")]
    pub birth_date: Option<String>,
    #[schema(example = "2026-01-18")]
    pub measurement_date: Option<String>,
    /// Growth reference id; defaults to `uk-who`.
    pub reference: Option<String>,
    /// Weight in kg (number or numeric string).
    #[schema(value_type = Option<f64>)]
    pub weight: Option<Value>,
    /// Height in cm (number or numeric string).
    #[schema(value_type = Option<f64>)]
    pub height: Option<Value>,
    /// Head circumference in cm (number or numeric string).
    #[schema(value_type = Option<f64>)]
    pub ofc: Option<Value>,
    #[schema(value_type = Option<u32>)]
    pub gestation_weeks: Option<Value>,
    #[schema(value_type = Option<u32>)]
    pub gestation_days: Option<Value>,
    #[serde(default)]
    pub previous_measurements: Vec<PreviousMeasurementInput>,
    #[schema(value_type = Option<f64>)]
    pub maternal_height: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub paternal_height: Option<Value>,
    #[serde(default)]
    pub bone_age_assessments: Vec<BoneAgeAssessmentInput>,
}

/// One dated prior measurement set, used for height velocity and the
/// previous-height block.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct PreviousMeasurementInput {
    pub date: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub height: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub weight: Option<Value>,
    #[schema(value_type = Option<f64>)]
    pub ofc: Option<Value>,
}

/// One radiographic bone-age assessment.
#[derive(Clone, Debug, Deserialize, ToSchema)]
pub struct BoneAgeAssessmentInput {
    pub date: Option<String>,
    /// Bone age in decimal years.
    #[schema(value_type = Option<f64>)]
    pub bone_age: Option<Value>,
    /// Scoring standard: `tw3` (default) or `greulich-pyle`.
    pub standard: Option<String>,
}

/// A measurement with its centile and SDS against the chosen reference.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct MeasurementResult {
    pub value: f64,
    pub centile: Option<f64>,
    pub sds: Option<f64>,
}

/// The BMI block additionally carries percentage-of-median for malnutrition
/// banding (informational only).
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct BmiResult {
    pub value: f64,
    pub centile: Option<f64>,
    pub sds: Option<f64>,
    pub percentage_median: Option<f64>,
}

/// A measurement re-resolved against the gestation-corrected age.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct CorrectedMeasurementResult {
    /// Corrected decimal age the lookup was made at.
    pub age: f64,
    pub value: f64,
    pub centile: Option<f64>,
    pub sds: Option<f64>,
}

/// Mid-parental height with its centile and target range at age 18.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct MidParentalHeightResult {
    pub mid_parental_height: f64,
    pub mid_parental_height_sds: f64,
    pub mid_parental_height_centile: f64,
    pub target_range_lower: f64,
    pub target_range_upper: f64,
}

/// Height centile/SDS re-read at the bone age instead of the calendar age.
#[derive(Clone, Debug, PartialEq, Serialize, ToSchema)]
pub struct BoneAgeResult {
    #[schema(value_type = String, example = "2026-01-10")]
    pub assessment_date: NaiveDate,
    pub bone_age: f64,
    pub standard: &'static str,
    pub height_centile: Option<f64>,
    pub height_sds: Option<f64>,
}

/// The aggregate calculation result. Built once per request; blocks whose
/// prerequisite inputs were absent are `None`.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct GrowthResults {
    pub age_years: f64,
    pub age_calendar: CalendarAge,
    pub gestation_correction_applied: bool,
    pub corrected_age_years: Option<f64>,
    pub corrected_age_calendar: Option<CalendarAge>,
    pub weight: Option<MeasurementResult>,
    pub height: Option<MeasurementResult>,
    pub bmi: Option<BmiResult>,
    pub ofc: Option<MeasurementResult>,
    pub weight_corrected: Option<CorrectedMeasurementResult>,
    pub height_corrected: Option<CorrectedMeasurementResult>,
    pub bmi_corrected: Option<CorrectedMeasurementResult>,
    pub ofc_corrected: Option<CorrectedMeasurementResult>,
    pub height_velocity: Option<HeightVelocity>,
    pub previous_height: Option<MeasurementResult>,
    pub bsa: Option<f64>,
    pub bsa_method: Option<BsaMethod>,
    pub gh_dose: Option<GhDose>,
    pub mid_parental_height: Option<MidParentalHeightResult>,
    pub bone_age_height: Option<MeasurementResult>,
    pub bone_age_assessments: Option<Vec<BoneAgeResult>>,
    pub validation_messages: Vec<String>,
}

/// Response envelope: `success` plus either `results` or `error`/`error_code`.
#[derive(Clone, Debug, Serialize, ToSchema)]
pub struct CalculateResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<GrowthResults>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<String>,
}

impl CalculateResponse {
    pub fn success(results: GrowthResults) -> Self {
        Self {
            success: true,
            results: Some(results),
            error: None,
            error_code: None,
        }
    }

    pub fn failure(error: &GrowthError) -> Self {
        Self {
            success: false,
            results: None,
            error: Some(error.to_string()),
            error_code: Some(error.code().to_string()),
        }
    }
}
