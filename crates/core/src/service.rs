//! Request orchestration: validation, derived metrics, measurement
//! resolution and result aggregation.
//!
//! A request moves through validate → compute → gate in one synchronous
//! chain. Nothing here holds state across requests; the service owns only
//! the collaborator handle and startup configuration.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::age::{age_between, corrected_age, corrected_birth_date, should_apply_gestation_correction, Age};
use crate::config::CoreConfig;
use crate::constants::MPH_ADULT_AGE;
use crate::error::{GrowthError, GrowthResult};
use crate::gate::check_sds;
use crate::metrics::{gh_dose, select_bsa, velocity_from_history, GhDose, HeightVelocity};
use crate::models::{
    BmiResult, BoneAgeResult, CalculateRequest, CorrectedMeasurementResult, GrowthResults,
    MeasurementResult, MidParentalHeightResult,
};
use crate::reference::{GrowthReference, MeasurementParams};
use crate::resolver::{bone_age_within_window, resolve_observation, synthetic_birth_date, Resolved};
use crate::stats::{norm_cdf, round_dp};
use crate::types::{BoneAgeStandard, ChartReference, Gestation, MeasurementMethod, Sex};
use crate::validation::{
    validate_at_least_one_measurement, validate_date, validate_date_order, validate_gestation,
    validate_observation, validate_sex,
};

/// The calculation service. Cheap to clone; holds the growth-reference
/// collaborator and startup configuration only.
#[derive(Clone)]
pub struct GrowthService {
    reference: Arc<dyn GrowthReference>,
    config: CoreConfig,
}

/// Fully validated and typed request, produced by the validator before any
/// calculation runs.
struct ValidatedRequest {
    sex: Sex,
    birth_date: NaiveDate,
    measurement_date: NaiveDate,
    reference: ChartReference,
    weight: Option<f64>,
    height: Option<f64>,
    ofc: Option<f64>,
    gestation: Option<Gestation>,
    previous: Vec<PreviousEntry>,
    maternal_height: Option<f64>,
    paternal_height: Option<f64>,
    bone_age: Vec<BoneAgeEntry>,
}

struct PreviousEntry {
    date: NaiveDate,
    height: Option<f64>,
}

struct BoneAgeEntry {
    date: NaiveDate,
    bone_age: f64,
    standard: BoneAgeStandard,
}

impl GrowthService {
    pub fn new(reference: Arc<dyn GrowthReference>, config: CoreConfig) -> Self {
        Self { reference, config }
    }

    /// Run the full calculation pipeline for one request.
    pub fn calculate(&self, request: &CalculateRequest) -> GrowthResult<GrowthResults> {
        self.calculate_as_of(request, chrono::Local::now().date_naive())
    }

    /// As [`calculate`](Self::calculate), with an explicit "today" so
    /// future-date validation stays deterministic under test.
    pub fn calculate_as_of(
        &self,
        request: &CalculateRequest,
        today: NaiveDate,
    ) -> GrowthResult<GrowthResults> {
        let validated = self.validate(request, today)?;
        self.compute(&validated)
    }

    fn validate(
        &self,
        request: &CalculateRequest,
        today: NaiveDate,
    ) -> GrowthResult<ValidatedRequest> {
        let sex = validate_sex(request.sex.as_deref())?;
        let birth_date = validate_date(request.birth_date.as_deref(), "birth_date", today)?;
        let measurement_date =
            validate_date(request.measurement_date.as_deref(), "measurement_date", today)?;
        validate_date_order(
            birth_date,
            measurement_date,
            self.config.allow_same_day_measurement(),
        )?;

        let reference = match request.reference.as_deref() {
            None => ChartReference::UkWho,
            Some(raw) => ChartReference::from_wire(raw).ok_or_else(|| {
                GrowthError::InvalidInput(format!("unknown growth reference '{raw}'"))
            })?,
        };
        if !self.reference.supports(reference) {
            return Err(GrowthError::InvalidInput(format!(
                "growth reference '{}' is not supported",
                reference.to_wire()
            )));
        }

        let weight = validate_observation(MeasurementMethod::Weight, request.weight.as_ref())?;
        let height = validate_observation(MeasurementMethod::Height, request.height.as_ref())?;
        let ofc = validate_observation(MeasurementMethod::Ofc, request.ofc.as_ref())?;
        validate_at_least_one_measurement(weight, height, ofc)?;

        let gestation = validate_gestation(
            request.gestation_weeks.as_ref(),
            request.gestation_days.as_ref(),
        )?;

        let maternal_height =
            validate_observation(MeasurementMethod::Height, request.maternal_height.as_ref())?;
        let paternal_height =
            validate_observation(MeasurementMethod::Height, request.paternal_height.as_ref())?;

        let mut previous = Vec::new();
        for entry in &request.previous_measurements {
            // Entries without a date cannot anchor any calculation; skip them
            // rather than guessing.
            let Some(raw_date) = entry.date.as_deref() else {
                continue;
            };
            let date = validate_date(Some(raw_date), "previous measurement date", today)?;
            let height = validate_observation(MeasurementMethod::Height, entry.height.as_ref())?;
            validate_observation(MeasurementMethod::Weight, entry.weight.as_ref())?;
            validate_observation(MeasurementMethod::Ofc, entry.ofc.as_ref())?;
            previous.push(PreviousEntry { date, height });
        }
        previous.sort_by_key(|entry| entry.date);

        let mut bone_age = Vec::new();
        for assessment in &request.bone_age_assessments {
            let date = validate_date(
                assessment.date.as_deref(),
                "bone age assessment date",
                today,
            )?;
            let value = assessment
                .bone_age
                .as_ref()
                .and_then(|raw| match raw {
                    serde_json::Value::Number(n) => n.as_f64(),
                    serde_json::Value::String(s) => s.trim().parse::<f64>().ok(),
                    _ => None,
                })
                .filter(|v| v.is_finite() && *v > 0.0 && *v <= 25.0)
                .ok_or_else(|| {
                    GrowthError::InvalidInput(
                        "bone_age must be a number between 0 and 25 years".into(),
                    )
                })?;
            let standard = match assessment.standard.as_deref() {
                None => BoneAgeStandard::Tw3,
                Some(raw) => BoneAgeStandard::from_wire(raw).ok_or_else(|| {
                    GrowthError::InvalidInput(format!("unknown bone age standard '{raw}'"))
                })?,
            };
            bone_age.push(BoneAgeEntry {
                date,
                bone_age: value,
                standard,
            });
        }

        Ok(ValidatedRequest {
            sex,
            birth_date,
            measurement_date,
            reference,
            weight,
            height,
            ofc,
            gestation,
            previous,
            maternal_height,
            paternal_height,
            bone_age,
        })
    }

    fn compute(&self, v: &ValidatedRequest) -> GrowthResult<GrowthResults> {
        let age = age_between(v.birth_date, v.measurement_date);

        let correction_applies =
            should_apply_gestation_correction(v.gestation.as_ref(), age.decimal_years);
        let corrected: Option<Age> = if correction_applies {
            let gestation = v.gestation.as_ref().expect("gestation present when correcting");
            Some(corrected_age(v.birth_date, v.measurement_date, gestation))
        } else {
            None
        };

        let bmi_value = match (v.weight, v.height) {
            (Some(weight), Some(height)) => Some(weight / (height / 100.0).powi(2)),
            _ => None,
        };

        let mut warnings = Vec::new();

        // Chronological blocks, gated per measurement type. The first hard
        // SDS violation rejects the whole request.
        let weight = self.gated_block(v, MeasurementMethod::Weight, v.weight, &mut warnings)?;
        let height = self.gated_block(v, MeasurementMethod::Height, v.height, &mut warnings)?;
        let bmi = match bmi_value {
            Some(value) => {
                let resolved =
                    self.resolve_gated(v, MeasurementMethod::Bmi, value, v.birth_date, &mut warnings)?;
                let percentage_median = self.percentage_median(v, age.decimal_years, value);
                Some(BmiResult {
                    value: round_dp(value, 1),
                    centile: resolved.as_ref().and_then(|r| r.centile),
                    sds: resolved.as_ref().and_then(|r| r.sds),
                    percentage_median,
                })
            }
            None => None,
        };
        let ofc = self.gated_block(v, MeasurementMethod::Ofc, v.ofc, &mut warnings)?;

        // Parallel corrected-age blocks; reported alongside, never instead.
        let (weight_corrected, height_corrected, bmi_corrected, ofc_corrected) = match &corrected {
            Some(corrected_age) => {
                let gestation = v.gestation.as_ref().expect("gestation present when correcting");
                let shifted_birth = corrected_birth_date(v.birth_date, gestation);
                (
                    self.corrected_block(v, MeasurementMethod::Weight, v.weight, shifted_birth, corrected_age),
                    self.corrected_block(v, MeasurementMethod::Height, v.height, shifted_birth, corrected_age),
                    self.corrected_block(
                        v,
                        MeasurementMethod::Bmi,
                        bmi_value,
                        shifted_birth,
                        corrected_age,
                    ),
                    self.corrected_block(v, MeasurementMethod::Ofc, v.ofc, shifted_birth, corrected_age),
                )
            }
            None => (None, None, None, None),
        };

        // Height velocity and the previous-height block.
        let history: Vec<(NaiveDate, f64)> = v
            .previous
            .iter()
            .filter_map(|entry| entry.height.map(|height| (entry.date, height)))
            .collect();
        let height_velocity: Option<HeightVelocity> = match (v.height, history.is_empty()) {
            (Some(current_height), false) => {
                velocity_from_history(current_height, v.measurement_date, &history)
            }
            _ => None,
        };
        let previous_height = history.last().map(|&(date, height)| {
            let resolved = self.resolve(v, MeasurementMethod::Height, height, v.birth_date, date);
            MeasurementResult {
                value: height,
                centile: resolved.as_ref().and_then(|r| r.centile),
                sds: resolved.as_ref().and_then(|r| r.sds),
            }
        });

        let bsa_selection = select_bsa(v.weight, v.height);
        let gh_dose: Option<GhDose> = gh_dose(bsa_selection.map(|(bsa, _)| bsa), v.weight);

        let mid_parental_height = self.mid_parental_height_block(v);

        let (bone_age_height, bone_age_assessments) = self.bone_age_blocks(v);

        Ok(GrowthResults {
            age_years: round_dp(age.decimal_years, 2),
            age_calendar: age.calendar,
            gestation_correction_applied: correction_applies,
            corrected_age_years: corrected.as_ref().map(|a| round_dp(a.decimal_years, 2)),
            corrected_age_calendar: corrected.as_ref().map(|a| a.calendar),
            weight,
            height,
            bmi,
            ofc,
            weight_corrected,
            height_corrected,
            bmi_corrected,
            ofc_corrected,
            height_velocity,
            previous_height,
            bsa: bsa_selection.map(|(bsa, _)| bsa),
            bsa_method: bsa_selection.map(|(_, method)| method),
            gh_dose,
            mid_parental_height,
            bone_age_height,
            bone_age_assessments,
            validation_messages: warnings,
        })
    }

    /// Resolve one observation without gating (historical/corrected/bone-age
    /// lookups).
    fn resolve(
        &self,
        v: &ValidatedRequest,
        method: MeasurementMethod,
        value: f64,
        birth_date: NaiveDate,
        observation_date: NaiveDate,
    ) -> Option<Resolved> {
        let params = MeasurementParams {
            sex: v.sex,
            birth_date,
            observation_date,
            method,
            observation_value: value,
            reference: v.reference,
            gestation: v.gestation,
        };
        resolve_observation(self.reference.as_ref(), &params)
    }

    /// Resolve one current observation and pass its raw SDS through the
    /// safety gate.
    fn resolve_gated(
        &self,
        v: &ValidatedRequest,
        method: MeasurementMethod,
        value: f64,
        birth_date: NaiveDate,
        warnings: &mut Vec<String>,
    ) -> GrowthResult<Option<Resolved>> {
        let Some(resolved) = self.resolve(v, method, value, birth_date, v.measurement_date) else {
            return Ok(None);
        };
        if let Some(message) = check_sds(method, resolved.sds_raw)? {
            warnings.push(message);
        }
        Ok(Some(resolved))
    }

    fn gated_block(
        &self,
        v: &ValidatedRequest,
        method: MeasurementMethod,
        value: Option<f64>,
        warnings: &mut Vec<String>,
    ) -> GrowthResult<Option<MeasurementResult>> {
        let Some(value) = value else {
            return Ok(None);
        };
        let resolved = self.resolve_gated(v, method, value, v.birth_date, warnings)?;
        Ok(Some(MeasurementResult {
            value,
            centile: resolved.as_ref().and_then(|r| r.centile),
            sds: resolved.as_ref().and_then(|r| r.sds),
        }))
    }

    fn corrected_block(
        &self,
        v: &ValidatedRequest,
        method: MeasurementMethod,
        value: Option<f64>,
        shifted_birth: NaiveDate,
        corrected: &Age,
    ) -> Option<CorrectedMeasurementResult> {
        let value = value?;
        // Resolve the full-precision value; only the reported BMI is 1 dp.
        let resolved = self.resolve(v, method, value, shifted_birth, v.measurement_date);
        let reported = match method {
            MeasurementMethod::Bmi => round_dp(value, 1),
            _ => value,
        };
        Some(CorrectedMeasurementResult {
            age: round_dp(corrected.decimal_years, 2),
            value: reported,
            centile: resolved.as_ref().and_then(|r| r.centile),
            sds: resolved.as_ref().and_then(|r| r.sds),
        })
    }

    fn percentage_median(
        &self,
        v: &ValidatedRequest,
        age_years: f64,
        bmi: f64,
    ) -> Option<f64> {
        match self
            .reference
            .percentage_median_bmi(v.reference, age_years, bmi, v.sex)
        {
            Ok(percentage) => Some(round_dp(percentage, 1)),
            Err(error) => {
                tracing::warn!(%error, "percentage-median BMI lookup failed");
                None
            }
        }
    }

    fn mid_parental_height_block(&self, v: &ValidatedRequest) -> Option<MidParentalHeightResult> {
        let maternal = v.maternal_height?;
        let paternal = v.paternal_height?;

        let estimate = match self.reference.mid_parental_height(maternal, paternal, v.sex) {
            Ok(estimate) => estimate,
            Err(error) => {
                tracing::warn!(%error, "mid-parental height lookup failed");
                return None;
            }
        };

        // Target range heights are always read from uk-who at the fixed adult
        // age, whichever chart the measurements used.
        let limits = estimate_limits(self.reference.as_ref(), &estimate, v.sex);
        let (lower, upper) = match limits {
            Ok(pair) => pair,
            Err(error) => {
                tracing::warn!(%error, "mid-parental target range lookup failed");
                return None;
            }
        };

        let mph = round_dp(estimate.height_cm, 1);
        let lower = round_dp(lower, 1);
        let upper = round_dp(upper, 1);
        // A monotonic SDS-to-height mapping cannot produce anything else; an
        // inversion here is a collaborator defect, not bad user input.
        assert!(
            lower < mph && mph < upper,
            "growth reference produced an inverted mid-parental target range: {lower} / {mph} / {upper}"
        );

        Some(MidParentalHeightResult {
            mid_parental_height: mph,
            mid_parental_height_sds: round_dp(estimate.sds, 2),
            mid_parental_height_centile: round_dp(norm_cdf(estimate.sds) * 100.0, 1),
            target_range_lower: lower,
            target_range_upper: upper,
        })
    }

    fn bone_age_blocks(
        &self,
        v: &ValidatedRequest,
    ) -> (Option<MeasurementResult>, Option<Vec<BoneAgeResult>>) {
        let Some(current_height) = v.height else {
            return (None, None);
        };

        let qualifying: Vec<BoneAgeResult> = v
            .bone_age
            .iter()
            .filter(|entry| bone_age_within_window(entry.date, v.measurement_date))
            .map(|entry| {
                let synthetic = synthetic_birth_date(v.measurement_date, entry.bone_age);
                let resolved = self.resolve(
                    v,
                    MeasurementMethod::Height,
                    current_height,
                    synthetic,
                    v.measurement_date,
                );
                BoneAgeResult {
                    assessment_date: entry.date,
                    bone_age: entry.bone_age,
                    standard: entry.standard.to_wire(),
                    height_centile: resolved.as_ref().and_then(|r| r.centile),
                    height_sds: resolved.as_ref().and_then(|r| r.sds),
                }
            })
            .collect();

        if qualifying.is_empty() {
            return (None, None);
        }

        // TW3 is the plotting standard of choice when several qualify.
        let plotted = qualifying
            .iter()
            .find(|a| a.standard == BoneAgeStandard::Tw3.to_wire())
            .unwrap_or(&qualifying[0]);
        let bone_age_height = MeasurementResult {
            value: current_height,
            centile: plotted.height_centile,
            sds: plotted.height_sds,
        };

        (Some(bone_age_height), Some(qualifying))
    }
}

/// Convert the SDS band limits to centimetre heights at the fixed adult age.
fn estimate_limits(
    reference: &dyn GrowthReference,
    estimate: &crate::reference::MidParentalEstimate,
    sex: Sex,
) -> Result<(f64, f64), crate::reference::ReferenceError> {
    let lower = reference.measurement_from_sds(
        ChartReference::UkWho,
        estimate.lower_limit_sds,
        MeasurementMethod::Height,
        sex,
        MPH_ADULT_AGE,
    )?;
    let upper = reference.measurement_from_sds(
        ChartReference::UkWho,
        estimate.upper_limit_sds,
        MeasurementMethod::Height,
        sex,
        MPH_ADULT_AGE,
    )?;
    Ok((lower, upper))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{CalculatedValues, MidParentalEstimate, ReferenceError};
    use serde_json::json;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 6, 1).unwrap()
    }

    /// Collaborator stub returning a scripted SDS per measurement method.
    /// With `bmi_echo` set, BMI lookups return the observation value minus 14
    /// so tests can see exactly which value reached the collaborator.
    #[derive(Default)]
    struct StubReference {
        weight_sds: Option<f64>,
        height_sds: Option<f64>,
        bmi_sds: Option<f64>,
        ofc_sds: Option<f64>,
        bmi_echo: bool,
        fail_percentage_median: bool,
    }

    impl StubReference {
        fn sds_for(&self, method: MeasurementMethod) -> f64 {
            let scripted = match method {
                MeasurementMethod::Weight => self.weight_sds,
                MeasurementMethod::Height => self.height_sds,
                MeasurementMethod::Bmi => self.bmi_sds,
                MeasurementMethod::Ofc => self.ofc_sds,
            };
            scripted.unwrap_or(0.25)
        }
    }

    impl GrowthReference for StubReference {
        fn calculated_values(
            &self,
            params: &MeasurementParams,
        ) -> Result<CalculatedValues, ReferenceError> {
            let sds = if self.bmi_echo && params.method == MeasurementMethod::Bmi {
                params.observation_value - 14.0
            } else {
                self.sds_for(params.method)
            };
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
                Sex::Male => midpoint + 6.5,
                Sex::Female => midpoint - 6.5,
            };
            Ok(MidParentalEstimate {
                height_cm,
                sds: 0.3,
                lower_limit_sds: -1.2,
                upper_limit_sds: 1.8,
            })
        }

        fn measurement_from_sds(
            &self,
            _reference: ChartReference,
            requested_sds: f64,
            _method: MeasurementMethod,
            sex: Sex,
            _age_years: f64,
        ) -> Result<f64, ReferenceError> {
            let (mean, sd) = match sex {
                Sex::Male => (176.5, 6.8),
                Sex::Female => (163.5, 6.0),
            };
            Ok(mean + requested_sds * sd)
        }

        fn percentage_median_bmi(
            &self,
            _reference: ChartReference,
            _age_years: f64,
            _bmi: f64,
            _sex: Sex,
        ) -> Result<f64, ReferenceError> {
            if self.fail_percentage_median {
                Err(ReferenceError::Internal("scripted failure".into()))
            } else {
                Ok(98.27)
            }
        }

        fn supports(&self, _reference: ChartReference) -> bool {
            true
        }
    }

    fn service(stub: StubReference) -> GrowthService {
        GrowthService::new(Arc::new(stub), CoreConfig::default())
    }

    fn base_request() -> CalculateRequest {
        serde_json::from_value(json!({
            "sex": "male",
            "birth_date": "2020-01-01",
            "measurement_date": "2026-01-18",
            "weight": 20.0,
            "height": 115.0
        }))
        .unwrap()
    }

    #[test]
    fn test_full_result_for_plain_request() {
        let results = service(StubReference::default())
            .calculate_as_of(&base_request(), today())
            .unwrap();

        assert!((results.age_years - 6.05).abs() < 0.01);
        assert_eq!(results.age_calendar.years, 6);
        assert!(!results.gestation_correction_applied);
        assert_eq!(results.corrected_age_years, None);

        let weight = results.weight.unwrap();
        assert_eq!(weight.value, 20.0);
        assert_eq!(weight.sds, Some(0.25));
        assert!(results.height.is_some());

        let bmi = results.bmi.unwrap();
        assert!((bmi.value - 15.1).abs() < 1e-9);
        assert_eq!(bmi.percentage_median, Some(98.3));

        assert_eq!(results.ofc, None);
        assert_eq!(results.bsa_method, Some(crate::types::BsaMethod::Boyd));
        assert!(results.bsa.unwrap() > 0.0);
        assert!(results.gh_dose.is_some());
        assert!(results.height_velocity.is_none());
        assert!(results.validation_messages.is_empty());
    }

    #[test]
    fn test_missing_all_measurements_rejected() {
        let request: CalculateRequest = serde_json::from_value(json!({
            "sex": "male",
            "birth_date": "2020-01-01",
            "measurement_date": "2026-01-18"
        }))
        .unwrap();
        let err = service(StubReference::default())
            .calculate_as_of(&request, today())
            .expect_err("should reject");
        assert!(matches!(err, GrowthError::MissingMeasurement));
    }

    #[test]
    fn test_sds_hard_limit_rejects_whole_request() {
        let stub = StubReference {
            weight_sds: Some(8.01),
            ..Default::default()
        };
        let err = service(stub)
            .calculate_as_of(&base_request(), today())
            .expect_err("should reject");
        assert!(matches!(err, GrowthError::SdsOutOfRange(msg) if msg.contains("8.01")));
    }

    #[test]
    fn test_sds_below_hard_limit_warns() {
        let stub = StubReference {
            weight_sds: Some(7.99),
            ..Default::default()
        };
        let results = service(stub)
            .calculate_as_of(&base_request(), today())
            .unwrap();
        assert_eq!(results.validation_messages.len(), 1);
        assert!(results.validation_messages[0].contains("7.99"));
        assert!(results.weight.is_some());
    }

    #[test]
    fn test_sds_exactly_four_does_not_warn() {
        let stub = StubReference {
            height_sds: Some(4.0),
            ..Default::default()
        };
        let results = service(stub)
            .calculate_as_of(&base_request(), today())
            .unwrap();
        assert!(results.validation_messages.is_empty());
    }

    #[test]
    fn test_bmi_sds_between_limits_warns_not_rejects() {
        let stub = StubReference {
            bmi_sds: Some(10.0),
            ..Default::default()
        };
        let results = service(stub)
            .calculate_as_of(&base_request(), today())
            .unwrap();
        assert_eq!(results.validation_messages.len(), 1);
        assert!(results.validation_messages[0].contains("BMI"));
    }

    #[test]
    fn test_gestation_correction_produces_parallel_blocks() {
        let request: CalculateRequest = serde_json::from_value(json!({
            "sex": "male",
            "birth_date": "2025-06-01",
            "measurement_date": "2026-01-18",
            "gestation_weeks": 32,
            "gestation_days": 3,
            "weight": 8.5,
            "height": 72.0
        }))
        .unwrap();
        let results = service(StubReference::default())
            .calculate_as_of(&request, today())
            .unwrap();

        assert!(results.gestation_correction_applied);
        let corrected_age_years = results.corrected_age_years.unwrap();
        assert!(corrected_age_years < results.age_years);

        let weight_corrected = results.weight_corrected.unwrap();
        assert_eq!(weight_corrected.value, 8.5);
        assert_eq!(weight_corrected.age, corrected_age_years);
        assert!(results.height_corrected.is_some());
        assert!(results.bmi_corrected.is_some());
        // Chronological blocks are always reported too.
        assert!(results.weight.is_some());
    }

    #[test]
    fn test_corrected_bmi_resolves_unrounded_value() {
        // 15.16 kg at 100 cm derives a BMI of exactly 15.16; both the
        // chronological and the corrected lookups must see that full value,
        // with only the reported figure rounded to 1 dp.
        let stub = StubReference {
            bmi_echo: true,
            ..Default::default()
        };
        let request: CalculateRequest = serde_json::from_value(json!({
            "sex": "male",
            "birth_date": "2025-06-01",
            "measurement_date": "2026-01-18",
            "gestation_weeks": 30,
            "weight": 15.16,
            "height": 100.0
        }))
        .unwrap();
        let results = service(stub).calculate_as_of(&request, today()).unwrap();

        let bmi = results.bmi.unwrap();
        assert_eq!(bmi.value, 15.2);
        assert_eq!(bmi.sds, Some(1.16));

        let corrected = results.bmi_corrected.unwrap();
        assert_eq!(corrected.value, 15.2);
        assert_eq!(corrected.sds, Some(1.16));
    }

    #[test]
    fn test_term_gestation_never_corrects() {
        let request: CalculateRequest = serde_json::from_value(json!({
            "sex": "female",
            "birth_date": "2025-06-01",
            "measurement_date": "2026-01-18",
            "gestation_weeks": 40,
            "weight": 9.0
        }))
        .unwrap();
        let results = service(StubReference::default())
            .calculate_as_of(&request, today())
            .unwrap();
        assert!(!results.gestation_correction_applied);
        assert_eq!(results.weight_corrected, None);
    }

    #[test]
    fn test_velocity_and_previous_height_blocks() {
        let request: CalculateRequest = serde_json::from_value(json!({
            "sex": "male",
            "birth_date": "2018-01-01",
            "measurement_date": "2026-01-18",
            "height": 130.0,
            "previous_measurements": [
                {"date": "2025-01-18", "height": 125.0}
            ]
        }))
        .unwrap();
        let results = service(StubReference::default())
            .calculate_as_of(&request, today())
            .unwrap();

        let velocity = results.height_velocity.unwrap();
        assert_eq!(velocity.message, None);
        assert!((velocity.value.unwrap() - 5.0).abs() < 0.2);

        let previous = results.previous_height.unwrap();
        assert_eq!(previous.value, 125.0);
        assert!(previous.sds.is_some());
    }

    #[test]
    fn test_short_interval_velocity_message() {
        let request: CalculateRequest = serde_json::from_value(json!({
            "sex": "male",
            "birth_date": "2018-01-01",
            "measurement_date": "2026-01-18",
            "height": 130.0,
            "previous_measurements": [
                {"date": "2025-11-19", "height": 129.0}
            ]
        }))
        .unwrap();
        let results = service(StubReference::default())
            .calculate_as_of(&request, today())
            .unwrap();
        let velocity = results.height_velocity.unwrap();
        assert_eq!(velocity.value, None);
        assert!(velocity.message.unwrap().contains("at least 4 months"));
    }

    #[test]
    fn test_cbnf_method_when_height_absent() {
        let request: CalculateRequest = serde_json::from_value(json!({
            "sex": "female",
            "birth_date": "2020-01-01",
            "measurement_date": "2026-01-18",
            "weight": 20.0
        }))
        .unwrap();
        let results = service(StubReference::default())
            .calculate_as_of(&request, today())
            .unwrap();
        assert_eq!(results.bsa_method, Some(crate::types::BsaMethod::Cbnf));
        assert_eq!(results.bsa, Some(0.79));
        assert_eq!(results.bmi, None);
        assert!(results.gh_dose.is_some());
    }

    #[test]
    fn test_mid_parental_height_block() {
        let mut request = base_request();
        request.maternal_height = Some(json!(165.0));
        request.paternal_height = Some(json!(180.0));
        let results = service(StubReference::default())
            .calculate_as_of(&request, today())
            .unwrap();

        let mph = results.mid_parental_height.unwrap();
        assert!((mph.mid_parental_height - 179.0).abs() < 1.0);
        assert!(mph.target_range_lower < mph.mid_parental_height);
        assert!(mph.mid_parental_height < mph.target_range_upper);
        assert_eq!(mph.mid_parental_height_sds, 0.3);
        assert!((mph.mid_parental_height_centile - 61.8).abs() < 0.2);
    }

    #[test]
    fn test_mph_absent_with_single_parent() {
        let mut request = base_request();
        request.maternal_height = Some(json!(165.0));
        let results = service(StubReference::default())
            .calculate_as_of(&request, today())
            .unwrap();
        assert_eq!(results.mid_parental_height, None);
    }

    #[test]
    fn test_percentage_median_failure_degrades_to_none() {
        let stub = StubReference {
            fail_percentage_median: true,
            ..Default::default()
        };
        let results = service(stub)
            .calculate_as_of(&base_request(), today())
            .unwrap();
        assert_eq!(results.bmi.unwrap().percentage_median, None);
    }

    #[test]
    fn test_bone_age_blocks() {
        let mut request = base_request();
        request.bone_age_assessments = serde_json::from_value(json!([
            {"date": "2026-01-10", "bone_age": 5.5, "standard": "greulich-pyle"},
            {"date": "2026-01-12", "bone_age": 5.6, "standard": "tw3"},
            {"date": "2025-06-01", "bone_age": 5.0, "standard": "tw3"}
        ]))
        .unwrap();
        let results = service(StubReference::default())
            .calculate_as_of(&request, today())
            .unwrap();

        // The stale assessment falls outside the ±1 month window.
        let assessments = results.bone_age_assessments.unwrap();
        assert_eq!(assessments.len(), 2);
        let plotted = results.bone_age_height.unwrap();
        assert_eq!(plotted.value, 115.0);
        assert!(plotted.sds.is_some());
    }

    #[test]
    fn test_bone_age_requires_height() {
        let request: CalculateRequest = serde_json::from_value(json!({
            "sex": "male",
            "birth_date": "2020-01-01",
            "measurement_date": "2026-01-18",
            "weight": 20.0,
            "bone_age_assessments": [
                {"date": "2026-01-10", "bone_age": 5.5}
            ]
        }))
        .unwrap();
        let results = service(StubReference::default())
            .calculate_as_of(&request, today())
            .unwrap();
        assert_eq!(results.bone_age_height, None);
        assert_eq!(results.bone_age_assessments, None);
    }

    #[test]
    fn test_same_day_measurement_configurable() {
        let request: CalculateRequest = serde_json::from_value(json!({
            "sex": "male",
            "birth_date": "2026-01-18",
            "measurement_date": "2026-01-18",
            "weight": 3.5
        }))
        .unwrap();

        let rejecting = service(StubReference::default());
        let err = rejecting
            .calculate_as_of(&request, today())
            .expect_err("should reject by default");
        assert!(matches!(err, GrowthError::InvalidDateRange(_)));

        let permissive = GrowthService::new(
            Arc::new(StubReference::default()),
            CoreConfig::new(true),
        );
        assert!(permissive.calculate_as_of(&request, today()).is_ok());
    }

    #[test]
    fn test_unknown_reference_rejected() {
        let mut request = base_request();
        request.reference = Some("cdc".into());
        let err = service(StubReference::default())
            .calculate_as_of(&request, today())
            .expect_err("should reject");
        assert!(matches!(err, GrowthError::InvalidInput(msg) if msg.contains("cdc")));
    }
}
