//! Input validation for the calculate request.
//!
//! Pure functions, no I/O. Raw numeric fields arrive as loosely-typed JSON so
//! that numeric strings coerce (clinical front ends post form values as
//! strings) while booleans, arrays and objects are rejected outright.

use chrono::NaiveDate;
use serde_json::Value;

use crate::constants::{
    MAX_GESTATION_DAYS, MAX_GESTATION_WEEKS, MAX_PATIENT_AGE_YEARS, MIN_GESTATION_WEEKS,
};
use crate::error::{GrowthError, GrowthResult};
use crate::types::{Gestation, MeasurementMethod, Sex};

/// Coerce a JSON value to a finite float, accepting numbers and numeric
/// strings only.
fn parse_scalar(raw: &Value) -> Option<f64> {
    let value = match raw {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    value.is_finite().then_some(value)
}

/// Coerce a JSON value to an integer, accepting whole numbers and integer
/// strings only.
fn parse_scalar_int(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    }
}

/// Parse and range-check a date field.
///
/// Rejects missing/malformed dates with `InvalidDateFormat`, and dates in the
/// future or more than 150 years in the past with `InvalidDateRange`.
pub fn validate_date(
    raw: Option<&str>,
    field_name: &str,
    today: NaiveDate,
) -> GrowthResult<NaiveDate> {
    let raw = raw
        .filter(|s| !s.is_empty())
        .ok_or_else(|| GrowthError::InvalidDateFormat(format!("{field_name} is required")))?;

    let parsed = NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        GrowthError::InvalidDateFormat(format!("{field_name} must be in YYYY-MM-DD format"))
    })?;

    if parsed > today {
        return Err(GrowthError::InvalidDateRange(format!(
            "{field_name} cannot be in the future"
        )));
    }

    if chrono::Datelike::year(&parsed) < chrono::Datelike::year(&today) - MAX_PATIENT_AGE_YEARS {
        return Err(GrowthError::InvalidDateRange(format!(
            "{field_name} is too far in the past"
        )));
    }

    Ok(parsed)
}

/// Measurement date must follow birth date. Same-day measurements are only
/// accepted when explicitly configured.
pub fn validate_date_order(
    birth_date: NaiveDate,
    measurement_date: NaiveDate,
    allow_same_day: bool,
) -> GrowthResult<()> {
    let ordered = if allow_same_day {
        measurement_date >= birth_date
    } else {
        measurement_date > birth_date
    };
    if !ordered {
        return Err(GrowthError::InvalidDateRange(
            "Measurement date must be after birth date".into(),
        ));
    }
    Ok(())
}

/// Parse and range-check one directly-entered observation.
///
/// Absent values pass through as `None`. The error variant is selected by the
/// measurement method so clients keep per-field error codes.
pub fn validate_observation(
    method: MeasurementMethod,
    raw: Option<&Value>,
) -> GrowthResult<Option<f64>> {
    let Some(raw) = raw else {
        return Ok(None);
    };
    if raw.is_null() {
        return Ok(None);
    }

    let Some((min, max, unit)) = method.bounds() else {
        return Err(GrowthError::InvalidInput(
            "BMI is derived from weight and height and cannot be entered directly".into(),
        ));
    };

    let value = parse_scalar(raw).ok_or_else(|| {
        observation_error(method, format!("{} must be a number", method.label()))
    })?;

    if value < min || value > max {
        return Err(observation_error(
            method,
            format!("{} must be between {} and {} {}", method.label(), min, max, unit),
        ));
    }

    Ok(Some(value))
}

fn observation_error(method: MeasurementMethod, message: String) -> GrowthError {
    match method {
        MeasurementMethod::Weight => GrowthError::InvalidWeight(message),
        MeasurementMethod::Height => GrowthError::InvalidHeight(message),
        MeasurementMethod::Ofc => GrowthError::InvalidOfc(message),
        MeasurementMethod::Bmi => GrowthError::InvalidInput(message),
    }
}

/// Sex must be exactly `"male"` or `"female"`.
pub fn validate_sex(raw: Option<&str>) -> GrowthResult<Sex> {
    let raw = raw.ok_or_else(|| GrowthError::InvalidInput("sex is required".into()))?;
    Sex::from_wire(raw)
        .ok_or_else(|| GrowthError::InvalidInput("sex must be 'male' or 'female'".into()))
}

/// Gestation weeks/days pair. Absent weeks means gestation was not provided.
pub fn validate_gestation(
    weeks: Option<&Value>,
    days: Option<&Value>,
) -> GrowthResult<Option<Gestation>> {
    let Some(weeks) = weeks.filter(|v| !v.is_null()) else {
        return Ok(None);
    };

    let weeks = parse_scalar_int(weeks).ok_or_else(|| {
        GrowthError::InvalidGestation("Gestation weeks must be a whole number".into())
    })?;

    if weeks < i64::from(MIN_GESTATION_WEEKS) || weeks > i64::from(MAX_GESTATION_WEEKS) {
        return Err(GrowthError::InvalidGestation(format!(
            "Gestation weeks must be between {MIN_GESTATION_WEEKS} and {MAX_GESTATION_WEEKS}"
        )));
    }

    let days = match days.filter(|v| !v.is_null()) {
        Some(raw) => {
            let days = parse_scalar_int(raw).ok_or_else(|| {
                GrowthError::InvalidGestation("Gestation days must be a whole number".into())
            })?;
            if !(0..=i64::from(MAX_GESTATION_DAYS)).contains(&days) {
                return Err(GrowthError::InvalidGestation(format!(
                    "Gestation days must be between 0 and {MAX_GESTATION_DAYS}"
                )));
            }
            days as u32
        }
        None => 0,
    };

    Ok(Some(Gestation {
        weeks: weeks as u32,
        days,
    }))
}

/// Weight, height and OFC cannot all be absent.
pub fn validate_at_least_one_measurement(
    weight: Option<f64>,
    height: Option<f64>,
    ofc: Option<f64>,
) -> GrowthResult<()> {
    if weight.is_none() && height.is_none() && ofc.is_none() {
        return Err(GrowthError::MissingMeasurement);
    }
    Ok(())
}
