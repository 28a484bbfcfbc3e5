//! SDS safety gate.
//!
//! Applied per measurement type to the chronological result: |SDS| beyond the
//! hard limit rejects the whole request, |SDS| beyond the warning limit (but
//! within the hard limit) attaches an advisory string. The warning boundary
//! is exclusive: exactly ±4.0 does not warn.

use crate::constants::SDS_WARNING_LIMIT;
use crate::error::{GrowthError, GrowthResult};
use crate::types::MeasurementMethod;

/// Gate one resolved SDS. `Ok(Some(_))` carries an advisory message,
/// `Ok(None)` means the value passed silently, `Err` is the hard rejection.
pub fn check_sds(method: MeasurementMethod, sds: Option<f64>) -> GrowthResult<Option<String>> {
    let Some(sds) = sds else {
        return Ok(None);
    };

    let hard_limit = method.sds_hard_limit();
    if sds.abs() > hard_limit {
        return Err(GrowthError::SdsOutOfRange(format!(
            "{} SDS ({:.2}) exceeds acceptable range (±{} SDS). Please check measurement accuracy.",
            method.label(),
            sds,
            hard_limit
        )));
    }

    if sds.abs() > SDS_WARNING_LIMIT {
        return Ok(Some(format!(
            "{} SDS ({:.2}) is beyond ±{} SDS. Please verify measurement accuracy.",
            method.label(),
            sds,
            SDS_WARNING_LIMIT
        )));
    }

    Ok(None)
}
