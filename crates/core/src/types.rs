//! Closed domain vocabularies for the growth calculator.
//!
//! These enums replace stringly-typed dispatch: every per-measurement code
//! path is parameterized by [`MeasurementMethod`] rather than duplicated per
//! field, and every accepted wire tag round-trips through `to_wire` /
//! `from_wire` pairs.

use serde::Serialize;

use crate::constants::{
    MAX_HEIGHT_CM, MAX_OFC_CM, MAX_WEIGHT_KG, MIN_HEIGHT_CM, MIN_OFC_CM, MIN_WEIGHT_KG,
    SDS_HARD_LIMIT, SDS_HARD_LIMIT_BMI,
};

/// Biological sex, as required by the growth references.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Sex {
    Male,
    Female,
}

impl Sex {
    /// Wire tag. Case-sensitive by contract; anything else is rejected.
    pub fn to_wire(self) -> &'static str {
        match self {
            Sex::Male => "male",
            Sex::Female => "female",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "male" => Some(Sex::Male),
            "female" => Some(Sex::Female),
            _ => None,
        }
    }
}

/// Growth-reference chart identifier.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChartReference {
    UkWho,
    TurnersSyndrome,
    Trisomy21,
}

impl ChartReference {
    pub fn to_wire(self) -> &'static str {
        match self {
            ChartReference::UkWho => "uk-who",
            ChartReference::TurnersSyndrome => "turners-syndrome",
            ChartReference::Trisomy21 => "trisomy-21",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "uk-who" => Some(ChartReference::UkWho),
            "turners-syndrome" => Some(ChartReference::TurnersSyndrome),
            "trisomy-21" => Some(ChartReference::Trisomy21),
            _ => None,
        }
    }
}

/// The four measurement types the calculator understands.
///
/// BMI is derived from weight and height and is never entered directly, so it
/// carries no input bounds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeasurementMethod {
    Weight,
    Height,
    Bmi,
    Ofc,
}

impl MeasurementMethod {
    pub fn to_wire(self) -> &'static str {
        match self {
            MeasurementMethod::Weight => "weight",
            MeasurementMethod::Height => "height",
            MeasurementMethod::Bmi => "bmi",
            MeasurementMethod::Ofc => "ofc",
        }
    }

    /// Human-readable label used in error and warning messages.
    pub fn label(self) -> &'static str {
        match self {
            MeasurementMethod::Weight => "Weight",
            MeasurementMethod::Height => "Height",
            MeasurementMethod::Bmi => "BMI",
            MeasurementMethod::Ofc => "Head circumference",
        }
    }

    /// Accepted input range and unit, for the directly-entered methods.
    pub fn bounds(self) -> Option<(f64, f64, &'static str)> {
        match self {
            MeasurementMethod::Weight => Some((MIN_WEIGHT_KG, MAX_WEIGHT_KG, "kg")),
            MeasurementMethod::Height => Some((MIN_HEIGHT_CM, MAX_HEIGHT_CM, "cm")),
            MeasurementMethod::Ofc => Some((MIN_OFC_CM, MAX_OFC_CM, "cm")),
            MeasurementMethod::Bmi => None,
        }
    }

    /// |SDS| ceiling beyond which the whole request is rejected.
    pub fn sds_hard_limit(self) -> f64 {
        match self {
            MeasurementMethod::Bmi => SDS_HARD_LIMIT_BMI,
            _ => SDS_HARD_LIMIT,
        }
    }
}

/// Which formula produced the reported body-surface-area.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub enum BsaMethod {
    #[serde(rename = "Boyd")]
    Boyd,
    #[serde(rename = "cBNF")]
    Cbnf,
}

/// Radiographic bone-age scoring standard.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BoneAgeStandard {
    Tw3,
    GreulichPyle,
}

impl BoneAgeStandard {
    pub fn to_wire(self) -> &'static str {
        match self {
            BoneAgeStandard::Tw3 => "tw3",
            BoneAgeStandard::GreulichPyle => "greulich-pyle",
        }
    }

    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "tw3" => Some(BoneAgeStandard::Tw3),
            "greulich-pyle" => Some(BoneAgeStandard::GreulichPyle),
            _ => None,
        }
    }
}

/// Gestation at birth: completed weeks plus a 0–6 day remainder.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Gestation {
    pub weeks: u32,
    pub days: u32,
}

impl Gestation {
    pub fn total_weeks(&self) -> f64 {
        f64::from(self.weeks) + f64::from(self.days) / f64::from(crate::constants::DAYS_PER_WEEK)
    }

    pub fn total_days(&self) -> i64 {
        i64::from(self.weeks * crate::constants::DAYS_PER_WEEK + self.days)
    }
}
