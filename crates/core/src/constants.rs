//! Constants used throughout the growth calculation core.
//!
//! All clinical thresholds and calendar conversion factors live here so the
//! calculators and validators stay consistent with each other.

/// Days in a mean calendar year, used for decimal-age conversion.
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Months in a calendar year.
pub const MONTHS_PER_YEAR: f64 = 12.0;

/// Mean days per month, used only for display of sub-year intervals.
pub const DAYS_PER_MONTH: f64 = 30.44;

/// Days in a week.
pub const DAYS_PER_WEEK: u32 = 7;

/// Full-term gestation expressed in days (40 weeks).
pub const FULL_TERM_DAYS: i64 = 280;

/// Lowest gestation at birth accepted as input, in completed weeks.
pub const MIN_GESTATION_WEEKS: u32 = 22;

/// Highest gestation at birth accepted as input, in completed weeks.
pub const MAX_GESTATION_WEEKS: u32 = 44;

/// Highest `gestation_days` remainder accepted alongside completed weeks.
pub const MAX_GESTATION_DAYS: u32 = 6;

/// Gestations at or above this many weeks are treated as term; no correction.
pub const PRETERM_THRESHOLD_WEEKS: f64 = 37.0;

/// Gestations at or above this many weeks (but below term) correct until 1 year.
pub const MODERATE_PRETERM_THRESHOLD_WEEKS: f64 = 32.0;

/// Age limit (decimal years) for correcting moderate preterm infants.
pub const CORRECTION_AGE_THRESHOLD_MODERATE: f64 = 1.0;

/// Age limit (decimal years) for correcting extreme preterm infants.
pub const CORRECTION_AGE_THRESHOLD_EXTREME: f64 = 2.0;

/// |SDS| beyond which a weight/height/OFC measurement rejects the request.
pub const SDS_HARD_LIMIT: f64 = 8.0;

/// |SDS| beyond which a BMI measurement rejects the request.
pub const SDS_HARD_LIMIT_BMI: f64 = 15.0;

/// |SDS| beyond which any measurement attaches an advisory warning.
pub const SDS_WARNING_LIMIT: f64 = 4.0;

/// Weight bounds in kilograms.
pub const MIN_WEIGHT_KG: f64 = 0.1;
pub const MAX_WEIGHT_KG: f64 = 300.0;

/// Height bounds in centimetres.
pub const MIN_HEIGHT_CM: f64 = 10.0;
pub const MAX_HEIGHT_CM: f64 = 250.0;

/// Head circumference bounds in centimetres.
pub const MIN_OFC_CM: f64 = 10.0;
pub const MAX_OFC_CM: f64 = 100.0;

/// Standard growth hormone dose rate in mg/m²/week.
pub const GH_DOSE_STANDARD: f64 = 7.0;

/// Grams per kilogram (and micrograms per milligram).
pub const WEIGHT_TO_GRAMS: f64 = 1000.0;

/// Reference age in years at which mid-parental target heights are read.
pub const MPH_ADULT_AGE: f64 = 18.0;

/// Minimum interval between height measurements for a velocity, in days (~4 months).
pub const MIN_VELOCITY_INTERVAL_DAYS: i64 = 122;

/// Bone-age assessments further than this many days from the measurement date
/// are not plotted (±1 month).
pub const BONE_AGE_WINDOW_DAYS: f64 = 30.44;

/// Birth dates more than this many years in the past are rejected.
pub const MAX_PATIENT_AGE_YEARS: i32 = 150;
