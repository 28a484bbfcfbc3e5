//! Error taxonomy for the growth calculation core.
//!
//! Every failure reachable from malformed user input maps to a specific
//! variant with a stable machine code, so API clients can branch on the code
//! while humans read the message. Collaborator contract violations are not
//! represented here; those are programming faults and panic instead.

#[derive(Debug, thiserror::Error)]
pub enum GrowthError {
    #[error("{0}")]
    InvalidDateFormat(String),
    #[error("{0}")]
    InvalidDateRange(String),
    #[error("At least one measurement (weight, height, or OFC) is required")]
    MissingMeasurement,
    #[error("{0}")]
    InvalidWeight(String),
    #[error("{0}")]
    InvalidHeight(String),
    #[error("{0}")]
    InvalidOfc(String),
    #[error("{0}")]
    InvalidGestation(String),
    #[error("{0}")]
    SdsOutOfRange(String),
    #[error("calculation failed: {0}")]
    Calculation(String),
    #[error("invalid input: {0}")]
    InvalidInput(String),
}

impl GrowthError {
    /// Stable machine-readable code carried alongside the human message.
    pub fn code(&self) -> &'static str {
        match self {
            GrowthError::InvalidDateFormat(_) => "ERR_001",
            GrowthError::InvalidDateRange(_) => "ERR_002",
            GrowthError::MissingMeasurement => "ERR_003",
            GrowthError::InvalidWeight(_) => "ERR_004",
            GrowthError::InvalidHeight(_) => "ERR_005",
            GrowthError::InvalidOfc(_) => "ERR_006",
            GrowthError::InvalidGestation(_) => "ERR_007",
            GrowthError::SdsOutOfRange(_) => "ERR_008",
            GrowthError::Calculation(_) => "ERR_009",
            GrowthError::InvalidInput(_) => "ERR_010",
        }
    }
}

pub type GrowthResult<T> = std::result::Result<T, GrowthError>;
