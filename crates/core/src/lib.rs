//! Growth calculation core: validation, age arithmetic, derived metrics and
//! result aggregation for paediatric growth measurements.
//!
//! The crate is transport-agnostic. Centile/SDS lookups go through the
//! [`GrowthReference`](reference::GrowthReference) trait; the HTTP surface
//! and the bundled reference implementation live in sibling crates.

pub mod age;
pub mod config;
pub mod constants;
pub mod error;
pub mod gate;
pub mod metrics;
pub mod models;
pub mod reference;
pub mod resolver;
pub mod service;
pub mod stats;
pub mod types;
pub mod validation;

pub use config::CoreConfig;
pub use error::{GrowthError, GrowthResult};
pub use models::{CalculateRequest, CalculateResponse, GrowthResults};
pub use reference::{
    CalculatedValues, GrowthReference, MeasurementParams, MidParentalEstimate, ReferenceError,
};
pub use service::GrowthService;
pub use types::{BoneAgeStandard, BsaMethod, ChartReference, Gestation, MeasurementMethod, Sex};
