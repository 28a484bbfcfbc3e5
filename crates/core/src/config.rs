//! Core runtime configuration.
//!
//! Resolved once at process startup and passed into the service, instead of
//! reading process-wide environment variables during request handling.

/// Configuration for the calculation core.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    allow_same_day_measurement: bool,
}

impl CoreConfig {
    pub fn new(allow_same_day_measurement: bool) -> Self {
        Self {
            allow_same_day_measurement,
        }
    }

    /// Whether a measurement dated on the birth date itself is accepted.
    ///
    /// Off by default, matching the historically observed rejection; a
    /// same-day newborn measurement is arguably valid, so deployments may
    /// opt in.
    pub fn allow_same_day_measurement(&self) -> bool {
        self.allow_same_day_measurement
    }
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self::new(false)
    }
}
