//! Z-score normalization against a calibrated baseline.
//!
//! Converts a raw energy reading into a dimensionless deviation score:
//! `z = (reading - mean) / std_dev`. All downstream threshold logic works in
//! standard-deviation units, so a single pair of multipliers applies to any
//! deployment regardless of the sensor's absolute scale.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Standard deviations at or below this value are treated as an invalid
/// calibration rather than a divisor.
pub const SIGMA_EPSILON: f32 = 0.001;

/// Calibrated (mean, standard deviation) pair describing the expected
/// reading when the monitored space is empty.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Baseline {
    /// Mean energy with the bed empty
    pub mean: f32,
    /// Standard deviation of energy with the bed empty
    pub std_dev: f32,
}

impl Baseline {
    pub fn new(mean: f32, std_dev: f32) -> Self {
        Self { mean, std_dev }
    }

    /// Standardized deviation of a reading from this baseline.
    ///
    /// Any finite reading is accepted, including negative or far
    /// out-of-range values; sensor noise is scored, never rejected. A
    /// baseline with `std_dev <= SIGMA_EPSILON` yields a neutral `0.0` so a
    /// misconfigured calibration can never trigger a transition; the
    /// condition is surfaced as a warning, not an error.
    pub fn z_score(&self, reading: f32) -> f32 {
        if self.std_dev <= SIGMA_EPSILON {
            warn!(std_dev = self.std_dev, "invalid baseline std_dev, forcing z=0");
            return 0.0;
        }
        (reading - self.mean) / self.std_dev
    }

    /// Whether this baseline has a usable standard deviation.
    pub fn is_valid(&self) -> bool {
        self.std_dev > SIGMA_EPSILON
    }
}
