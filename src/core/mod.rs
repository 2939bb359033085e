//! Core decision pipeline for the presence engine.
//!
//! This module contains:
//! - Z-score normalization against a calibrated baseline
//! - The four-state debounce machine with hysteresis thresholds
//! - The engine facade that hosts drive one poll cycle at a time

pub mod engine;
pub mod machine;
pub mod zscore;

// Re-export commonly used types
pub use engine::{
    EnergySource, PresenceEngine, PresenceSink, PresenceUpdate, INITIAL_REASON, REASON_MAX_LEN,
};
pub use machine::{Confirmed, DebounceMachine, DebounceTiming, PresenceState, Thresholds};
pub use zscore::{Baseline, SIGMA_EPSILON};
