//! Presence Engine - z-score occupancy detection with timed debounce.
//!
//! This library classifies bed occupancy from a single continuously sampled
//! energy-level signal (e.g. radar "still energy"). A reading is standardized
//! against a calibrated baseline, compared against hysteretic thresholds, and
//! stabilized through a four-state debounce machine so transient noise never
//! chatters the output.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                       Presence Engine                         │
//! ├───────────────────────────────────────────────────────────────┤
//! │  ┌────────────┐   ┌─────────────┐   ┌────────────────────┐   │
//! │  │  Z-Score   │──▶│  Debounce   │──▶│   Engine Facade    │   │
//! │  │ Normalizer │   │   Machine   │   │ (publish on change)│   │
//! │  └────────────┘   └─────────────┘   └────────────────────┘   │
//! │        ▲                                      │               │
//! │  EnergySource                           PresenceSink          │
//! │  (host polls)                        (bool + reason text)     │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine is host-driven: no internal timers or threads. The host calls
//! [`PresenceEngine::on_reading`] (or [`PresenceEngine::run_cycle`]) once per
//! poll interval with the latest reading and a monotonic millisecond tick,
//! and the engine publishes only when the confirmed output changes.
//!
//! # Example
//!
//! ```
//! use presence_engine::core::{Baseline, DebounceTiming, PresenceEngine, Thresholds};
//!
//! let mut engine = PresenceEngine::new(
//!     Baseline::new(100.0, 20.0),
//!     Thresholds::default(),
//!     DebounceTiming::new(3_000, 5_000, 30_000),
//! );
//!
//! // Strong signal must hold for the on-debounce before it is trusted.
//! assert!(engine.on_reading(185.0, 0).is_none());
//! let update = engine.on_reading(185.0, 3_000).unwrap();
//! assert!(update.occupied);
//! ```

pub mod config;
pub mod core;
pub mod session;
pub mod stats;

// Re-export key types at crate root for convenience
pub use config::{Config, ConfigError};
pub use core::{
    Baseline, DebounceMachine, DebounceTiming, EnergySource, PresenceEngine, PresenceSink,
    PresenceState, PresenceUpdate, Thresholds,
};
pub use session::{SessionRecorder, TransitionRecord};
pub use stats::{create_shared_stats_with_persistence, EngineStats, SharedEngineStats, StatsSnapshot};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
