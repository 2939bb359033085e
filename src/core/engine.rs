//! Engine facade tying normalization and debouncing together.
//!
//! The engine is purely reactive: the host drives it with one call per poll
//! cycle carrying the latest reading and a monotonic millisecond tick. It
//! owns the baseline, thresholds, timing, the debounce machine, and the last
//! published reason text. Output is published only on confirmed transitions,
//! never every cycle.

use crate::core::machine::{Confirmed, DebounceMachine, DebounceTiming, PresenceState, Thresholds};
use crate::core::zscore::Baseline;
use tracing::{info, trace};

/// Reason strings are capped to this many bytes before publishing.
pub const REASON_MAX_LEN: usize = 64;

/// Reason text published for a freshly constructed engine.
pub const INITIAL_REASON: &str = "Initial state: vacant";

/// A polled scalar reading source. `None` means no new value this cycle.
pub trait EnergySource {
    fn energy(&self) -> Option<f32>;
}

impl EnergySource for Option<f32> {
    fn energy(&self) -> Option<f32> {
        *self
    }
}

/// Receives the engine's published outputs. `publish_reason` is invoked
/// alongside every `publish_state` call, never on its own.
pub trait PresenceSink {
    fn publish_state(&mut self, occupied: bool);
    fn publish_reason(&mut self, reason: &str);
}

/// A confirmed output change, with the reason text that was published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresenceUpdate {
    pub occupied: bool,
    pub reason: String,
}

/// The occupancy decision engine.
///
/// Single-threaded and synchronous: no internal timers or threads, O(1) work
/// per reading. One instance lives for the process lifetime.
#[derive(Debug)]
pub struct PresenceEngine {
    baseline: Baseline,
    thresholds: Thresholds,
    timing: DebounceTiming,
    machine: DebounceMachine,
    occupied: bool,
    last_reason: String,
}

impl PresenceEngine {
    /// Create an engine in the confirmed-vacant state.
    pub fn new(baseline: Baseline, thresholds: Thresholds, timing: DebounceTiming) -> Self {
        thresholds.warn_if_degenerate();
        Self {
            baseline,
            thresholds,
            timing,
            machine: DebounceMachine::new(),
            occupied: false,
            last_reason: INITIAL_REASON.to_string(),
        }
    }

    /// Process one reading against the current configuration.
    ///
    /// Returns `Some` only when the confirmed boolean output changed.
    pub fn on_reading(&mut self, reading: f32, now_ms: u32) -> Option<PresenceUpdate> {
        let z = self.baseline.z_score(reading);
        trace!(energy = reading, z, "reading scored");

        let confirmed = self.machine.step(z, now_ms, &self.thresholds, &self.timing)?;
        let update = self.publish(confirmed, z);
        Some(update)
    }

    /// Run one poll cycle: poll the source, score and step, and push any
    /// confirmed change to the sink. A source with no value is a no-op.
    /// Returns true when an output was published.
    pub fn run_cycle<S, P>(&mut self, source: &S, now_ms: u32, sink: &mut P) -> bool
    where
        S: EnergySource,
        P: PresenceSink,
    {
        let Some(reading) = source.energy() else {
            return false;
        };
        match self.on_reading(reading, now_ms) {
            Some(update) => {
                sink.publish_state(update.occupied);
                sink.publish_reason(&update.reason);
                true
            }
            None => false,
        }
    }

    fn publish(&mut self, confirmed: Confirmed, z: f32) -> PresenceUpdate {
        let (occupied, reason) = match confirmed {
            Confirmed::On { elapsed_ms } => {
                (true, format_reason("ON", z, elapsed_ms, self.timing.on_debounce_ms > 0))
            }
            Confirmed::Off { elapsed_ms } => {
                (false, format_reason("OFF", z, elapsed_ms, self.timing.off_debounce_ms > 0))
            }
        };

        info!(occupied, reason = reason.as_str(), "occupancy changed");
        self.occupied = occupied;
        self.last_reason = reason.clone();
        PresenceUpdate { occupied, reason }
    }

    pub fn occupied(&self) -> bool {
        self.occupied
    }

    pub fn state(&self) -> PresenceState {
        self.machine.state()
    }

    pub fn last_reason(&self) -> &str {
        &self.last_reason
    }

    pub fn baseline(&self) -> Baseline {
        self.baseline
    }

    pub fn thresholds(&self) -> Thresholds {
        self.thresholds
    }

    pub fn timing(&self) -> DebounceTiming {
        self.timing
    }

    // Runtime tuning. Each setter takes effect on the next processed
    // reading; the current state is never re-evaluated retroactively.

    pub fn set_baseline(&mut self, baseline: Baseline) {
        info!(mean = baseline.mean, std_dev = baseline.std_dev, "baseline updated");
        self.baseline = baseline;
    }

    pub fn set_k_on(&mut self, k_on: f32) {
        info!(old = self.thresholds.k_on, new = k_on, "k_on updated");
        self.thresholds.k_on = k_on;
        self.thresholds.warn_if_degenerate();
    }

    pub fn set_k_off(&mut self, k_off: f32) {
        info!(old = self.thresholds.k_off, new = k_off, "k_off updated");
        self.thresholds.k_off = k_off;
        self.thresholds.warn_if_degenerate();
    }

    pub fn set_on_debounce_ms(&mut self, ms: u32) {
        self.timing.on_debounce_ms = ms;
    }

    pub fn set_off_debounce_ms(&mut self, ms: u32) {
        self.timing.off_debounce_ms = ms;
    }

    pub fn set_abs_clear_delay_ms(&mut self, ms: u32) {
        self.timing.abs_clear_delay_ms = ms;
    }
}

/// Format a transition reason, capped to `REASON_MAX_LEN` bytes.
///
/// `"<ON|OFF>: z=<score>[, debounced <ms>ms]"` — the debounce suffix is
/// included only when the stage actually had a non-zero configured debounce.
fn format_reason(tag: &str, z: f32, elapsed_ms: u32, debounced: bool) -> String {
    let mut reason = if debounced {
        format!("{tag}: z={z:.2}, debounced {elapsed_ms}ms")
    } else {
        format!("{tag}: z={z:.2}")
    };
    if reason.len() > REASON_MAX_LEN {
        let mut cut = REASON_MAX_LEN;
        while !reason.is_char_boundary(cut) {
            cut -= 1;
        }
        reason.truncate(cut);
    }
    reason
}
