//! Four-state debounce machine for occupancy decisions.
//!
//! Raw threshold comparisons are "twitchy": a single noisy reading near a
//! threshold flips the output. This machine requires the on-condition and the
//! off-condition to each hold for a configured duration before the boolean
//! output is confirmed, and additionally holds occupancy for an absolute
//! clear delay after the last strong confirmation.
//!
//! The clock is an unsigned monotonic millisecond tick. All elapsed-time
//! checks use `wrapping_sub`, so the machine survives the counter wrapping
//! at `u32::MAX`.
//!
//! Threshold boundary convention, applied uniformly: on-side comparisons use
//! `score >= k_on`, off-side comparisons use `score < k_off`. Scores inside
//! the hysteresis band `[k_off, k_on)` never cause a transition.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Hysteresis threshold multipliers, in standard-deviation units.
///
/// `k_on > k_off` produces the hysteresis band. The machine does not enforce
/// this; a degenerate or inverted band is accepted (and warned about) and the
/// transition rules apply as written.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Thresholds {
    /// Turn ON when `z >= k_on`
    pub k_on: f32,
    /// Turn OFF when `z < k_off`
    pub k_off: f32,
}

impl Thresholds {
    pub fn new(k_on: f32, k_off: f32) -> Self {
        let thresholds = Self { k_on, k_off };
        thresholds.warn_if_degenerate();
        thresholds
    }

    /// Emit a warning when the hysteresis band is degenerate or inverted.
    pub fn warn_if_degenerate(&self) {
        if self.k_on <= self.k_off {
            warn!(
                k_on = self.k_on,
                k_off = self.k_off,
                "thresholds leave no hysteresis band"
            );
        }
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            k_on: 4.0,
            k_off: 2.0,
        }
    }
}

/// Debounce durations in milliseconds. Zero degenerates a stage to an
/// immediate transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DebounceTiming {
    /// How long `z >= k_on` must hold before occupancy is confirmed
    pub on_debounce_ms: u32,
    /// How long `z < k_off` must hold before vacancy is confirmed
    pub off_debounce_ms: u32,
    /// Minimum time since the last strong confirmation before the off
    /// debounce may even start
    pub abs_clear_delay_ms: u32,
}

impl DebounceTiming {
    pub fn new(on_debounce_ms: u32, off_debounce_ms: u32, abs_clear_delay_ms: u32) -> Self {
        Self {
            on_debounce_ms,
            off_debounce_ms,
            abs_clear_delay_ms,
        }
    }

    /// All stages immediate; collapses the machine to plain hysteresis.
    pub fn immediate() -> Self {
        Self::new(0, 0, 0)
    }
}

impl Default for DebounceTiming {
    fn default() -> Self {
        Self {
            on_debounce_ms: 3_000,
            off_debounce_ms: 5_000,
            abs_clear_delay_ms: 30_000,
        }
    }
}

/// Control state of the debounce machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PresenceState {
    /// Confirmed vacant; output false
    Idle,
    /// On-threshold crossed, waiting for the hold time to elapse
    DebouncingOn,
    /// Confirmed occupied; output true
    Present,
    /// Signal dropped, waiting for the hold time before confirming vacancy
    DebouncingOff,
}

impl PresenceState {
    /// The boolean output this state publishes.
    pub fn occupied(&self) -> bool {
        matches!(self, PresenceState::Present | PresenceState::DebouncingOff)
    }
}

/// A confirmed output change produced by a step.
///
/// `elapsed_ms` is how long the triggering condition had held when the
/// transition was confirmed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmed {
    On { elapsed_ms: u32 },
    Off { elapsed_ms: u32 },
}

/// The debounce state machine. Owns only its control state and the two
/// timestamps the transition rules reference; thresholds and timing are
/// passed per step so runtime tuning takes effect on the next reading.
#[derive(Debug, Clone)]
pub struct DebounceMachine {
    state: PresenceState,
    debounce_start_ms: u32,
    last_high_confidence_ms: u32,
}

impl DebounceMachine {
    /// A fresh machine starts confirmed vacant.
    pub fn new() -> Self {
        Self {
            state: PresenceState::Idle,
            debounce_start_ms: 0,
            last_high_confidence_ms: 0,
        }
    }

    pub fn state(&self) -> PresenceState {
        self.state
    }

    /// Advance the machine by one reading.
    ///
    /// Returns `Some(Confirmed)` only when the boolean output changes; every
    /// other step (including aborts of an in-progress debounce) is silent.
    pub fn step(
        &mut self,
        score: f32,
        now_ms: u32,
        thresholds: &Thresholds,
        timing: &DebounceTiming,
    ) -> Option<Confirmed> {
        match self.state {
            PresenceState::Idle => {
                if score >= thresholds.k_on {
                    self.debounce_start_ms = now_ms;
                    self.state = PresenceState::DebouncingOn;
                    // With a zero on-debounce this confirms in the same step.
                    return self.confirm_on_if_elapsed(now_ms, timing);
                }
                None
            }
            PresenceState::DebouncingOn => {
                if score >= thresholds.k_on {
                    self.confirm_on_if_elapsed(now_ms, timing)
                } else {
                    // Signal lost before confirmation; abort silently.
                    self.state = PresenceState::Idle;
                    None
                }
            }
            PresenceState::Present => {
                if score >= thresholds.k_on {
                    // Confidence renewal, not a transition.
                    self.last_high_confidence_ms = now_ms;
                    None
                } else if score < thresholds.k_off {
                    let since_confidence = now_ms.wrapping_sub(self.last_high_confidence_ms);
                    if since_confidence >= timing.abs_clear_delay_ms {
                        self.debounce_start_ms = now_ms;
                        self.state = PresenceState::DebouncingOff;
                        return self.confirm_off_if_elapsed(now_ms, timing);
                    }
                    // Safety hold: too soon after the last strong signal.
                    None
                } else {
                    // Inside the hysteresis band.
                    None
                }
            }
            PresenceState::DebouncingOff => {
                if score >= thresholds.k_on {
                    // Signal returned; abort the clear and renew confidence.
                    self.state = PresenceState::Present;
                    self.last_high_confidence_ms = now_ms;
                    None
                } else if score < thresholds.k_off {
                    self.confirm_off_if_elapsed(now_ms, timing)
                } else {
                    None
                }
            }
        }
    }

    fn confirm_on_if_elapsed(&mut self, now_ms: u32, timing: &DebounceTiming) -> Option<Confirmed> {
        let elapsed_ms = now_ms.wrapping_sub(self.debounce_start_ms);
        if elapsed_ms >= timing.on_debounce_ms {
            self.state = PresenceState::Present;
            self.last_high_confidence_ms = now_ms;
            Some(Confirmed::On { elapsed_ms })
        } else {
            None
        }
    }

    fn confirm_off_if_elapsed(&mut self, now_ms: u32, timing: &DebounceTiming) -> Option<Confirmed> {
        let elapsed_ms = now_ms.wrapping_sub(self.debounce_start_ms);
        if elapsed_ms >= timing.off_debounce_ms {
            self.state = PresenceState::Idle;
            Some(Confirmed::Off { elapsed_ms })
        } else {
            None
        }
    }
}

impl Default for DebounceMachine {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const THRESHOLDS: Thresholds = Thresholds {
        k_on: 4.0,
        k_off: 2.0,
    };

    fn timing() -> DebounceTiming {
        DebounceTiming::new(3_000, 5_000, 30_000)
    }

    #[test]
    fn test_initial_state_is_idle() {
        let machine = DebounceMachine::new();
        assert_eq!(machine.state(), PresenceState::Idle);
        assert!(!machine.state().occupied());
    }

    #[test]
    fn test_idle_stays_idle_below_k_on() {
        let mut machine = DebounceMachine::new();
        assert_eq!(machine.step(3.9, 0, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::Idle);
    }

    #[test]
    fn test_on_debounce_exact_timing() {
        let mut machine = DebounceMachine::new();

        assert_eq!(machine.step(4.5, 1_000, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::DebouncingOn);

        // 2999ms elapsed: still debouncing.
        assert_eq!(machine.step(4.5, 3_999, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::DebouncingOn);

        // Exactly 3000ms elapsed: confirmed.
        assert_eq!(
            machine.step(4.5, 4_000, &THRESHOLDS, &timing()),
            Some(Confirmed::On { elapsed_ms: 3_000 })
        );
        assert_eq!(machine.state(), PresenceState::Present);
        assert!(machine.state().occupied());
    }

    #[test]
    fn test_on_debounce_abort() {
        let mut machine = DebounceMachine::new();

        machine.step(4.5, 0, &THRESHOLDS, &timing());
        assert_eq!(machine.state(), PresenceState::DebouncingOn);

        // One sub-threshold reading before the timer elapses aborts.
        assert_eq!(machine.step(3.0, 1_500, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::Idle);
    }

    #[test]
    fn test_boundary_score_arms_debounce() {
        // On-side comparisons are >=, so exactly k_on arms.
        let mut machine = DebounceMachine::new();
        machine.step(4.0, 0, &THRESHOLDS, &timing());
        assert_eq!(machine.state(), PresenceState::DebouncingOn);
    }

    #[test]
    fn test_hysteresis_band_holds_present() {
        let mut machine = occupied_machine();

        // Anywhere in [k_off, k_on) leaves the state untouched.
        for score in [2.0, 2.5, 3.0, 3.99] {
            assert_eq!(machine.step(score, 10_000, &THRESHOLDS, &timing()), None);
            assert_eq!(machine.state(), PresenceState::Present);
        }
    }

    #[test]
    fn test_abs_clear_delay_blocks_early_clear() {
        let mut machine = occupied_machine(); // confirmed at t=3000

        // Low score at t=13000: only 10s since confirmation, hold.
        assert_eq!(machine.step(1.75, 13_000, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::Present);

        // Low score at t=33000: 30s elapsed, off debounce may start.
        assert_eq!(machine.step(1.75, 33_000, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::DebouncingOff);
    }

    #[test]
    fn test_confidence_refresh_restarts_clear_delay() {
        let mut machine = occupied_machine(); // confirmed at t=3000

        // Strong signal at t=20000 renews confidence.
        assert_eq!(machine.step(4.5, 20_000, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::Present);

        // 30s after the original confirmation but only 13s after renewal.
        assert_eq!(machine.step(1.75, 33_000, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::Present);

        // 30s after renewal: clear may begin.
        assert_eq!(machine.step(1.75, 50_000, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::DebouncingOff);
    }

    #[test]
    fn test_off_debounce_confirms_and_output_drops() {
        let mut machine = occupied_machine();

        machine.step(1.75, 33_000, &THRESHOLDS, &timing());
        assert_eq!(machine.state(), PresenceState::DebouncingOff);
        // Output stays true while debouncing off.
        assert!(machine.state().occupied());

        assert_eq!(machine.step(1.75, 37_999, &THRESHOLDS, &timing()), None);
        assert_eq!(
            machine.step(1.75, 38_000, &THRESHOLDS, &timing()),
            Some(Confirmed::Off { elapsed_ms: 5_000 })
        );
        assert_eq!(machine.state(), PresenceState::Idle);
        assert!(!machine.state().occupied());
    }

    #[test]
    fn test_off_debounce_abort_on_signal_return() {
        let mut machine = occupied_machine();

        machine.step(1.75, 33_000, &THRESHOLDS, &timing());
        assert_eq!(machine.state(), PresenceState::DebouncingOff);

        // Strong signal aborts the clear without an output change.
        assert_eq!(machine.step(4.5, 35_000, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::Present);

        // Confidence was renewed at 35000, so a clear at 40000 is blocked.
        assert_eq!(machine.step(1.75, 40_000, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::Present);
    }

    #[test]
    fn test_off_debounce_band_score_keeps_waiting() {
        let mut machine = occupied_machine();

        machine.step(1.75, 33_000, &THRESHOLDS, &timing());
        assert_eq!(machine.state(), PresenceState::DebouncingOff);

        // A band score neither confirms nor aborts.
        assert_eq!(machine.step(3.0, 36_000, &THRESHOLDS, &timing()), None);
        assert_eq!(machine.state(), PresenceState::DebouncingOff);

        // Low again after the original start still confirms once elapsed.
        assert_eq!(
            machine.step(1.75, 38_000, &THRESHOLDS, &timing()),
            Some(Confirmed::Off { elapsed_ms: 5_000 })
        );
    }

    #[test]
    fn test_zero_debounce_collapses_to_hysteresis() {
        let mut machine = DebounceMachine::new();
        let immediate = DebounceTiming::immediate();

        // Immediate ON within a single step.
        assert_eq!(
            machine.step(4.25, 100, &THRESHOLDS, &immediate),
            Some(Confirmed::On { elapsed_ms: 0 })
        );
        assert_eq!(machine.state(), PresenceState::Present);

        // Band score holds.
        assert_eq!(machine.step(3.0, 200, &THRESHOLDS, &immediate), None);
        assert_eq!(machine.state(), PresenceState::Present);

        // Immediate OFF.
        assert_eq!(
            machine.step(1.75, 300, &THRESHOLDS, &immediate),
            Some(Confirmed::Off { elapsed_ms: 0 })
        );
        assert_eq!(machine.state(), PresenceState::Idle);

        // Rapid oscillation is allowed with no debounce.
        assert!(machine.step(4.25, 400, &THRESHOLDS, &immediate).is_some());
        assert!(machine.step(1.75, 500, &THRESHOLDS, &immediate).is_some());
    }

    #[test]
    fn test_clock_wraparound() {
        let mut machine = DebounceMachine::new();
        let start = u32::MAX - 1_000;

        machine.step(4.5, start, &THRESHOLDS, &timing());
        assert_eq!(machine.state(), PresenceState::DebouncingOn);

        // 2500ms elapsed, counter has wrapped past zero.
        assert_eq!(
            machine.step(4.5, start.wrapping_add(2_500), &THRESHOLDS, &timing()),
            None
        );
        assert_eq!(machine.state(), PresenceState::DebouncingOn);

        // 3000ms elapsed across the wrap boundary.
        assert_eq!(
            machine.step(4.5, start.wrapping_add(3_000), &THRESHOLDS, &timing()),
            Some(Confirmed::On { elapsed_ms: 3_000 })
        );
    }

    #[test]
    fn test_inverted_thresholds_stay_defined() {
        // k_on <= k_off is accepted; the rules apply as written. With
        // k_on=2, k_off=4 a score of 3 satisfies both the on-side (>= 2)
        // check from Idle and the off-side (< 4) check from Present.
        let inverted = Thresholds {
            k_on: 2.0,
            k_off: 4.0,
        };
        let mut machine = DebounceMachine::new();
        let immediate = DebounceTiming::immediate();

        assert_eq!(
            machine.step(3.0, 0, &inverted, &immediate),
            Some(Confirmed::On { elapsed_ms: 0 })
        );
        // On-side check wins in Present: score >= k_on refreshes confidence.
        assert_eq!(machine.step(3.0, 100, &inverted, &immediate), None);
        assert_eq!(machine.state(), PresenceState::Present);
        assert_eq!(
            machine.step(1.0, 200, &inverted, &immediate),
            Some(Confirmed::Off { elapsed_ms: 0 })
        );
    }

    /// A machine driven to Present: z=4.25 at t=0, confirmed at t=3000.
    fn occupied_machine() -> DebounceMachine {
        let mut machine = DebounceMachine::new();
        machine.step(4.25, 0, &THRESHOLDS, &timing());
        let confirmed = machine.step(4.25, 3_000, &THRESHOLDS, &timing());
        assert_eq!(confirmed, Some(Confirmed::On { elapsed_ms: 3_000 }));
        machine
    }
}
