//! Minimal in-memory drive of the presence engine.
//!
//! Run with: cargo run --example replay_demo

use presence_engine::{Baseline, DebounceTiming, PresenceEngine, Thresholds};

fn main() {
    let mut engine = PresenceEngine::new(
        Baseline::new(100.0, 20.0),
        Thresholds::default(),
        DebounceTiming::new(3_000, 5_000, 30_000),
    );

    // One simulated night, heavily compressed: settle in, sleep, get up.
    let trace: &[(u32, f32)] = &[
        (0, 108.0),       // empty bed noise
        (1_000, 185.0),   // person sits down
        (4_000, 190.0),   // on debounce elapses -> OCCUPIED
        (60_000, 182.0),  // sleeping, strong signal
        (85_000, 135.0),  // brief weak patch, blocked by the clear delay
        (130_000, 135.0), // weak signal, off debounce starts
        (135_000, 133.0), // off debounce elapses -> VACANT
    ];

    for &(now_ms, energy) in trace {
        if let Some(update) = engine.on_reading(energy, now_ms) {
            println!(
                "[{now_ms:>7}ms] {} ({})",
                if update.occupied { "OCCUPIED" } else { "VACANT" },
                update.reason
            );
        }
    }

    println!("final state: {:?}", engine.state());
}
