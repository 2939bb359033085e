//! Presence Engine CLI
//!
//! Replays recorded energy traces through the engine, or watches a live
//! stream of readings from stdin.

use clap::{Parser, Subcommand};
use presence_engine::{
    config::Config,
    core::{PresenceEngine, PresenceSink},
    session::SessionRecorder,
    stats::create_shared_stats_with_persistence,
    VERSION,
};
use chrono::Utc;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "presence-engine")]
#[command(version = VERSION)]
#[command(about = "Z-score bed occupancy engine with hysteresis and timed debounce", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a recorded energy trace through the engine
    Replay {
        /// CSV trace file: one `offset_ms,energy` pair per line
        #[arg(long, short)]
        input: PathBuf,

        /// Run with all debounce stages set to zero (immediate mode)
        #[arg(long)]
        immediate: bool,

        /// Directory for the exported session JSON
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Watch live readings from stdin (one energy value per line)
    Watch,

    /// Show configuration
    Config,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay {
            input,
            immediate,
            output,
        } => {
            cmd_replay(&input, immediate, output);
        }
        Commands::Watch => {
            cmd_watch();
        }
        Commands::Config => {
            cmd_config();
        }
    }
}

/// Prints confirmed transitions as they are published.
struct ConsoleSink {
    now_ms: u32,
}

impl PresenceSink for ConsoleSink {
    fn publish_state(&mut self, occupied: bool) {
        println!(
            "[{:>10}ms] occupancy -> {}",
            self.now_ms,
            if occupied { "OCCUPIED" } else { "VACANT" }
        );
    }

    fn publish_reason(&mut self, reason: &str) {
        println!("[{:>10}ms]   reason: {reason}", self.now_ms);
    }
}

fn cmd_replay(input: &PathBuf, immediate: bool, output: Option<PathBuf>) {
    let config = Config::load().unwrap_or_default();

    let mut engine = build_engine(&config, immediate);
    print_engine_banner(&engine);

    let content = match std::fs::read_to_string(input) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading trace {input:?}: {e}");
            std::process::exit(1);
        }
    };

    let stats = create_shared_stats_with_persistence(config.data_path.join("stats.json"));
    let mut recorder = SessionRecorder::new();
    println!("Session ID: {}", recorder.session_id);
    println!();

    for (line_no, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((offset, energy)) = parse_trace_line(line) else {
            eprintln!("Warning: skipping malformed line {}: {line}", line_no + 1);
            stats.record_missing_reading();
            continue;
        };

        stats.record_reading();
        if let Some(update) = engine.on_reading(energy, offset) {
            stats.record_transition(update.occupied);
            let mut sink = ConsoleSink { now_ms: offset };
            sink.publish_state(update.occupied);
            sink.publish_reason(&update.reason);
            recorder.record(&update, offset);
        }
    }

    println!();
    println!(
        "Final state: {:?} ({})",
        engine.state(),
        if engine.occupied() { "occupied" } else { "vacant" }
    );

    // Export the session transition log
    if !recorder.is_empty() {
        let export_dir = output.unwrap_or_else(|| config.export_path.clone());
        let export_path = export_dir.join(format!(
            "session_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S")
        ));
        match recorder.export(&export_path) {
            Ok(()) => println!("Exported {} transitions to {export_path:?}", recorder.len()),
            Err(e) => eprintln!("Error exporting session: {e}"),
        }
    }

    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not save engine stats: {e}");
    }

    println!();
    println!("{}", stats.summary());
}

fn cmd_watch() {
    let config = Config::load().unwrap_or_default();
    if let Err(e) = config.ensure_directories() {
        eprintln!("Warning: Could not create directories: {e}");
    }

    let mut engine = build_engine(&config, false);
    print_engine_banner(&engine);
    println!("Reading energy values from stdin, one per line. Ctrl+C to stop.");
    println!();

    let stats = create_shared_stats_with_persistence(config.data_path.join("stats.json"));
    let mut recorder = SessionRecorder::new();

    // Reader thread feeds parsed values through a channel so the poll loop
    // can keep its own cadence.
    let (sender, receiver) = crossbeam_channel::unbounded::<f32>();
    std::thread::spawn(move || {
        let mut line = String::new();
        loop {
            line.clear();
            match std::io::stdin().read_line(&mut line) {
                Ok(0) | Err(_) => break, // EOF
                Ok(_) => {
                    if let Ok(value) = line.trim().parse::<f32>() {
                        if sender.send(value).is_err() {
                            break;
                        }
                    }
                }
            }
        }
    });

    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();
    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })
    .expect("Error setting Ctrl+C handler");

    let started = Instant::now();
    let mut latest: Option<f32> = None;

    while running.load(Ordering::SeqCst) {
        // Hold only the newest value; stale queued readings are drained.
        match receiver.recv_timeout(config.poll_interval) {
            Ok(value) => {
                latest = Some(value);
                while let Ok(newer) = receiver.try_recv() {
                    latest = Some(newer);
                }
            }
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                // stdin closed; process what we have and stop.
                running.store(false, Ordering::SeqCst);
            }
        }

        let now_ms = started.elapsed().as_millis() as u32;
        match latest {
            Some(_) => stats.record_reading(),
            None => stats.record_missing_reading(),
        }

        let mut sink = ConsoleSink { now_ms };
        if engine.run_cycle(&latest, now_ms, &mut sink) {
            let update = presence_engine::PresenceUpdate {
                occupied: engine.occupied(),
                reason: engine.last_reason().to_string(),
            };
            stats.record_transition(update.occupied);
            recorder.record(&update, now_ms);
        }
    }

    println!();
    println!("Stopping...");

    if !recorder.is_empty() {
        let export_path = config.export_path.join(format!(
            "session_{}.json",
            Utc::now().format("%Y%m%d_%H%M%S")
        ));
        match recorder.export(&export_path) {
            Ok(()) => println!("Exported {} transitions to {export_path:?}", recorder.len()),
            Err(e) => eprintln!("Error exporting session: {e}"),
        }
    }

    if let Err(e) = stats.save() {
        eprintln!("Warning: Could not save engine stats: {e}");
    }

    println!();
    println!("{}", stats.summary());
}

fn cmd_config() {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!(
        "{}",
        serde_json::to_string_pretty(&config).unwrap_or_else(|_| "Error".to_string())
    );
}

fn build_engine(config: &Config, immediate: bool) -> PresenceEngine {
    let timing = if immediate {
        presence_engine::DebounceTiming::immediate()
    } else {
        config.timing
    };
    PresenceEngine::new(config.baseline, config.thresholds, timing)
}

fn print_engine_banner(engine: &PresenceEngine) {
    println!("Presence Engine v{VERSION}");
    let baseline = engine.baseline();
    let thresholds = engine.thresholds();
    let timing = engine.timing();
    println!("  Baseline: mean={:.2}, std_dev={:.2}", baseline.mean, baseline.std_dev);
    println!("  Thresholds: k_on={:.2}, k_off={:.2}", thresholds.k_on, thresholds.k_off);
    println!(
        "  Debounce: on={}ms, off={}ms, abs_clear={}ms",
        timing.on_debounce_ms, timing.off_debounce_ms, timing.abs_clear_delay_ms
    );
}

/// Parse one `offset_ms,energy` trace line.
fn parse_trace_line(line: &str) -> Option<(u32, f32)> {
    let (offset, energy) = line.split_once(',')?;
    Some((
        offset.trim().parse::<u32>().ok()?,
        energy.trim().parse::<f32>().ok()?,
    ))
}
