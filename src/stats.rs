//! Engine session statistics.
//!
//! Tracks what the engine has processed and decided over a session, without
//! retaining any readings. Counters are atomic so the host's signal handler
//! or a status command can read them while the poll loop runs.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Cumulative counters for the current session.
#[derive(Debug)]
pub struct EngineStats {
    /// Readings scored and stepped through the machine
    readings_processed: AtomicU64,
    /// Poll cycles where the source had no value
    readings_missing: AtomicU64,
    /// Confirmed vacant -> occupied transitions
    on_transitions: AtomicU64,
    /// Confirmed occupied -> vacant transitions
    off_transitions: AtomicU64,
    /// Session start time
    session_start: DateTime<Utc>,
    /// Path for persisting stats
    persist_path: Option<PathBuf>,
}

impl EngineStats {
    pub fn new() -> Self {
        Self {
            readings_processed: AtomicU64::new(0),
            readings_missing: AtomicU64::new(0),
            on_transitions: AtomicU64::new(0),
            off_transitions: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create stats with persistence, resuming counters from a previous
    /// session when the file exists.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut stats = Self::new();
        stats.persist_path = Some(path);

        if let Err(e) = stats.load() {
            eprintln!("Note: Could not load previous engine stats: {e}");
        }

        stats
    }

    pub fn record_reading(&self) {
        self.readings_processed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_missing_reading(&self) {
        self.readings_missing.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_transition(&self, occupied: bool) {
        if occupied {
            self.on_transitions.fetch_add(1, Ordering::Relaxed);
        } else {
            self.off_transitions.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Get the current statistics.
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            readings_processed: self.readings_processed.load(Ordering::Relaxed),
            readings_missing: self.readings_missing.load(Ordering::Relaxed),
            on_transitions: self.on_transitions.load(Ordering::Relaxed),
            off_transitions: self.off_transitions.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds() as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.snapshot();
        format!(
            "Session Statistics:\n\
             - Readings processed: {}\n\
             - Cycles without a reading: {}\n\
             - ON transitions confirmed: {}\n\
             - OFF transitions confirmed: {}\n\
             - Session duration: {} seconds",
            stats.readings_processed,
            stats.readings_missing,
            stats.on_transitions,
            stats.off_transitions,
            stats.session_duration_secs
        )
    }

    /// Save stats to disk.
    pub fn save(&self) -> Result<(), String> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }

        let json = serde_json::to_string_pretty(&self.snapshot()).map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())
    }

    /// Load previously persisted stats into the counters.
    fn load(&self) -> Result<(), String> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path).map_err(|e| e.to_string())?;
        let snapshot: StatsSnapshot = serde_json::from_str(&content).map_err(|e| e.to_string())?;

        self.readings_processed
            .store(snapshot.readings_processed, Ordering::Relaxed);
        self.readings_missing
            .store(snapshot.readings_missing, Ordering::Relaxed);
        self.on_transitions
            .store(snapshot.on_transitions, Ordering::Relaxed);
        self.off_transitions
            .store(snapshot.off_transitions, Ordering::Relaxed);
        Ok(())
    }
}

impl Default for EngineStats {
    fn default() -> Self {
        Self::new()
    }
}

/// A point-in-time view of the counters, serializable for persistence.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatsSnapshot {
    pub readings_processed: u64,
    pub readings_missing: u64,
    pub on_transitions: u64,
    pub off_transitions: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

/// Shared handle for use across the poll loop and shutdown paths.
pub type SharedEngineStats = Arc<EngineStats>;

/// Create a shared stats handle with persistence.
pub fn create_shared_stats_with_persistence(path: PathBuf) -> SharedEngineStats {
    Arc::new(EngineStats::with_persistence(path))
}
