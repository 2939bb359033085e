//! Session recording of confirmed transitions.
//!
//! Each host run is a session identified by a UUID. Confirmed output changes
//! are appended as records and can be exported as pretty JSON for offline
//! inspection of a night's worth of decisions.

use crate::core::PresenceUpdate;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use uuid::Uuid;

/// One confirmed output change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransitionRecord {
    /// Monotonic engine clock at the transition
    pub at_ms: u32,
    /// Wall-clock time the record was made
    pub wall_time: DateTime<Utc>,
    /// The confirmed occupancy output
    pub occupied: bool,
    /// Reason text as published
    pub reason: String,
}

/// Collects transition records for one session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecorder {
    /// Unique session identifier
    pub session_id: Uuid,
    /// When the session started
    pub started: DateTime<Utc>,
    /// Confirmed transitions, in order
    pub transitions: Vec<TransitionRecord>,
}

impl SessionRecorder {
    pub fn new() -> Self {
        Self {
            session_id: Uuid::new_v4(),
            started: Utc::now(),
            transitions: Vec::new(),
        }
    }

    /// Append a confirmed output change.
    pub fn record(&mut self, update: &PresenceUpdate, at_ms: u32) {
        self.transitions.push(TransitionRecord {
            at_ms,
            wall_time: Utc::now(),
            occupied: update.occupied,
            reason: update.reason.clone(),
        });
    }

    pub fn is_empty(&self) -> bool {
        self.transitions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.transitions.len()
    }

    /// Serialize the session to pretty JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write the session to a file, creating parent directories.
    pub fn export(&self, path: &Path) -> Result<(), String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let json = self.to_json().map_err(|e| e.to_string())?;
        std::fs::write(path, json).map_err(|e| e.to_string())
    }
}

impl Default for SessionRecorder {
    fn default() -> Self {
        Self::new()
    }
}
