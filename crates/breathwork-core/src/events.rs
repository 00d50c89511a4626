use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::session::{DisplayState, Phase, SessionState};

/// Every session state change produces an Event.
/// Hosts log or forward them; the per-frame visual stream is not an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    SessionStarted {
        session_id: Uuid,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    SessionPaused {
        session_id: Uuid,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    SessionResumed {
        session_id: Uuid,
        elapsed_ms: u64,
        /// Total wall-clock milliseconds spent paused so far.
        total_paused_ms: u64,
        at: DateTime<Utc>,
    },
    SessionCompleted {
        session_id: Uuid,
        total_secs: u64,
        at: DateTime<Utc>,
    },
    /// Torn down early by the host; completion never fires after this.
    SessionCancelled {
        session_id: Uuid,
        elapsed_ms: u64,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        session_id: Uuid,
        state: SessionState,
        elapsed_ms: u64,
        total_paused_ms: u64,
        phase: Phase,
        display: DisplayState,
        at: DateTime<Utc>,
    },
}

impl Event {
    pub fn session_id(&self) -> Uuid {
        match self {
            Event::SessionStarted { session_id, .. }
            | Event::SessionPaused { session_id, .. }
            | Event::SessionResumed { session_id, .. }
            | Event::SessionCompleted { session_id, .. }
            | Event::SessionCancelled { session_id, .. }
            | Event::StateSnapshot { session_id, .. } => *session_id,
        }
    }
}
