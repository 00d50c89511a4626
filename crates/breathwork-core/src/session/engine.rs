//! Breathing session state machine.
//!
//! The session is driven frame by frame. It has no internal threads or
//! timers -- the host calls `frame()` once per display refresh and applies
//! pause/resume between frames.
//!
//! ## State Transitions
//!
//! ```text
//! Idle -> Running <-> Paused
//! Idle -> Paused                  (pause before the first frame starts the clock)
//! Running -> Completed            (countdown reaches zero)
//! any -> Cancelled                (host teardown, except after Completed)
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! let mut session = BreathingSession::new(SessionConfig::default());
//! // Once per frame:
//! if let Some(event) = session.frame(clock.now_ms(), &mut observer) { /* ... */ }
//! if !session.needs_frame() { /* stop rescheduling */ }
//! ```

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::clock::SessionClock;
use super::completion::CompletionTrigger;
use super::cycle::{CycleConfig, CycleScheduler};
use super::display::{DisplayState, DisplayStateReducer};
use super::observer::SessionObserver;
use crate::error::{ConfigError, TransitionError};
use crate::events::Event;
use crate::visuals::{VisualBounds, VisualFrame};

pub const DEFAULT_TOTAL_SECS: u64 = 300;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionState {
    Idle,
    Running,
    Paused,
    Completed,
    Cancelled,
}

impl SessionState {
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionState::Completed | SessionState::Cancelled)
    }
}

/// Fixed at session construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionConfig {
    pub total_secs: u64,
    pub cycle: CycleConfig,
    pub visuals: VisualBounds,
}

impl SessionConfig {
    pub fn with_total_secs(mut self, total_secs: u64) -> Self {
        self.total_secs = total_secs;
        self
    }

    pub fn total_ms(&self) -> u64 {
        self.total_secs.saturating_mul(1_000)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.total_secs == 0 {
            return Err(ConfigError::InvalidValue {
                key: "session.total_duration_secs".into(),
                message: "must be greater than zero".into(),
            });
        }
        self.visuals.validate()
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            total_secs: DEFAULT_TOTAL_SECS,
            cycle: CycleConfig::default(),
            visuals: VisualBounds::default(),
        }
    }
}

/// One guided-breathing session.
#[derive(Debug, Clone)]
pub struct BreathingSession {
    id: Uuid,
    config: SessionConfig,
    state: SessionState,
    clock: SessionClock,
    scheduler: CycleScheduler,
    reducer: DisplayStateReducer,
    completion: CompletionTrigger,
    /// `SessionStarted` has been returned. Tracked apart from `state` since
    /// a pause can take the session out of `Idle` before any frame runs.
    announced: bool,
    released: bool,
}

impl BreathingSession {
    /// The config is taken as-is; run [`SessionConfig::validate`] first when
    /// it comes from user input.
    pub fn new(config: SessionConfig) -> Self {
        let scheduler = CycleScheduler::new(config.cycle);
        let reducer = DisplayStateReducer::new(config.total_secs, scheduler);
        Self {
            id: Uuid::new_v4(),
            config,
            state: SessionState::Idle,
            clock: SessionClock::new(),
            scheduler,
            reducer,
            completion: CompletionTrigger::new(),
            announced: false,
            released: false,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn clock(&self) -> &SessionClock {
        &self.clock
    }

    pub fn scheduler(&self) -> &CycleScheduler {
        &self.scheduler
    }

    /// Last emitted discrete state (the seed before the first frame).
    pub fn display(&self) -> DisplayState {
        self.reducer.current()
    }

    pub fn elapsed_ms(&self, now_ms: u64) -> u64 {
        self.clock.elapsed_active(now_ms)
    }

    /// Whether the host should schedule another frame.
    pub fn needs_frame(&self) -> bool {
        !self.state.is_terminal()
    }

    pub fn snapshot(&self, now_ms: u64) -> Event {
        let elapsed_ms = self.clock.elapsed_active(now_ms);
        Event::StateSnapshot {
            session_id: self.id,
            state: self.state,
            elapsed_ms,
            total_paused_ms: self.clock.total_paused_ms(),
            phase: self.scheduler.phase_at(elapsed_ms),
            display: self.display(),
            at: Utc::now(),
        }
    }

    // ── Loop body ────────────────────────────────────────────────────

    /// Evaluate one frame. Returns `Some(Event::SessionCompleted)` on the
    /// frame that finishes the session, `Some(Event::SessionStarted)` on the
    /// first frame that advances the clock.
    pub fn frame<O: SessionObserver>(&mut self, now_ms: u64, observer: &mut O) -> Option<Event> {
        match self.state {
            SessionState::Completed | SessionState::Cancelled | SessionState::Paused => {
                return None;
            }
            SessionState::Idle => {
                self.clock.start(now_ms);
                self.state = SessionState::Running;
            }
            SessionState::Running => {}
        }
        let started = if self.announced {
            None
        } else {
            self.announced = true;
            tracing::debug!(session_id = %self.id, "session started");
            Some(Event::SessionStarted {
                session_id: self.id,
                total_secs: self.config.total_secs,
                at: Utc::now(),
            })
        };

        let elapsed_ms = self.clock.observe(now_ms);
        let position = self.scheduler.schedule(elapsed_ms);
        observer.on_visuals(&VisualFrame::from_progress(
            &self.config.visuals,
            position.eased_progress,
        ));

        let Some(state) = self.reducer.observe(elapsed_ms) else {
            return started;
        };
        observer.on_display(&state);
        tracing::trace!(
            time_remaining = state.time_remaining,
            phase = %state.breath_state,
            breath_timer = state.breath_timer,
            "display state changed"
        );

        if state.time_remaining == 0 && self.completion.fire() {
            self.state = SessionState::Completed;
            observer.on_complete();
            tracing::info!(session_id = %self.id, elapsed_ms, "session completed");
            return Some(Event::SessionCompleted {
                session_id: self.id,
                total_secs: self.config.total_secs,
                at: Utc::now(),
            });
        }
        started
    }

    // ── Commands ─────────────────────────────────────────────────────

    pub fn try_pause(&mut self, now_ms: u64) -> Result<Event, TransitionError> {
        match self.state {
            SessionState::Completed | SessionState::Cancelled => Err(TransitionError::Terminal),
            SessionState::Paused => Err(TransitionError::AlreadyPaused),
            SessionState::Idle | SessionState::Running => {
                self.clock.pause(now_ms)?;
                self.state = SessionState::Paused;
                let elapsed_ms = self.clock.elapsed_active(now_ms);
                tracing::debug!(session_id = %self.id, elapsed_ms, "session paused");
                Ok(Event::SessionPaused {
                    session_id: self.id,
                    elapsed_ms,
                    at: Utc::now(),
                })
            }
        }
    }

    pub fn try_resume(&mut self, now_ms: u64) -> Result<Event, TransitionError> {
        match self.state {
            SessionState::Completed | SessionState::Cancelled => Err(TransitionError::Terminal),
            SessionState::Idle | SessionState::Running => Err(TransitionError::NotPaused),
            SessionState::Paused => {
                self.clock.resume(now_ms)?;
                self.state = SessionState::Running;
                let elapsed_ms = self.clock.elapsed_active(now_ms);
                tracing::debug!(
                    session_id = %self.id,
                    elapsed_ms,
                    total_paused_ms = self.clock.total_paused_ms(),
                    "session resumed"
                );
                Ok(Event::SessionResumed {
                    session_id: self.id,
                    elapsed_ms,
                    total_paused_ms: self.clock.total_paused_ms(),
                    at: Utc::now(),
                })
            }
        }
    }

    /// Invalid transitions are no-ops.
    pub fn pause(&mut self, now_ms: u64) -> Option<Event> {
        self.try_pause(now_ms)
            .map_err(|e| tracing::debug!(session_id = %self.id, "pause ignored: {e}"))
            .ok()
    }

    /// Invalid transitions are no-ops.
    pub fn resume(&mut self, now_ms: u64) -> Option<Event> {
        self.try_resume(now_ms)
            .map_err(|e| tracing::debug!(session_id = %self.id, "resume ignored: {e}"))
            .ok()
    }

    pub fn toggle_pause(&mut self, now_ms: u64) -> Option<Event> {
        if self.state == SessionState::Paused {
            self.resume(now_ms)
        } else {
            self.pause(now_ms)
        }
    }

    /// Tear the session down. Safe from every state; never triggers completion.
    /// Visual targets are released once, even if called repeatedly.
    pub fn cancel<O: SessionObserver>(&mut self, now_ms: u64, observer: &mut O) -> Option<Event> {
        if !self.released {
            self.released = true;
            observer.on_release(&VisualFrame::at_rest(&self.config.visuals));
        }
        if self.state.is_terminal() {
            return None;
        }
        self.state = SessionState::Cancelled;
        let elapsed_ms = self.clock.elapsed_active(now_ms);
        tracing::info!(session_id = %self.id, elapsed_ms, "session cancelled");
        Some(Event::SessionCancelled {
            session_id: self.id,
            elapsed_ms,
            at: Utc::now(),
        })
    }
}
