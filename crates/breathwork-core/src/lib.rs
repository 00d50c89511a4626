//! # Breathwork Core Library
//!
//! This library drives a timed, guided-breathing session: a fixed-length
//! countdown synchronized to a repeating inhale/exhale cycle. It follows a
//! CLI-first philosophy -- the terminal host in `breathwork-cli` is a thin
//! layer over the same core any GUI would use.
//!
//! ## Architecture
//!
//! - **Session Clock**: active time derived from start, accumulated pause and
//!   the current pause anchor, so pausing never introduces drift
//! - **Cycle Scheduler**: pure mapping from active time to phase and eased progress
//! - **Display Reducer**: once-per-second discrete state (countdown, phase, phase timer)
//! - **Render Loop**: per-frame driver that feeds the continuous visual channel
//!   every frame and the discrete channel only on change
//!
//! ## Key Components
//!
//! - [`BreathingSession`]: Session state machine and loop body
//! - [`RenderLoop`]: tokio-driven host for a session
//! - [`VisualFrame`]: Per-frame animation record
//! - [`Config`]: Application configuration management

pub mod error;
pub mod events;
pub mod preview;
pub mod render_loop;
pub mod session;
pub mod storage;
pub mod visuals;

pub use error::{ConfigError, CoreError, TransitionError};
pub use events::Event;
pub use preview::Preview;
pub use render_loop::{RenderLoop, SessionHandle, SessionOutcome, TokioClock};
pub use session::{
    BreathingSession, Clock, CycleConfig, CyclePosition, CycleScheduler, DisplayState,
    DisplayStateReducer, ManualClock, MonotonicClock, Phase, SessionClock, SessionConfig,
    SessionObserver, SessionState,
};
pub use storage::Config;
pub use visuals::{PetalTransform, VisualBounds, VisualFrame};
