mod clock;
mod completion;
mod cycle;
mod display;
mod engine;
mod observer;

pub use clock::{Clock, ClockMode, ManualClock, MonotonicClock, SessionClock};
pub use completion::CompletionTrigger;
pub use cycle::{
    ease_in_out, CycleConfig, CyclePosition, CycleScheduler, Phase, DEFAULT_CYCLE_MS,
    DEFAULT_INHALE_MS,
};
pub use display::{format_clock, DisplayState, DisplayStateReducer};
pub use engine::{BreathingSession, SessionConfig, SessionState, DEFAULT_TOTAL_SECS};
pub use observer::SessionObserver;
