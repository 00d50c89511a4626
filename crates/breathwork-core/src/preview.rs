//! Point-in-time evaluation of a session without running a clock.

use serde::Serialize;

use crate::error::Result;
use crate::session::{CyclePosition, CycleScheduler, DisplayState, DisplayStateReducer, SessionConfig};
use crate::visuals::VisualFrame;

/// Everything a host would render at a given active time.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Preview {
    pub elapsed_ms: u64,
    pub position: CyclePosition,
    pub display: DisplayState,
    pub clock_label: String,
    pub visuals: VisualFrame,
    pub completed: bool,
}

impl Preview {
    /// # Errors
    ///
    /// Returns an error if `config` fails validation.
    pub fn at(config: &SessionConfig, elapsed_ms: u64) -> Result<Self> {
        config.validate()?;
        let scheduler = CycleScheduler::new(config.cycle);
        let reducer = DisplayStateReducer::new(config.total_secs, scheduler);
        let position = scheduler.schedule(elapsed_ms);
        let display = reducer.reduce(elapsed_ms);

        Ok(Self {
            elapsed_ms,
            position,
            display,
            clock_label: display.clock_label(),
            visuals: VisualFrame::from_progress(&config.visuals, position.eased_progress),
            completed: display.time_remaining == 0,
        })
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
