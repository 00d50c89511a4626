//! Session clock: active time with paused intervals excluded.
//!
//! Active time is always derived from three values -- the start timestamp,
//! the accumulated paused duration, and the current pause anchor -- so there
//! is no countdown integer that can drift across pauses.
//!
//! ```text
//! elapsed_active = now - start - total_paused      (Running)
//! elapsed_active = paused_at - start - total_paused (Paused, frozen)
//! ```

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use serde::{Deserialize, Serialize};

use crate::error::TransitionError;

/// Host timing source, queried once per frame.
pub trait Clock {
    /// Current reading in milliseconds. Only differences between readings matter.
    fn now_ms(&self) -> u64;
}

/// Milliseconds since construction, backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> u64 {
        self.origin.elapsed().as_millis() as u64
    }
}

/// Hand-driven clock for tests and previews. Clones share one reading.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start_ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: u64) {
        self.now.store(now_ms, Ordering::SeqCst);
    }

    pub fn advance(&self, delta_ms: u64) {
        self.now.fetch_add(delta_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// The only two legal clock modes. A resume without a pause anchor cannot be
/// expressed: the anchor lives inside the `Paused` variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum ClockMode {
    Running,
    Paused { at_ms: u64 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClock {
    /// Set on first evaluation, immutable thereafter.
    start_ms: Option<u64>,
    /// Monotonically non-decreasing.
    total_paused_ms: u64,
    mode: ClockMode,
    /// Largest elapsed value handed out so far.
    high_water_ms: u64,
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start_ms: None,
            total_paused_ms: 0,
            mode: ClockMode::Running,
            high_water_ms: 0,
        }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn is_started(&self) -> bool {
        self.start_ms.is_some()
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.mode, ClockMode::Paused { .. })
    }

    pub fn mode(&self) -> ClockMode {
        self.mode
    }

    pub fn start_ms(&self) -> Option<u64> {
        self.start_ms
    }

    pub fn total_paused_ms(&self) -> u64 {
        self.total_paused_ms
    }

    /// Active milliseconds at `now`. Frozen while paused, never below a
    /// value previously returned by [`observe`](Self::observe).
    pub fn elapsed_active(&self, now_ms: u64) -> u64 {
        let Some(start) = self.start_ms else {
            return 0;
        };
        let reference = match self.mode {
            ClockMode::Running => now_ms,
            ClockMode::Paused { at_ms } => at_ms,
        };
        let raw = reference
            .saturating_sub(start)
            .saturating_sub(self.total_paused_ms);
        raw.max(self.high_water_ms)
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Lazily anchor the session start. Later calls are no-ops.
    pub fn start(&mut self, now_ms: u64) {
        if self.start_ms.is_none() {
            self.start_ms = Some(now_ms);
        }
    }

    /// Read elapsed active time and remember it as the new floor.
    pub fn observe(&mut self, now_ms: u64) -> u64 {
        let elapsed = self.elapsed_active(now_ms);
        if self.mode == ClockMode::Running {
            if let Some(start) = self.start_ms {
                let raw = now_ms
                    .saturating_sub(start)
                    .saturating_sub(self.total_paused_ms);
                if raw < self.high_water_ms {
                    tracing::warn!(
                        raw_ms = raw,
                        clamped_ms = self.high_water_ms,
                        "clock moved backwards, holding last elapsed value"
                    );
                }
            }
        }
        self.high_water_ms = elapsed;
        elapsed
    }

    pub fn pause(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        match self.mode {
            ClockMode::Paused { .. } => Err(TransitionError::AlreadyPaused),
            ClockMode::Running => {
                self.start(now_ms);
                // Freeze at whatever the floor says, even if `now` went backwards.
                self.high_water_ms = self.elapsed_active(now_ms);
                self.mode = ClockMode::Paused { at_ms: now_ms };
                Ok(())
            }
        }
    }

    pub fn resume(&mut self, now_ms: u64) -> Result<(), TransitionError> {
        match self.mode {
            ClockMode::Running => Err(TransitionError::NotPaused),
            ClockMode::Paused { at_ms } => {
                let delta = now_ms.saturating_sub(at_ms);
                self.total_paused_ms = self.total_paused_ms.saturating_add(delta);
                self.mode = ClockMode::Running;
                Ok(())
            }
        }
    }
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unstarted_clock_reports_zero() {
        let clock = SessionClock::new();
        assert!(!clock.is_started());
        assert_eq!(clock.elapsed_active(5_000), 0);
    }

    #[test]
    fn start_is_lazy_and_immutable() {
        let mut clock = SessionClock::new();
        clock.start(1_000);
        clock.start(9_000);
        assert_eq!(clock.start_ms(), Some(1_000));
        assert_eq!(clock.elapsed_active(4_000), 3_000);
    }

    #[test]
    fn pause_freezes_elapsed() {
        let mut clock = SessionClock::new();
        clock.start(0);
        clock.pause(10_000).unwrap();
        assert_eq!(clock.elapsed_active(10_000), 10_000);
        assert_eq!(clock.elapsed_active(14_999), 10_000);
    }

    #[test]
    fn resume_excludes_paused_interval() {
        let mut clock = SessionClock::new();
        clock.start(0);
        clock.pause(10_000).unwrap();
        clock.resume(15_000).unwrap();
        assert_eq!(clock.total_paused_ms(), 5_000);
        assert_eq!(clock.elapsed_active(15_000), 10_000);
        assert_eq!(clock.elapsed_active(16_000), 11_000);
    }

    #[test]
    fn double_pause_is_rejected_without_side_effects() {
        let mut clock = SessionClock::new();
        clock.start(0);
        clock.pause(1_000).unwrap();
        assert_eq!(clock.pause(3_000), Err(TransitionError::AlreadyPaused));
        assert_eq!(clock.mode(), ClockMode::Paused { at_ms: 1_000 });
        clock.resume(4_000).unwrap();
        assert_eq!(clock.total_paused_ms(), 3_000);
    }

    #[test]
    fn resume_without_pause_is_rejected() {
        let mut clock = SessionClock::new();
        clock.start(0);
        assert_eq!(clock.resume(2_000), Err(TransitionError::NotPaused));
        assert_eq!(clock.total_paused_ms(), 0);
    }

    #[test]
    fn pausing_unstarted_clock_starts_it() {
        let mut clock = SessionClock::new();
        clock.pause(7_000).unwrap();
        clock.resume(9_000).unwrap();
        assert_eq!(clock.start_ms(), Some(7_000));
        assert_eq!(clock.elapsed_active(9_500), 500);
    }

    #[test]
    fn backwards_clock_holds_last_value() {
        let mut clock = SessionClock::new();
        clock.start(10_000);
        assert_eq!(clock.observe(12_000), 2_000);
        assert_eq!(clock.observe(11_000), 2_000);
        assert_eq!(clock.observe(5_000), 2_000);
        assert_eq!(clock.observe(12_500), 2_500);
    }

    #[test]
    fn backwards_resume_adds_no_pause_time() {
        let mut clock = SessionClock::new();
        clock.start(0);
        clock.pause(5_000).unwrap();
        clock.resume(4_000).unwrap();
        assert_eq!(clock.total_paused_ms(), 0);
        assert_eq!(clock.observe(4_000), 5_000);
    }

    #[test]
    fn manual_clock_clones_share_reading() {
        let clock = ManualClock::new(100);
        let other = clock.clone();
        clock.advance(50);
        assert_eq!(other.now_ms(), 150);
        other.set(10);
        assert_eq!(clock.now_ms(), 10);
    }
}
