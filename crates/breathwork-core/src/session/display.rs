//! Discrete display state, recomputed once per whole second.

use serde::{Deserialize, Serialize};

use super::cycle::{CycleScheduler, Phase};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DisplayState {
    /// Whole seconds left in the session.
    pub time_remaining: u64,
    pub breath_state: Phase,
    /// Whole seconds left in the current phase.
    pub breath_timer: u64,
}

impl DisplayState {
    /// What the display shows before the first frame has been evaluated.
    pub fn seed(total_secs: u64, scheduler: &CycleScheduler) -> Self {
        Self {
            time_remaining: total_secs,
            breath_state: Phase::Exhale,
            breath_timer: scheduler.config().inhale_ms().div_ceil(1_000),
        }
    }

    /// `MM:SS` rendering of [`time_remaining`](Self::time_remaining).
    pub fn clock_label(&self) -> String {
        format_clock(self.time_remaining)
    }
}

/// Zero-padded `MM:SS`. Minutes are not wrapped into hours.
pub fn format_clock(secs: u64) -> String {
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DisplayStateReducer {
    scheduler: CycleScheduler,
    total_secs: u64,
    current: DisplayState,
    /// `None` until the first observation, so the first frame always emits.
    last_emitted_secs: Option<u64>,
}

impl DisplayStateReducer {
    pub fn new(total_secs: u64, scheduler: CycleScheduler) -> Self {
        Self {
            scheduler,
            total_secs,
            current: DisplayState::seed(total_secs, &scheduler),
            last_emitted_secs: None,
        }
    }

    pub fn total_secs(&self) -> u64 {
        self.total_secs
    }

    /// The most recently emitted state, or the seed before the first frame.
    pub fn current(&self) -> DisplayState {
        self.current
    }

    /// Pure reduction. Evaluated at the whole-second floor of `elapsed_ms`,
    /// so any two instants inside the same second reduce identically.
    pub fn reduce(&self, elapsed_ms: u64) -> DisplayState {
        let whole_secs = elapsed_ms / 1_000;
        let floored_ms = whole_secs * 1_000;
        let pos = self.scheduler.schedule(floored_ms);

        DisplayState {
            time_remaining: self.total_secs.saturating_sub(whole_secs),
            breath_state: pos.phase,
            breath_timer: pos.phase_remaining_ms.div_ceil(1_000),
        }
    }

    /// Returns the new state only when the whole-second countdown changed.
    pub fn observe(&mut self, elapsed_ms: u64) -> Option<DisplayState> {
        let next = self.reduce(elapsed_ms);
        if self.last_emitted_secs == Some(next.time_remaining) {
            return None;
        }
        self.last_emitted_secs = Some(next.time_remaining);
        self.current = next;
        Some(next)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::cycle::CycleConfig;

    fn reducer() -> DisplayStateReducer {
        DisplayStateReducer::new(300, CycleScheduler::default())
    }

    #[test]
    fn seed_shows_exhale_before_first_frame() {
        let r = reducer();
        assert_eq!(
            r.current(),
            DisplayState {
                time_remaining: 300,
                breath_state: Phase::Exhale,
                breath_timer: 4,
            }
        );
    }

    #[test]
    fn breath_timer_counts_down_within_each_phase() {
        let r = reducer();
        let timers: Vec<u64> = (0..9).map(|s| r.reduce(s * 1_000).breath_timer).collect();
        assert_eq!(timers, vec![4, 3, 2, 1, 4, 3, 2, 1, 4]);
    }

    #[test]
    fn breath_timer_matches_modulo_formula_for_default_cycle() {
        let r = reducer();
        for s in 0..300u64 {
            assert_eq!(r.reduce(s * 1_000 + 500).breath_timer, 4 - (s % 4), "second {s}");
        }
    }

    #[test]
    fn phase_label_flips_at_four_seconds() {
        let r = reducer();
        assert_eq!(r.reduce(3_999).breath_state, Phase::Inhale);
        assert_eq!(r.reduce(4_000).breath_state, Phase::Exhale);
        assert_eq!(r.reduce(8_000).breath_state, Phase::Inhale);
    }

    #[test]
    fn time_remaining_saturates_at_zero() {
        let r = reducer();
        assert_eq!(r.reduce(299_000).time_remaining, 1);
        assert_eq!(r.reduce(300_000).time_remaining, 0);
        assert_eq!(r.reduce(999_999).time_remaining, 0);
    }

    #[test]
    fn observe_emits_once_per_second() {
        let mut r = reducer();
        assert!(r.observe(0).is_some());
        assert!(r.observe(16).is_none());
        assert!(r.observe(999).is_none());
        let next = r.observe(1_000).unwrap();
        assert_eq!(next.time_remaining, 299);
        assert_eq!(r.current(), next);
        assert!(r.observe(1_500).is_none());
    }

    #[test]
    fn same_second_reduces_identically_with_offset_phases() {
        let r = DisplayStateReducer::new(60, CycleScheduler::new(CycleConfig::new(7_000, 3_500).unwrap()));
        assert_eq!(r.reduce(3_000), r.reduce(3_999));
    }

    #[test]
    fn clock_label_pads_minutes_and_seconds() {
        assert_eq!(format_clock(300), "05:00");
        assert_eq!(format_clock(61), "01:01");
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(3_600), "60:00");
    }
}
