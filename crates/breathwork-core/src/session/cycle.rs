//! Breath cycle scheduling.
//!
//! A pure mapping from active milliseconds to the current phase and the
//! (eased) progress within it. The first `inhale_ms` of every cycle is
//! Inhale, the remainder is Exhale.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

pub const DEFAULT_CYCLE_MS: u64 = 8_000;
pub const DEFAULT_INHALE_MS: u64 = 4_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    Inhale,
    Exhale,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Phase::Inhale => "Inhale",
            Phase::Exhale => "Exhale",
        }
    }
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Cycle shape. Only constructible through [`CycleConfig::new`] (or
/// deserialization, which runs the same check), so `cycle_ms` is never zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawCycleConfig")]
pub struct CycleConfig {
    cycle_ms: u64,
    inhale_ms: u64,
}

#[derive(Deserialize)]
struct RawCycleConfig {
    cycle_ms: u64,
    inhale_ms: u64,
}

impl TryFrom<RawCycleConfig> for CycleConfig {
    type Error = ConfigError;

    fn try_from(raw: RawCycleConfig) -> Result<Self, Self::Error> {
        Self::new(raw.cycle_ms, raw.inhale_ms)
    }
}

impl CycleConfig {
    /// # Errors
    ///
    /// Returns an error unless `0 < inhale_ms < cycle_ms`.
    pub fn new(cycle_ms: u64, inhale_ms: u64) -> Result<Self, ConfigError> {
        let cfg = Self {
            cycle_ms,
            inhale_ms,
        };
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn cycle_ms(&self) -> u64 {
        self.cycle_ms
    }

    pub fn inhale_ms(&self) -> u64 {
        self.inhale_ms
    }

    pub fn exhale_ms(&self) -> u64 {
        self.cycle_ms.saturating_sub(self.inhale_ms)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.cycle_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "session.cycle_duration_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        if self.inhale_ms == 0 || self.inhale_ms >= self.cycle_ms {
            return Err(ConfigError::InvalidValue {
                key: "session.inhale_ms".into(),
                message: format!(
                    "must be between 1 and {} (exclusive of the cycle length)",
                    self.cycle_ms - 1
                ),
            });
        }
        Ok(())
    }
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            cycle_ms: DEFAULT_CYCLE_MS,
            inhale_ms: DEFAULT_INHALE_MS,
        }
    }
}

/// Where in the breath cycle a given instant falls.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CyclePosition {
    pub phase: Phase,
    /// Linear position in the phase: rises 0 -> 1 on Inhale, falls 1 -> 0 on Exhale.
    pub progress: f64,
    pub eased_progress: f64,
    /// Number of full cycles completed before this instant.
    pub cycle_index: u64,
    /// Milliseconds until the phase flips.
    pub phase_remaining_ms: u64,
}

/// Quadratic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out(p: f64) -> f64 {
    let p = p.clamp(0.0, 1.0);
    if p < 0.5 {
        2.0 * p * p
    } else {
        1.0 - (-2.0 * p + 2.0).powi(2) / 2.0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CycleScheduler {
    config: CycleConfig,
}

impl CycleScheduler {
    pub fn new(config: CycleConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> CycleConfig {
        self.config
    }

    pub fn phase_at(&self, elapsed_ms: u64) -> Phase {
        if elapsed_ms % self.config.cycle_ms < self.config.inhale_ms {
            Phase::Inhale
        } else {
            Phase::Exhale
        }
    }

    /// Deterministic: identical input always yields identical output.
    pub fn schedule(&self, elapsed_ms: u64) -> CyclePosition {
        let CycleConfig {
            cycle_ms,
            inhale_ms,
        } = self.config;
        let exhale_ms = self.config.exhale_ms();
        let cycle_pos = elapsed_ms % cycle_ms;

        let (phase, progress, phase_remaining_ms) = if cycle_pos < inhale_ms {
            (
                Phase::Inhale,
                cycle_pos as f64 / inhale_ms as f64,
                inhale_ms - cycle_pos,
            )
        } else {
            let into_exhale = cycle_pos - inhale_ms;
            (
                Phase::Exhale,
                1.0 - into_exhale as f64 / exhale_ms as f64,
                exhale_ms - into_exhale,
            )
        };

        CyclePosition {
            phase,
            progress,
            eased_progress: ease_in_out(progress),
            cycle_index: elapsed_ms / cycle_ms,
            phase_remaining_ms,
        }
    }
}
