//! TOML-based application configuration.
//!
//! Stores:
//! - Session length and breath cycle shape
//! - Render cadence for hosts that drive their own frame loop
//! - Visual interpolation bounds for the bloom animation
//!
//! Configuration is stored at `~/.config/breathwork/config.toml`.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::data_dir;
use crate::error::ConfigError;
use crate::session::{CycleConfig, SessionConfig, DEFAULT_CYCLE_MS, DEFAULT_INHALE_MS, DEFAULT_TOTAL_SECS};
use crate::visuals::VisualBounds;

/// Session-specific configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSection {
    #[serde(default = "default_total_duration_secs")]
    pub total_duration_secs: u64,
    #[serde(default = "default_cycle_duration_ms")]
    pub cycle_duration_ms: u64,
    /// Length of the Inhale half; the rest of the cycle is Exhale.
    #[serde(default = "default_inhale_ms")]
    pub inhale_ms: u64,
}

/// Frame loop configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RenderSection {
    #[serde(default = "default_frame_interval_ms")]
    pub frame_interval_ms: u64,
}

/// Application configuration.
///
/// Serialized to/from TOML at `~/.config/breathwork/config.toml`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub render: RenderSection,
    #[serde(default)]
    pub visuals: VisualBounds,
}

fn default_total_duration_secs() -> u64 {
    DEFAULT_TOTAL_SECS
}
fn default_cycle_duration_ms() -> u64 {
    DEFAULT_CYCLE_MS
}
fn default_inhale_ms() -> u64 {
    DEFAULT_INHALE_MS
}
fn default_frame_interval_ms() -> u64 {
    16
}

impl Default for SessionSection {
    fn default() -> Self {
        Self {
            total_duration_secs: default_total_duration_secs(),
            cycle_duration_ms: default_cycle_duration_ms(),
            inhale_ms: default_inhale_ms(),
        }
    }
}

impl Default for RenderSection {
    fn default() -> Self {
        Self {
            frame_interval_ms: default_frame_interval_ms(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            session: SessionSection::default(),
            render: RenderSection::default(),
            visuals: VisualBounds::default(),
        }
    }
}

impl Config {
    fn get_json_value_by_path<'a>(
        root: &'a serde_json::Value,
        key: &str,
    ) -> Option<&'a serde_json::Value> {
        if key.is_empty() {
            return None;
        }

        let mut current = root;
        for part in key.split('.') {
            current = current.get(part)?;
        }
        Some(current)
    }

    fn set_json_value_by_path(
        root: &mut serde_json::Value,
        key: &str,
        value: &str,
    ) -> Result<(), ConfigError> {
        let unknown = || ConfigError::UnknownKey(key.to_string());
        let invalid = |message: String| ConfigError::InvalidValue {
            key: key.to_string(),
            message,
        };

        let mut parts = key.split('.').peekable();
        if key.is_empty() {
            return Err(unknown());
        }

        let mut current = root;
        while let Some(part) = parts.next() {
            if parts.peek().is_none() {
                let obj = current.as_object_mut().ok_or_else(unknown)?;
                let existing = obj.get(part).ok_or_else(unknown)?;

                let new_value = match existing {
                    serde_json::Value::Bool(_) => serde_json::Value::Bool(
                        value
                            .parse::<bool>()
                            .map_err(|e| invalid(e.to_string()))?,
                    ),
                    serde_json::Value::Number(_) => {
                        if let Ok(n) = value.parse::<u64>() {
                            serde_json::Value::Number(n.into())
                        } else if let Ok(n) = value.parse::<f64>() {
                            serde_json::Number::from_f64(n)
                                .map(serde_json::Value::Number)
                                .ok_or_else(|| invalid(format!("cannot parse '{value}' as number")))?
                        } else {
                            return Err(invalid(format!("cannot parse '{value}' as number")));
                        }
                    }
                    serde_json::Value::Object(_) | serde_json::Value::Array(_) => {
                        serde_json::from_str(value).map_err(|e| invalid(e.to_string()))?
                    }
                    _ => serde_json::Value::String(value.into()),
                };

                obj.insert(part.to_string(), new_value);
                return Ok(());
            }

            current = current.get_mut(part).ok_or_else(unknown)?;
        }

        Err(unknown())
    }

    /// Default location of the config file.
    pub fn path() -> Result<PathBuf, ConfigError> {
        Ok(data_dir()?.join("config.toml"))
    }

    /// Load from the default location, writing defaults if the file is missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file exists but cannot be parsed or
    /// fails validation, or if the default config cannot be written to disk.
    pub fn load() -> Result<Self, ConfigError> {
        let path = Self::path()?;
        if path.exists() {
            Self::load_from(&path)
        } else {
            let cfg = Self::default();
            cfg.save_to(&path)?;
            Ok(cfg)
        }
    }

    /// Load and validate a config file.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::LoadFailed {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        let cfg: Config = toml::from_str(&content)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Persist to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&Self::path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        let save_failed = |message: String| ConfigError::SaveFailed {
            path: path.to_path_buf(),
            message,
        };
        let content = toml::to_string_pretty(self).map_err(|e| save_failed(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| save_failed(e.to_string()))?;
        Ok(())
    }

    /// Load from disk, returning default on error.
    pub fn load_or_default() -> Self {
        Self::load().unwrap_or_else(|e| {
            tracing::warn!("falling back to default config: {e}");
            Self::default()
        })
    }

    /// Get a config value as string by dot-separated key.
    pub fn get(&self, key: &str) -> Option<String> {
        let json = serde_json::to_value(self).ok()?;
        let val = Self::get_json_value_by_path(&json, key)?;
        match val {
            serde_json::Value::String(s) => Some(s.clone()),
            other => Some(other.to_string()),
        }
    }

    /// Set a config value by key without persisting it.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is unknown, the value cannot be parsed,
    /// or the result fails validation. `self` is left untouched on error.
    pub fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        let mut json = serde_json::to_value(&*self).map_err(|e| ConfigError::ParseFailed(e.to_string()))?;
        Self::set_json_value_by_path(&mut json, key, value)?;
        let updated: Config = serde_json::from_value(json).map_err(|e| ConfigError::InvalidValue {
            key: key.to_string(),
            message: e.to_string(),
        })?;
        updated.validate()?;
        *self = updated;
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.render.frame_interval_ms == 0 {
            return Err(ConfigError::InvalidValue {
                key: "render.frame_interval_ms".into(),
                message: "must be greater than zero".into(),
            });
        }
        self.session_config()?.validate()
    }

    /// # Errors
    ///
    /// Returns an error if the cycle length or inhale split is out of range.
    pub fn session_config(&self) -> Result<SessionConfig, ConfigError> {
        Ok(SessionConfig {
            total_secs: self.session.total_duration_secs,
            cycle: CycleConfig::new(self.session.cycle_duration_ms, self.session.inhale_ms)?,
            visuals: self.visuals.clone(),
        })
    }

    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.render.frame_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_roundtrip() {
        let cfg = Config::default();
        let toml_str = toml::to_string_pretty(&cfg).unwrap();
        let parsed: Config = toml::from_str(&toml_str).unwrap();
        assert_eq!(parsed, cfg);
        assert_eq!(parsed.session.total_duration_secs, 300);
    }

    #[test]
    fn partial_file_fills_defaults() {
        let parsed: Config = toml::from_str("[session]\ntotal_duration_secs = 60\n").unwrap();
        assert_eq!(parsed.session.total_duration_secs, 60);
        assert_eq!(parsed.session.cycle_duration_ms, 8_000);
        assert_eq!(parsed.render.frame_interval_ms, 16);
        assert_eq!(parsed.visuals.petal_count, 6);
    }

    #[test]
    fn get_supports_dot_path_keys() {
        let cfg = Config::default();
        assert_eq!(cfg.get("session.total_duration_secs").as_deref(), Some("300"));
        assert_eq!(cfg.get("visuals.petal_scale.max").as_deref(), Some("1.25"));
        assert!(cfg.get("session.missing_key").is_none());
        assert!(cfg.get("").is_none());
    }

    #[test]
    fn set_updates_nested_number() {
        let mut cfg = Config::default();
        cfg.set("session.total_duration_secs", "120").unwrap();
        assert_eq!(cfg.session.total_duration_secs, 120);
        cfg.set("visuals.opacity.min", "0.3").unwrap();
        assert!((cfg.visuals.opacity.min - 0.3).abs() < 1e-9);
    }

    #[test]
    fn set_rejects_unknown_key() {
        let mut cfg = Config::default();
        assert!(matches!(
            cfg.set("session.nope", "1"),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn set_rejects_invalid_values_and_keeps_state() {
        let mut cfg = Config::default();
        assert!(cfg.set("session.total_duration_secs", "abc").is_err());
        assert!(cfg.set("session.inhale_ms", "9000").is_err());
        assert!(cfg.set("render.frame_interval_ms", "0").is_err());
        assert_eq!(cfg, Config::default());
    }

    #[test]
    fn session_config_maps_sections() {
        let mut cfg = Config::default();
        cfg.session.inhale_ms = 3_000;
        let session = cfg.session_config().unwrap();
        assert_eq!(session.total_secs, 300);
        assert_eq!(session.cycle.exhale_ms(), 5_000);
        assert_eq!(cfg.frame_interval(), Duration::from_millis(16));
    }

    #[test]
    fn zero_cycle_file_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "[session]\ncycle_duration_ms = 0\ninhale_ms = 0\n").unwrap();
        assert!(Config::load_from(&path).is_err());

        let mut cfg = Config::default();
        cfg.session.cycle_duration_ms = 0;
        assert!(matches!(
            cfg.session_config(),
            Err(ConfigError::InvalidValue { ref key, .. }) if key == "session.cycle_duration_ms"
        ));
        assert!(cfg.set("session.cycle_duration_ms", "0").is_err());
    }
}
