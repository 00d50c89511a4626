//! Continuous visual parameters.
//!
//! Every animated value is a linear interpolation between fixed bounds,
//! driven by the eased breath progress. The bloom is a ring of petals spaced
//! evenly around a center, plus a container that breathes with them.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Inclusive interpolation range. `at(0.0) == min`, `at(1.0) == max`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    #[inline]
    pub fn at(&self, t: f64) -> f64 {
        self.min + (self.max - self.min) * t
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualBounds {
    #[serde(default = "default_petal_count")]
    pub petal_count: u32,
    #[serde(default = "default_rotation_deg")]
    pub rotation_deg: Range,
    #[serde(default = "default_expansion_px")]
    pub expansion_px: Range,
    #[serde(default = "default_petal_scale")]
    pub petal_scale: Range,
    #[serde(default = "default_opacity")]
    pub opacity: Range,
    #[serde(default = "default_container_scale")]
    pub container_scale: Range,
}

fn default_petal_count() -> u32 {
    6
}
fn default_rotation_deg() -> Range {
    Range::new(0.0, 45.0)
}
fn default_expansion_px() -> Range {
    Range::new(0.0, 65.0)
}
fn default_petal_scale() -> Range {
    Range::new(0.85, 1.25)
}
fn default_opacity() -> Range {
    Range::new(0.4, 0.9)
}
fn default_container_scale() -> Range {
    Range::new(1.0, 1.1)
}

impl Default for VisualBounds {
    fn default() -> Self {
        Self {
            petal_count: default_petal_count(),
            rotation_deg: default_rotation_deg(),
            expansion_px: default_expansion_px(),
            petal_scale: default_petal_scale(),
            opacity: default_opacity(),
            container_scale: default_container_scale(),
        }
    }
}

impl VisualBounds {
    /// Angular spacing between neighbouring petals.
    pub fn petal_spacing_deg(&self) -> f64 {
        if self.petal_count == 0 {
            return 0.0;
        }
        360.0 / f64::from(self.petal_count)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ranges = [
            ("visuals.rotation_deg", self.rotation_deg),
            ("visuals.expansion_px", self.expansion_px),
            ("visuals.petal_scale", self.petal_scale),
            ("visuals.opacity", self.opacity),
            ("visuals.container_scale", self.container_scale),
        ];
        for (key, range) in ranges {
            if !range.min.is_finite() || !range.max.is_finite() {
                return Err(ConfigError::InvalidValue {
                    key: key.into(),
                    message: "bounds must be finite".into(),
                });
            }
        }
        if !(0.0..=1.0).contains(&self.opacity.min) || !(0.0..=1.0).contains(&self.opacity.max) {
            return Err(ConfigError::InvalidValue {
                key: "visuals.opacity".into(),
                message: "opacity bounds must lie in [0, 1]".into(),
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PetalTransform {
    /// Resting slot angle plus the shared rotation.
    pub angle_deg: f64,
    /// Outward translation along `angle_deg`.
    pub expansion_px: f64,
    pub scale: f64,
    pub opacity: f64,
}

/// Plain per-frame record handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualFrame {
    pub eased_progress: f64,
    pub container_scale: f64,
    pub petals: Vec<PetalTransform>,
}

impl VisualFrame {
    pub fn from_progress(bounds: &VisualBounds, eased_progress: f64) -> Self {
        let t = eased_progress.clamp(0.0, 1.0);
        let rotation = bounds.rotation_deg.at(t);
        let spacing = bounds.petal_spacing_deg();

        let petals = (0..bounds.petal_count)
            .map(|i| PetalTransform {
                angle_deg: f64::from(i) * spacing + rotation,
                expansion_px: bounds.expansion_px.at(t),
                scale: bounds.petal_scale.at(t),
                opacity: bounds.opacity.at(t),
            })
            .collect();

        Self {
            eased_progress: t,
            container_scale: bounds.container_scale.at(t),
            petals,
        }
    }

    /// Fully contracted frame, used to release animation targets on teardown.
    pub fn at_rest(bounds: &VisualBounds) -> Self {
        Self::from_progress(bounds, 0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn contracted_frame_uses_lower_bounds() {
        let frame = VisualFrame::at_rest(&VisualBounds::default());
        assert_eq!(frame.petals.len(), 6);
        assert!(close(frame.container_scale, 1.0));
        let first = frame.petals[0];
        assert!(close(first.angle_deg, 0.0));
        assert!(close(first.expansion_px, 0.0));
        assert!(close(first.scale, 0.85));
        assert!(close(first.opacity, 0.4));
        assert!(close(frame.petals[3].angle_deg, 180.0));
    }

    #[test]
    fn full_bloom_uses_upper_bounds() {
        let frame = VisualFrame::from_progress(&VisualBounds::default(), 1.0);
        assert!(close(frame.container_scale, 1.1));
        let second = frame.petals[1];
        assert!(close(second.angle_deg, 60.0 + 45.0));
        assert!(close(second.expansion_px, 65.0));
        assert!(close(second.scale, 1.25));
        assert!(close(second.opacity, 0.9));
    }

    #[test]
    fn half_progress_interpolates_linearly() {
        let frame = VisualFrame::from_progress(&VisualBounds::default(), 0.5);
        assert!(close(frame.petals[0].scale, 1.05));
        assert!(close(frame.petals[0].opacity, 0.65));
        assert!(close(frame.container_scale, 1.05));
    }

    #[test]
    fn zero_petals_still_drives_container() {
        let bounds = VisualBounds {
            petal_count: 0,
            ..VisualBounds::default()
        };
        let frame = VisualFrame::from_progress(&bounds, 1.0);
        assert!(frame.petals.is_empty());
        assert!(close(frame.container_scale, 1.1));
    }

    #[test]
    fn opacity_outside_unit_range_is_rejected() {
        let bounds = VisualBounds {
            opacity: Range::new(0.2, 1.5),
            ..VisualBounds::default()
        };
        assert!(bounds.validate().is_err());
        assert!(VisualBounds::default().validate().is_ok());
    }
}
