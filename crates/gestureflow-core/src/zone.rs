//! Zone gates: spatial and temporal admission of a metric.

use crate::{CoreError, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in normalized image space (inclusive bounds).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    /// Left edge
    pub x_min: f32,
    /// Right edge
    pub x_max: f32,
    /// Top edge
    pub y_min: f32,
    /// Bottom edge
    pub y_max: f32,
}

impl Zone {
    /// Create a zone from its bounds.
    pub const fn new(x_min: f32, x_max: f32, y_min: f32, y_max: f32) -> Self {
        Self {
            x_min,
            x_max,
            y_min,
            y_max,
        }
    }

    /// The whole image.
    pub const fn full() -> Self {
        Self::new(0.0, 1.0, 0.0, 1.0)
    }

    /// Central "stage": [0.25, 0.75] on both axes.
    pub const fn central() -> Self {
        Self::new(0.25, 0.75, 0.25, 0.75)
    }

    /// A vertical strip spanning the full height.
    pub const fn horizontal_band(x_min: f32, x_max: f32) -> Self {
        Self::new(x_min, x_max, 0.0, 1.0)
    }

    /// Whether `point` lies inside. Non-finite points are never inside.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.x_min
            && point.x <= self.x_max
            && point.y >= self.y_min
            && point.y <= self.y_max
    }

    /// Whether `x` lies within the horizontal bounds, ignoring y.
    pub fn contains_x(&self, x: f32) -> bool {
        x >= self.x_min && x <= self.x_max
    }

    /// Bounds must be ordered and inside [0, 1].
    pub fn validate(&self, name: &str) -> Result<()> {
        let in_unit = |v: f32| (0.0..=1.0).contains(&v);
        let ok = [self.x_min, self.x_max, self.y_min, self.y_max]
            .into_iter()
            .all(in_unit)
            && self.x_min <= self.x_max
            && self.y_min <= self.y_max;
        if ok {
            Ok(())
        } else {
            Err(CoreError::InvalidConfig(format!(
                "zone for '{}' must satisfy 0 <= min <= max <= 1, got {:?}",
                name, self
            )))
        }
    }
}

impl Default for Zone {
    fn default() -> Self {
        Self::full()
    }
}

/// A zone plus the number of consecutive frames the reference point must
/// spend inside before the metric is admitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoneGate {
    /// Admission region
    pub zone: Zone,
    /// Consecutive in-zone frames required before admission (0 = immediate)
    #[serde(default)]
    pub settle_frames: u32,
}

impl ZoneGate {
    /// Purely spatial gate.
    pub const fn new(zone: Zone) -> Self {
        Self {
            zone,
            settle_frames: 0,
        }
    }

    /// Gate on the central stage.
    pub const fn central() -> Self {
        Self::new(Zone::central())
    }

    /// Require `frames` consecutive in-zone frames.
    pub fn with_settle_frames(mut self, frames: u32) -> Self {
        self.settle_frames = frames;
        self
    }

    /// Validate the zone.
    pub fn validate(&self, name: &str) -> Result<()> {
        self.zone.validate(name)
    }
}

/// Per-channel runtime state of a [`ZoneGate`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GateState {
    inside_streak: u32,
}

impl GateState {
    /// Record one frame's reference point and report whether the metric is admitted.
    pub fn admit(&mut self, gate: &ZoneGate, point: Vec2) -> bool {
        if gate.zone.contains(point) {
            self.inside_streak = self.inside_streak.saturating_add(1);
            self.inside_streak > gate.settle_frames
        } else {
            self.inside_streak = 0;
            false
        }
    }

    /// Forget the streak (source entity lost).
    pub fn reset(&mut self) {
        self.inside_streak = 0;
    }
}
