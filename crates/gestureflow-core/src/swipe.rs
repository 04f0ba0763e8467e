//! Horizontal swipe detection from palm velocity.
//!
//! Each tracked hand slot owns a [`SwipeDetector`]. A sample arriving more
//! than `reacquire_gap` seconds after the previous one (or out of order) is
//! treated as a fresh acquisition: the position is recorded but no velocity
//! is computed, so a hand re-entering at a different place never fires.

use crate::zone::Zone;
use crate::{CoreError, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

/// Swipe detection parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SwipeConfig {
    /// Seconds between samples above which the next sample is a fresh acquisition
    pub reacquire_gap: f64,
    /// Minimum |velocity| in normalized widths per second
    pub velocity_threshold: f32,
    /// Impulse = velocity * intensity
    pub intensity: f32,
    /// Horizontal band the palm x must be inside for a swipe to fire; y is not checked
    pub band: Zone,
}

impl Default for SwipeConfig {
    fn default() -> Self {
        Self {
            reacquire_gap: 0.1,
            velocity_threshold: 0.35,
            intensity: 1.3,
            band: Zone::horizontal_band(0.15, 0.85),
        }
    }
}

impl SwipeConfig {
    /// Gap, threshold and intensity must be positive; band must be a valid zone.
    pub fn validate(&self) -> Result<()> {
        if !(self.reacquire_gap > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "swipe reacquire_gap must be positive, got {}",
                self.reacquire_gap
            )));
        }
        if !(self.velocity_threshold > 0.0) || !(self.intensity > 0.0) {
            return Err(CoreError::InvalidConfig(format!(
                "swipe threshold and intensity must be positive, got {} and {}",
                self.velocity_threshold, self.intensity
            )));
        }
        self.band.validate("swipe")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct Sample {
    x: f32,
    timestamp: f64,
}

/// Velocity state for one hand slot.
#[derive(Debug, Clone, Default)]
pub struct SwipeDetector {
    last: Option<Sample>,
}

impl SwipeDetector {
    /// Create a detector with no history.
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the palm position at `timestamp`; returns the signed impulse when a swipe fires.
    pub fn sample(&mut self, point: Vec2, timestamp: f64, config: &SwipeConfig) -> Option<f32> {
        let previous = self.last.replace(Sample {
            x: point.x,
            timestamp,
        });

        let previous = previous?;
        let dt = timestamp - previous.timestamp;
        if dt <= 0.0 || dt > config.reacquire_gap {
            debug!("Swipe detector reacquired after dt={:.3}s", dt);
            return None;
        }

        let velocity = ((point.x - previous.x) as f64 / dt) as f32;
        trace!("Palm velocity {:.3}", velocity);
        if !velocity.is_finite() {
            return None;
        }
        if velocity.abs() > config.velocity_threshold && config.band.contains_x(point.x) {
            let impulse = velocity * config.intensity;
            debug!("Swipe detected: velocity={:.3} impulse={:.3}", velocity, impulse);
            Some(impulse)
        } else {
            None
        }
    }

    /// Forget the last sample; the next one is a fresh acquisition.
    pub fn reset(&mut self) {
        self.last = None;
    }

    /// Whether a previous sample is held.
    pub fn is_tracking(&self) -> bool {
        self.last.is_some()
    }
}
