//! Gesture thresholds, hysteresis latches and the guided instruction sequence.
//!
//! The pipeline produces continuous channels; this module turns them into
//! discrete "gesture performed" decisions for consumers that need them.

use crate::bus::SignalSnapshot;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Discrete gestures recognized from the signal bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureKind {
    /// Horizontal hand swipe
    Swipe,
    /// Closed fist
    Fist,
    /// Raised eyebrows
    Eyebrows,
    /// Smile
    Smile,
    /// Thumb-index pinch
    Pinch,
}

impl GestureKind {
    /// All gestures in guided sequence order.
    pub const ALL: [GestureKind; 5] = [
        GestureKind::Swipe,
        GestureKind::Fist,
        GestureKind::Eyebrows,
        GestureKind::Smile,
        GestureKind::Pinch,
    ];

    fn index(self) -> usize {
        self as usize
    }

    /// Short instruction shown to the user.
    pub fn prompt(self) -> &'static str {
        match self {
            GestureKind::Swipe => "Swipe your hand to one side",
            GestureKind::Fist => "Close your fist to shrink the flower",
            GestureKind::Eyebrows => "Raise your eyebrows to expand the light",
            GestureKind::Smile => "Smile to change the color",
            GestureKind::Pinch => "Pinch your fingers for an intimate glow",
        }
    }
}

/// Engage threshold per gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureThresholds {
    /// |swipe impulse|
    pub swipe: f32,
    /// fistClosure
    pub fist: f32,
    /// eyebrowRaise
    pub eyebrows: f32,
    /// smile
    pub smile: f32,
    /// pinch
    pub pinch: f32,
    /// A latched gesture releases below `threshold * release_ratio`
    pub release_ratio: f32,
}

impl Default for GestureThresholds {
    fn default() -> Self {
        Self {
            swipe: 0.05,
            fist: 0.7,
            eyebrows: 0.3,
            smile: 0.3,
            pinch: 0.4,
            release_ratio: 0.8,
        }
    }
}

impl GestureThresholds {
    /// Engage threshold of one gesture.
    pub fn get(&self, kind: GestureKind) -> f32 {
        match kind {
            GestureKind::Swipe => self.swipe,
            GestureKind::Fist => self.fist,
            GestureKind::Eyebrows => self.eyebrows,
            GestureKind::Smile => self.smile,
            GestureKind::Pinch => self.pinch,
        }
    }

    /// Thresholds must be positive and the release ratio in (0, 1].
    pub fn validate(&self) -> Result<()> {
        if let Some(kind) = GestureKind::ALL.into_iter().find(|&k| !(self.get(k) > 0.0)) {
            return Err(CoreError::InvalidConfig(format!(
                "gesture threshold for {:?} must be positive",
                kind
            )));
        }
        if !(self.release_ratio > 0.0 && self.release_ratio <= 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "release_ratio must be in (0, 1], got {}",
                self.release_ratio
            )));
        }
        Ok(())
    }
}

/// Gesture-relevant values read at one instant.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureReading {
    /// |swipe impulse| as peeked, not consumed
    pub swipe: f32,
    /// fistClosure
    pub fist: f32,
    /// eyebrowRaise
    pub eyebrows: f32,
    /// smile
    pub smile: f32,
    /// pinch
    pub pinch: f32,
}

impl GestureReading {
    /// Build from a snapshot and a peeked swipe impulse.
    pub fn from_snapshot(snapshot: &SignalSnapshot, swipe_impulse: f32) -> Self {
        Self {
            swipe: swipe_impulse.abs(),
            fist: snapshot.fist_closure,
            eyebrows: snapshot.eyebrow_raise,
            smile: snapshot.smile,
            pinch: snapshot.pinch,
        }
    }

    /// Value for one gesture.
    pub fn get(&self, kind: GestureKind) -> f32 {
        match kind {
            GestureKind::Swipe => self.swipe,
            GestureKind::Fist => self.fist,
            GestureKind::Eyebrows => self.eyebrows,
            GestureKind::Smile => self.smile,
            GestureKind::Pinch => self.pinch,
        }
    }
}

/// Hysteresis: engages above the threshold, releases below `threshold * release_ratio`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GestureLatch {
    engaged: bool,
}

impl GestureLatch {
    /// Feed a value; returns `Some(engaged)` when the state flips.
    pub fn update(&mut self, value: f32, threshold: f32, release_ratio: f32) -> Option<bool> {
        let next = if self.engaged {
            value >= threshold * release_ratio
        } else {
            value > threshold
        };
        (next != self.engaged).then(|| {
            self.engaged = next;
            next
        })
    }

    /// Current state.
    pub fn is_engaged(&self) -> bool {
        self.engaged
    }
}

/// A latch state change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GestureEdge {
    /// Gesture that changed
    pub kind: GestureKind,
    /// New state
    pub engaged: bool,
}

/// One latch per gesture.
#[derive(Debug, Clone, Default)]
pub struct GestureDetector {
    thresholds: GestureThresholds,
    latches: [GestureLatch; 5],
}

impl GestureDetector {
    /// Create a detector with all gestures released.
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self {
            thresholds,
            latches: Default::default(),
        }
    }

    /// Feed a reading; returns the edges it caused.
    pub fn update(&mut self, reading: &GestureReading) -> Vec<GestureEdge> {
        let mut edges = Vec::new();
        for kind in GestureKind::ALL {
            let latch = &mut self.latches[kind.index()];
            if let Some(engaged) = latch.update(
                reading.get(kind),
                self.thresholds.get(kind),
                self.thresholds.release_ratio,
            ) {
                edges.push(GestureEdge { kind, engaged });
            }
        }
        edges
    }

    /// Whether a gesture is currently latched.
    pub fn is_engaged(&self, kind: GestureKind) -> bool {
        self.latches[kind.index()].is_engaged()
    }
}

/// Minimum seconds between checks.
pub const CHECK_INTERVAL: f64 = 0.1;
/// Seconds from completion to the next gesture.
pub const ADVANCE_DELAY: f64 = 1.5;
/// Seconds checks stay suppressed after a completion.
pub const LOCKOUT: f64 = 2.0;

/// Output of [`InstructionSequence::update`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceEvent {
    /// The current gesture was performed.
    Completed(GestureKind),
    /// The sequence moved on to this gesture.
    Advanced(GestureKind),
}

/// Guided tutorial cycling through every gesture.
#[derive(Debug, Clone)]
pub struct InstructionSequence {
    thresholds: GestureThresholds,
    current: usize,
    last_check: Option<f64>,
    advance_at: Option<f64>,
}

impl InstructionSequence {
    /// Start at the first gesture.
    pub fn new(thresholds: GestureThresholds) -> Self {
        Self {
            thresholds,
            current: 0,
            last_check: None,
            advance_at: None,
        }
    }

    /// Gesture currently requested.
    pub fn current(&self) -> GestureKind {
        GestureKind::ALL[self.current]
    }

    /// Whether the current gesture has been completed and the advance is pending.
    pub fn is_success(&self) -> bool {
        self.advance_at.is_some()
    }

    /// Advance the state machine to time `now` (seconds).
    pub fn update(&mut self, now: f64, reading: &GestureReading) -> Option<SequenceEvent> {
        if let Some(at) = self.advance_at {
            if now >= at {
                self.advance_at = None;
                self.current = (self.current + 1) % GestureKind::ALL.len();
                debug!("Instruction advanced to {:?}", self.current());
                return Some(SequenceEvent::Advanced(self.current()));
            }
        }

        if self.last_check.is_some_and(|last| now - last <= CHECK_INTERVAL) {
            return None;
        }

        let kind = self.current();
        if reading.get(kind) > self.thresholds.get(kind) {
            self.advance_at = Some(now + ADVANCE_DELAY);
            self.last_check = Some(now + LOCKOUT);
            debug!("Instruction {:?} completed", kind);
            Some(SequenceEvent::Completed(kind))
        } else {
            self.last_check = Some(now);
            None
        }
    }
}
