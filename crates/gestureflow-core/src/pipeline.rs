//! The per-frame gesture pipeline.
//!
//! `GesturePipeline::process_frame` is the only writer of the [`SignalBus`].
//! For one [`DetectionFrame`] it:
//! 1. drops non-finite landmark sets and assigns hands to slots,
//! 2. drives every scalar channel through gate, smoothing or decay,
//! 3. updates the cursor from the dominant hand,
//! 4. runs the per-slot swipe detectors,
//! 5. publishes the complete snapshot in one store.

use crate::bus::{SignalBus, SignalSnapshot};
use crate::channel::{self, ChannelId, ChannelTable, Fusion, CHANNEL_COUNT};
use crate::fusion::{Assignment, FusionConfig, HandSlots};
use crate::landmarks::{DetectionFrame, FaceLandmarks, HandLandmarks, Side};
use crate::metrics::{self, MetricThresholds};
use crate::swipe::{SwipeConfig, SwipeDetector};
use crate::zone::{GateState, ZoneGate};
use crate::{CoreError, Result};
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, trace};

/// Complete pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Smoothing, decay and gate per channel
    pub channels: ChannelTable,
    /// Extractor constants
    pub thresholds: MetricThresholds,
    /// Swipe detection
    pub swipe: SwipeConfig,
    /// Hand slot assignment
    pub fusion: FusionConfig,
    /// Cursor smoothing rate in (0, 1]; 1.0 follows the palm exactly
    pub cursor_rate: f32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            channels: ChannelTable::default(),
            thresholds: MetricThresholds::default(),
            swipe: SwipeConfig::default(),
            fusion: FusionConfig::default(),
            cursor_rate: 1.0,
        }
    }
}

impl PipelineConfig {
    /// Validate every section.
    pub fn validate(&self) -> Result<()> {
        self.channels.validate()?;
        self.thresholds.validate()?;
        self.swipe.validate()?;
        if !(self.cursor_rate > 0.0 && self.cursor_rate <= 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "cursor_rate must be in (0, 1], got {}",
                self.cursor_rate
            )));
        }
        Ok(())
    }
}

/// Result of one processed frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameOutput {
    /// The snapshot that was published
    pub snapshot: SignalSnapshot,
    /// Swipe impulse written this frame, if any
    pub swipe_impulse: Option<f32>,
}

/// What a channel's source delivered this frame.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Target {
    /// No source entity.
    Absent,
    /// Source present but outside its gate.
    Gated,
    /// Admitted metric.
    Metric(f32),
}

/// Who filled a hand slot in the previous frame.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Occupant {
    label: Side,
    assignment: Assignment,
    palm: Vec2,
}

impl Occupant {
    /// Whether `hand` is plausibly the same physical hand as this occupant.
    ///
    /// Detector labels and slot assignment carry no identity, so a slot is
    /// considered handed over when the assignment or label changes, or when
    /// another tracked hand is now closer to where this occupant was.
    fn is_same_hand(&self, hand: &HandLandmarks, assignment: Assignment, other: Option<Vec2>) -> bool {
        if assignment != self.assignment {
            return false;
        }
        if assignment != Assignment::Position && hand.side != self.label {
            return false;
        }
        let own = hand.palm().distance(self.palm);
        other.map_or(true, |other| other.distance(self.palm) >= own)
    }
}

/// Stateful pipeline; owns all per-channel state and writes the bus.
pub struct GesturePipeline {
    config: PipelineConfig,
    bus: Arc<SignalBus>,
    current: SignalSnapshot,
    gates: [[GateState; 2]; CHANNEL_COUNT],
    swipes: [SwipeDetector; 2],
    occupants: [Option<Occupant>; 2],
    cursor_tracking: bool,
}

impl GesturePipeline {
    /// Create a pipeline writing to `bus`. Fails on invalid configuration.
    pub fn new(config: PipelineConfig, bus: Arc<SignalBus>) -> Result<Self> {
        config.validate()?;
        let current = *bus.snapshot();
        Ok(Self {
            config,
            bus,
            current,
            gates: Default::default(),
            swipes: Default::default(),
            occupants: [None, None],
            cursor_tracking: false,
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// The bus this pipeline writes.
    pub fn bus(&self) -> &Arc<SignalBus> {
        &self.bus
    }

    /// Process one detection frame and publish the result.
    pub fn process_frame(&mut self, frame: &DetectionFrame) -> FrameOutput {
        let hands = frame.hands.iter().filter(|hand| {
            let finite = hand.is_finite();
            if !finite {
                debug!("Dropping non-finite {} hand landmarks", hand.side.as_str());
            }
            finite
        });
        let slots = HandSlots::resolve(
            hands,
            self.config.fusion.side_policy,
            self.config.fusion.mirror_x,
        );

        let face = frame.face.as_ref().filter(|face| {
            let finite = face.is_finite();
            if !finite {
                debug!("Dropping non-finite face landmarks");
            }
            finite
        });

        for id in ChannelId::ALL {
            let target = self.target(id, &slots, face);
            let config = self.config.channels.get(id);
            let value = self.current.get(id);
            let next = match target {
                Target::Metric(metric) => channel::smooth_toward(value, metric, config),
                Target::Gated | Target::Absent => channel::decay(value, config),
            };
            trace!("{} {:?} {:.4} -> {:.4}", id.name(), target, value, next);
            self.current.set(id, next);
        }

        self.update_cursor(&slots);
        let swipe_impulse = self.detect_swipe(&slots, frame.timestamp);

        self.current.sequence += 1;
        self.current.timestamp = frame.timestamp;
        self.current.hand_detected = slots.any();
        self.current.face_detected = face.is_some();

        self.bus.publish(self.current, swipe_impulse);
        FrameOutput {
            snapshot: self.current,
            swipe_impulse,
        }
    }

    fn target(&mut self, id: ChannelId, slots: &HandSlots<'_>, face: Option<&FaceLandmarks>) -> Target {
        let gate = self.config.channels.get(id).gate;
        let thresholds = &self.config.thresholds;
        let gates = &mut self.gates[id.index()];
        let mut seen = [false; 2];

        let target = match id.fusion() {
            Fusion::PerHand(side) => match slots.get(side) {
                Some(hand) => {
                    seen[side.index()] = true;
                    hand_target(id, hand, side, gate.as_ref(), gates, thresholds)
                }
                None => Target::Absent,
            },
            Fusion::Dominant => match slots.dominant(self.config.fusion.primary) {
                Some((side, hand)) => {
                    seen[side.index()] = true;
                    hand_target(id, hand, side, gate.as_ref(), gates, thresholds)
                }
                None => Target::Absent,
            },
            Fusion::MaxOfHands => {
                let mut fused = Target::Absent;
                for (side, hand) in slots.iter() {
                    seen[side.index()] = true;
                    fused = match (fused, hand_target(id, hand, side, gate.as_ref(), gates, thresholds)) {
                        (Target::Metric(a), Target::Metric(b)) => Target::Metric(a.max(b)),
                        (Target::Metric(a), _) | (_, Target::Metric(a)) => Target::Metric(a),
                        _ => Target::Gated,
                    };
                }
                fused
            }
            Fusion::Face => match face {
                Some(face) => {
                    seen[0] = true;
                    let admitted = gate
                        .as_ref()
                        .map_or(true, |g| gates[0].admit(g, face.center()));
                    match face_metric(id, face, thresholds) {
                        Some(metric) if admitted && metric.is_finite() => Target::Metric(metric),
                        _ => Target::Gated,
                    }
                }
                None => Target::Absent,
            },
        };

        for (state, seen) in gates.iter_mut().zip(seen) {
            if !seen {
                state.reset();
            }
        }
        target
    }

    fn update_cursor(&mut self, slots: &HandSlots<'_>) {
        let Some((_, hand)) = slots.dominant(self.config.fusion.primary) else {
            self.cursor_tracking = false;
            return;
        };

        let palm = hand.palm().clamp(Vec2::ZERO, Vec2::ONE);
        let point = self.screen_space(palm);
        self.current.cursor = if self.cursor_tracking {
            self.current.cursor + (point - self.current.cursor) * self.config.cursor_rate
        } else {
            point
        };
        self.cursor_tracking = true;
    }

    fn detect_swipe(&mut self, slots: &HandSlots<'_>, timestamp: f64) -> Option<f32> {
        // Primary last so it wins when both hands fire
        let primary = self.config.fusion.primary;
        let mut impulse = None;
        for side in [primary.opposite(), primary] {
            let detector = &mut self.swipes[side.index()];
            let occupant = &mut self.occupants[side.index()];
            let (Some(hand), Some(assignment)) = (slots.get(side), slots.assignment(side)) else {
                detector.reset();
                *occupant = None;
                continue;
            };

            let other = slots.get(side.opposite()).map(|h| h.palm());
            if let Some(previous) = occupant {
                if !previous.is_same_hand(hand, assignment, other) {
                    debug!("{} slot changed hands; restarting swipe tracking", side.as_str());
                    detector.reset();
                }
            }
            *occupant = Some(Occupant {
                label: hand.side,
                assignment,
                palm: hand.palm(),
            });

            let point = if self.config.fusion.mirror_x {
                mirror(hand.palm())
            } else {
                hand.palm()
            };
            if let Some(fired) = detector.sample(point, timestamp, &self.config.swipe) {
                impulse = Some(fired);
            }
        }
        impulse
    }

    fn screen_space(&self, point: Vec2) -> Vec2 {
        if self.config.fusion.mirror_x {
            mirror(point)
        } else {
            point
        }
    }
}

fn mirror(point: Vec2) -> Vec2 {
    Vec2::new(1.0 - point.x, point.y)
}

fn hand_target(
    id: ChannelId,
    hand: &HandLandmarks,
    side: Side,
    gate: Option<&ZoneGate>,
    gates: &mut [GateState; 2],
    thresholds: &MetricThresholds,
) -> Target {
    let admitted = gate.map_or(true, |g| gates[side.index()].admit(g, hand.palm()));
    if !admitted {
        return Target::Gated;
    }
    // Finite but huge coordinates can still overflow a distance
    match hand_metric(id, hand, thresholds) {
        Some(metric) if metric.is_finite() => Target::Metric(metric),
        _ => Target::Gated,
    }
}

fn hand_metric(id: ChannelId, hand: &HandLandmarks, t: &MetricThresholds) -> Option<f32> {
    match id {
        ChannelId::HandOpenness => Some(metrics::openness(hand, t)),
        ChannelId::Pinch => Some(metrics::pinch(hand, t)),
        ChannelId::FistClosure => Some(metrics::fist_closure(hand, t)),
        ChannelId::LeftHandHeight | ChannelId::RightHandHeight => Some(metrics::palm_height(hand)),
        ChannelId::Smile | ChannelId::EyebrowRaise => None,
    }
}

fn face_metric(id: ChannelId, face: &FaceLandmarks, t: &MetricThresholds) -> Option<f32> {
    match id {
        ChannelId::Smile => Some(metrics::smile(face, t)),
        ChannelId::EyebrowRaise => Some(metrics::eyebrow_raise(face, t)),
        _ => None,
    }
}
