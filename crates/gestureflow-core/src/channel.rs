//! Channel table and the generic smoothing routine.
//!
//! Every scalar channel is updated by exactly one of two paths per detection
//! frame:
//! - **smoothing** toward a freshly extracted metric, with separate rise and
//!   fall rates, or
//! - **decay**, a plain multiplication by the channel's decay factor, when
//!   the source entity is absent or its reference point is outside the gate.

use crate::landmarks::Side;
use crate::zone::ZoneGate;
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Number of scalar channels.
pub const CHANNEL_COUNT: usize = 7;

/// The scalar [0, 1] channels on the signal bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelId {
    /// Max of both hands' openness ("touch").
    HandOpenness,
    /// Thumb-index pinch of the dominant hand.
    Pinch,
    /// Fist closure of the dominant hand.
    FistClosure,
    /// Smile.
    Smile,
    /// Eyebrow raise.
    EyebrowRaise,
    /// Palm height of the left slot.
    LeftHandHeight,
    /// Palm height of the right slot.
    RightHandHeight,
}

/// How a channel is derived from the tracked entities.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fusion {
    /// Written only from the hand in this slot.
    PerHand(Side),
    /// Written from the primary hand, or the other one when the primary is absent.
    Dominant,
    /// Maximum over every hand that passes the gate.
    MaxOfHands,
    /// Written from the face.
    Face,
}

impl ChannelId {
    /// All scalar channels in storage order.
    pub const ALL: [ChannelId; CHANNEL_COUNT] = [
        ChannelId::HandOpenness,
        ChannelId::Pinch,
        ChannelId::FistClosure,
        ChannelId::Smile,
        ChannelId::EyebrowRaise,
        ChannelId::LeftHandHeight,
        ChannelId::RightHandHeight,
    ];

    /// Storage index.
    pub fn index(self) -> usize {
        self as usize
    }

    /// Fusion mode; fixed per channel because the gestures depend on it.
    pub fn fusion(self) -> Fusion {
        match self {
            ChannelId::HandOpenness => Fusion::MaxOfHands,
            ChannelId::Pinch | ChannelId::FistClosure => Fusion::Dominant,
            ChannelId::Smile | ChannelId::EyebrowRaise => Fusion::Face,
            ChannelId::LeftHandHeight => Fusion::PerHand(Side::Left),
            ChannelId::RightHandHeight => Fusion::PerHand(Side::Right),
        }
    }

    /// Public channel name.
    pub fn name(self) -> &'static str {
        match self {
            ChannelId::HandOpenness => "handOpenness",
            ChannelId::Pinch => "pinch",
            ChannelId::FistClosure => "fistClosure",
            ChannelId::Smile => "smile",
            ChannelId::EyebrowRaise => "eyebrowRaise",
            ChannelId::LeftHandHeight => "leftHandHeight",
            ChannelId::RightHandHeight => "rightHandHeight",
        }
    }
}

/// Smoothing, decay and gating policy of one channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChannelConfig {
    /// Rate used when the target is above the current value, in (0, 1].
    pub rise_rate: f32,
    /// Rate used when the target is at or below the current value, in (0, 1].
    pub fall_rate: f32,
    /// Per-frame multiplier while the source is absent or gated out, in (0, 1).
    pub decay: f32,
    /// Optional region the reference point must be inside.
    #[serde(default)]
    pub gate: Option<ZoneGate>,
}

impl ChannelConfig {
    /// Ungated channel.
    pub const fn new(rise_rate: f32, fall_rate: f32, decay: f32) -> Self {
        Self {
            rise_rate,
            fall_rate,
            decay,
            gate: None,
        }
    }

    /// Attach a gate.
    pub fn with_gate(mut self, gate: ZoneGate) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Check rate and decay ranges.
    pub fn validate(&self, name: &str) -> Result<()> {
        let rate_ok = |r: f32| r > 0.0 && r <= 1.0;
        if !rate_ok(self.rise_rate) || !rate_ok(self.fall_rate) {
            return Err(CoreError::InvalidConfig(format!(
                "channel '{}': rates must be in (0, 1], got rise={} fall={}",
                name, self.rise_rate, self.fall_rate
            )));
        }
        if !(self.decay > 0.0 && self.decay < 1.0) {
            return Err(CoreError::InvalidConfig(format!(
                "channel '{}': decay must be in (0, 1), got {}",
                name, self.decay
            )));
        }
        if let Some(gate) = &self.gate {
            gate.validate(name)?;
        }
        Ok(())
    }
}

/// One [`ChannelConfig`] per scalar channel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChannelTable {
    /// `handOpenness`
    pub hand_openness: ChannelConfig,
    /// `pinch`
    pub pinch: ChannelConfig,
    /// `fistClosure`
    pub fist_closure: ChannelConfig,
    /// `smile`
    pub smile: ChannelConfig,
    /// `eyebrowRaise`
    pub eyebrow_raise: ChannelConfig,
    /// `leftHandHeight`
    pub left_hand_height: ChannelConfig,
    /// `rightHandHeight`
    pub right_hand_height: ChannelConfig,
}

impl Default for ChannelTable {
    fn default() -> Self {
        Self {
            hand_openness: ChannelConfig::new(0.15, 0.40, 0.95),
            pinch: ChannelConfig::new(0.20, 0.40, 0.95),
            fist_closure: ChannelConfig::new(0.35, 0.35, 0.95).with_gate(ZoneGate::central()),
            smile: ChannelConfig::new(0.10, 0.40, 0.90),
            eyebrow_raise: ChannelConfig::new(0.10, 0.40, 0.90),
            left_hand_height: ChannelConfig::new(0.20, 0.20, 0.95),
            right_hand_height: ChannelConfig::new(0.20, 0.20, 0.95),
        }
    }
}

impl ChannelTable {
    /// Policy for one channel.
    pub fn get(&self, id: ChannelId) -> &ChannelConfig {
        match id {
            ChannelId::HandOpenness => &self.hand_openness,
            ChannelId::Pinch => &self.pinch,
            ChannelId::FistClosure => &self.fist_closure,
            ChannelId::Smile => &self.smile,
            ChannelId::EyebrowRaise => &self.eyebrow_raise,
            ChannelId::LeftHandHeight => &self.left_hand_height,
            ChannelId::RightHandHeight => &self.right_hand_height,
        }
    }

    /// Mutable policy for one channel.
    pub fn get_mut(&mut self, id: ChannelId) -> &mut ChannelConfig {
        match id {
            ChannelId::HandOpenness => &mut self.hand_openness,
            ChannelId::Pinch => &mut self.pinch,
            ChannelId::FistClosure => &mut self.fist_closure,
            ChannelId::Smile => &mut self.smile,
            ChannelId::EyebrowRaise => &mut self.eyebrow_raise,
            ChannelId::LeftHandHeight => &mut self.left_hand_height,
            ChannelId::RightHandHeight => &mut self.right_hand_height,
        }
    }

    /// Validate every entry.
    pub fn validate(&self) -> Result<()> {
        ChannelId::ALL
            .iter()
            .try_for_each(|&id| self.get(id).validate(id.name()))
    }
}

/// Move `value` toward `target` by the rise or fall rate; result clamped to [0, 1].
///
/// With a rate in (0, 1] the step never overshoots, so repeated calls with the
/// same target converge monotonically.
pub fn smooth_toward(value: f32, target: f32, config: &ChannelConfig) -> f32 {
    let rate = if target > value {
        config.rise_rate
    } else {
        config.fall_rate
    };
    (value + (target - value) * rate).clamp(0.0, 1.0)
}

/// Multiply by the channel's decay factor.
pub fn decay(value: f32, config: &ChannelConfig) -> f32 {
    (value * config.decay).clamp(0.0, 1.0)
}
