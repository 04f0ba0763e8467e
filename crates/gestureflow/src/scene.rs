//! Toy reactive scene driven by the signal bus.
//!
//! Stands in for the 3D renderer: a rotating flower, two hand lights and a
//! face light. It is the one layer that resets the swipe impulse.

use gestureflow_core::{SignalSnapshot, Vec2};

const BASE_ROTATION_SPEED: f32 = 0.2;
const ROTATION_BOOST: f32 = 1.5;
const SPIN_DAMPING: f32 = 0.95;
const BASE_SCALE: f32 = 1.0;
const MAX_GROWTH: f32 = 0.4;
const FIST_SHRINK: f32 = 0.5;
const HAND_LIGHT_BASE: f32 = 0.5;
const HAND_LIGHT_MAX: f32 = 4.0;
const HAND_LIGHT_RATE: f32 = 0.15;
const FACE_LIGHT_MAX: f32 = 3.0;
const FACE_LIGHT_RATE: f32 = 0.1;

/// Scene state advanced once per render frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    /// Flower rotation in radians
    pub rotation: f32,
    /// Extra angular velocity added by swipes
    pub spin: f32,
    /// Flower scale
    pub scale: f32,
    /// Smile color blend in [0, 1]
    pub smile_blend: f32,
    /// Left hand light intensity
    pub left_light: f32,
    /// Right hand light intensity
    pub right_light: f32,
    /// Face light intensity
    pub face_light: f32,
    /// Cursor while a hand is tracked
    pub cursor: Option<Vec2>,
}

impl Default for Scene {
    fn default() -> Self {
        Self {
            rotation: 0.0,
            spin: 0.0,
            scale: BASE_SCALE,
            smile_blend: 0.0,
            left_light: HAND_LIGHT_BASE,
            right_light: HAND_LIGHT_BASE,
            face_light: 0.0,
            cursor: None,
        }
    }
}

fn lerp(from: f32, to: f32, t: f32) -> f32 {
    from + (to - from) * t
}

impl Scene {
    /// Advance by `dt` seconds. `swipe_impulse` is the value just taken from
    /// the swipe consumer (0.0 when none was pending).
    pub fn update(&mut self, signals: &SignalSnapshot, swipe_impulse: f32, dt: f32) {
        self.spin = self.spin * SPIN_DAMPING + swipe_impulse;
        let speed = BASE_ROTATION_SPEED + signals.hand_openness * ROTATION_BOOST + self.spin;
        self.rotation = (self.rotation + dt * speed).rem_euclid(std::f32::consts::TAU);

        self.scale =
            BASE_SCALE + signals.hand_openness * MAX_GROWTH - signals.fist_closure * FIST_SHRINK;
        self.smile_blend = signals.smile;

        let hand_target = |height: f32| HAND_LIGHT_BASE + height * (HAND_LIGHT_MAX - HAND_LIGHT_BASE);
        self.left_light = lerp(
            self.left_light,
            hand_target(signals.left_hand_height),
            HAND_LIGHT_RATE,
        );
        self.right_light = lerp(
            self.right_light,
            hand_target(signals.right_hand_height),
            HAND_LIGHT_RATE,
        );

        let gesture = signals
            .smile
            .max(signals.eyebrow_raise)
            .max(signals.pinch * 0.8);
        self.face_light = lerp(self.face_light, gesture * FACE_LIGHT_MAX, FACE_LIGHT_RATE);

        self.cursor = signals.cursor();
    }
}
