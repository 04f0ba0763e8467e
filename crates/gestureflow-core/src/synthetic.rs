//! Synthetic landmark sets.
//!
//! Builds hands and faces whose extracted metrics equal the requested values
//! under a given [`MetricThresholds`]. Used by the scripted demo detector and
//! by tests; no camera or model is involved.

use crate::landmarks::{
    FaceLandmarks, HandLandmarks, Side, BROW_LEFT, BROW_RIGHT, CHIN, EYE_TOP_LEFT,
    EYE_TOP_RIGHT, FACE_LANDMARK_COUNT, FOREHEAD, HAND_LANDMARK_COUNT, INDEX_DIP, INDEX_MCP,
    INDEX_PIP, INDEX_TIP, MIDDLE_DIP, MIDDLE_MCP, MIDDLE_PIP, MIDDLE_TIP, MOUTH_LEFT,
    MOUTH_RIGHT, PINKY_DIP, PINKY_MCP, PINKY_PIP, PINKY_TIP, RING_DIP, RING_MCP, RING_PIP,
    RING_TIP, TEMPLE_LEFT, TEMPLE_RIGHT, THUMB_CMC, THUMB_IP, THUMB_MCP, THUMB_TIP, WRIST,
};
use crate::metrics::MetricThresholds;
use glam::{Vec2, Vec3};

/// Knuckle offsets from the palm reference, in units of the hand scale.
/// Each entry is (mcp, pip, dip, tip, offset).
const FINGERS: [(usize, usize, usize, usize, Vec2); 4] = [
    (INDEX_MCP, INDEX_PIP, INDEX_DIP, INDEX_TIP, Vec2::new(-0.25, 0.05)),
    (MIDDLE_MCP, MIDDLE_PIP, MIDDLE_DIP, MIDDLE_TIP, Vec2::ZERO),
    (RING_MCP, RING_PIP, RING_DIP, RING_TIP, Vec2::new(0.22, 0.03)),
    (PINKY_MCP, PINKY_PIP, PINKY_DIP, PINKY_TIP, Vec2::new(0.42, 0.12)),
];

/// A hand pose described by the metrics it should produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticHand {
    /// Detector side label.
    pub side: Side,
    /// Palm reference point (middle knuckle) in normalized image space.
    pub palm: Vec2,
    /// Wrist to middle-knuckle distance.
    pub scale: f32,
    /// Requested openness in [0, 1].
    pub openness: f32,
    /// Requested pinch in [0, 1].
    pub pinch: f32,
}

impl SyntheticHand {
    /// A relaxed, half-open hand in the middle of the image.
    pub fn new(side: Side) -> Self {
        Self {
            side,
            palm: Vec2::new(0.5, 0.5),
            scale: 0.15,
            openness: 0.5,
            pinch: 0.0,
        }
    }

    /// Move the palm reference point.
    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.palm = Vec2::new(x, y);
        self
    }

    /// Change the apparent hand size (distance from the camera).
    pub fn with_scale(mut self, scale: f32) -> Self {
        self.scale = scale;
        self
    }

    /// Requested openness.
    pub fn with_openness(mut self, openness: f32) -> Self {
        self.openness = openness.clamp(0.0, 1.0);
        self
    }

    /// Requested pinch.
    pub fn with_pinch(mut self, pinch: f32) -> Self {
        self.pinch = pinch.clamp(0.0, 1.0);
        self
    }

    /// Generate the 21 landmarks.
    pub fn landmarks(&self, t: &MetricThresholds) -> HandLandmarks {
        let s = self.scale;
        let wrist = self.palm + Vec2::new(0.0, s);
        let reach = (t.openness_closed_ratio + self.openness * t.openness_span) * s;

        let mut points = [Vec2::ZERO; HAND_LANDMARK_COUNT];
        points[WRIST] = wrist;

        for (mcp, pip, dip, tip, offset) in FINGERS {
            let knuckle = self.palm + offset * s;
            let dir = (knuckle - wrist).normalize_or_zero();
            let fingertip = wrist + dir * reach;
            points[mcp] = knuckle;
            points[pip] = knuckle.lerp(fingertip, 1.0 / 3.0);
            points[dip] = knuckle.lerp(fingertip, 2.0 / 3.0);
            points[tip] = fingertip;
        }

        let gap = (1.0 - self.pinch) * t.pinch_max_ratio * s;
        let thumb_tip = points[INDEX_TIP] - Vec2::new(gap, 0.0);
        points[THUMB_CMC] = wrist + Vec2::new(-0.2, -0.2) * s;
        points[THUMB_MCP] = wrist + Vec2::new(-0.35, -0.45) * s;
        points[THUMB_IP] = points[THUMB_MCP].lerp(thumb_tip, 0.5);
        points[THUMB_TIP] = thumb_tip;

        HandLandmarks::new(self.side, points.map(|p| p.extend(0.0)))
    }
}

/// A face described by the metrics it should produce.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SyntheticFace {
    /// Face center in normalized image space.
    pub center: Vec2,
    /// Temple to temple distance.
    pub width: f32,
    /// Forehead to chin distance.
    pub height: f32,
    /// Requested smile in [0, 1].
    pub smile: f32,
    /// Requested eyebrow raise in [0, 1].
    pub eyebrow_raise: f32,
}

impl Default for SyntheticFace {
    fn default() -> Self {
        Self::new()
    }
}

impl SyntheticFace {
    /// A neutral face in the middle of the image.
    pub fn new() -> Self {
        Self {
            center: Vec2::new(0.5, 0.45),
            width: 0.3,
            height: 0.4,
            smile: 0.0,
            eyebrow_raise: 0.0,
        }
    }

    /// Requested smile.
    pub fn with_smile(mut self, smile: f32) -> Self {
        self.smile = smile.clamp(0.0, 1.0);
        self
    }

    /// Requested eyebrow raise.
    pub fn with_eyebrow_raise(mut self, raise: f32) -> Self {
        self.eyebrow_raise = raise.clamp(0.0, 1.0);
        self
    }

    /// Generate a full face mesh; points not used by the extractors sit at the center.
    pub fn landmarks(&self, t: &MetricThresholds) -> FaceLandmarks {
        let c = self.center;
        let (w, h) = (self.width, self.height);
        let mut points = vec![c; FACE_LANDMARK_COUNT];

        points[TEMPLE_LEFT] = c + Vec2::new(-w / 2.0, 0.0);
        points[TEMPLE_RIGHT] = c + Vec2::new(w / 2.0, 0.0);
        points[FOREHEAD] = c + Vec2::new(0.0, -h / 2.0);
        points[CHIN] = c + Vec2::new(0.0, h / 2.0);

        let mouth = w * (t.smile_low + self.smile * (t.smile_high - t.smile_low));
        points[MOUTH_LEFT] = c + Vec2::new(-mouth / 2.0, 0.25 * h);
        points[MOUTH_RIGHT] = c + Vec2::new(mouth / 2.0, 0.25 * h);

        let gap = h * (t.eyebrow_low + self.eyebrow_raise * (t.eyebrow_high - t.eyebrow_low));
        points[EYE_TOP_LEFT] = c + Vec2::new(-0.2 * w, -0.1 * h);
        points[EYE_TOP_RIGHT] = c + Vec2::new(0.2 * w, -0.1 * h);
        points[BROW_LEFT] = points[EYE_TOP_LEFT] - Vec2::new(0.0, gap);
        points[BROW_RIGHT] = points[EYE_TOP_RIGHT] - Vec2::new(0.0, gap);

        let points: Vec<Vec3> = points.into_iter().map(|p| p.extend(0.0)).collect();
        FaceLandmarks::from_full_mesh(points)
    }
}
