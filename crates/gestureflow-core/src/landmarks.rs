//! Landmark sets delivered by the external detector.
//!
//! A hand is always 21 points in the MediaPipe ordering, a face mesh is at
//! least [`FACE_LANDMARK_COUNT`] points. Coordinates are normalized to the
//! source image with the origin at the top-left corner; `z` is the optional
//! relative depth (0.0 when the detector does not provide one).

use crate::{CoreError, Result};
use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

// ── Hand landmark indices ──────────────────────────────────

/// Wrist.
pub const WRIST: usize = 0;
/// Thumb carpometacarpal joint.
pub const THUMB_CMC: usize = 1;
/// Thumb metacarpophalangeal joint.
pub const THUMB_MCP: usize = 2;
/// Thumb interphalangeal joint.
pub const THUMB_IP: usize = 3;
/// Thumb tip.
pub const THUMB_TIP: usize = 4;
/// Index knuckle.
pub const INDEX_MCP: usize = 5;
/// Index proximal joint.
pub const INDEX_PIP: usize = 6;
/// Index distal joint.
pub const INDEX_DIP: usize = 7;
/// Index tip.
pub const INDEX_TIP: usize = 8;
/// Middle knuckle, used as the palm reference point.
pub const MIDDLE_MCP: usize = 9;
/// Middle proximal joint.
pub const MIDDLE_PIP: usize = 10;
/// Middle distal joint.
pub const MIDDLE_DIP: usize = 11;
/// Middle tip.
pub const MIDDLE_TIP: usize = 12;
/// Ring knuckle.
pub const RING_MCP: usize = 13;
/// Ring proximal joint.
pub const RING_PIP: usize = 14;
/// Ring distal joint.
pub const RING_DIP: usize = 15;
/// Ring tip.
pub const RING_TIP: usize = 16;
/// Pinky knuckle.
pub const PINKY_MCP: usize = 17;
/// Pinky proximal joint.
pub const PINKY_PIP: usize = 18;
/// Pinky distal joint.
pub const PINKY_DIP: usize = 19;
/// Pinky tip.
pub const PINKY_TIP: usize = 20;

/// Number of points in a hand landmark set.
pub const HAND_LANDMARK_COUNT: usize = 21;

/// The four non-thumb fingertips.
pub const FINGERTIPS: [usize; 4] = [INDEX_TIP, MIDDLE_TIP, RING_TIP, PINKY_TIP];

// ── Face mesh indices ──────────────────────────────────────

/// Minimum number of points in a face mesh (468 without iris refinement).
pub const FACE_LANDMARK_COUNT: usize = 468;

/// Left mouth corner.
pub const MOUTH_LEFT: usize = 61;
/// Right mouth corner.
pub const MOUTH_RIGHT: usize = 291;
/// Left temple (face contour).
pub const TEMPLE_LEFT: usize = 234;
/// Right temple (face contour).
pub const TEMPLE_RIGHT: usize = 454;
/// Top of the forehead.
pub const FOREHEAD: usize = 10;
/// Bottom of the chin.
pub const CHIN: usize = 152;
/// Left eyebrow, upper middle.
pub const BROW_LEFT: usize = 105;
/// Right eyebrow, upper middle.
pub const BROW_RIGHT: usize = 334;
/// Left upper eyelid.
pub const EYE_TOP_LEFT: usize = 159;
/// Right upper eyelid.
pub const EYE_TOP_RIGHT: usize = 386;

// ── Side ───────────────────────────────────────────────────

/// Which hand slot a landmark set belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Left hand slot.
    Left,
    /// Right hand slot.
    Right,
}

impl Side {
    /// Both slots, left first.
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    /// Slot index (Left = 0, Right = 1).
    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    /// The other slot.
    pub fn opposite(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    /// Label used in logs.
    pub fn as_str(self) -> &'static str {
        match self {
            Side::Left => "left",
            Side::Right => "right",
        }
    }
}

// ── Landmark sets ──────────────────────────────────────────

/// One tracked hand in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct HandLandmarks {
    /// Side label reported by the detector.
    pub side: Side,
    points: [Vec3; HAND_LANDMARK_COUNT],
}

impl HandLandmarks {
    /// Wrap a fixed-size point array.
    pub fn new(side: Side, points: [Vec3; HAND_LANDMARK_COUNT]) -> Self {
        Self { side, points }
    }

    /// Build from a detector slice, which must hold exactly 21 points.
    pub fn from_slice(side: Side, points: &[Vec3]) -> Result<Self> {
        let points: [Vec3; HAND_LANDMARK_COUNT] =
            points
                .try_into()
                .map_err(|_| CoreError::InvalidLandmarkCount {
                    expected: HAND_LANDMARK_COUNT,
                    found: points.len(),
                })?;
        Ok(Self { side, points })
    }

    /// All points in detector order.
    pub fn points(&self) -> &[Vec3; HAND_LANDMARK_COUNT] {
        &self.points
    }

    /// Image-plane position of one landmark.
    pub fn xy(&self, index: usize) -> Vec2 {
        self.points[index].truncate()
    }

    /// Palm reference point (middle knuckle) used for gating, height and cursor.
    pub fn palm(&self) -> Vec2 {
        self.xy(MIDDLE_MCP)
    }

    /// True when every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }
}

/// One tracked face mesh in one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct FaceLandmarks {
    points: Vec<Vec3>,
}

impl FaceLandmarks {
    /// Build from a detector point list of at least [`FACE_LANDMARK_COUNT`] points.
    pub fn new(points: Vec<Vec3>) -> Result<Self> {
        if points.len() < FACE_LANDMARK_COUNT {
            return Err(CoreError::InvalidLandmarkCount {
                expected: FACE_LANDMARK_COUNT,
                found: points.len(),
            });
        }
        Ok(Self { points })
    }

    /// Caller guarantees at least [`FACE_LANDMARK_COUNT`] points.
    pub(crate) fn from_full_mesh(points: Vec<Vec3>) -> Self {
        debug_assert!(points.len() >= FACE_LANDMARK_COUNT);
        Self { points }
    }

    /// All points in detector order.
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Image-plane position of one landmark.
    pub fn xy(&self, index: usize) -> Vec2 {
        self.points[index].truncate()
    }

    /// Face reference point: midway between forehead and chin.
    pub fn center(&self) -> Vec2 {
        self.xy(FOREHEAD).lerp(self.xy(CHIN), 0.5)
    }

    /// True when every coordinate is a finite number.
    pub fn is_finite(&self) -> bool {
        self.points.iter().all(|p| p.is_finite())
    }
}

/// Everything the detector reported for one processed camera frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionFrame {
    /// Detector timestamp in seconds (monotonic, arbitrary origin).
    pub timestamp: f64,
    /// Zero, one or two hands.
    pub hands: Vec<HandLandmarks>,
    /// Zero or one face.
    pub face: Option<FaceLandmarks>,
}

impl DetectionFrame {
    /// An empty frame: nothing tracked at `timestamp`.
    pub fn empty(timestamp: f64) -> Self {
        Self {
            timestamp,
            ..Default::default()
        }
    }

    /// Add a hand (builder style).
    pub fn with_hand(mut self, hand: HandLandmarks) -> Self {
        self.hands.push(hand);
        self
    }

    /// Set the face (builder style).
    pub fn with_face(mut self, face: FaceLandmarks) -> Self {
        self.face = Some(face);
        self
    }
}
