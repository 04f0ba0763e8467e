//! Metric extractors: pure functions from one landmark set to a scalar.
//!
//! Every hand metric is a ratio against the wrist to middle-knuckle distance
//! so it does not change as the hand moves toward or away from the camera.
//! Face metrics are normalized by the face width or height for the same
//! reason. All constants live in [`MetricThresholds`].

use crate::landmarks::{
    FaceLandmarks, HandLandmarks, BROW_LEFT, BROW_RIGHT, CHIN, EYE_TOP_LEFT, EYE_TOP_RIGHT,
    FINGERTIPS, FOREHEAD, INDEX_TIP, MIDDLE_MCP, MIDDLE_TIP, MOUTH_LEFT, MOUTH_RIGHT,
    TEMPLE_LEFT, TEMPLE_RIGHT, THUMB_TIP, WRIST,
};
use crate::{CoreError, Result};
use serde::{Deserialize, Serialize};

/// Substitute denominator for degenerate reference distances.
pub const EPSILON: f32 = 1e-3;

/// Empirical constants used by the extractors.
///
/// These need per-deployment tuning, so they are data rather than code.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricThresholds {
    /// Tip/knuckle ratio of a closed hand (openness 0).
    pub openness_closed_ratio: f32,
    /// Ratio span from closed to fully open (openness 1 at closed + span).
    pub openness_span: f32,
    /// Thumb-index gap ratio at which pinch reaches 0.
    pub pinch_max_ratio: f32,
    /// Average fingertip-to-wrist ratio of an open hand (fist 0).
    pub fist_open_ratio: f32,
    /// Average fingertip-to-wrist ratio of a closed fist (fist 1).
    pub fist_closed_ratio: f32,
    /// Mouth-width / face-width ratio of a neutral mouth.
    pub smile_low: f32,
    /// Mouth-width / face-width ratio of a full smile.
    pub smile_high: f32,
    /// Brow-eye gap / face-height ratio at rest.
    pub eyebrow_low: f32,
    /// Brow-eye gap / face-height ratio fully raised.
    pub eyebrow_high: f32,
}

impl Default for MetricThresholds {
    fn default() -> Self {
        Self {
            openness_closed_ratio: 1.1,
            openness_span: 0.6,
            pinch_max_ratio: 0.35,
            fist_open_ratio: 1.7,
            fist_closed_ratio: 1.1,
            smile_low: 0.40,
            smile_high: 0.50,
            eyebrow_low: 0.085,
            eyebrow_high: 0.115,
        }
    }
}

impl MetricThresholds {
    /// Reject spans that would invert or collapse a mapping.
    pub fn validate(&self) -> Result<()> {
        let checks = [
            ("openness_span", self.openness_span > 0.0),
            ("pinch_max_ratio", self.pinch_max_ratio > 0.0),
            (
                "fist_open_ratio",
                self.fist_open_ratio > self.fist_closed_ratio,
            ),
            ("smile_high", self.smile_high > self.smile_low),
            ("eyebrow_high", self.eyebrow_high > self.eyebrow_low),
        ];
        for (name, ok) in checks {
            if !ok {
                return Err(CoreError::InvalidConfig(format!(
                    "metric threshold '{}' is out of range",
                    name
                )));
            }
        }
        Ok(())
    }
}

/// Divide, substituting [`EPSILON`] for a near-zero denominator.
pub fn safe_ratio(numerator: f32, denominator: f32) -> f32 {
    if denominator.abs() < EPSILON {
        numerator / EPSILON
    } else {
        numerator / denominator
    }
}

/// Map `value` from `[low, high]` onto `[0, 1]`, clamped.
pub fn linear_map(value: f32, low: f32, high: f32) -> f32 {
    safe_ratio(value - low, high - low).clamp(0.0, 1.0)
}

fn hand_reference(hand: &HandLandmarks) -> f32 {
    hand.xy(WRIST).distance(hand.xy(MIDDLE_MCP))
}

/// Hand openness: 0 at a closed fist, 1 with the fingers fully extended.
pub fn openness(hand: &HandLandmarks, t: &MetricThresholds) -> f32 {
    let tip = hand.xy(WRIST).distance(hand.xy(MIDDLE_TIP));
    let ratio = safe_ratio(tip, hand_reference(hand));
    linear_map(
        ratio,
        t.openness_closed_ratio,
        t.openness_closed_ratio + t.openness_span,
    )
}

/// Pinch: 1 when the thumb and index tips touch.
pub fn pinch(hand: &HandLandmarks, t: &MetricThresholds) -> f32 {
    let gap = hand.xy(THUMB_TIP).distance(hand.xy(INDEX_TIP));
    let ratio = safe_ratio(gap, hand_reference(hand));
    (1.0 - safe_ratio(ratio, t.pinch_max_ratio)).clamp(0.0, 1.0)
}

/// Fist closure: 1 when all four fingertips are curled against the palm.
pub fn fist_closure(hand: &HandLandmarks, t: &MetricThresholds) -> f32 {
    let wrist = hand.xy(WRIST);
    let total: f32 = FINGERTIPS
        .iter()
        .map(|&tip| wrist.distance(hand.xy(tip)))
        .sum();
    let ratio = safe_ratio(total / FINGERTIPS.len() as f32, hand_reference(hand));
    linear_map(ratio, t.fist_open_ratio, t.fist_closed_ratio)
}

/// Palm height: 1 at the top edge of the image, 0 at the bottom.
pub fn palm_height(hand: &HandLandmarks) -> f32 {
    (1.0 - hand.palm().y).clamp(0.0, 1.0)
}

/// Palm horizontal position in image space.
pub fn palm_x(hand: &HandLandmarks) -> f32 {
    hand.palm().x.clamp(0.0, 1.0)
}

/// Smile: mouth width relative to face width.
pub fn smile(face: &FaceLandmarks, t: &MetricThresholds) -> f32 {
    let mouth = face.xy(MOUTH_LEFT).distance(face.xy(MOUTH_RIGHT));
    let width = face.xy(TEMPLE_LEFT).distance(face.xy(TEMPLE_RIGHT));
    linear_map(safe_ratio(mouth, width), t.smile_low, t.smile_high)
}

/// Eyebrow raise: mean brow-to-eyelid gap relative to face height.
pub fn eyebrow_raise(face: &FaceLandmarks, t: &MetricThresholds) -> f32 {
    let left = face.xy(BROW_LEFT).distance(face.xy(EYE_TOP_LEFT));
    let right = face.xy(BROW_RIGHT).distance(face.xy(EYE_TOP_RIGHT));
    let height = face.xy(FOREHEAD).distance(face.xy(CHIN));
    linear_map(
        safe_ratio((left + right) * 0.5, height),
        t.eyebrow_low,
        t.eyebrow_high,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::landmarks::{Side, HAND_LANDMARK_COUNT};
    use crate::synthetic::{SyntheticFace, SyntheticHand};
    use glam::Vec3;

    #[test]
    fn test_safe_ratio_degenerate() {
        assert!((safe_ratio(0.5, 0.0) - 500.0).abs() < 0.1);
        assert_eq!(safe_ratio(0.0, 0.0), 0.0);
        assert!((safe_ratio(1.0, 4.0) - 0.25).abs() < 1e-6);
    }

    #[test]
    fn test_linear_map_clamps_and_inverts() {
        assert_eq!(linear_map(0.0, 1.0, 2.0), 0.0);
        assert_eq!(linear_map(3.0, 1.0, 2.0), 1.0);
        assert!((linear_map(1.5, 2.0, 1.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_openness_ratio_mapping() {
        let t = MetricThresholds::default();
        for target in [0.0, 0.25, 0.8, 1.0] {
            let hand = SyntheticHand::new(Side::Right)
                .with_openness(target)
                .landmarks(&t);
            assert!(
                (openness(&hand, &t) - target).abs() < 1e-3,
                "openness {} was {}",
                target,
                openness(&hand, &t)
            );
        }
    }

    #[test]
    fn test_pinch_and_fist_from_synthetic_hand() {
        let t = MetricThresholds::default();
        let hand = SyntheticHand::new(Side::Left)
            .with_openness(0.0)
            .with_pinch(0.7)
            .landmarks(&t);
        assert!((pinch(&hand, &t) - 0.7).abs() < 1e-3);
        assert!(fist_closure(&hand, &t) > 0.9);

        let open = SyntheticHand::new(Side::Left).with_openness(1.0).landmarks(&t);
        assert!(fist_closure(&open, &t) < 0.05);
    }

    #[test]
    fn test_collapsed_hand_stays_finite() {
        let t = MetricThresholds::default();
        let hand = HandLandmarks::new(Side::Left, [Vec3::splat(0.5); HAND_LANDMARK_COUNT]);
        for value in [
            openness(&hand, &t),
            pinch(&hand, &t),
            fist_closure(&hand, &t),
        ] {
            assert!(value.is_finite());
            assert!((0.0..=1.0).contains(&value));
        }
    }

    #[test]
    fn test_face_metrics() {
        let t = MetricThresholds::default();
        let face = SyntheticFace::new()
            .with_smile(0.6)
            .with_eyebrow_raise(0.3)
            .landmarks(&t);
        assert!((smile(&face, &t) - 0.6).abs() < 1e-3);
        assert!((eyebrow_raise(&face, &t) - 0.3).abs() < 1e-3);
    }

    #[test]
    fn test_palm_height_and_x() {
        let t = MetricThresholds::default();
        let hand = SyntheticHand::new(Side::Left)
            .at(0.3, 0.2)
            .landmarks(&t);
        assert!((palm_height(&hand) - 0.8).abs() < 1e-6);
        assert!((palm_x(&hand) - 0.3).abs() < 1e-6);
    }

    #[test]
    fn test_invalid_thresholds_rejected() {
        let t = MetricThresholds {
            smile_high: 0.1,
            ..Default::default()
        };
        assert!(t.validate().is_err());
        assert!(MetricThresholds::default().validate().is_ok());
    }
}
