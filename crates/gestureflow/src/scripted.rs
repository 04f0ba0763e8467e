//! Scripted detector: replays a fixed gesture session instead of a camera.
//!
//! The session loops every [`SESSION_LENGTH`] seconds and covers every
//! channel: hands entering and opening, a swipe, a fist, a face smiling and
//! raising its eyebrows, a two-hand pinch, a tracking dropout, one detector
//! failure and one corrupted landmark set.

use gestureflow_core::{
    DetectionFrame, DetectorHandle, HandLandmarks, MetricThresholds, Side, SyntheticFace,
    SyntheticHand, Vec3,
};
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Length of one scripted loop in seconds.
pub const SESSION_LENGTH: f64 = 12.0;

/// What the scripted detector reports at one instant.
#[derive(Debug, Clone)]
pub enum ScriptedEvent {
    /// A processed frame.
    Frame(DetectionFrame),
    /// The detector failed on this frame.
    Failure(String),
}

fn ramp(t: f64, start: f64, end: f64) -> f32 {
    (((t - start) / (end - start)).clamp(0.0, 1.0)) as f32
}

/// Produces the scripted session.
#[derive(Debug, Clone)]
pub struct ScriptedDetector {
    thresholds: MetricThresholds,
}

impl ScriptedDetector {
    /// Generate landmarks that match `thresholds`.
    pub fn new(thresholds: MetricThresholds) -> Self {
        Self { thresholds }
    }

    /// Event at `timestamp` seconds from the start.
    pub fn event_at(&self, timestamp: f64) -> ScriptedEvent {
        let t = timestamp.rem_euclid(SESSION_LENGTH);
        if (9.2..9.3).contains(&t) {
            return ScriptedEvent::Failure("inference timed out".to_string());
        }

        let th = &self.thresholds;
        let mut frame = DetectionFrame::empty(timestamp);
        let right = SyntheticHand::new(Side::Right);

        match t {
            t if t < 1.0 => {}
            t if t < 3.0 => {
                let hand = right.at(0.5, 0.55).with_openness(ramp(t, 1.0, 2.5));
                frame = frame.with_hand(hand.landmarks(th));
            }
            t if t < 4.0 => {
                // Swipe to the right across the band
                let x = 0.3 + 0.4 * ramp(t, 3.2, 3.6);
                frame = frame.with_hand(right.at(x, 0.55).with_openness(1.0).landmarks(th));
            }
            t if t < 5.5 => {
                let hand = right.at(0.5, 0.5).with_openness(1.0 - ramp(t, 4.0, 4.6));
                frame = frame.with_hand(hand.landmarks(th));
            }
            t if t < 7.0 => {
                let face = SyntheticFace::new()
                    .with_smile(ramp(t, 5.5, 6.2))
                    .with_eyebrow_raise(ramp(t, 6.2, 6.8));
                frame = frame.with_face(face.landmarks(th));
            }
            t if t < 8.5 => {
                let left = SyntheticHand::new(Side::Left)
                    .at(0.3, 0.2)
                    .with_openness(0.8);
                let pinching = right.at(0.65, 0.6).with_pinch(ramp(t, 7.0, 7.5));
                frame = frame
                    .with_hand(left.landmarks(th))
                    .with_hand(pinching.landmarks(th));
            }
            t if t < 9.0 => {
                // Tracking dropout
            }
            t if t < 10.0 => {
                frame = frame.with_face(SyntheticFace::new().with_smile(0.7).landmarks(th));
            }
            t if t < 10.1 => {
                let corrupted = HandLandmarks::new(Side::Right, [Vec3::splat(f32::NAN); 21]);
                frame = frame.with_hand(corrupted);
            }
            _ => {
                let face = SyntheticFace::new().with_eyebrow_raise(ramp(t, 10.1, 11.0));
                frame = frame
                    .with_hand(right.at(0.55, 0.35).with_openness(0.4).landmarks(th))
                    .with_face(face.landmarks(th));
            }
        }
        ScriptedEvent::Frame(frame)
    }

    /// Feed `handle` at `rate_hz` until `duration` has elapsed.
    pub fn run(&self, handle: &DetectorHandle, rate_hz: f64, duration: Duration) {
        let period = Duration::from_secs_f64(1.0 / rate_hz.max(1.0));
        let start = Instant::now();
        let mut submitted = 0u64;
        info!("Scripted detector started at {:.0} Hz", rate_hz);

        while start.elapsed() < duration {
            let tick = Instant::now();
            match self.event_at(start.elapsed().as_secs_f64()) {
                ScriptedEvent::Frame(frame) => {
                    if handle.submit(frame) {
                        submitted += 1;
                    }
                }
                ScriptedEvent::Failure(reason) => {
                    if handle.report_failure(reason) {
                        debug!("Injected detector failure");
                    }
                }
            }

            let elapsed = tick.elapsed();
            if elapsed < period {
                thread::sleep(period - elapsed);
            }
        }
        info!("Scripted detector stopped after {} frames", submitted);
    }
}
