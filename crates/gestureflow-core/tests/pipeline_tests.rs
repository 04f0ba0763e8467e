use gestureflow_core::landmarks::{
    MIDDLE_MCP, MIDDLE_TIP, MOUTH_LEFT, MOUTH_RIGHT, TEMPLE_LEFT, TEMPLE_RIGHT, WRIST,
};
use gestureflow_core::{
    ChannelId, DetectionFrame, FaceLandmarks, GesturePipeline, HandLandmarks, MetricThresholds,
    PipelineConfig, Side, SidePolicy, SignalBus, SyntheticFace, SyntheticHand, Vec3,
};
use std::sync::Arc;

const FRAME_DT: f64 = 1.0 / 15.0;

fn new_pipeline(config: PipelineConfig) -> (GesturePipeline, Arc<SignalBus>) {
    let bus = Arc::new(SignalBus::new());
    let pipeline = GesturePipeline::new(config, bus.clone()).unwrap();
    (pipeline, bus)
}

fn thresholds() -> MetricThresholds {
    MetricThresholds::default()
}

#[test]
fn test_openness_convergence_scenario() {
    let (mut pipeline, bus) = new_pipeline(PipelineConfig::default());
    let t = thresholds();
    let mut now = 0.0;

    for _ in 0..10 {
        pipeline.process_frame(&DetectionFrame::empty(now));
        now += FRAME_DT;
    }
    assert_eq!(bus.get(ChannelId::HandOpenness), 0.0);

    let hand = SyntheticHand::new(Side::Right).with_openness(0.8).landmarks(&t);
    let within = |v: f32| (v - 0.8).abs() <= 0.8 * 0.01;

    let mut frames_needed = None;
    let mut previous = 0.0;
    for frame in 1..=40 {
        let out = pipeline.process_frame(&DetectionFrame::empty(now).with_hand(hand.clone()));
        now += FRAME_DT;
        let value = out.snapshot.hand_openness;
        assert!(value >= previous, "openness must rise monotonically");
        assert!(value <= 0.8 + 1e-4, "openness must not overshoot");
        previous = value;
        if frames_needed.is_none() && within(value) {
            frames_needed = Some(frame);
        }
    }
    // 0.85^28 > 0.01 >= 0.85^29
    assert_eq!(frames_needed, Some(29));
}

#[test]
fn test_max_fusion_and_per_hand_heights() {
    let (mut pipeline, bus) = new_pipeline(PipelineConfig::default());
    let t = thresholds();
    let left = SyntheticHand::new(Side::Left)
        .at(0.3, 0.2)
        .with_openness(0.9)
        .landmarks(&t);
    let right = SyntheticHand::new(Side::Right)
        .at(0.7, 0.6)
        .with_openness(0.2)
        .landmarks(&t);

    for i in 0..120 {
        let frame = DetectionFrame::empty(i as f64 * FRAME_DT)
            .with_hand(left.clone())
            .with_hand(right.clone());
        pipeline.process_frame(&frame);
    }

    let snapshot = bus.snapshot();
    assert!((snapshot.hand_openness - 0.9).abs() < 1e-2);
    assert!((snapshot.left_hand_height - 0.8).abs() < 1e-3);
    assert!((snapshot.right_hand_height - 0.4).abs() < 1e-3);
}

#[test]
fn test_dominant_hand_prefers_primary_slot() {
    let (mut pipeline, bus) = new_pipeline(PipelineConfig::default());
    let t = thresholds();
    let left = SyntheticHand::new(Side::Left)
        .at(0.4, 0.5)
        .with_pinch(0.9)
        .landmarks(&t);
    let right = SyntheticHand::new(Side::Right)
        .at(0.6, 0.5)
        .with_pinch(0.1)
        .landmarks(&t);

    let mut now = 0.0;
    for _ in 0..100 {
        let frame = DetectionFrame::empty(now)
            .with_hand(left.clone())
            .with_hand(right.clone());
        pipeline.process_frame(&frame);
        now += FRAME_DT;
    }
    assert!((bus.get(ChannelId::Pinch) - 0.1).abs() < 1e-2);

    // Primary gone: the remaining hand drives the channel
    for _ in 0..100 {
        pipeline.process_frame(&DetectionFrame::empty(now).with_hand(left.clone()));
        now += FRAME_DT;
    }
    assert!((bus.get(ChannelId::Pinch) - 0.9).abs() < 1e-2);
}

#[test]
fn test_gate_exclusion_follows_decay_path() {
    let config = PipelineConfig::default();
    let decay = config.channels.fist_closure.decay;
    let (mut pipeline, bus) = new_pipeline(config);
    let t = thresholds();
    let centered = SyntheticHand::new(Side::Right)
        .at(0.5, 0.5)
        .with_openness(0.0)
        .landmarks(&t);
    let at_edge = SyntheticHand::new(Side::Right)
        .at(0.1, 0.5)
        .with_openness(0.0)
        .landmarks(&t);

    let mut now = 0.0;
    for _ in 0..3 {
        pipeline.process_frame(&DetectionFrame::empty(now).with_hand(centered.clone()));
        now += FRAME_DT;
    }
    let before = bus.get(ChannelId::FistClosure);
    assert!(before > 0.5);

    for n in 1..=5 {
        let out = pipeline.process_frame(&DetectionFrame::empty(now).with_hand(at_edge.clone()));
        now += FRAME_DT;
        let expected = before * decay.powi(n);
        assert!((out.snapshot.fist_closure - expected).abs() < 1e-5);
    }
    // The ungated channels kept following the hand
    assert!(bus.hand_detected());
}

#[test]
fn test_decay_on_loss() {
    let config = PipelineConfig::default();
    let decay_hand = config.channels.hand_openness.decay;
    let decay_face = config.channels.smile.decay;
    let (mut pipeline, bus) = new_pipeline(config);
    let t = thresholds();
    let hand = SyntheticHand::new(Side::Left).with_openness(1.0).landmarks(&t);
    let face = SyntheticFace::new().with_smile(1.0).landmarks(&t);

    let mut now = 0.0;
    for _ in 0..20 {
        let frame = DetectionFrame::empty(now)
            .with_hand(hand.clone())
            .with_face(face.clone());
        pipeline.process_frame(&frame);
        now += FRAME_DT;
    }
    let openness = bus.get(ChannelId::HandOpenness);
    let smile = bus.get(ChannelId::Smile);
    assert!(openness > 0.5 && smile > 0.5);

    let mut previous = openness;
    for n in 1..=12 {
        let out = pipeline.process_frame(&DetectionFrame::empty(now));
        now += FRAME_DT;
        let value = out.snapshot.hand_openness;
        assert!(value <= previous);
        assert!((value - openness * decay_hand.powi(n)).abs() < 1e-5);
        assert!((out.snapshot.smile - smile * decay_face.powi(n)).abs() < 1e-5);
        previous = value;
    }
    let snapshot = bus.snapshot();
    assert!(!snapshot.hand_detected);
    assert!(!snapshot.face_detected);
    assert_eq!(snapshot.cursor(), None);
}

#[test]
fn test_swipe_scenario_sets_scaled_impulse() {
    let (mut pipeline, bus) = new_pipeline(PipelineConfig::default());
    let t = thresholds();
    let consumer = bus.claim_swipe_consumer().unwrap();

    let start = SyntheticHand::new(Side::Right).at(0.40, 0.5).landmarks(&t);
    let end = SyntheticHand::new(Side::Right).at(0.55, 0.5).landmarks(&t);
    let first = pipeline.process_frame(&DetectionFrame::empty(2.00).with_hand(start));
    assert_eq!(first.swipe_impulse, None);
    let second = pipeline.process_frame(&DetectionFrame::empty(2.05).with_hand(end));

    let impulse = second.swipe_impulse.unwrap();
    assert!((impulse - 3.9).abs() < 1e-3);
    assert!((bus.peek_swipe_impulse() - 3.9).abs() < 1e-3);

    assert!((consumer.take() - 3.9).abs() < 1e-3);
    assert_eq!(consumer.take(), 0.0);
}

#[test]
fn test_swipe_after_reacquisition_is_suppressed() {
    let (mut pipeline, bus) = new_pipeline(PipelineConfig::default());
    let t = thresholds();
    let start = SyntheticHand::new(Side::Right).at(0.2, 0.5).landmarks(&t);
    let end = SyntheticHand::new(Side::Right).at(0.8, 0.5).landmarks(&t);

    pipeline.process_frame(&DetectionFrame::empty(0.0).with_hand(start));
    pipeline.process_frame(&DetectionFrame::empty(0.05));
    let out = pipeline.process_frame(&DetectionFrame::empty(0.1).with_hand(end));
    assert_eq!(out.swipe_impulse, None);
    assert_eq!(bus.peek_swipe_impulse(), 0.0);
}

#[test]
fn test_swipe_last_write_wins() {
    let (mut pipeline, bus) = new_pipeline(PipelineConfig::default());
    let t = thresholds();
    let consumer = bus.claim_swipe_consumer().unwrap();
    let at = |x: f32| SyntheticHand::new(Side::Right).at(x, 0.5).landmarks(&t);

    pipeline.process_frame(&DetectionFrame::empty(0.00).with_hand(at(0.40)));
    pipeline.process_frame(&DetectionFrame::empty(0.05).with_hand(at(0.55)));
    pipeline.process_frame(&DetectionFrame::empty(0.10).with_hand(at(0.45)));

    let impulse = consumer.take();
    assert!(impulse < 0.0, "direction flip must replace the pending impulse");
    assert_eq!(consumer.take(), 0.0);
}

#[test]
fn test_settle_frames_delay_gated_channel() {
    let mut config = PipelineConfig::default();
    config.channels.fist_closure.gate = config
        .channels
        .fist_closure
        .gate
        .map(|gate| gate.with_settle_frames(2));
    let (mut pipeline, bus) = new_pipeline(config);
    let t = thresholds();
    let fist = SyntheticHand::new(Side::Right).with_openness(0.0).landmarks(&t);

    for i in 0..2 {
        pipeline.process_frame(&DetectionFrame::empty(i as f64 * FRAME_DT).with_hand(fist.clone()));
        assert_eq!(bus.get(ChannelId::FistClosure), 0.0);
    }
    pipeline.process_frame(&DetectionFrame::empty(2.0 * FRAME_DT).with_hand(fist));
    assert!(bus.get(ChannelId::FistClosure) > 0.0);
}

fn still_hand(side: Side, x: f32) -> HandLandmarks {
    SyntheticHand::new(side).at(x, 0.5).landmarks(&thresholds())
}

fn assert_no_swipe(pipeline: &mut GesturePipeline, bus: &SignalBus, frames: &[(f64, Vec<HandLandmarks>)]) {
    for (timestamp, hands) in frames {
        let frame = hands
            .iter()
            .cloned()
            .fold(DetectionFrame::empty(*timestamp), DetectionFrame::with_hand);
        let out = pipeline.process_frame(&frame);
        assert_eq!(out.swipe_impulse, None, "swipe fired at t={}", timestamp);
    }
    assert_eq!(bus.peek_swipe_impulse(), 0.0);
}

#[test]
fn test_second_hand_entering_by_position_is_not_a_swipe() {
    let mut config = PipelineConfig::default();
    config.fusion.side_policy = SidePolicy::ByPosition;
    let (mut pipeline, bus) = new_pipeline(config);

    // A still right hand on the left of the image is joined by a second hand
    assert_no_swipe(
        &mut pipeline,
        &bus,
        &[
            (0.00, vec![still_hand(Side::Right, 0.3)]),
            (0.05, vec![still_hand(Side::Right, 0.3)]),
            (0.10, vec![still_hand(Side::Right, 0.3), still_hand(Side::Left, 0.7)]),
            (0.15, vec![still_hand(Side::Right, 0.3), still_hand(Side::Left, 0.7)]),
        ],
    );
}

#[test]
fn test_swapped_side_labels_are_not_a_swipe() {
    let (mut pipeline, bus) = new_pipeline(PipelineConfig::default());
    let normal = vec![still_hand(Side::Left, 0.3), still_hand(Side::Right, 0.7)];
    let swapped = vec![still_hand(Side::Right, 0.3), still_hand(Side::Left, 0.7)];

    assert_no_swipe(
        &mut pipeline,
        &bus,
        &[
            (0.00, normal.clone()),
            (0.05, normal.clone()),
            (0.10, swapped),
            (0.15, normal),
        ],
    );
}

#[test]
fn test_duplicate_label_fallback_is_not_a_swipe() {
    let (mut pipeline, bus) = new_pipeline(PipelineConfig::default());
    let normal = vec![still_hand(Side::Left, 0.3), still_hand(Side::Right, 0.7)];
    // The left hand is reported as Right too; the right hand falls back to Left
    let duplicate = vec![still_hand(Side::Right, 0.3), still_hand(Side::Right, 0.7)];

    assert_no_swipe(
        &mut pipeline,
        &bus,
        &[
            (0.00, normal.clone()),
            (0.05, duplicate.clone()),
            (0.10, duplicate),
            (0.15, normal),
        ],
    );
}

#[test]
fn test_swipe_with_two_tracked_hands_still_fires() {
    let (mut pipeline, bus) = new_pipeline(PipelineConfig::default());
    let consumer = bus.claim_swipe_consumer().unwrap();
    let left = still_hand(Side::Left, 0.2);

    let first = DetectionFrame::empty(0.00)
        .with_hand(left.clone())
        .with_hand(still_hand(Side::Right, 0.50));
    let second = DetectionFrame::empty(0.05)
        .with_hand(left)
        .with_hand(still_hand(Side::Right, 0.65));
    pipeline.process_frame(&first);
    let out = pipeline.process_frame(&second);

    assert!(out.swipe_impulse.is_some());
    assert!((consumer.take() - 3.9).abs() < 1e-2);
}

#[test]
fn test_overflowing_landmarks_never_poison_channels() {
    let (mut pipeline, bus) = new_pipeline(PipelineConfig::default());
    let t = thresholds();
    let hand = SyntheticHand::new(Side::Right).with_openness(1.0).landmarks(&t);
    let face = SyntheticFace::new().with_smile(1.0).landmarks(&t);

    let mut now = 0.0;
    for _ in 0..10 {
        let frame = DetectionFrame::empty(now)
            .with_hand(hand.clone())
            .with_face(face.clone());
        pipeline.process_frame(&frame);
        now += FRAME_DT;
    }
    let openness = bus.get(ChannelId::HandOpenness);
    let smile = bus.get(ChannelId::Smile);

    // Finite coordinates whose distances overflow f32
    let mut points = [Vec3::splat(0.5); 21];
    points[WRIST] = Vec3::new(-2e19, -2e19, 0.0);
    points[MIDDLE_MCP] = Vec3::new(2e19, 2e19, 0.0);
    points[MIDDLE_TIP] = Vec3::new(2e19, 2e19, 0.0);
    let huge_hand = HandLandmarks::new(Side::Right, points);
    assert!(huge_hand.is_finite());

    let mut mesh = face.points().to_vec();
    mesh[TEMPLE_LEFT] = Vec3::new(-2e19, 0.4, 0.0);
    mesh[TEMPLE_RIGHT] = Vec3::new(2e19, 0.4, 0.0);
    mesh[MOUTH_LEFT] = Vec3::new(-2e19, 0.5, 0.0);
    mesh[MOUTH_RIGHT] = Vec3::new(2e19, 0.5, 0.0);
    let huge_face = FaceLandmarks::new(mesh).unwrap();

    let out = pipeline.process_frame(
        &DetectionFrame::empty(now)
            .with_hand(huge_hand)
            .with_face(huge_face),
    );
    now += FRAME_DT;
    let channels = PipelineConfig::default().channels;
    assert!((out.snapshot.hand_openness - openness * channels.hand_openness.decay).abs() < 1e-6);
    assert!((out.snapshot.smile - smile * channels.smile.decay).abs() < 1e-6);

    for _ in 0..29 {
        let out = pipeline.process_frame(&DetectionFrame::empty(now));
        now += FRAME_DT;
        for id in ChannelId::ALL {
            let value = out.snapshot.get(id);
            assert!((0.0..=1.0).contains(&value), "{} = {}", id.name(), value);
        }
    }
}
