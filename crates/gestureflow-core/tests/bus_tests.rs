use gestureflow_core::{
    DetectionFrame, GesturePipeline, PipelineConfig, Side, SignalBus, SyntheticHand,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

#[test]
fn test_readers_see_defaults_before_first_frame() {
    let bus = SignalBus::new();
    let snapshot = bus.snapshot();
    assert_eq!(snapshot.sequence, 0);
    assert_eq!(snapshot.hand_openness, 0.0);
    assert_eq!(snapshot.cursor(), None);
}

#[test]
fn test_concurrent_readers_observe_whole_frames() {
    let config = PipelineConfig::default();
    let t = config.thresholds;
    let bus = Arc::new(SignalBus::new());
    let mut pipeline = GesturePipeline::new(config, bus.clone()).unwrap();
    let done = Arc::new(AtomicBool::new(false));

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let bus = bus.clone();
            let done = done.clone();
            thread::spawn(move || {
                let mut last_sequence = 0;
                let mut observations = 0u64;
                while !done.load(Ordering::Relaxed) {
                    let snapshot = bus.snapshot();
                    assert!(snapshot.sequence >= last_sequence);
                    last_sequence = snapshot.sequence;
                    // Odd frames carry a hand, even frames are empty
                    if snapshot.sequence > 0 {
                        assert_eq!(snapshot.hand_detected, snapshot.sequence % 2 == 1);
                    }
                    observations += 1;
                }
                observations
            })
        })
        .collect();

    let hand = SyntheticHand::new(Side::Right).with_openness(0.7).landmarks(&t);
    for i in 0..2000u32 {
        let mut frame = DetectionFrame::empty(f64::from(i) * 0.03);
        if i % 2 == 0 {
            frame = frame.with_hand(hand.clone());
        }
        pipeline.process_frame(&frame);
    }
    done.store(true, Ordering::Relaxed);

    for reader in readers {
        assert!(reader.join().unwrap() > 0);
    }
    assert_eq!(bus.snapshot().sequence, 2000);
}

#[test]
fn test_only_one_swipe_consumer() {
    let bus = Arc::new(SignalBus::new());
    let first = bus.claim_swipe_consumer();
    assert!(first.is_some());

    let other = bus.clone();
    let contender = thread::spawn(move || other.claim_swipe_consumer().is_some());
    assert!(!contender.join().unwrap());

    drop(first);
    assert!(bus.claim_swipe_consumer().is_some());
}

#[test]
fn test_peek_does_not_consume() {
    let config = PipelineConfig::default();
    let t = config.thresholds;
    let bus = Arc::new(SignalBus::new());
    let mut pipeline = GesturePipeline::new(config, bus.clone()).unwrap();
    let consumer = bus.claim_swipe_consumer().unwrap();

    let at = |x: f32| SyntheticHand::new(Side::Left).at(x, 0.5).landmarks(&t);
    pipeline.process_frame(&DetectionFrame::empty(0.0).with_hand(at(0.6)));
    pipeline.process_frame(&DetectionFrame::empty(0.05).with_hand(at(0.4)));

    let peeked = bus.peek_swipe_impulse();
    assert!(peeked < 0.0);
    assert_eq!(bus.peek_swipe_impulse(), peeked);
    assert_eq!(consumer.take(), peeked);
    assert_eq!(bus.peek_swipe_impulse(), 0.0);
}
