//! The signal bus: shared state between the detection pipeline and the renderer.
//!
//! Continuous channels are published as one immutable [`SignalSnapshot`] per
//! detection frame through an [`ArcSwap`], so a reader never blocks and always
//! sees every channel as of the same completed frame. The swipe impulse is a
//! separate one-shot cell: only the single [`SwipeConsumer`] may reset it.

use crate::channel::ChannelId;
use arc_swap::ArcSwap;
use glam::Vec2;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use tracing::debug;

/// Every continuous channel as of one completed detection frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SignalSnapshot {
    /// Number of detection frames published so far (0 = none yet)
    pub sequence: u64,
    /// Detector timestamp of the frame that produced this snapshot
    pub timestamp: f64,
    /// Max-fused hand openness ("touch")
    pub hand_openness: f32,
    /// Dominant-hand pinch
    pub pinch: f32,
    /// Dominant-hand fist closure
    pub fist_closure: f32,
    /// Smile
    pub smile: f32,
    /// Eyebrow raise
    pub eyebrow_raise: f32,
    /// Left slot palm height
    pub left_hand_height: f32,
    /// Right slot palm height
    pub right_hand_height: f32,
    /// Last cursor position; inert while `hand_detected` is false
    pub cursor: Vec2,
    /// At least one hand was tracked in the last frame
    pub hand_detected: bool,
    /// A face was tracked in the last frame
    pub face_detected: bool,
}

impl Default for SignalSnapshot {
    fn default() -> Self {
        Self {
            sequence: 0,
            timestamp: 0.0,
            hand_openness: 0.0,
            pinch: 0.0,
            fist_closure: 0.0,
            smile: 0.0,
            eyebrow_raise: 0.0,
            left_hand_height: 0.0,
            right_hand_height: 0.0,
            cursor: Vec2::splat(0.5),
            hand_detected: false,
            face_detected: false,
        }
    }
}

impl SignalSnapshot {
    /// Value of one scalar channel.
    pub fn get(&self, id: ChannelId) -> f32 {
        match id {
            ChannelId::HandOpenness => self.hand_openness,
            ChannelId::Pinch => self.pinch,
            ChannelId::FistClosure => self.fist_closure,
            ChannelId::Smile => self.smile,
            ChannelId::EyebrowRaise => self.eyebrow_raise,
            ChannelId::LeftHandHeight => self.left_hand_height,
            ChannelId::RightHandHeight => self.right_hand_height,
        }
    }

    pub(crate) fn set(&mut self, id: ChannelId, value: f32) {
        let slot = match id {
            ChannelId::HandOpenness => &mut self.hand_openness,
            ChannelId::Pinch => &mut self.pinch,
            ChannelId::FistClosure => &mut self.fist_closure,
            ChannelId::Smile => &mut self.smile,
            ChannelId::EyebrowRaise => &mut self.eyebrow_raise,
            ChannelId::LeftHandHeight => &mut self.left_hand_height,
            ChannelId::RightHandHeight => &mut self.right_hand_height,
        };
        *slot = value;
    }

    /// Cursor position, or `None` while no hand is detected.
    pub fn cursor(&self) -> Option<Vec2> {
        self.hand_detected.then_some(self.cursor)
    }
}

/// Process-wide signal store. Create once and share behind an [`Arc`].
#[derive(Debug)]
pub struct SignalBus {
    snapshot: ArcSwap<SignalSnapshot>,
    swipe_impulse: AtomicU32,
    consumer_claimed: AtomicBool,
}

impl Default for SignalBus {
    fn default() -> Self {
        Self::new()
    }
}

impl SignalBus {
    /// All channels at rest.
    pub fn new() -> Self {
        Self {
            snapshot: ArcSwap::from_pointee(SignalSnapshot::default()),
            swipe_impulse: AtomicU32::new(0.0f32.to_bits()),
            consumer_claimed: AtomicBool::new(false),
        }
    }

    /// Latest complete snapshot. Never blocks.
    pub fn snapshot(&self) -> Arc<SignalSnapshot> {
        self.snapshot.load_full()
    }

    /// Latest value of one scalar channel.
    pub fn get(&self, id: ChannelId) -> f32 {
        self.snapshot.load().get(id)
    }

    /// Cursor position, or `None` while no hand is detected.
    pub fn cursor(&self) -> Option<Vec2> {
        self.snapshot.load().cursor()
    }

    /// Whether a hand was tracked in the last frame.
    pub fn hand_detected(&self) -> bool {
        self.snapshot.load().hand_detected
    }

    /// Whether a face was tracked in the last frame.
    pub fn face_detected(&self) -> bool {
        self.snapshot.load().face_detected
    }

    /// Read the pending swipe impulse without consuming it.
    pub fn peek_swipe_impulse(&self) -> f32 {
        f32::from_bits(self.swipe_impulse.load(Ordering::Acquire))
    }

    /// Claim the right to consume (reset) the swipe impulse.
    ///
    /// At most one [`SwipeConsumer`] exists at a time; returns `None` while
    /// another one is alive. Dropping the consumer releases the claim.
    pub fn claim_swipe_consumer(self: &Arc<Self>) -> Option<SwipeConsumer> {
        self.consumer_claimed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| {
                debug!("Swipe consumer claimed");
                SwipeConsumer {
                    bus: Arc::clone(self),
                }
            })
    }

    /// Publish one detection frame. The impulse, if any, is stored before the
    /// snapshot so a reader that sees the new snapshot also sees the impulse.
    pub(crate) fn publish(&self, snapshot: SignalSnapshot, swipe_impulse: Option<f32>) {
        if let Some(impulse) = swipe_impulse {
            self.swipe_impulse
                .store(impulse.to_bits(), Ordering::Release);
        }
        self.snapshot.store(Arc::new(snapshot));
    }
}

/// The single owner of the swipe impulse reset.
#[derive(Debug)]
pub struct SwipeConsumer {
    bus: Arc<SignalBus>,
}

impl SwipeConsumer {
    /// Take the pending impulse and reset it to 0. Returns 0.0 when none is pending.
    pub fn take(&self) -> f32 {
        f32::from_bits(
            self.bus
                .swipe_impulse
                .swap(0.0f32.to_bits(), Ordering::AcqRel),
        )
    }

    /// The bus this consumer reads from.
    pub fn bus(&self) -> &Arc<SignalBus> {
        &self.bus
    }
}

impl Drop for SwipeConsumer {
    fn drop(&mut self) {
        self.bus.consumer_claimed.store(false, Ordering::Release);
        debug!("Swipe consumer released");
    }
}
