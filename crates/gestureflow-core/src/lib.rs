//! GestureFlow Core - Gesture Signal Pipeline
//!
//! This crate turns per-frame hand and face landmarks into stable control
//! signals for a reactive scene, including:
//! - Scale-invariant metric extractors
//! - Asymmetric smoothing, loss-of-tracking decay and zone gates
//! - Swipe velocity detection with a one-shot impulse
//! - Dual-hand fusion
//! - The lock-free signal bus read by the render loop
//! - The detection worker and gesture threshold table

#![warn(missing_docs)]

pub use glam::{Vec2, Vec3};
use thiserror::Error;

// Landmark input and metrics
pub mod landmarks;
pub mod metrics;
pub mod synthetic;

// Signal processing
pub mod channel;
pub mod fusion;
pub mod swipe;
pub mod zone;

// Shared state and runtime
pub mod bus;
pub mod gesture_check;
pub mod logging;
pub mod pipeline;
pub mod worker;

// --- Re-exports grouped by category ---

// Input
pub use landmarks::{DetectionFrame, FaceLandmarks, HandLandmarks, Side};
pub use synthetic::{SyntheticFace, SyntheticHand};

// Configuration
pub use channel::{ChannelConfig, ChannelId, ChannelTable, Fusion};
pub use fusion::{Assignment, FusionConfig, HandSlots, SidePolicy};
pub use metrics::MetricThresholds;
pub use pipeline::{GesturePipeline, PipelineConfig};
pub use swipe::{SwipeConfig, SwipeDetector};
pub use zone::{Zone, ZoneGate};

// Signal bus
pub use bus::{SignalBus, SignalSnapshot, SwipeConsumer};

// Runtime
pub use gesture_check::{
    GestureDetector, GestureEdge, GestureKind, GestureLatch, GestureReading, GestureThresholds,
    InstructionSequence, SequenceEvent,
};
pub use logging::LogConfig;
pub use worker::{DetectionWorker, DetectorEvent, DetectorHandle, PipelineStats};

/// Core error types
#[derive(Error, Debug)]
pub enum CoreError {
    /// A landmark set does not have the expected number of points
    #[error("Invalid landmark count: expected {expected}, found {found}")]
    InvalidLandmarkCount {
        /// Required number of points
        expected: usize,
        /// Number of points supplied
        found: usize,
    },

    /// A configuration value is out of range
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The detection worker could not be started or reached
    #[error("Worker error: {0}")]
    Worker(String),
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, CoreError>;
