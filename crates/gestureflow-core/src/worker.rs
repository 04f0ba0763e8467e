//! Detection worker thread
//!
//! The detector delivers results asynchronously and never concurrently with
//! itself. [`DetectionWorker`] models that: a single named thread owns the
//! [`GesturePipeline`] and drains a bounded queue of [`DetectorEvent`]s, so the
//! write path can never re-enter. Producers submit through a cloneable
//! [`DetectorHandle`]; when the queue is full the frame is dropped upstream.

use crate::landmarks::DetectionFrame;
use crate::pipeline::GesturePipeline;
use crate::{CoreError, Result};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, info, warn};

/// Default queue depth between detector and pipeline.
pub const DEFAULT_QUEUE_DEPTH: usize = 4;

/// Worker statistics
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PipelineStats {
    /// Frames run through the pipeline
    pub processed_frames: u64,
    /// Detector failures reported
    pub failed_frames: u64,
    /// Frames dropped because the queue was full
    pub dropped_frames: u64,
    /// Swipe impulses written to the bus
    pub swipes_emitted: u64,
    /// Timestamp of the last processed frame
    pub last_timestamp: f64,
}

/// One message from the detector.
#[derive(Debug, Clone)]
pub enum DetectorEvent {
    /// A processed camera frame.
    Frame(DetectionFrame),
    /// The detector failed on a frame; the bus keeps its previous values.
    Failed(String),
}

/// Producer side of the worker queue.
#[derive(Debug, Clone)]
pub struct DetectorHandle {
    tx: Sender<DetectorEvent>,
    stats: Arc<RwLock<PipelineStats>>,
}

impl DetectorHandle {
    /// Queue a frame. Returns false when it was dropped (queue full or worker gone).
    pub fn submit(&self, frame: DetectionFrame) -> bool {
        match self.tx.try_send(DetectorEvent::Frame(frame)) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.stats.write().dropped_frames += 1;
                debug!("Dropped detection frame (queue full)");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("Detection worker is gone; frame discarded");
                false
            }
        }
    }

    /// Report a detector failure for one frame. Returns false when it was
    /// dropped; a full queue counts it in `dropped_frames` like a frame.
    pub fn report_failure(&self, reason: impl Into<String>) -> bool {
        match self.tx.try_send(DetectorEvent::Failed(reason.into())) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                self.stats.write().dropped_frames += 1;
                debug!("Dropped detector failure report (queue full)");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                warn!("Detection worker is gone; failure report discarded");
                false
            }
        }
    }
}

/// Thread owning the pipeline.
pub struct DetectionWorker {
    tx: Sender<DetectorEvent>,
    running: Arc<AtomicBool>,
    stats: Arc<RwLock<PipelineStats>>,
    thread: Option<JoinHandle<()>>,
}

impl DetectionWorker {
    /// Start the worker with a queue of `queue_depth` events.
    pub fn spawn(pipeline: GesturePipeline, queue_depth: usize) -> Result<Self> {
        let (tx, rx) = bounded(queue_depth.max(1));
        let running = Arc::new(AtomicBool::new(true));
        let stats = Arc::new(RwLock::new(PipelineStats::default()));

        let thread = {
            let running = running.clone();
            let stats = stats.clone();
            thread::Builder::new()
                .name("gesture-pipeline".to_string())
                .spawn(move || run(pipeline, rx, running, stats))
                .map_err(|e| CoreError::Worker(format!("failed to spawn pipeline thread: {}", e)))?
        };

        Ok(Self {
            tx,
            running,
            stats,
            thread: Some(thread),
        })
    }

    /// A new producer handle.
    pub fn handle(&self) -> DetectorHandle {
        DetectorHandle {
            tx: self.tx.clone(),
            stats: self.stats.clone(),
        }
    }

    /// Current statistics.
    pub fn stats(&self) -> PipelineStats {
        *self.stats.read()
    }

    /// Whether the thread is still running.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Relaxed)
    }

    /// Stop the thread after it finishes the event in progress.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::Relaxed);
        if let Some(thread) = self.thread.take() {
            if thread.join().is_err() {
                warn!("Pipeline thread panicked");
            }
        }
    }
}

impl Drop for DetectionWorker {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run(
    mut pipeline: GesturePipeline,
    rx: Receiver<DetectorEvent>,
    running: Arc<AtomicBool>,
    stats: Arc<RwLock<PipelineStats>>,
) {
    info!("Pipeline thread started");

    while running.load(Ordering::Relaxed) {
        match rx.recv_timeout(Duration::from_millis(50)) {
            Ok(DetectorEvent::Frame(frame)) => {
                let output = pipeline.process_frame(&frame);
                let mut stats = stats.write();
                stats.processed_frames += 1;
                stats.last_timestamp = output.snapshot.timestamp;
                if output.swipe_impulse.is_some() {
                    stats.swipes_emitted += 1;
                }
            }
            Ok(DetectorEvent::Failed(reason)) => {
                warn!("Detector failed, keeping previous signals: {}", reason);
                stats.write().failed_frames += 1;
            }
            Err(RecvTimeoutError::Timeout) => {}
            Err(RecvTimeoutError::Disconnected) => {
                info!("Detector channel disconnected");
                break;
            }
        }
    }

    running.store(false, Ordering::Relaxed);
    info!("Pipeline thread stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bus::SignalBus;
    use crate::pipeline::PipelineConfig;
    use std::time::Instant;

    fn wait_for(worker: &DetectionWorker, done: impl Fn(&PipelineStats) -> bool) -> PipelineStats {
        let start = Instant::now();
        loop {
            let stats = worker.stats();
            if done(&stats) || start.elapsed() > Duration::from_secs(5) {
                return stats;
            }
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn test_worker_processes_frames_and_failures() {
        let bus = Arc::new(SignalBus::new());
        let pipeline = GesturePipeline::new(PipelineConfig::default(), bus.clone()).unwrap();
        let mut worker = DetectionWorker::spawn(pipeline, 16).unwrap();
        let handle = worker.handle();

        assert!(handle.submit(DetectionFrame::empty(0.0)));
        assert!(handle.report_failure("model rejected frame"));
        assert!(handle.submit(DetectionFrame::empty(0.1)));

        let stats = wait_for(&worker, |s| s.processed_frames == 2 && s.failed_frames == 1);
        assert_eq!(stats.processed_frames, 2);
        assert_eq!(stats.failed_frames, 1);
        assert_eq!(bus.snapshot().sequence, 2);

        worker.stop();
        assert!(!worker.is_running());
        assert!(!handle.submit(DetectionFrame::empty(0.2)));
    }
}
