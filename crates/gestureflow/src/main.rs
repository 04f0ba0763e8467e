//! GestureFlow - gesture-driven reactive scene
//!
//! Runs the gesture pipeline against a scripted detector and drives a toy
//! scene from the signal bus at display rate.

#![warn(missing_docs)]

mod logging_setup;
mod scene;
mod scripted;

use anyhow::{bail, Context, Result};
use gestureflow_core::{
    worker::DEFAULT_QUEUE_DEPTH, DetectionWorker, GestureDetector, GesturePipeline,
    GestureReading, GestureThresholds, InstructionSequence, LogConfig, PipelineConfig,
    SequenceEvent, SignalBus,
};
use gestureflow_io::{load_tuning, save_tuning};
use scene::Scene;
use scripted::ScriptedDetector;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

const DETECTOR_RATE_HZ: f64 = 15.0;
const RENDER_RATE_HZ: f64 = 60.0;

const USAGE: &str = "Usage: gestureflow [--config PATH] [--seconds N] [--write-default PATH] [--log-file] [--log-level LEVEL]";

/// Command line options.
#[derive(Debug, Clone, PartialEq)]
struct Args {
    config: Option<PathBuf>,
    seconds: f64,
    write_default: Option<PathBuf>,
    log_file: bool,
    log_level: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            config: None,
            seconds: scripted::SESSION_LENGTH,
            write_default: None,
            log_file: false,
            log_level: None,
        }
    }
}

impl Args {
    fn parse<I: IntoIterator<Item = String>>(args: I) -> Result<Option<Self>> {
        let mut parsed = Args::default();
        let mut args = args.into_iter();
        while let Some(arg) = args.next() {
            let mut value = |name: &str| {
                args.next()
                    .with_context(|| format!("{} requires a value\n{}", name, USAGE))
            };
            match arg.as_str() {
                "--config" => parsed.config = Some(PathBuf::from(value("--config")?)),
                "--seconds" => {
                    let text = value("--seconds")?;
                    parsed.seconds = text
                        .parse()
                        .with_context(|| format!("Invalid --seconds value: {}", text))?;
                    if !(parsed.seconds > 0.0 && parsed.seconds.is_finite()) {
                        bail!("--seconds must be a positive number");
                    }
                }
                "--write-default" => {
                    parsed.write_default = Some(PathBuf::from(value("--write-default")?))
                }
                "--log-file" => parsed.log_file = true,
                "--log-level" => parsed.log_level = Some(value("--log-level")?),
                "-h" | "--help" => return Ok(None),
                other => bail!("Unknown argument: {}\n{}", other, USAGE),
            }
        }
        Ok(Some(parsed))
    }
}

fn main() -> Result<()> {
    let Some(args) = Args::parse(std::env::args().skip(1))? else {
        println!("{}", USAGE);
        return Ok(());
    };

    let mut log_config = LogConfig {
        file_output: args.log_file,
        ..LogConfig::default()
    };
    if let Some(level) = &args.log_level {
        log_config.level = level.clone();
    }
    let _log_guard = logging_setup::init(&log_config)?;

    if let Some(path) = &args.write_default {
        save_tuning(&PipelineConfig::default(), &GestureThresholds::default(), path)
            .with_context(|| format!("Failed to write default tuning to {:?}", path))?;
        info!("Default tuning written to {:?}", path);
        return Ok(());
    }

    let (config, gestures) = match &args.config {
        Some(path) => load_tuning(path)
            .with_context(|| format!("Failed to load tuning from {:?}", path))?,
        None => (PipelineConfig::default(), GestureThresholds::default()),
    };

    info!("==========================================");
    info!("===     GestureFlow Session Started    ===");
    info!("==========================================");

    run_session(config, gestures, Duration::from_secs_f64(args.seconds))
}

fn run_session(config: PipelineConfig, gestures: GestureThresholds, duration: Duration) -> Result<()> {
    let bus = Arc::new(SignalBus::new());
    let detector = ScriptedDetector::new(config.thresholds);
    let pipeline = GesturePipeline::new(config, bus.clone())?;
    let mut worker = DetectionWorker::spawn(pipeline, DEFAULT_QUEUE_DEPTH)?;

    // The render loop is the only layer that resets the swipe impulse
    let swipe = bus
        .claim_swipe_consumer()
        .context("Swipe consumer already claimed")?;

    let handle = worker.handle();
    let detector_thread = thread::Builder::new()
        .name("scripted-detector".to_string())
        .spawn(move || detector.run(&handle, DETECTOR_RATE_HZ, duration))
        .context("Failed to spawn detector thread")?;

    let mut scene = Scene::default();
    let mut edges = GestureDetector::new(gestures);
    let mut tutorial = InstructionSequence::new(gestures);
    info!("Instruction: {}", tutorial.current().prompt());

    let frame_period = Duration::from_secs_f64(1.0 / RENDER_RATE_HZ);
    let start = Instant::now();
    let mut last_frame = start;
    let mut last_report = start;

    while !detector_thread.is_finished() {
        let now = Instant::now();
        let dt = now.duration_since(last_frame).as_secs_f32();
        last_frame = now;

        let signals = bus.snapshot();
        let reading = GestureReading::from_snapshot(&signals, bus.peek_swipe_impulse());
        for edge in edges.update(&reading) {
            if edge.engaged {
                info!("Gesture {:?} engaged", edge.kind);
            } else {
                debug!("Gesture {:?} released", edge.kind);
            }
        }
        match tutorial.update(start.elapsed().as_secs_f64(), &reading) {
            Some(SequenceEvent::Completed(kind)) => info!("Instruction completed: {:?}", kind),
            Some(SequenceEvent::Advanced(kind)) => info!("Instruction: {}", kind.prompt()),
            None => {}
        }

        scene.update(&signals, swipe.take(), dt);

        if now.duration_since(last_report) >= Duration::from_secs(1) {
            last_report = now;
            debug!(
                "Scene rotation={:.2} spin={:.2} scale={:.2} lights=({:.2}, {:.2}, {:.2}) cursor={:?}",
                scene.rotation,
                scene.spin,
                scene.scale,
                scene.left_light,
                scene.right_light,
                scene.face_light,
                scene.cursor
            );
        }

        let elapsed = now.elapsed();
        if elapsed < frame_period {
            thread::sleep(frame_period - elapsed);
        }
    }

    if detector_thread.join().is_err() {
        bail!("Detector thread panicked");
    }
    worker.stop();

    let stats = worker.stats();
    info!(
        "Session finished: processed={} failed={} dropped={} swipes={}",
        stats.processed_frames, stats.failed_frames, stats.dropped_frames, stats.swipes_emitted
    );
    let last = serde_json::to_string(&*bus.snapshot()).context("Failed to encode snapshot")?;
    info!("Final signals: {}", last);
    Ok(())
}
