//! GestureFlow I/O - Tuning files
//!
//! High-level API for saving and loading the pipeline configuration. The
//! low-level encoding lives in [`tuning_file`]; this layer adds the version
//! check and validation.

#![warn(missing_docs)]

pub mod error;
pub mod tuning_file;

pub use error::{IoError, Result};
pub use tuning_file::{TuningFile, TuningFormat, TuningMetadata, MAX_TUNING_FILE_SIZE, TUNING_FILE_VERSION};

use gestureflow_core::{GestureThresholds, PipelineConfig};
use std::path::Path;
use tracing::info;

/// Save a configuration to `path` (format by extension).
pub fn save_tuning(config: &PipelineConfig, gestures: &GestureThresholds, path: &Path) -> Result<()> {
    config.validate()?;
    gestures.validate()?;
    let mut file = TuningFile::new(config.clone(), *gestures);
    file.save(path)?;
    info!("Tuning saved to {:?}", path);
    Ok(())
}

/// Load and validate a configuration from `path`.
///
/// Fails when the stored format version differs from [`TUNING_FILE_VERSION`]
/// or when any value is out of range.
pub fn load_tuning(path: &Path) -> Result<(PipelineConfig, GestureThresholds)> {
    let file = TuningFile::load(path)?;

    if file.version != TUNING_FILE_VERSION {
        return Err(IoError::VersionMismatch {
            expected: TUNING_FILE_VERSION.to_string(),
            found: file.version,
        });
    }

    file.config.validate()?;
    file.gestures.validate()?;
    info!("Tuning loaded from {:?}", path);
    Ok((file.config, file.gestures))
}
