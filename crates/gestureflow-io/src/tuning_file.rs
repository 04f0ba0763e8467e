//! Defines the on-disk tuning file format for GestureFlow.
//!
//! A tuning file holds every empirical constant of the gesture pipeline so a
//! deployment can be re-tuned without rebuilding. It is serialized to and from
//! RON or JSON, chosen by file extension.

use crate::error::{IoError, Result};
use chrono::{DateTime, Utc};
use gestureflow_core::{GestureThresholds, PipelineConfig};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

/// The current version of the tuning file format.
pub const TUNING_FILE_VERSION: &str = "1.0.0";

/// Maximum allowed tuning file size (1 MiB).
pub const MAX_TUNING_FILE_SIZE: u64 = 1024 * 1024;

/// On-disk encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TuningFormat {
    /// `.json`
    Json,
    /// `.ron` or `.gflow`
    Ron,
}

impl TuningFormat {
    /// Pick the format from a path's extension; no extension means RON.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .unwrap_or("ron");
        match extension {
            "json" => Ok(TuningFormat::Json),
            "ron" | "gflow" => Ok(TuningFormat::Ron),
            other => Err(IoError::UnsupportedFormat(other.to_string())),
        }
    }
}

/// Top-level structure of a saved tuning file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TuningFile {
    /// Format version.
    pub version: String,
    /// Creation and modification times.
    pub metadata: TuningMetadata,
    /// Pipeline configuration.
    pub config: PipelineConfig,
    /// Gesture engage thresholds.
    #[serde(default)]
    pub gestures: GestureThresholds,
}

/// Metadata associated with a tuning file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TuningMetadata {
    /// When the file was first created.
    pub created_at: DateTime<Utc>,
    /// When the file was last saved.
    pub modified_at: DateTime<Utc>,
}

impl TuningFile {
    /// Wrap a configuration, stamping both timestamps with now.
    pub fn new(config: PipelineConfig, gestures: GestureThresholds) -> Self {
        let now = Utc::now();
        Self {
            version: TUNING_FILE_VERSION.to_string(),
            metadata: TuningMetadata {
                created_at: now,
                modified_at: now,
            },
            config,
            gestures,
        }
    }

    /// Load from `path`.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_limit(path, MAX_TUNING_FILE_SIZE)
    }

    pub(crate) fn load_with_limit(path: &Path, limit: u64) -> Result<Self> {
        let size = std::fs::metadata(path)?.len();
        if size > limit {
            return Err(IoError::FileTooLarge { size, limit });
        }

        let format = TuningFormat::from_path(path)?;
        let mut content = String::new();
        File::open(path)?.read_to_string(&mut content)?;
        debug!("Loading {:?} tuning file {:?} ({} bytes)", format, path, size);

        let file = match format {
            TuningFormat::Json => serde_json::from_str(&content)?,
            TuningFormat::Ron => ron::from_str(&content)?,
        };
        Ok(file)
    }

    /// Save to `path`, updating `modified_at`.
    pub fn save(&mut self, path: &Path) -> Result<()> {
        let format = TuningFormat::from_path(path)?;
        self.metadata.modified_at = Utc::now();

        match format {
            TuningFormat::Json => {
                let file = File::create(path)?;
                serde_json::to_writer_pretty(file, self)?;
            }
            TuningFormat::Ron => {
                let text = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
                File::create(path)?.write_all(text.as_bytes())?;
            }
        }
        debug!("Saved tuning file {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            TuningFormat::from_path(Path::new("a.json")).unwrap(),
            TuningFormat::Json
        );
        assert_eq!(
            TuningFormat::from_path(Path::new("a.gflow")).unwrap(),
            TuningFormat::Ron
        );
        assert_eq!(
            TuningFormat::from_path(Path::new("tuning")).unwrap(),
            TuningFormat::Ron
        );
        assert!(matches!(
            TuningFormat::from_path(Path::new("a.yaml")),
            Err(IoError::UnsupportedFormat(ext)) if ext == "yaml"
        ));
    }

    #[test]
    fn test_modified_at_updates_on_save() {
        let mut file = TuningFile::new(PipelineConfig::default(), GestureThresholds::default());
        let first = file.metadata.modified_at;
        std::thread::sleep(std::time::Duration::from_millis(10));

        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("ron");
        file.save(&path).unwrap();

        assert!(file.metadata.modified_at > first);
        assert_eq!(file.metadata.created_at, first);
        std::fs::remove_file(path).ok();
    }

    #[test]
    fn test_load_file_too_large() {
        let tmp = NamedTempFile::new().unwrap();
        let path = tmp.path().with_extension("json");
        File::create(&path).unwrap().write_all(&[b' '; 1024]).unwrap();

        let result = TuningFile::load_with_limit(&path, 500);
        assert!(matches!(
            result,
            Err(IoError::FileTooLarge {
                size: 1024,
                limit: 500
            })
        ));
        std::fs::remove_file(path).ok();
    }
}
