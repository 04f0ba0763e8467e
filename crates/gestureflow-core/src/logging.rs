//! Logging configuration
//!
//! The subscriber itself is installed by the binary; this type only carries
//! the settings and the log file housekeeping.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::PathBuf;
pub use tracing::level_filters::LevelFilter;

/// Log file name prefix.
const LOG_FILE_PREFIX: &str = "gestureflow_";

/// Logging settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LogConfig {
    /// Level name: trace, debug, info, warn or error
    pub level: String,
    /// Log to stderr
    pub console_output: bool,
    /// Log to a timestamped file in `log_directory`
    pub file_output: bool,
    /// Directory for log files
    pub log_directory: PathBuf,
    /// Number of log files kept by `cleanup_old_logs`
    pub max_log_files: usize,
}

impl Default for LogConfig {
    fn default() -> Self {
        let log_directory = dirs::data_local_dir()
            .map(|dir| dir.join("gestureflow").join("logs"))
            .unwrap_or_else(|| PathBuf::from("logs"));
        Self {
            level: "info".to_string(),
            console_output: true,
            file_output: false,
            log_directory,
            max_log_files: 10,
        }
    }
}

impl LogConfig {
    /// Parse `level`, falling back to INFO.
    pub fn parse_level(&self) -> LevelFilter {
        self.level.parse().unwrap_or(LevelFilter::INFO)
    }

    /// Create the log directory if needed.
    pub fn ensure_log_directory(&self) -> io::Result<()> {
        fs::create_dir_all(&self.log_directory)
    }

    /// Path of the log file for this run.
    ///
    /// The name carries the start time of the process, so repeated calls
    /// within one run return the same path.
    pub fn current_log_path(&self) -> PathBuf {
        self.log_directory
            .join(format!("{}{}.log", LOG_FILE_PREFIX, run_timestamp()))
    }

    /// Delete all but the newest `max_log_files` log files.
    pub fn cleanup_old_logs(&self) -> io::Result<usize> {
        if !self.log_directory.exists() {
            return Ok(0);
        }

        let mut logs: Vec<PathBuf> = fs::read_dir(&self.log_directory)?
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| {
                path.file_name()
                    .and_then(|name| name.to_str())
                    .is_some_and(|name| name.starts_with(LOG_FILE_PREFIX) && name.ends_with(".log"))
            })
            .collect();

        if logs.len() <= self.max_log_files {
            return Ok(0);
        }

        // Timestamped names sort chronologically
        logs.sort();
        let excess = logs.len() - self.max_log_files;
        let mut removed = 0;
        for path in logs.into_iter().take(excess) {
            fs::remove_file(&path)?;
            removed += 1;
        }
        Ok(removed)
    }
}

fn run_timestamp() -> &'static str {
    use std::sync::OnceLock;
    static STARTED: OnceLock<String> = OnceLock::new();
    STARTED.get_or_init(|| chrono::Local::now().format("%Y-%m-%d_%H-%M-%S").to_string())
}
