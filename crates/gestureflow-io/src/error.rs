//! Error types for tuning file I/O.

/// Result type alias for tuning file operations.
pub type Result<T> = std::result::Result<T, IoError>;

/// Error type for tuning file operations.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Generic I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// RON parse error
    #[error("RON parse error: {0}")]
    RonDeserialize(#[from] ron::error::SpannedError),

    /// RON write error
    #[error("RON write error: {0}")]
    RonSerialize(#[from] ron::Error),

    /// JSON (de)serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// File extension is not a known tuning format
    #[error("Unsupported tuning file format: {0}")]
    UnsupportedFormat(String),

    /// Format version of the file is not the one this build writes
    #[error("Tuning file version mismatch: expected {expected}, found {found}")]
    VersionMismatch {
        /// Version this build understands
        expected: String,
        /// Version stored in the file
        found: String,
    },

    /// File exceeds the size limit
    #[error("Tuning file too large: {size} bytes (limit {limit})")]
    FileTooLarge {
        /// File size in bytes
        size: u64,
        /// Limit in bytes
        limit: u64,
    },

    /// The stored configuration does not validate
    #[error("Invalid tuning: {0}")]
    InvalidTuning(#[from] gestureflow_core::CoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IoError::UnsupportedFormat("txt".to_string());
        assert_eq!(err.to_string(), "Unsupported tuning file format: txt");
    }

    #[test]
    fn test_file_too_large_display() {
        let err = IoError::FileTooLarge {
            size: 2048,
            limit: 1024,
        };
        let text = err.to_string();
        assert!(text.contains("2048"));
        assert!(text.contains("1024"));
    }
}
