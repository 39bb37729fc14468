//! Error types for NutriTrack
//!
//! The analytics components never fail: missing or degenerate data degrades to
//! fallback values. Errors only arise at the edges, when reading inputs and
//! configuration.

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for all NutriTrack operations
#[derive(Debug, Error)]
pub enum NutriError {
    /// Input files could not be loaded
    #[error("Input error: {0}")]
    Input(#[from] InputError),

    /// Semantically invalid data
    #[error("Validation error: {0}")]
    Validation(String),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Errors while loading subject input files
#[derive(Debug, Error)]
pub enum InputError {
    #[error("File not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("Malformed input in {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },

    #[error("Batch file {path} contains no subjects")]
    EmptyBatch { path: PathBuf },
}

/// Result type alias for NutriTrack operations
pub type Result<T> = std::result::Result<T, NutriError>;

impl NutriError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            NutriError::Input(InputError::FileNotFound { .. }) => ErrorSeverity::Warning,
            NutriError::Input(InputError::EmptyBatch { .. }) => ErrorSeverity::Warning,
            NutriError::Validation(_) => ErrorSeverity::Warning,
            NutriError::Configuration(_) => ErrorSeverity::Critical,
            _ => ErrorSeverity::Error,
        }
    }

    /// Message suitable for printing to the end user
    pub fn user_message(&self) -> String {
        match self {
            NutriError::Input(InputError::FileNotFound { path }) => {
                format!("Could not find input file: {}", path.display())
            }
            NutriError::Input(InputError::Malformed { path, reason }) => {
                format!("Input file {} is not valid: {}", path.display(), reason)
            }
            NutriError::Input(InputError::EmptyBatch { path }) => {
                format!("No subjects to analyze in {}", path.display())
            }
            NutriError::Validation(msg) => format!("Invalid data: {}", msg),
            NutriError::Configuration(msg) => format!("Invalid configuration: {}", msg),
            _ => self.to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl ErrorSeverity {
    pub fn to_tracing_level(&self) -> tracing::Level {
        match self {
            ErrorSeverity::Info => tracing::Level::INFO,
            ErrorSeverity::Warning => tracing::Level::WARN,
            ErrorSeverity::Error | ErrorSeverity::Critical => tracing::Level::ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_severity() {
        let err = NutriError::Input(InputError::FileNotFound {
            path: PathBuf::from("/data/subject.json"),
        });
        assert_eq!(err.severity(), ErrorSeverity::Warning);
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::WARN);

        let err = NutriError::Configuration("cup_size_ml must be positive".to_string());
        assert_eq!(err.severity(), ErrorSeverity::Critical);
    }

    #[test]
    fn test_serialization_errors_convert() {
        let err: NutriError = serde_json::from_str::<u32>("\"x\"").unwrap_err().into();
        assert!(matches!(err, NutriError::Serialization(_)));
        assert_eq!(err.severity().to_tracing_level(), tracing::Level::ERROR);
        assert!(err.user_message().starts_with("Serialization error"));
    }

    #[test]
    fn test_user_messages() {
        let err = NutriError::Input(InputError::FileNotFound {
            path: PathBuf::from("subject.json"),
        });
        assert!(err.user_message().contains("Could not find"));

        let err = NutriError::Input(InputError::EmptyBatch {
            path: PathBuf::from("batch.json"),
        });
        assert!(err.user_message().contains("batch.json"));
    }
}
