//! Error types and handling for the CLI
//!
//! This module provides error types and utilities for handling
//! various failure modes in the CLI application.

use filemagic_core::MagicError;
use std::io;

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for CLI operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error (file operations, etc.)
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// Error from the libmagic session
    #[error("{0}")]
    Magic(#[from] MagicError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Some of the requested paths failed
    #[error("{failed} of {total} path(s) failed")]
    Partial { failed: usize, total: usize },

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML serialization/deserialization error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic error with context
    #[error("{message}")]
    Other { message: String },
}

impl Error {
    /// Create a configuration error
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Create a generic error with message
    pub fn other(message: impl Into<String>) -> Self {
        Self::Other {
            message: message.into(),
        }
    }

    /// Get the exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Partial { .. } => 1,
            Self::Magic(e) => match e {
                MagicError::Unavailable { .. } => 3,
                MagicError::InvalidArgument { .. } | MagicError::NotImplemented { .. } => 4,
                _ => 2,
            },
            Self::Config(_) => 5,
            Self::Io(_) => 6,
            Self::Json(_) => 12,
            Self::Yaml(_) => 13,
            Self::Other { .. } => 99,
        }
    }
}

/// Format an error for display to the user
pub fn format_error(error: &Error, use_color: bool) -> String {
    if use_color {
        use colored::Colorize;
        format!("{} {}", "Error:".red().bold(), error)
    } else {
        format!("Error: {}", error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_error_kind() {
        assert_eq!(Error::Partial { failed: 1, total: 2 }.exit_code(), 1);
        assert_eq!(Error::from(MagicError::NotLoaded).exit_code(), 2);
        assert_eq!(
            Error::from(MagicError::Unavailable {
                message: "libmagic.so.1: cannot open shared object file".to_string()
            })
            .exit_code(),
            3
        );
        assert_eq!(
            Error::from(MagicError::InvalidArgument {
                message: "unknown or invalid flag specified".to_string()
            })
            .exit_code(),
            4
        );
        assert_eq!(Error::config("bad").exit_code(), 5);
    }

    #[test]
    fn test_partial_failure_message() {
        let err = Error::Partial { failed: 2, total: 3 };
        assert_eq!(err.to_string(), "2 of 3 path(s) failed");
    }

    #[test]
    fn test_format_error_plain() {
        let err = Error::from(MagicError::NotOpen);
        assert_eq!(format_error(&err, false), format!("Error: {}", MagicError::NotOpen));
    }
}
