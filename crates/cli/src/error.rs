//! Error types for CLI operations.

use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Video stream header parsing error
    #[error("Invalid video header: {message}")]
    HeaderParse { message: String },

    /// Stream ended mid-frame
    #[error("Unexpected end of stream: {message}")]
    UnexpectedEof { message: String },

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn header_parse(message: impl Into<String>) -> Self {
        Self::HeaderParse {
            message: message.into(),
        }
    }

    pub fn unexpected_eof(message: impl Into<String>) -> Self {
        Self::UnexpectedEof {
            message: message.into(),
        }
    }
}
