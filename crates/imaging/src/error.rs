//! Imaging error types

use thiserror::Error;

/// Image and codec errors
#[derive(Debug, Error)]
pub enum ImageError {
    /// Zero or negative dimensions
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: i64, height: i64 },

    /// Buffer length does not match width * height * bytes-per-pixel
    #[error("image buffer size mismatch: expected {expected} bytes, got {got}")]
    SizeMismatch { expected: usize, got: usize },

    /// Not a BMP file
    #[error("not a BMP file (bad magic)")]
    InvalidSignature,

    /// BMP bit depth this codec does not handle
    #[error("unsupported BMP bit depth: {bits}")]
    UnsupportedBitDepth { bits: u16 },

    /// Unexpected color masks or color space on a 32-bit BMP
    #[error("unsupported BMP layout: {message}")]
    UnsupportedLayout { message: String },

    /// File ended before the declared pixel data
    #[error("truncated BMP file: {message}")]
    Truncated { message: String },

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl ImageError {
    /// Create an unsupported-layout error
    pub fn unsupported_layout(message: impl Into<String>) -> Self {
        Self::UnsupportedLayout {
            message: message.into(),
        }
    }

    /// Create a truncated-file error
    pub fn truncated(message: impl Into<String>) -> Self {
        Self::Truncated {
            message: message.into(),
        }
    }
}
