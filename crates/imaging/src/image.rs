//! Owned raster image buffer.

use serde::{Deserialize, Serialize};

use crate::ImageError;

/// Pixel layout of an [`Image`] buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PixelFormat {
    /// 8-bit single channel
    Grayscale8,
    /// 8-bit R, G, B
    Rgb24,
    /// 8-bit R, G, B, A
    Rgba32,
}

impl PixelFormat {
    /// Bits per pixel.
    pub fn bits_per_pixel(self) -> u32 {
        match self {
            PixelFormat::Grayscale8 => 8,
            PixelFormat::Rgb24 => 24,
            PixelFormat::Rgba32 => 32,
        }
    }

    /// Bytes per pixel.
    pub fn bytes_per_pixel(self) -> usize {
        (self.bits_per_pixel() / 8) as usize
    }

    /// Map a BMP bit depth to a pixel format.
    pub fn from_bit_count(bits: u16) -> Option<Self> {
        match bits {
            8 => Some(PixelFormat::Grayscale8),
            24 => Some(PixelFormat::Rgb24),
            32 => Some(PixelFormat::Rgba32),
            _ => None,
        }
    }
}

/// Owned raster frame, rows top-down, no padding between rows.
///
/// Calculators mutate the buffer in place and re-package the image into a
/// fresh packet, so the buffer is exclusively owned rather than shared.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Image {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Vec<u8>,
}

impl Image {
    /// Create a zero-filled image.
    pub fn new(width: u32, height: u32, format: PixelFormat) -> Result<Self, ImageError> {
        Self::validate_dimensions(width, height)?;
        let size = width as usize * height as usize * format.bytes_per_pixel();
        Ok(Self {
            width,
            height,
            format,
            data: vec![0; size],
        })
    }

    /// Wrap an existing buffer, validating its length.
    pub fn from_data(
        width: u32,
        height: u32,
        format: PixelFormat,
        data: Vec<u8>,
    ) -> Result<Self, ImageError> {
        Self::validate_dimensions(width, height)?;
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(ImageError::SizeMismatch {
                expected,
                got: data.len(),
            });
        }
        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    fn validate_dimensions(width: u32, height: u32) -> Result<(), ImageError> {
        if width == 0 || height == 0 {
            return Err(ImageError::InvalidDimensions {
                width: width as i64,
                height: height as i64,
            });
        }
        Ok(())
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Pixel layout.
    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Bytes per row.
    pub fn stride(&self) -> usize {
        self.width as usize * self.format.bytes_per_pixel()
    }

    /// Total frame size in bytes.
    pub fn byte_len(&self) -> usize {
        self.data.len()
    }

    /// Byte offset of pixel (x, y).
    #[inline]
    pub fn offset(&self, x: u32, y: u32) -> usize {
        y as usize * self.stride() + x as usize * self.format.bytes_per_pixel()
    }

    /// Borrow the raw buffer.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutably borrow the raw buffer.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume the image, returning the raw buffer.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}
