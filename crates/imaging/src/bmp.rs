//! BMP codec for banner assets and frame dumps.
//!
//! Handles the two layouts produced by common editors: 24-bit `BI_RGB` with
//! 4-byte row padding, and 32-bit `BI_BITFIELDS` with BGRA masks and an sRGB
//! color space (written as a V4 header). Rows are stored bottom-up in the
//! file and flipped to the top-down convention of [`Image`] in memory.

use std::fs;
use std::path::Path;

use tracing::debug;

use crate::{Image, ImageError, PixelFormat};

const FILE_HEADER_SIZE: usize = 14;
const INFO_HEADER_SIZE: usize = 40;
const V4_HEADER_SIZE: usize = 108;

// 32-bit files must carry the BGRA channel order these masks describe.
const RED_MASK: u32 = 0x00ff_0000;
const GREEN_MASK: u32 = 0x0000_ff00;
const BLUE_MASK: u32 = 0x0000_00ff;
const ALPHA_MASK: u32 = 0xff00_0000;
const SRGB_COLOR_SPACE: u32 = 0x7352_4742; // "sRGB"

const BI_RGB: u32 = 0;
const BI_BITFIELDS: u32 = 3;

/// Read a BMP file into an [`Image`].
pub fn read_bmp(path: impl AsRef<Path>) -> Result<Image, ImageError> {
    let path = path.as_ref();
    let bytes = fs::read(path)?;

    if bytes.len() < FILE_HEADER_SIZE + INFO_HEADER_SIZE {
        return Err(ImageError::truncated("file shorter than BMP headers"));
    }
    if &bytes[0..2] != b"BM" {
        return Err(ImageError::InvalidSignature);
    }

    let data_offset = u32_at(&bytes, 10) as usize;
    let info_size = u32_at(&bytes, 14) as usize;
    let width = i32_at(&bytes, 18);
    let height = i32_at(&bytes, 22);
    let bit_count = u16_at(&bytes, 28);
    let compression = u32_at(&bytes, 30);

    if width <= 0 || height == 0 {
        return Err(ImageError::InvalidDimensions {
            width: width as i64,
            height: height as i64,
        });
    }

    let format = match bit_count {
        24 => PixelFormat::Rgb24,
        32 => PixelFormat::Rgba32,
        bits => return Err(ImageError::UnsupportedBitDepth { bits }),
    };

    match (bit_count, compression) {
        (_, BI_RGB) => {}
        (32, BI_BITFIELDS) => validate_masks(&bytes, info_size)?,
        (_, other) => {
            return Err(ImageError::unsupported_layout(format!(
                "compression {other} not supported"
            )))
        }
    }

    // Positive height means bottom-up row order in the file.
    let top_down = height < 0;
    let height = height.unsigned_abs();
    let width = width as u32;

    let row_bytes = width as usize * format.bytes_per_pixel();
    let padded_row = (row_bytes + 3) & !3;
    let pixel_bytes = padded_row * height as usize;

    if bytes.len() < data_offset + pixel_bytes {
        return Err(ImageError::truncated(format!(
            "expected {} pixel bytes at offset {}, file has {}",
            pixel_bytes,
            data_offset,
            bytes.len()
        )));
    }

    let mut data = vec![0u8; row_bytes * height as usize];
    for y in 0..height as usize {
        let src_row = if top_down {
            y
        } else {
            height as usize - 1 - y
        };
        let src = data_offset + src_row * padded_row;
        data[y * row_bytes..(y + 1) * row_bytes].copy_from_slice(&bytes[src..src + row_bytes]);
    }

    debug!(
        path = %path.display(),
        width,
        height,
        bits = bit_count,
        "BMP loaded"
    );

    Image::from_data(width, height, format, data)
}

/// Write an [`Image`] as a BMP file.
///
/// 24-bit frames get a plain `BITMAPINFOHEADER`; 32-bit frames a V4 header
/// with BGRA masks and the sRGB color space, matching what [`read_bmp`]
/// accepts. Grayscale frames are not supported (BMP would need a palette).
pub fn write_bmp(path: impl AsRef<Path>, image: &Image) -> Result<(), ImageError> {
    let (info_size, compression) = match image.format() {
        PixelFormat::Rgb24 => (INFO_HEADER_SIZE, BI_RGB),
        PixelFormat::Rgba32 => (V4_HEADER_SIZE, BI_BITFIELDS),
        PixelFormat::Grayscale8 => return Err(ImageError::UnsupportedBitDepth { bits: 8 }),
    };

    let row_bytes = image.stride();
    let padded_row = (row_bytes + 3) & !3;
    let data_offset = FILE_HEADER_SIZE + info_size;
    let file_size = data_offset + padded_row * image.height() as usize;

    let mut out = Vec::with_capacity(file_size);

    // File header
    out.extend_from_slice(b"BM");
    push_u32(&mut out, file_size as u32);
    push_u32(&mut out, 0); // reserved
    push_u32(&mut out, data_offset as u32);

    // Info header
    push_u32(&mut out, info_size as u32);
    push_u32(&mut out, image.width());
    push_u32(&mut out, image.height());
    push_u16(&mut out, 1); // planes
    push_u16(&mut out, image.format().bits_per_pixel() as u16);
    push_u32(&mut out, compression);
    push_u32(&mut out, (padded_row * image.height() as usize) as u32);
    push_u32(&mut out, 0); // x pixels per meter
    push_u32(&mut out, 0); // y pixels per meter
    push_u32(&mut out, 0); // colors used
    push_u32(&mut out, 0); // important colors

    if info_size == V4_HEADER_SIZE {
        push_u32(&mut out, RED_MASK);
        push_u32(&mut out, GREEN_MASK);
        push_u32(&mut out, BLUE_MASK);
        push_u32(&mut out, ALPHA_MASK);
        push_u32(&mut out, SRGB_COLOR_SPACE);
        // CIEXYZ endpoints + gamma, unused under sRGB
        out.extend_from_slice(&[0u8; 48]);
    }

    // Pixel rows, bottom-up with zero padding
    let padding = vec![0u8; padded_row - row_bytes];
    for y in (0..image.height() as usize).rev() {
        let row = &image.data()[y * row_bytes..(y + 1) * row_bytes];
        out.extend_from_slice(row);
        out.extend_from_slice(&padding);
    }

    fs::write(path, out)?;
    Ok(())
}

fn validate_masks(bytes: &[u8], info_size: usize) -> Result<(), ImageError> {
    if info_size < 56 || bytes.len() < FILE_HEADER_SIZE + 56 {
        return Err(ImageError::unsupported_layout(
            "32-bit BMP without channel masks",
        ));
    }

    let red = u32_at(bytes, 54);
    let green = u32_at(bytes, 58);
    let blue = u32_at(bytes, 62);
    let alpha = u32_at(bytes, 66);
    if (red, green, blue, alpha) != (RED_MASK, GREEN_MASK, BLUE_MASK, ALPHA_MASK) {
        return Err(ImageError::unsupported_layout(format!(
            "unexpected channel masks r={red:#010x} g={green:#010x} b={blue:#010x} a={alpha:#010x}"
        )));
    }

    if info_size >= V4_HEADER_SIZE && bytes.len() >= FILE_HEADER_SIZE + 74 {
        let color_space = u32_at(bytes, 70);
        if color_space != SRGB_COLOR_SPACE {
            return Err(ImageError::unsupported_layout(format!(
                "unexpected color space {color_space:#010x}"
            )));
        }
    }

    Ok(())
}

fn u16_at(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn u32_at(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn i32_at(bytes: &[u8], offset: usize) -> i32 {
    u32_at(bytes, offset) as i32
}

fn push_u16(out: &mut Vec<u8>, value: u16) {
    out.extend_from_slice(&value.to_le_bytes());
}

fn push_u32(out: &mut Vec<u8>, value: u32) {
    out.extend_from_slice(&value.to_le_bytes());
}
