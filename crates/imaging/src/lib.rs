//! # Imaging
//!
//! Image model and codec collaborators for the filter chain: the owned
//! [`Image`] buffer the calculators mutate in place, a small BMP reader and
//! writer for banner assets, and a hexdump helper for byte-level debugging.

mod bmp;
mod error;
mod hexdump;
mod image;

pub use bmp::{read_bmp, write_bmp};
pub use error::ImageError;
pub use hexdump::hexdump;
pub use image::{Image, PixelFormat};
