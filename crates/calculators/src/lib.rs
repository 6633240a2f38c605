//! # Calculators
//!
//! The example image filter nodes: pixelate, dither, grayscale, banner
//! overlay, plus an identity passthrough. Each reads at most one frame per
//! tick from its input tag, transforms it in place, and re-packages it onto
//! its output tag. Tuning comes in through side parameters; the calculators
//! themselves carry only their wiring tags.

mod banner;
mod dither;
mod grayscale;
mod passthrough;
mod pixelate;
pub mod tags;

pub use banner::BannerCalculator;
pub use dither::DitherCalculator;
pub use grayscale::GrayscaleCalculator;
pub use passthrough::PassthroughCalculator;
pub use pixelate::PixelateCalculator;
