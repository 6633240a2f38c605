//! DitherCalculator - ordered (Bayer) dithering with per-channel levels.

use std::rc::Rc;

use tracing::debug;

use contracts::{
    Calculator, CalculatorContext, GraphError, Packet, Port, SideParameters, Tag,
};
use imaging::Image;

use crate::tags::{
    PARAM_BAYER_LEVEL, PARAM_BLUE_LEVELS, PARAM_GREEN_LEVELS, PARAM_RED_LEVELS, PARAM_SPREAD,
    TAG_DITHERED, TAG_PIXELATED,
};

#[rustfmt::skip]
const BAYER_2: [i32; 4] = [
    0, 2,
    3, 1,
];

#[rustfmt::skip]
const BAYER_4: [i32; 16] = [
     0,  8,  2, 10,
    12,  4, 14,  6,
     3, 11,  1,  9,
    15,  7, 13,  5,
];

#[rustfmt::skip]
const BAYER_8: [i32; 64] = [
     0, 32,  8, 40,  2, 34, 10, 42,
    48, 16, 56, 24, 50, 18, 58, 26,
    12, 44,  4, 36, 14, 46,  6, 38,
    60, 28, 52, 20, 62, 30, 54, 22,
     3, 35, 11, 43,  1, 33,  9, 41,
    51, 19, 59, 27, 49, 17, 57, 25,
    15, 47,  7, 39, 13, 45,  5, 37,
    63, 31, 55, 23, 61, 29, 53, 21,
];

/// Ordered-dithering node.
///
/// Quantizes each color channel to a configurable number of levels, with a
/// Bayer threshold matrix spreading the quantization error spatially. Side
/// parameters: [`PARAM_RED_LEVELS`], [`PARAM_GREEN_LEVELS`],
/// [`PARAM_BLUE_LEVELS`], [`PARAM_SPREAD`], [`PARAM_BAYER_LEVEL`].
pub struct DitherCalculator {
    name: String,
    input_tag: Tag,
    output_tag: Tag,
}

impl DitherCalculator {
    /// Create a dither node reading the pixelate stage's output.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_tag: TAG_PIXELATED.into(),
            output_tag: TAG_DITHERED.into(),
        }
    }

    /// Override the wiring tags.
    pub fn with_io_tags(mut self, input: impl Into<Tag>, output: impl Into<Tag>) -> Self {
        self.input_tag = input.into();
        self.output_tag = output.into();
        self
    }

    /// Normalized Bayer threshold in [-0.5, 0.5) for matrix cell (row, col).
    ///
    /// The row index walks the matrix, the column index selects the line:
    /// `threshold(row, col) = matrix[row % n + (col % n) * n]`.
    fn bayer_value(row: u32, col: u32, level: i32) -> f64 {
        match level {
            0 => BAYER_2[((row % 2) + (col % 2) * 2) as usize] as f64 / 4.0 - 0.5,
            1 => BAYER_4[((row % 4) + (col % 4) * 4) as usize] as f64 / 16.0 - 0.5,
            _ => BAYER_8[((row % 8) + (col % 8) * 8) as usize] as f64 / 64.0 - 0.5,
        }
    }

    /// Quantize one channel sample.
    fn quantize(value: u8, levels: i32, spread: i32, bayer: f64) -> u8 {
        let levels = (levels - 1).max(1) as f64;
        let shifted = levels * (value as f64 / 255.0) + spread as f64 * (bayer + 0.5);
        ((shifted.floor() / levels) * 255.0).clamp(0.0, 255.0) as u8
    }
}

impl Calculator for DitherCalculator {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_context(&self, side_parameters: Rc<SideParameters>) -> CalculatorContext {
        let mut cc = CalculatorContext::new(side_parameters);
        cc.add_output_port(self.output_tag.clone(), Port::new());
        cc
    }

    fn process(&mut self, cc: &mut CalculatorContext, _delta: f64) -> Result<(), GraphError> {
        let red_levels = *cc.side_parameter(PARAM_RED_LEVELS)?.get::<i32>()?;
        let green_levels = *cc.side_parameter(PARAM_GREEN_LEVELS)?.get::<i32>()?;
        let blue_levels = *cc.side_parameter(PARAM_BLUE_LEVELS)?.get::<i32>()?;
        let spread = *cc.side_parameter(PARAM_SPREAD)?.get::<i32>()?;
        let bayer_level = *cc.side_parameter(PARAM_BAYER_LEVEL)?.get::<i32>()?;

        let packet = cc.read_input(&self.input_tag)?;
        if !packet.is_valid() {
            return Ok(());
        }

        let mut image: Image = packet.into_payload()?;
        let px = image.format().bytes_per_pixel();
        if px < 3 {
            debug!(calculator = %self.name, "single-channel frame forwarded untouched");
            return cc.write_output(&self.output_tag, Packet::of(image));
        }

        let width = image.width();
        let height = image.height();
        let stride = image.stride();
        let data = image.data_mut();

        for y in 0..height {
            for x in 0..width {
                let offset = y as usize * stride + x as usize * px;
                let bayer = Self::bayer_value(y, x, bayer_level);

                data[offset] = Self::quantize(data[offset], red_levels, spread, bayer);
                data[offset + 1] = Self::quantize(data[offset + 1], green_levels, spread, bayer);
                data[offset + 2] = Self::quantize(data[offset + 2], blue_levels, spread, bayer);
                // Alpha untouched
            }
        }

        cc.write_output(&self.output_tag, Packet::of(image))
    }
}
