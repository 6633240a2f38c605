//! PixelateCalculator - block pixelation with square or triangle cells.

use std::rc::Rc;

use tracing::debug;

use contracts::{
    Calculator, CalculatorContext, GraphError, Packet, PixelShape, Port, SideParameters, Tag,
    TAG_INPUT,
};
use imaging::Image;

use crate::tags::{PARAM_PIXEL_SHAPE, PARAM_PIXEL_SIZE, TAG_PIXELATED};

/// Pixelation node.
///
/// Snaps every pixel to an anchor inside its cell and copies the anchor's
/// color, producing the blocky look. Side parameters:
/// - [`PARAM_PIXEL_SIZE`] (i32): cell size in pixels
/// - [`PARAM_PIXEL_SHAPE`] (PixelShape): square or triangle cells
pub struct PixelateCalculator {
    name: String,
    input_tag: Tag,
    output_tag: Tag,
}

impl PixelateCalculator {
    /// Create a pixelate node reading the external entry.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_tag: TAG_INPUT.into(),
            output_tag: TAG_PIXELATED.into(),
        }
    }

    /// Override the wiring tags.
    pub fn with_io_tags(mut self, input: impl Into<Tag>, output: impl Into<Tag>) -> Self {
        self.input_tag = input.into();
        self.output_tag = output.into();
        self
    }

    /// Anchor of the square cell containing (x, y).
    fn square_anchor(x: u32, y: u32, size: u32, width: u32, height: u32) -> (u32, u32) {
        let ax = (x / size) * size;
        let ay = (y / size) * size;
        (ax.min(width - 1), ay.min(height - 1))
    }

    /// Anchor of the triangle cell containing (x, y).
    ///
    /// The cell square splits along its anti-diagonal: pixels above it snap
    /// to the cell's bottom-right corner, pixels below keep their own color.
    fn triangle_anchor(x: u32, y: u32, size: u32, width: u32, height: u32) -> (u32, u32) {
        let fx = (x % size) as f64 / size as f64;
        let fy = (y % size) as f64 / size as f64;

        if fx + fy >= 1.0 {
            (x, y)
        } else {
            let ax = (x / size + 1) * size - 1;
            let ay = (y / size + 1) * size - 1;
            (ax.min(width - 1), ay.min(height - 1))
        }
    }
}

impl Calculator for PixelateCalculator {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_context(&self, side_parameters: Rc<SideParameters>) -> CalculatorContext {
        let mut cc = CalculatorContext::new(side_parameters);
        cc.add_output_port(self.output_tag.clone(), Port::new());
        cc
    }

    fn process(&mut self, cc: &mut CalculatorContext, _delta: f64) -> Result<(), GraphError> {
        let size = *cc.side_parameter(PARAM_PIXEL_SIZE)?.get::<i32>()?;
        let shape = *cc.side_parameter(PARAM_PIXEL_SHAPE)?.get::<PixelShape>()?;

        let packet = cc.read_input(&self.input_tag)?;
        if !packet.is_valid() {
            return Ok(());
        }

        let mut image: Image = packet.into_payload()?;
        if size > 1 {
            pixelate_in_place(&mut image, size as u32, shape);
        } else {
            debug!(calculator = %self.name, size, "pixel size <= 1, frame forwarded untouched");
        }

        cc.write_output(&self.output_tag, Packet::of(image))
    }
}

fn pixelate_in_place(image: &mut Image, size: u32, shape: PixelShape) {
    let width = image.width();
    let height = image.height();
    let px = image.format().bytes_per_pixel();
    let stride = image.stride();
    let data = image.data_mut();

    for y in 0..height {
        for x in 0..width {
            let (ax, ay) = match shape {
                PixelShape::Square => {
                    PixelateCalculator::square_anchor(x, y, size, width, height)
                }
                PixelShape::Triangle => {
                    PixelateCalculator::triangle_anchor(x, y, size, width, height)
                }
            };

            if (ax, ay) == (x, y) {
                continue;
            }

            let src = ay as usize * stride + ax as usize * px;
            let dst = y as usize * stride + x as usize * px;
            // Anchors are fixed points of the mapping, so the source pixel is
            // never overwritten before it is read.
            for channel in 0..px {
                data[dst + channel] = data[src + channel];
            }
        }
    }
}
