//! BannerCalculator - alpha-keyed banner overlay.

use std::rc::Rc;

use contracts::{
    Calculator, CalculatorContext, GraphError, Packet, Port, SideParameters, Tag, TAG_OUTPUT,
};
use imaging::{Image, PixelFormat};

use crate::tags::{PARAM_BANNER_IMAGE, PARAM_OVERLAY_X, PARAM_OVERLAY_Y, TAG_GRAYSCALE};

/// Banner overlay node, the terminal stage of the reference chain.
///
/// Copies the side-parameter banner bitmap onto the frame at the configured
/// offset, skipping fully transparent banner pixels. Side parameters:
/// [`PARAM_BANNER_IMAGE`] (RGBA image), [`PARAM_OVERLAY_X`],
/// [`PARAM_OVERLAY_Y`].
pub struct BannerCalculator {
    name: String,
    input_tag: Tag,
    output_tag: Tag,
}

impl BannerCalculator {
    /// Create a banner node reading the grayscale stage's output and
    /// writing the external exit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_tag: TAG_GRAYSCALE.into(),
            output_tag: TAG_OUTPUT.into(),
        }
    }

    /// Override the wiring tags.
    pub fn with_io_tags(mut self, input: impl Into<Tag>, output: impl Into<Tag>) -> Self {
        self.input_tag = input.into();
        self.output_tag = output.into();
        self
    }
}

impl Calculator for BannerCalculator {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_context(&self, side_parameters: Rc<SideParameters>) -> CalculatorContext {
        let mut cc = CalculatorContext::new(side_parameters);
        cc.add_output_port(self.output_tag.clone(), Port::new());
        cc
    }

    fn process(&mut self, cc: &mut CalculatorContext, _delta: f64) -> Result<(), GraphError> {
        let overlay_x = *cc.side_parameter(PARAM_OVERLAY_X)?.get::<i32>()?;
        let overlay_y = *cc.side_parameter(PARAM_OVERLAY_Y)?.get::<i32>()?;

        let packet = cc.read_input(&self.input_tag)?;
        if !packet.is_valid() {
            return Ok(());
        }

        let mut image: Image = packet.into_payload()?;
        {
            let banner = cc.side_parameter(PARAM_BANNER_IMAGE)?.get::<Image>()?;
            if banner.format() != PixelFormat::Rgba32 {
                return Err(GraphError::calculator(
                    self.name.as_str(),
                    "banner bitmap must be RGBA",
                ));
            }
            overlay(&mut image, banner, overlay_x, overlay_y);
        }

        cc.write_output(&self.output_tag, Packet::of(image))
    }
}

fn overlay(image: &mut Image, banner: &Image, overlay_x: i32, overlay_y: i32) {
    let width = image.width() as i64;
    let height = image.height() as i64;
    let px = image.format().bytes_per_pixel();
    let stride = image.stride();

    let banner_stride = banner.stride();
    let banner_data = banner.data();
    let data = image.data_mut();

    for by in 0..banner.height() as i64 {
        let oy = overlay_y as i64 + by;
        if oy < 0 || oy >= height {
            continue;
        }

        for bx in 0..banner.width() as i64 {
            let ox = overlay_x as i64 + bx;
            if ox < 0 || ox >= width {
                continue;
            }

            let src = by as usize * banner_stride + bx as usize * 4;
            let alpha = banner_data[src + 3];
            if alpha == 0 {
                continue;
            }

            let dst = oy as usize * stride + ox as usize * px;
            let channels = px.min(3);
            data[dst..dst + channels].copy_from_slice(&banner_data[src..src + channels]);
            if px == 4 {
                data[dst + 3] = alpha;
            }
        }
    }
}
