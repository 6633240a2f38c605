//! GrayscaleCalculator - Rec. 709 luma conversion.

use std::rc::Rc;

use tracing::debug;

use contracts::{Calculator, CalculatorContext, GraphError, Packet, Port, SideParameters, Tag};
use imaging::Image;

use crate::tags::{TAG_DITHERED, TAG_GRAYSCALE};

/// Grayscale node.
///
/// Replaces each pixel's R, G, B with the Rec. 709 luma
/// `0.2126 R + 0.7152 G + 0.0722 B`, leaving alpha untouched. The frame
/// stays in its original pixel format so downstream stages see the same
/// layout.
pub struct GrayscaleCalculator {
    name: String,
    input_tag: Tag,
    output_tag: Tag,
}

impl GrayscaleCalculator {
    /// Create a grayscale node reading the dither stage's output.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_tag: TAG_DITHERED.into(),
            output_tag: TAG_GRAYSCALE.into(),
        }
    }

    /// Override the wiring tags.
    pub fn with_io_tags(mut self, input: impl Into<Tag>, output: impl Into<Tag>) -> Self {
        self.input_tag = input.into();
        self.output_tag = output.into();
        self
    }
}

impl Calculator for GrayscaleCalculator {
    fn name(&self) -> &str {
        &self.name
    }

    fn register_context(&self, side_parameters: Rc<SideParameters>) -> CalculatorContext {
        let mut cc = CalculatorContext::new(side_parameters);
        cc.add_output_port(self.output_tag.clone(), Port::new());
        cc
    }

    fn process(&mut self, cc: &mut CalculatorContext, _delta: f64) -> Result<(), GraphError> {
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

        for pixel in image.data_mut().chunks_mut(px) {
            let luma = (0.2126 * pixel[0] as f64
                + 0.7152 * pixel[1] as f64
                + 0.0722 * pixel[2] as f64) as u8;
            pixel[0] = luma;
            pixel[1] = luma;
            pixel[2] = luma;
            // Alpha untouched
        }

        cc.write_output(&self.output_tag, Packet::of(image))
    }
}
