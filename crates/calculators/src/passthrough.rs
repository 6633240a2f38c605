//! PassthroughCalculator - forwards packets untouched.

use std::rc::Rc;

use contracts::{
    Calculator, CalculatorContext, GraphError, Port, SideParameters, Tag, TAG_INPUT, TAG_OUTPUT,
};

/// Identity node: moves any input packet to its output unchanged.
///
/// Useful as a pipeline smoke test and as the smallest possible calculator.
pub struct PassthroughCalculator {
    name: String,
    input_tag: Tag,
    output_tag: Tag,
}

impl PassthroughCalculator {
    /// Create a passthrough reading the external entry and writing the
    /// external exit.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            input_tag: TAG_INPUT.into(),
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

impl Calculator for PassthroughCalculator {
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
        cc.write_output(&self.output_tag, packet)
    }
}
