//! CalculatorContext - Per-calculator registry of ports and side parameters.
//!
//! Holds the named input ports, output ports, and shared read-only side
//! parameters for one calculator. Ports are shared handles: the scheduler
//! binds an upstream context's output port directly as a downstream
//! context's input port, so a write on one side is immediately visible as
//! a read on the other.

use std::collections::HashMap;
use std::rc::Rc;

use crate::{GraphError, Packet, Port, PortHandle, Tag};

/// Read-only configuration packets shared by every context in the graph.
///
/// Built once before the graph is connected and never mutated afterwards.
/// This is how calculator-specific configuration (pixel size, dither levels,
/// banner bitmap, overlay offsets) is injected.
pub type SideParameters = HashMap<Tag, Packet>;

/// Per-calculator port and side-parameter registry.
pub struct CalculatorContext {
    inputs: HashMap<Tag, PortHandle>,
    outputs: HashMap<Tag, PortHandle>,
    side_parameters: Rc<SideParameters>,
}

impl CalculatorContext {
    /// Create an empty context holding the shared side-parameter map.
    pub fn new(side_parameters: Rc<SideParameters>) -> Self {
        Self {
            inputs: HashMap::new(),
            outputs: HashMap::new(),
            side_parameters,
        }
    }

    /// Install a fresh input port under `tag` if and only if the tag is
    /// free. On collision the existing port is retained.
    pub fn add_input_port(&mut self, tag: impl Into<Tag>, port: Port) {
        self.inputs
            .entry(tag.into())
            .or_insert_with(|| port.into_handle());
    }

    /// Install a fresh output port under `tag` if and only if the tag is
    /// free. On collision the existing port is retained.
    pub fn add_output_port(&mut self, tag: impl Into<Tag>, port: Port) {
        self.outputs
            .entry(tag.into())
            .or_insert_with(|| port.into_handle());
    }

    /// Install an externally owned port as an input under `tag`,
    /// overwriting any existing entry.
    pub fn bind_input_port(&mut self, tag: impl Into<Tag>, port: PortHandle) {
        self.inputs.insert(tag.into(), port);
    }

    /// Install an externally owned port as an output under `tag`,
    /// overwriting any existing entry.
    pub fn bind_output_port(&mut self, tag: impl Into<Tag>, port: PortHandle) {
        self.outputs.insert(tag.into(), port);
    }

    /// Look up the input port registered under `tag`.
    pub fn input_port(&self, tag: &str) -> Result<PortHandle, GraphError> {
        self.inputs
            .get(tag)
            .cloned()
            .ok_or_else(|| GraphError::unknown_input_port(tag))
    }

    /// Look up the output port registered under `tag`.
    pub fn output_port(&self, tag: &str) -> Result<PortHandle, GraphError> {
        self.outputs
            .get(tag)
            .cloned()
            .ok_or_else(|| GraphError::unknown_output_port(tag))
    }

    /// Look up the shared side parameter registered under `tag`.
    pub fn side_parameter(&self, tag: &str) -> Result<&Packet, GraphError> {
        self.side_parameters
            .get(tag)
            .ok_or_else(|| GraphError::UnknownSideParameter { tag: tag.into() })
    }

    /// Pop one packet from the input port under `tag`.
    ///
    /// Returns the invalid packet when the port is empty; fails only when
    /// the tag itself is unknown.
    pub fn read_input(&self, tag: &str) -> Result<Packet, GraphError> {
        Ok(self.input_port(tag)?.borrow_mut().read())
    }

    /// Write one packet to the output port under `tag`.
    pub fn write_output(&self, tag: &str, packet: Packet) -> Result<(), GraphError> {
        self.output_port(tag)?.borrow_mut().write(packet);
        Ok(())
    }

    /// Currently installed input tags (unspecified order).
    pub fn input_tags(&self) -> Vec<Tag> {
        self.inputs.keys().cloned().collect()
    }

    /// Currently installed output tags (unspecified order).
    pub fn output_tags(&self) -> Vec<Tag> {
        self.outputs.keys().cloned().collect()
    }

    /// True when an input port is registered under `tag`.
    pub fn has_input(&self, tag: &str) -> bool {
        self.inputs.contains_key(tag)
    }

    /// True when an output port is registered under `tag`.
    pub fn has_output(&self, tag: &str) -> bool {
        self.outputs.contains_key(tag)
    }

    /// True when a side parameter is registered under `tag`.
    pub fn has_side_parameter(&self, tag: &str) -> bool {
        self.side_parameters.contains_key(tag)
    }
}

impl std::fmt::Debug for CalculatorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CalculatorContext")
            .field("inputs", &self.input_tags())
            .field("outputs", &self.output_tags())
            .field("side_parameters", &self.side_parameters.len())
            .finish()
    }
}
