//! Calculator trait - Pipeline node lifecycle
//!
//! Defines the abstract interface every pipeline node implements. The
//! scheduler owns the calculators, drives their lifecycle, and wires their
//! ports; a calculator only declares its output ports and implements the
//! per-tick work step.

use std::rc::Rc;

use crate::{CalculatorContext, GraphError, SideParameters};

/// Pipeline node with a four-phase lifecycle.
///
/// The scheduler calls `enter`, `process`, `close` in order on every tick a
/// calculator is visited. `delta` is the scheduler-wide time elapsed since
/// the previous frame started, in seconds - a calculator must not depend on
/// which other calculator runs in the same tick.
///
/// # Contract
///
/// 1. **No retained packets**: packet references must not outlive a single
///    `process` call.
/// 2. **Side parameters are read-only**: contexts share one map.
/// 3. **Fixed ports**: no ports are added or removed after
///    [`Calculator::register_context`] returns.
/// 4. **No-op on empty input**: a tick that finds no input packet returns
///    without emitting output.
pub trait Calculator {
    /// Human-readable node name; also the scheduler's context key.
    fn name(&self) -> &str;

    /// Build a fresh context prepopulated with this calculator's *output*
    /// ports. Input ports are bound later, when the scheduler connects the
    /// graph. The side-parameter map is stored inside the context.
    fn register_context(&self, side_parameters: Rc<SideParameters>) -> CalculatorContext;

    /// Per-tick setup, called before [`Calculator::process`].
    fn enter(&mut self, _cc: &mut CalculatorContext, _delta: f64) -> Result<(), GraphError> {
        Ok(())
    }

    /// The work step: typically reads at most one packet from the
    /// designated input port and writes at most one to the designated
    /// output port.
    fn process(&mut self, cc: &mut CalculatorContext, delta: f64) -> Result<(), GraphError>;

    /// Per-tick teardown, called after [`Calculator::process`].
    fn close(&mut self, _cc: &mut CalculatorContext, _delta: f64) -> Result<(), GraphError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Packet, Port, TAG_INPUT, TAG_OUTPUT};

    /// Minimal identity node used to exercise the trait surface.
    struct Identity;

    impl Calculator for Identity {
        fn name(&self) -> &str {
            "identity"
        }

        fn register_context(&self, side_parameters: Rc<SideParameters>) -> CalculatorContext {
            let mut cc = CalculatorContext::new(side_parameters);
            cc.add_output_port(TAG_OUTPUT, Port::new());
            cc
        }

        fn process(&mut self, cc: &mut CalculatorContext, _delta: f64) -> Result<(), GraphError> {
            let packet = cc.read_input(TAG_INPUT)?;
            if !packet.is_valid() {
                return Ok(());
            }
            cc.write_output(TAG_OUTPUT, packet)
        }
    }

    #[test]
    fn test_lifecycle_defaults_are_noops() {
        let mut calc = Identity;
        let mut cc = calc.register_context(Rc::new(SideParameters::new()));
        assert!(calc.enter(&mut cc, 0.0).is_ok());
        assert!(calc.close(&mut cc, 0.0).is_ok());
    }

    #[test]
    fn test_identity_moves_packet() {
        let mut calc = Identity;
        let mut cc = calc.register_context(Rc::new(SideParameters::new()));
        cc.bind_input_port(TAG_INPUT, Port::new().into_handle());

        cc.input_port(TAG_INPUT)
            .unwrap()
            .borrow_mut()
            .write(Packet::of(5i32));

        calc.process(&mut cc, 0.016).unwrap();

        let out = cc.output_port(TAG_OUTPUT).unwrap().borrow_mut().read();
        assert_eq!(*out.get::<i32>().unwrap(), 5);
    }

    #[test]
    fn test_empty_input_is_noop_tick() {
        let mut calc = Identity;
        let mut cc = calc.register_context(Rc::new(SideParameters::new()));
        cc.bind_input_port(TAG_INPUT, Port::new().into_handle());

        calc.process(&mut cc, 0.016).unwrap();
        assert!(cc.output_port(TAG_OUTPUT).unwrap().borrow().is_empty());
    }
}
