//! Main scheduler implementation.

use std::collections::HashMap;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, info, instrument, trace};

use contracts::{
    Calculator, CalculatorContext, GraphError, Packet, Port, PortHandle, SchedulerConfig,
    SideParameters, Tag, TAG_INPUT, TAG_OUTPUT,
};

/// Default target frame rate (frames per second).
pub const DEFAULT_FRAME_RATE: u32 = 60;

/// Scheduler lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Calculators may still be registered
    Unconnected,
    /// Graph wired, ready to run
    Connected,
    /// Between the first `run()` entry and `stop()`
    Running,
    /// Terminal
    Stopped,
}

impl SchedulerState {
    /// State name for diagnostics
    pub fn as_str(self) -> &'static str {
        match self {
            SchedulerState::Unconnected => "unconnected",
            SchedulerState::Connected => "connected",
            SchedulerState::Running => "running",
            SchedulerState::Stopped => "stopped",
        }
    }
}

/// Counters exposed for the stats layer
#[derive(Debug, Clone, Copy, Default)]
pub struct SchedulerStats {
    /// Completed `run()` frames
    pub frames: u64,
    /// Calculator visits across all frames
    pub ticks: u64,
    /// Packets waiting on the external input port
    pub input_depth: usize,
    /// Packets waiting on the external output port
    pub output_depth: usize,
    /// Stale packets refused by the external input port
    pub input_dropped_stale: u64,
    /// Packets evicted from the external input port by the capacity bound
    pub input_dropped_capacity: u64,
}

/// Bridges an external producer into the pipeline.
pub type InputCallback = Box<dyn FnMut() -> Packet>;

/// Drains the pipeline's external output port.
pub type OutputCallback = Box<dyn FnMut(Packet)>;

/// Frame-paced cooperative scheduler over a linear calculator sequence.
///
/// Owns the calculators, their contexts, and the two sentinel ports bridging
/// the outside world. One [`Scheduler::run`] call is one *frame*: the inner
/// loop visits calculators cyclically from the persisted cursor and yields
/// once the frame's time budget is consumed. The scheduler never sleeps;
/// pacing between frames is the caller's job.
pub struct Scheduler {
    calculators: Vec<Box<dyn Calculator>>,
    contexts: HashMap<String, CalculatorContext>,
    state: SchedulerState,

    /// Cursor into the calculator sequence, preserved across frames.
    cursor: usize,

    frame_rate: u32,
    frame_duration: Duration,

    input_port: PortHandle,
    output_port: PortHandle,

    input_callback: Option<InputCallback>,
    output_callback: Option<OutputCallback>,

    started_at: Option<Instant>,
    frame_started_at: Option<Instant>,

    frames: u64,
    ticks: u64,
}

impl Scheduler {
    /// Create a scheduler with the default frame rate and port capacity.
    pub fn new() -> Self {
        Self::with_config(&SchedulerConfig::default())
    }

    /// Create a scheduler targeting `frame_rate` frames per second.
    pub fn with_frame_rate(frame_rate: u32) -> Self {
        Self::with_config(&SchedulerConfig {
            frame_rate,
            ..SchedulerConfig::default()
        })
    }

    /// Create a scheduler from blueprint settings.
    pub fn with_config(config: &SchedulerConfig) -> Self {
        let frame_rate = config.frame_rate.max(1);
        Self {
            calculators: Vec::new(),
            contexts: HashMap::new(),
            state: SchedulerState::Unconnected,
            cursor: 0,
            frame_rate,
            frame_duration: Duration::from_micros(1_000_000 / frame_rate as u64),
            input_port: Port::with_capacity(config.port_capacity).into_handle(),
            output_port: Port::with_capacity(config.port_capacity).into_handle(),
            input_callback: None,
            output_callback: None,
            started_at: None,
            frame_started_at: None,
            frames: 0,
            ticks: 0,
        }
    }

    /// Append a calculator to the sequence and store the context it builds.
    ///
    /// # Errors
    /// - [`GraphError::InvalidState`] once the graph is connected
    /// - [`GraphError::DuplicateCalculator`] when the name is taken
    pub fn register_calculator(
        &mut self,
        calculator: Box<dyn Calculator>,
        side_parameters: Rc<SideParameters>,
    ) -> Result<(), GraphError> {
        if self.state != SchedulerState::Unconnected {
            return Err(GraphError::InvalidState {
                expected: "unconnected",
                actual: self.state.as_str(),
            });
        }

        let name = calculator.name().to_string();
        if self.contexts.contains_key(&name) {
            return Err(GraphError::DuplicateCalculator { name });
        }

        let context = calculator.register_context(side_parameters);
        debug!(
            calculator = %name,
            outputs = ?context.output_tags(),
            "calculator registered"
        );

        self.contexts.insert(name, context);
        self.calculators.push(calculator);
        Ok(())
    }

    /// Wire the pipeline: for each adjacent pair, every output port of the
    /// upstream context is bound as an input port of the downstream context
    /// under the same tag. The external input port is bound into the first
    /// context under [`TAG_INPUT`]; the external output port into the last
    /// context under [`TAG_OUTPUT`].
    ///
    /// Tag propagation is permissive: downstream contexts also receive tags
    /// they never read and simply ignore them.
    #[instrument(name = "scheduler_connect", skip(self))]
    pub fn connect_calculators(&mut self) -> Result<(), GraphError> {
        if self.calculators.is_empty() {
            return Err(GraphError::EmptyPipeline);
        }
        if self.state != SchedulerState::Unconnected {
            return Err(GraphError::InvalidState {
                expected: "unconnected",
                actual: self.state.as_str(),
            });
        }

        for window in 0..self.calculators.len().saturating_sub(1) {
            let upstream = self.calculators[window].name().to_string();
            let downstream = self.calculators[window + 1].name().to_string();

            let shared: Vec<(Tag, PortHandle)> = {
                let cc = self.context(&upstream)?;
                let mut shared = Vec::new();
                for tag in cc.output_tags() {
                    let handle = cc.output_port(&tag)?;
                    shared.push((tag, handle));
                }
                shared
            };

            let cc = self.context_mut(&downstream)?;
            for (tag, handle) in shared {
                trace!(from = %upstream, to = %downstream, tag = %tag, "port bound");
                cc.bind_input_port(tag, handle);
            }
        }

        let first = self.calculators[0].name().to_string();
        let input_handle = Rc::clone(&self.input_port);
        self.context_mut(&first)?
            .bind_input_port(TAG_INPUT, input_handle);

        let last = self.calculators[self.calculators.len() - 1].name().to_string();
        let output_handle = Rc::clone(&self.output_port);
        self.context_mut(&last)?
            .bind_output_port(TAG_OUTPUT, output_handle);

        self.state = SchedulerState::Connected;
        info!(calculators = self.calculators.len(), "pipeline connected");
        Ok(())
    }

    /// Enqueue a packet on the external input port.
    ///
    /// Monotonic admission still applies: stale or invalid packets are
    /// silently dropped by the port.
    pub fn write_to_input_port(&mut self, packet: Packet) {
        self.input_port.borrow_mut().write(packet);
    }

    /// Dequeue from the external output port; the invalid packet when empty.
    pub fn read_from_output_port(&mut self) -> Packet {
        self.output_port.borrow_mut().read()
    }

    /// Register the bridging callback feeding the external input port.
    ///
    /// Invoked once per inner-loop iteration while a frame runs; whatever it
    /// returns goes through the external input port's admission rule.
    pub fn register_input_callback(&mut self, callback: impl FnMut() -> Packet + 'static) {
        self.input_callback = Some(Box::new(callback));
    }

    /// Register the bridging callback draining the external output port.
    ///
    /// Invoked once per inner-loop iteration with whatever the port yields,
    /// valid or not - the consumer decides.
    pub fn register_output_callback(&mut self, callback: impl FnMut(Packet) + 'static) {
        self.output_callback = Some(Box::new(callback));
    }

    /// Execute one frame.
    ///
    /// Visits calculators cyclically from the cursor, invoking
    /// `enter`/`process`/`close` on each and pumping the I/O callbacks, until
    /// the frame budget (`1 / frame_rate`) is consumed. The budget is checked
    /// after each visit, so an overrunning calculator is visited exactly once
    /// and the frame yields late rather than pre-empting it.
    ///
    /// Calculator errors propagate out without advancing the cursor past the
    /// failing calculator. A stopped scheduler no-ops.
    pub fn run(&mut self) -> Result<(), GraphError> {
        match self.state {
            SchedulerState::Stopped => {
                debug!("run() on stopped scheduler, nothing to do");
                return Ok(());
            }
            SchedulerState::Unconnected => {
                if self.calculators.is_empty() {
                    return Err(GraphError::EmptyPipeline);
                }
                return Err(GraphError::InvalidState {
                    expected: "connected",
                    actual: self.state.as_str(),
                });
            }
            SchedulerState::Connected => {
                self.state = SchedulerState::Running;
                self.started_at = Some(Instant::now());
                info!(
                    frame_rate = self.frame_rate,
                    budget_us = self.frame_duration.as_micros() as u64,
                    "scheduler started"
                );
            }
            SchedulerState::Running => {}
        }

        // Inter-frame delta: seconds since the previous run() entry.
        let delta = self
            .frame_started_at
            .map(|previous| previous.elapsed().as_secs_f64())
            .unwrap_or(0.0);
        let frame_start = Instant::now();
        self.frame_started_at = Some(frame_start);

        while self.state == SchedulerState::Running {
            if let Some(callback) = self.input_callback.as_mut() {
                let packet = callback();
                self.input_port.borrow_mut().write(packet);
            }

            let calculator = &mut self.calculators[self.cursor];
            let name = calculator.name();
            let context = match self.contexts.get_mut(name) {
                Some(context) => context,
                None => return Err(GraphError::calculator(name, "no registered context")),
            };

            calculator.enter(context, delta)?;
            calculator.process(context, delta)?;
            calculator.close(context, delta)?;

            if let Some(callback) = self.output_callback.as_mut() {
                let packet = self.output_port.borrow_mut().read();
                callback(packet);
            }

            self.cursor = (self.cursor + 1) % self.calculators.len();
            self.ticks += 1;

            if frame_start.elapsed() >= self.frame_duration {
                break;
            }
        }

        self.frames += 1;
        Ok(())
    }

    /// Leave the frame loop; the scheduler is terminal afterwards.
    pub fn stop(&mut self) {
        info!(frames = self.frames, ticks = self.ticks, "scheduler stopped");
        self.state = SchedulerState::Stopped;
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Seconds since the first `run()` entry; 0.0 before that.
    pub fn elapsed(&self) -> f64 {
        self.started_at
            .map(|start| start.elapsed().as_secs_f64())
            .unwrap_or(0.0)
    }

    /// Configured target frame rate.
    pub fn frame_rate(&self) -> u32 {
        self.frame_rate
    }

    /// Runtime counters for the stats layer.
    pub fn stats(&self) -> SchedulerStats {
        let input = self.input_port.borrow();
        SchedulerStats {
            frames: self.frames,
            ticks: self.ticks,
            input_depth: input.size(),
            output_depth: self.output_port.borrow().size(),
            input_dropped_stale: input.dropped_stale(),
            input_dropped_capacity: input.dropped_capacity(),
        }
    }

    fn context(&self, name: &str) -> Result<&CalculatorContext, GraphError> {
        self.contexts
            .get(name)
            .ok_or_else(|| GraphError::calculator(name, "no registered context"))
    }

    fn context_mut(&mut self, name: &str) -> Result<&mut CalculatorContext, GraphError> {
        self.contexts
            .get_mut(name)
            .ok_or_else(|| GraphError::calculator(name, "no registered context"))
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::Port;
    use std::cell::RefCell;

    /// Forwards any packet from the external input to the external output.
    struct Passthrough {
        name: String,
    }

    impl Passthrough {
        fn new(name: &str) -> Self {
            Self { name: name.into() }
        }
    }

    impl Calculator for Passthrough {
        fn name(&self) -> &str {
            &self.name
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

    /// Publishes incremented integers under a named tag.
    struct Incrementer;

    impl Calculator for Incrementer {
        fn name(&self) -> &str {
            "incrementer"
        }

        fn register_context(&self, side_parameters: Rc<SideParameters>) -> CalculatorContext {
            let mut cc = CalculatorContext::new(side_parameters);
            cc.add_output_port("incremented", Port::new());
            cc
        }

        fn process(&mut self, cc: &mut CalculatorContext, _delta: f64) -> Result<(), GraphError> {
            let packet = cc.read_input(TAG_INPUT)?;
            if !packet.is_valid() {
                return Ok(());
            }
            let value = *packet.get::<i32>()?;
            cc.write_output("incremented", Packet::of(value + 1))
        }
    }

    /// Consumes the upstream "incremented" tag and forwards to the exit.
    struct Forwarder;

    impl Calculator for Forwarder {
        fn name(&self) -> &str {
            "forwarder"
        }

        fn register_context(&self, side_parameters: Rc<SideParameters>) -> CalculatorContext {
            let mut cc = CalculatorContext::new(side_parameters);
            cc.add_output_port(TAG_OUTPUT, Port::new());
            cc
        }

        fn process(&mut self, cc: &mut CalculatorContext, _delta: f64) -> Result<(), GraphError> {
            let packet = cc.read_input("incremented")?;
            if !packet.is_valid() {
                return Ok(());
            }
            cc.write_output(TAG_OUTPUT, packet)
        }
    }

    /// Records visits; used for fairness assertions.
    struct Recorder {
        name: String,
        visits: Rc<RefCell<Vec<String>>>,
    }

    impl Calculator for Recorder {
        fn name(&self) -> &str {
            &self.name
        }

        fn register_context(&self, side_parameters: Rc<SideParameters>) -> CalculatorContext {
            CalculatorContext::new(side_parameters)
        }

        fn process(&mut self, _cc: &mut CalculatorContext, _delta: f64) -> Result<(), GraphError> {
            self.visits.borrow_mut().push(self.name.clone());
            // Outlast the 1us test budget so each frame is exactly one visit.
            std::thread::sleep(Duration::from_micros(50));
            Ok(())
        }
    }

    fn no_side_parameters() -> Rc<SideParameters> {
        Rc::new(SideParameters::new())
    }

    #[test]
    fn test_empty_pipeline_fails_to_connect() {
        let mut scheduler = Scheduler::new();
        assert!(matches!(
            scheduler.connect_calculators().unwrap_err(),
            GraphError::EmptyPipeline
        ));
        assert!(matches!(
            scheduler.run().unwrap_err(),
            GraphError::EmptyPipeline
        ));
    }

    #[test]
    fn test_read_empty_output_is_invalid_packet() {
        let mut scheduler = Scheduler::new();
        let packet = scheduler.read_from_output_port();
        assert!(!packet.is_valid());
    }

    #[test]
    fn test_register_after_connect_fails() {
        let mut scheduler = Scheduler::new();
        scheduler
            .register_calculator(Box::new(Passthrough::new("only")), no_side_parameters())
            .unwrap();
        scheduler.connect_calculators().unwrap();

        let err = scheduler
            .register_calculator(Box::new(Passthrough::new("late")), no_side_parameters())
            .unwrap_err();
        assert!(matches!(err, GraphError::InvalidState { .. }));
    }

    #[test]
    fn test_duplicate_calculator_name_fails() {
        let mut scheduler = Scheduler::new();
        scheduler
            .register_calculator(Box::new(Passthrough::new("dup")), no_side_parameters())
            .unwrap();
        let err = scheduler
            .register_calculator(Box::new(Passthrough::new("dup")), no_side_parameters())
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateCalculator { .. }));
    }

    #[test]
    fn test_identity_pipeline_preserves_order() {
        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(Box::new(Passthrough::new("identity")), no_side_parameters())
            .unwrap();
        scheduler.connect_calculators().unwrap();

        for value in 0..10 {
            scheduler.write_to_input_port(Packet::of(value));
        }

        for _ in 0..4 {
            scheduler.run().unwrap();
        }

        for expected in 0..10 {
            let packet = scheduler.read_from_output_port();
            assert!(packet.is_valid(), "missing packet {expected}");
            assert_eq!(*packet.get::<i32>().unwrap(), expected);
        }
        assert!(!scheduler.read_from_output_port().is_valid());
    }

    #[test]
    fn test_tag_wired_chain() {
        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(Box::new(Incrementer), no_side_parameters())
            .unwrap();
        scheduler
            .register_calculator(Box::new(Forwarder), no_side_parameters())
            .unwrap();
        scheduler.connect_calculators().unwrap();

        for value in 0..5 {
            scheduler.write_to_input_port(Packet::of(value));
        }
        for _ in 0..4 {
            scheduler.run().unwrap();
        }

        for expected in 1..=5 {
            let packet = scheduler.read_from_output_port();
            assert!(packet.is_valid());
            assert_eq!(*packet.get::<i32>().unwrap(), expected);
        }
    }

    #[test]
    fn test_frame_budget_single_visit_on_overrun() {
        struct Sleeper;
        impl Calculator for Sleeper {
            fn name(&self) -> &str {
                "sleeper"
            }
            fn register_context(&self, side: Rc<SideParameters>) -> CalculatorContext {
                CalculatorContext::new(side)
            }
            fn process(
                &mut self,
                _cc: &mut CalculatorContext,
                _delta: f64,
            ) -> Result<(), GraphError> {
                std::thread::sleep(Duration::from_millis(2));
                Ok(())
            }
        }

        // 1ms budget, 2ms calculator: one visit per frame, no double visit.
        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(Box::new(Sleeper), no_side_parameters())
            .unwrap();
        scheduler.connect_calculators().unwrap();

        scheduler.run().unwrap();
        assert_eq!(scheduler.stats().ticks, 1);
    }

    #[test]
    fn test_cursor_is_fair_across_frames() {
        let visits = Rc::new(RefCell::new(Vec::new()));

        // 1us budget: each frame performs exactly one visit.
        let mut scheduler = Scheduler::with_frame_rate(1_000_000);
        for name in ["first", "second"] {
            scheduler
                .register_calculator(
                    Box::new(Recorder {
                        name: name.into(),
                        visits: Rc::clone(&visits),
                    }),
                    no_side_parameters(),
                )
                .unwrap();
        }
        scheduler.connect_calculators().unwrap();

        for _ in 0..4 {
            scheduler.run().unwrap();
        }

        let visits = visits.borrow();
        assert_eq!(visits.as_slice(), ["first", "second", "first", "second"]);
    }

    #[test]
    fn test_callbacks_bridge_io() {
        let produced = Rc::new(RefCell::new((0..5).collect::<Vec<i32>>()));
        let consumed = Rc::new(RefCell::new(Vec::new()));

        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(Box::new(Passthrough::new("identity")), no_side_parameters())
            .unwrap();
        scheduler.connect_calculators().unwrap();

        let source = Rc::clone(&produced);
        scheduler.register_input_callback(move || {
            if source.borrow().is_empty() {
                Packet::empty()
            } else {
                Packet::of(source.borrow_mut().remove(0))
            }
        });

        let sink = Rc::clone(&consumed);
        scheduler.register_output_callback(move |packet| {
            if packet.is_valid() {
                sink.borrow_mut().push(*packet.get::<i32>().unwrap());
            }
        });

        for _ in 0..4 {
            scheduler.run().unwrap();
        }

        assert_eq!(consumed.borrow().as_slice(), [0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_stop_is_terminal() {
        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(Box::new(Passthrough::new("identity")), no_side_parameters())
            .unwrap();
        scheduler.connect_calculators().unwrap();
        scheduler.run().unwrap();

        scheduler.stop();
        assert_eq!(scheduler.state(), SchedulerState::Stopped);

        let ticks = scheduler.stats().ticks;
        scheduler.run().unwrap(); // no-op
        assert_eq!(scheduler.stats().ticks, ticks);
    }

    #[test]
    fn test_calculator_error_propagates() {
        struct Failing;
        impl Calculator for Failing {
            fn name(&self) -> &str {
                "failing"
            }
            fn register_context(&self, side: Rc<SideParameters>) -> CalculatorContext {
                CalculatorContext::new(side)
            }
            fn process(
                &mut self,
                _cc: &mut CalculatorContext,
                _delta: f64,
            ) -> Result<(), GraphError> {
                Err(GraphError::calculator("failing", "boom"))
            }
        }

        let mut scheduler = Scheduler::with_frame_rate(1000);
        scheduler
            .register_calculator(Box::new(Failing), no_side_parameters())
            .unwrap();
        scheduler.connect_calculators().unwrap();

        let err = scheduler.run().unwrap_err();
        assert!(matches!(err, GraphError::Calculator { .. }));
        // Cursor did not advance past the failing calculator
        assert_eq!(scheduler.stats().ticks, 0);
    }
}
