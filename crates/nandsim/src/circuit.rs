//! The circuit: gate composition, step flushing, and the run loop.

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::rc::Rc;

use tracing::{debug, info, trace};

use crate::command::Command;
use crate::config::RunConfig;
use crate::device::{Input, Output};
use crate::error::{CommandError, SimError};
use crate::notifier::Notifier;
use crate::queue::EventQueue;
use crate::runner::{channel_runner, Runner, RunnerHandle, Signal, Simulation};
use crate::sink::FileStepLog;
use crate::wire::{Wire, WireId};

/// What the run loop should do after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    /// Send this text back to whoever issued the command.
    Reply(String),
    /// Stop the run loop. Nothing is sent back.
    Exit,
}

/// Messages gathered while a step is in progress.
#[derive(Debug, Clone, Default)]
struct StepMessages(Rc<RefCell<Vec<String>>>);

impl StepMessages {
    fn push(&self, message: String) {
        self.0.borrow_mut().push(message);
    }

    fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.0.borrow_mut())
    }
}

/// A digital circuit composed of NAND gates, inputs, and outputs.
///
/// Gate outputs are never written directly: every gate reaction queues a
/// pending event, and [`step`](Circuit::step) applies the queue built up
/// since the previous step. That gives each gate exactly one step of delay.
///
/// A `Circuit` is single-threaded. It is built up front, then handed to
/// [`run_with`](Circuit::run_with) (or [`launch`](Circuit::launch)), which
/// owns it until an `exit` command arrives.
pub struct Circuit {
    step: u64,
    pending: EventQueue,
    inputs: BTreeMap<String, Input>,
    outputs: BTreeMap<String, Output>,
    messages: StepMessages,
    step_notifier: Notifier<u64>,
    // Gate reactions only hold weak handles; this keeps the wires alive.
    wires: BTreeMap<WireId, Wire>,
}

impl Circuit {
    /// Construct a new, empty circuit.
    pub fn new() -> Self {
        Self {
            step: 0,
            pending: EventQueue::new(),
            inputs: BTreeMap::new(),
            outputs: BTreeMap::new(),
            messages: StepMessages::default(),
            step_notifier: Notifier::new(),
            wires: BTreeMap::new(),
        }
    }

    // ========================================================================
    // Construction
    // ========================================================================

    /// Create a wire owned by this circuit.
    pub fn wire(&mut self) -> Wire {
        let wire = Wire::new();
        self.retain(&wire);
        wire
    }

    /// Add a NAND gate with inputs `in1` and `in2` driving `out`.
    ///
    /// Whenever either input changes, `!(in1 && in2)` is computed from the
    /// current value of *both* inputs and queued for `out`. Wiring the gate
    /// queues that value right away (once per input), so `out` settles on
    /// the first step even if nothing else happens.
    pub fn nand(&mut self, in1: &Wire, in2: &Wire, out: &Wire) {
        for wire in [in1, in2, out] {
            self.retain(wire);
        }
        trace!(in1 = %in1.id(), in2 = %in2.id(), out = %out.id(), "adding nand gate");

        let (a, b, target) = (in1.downgrade(), in2.downgrade(), out.downgrade());
        let sender = self.pending.sender();
        let reaction = move |_: bool| {
            let (Some(a), Some(b), Some(target)) = (a.upgrade(), b.upgrade(), target.upgrade())
            else {
                return;
            };
            sender.send(target, !(a.value() && b.value()));
        };

        in1.on_update(reaction.clone());
        in2.on_update(reaction);
    }

    /// Connect an input under `name`.
    pub fn connect_input(&mut self, name: impl Into<String>, input: Input) -> Result<(), SimError> {
        let name = name.into();
        if self.inputs.contains_key(&name) {
            return Err(SimError::DuplicateInput(name));
        }
        trace!(%name, width = input.width(), "connecting input");
        self.inputs.insert(name, input);
        Ok(())
    }

    /// Connect an output under `name`.
    ///
    /// From now on every change to one of its wires adds a
    /// `"<name> -> <value>"` message to the step in progress.
    pub fn connect_output(
        &mut self,
        name: impl Into<String>,
        output: Output,
    ) -> Result<(), SimError> {
        let name = name.into();
        if self.outputs.contains_key(&name) {
            return Err(SimError::DuplicateOutput(name));
        }
        trace!(%name, width = output.wires().len(), "connecting output");

        let device = output.downgrade();
        let messages = self.messages.clone();
        let label = name.clone();
        output.on_change(move || {
            let Some(output) = device.upgrade() else {
                return;
            };
            let message = match output.value() {
                Ok(value) => format!("{label} -> {value}"),
                Err(err) => format!("error displaying {label}'s value: {err}"),
            };
            messages.push(message);
        });

        self.outputs.insert(name, output);
        Ok(())
    }

    /// Call `listener` each time a step occurs, passing the new step number.
    pub fn on_step(&self, listener: impl Fn(u64) + 'static) {
        self.step_notifier.subscribe(move |step: &u64| listener(*step));
    }

    fn retain(&mut self, wire: &Wire) {
        self.wires.entry(wire.id()).or_insert_with(|| wire.clone());
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// Number of steps run so far.
    pub fn current_step(&self) -> u64 {
        self.step
    }

    /// Events queued for the next step.
    pub fn pending_events(&self) -> usize {
        self.pending.len()
    }

    pub fn input_names(&self) -> impl Iterator<Item = &str> {
        self.inputs.keys().map(String::as_str)
    }

    pub fn output_names(&self) -> impl Iterator<Item = &str> {
        self.outputs.keys().map(String::as_str)
    }

    // ========================================================================
    // Simulation
    // ========================================================================

    /// Run one step and return its log lines (`"<step>: <message>"`).
    ///
    /// Only events queued before this call are applied. Anything they
    /// trigger is queued for the following step.
    pub fn step(&mut self) -> Vec<String> {
        self.step += 1;
        let step = self.step;
        self.step_notifier.publish(&step);

        let generation = self.pending.take_generation();
        debug!(step, events = generation.len(), "flushing step");
        for event in generation {
            event.apply();
        }

        self.messages
            .drain()
            .into_iter()
            .map(|message| format!("{step}: {message}"))
            .collect()
    }

    /// Handle one line of command text.
    pub fn execute(&mut self, text: &str) -> Outcome {
        let command = match text.parse::<Command>() {
            Ok(command) => command,
            Err(err) => {
                debug!(text, "rejected command");
                return Outcome::Reply(err.to_string());
            }
        };
        trace!(?command, "executing command");

        let reply = match command {
            Command::Exit => return Outcome::Exit,
            Command::Get { name } => self.get(&name),
            Command::Set { name, value } => self.set(&name, &value).map(|()| "set!".to_string()),
        };

        Outcome::Reply(reply.unwrap_or_else(|err| {
            debug!(error = %err, "command failed");
            err.to_string()
        }))
    }

    /// Current encoded value of the output named `name`.
    pub fn get(&self, name: &str) -> Result<String, CommandError> {
        let output = self.outputs.get(name).ok_or(CommandError::UnknownOutput)?;
        Ok(output.value()?)
    }

    /// Decode `value` with the input named `name` and write its wires now.
    ///
    /// Records `"<name> set to <value>"` for the next step's log.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), CommandError> {
        let input = self.inputs.get(name).ok_or(CommandError::UnknownInput)?;
        input.apply(value)?;
        self.messages.push(format!("{name} set to {value}"));
        Ok(())
    }

    /// Simulate the circuit with steps every `config.step_interval_ms`,
    /// logging to `config.log_path`.
    ///
    /// The log file is opened here; failing to open it means the run never
    /// starts. Commands are submitted through the returned handle.
    pub fn launch(self, config: &RunConfig) -> Result<(Simulation, RunnerHandle), SimError> {
        config.validate()?;
        let log = FileStepLog::create(&config.log_path)?;
        let (runner, handle) = channel_runner(log);
        let simulation = Simulation::new(self, runner, handle.clone(), config.step_interval());
        Ok((simulation, handle))
    }

    /// Serve step ticks and commands from `runner` until `exit`.
    ///
    /// Ticks and commands are handled one at a time, in arrival order. The
    /// runner is closed on every way out of the loop.
    pub async fn run_with<R: Runner>(mut self, mut runner: R) -> Result<(), SimError> {
        info!(
            inputs = self.inputs.len(),
            outputs = self.outputs.len(),
            wires = self.wires.len(),
            "circuit running"
        );

        let served = self.serve(&mut runner).await;
        let closed = runner.close();

        info!(step = self.step, "circuit stopped");
        served.and(closed)
    }

    async fn serve<R: Runner>(&mut self, runner: &mut R) -> Result<(), SimError> {
        while let Some(signal) = runner.recv().await {
            match signal {
                Signal::Step(tick) => {
                    for line in self.step() {
                        runner.log(&line)?;
                    }
                    tick.complete();
                }
                Signal::Command(request) => match self.execute(request.text()) {
                    Outcome::Reply(response) => request.respond(response),
                    Outcome::Exit => return Ok(()),
                },
            }
        }

        debug!("all signal sources disconnected");
        Ok(())
    }
}

impl Default for Circuit {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn single_nand() -> (Circuit, Wire, Wire, Wire) {
        let mut circuit = Circuit::new();
        let (a, b, out) = (circuit.wire(), circuit.wire(), circuit.wire());
        circuit.nand(&a, &b, &out);
        circuit.connect_input("a", Input::button(&a)).unwrap();
        circuit.connect_input("b", Input::button(&b)).unwrap();
        circuit.connect_output("out", Output::bulb(&out)).unwrap();
        (circuit, a, b, out)
    }

    #[test]
    fn wiring_a_gate_queues_one_bootstrap_event_per_input() {
        let (circuit, _, _, out) = single_nand();

        assert_eq!(circuit.pending_events(), 2);
        assert!(!out.value(), "gate output is deferred until the first step");
    }

    #[test]
    fn first_step_settles_bootstrap_value() {
        let (mut circuit, _, _, out) = single_nand();

        assert_eq!(circuit.step(), vec!["1: out -> 1"]);
        assert!(out.value());
        assert_eq!(circuit.pending_events(), 0);
        assert!(circuit.step().is_empty());
    }

    #[test]
    fn set_writes_immediately_and_logs_on_next_step() {
        let (mut circuit, a, b, _) = single_nand();
        circuit.step();

        assert_eq!(circuit.execute("set a 1"), Outcome::Reply("set!".into()));
        assert_eq!(circuit.execute("set b 1"), Outcome::Reply("set!".into()));
        assert!(a.value() && b.value());

        assert_eq!(
            circuit.step(),
            vec!["2: a set to 1", "2: b set to 1", "2: out -> 0"]
        );
    }

    #[test]
    fn get_reads_without_mutating() {
        let (mut circuit, _, _, _) = single_nand();
        assert_eq!(circuit.execute("get out"), Outcome::Reply("0".into()));
        assert_eq!(circuit.pending_events(), 2);

        circuit.step();
        assert_eq!(circuit.execute("get out"), Outcome::Reply("1".into()));
    }

    #[test]
    fn unknown_names_are_reported_without_side_effects() {
        let (mut circuit, _, _, _) = single_nand();

        assert_eq!(
            circuit.execute("get nope"),
            Outcome::Reply("output doesn't exist".into())
        );
        assert_eq!(
            circuit.execute("set nope 1"),
            Outcome::Reply("input doesn't exist".into())
        );
        assert_eq!(circuit.pending_events(), 2);
        assert_eq!(circuit.step(), vec!["1: out -> 1"]);
    }

    #[test]
    fn inputs_and_outputs_are_separate_namespaces() {
        let (mut circuit, a, _, out) = single_nand();

        assert!(matches!(
            circuit.connect_input("a", Input::button(&a)),
            Err(SimError::DuplicateInput(name)) if name == "a"
        ));
        assert!(matches!(
            circuit.connect_output("out", Output::bulb(&out)),
            Err(SimError::DuplicateOutput(name)) if name == "out"
        ));
        circuit.connect_output("a", Output::bulb(&a)).unwrap();

        assert_eq!(circuit.input_names().collect::<Vec<_>>(), vec!["a", "b"]);
        assert_eq!(circuit.output_names().collect::<Vec<_>>(), vec!["a", "out"]);
    }

    #[test]
    fn encode_failure_is_logged_as_error_message() {
        let mut circuit = Circuit::new();
        let (a, out) = (circuit.wire(), circuit.wire());
        circuit.not(&a, &out);
        circuit
            .connect_output("broken", Output::new([out.clone()], |_| {
                Err(crate::DeviceError::encode("display unplugged"))
            }))
            .unwrap();

        assert_eq!(
            circuit.step(),
            vec!["1: error displaying broken's value: display unplugged"]
        );
        assert_eq!(
            circuit.execute("get broken"),
            Outcome::Reply("display unplugged".into())
        );
    }

    #[test]
    fn step_listeners_see_each_new_step_before_the_flush() {
        let (mut circuit, _, _, out) = single_nand();
        let seen = Rc::new(RefCell::new(Vec::new()));
        {
            let seen = seen.clone();
            let out = out.clone();
            circuit.on_step(move |step| seen.borrow_mut().push((step, out.value())));
        }

        circuit.step();
        circuit.step();

        assert_eq!(*seen.borrow(), vec![(1, false), (2, true)]);
        assert_eq!(circuit.current_step(), 2);
    }

    #[test]
    fn bad_command_is_reported() {
        let (mut circuit, _, _, _) = single_nand();
        assert_eq!(circuit.execute("flip a"), Outcome::Reply("bad command".into()));
        assert_eq!(circuit.execute("exit"), Outcome::Exit);
    }
}
