//! Feeding step ticks and commands to a running circuit.
//!
//! The run loop only ever talks to a [`Runner`]. The standard one,
//! [`ChannelRunner`], is fed by any number of [`RunnerHandle`] clones: a
//! step ticker, an interactive prompt, a test driver.
//!
//! ```text
//! spawn_ticker ──step()──┐
//!                        ├──► ChannelRunner ──recv()──► Circuit::run_with
//! prompt ──command()─────┘                                   │
//!                                                            ▼
//!                                                         StepLog
//! ```
//!
//! Every hand-off is a rendezvous: `step()` returns once the tick has been
//! processed and `command()` returns with the response, so a producer that
//! outpaces the circuit waits instead of piling up signals.

use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::circuit::Circuit;
use crate::error::SimError;
use crate::sink::{FileStepLog, StepLog};

/// Something for the run loop to do.
#[derive(Debug)]
pub enum Signal {
    Step(StepTick),
    Command(CommandRequest),
}

/// A request to run one step.
#[derive(Debug)]
pub struct StepTick {
    done: oneshot::Sender<()>,
}

impl StepTick {
    pub fn new() -> (Self, oneshot::Receiver<()>) {
        let (done, rx) = oneshot::channel();
        (Self { done }, rx)
    }

    /// Release the producer waiting on this tick.
    pub fn complete(self) {
        // The producer may have stopped waiting; nothing to report then.
        let _ = self.done.send(());
    }
}

/// A line of command text and the channel its response goes back on.
#[derive(Debug)]
pub struct CommandRequest {
    text: String,
    reply: oneshot::Sender<String>,
}

impl CommandRequest {
    pub fn new(text: impl Into<String>) -> (Self, oneshot::Receiver<String>) {
        let (reply, rx) = oneshot::channel();
        (
            Self {
                text: text.into(),
                reply,
            },
            rx,
        )
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn respond(self, response: String) {
        if self.reply.send(response).is_err() {
            debug!(text = %self.text, "command issuer went away before the response");
        }
    }
}

/// The run loop's view of the outside world.
#[async_trait]
pub trait Runner: Send {
    /// Wait for the next tick or command. `None` once no producer is left.
    async fn recv(&mut self) -> Option<Signal>;

    /// Append one line to the step log.
    fn log(&mut self, line: &str) -> Result<(), SimError>;

    /// Release the step log. Called once, when the loop ends.
    fn close(&mut self) -> Result<(), SimError>;
}

/// A [`Runner`] fed through channels, logging to `L`.
pub struct ChannelRunner<L> {
    steps: mpsc::Receiver<StepTick>,
    commands: mpsc::Receiver<CommandRequest>,
    steps_open: bool,
    commands_open: bool,
    sink: L,
}

/// Cloneable producer side of a [`ChannelRunner`].
#[derive(Debug, Clone)]
pub struct RunnerHandle {
    steps: mpsc::Sender<StepTick>,
    commands: mpsc::Sender<CommandRequest>,
}

/// Build a [`ChannelRunner`] writing its step log to `sink`.
pub fn channel_runner<L: StepLog>(sink: L) -> (ChannelRunner<L>, RunnerHandle) {
    // Capacity 1 plus the acknowledgement on every signal gives rendezvous
    // semantics per producer.
    let (step_tx, step_rx) = mpsc::channel(1);
    let (command_tx, command_rx) = mpsc::channel(1);

    let runner = ChannelRunner {
        steps: step_rx,
        commands: command_rx,
        steps_open: true,
        commands_open: true,
        sink,
    };
    let handle = RunnerHandle {
        steps: step_tx,
        commands: command_tx,
    };
    (runner, handle)
}

impl<L> ChannelRunner<L> {
    pub fn sink(&self) -> &L {
        &self.sink
    }
}

#[async_trait]
impl<L: StepLog> Runner for ChannelRunner<L> {
    async fn recv(&mut self) -> Option<Signal> {
        while self.steps_open || self.commands_open {
            tokio::select! {
                tick = self.steps.recv(), if self.steps_open => match tick {
                    Some(tick) => return Some(Signal::Step(tick)),
                    None => self.steps_open = false,
                },
                request = self.commands.recv(), if self.commands_open => match request {
                    Some(request) => return Some(Signal::Command(request)),
                    None => self.commands_open = false,
                },
            }
        }
        None
    }

    fn log(&mut self, line: &str) -> Result<(), SimError> {
        self.sink.append(line).map_err(|err| {
            warn!(error = %err, "step log write failed");
            SimError::LogWrite(err)
        })
    }

    fn close(&mut self) -> Result<(), SimError> {
        self.sink.close().map_err(|err| {
            warn!(error = %err, "step log close failed");
            SimError::LogWrite(err)
        })
    }
}

impl RunnerHandle {
    /// Run one step, returning once it has been flushed and logged.
    pub async fn step(&self) -> Result<(), SimError> {
        let (tick, done) = StepTick::new();
        self.steps.send(tick).await.map_err(|_| SimError::Stopped)?;
        done.await.map_err(|_| SimError::Stopped)
    }

    /// Submit a command and wait for its response.
    ///
    /// `None` for `exit`, or when the loop has already stopped.
    pub async fn command(&self, text: impl Into<String>) -> Option<String> {
        let (request, reply) = CommandRequest::new(text);
        self.commands.send(request).await.ok()?;
        reply.await.ok()
    }

    /// [`command`](Self::command) for threads outside the async runtime.
    ///
    /// Panics if called from within an async context.
    pub fn blocking_command(&self, text: impl Into<String>) -> Option<String> {
        let (request, reply) = CommandRequest::new(text);
        self.commands.blocking_send(request).ok()?;
        reply.blocking_recv().ok()
    }

    pub fn is_stopped(&self) -> bool {
        self.commands.is_closed()
    }
}

/// Spawn a task handing a step tick to `handle` every `interval`.
///
/// The interval is measured from when the previous tick was processed. The
/// task ends on its own once the run loop stops.
pub fn spawn_ticker(handle: RunnerHandle, interval: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        while handle.step().await.is_ok() {
            tokio::time::sleep(interval).await;
        }
        debug!("step ticker finished");
    })
}

/// A circuit ready to run against a file log on a fixed step interval.
///
/// Built by [`Circuit::launch`].
pub struct Simulation {
    circuit: Circuit,
    runner: ChannelRunner<FileStepLog>,
    ticks: RunnerHandle,
    step_interval: Duration,
}

impl Simulation {
    pub(crate) fn new(
        circuit: Circuit,
        runner: ChannelRunner<FileStepLog>,
        ticks: RunnerHandle,
        step_interval: Duration,
    ) -> Self {
        Self {
            circuit,
            runner,
            ticks,
            step_interval,
        }
    }

    pub fn step_interval(&self) -> Duration {
        self.step_interval
    }

    /// Start the step ticker and serve until `exit`.
    pub async fn run(self) -> Result<(), SimError> {
        let ticker = spawn_ticker(self.ticks, self.step_interval);
        let result = self.circuit.run_with(self.runner).await;
        ticker.abort();
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sink::MemoryStepLog;

    #[tokio::test]
    async fn recv_ends_once_every_handle_is_dropped() {
        let (mut runner, handle) = channel_runner(MemoryStepLog::default());
        drop(handle);

        assert!(runner.recv().await.is_none());
    }

    #[tokio::test]
    async fn command_waits_for_its_response() {
        let (mut runner, handle) = channel_runner(MemoryStepLog::default());

        let serve = async move {
            match runner.recv().await {
                Some(Signal::Command(request)) => {
                    assert_eq!(request.text(), "get out");
                    request.respond("1".to_string());
                }
                other => panic!("expected a command, got {other:?}"),
            }
        };
        let (response, ()) = tokio::join!(handle.command("get out"), serve);

        assert_eq!(response.as_deref(), Some("1"));
    }

    #[tokio::test]
    async fn step_errors_once_the_runner_is_gone() {
        let (runner, handle) = channel_runner(MemoryStepLog::default());
        drop(runner);

        assert!(matches!(handle.step().await, Err(SimError::Stopped)));
        assert!(handle.command("get out").await.is_none());
        assert!(handle.is_stopped());
    }

    #[tokio::test]
    async fn ticker_stops_with_the_runner() {
        let (mut runner, handle) = channel_runner(MemoryStepLog::default());
        let ticker = spawn_ticker(handle, Duration::from_millis(1));

        for _ in 0..3 {
            match runner.recv().await {
                Some(Signal::Step(tick)) => tick.complete(),
                other => panic!("expected a tick, got {other:?}"),
            }
        }
        drop(runner);

        ticker.await.unwrap();
    }

    #[test]
    fn log_lines_reach_the_sink() {
        let log = MemoryStepLog::default();
        let (mut runner, _handle) = channel_runner(log.clone());

        runner.log("1: out -> 1").unwrap();
        runner.close().unwrap();

        assert_eq!(log.lines(), vec!["1: out -> 1"]);
        assert_eq!(runner.sink().lines(), log.lines());
    }
}
