//! # nandsim
//!
//! A discrete-step digital circuit simulator where gates defer, steps flush,
//! and outputs report what settled.
//!
//! ## Core Concepts
//!
//! Circuits are built from three things:
//! - [`Wire`] = a boolean signal line that notifies on change
//! - [`Circuit::nand`] = the only gate; everything else is composed from it
//! - [`Input`] / [`Output`] = named devices translating between text and wires
//!
//! The key principle: **a gate never writes its output directly**. It queues
//! an event, and the event is applied at the next step. One gate level = one
//! step of delay.
//!
//! ## Architecture
//!
//! ```text
//! spawn_ticker           prompt / test driver
//!     │ step()                 │ command()
//!     ▼                        ▼
//! ChannelRunner ◄──────────────┘
//!     │ recv()
//!     ▼
//! Circuit::run_with() loop
//!     │
//!     ├─► Step ──► take pending generation
//!     │              │
//!     │              ▼
//!     │          Wire::set() ──► nand reaction ──► queue event ──┐
//!     │              │                            (next step)   │
//!     │              └──► Output changed ──► step message       │
//!     │                                          │              │
//!     │                                          ▼              │
//!     │                                       StepLog           │
//!     │                                                         │
//!     └─► Command ──► get: encode Output                        │
//!                     set: Input writes wires now ──────────────┘
//! ```
//!
//! ## Key Invariants
//!
//! 1. **No-op writes are silent** - `Wire::set` notifies only on change
//! 2. **Subscribing bootstraps** - `Wire::on_update` calls the reaction once, immediately
//! 3. **Gates defer** - a NAND reaction queues `(out, value)`, never sets `out`
//! 4. **Generations are disjoint** - events queued during a flush wait for the next step
//! 5. **External input is immediate** - `set` writes input wires without delay
//! 6. **Single writer** - only the run loop touches circuit state
//!
//! ## Guarantees
//!
//! - **Rendezvous hand-off**: producers wait for the loop; ticks are never dropped
//! - **Serialized**: one tick or one command at a time, never both
//! - **Every failure answers**: command errors are responses, never panics
//! - **Scoped log**: the step log is closed on every exit path
//!
//! ## Example
//!
//! ```no_run
//! use nandsim::{Circuit, Input, Output, RunConfig};
//!
//! # async fn demo() -> Result<(), nandsim::SimError> {
//! let mut circuit = Circuit::new();
//! let (a, b, out) = (circuit.wire(), circuit.wire(), circuit.wire());
//! circuit.nand(&a, &b, &out);
//!
//! circuit.connect_input("a", Input::button(&a))?;
//! circuit.connect_input("b", Input::button(&b))?;
//! circuit.connect_output("out", Output::bulb(&out))?;
//!
//! let config = RunConfig::default().with_step_interval_ms(500);
//! let (simulation, handle) = circuit.launch(&config)?;
//!
//! tokio::spawn(async move {
//!     handle.command("set a 1").await;
//!     handle.command("set b 1").await;
//!     handle.command("exit").await;
//! });
//!
//! simulation.run().await
//! # }
//! ```

// Core modules
mod circuit;
mod command;
mod config;
mod device;
mod error;
mod gates;
mod notifier;
mod queue;
mod runner;
mod sink;
mod wire;



// Re-export circuit types
pub use circuit::{Circuit, Outcome};

// Re-export building blocks
pub use device::{Input, Output, Wires};
pub use notifier::Notifier;
pub use wire::{WeakWire, Wire, WireId};

// Re-export protocol and error types
pub use command::Command;
pub use error::{CommandError, DeviceError, SimError};

// Re-export runtime types
pub use config::RunConfig;
pub use runner::{
    channel_runner, spawn_ticker, ChannelRunner, CommandRequest, Runner, RunnerHandle, Signal,
    Simulation, StepTick,
};
pub use sink::{FileStepLog, MemoryStepLog, StepLog};

// Re-export commonly used external types
pub use async_trait::async_trait;
