//! Error types.
//!
//! Two families live here:
//!
//! - [`CommandError`] and [`DeviceError`] are *reported*: their `Display`
//!   output is exactly the response text sent back to whoever issued the
//!   command, and the run loop keeps going.
//! - [`SimError`] is *fatal*: it either prevents a run from starting or ends
//!   it.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// A device's decode or encode rule rejected its input.
///
/// The message is surfaced verbatim to the command issuer (or to the step
/// log, for encode failures during a flush).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DeviceError {
    #[error("{0}")]
    Decode(String),

    #[error("{0}")]
    Encode(String),
}

impl DeviceError {
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }
}

/// A command could not be carried out. Never fatal.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CommandError {
    /// Unrecognized or malformed command text.
    #[error("bad command")]
    BadCommand,

    #[error("input doesn't exist")]
    UnknownInput,

    #[error("output doesn't exist")]
    UnknownOutput,

    /// Decoded value count disagrees with the input's wire count.
    #[error("incorrect number of values: want {want}, got {got}")]
    Arity { want: usize, got: usize },

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Failures that stop a simulation from starting or continuing.
#[derive(Debug, Error)]
pub enum SimError {
    #[error("failed to open step log {path}: {source}")]
    LogOpen {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write step log: {0}")]
    LogWrite(#[source] io::Error),

    #[error("input {0:?} is already connected")]
    DuplicateInput(String),

    #[error("output {0:?} is already connected")]
    DuplicateOutput(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The run loop is no longer accepting signals.
    #[error("simulation stopped")]
    Stopped,
}

impl From<serde_json::Error> for SimError {
    fn from(err: serde_json::Error) -> Self {
        Self::InvalidConfig(err.to_string())
    }
}
