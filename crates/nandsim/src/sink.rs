//! Step log destinations.

use std::fs::File;
use std::io::{self, LineWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use crate::error::SimError;

/// Append-only destination for `"<step>: <message>"` lines.
pub trait StepLog: Send {
    fn append(&mut self, line: &str) -> io::Result<()>;

    /// Flush and release the destination. Further appends fail.
    fn close(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Step log written to a file, one line at a time.
///
/// The file is created (or truncated) by [`create`](FileStepLog::create) and
/// released by [`close`](StepLog::close) or, failing that, on drop.
#[derive(Debug)]
pub struct FileStepLog {
    path: PathBuf,
    writer: Option<LineWriter<File>>,
}

impl FileStepLog {
    pub fn create(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let path = path.as_ref().to_path_buf();
        let file = File::create(&path).map_err(|source| SimError::LogOpen {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            writer: Some(LineWriter::new(file)),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StepLog for FileStepLog {
    fn append(&mut self, line: &str) -> io::Result<()> {
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| io::Error::other("step log already closed"))?;
        writeln!(writer, "{line}")
    }

    fn close(&mut self) -> io::Result<()> {
        match self.writer.take() {
            Some(mut writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// Step log kept in memory. Clones share the same lines.
#[derive(Debug, Clone, Default)]
pub struct MemoryStepLog {
    lines: Arc<Mutex<Vec<String>>>,
}

impl MemoryStepLog {
    pub fn lines(&self) -> Vec<String> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl StepLog for MemoryStepLog {
    fn append(&mut self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(line.to_string());
        Ok(())
    }
}
