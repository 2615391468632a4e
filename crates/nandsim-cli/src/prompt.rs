//! The interactive `> ` prompt.
//!
//! Stdin is read on a dedicated thread with blocking IO; each line is handed
//! to the run loop and the response printed before the next prompt.

use std::io::{self, BufRead, Write};
use std::thread::{self, JoinHandle};

use nandsim::RunnerHandle;
use tracing::debug;

pub fn spawn(handle: RunnerHandle) -> io::Result<JoinHandle<()>> {
    thread::Builder::new()
        .name("nandsim-prompt".to_string())
        .spawn(move || {
            let stdin = io::stdin().lock();
            let result = serve(stdin, io::stdout(), |text| handle.blocking_command(text));
            if let Err(err) = result {
                debug!(error = %err, "prompt stopped");
            }
        })
}

/// Prompt on `output`, forward lines from `input` to `submit`, print replies.
///
/// Returns when `submit` yields no reply (the loop stopped) or at end of
/// input, which is treated as `exit`.
pub fn serve<R, W, F>(input: R, mut output: W, mut submit: F) -> io::Result<()>
where
    R: BufRead,
    W: Write,
    F: FnMut(&str) -> Option<String>,
{
    let mut lines = input.lines();
    loop {
        write!(output, "> ")?;
        output.flush()?;

        let Some(line) = lines.next() else {
            writeln!(output)?;
            submit("exit");
            return Ok(());
        };
        let line = line?;
        let text = line.trim();
        if text.is_empty() {
            continue;
        }

        match submit(text) {
            Some(response) => writeln!(output, "{response}")?,
            None => return Ok(()),
        }
    }
}
