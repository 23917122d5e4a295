//! Post-processing rendered output through an external formatter.

use std::io::{ErrorKind, Write};
use std::process::{Command, Stdio};
use std::thread;

use tracing::debug;

use crate::error::FormatterError;

/// Pipe `input` through `sh -c <command>` and return its stdout.
///
/// The formatter's stderr goes to ours. A formatter that exits successfully
/// without reading all of its input is accepted.
pub fn run_formatter(command: &str, input: &[u8]) -> Result<Vec<u8>, FormatterError> {
    debug!(command, bytes = input.len(), "running formatter");
    let mut child = Command::new("sh")
        .arg("-c")
        .arg(command)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::inherit())
        .spawn()
        .map_err(|source| FormatterError::Spawn {
            command: command.to_string(),
            source,
        })?;

    let mut stdin = child.stdin.take();
    let (written, output) = thread::scope(|scope| {
        let writer = scope.spawn(move || match stdin.as_mut() {
            // Dropping stdin at the end of the closure closes the pipe.
            Some(pipe) => pipe.write_all(input),
            None => Ok(()),
        });
        let output = child.wait_with_output();
        let written = writer
            .join()
            .unwrap_or_else(|_| Err(std::io::Error::other("formatter stdin writer panicked")));
        (written, output)
    });

    let pipe_error = |source| FormatterError::Pipe {
        command: command.to_string(),
        source,
    };
    let output = output.map_err(pipe_error)?;
    if !output.status.success() {
        return Err(FormatterError::Status {
            command: command.to_string(),
            status: output.status,
        });
    }
    match written {
        Err(err) if err.kind() != ErrorKind::BrokenPipe => return Err(pipe_error(err)),
        _ => {}
    }
    Ok(output.stdout)
}
