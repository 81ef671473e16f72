//! Native process execution via tokio

use crate::error::{CupError, CupResult};
use crate::process::command::{CommandOutcome, OutputSinks, RunnableCommand, StderrMode};
use crate::process::launcher::describe_command;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::{Child, Command};
use tracing::debug;

/// Default [`CommandFactory`](super::CommandFactory): a real child process
pub fn native_command(program: &Path, args: Vec<String>) -> Box<dyn RunnableCommand> {
    Box::new(NativeCommand {
        program: program.to_path_buf(),
        args,
    })
}

struct NativeCommand {
    program: PathBuf,
    args: Vec<String>,
}

#[async_trait]
impl RunnableCommand for NativeCommand {
    async fn run(
        self: Box<Self>,
        sinks: &OutputSinks,
        stderr: StderrMode,
    ) -> CupResult<CommandOutcome> {
        let description = describe_command(&self.program, &self.args);
        debug!("Executing: {}", description);

        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CupError::command_failed(description.clone(), e))?;

        let captured = stream_child_output(&mut child, sinks, stderr).await?;

        let status = child
            .wait()
            .await
            .map_err(|e| CupError::command_failed(description, e))?;

        Ok(CommandOutcome {
            success: status.success(),
            code: status.code(),
            stderr: captured,
        })
    }
}

/// Stream stdout to the sink and stderr to the sink or a capture buffer.
///
/// Returns the captured stderr text, empty in [`StderrMode::Stream`].
async fn stream_child_output(
    child: &mut Child,
    sinks: &OutputSinks,
    mode: StderrMode,
) -> CupResult<String> {
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| CupError::Internal("child stdout was not piped".to_string()))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| CupError::Internal("child stderr was not piped".to_string()))?;

    let mut stdout_reader = BufReader::new(stdout).split(b'\n');
    let mut stderr_reader = BufReader::new(stderr).split(b'\n');

    let mut captured: Vec<String> = Vec::new();
    let mut stdout_done = false;
    let mut stderr_done = false;

    while !stdout_done || !stderr_done {
        tokio::select! {
            segment = stdout_reader.next_segment(), if !stdout_done => {
                match segment {
                    Ok(Some(bytes)) => sinks.out(&decode_line(&bytes)),
                    Ok(None) => stdout_done = true,
                    Err(e) => {
                        debug!("Stopped reading stdout: {}", e);
                        stdout_done = true;
                    }
                }
            }
            segment = stderr_reader.next_segment(), if !stderr_done => {
                match segment {
                    Ok(Some(bytes)) => {
                        let line = decode_line(&bytes);
                        match mode {
                            StderrMode::Stream => sinks.err(&line),
                            StderrMode::Capture => captured.push(line),
                        }
                    }
                    Ok(None) => stderr_done = true,
                    Err(e) => {
                        debug!("Stopped reading stderr: {}", e);
                        stderr_done = true;
                    }
                }
            }
        }
    }

    Ok(captured.join("\n"))
}

/// Decode one output line, replacing invalid UTF-8 and dropping a trailing `\r`
fn decode_line(bytes: &[u8]) -> String {
    let bytes = bytes.strip_suffix(b"\r").unwrap_or(bytes);
    String::from_utf8_lossy(bytes).into_owned()
}
