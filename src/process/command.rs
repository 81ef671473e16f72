//! Command abstraction
//!
//! A [`CommandFactory`] turns a program path and argument vector into a
//! [`RunnableCommand`]. Any `Fn(&Path, Vec<String>) -> Box<dyn RunnableCommand>`
//! is a factory, which is how [`native_command`](super::native_command)
//! plugs in.

use crate::error::CupResult;
use async_trait::async_trait;
use std::path::Path;
use std::sync::Arc;

/// Callback receiving one line of process output
pub type LineSink = Arc<dyn Fn(&str) + Send + Sync>;

/// Where live process output goes
#[derive(Clone)]
pub struct OutputSinks {
    stdout: LineSink,
    stderr: LineSink,
}

impl OutputSinks {
    /// Create sinks from two line callbacks
    pub fn new(stdout: LineSink, stderr: LineSink) -> Self {
        Self { stdout, stderr }
    }

    /// Forward output to this process's stdout/stderr
    pub fn terminal() -> Self {
        Self {
            stdout: Arc::new(|line: &str| println!("{}", line)),
            stderr: Arc::new(|line: &str| eprintln!("{}", line)),
        }
    }

    /// Drop all output
    pub fn discard() -> Self {
        Self {
            stdout: Arc::new(|_: &str| {}),
            stderr: Arc::new(|_: &str| {}),
        }
    }

    /// Write a line to the stdout sink
    pub fn out(&self, line: &str) {
        (self.stdout)(line)
    }

    /// Write a line to the stderr sink
    pub fn err(&self, line: &str) {
        (self.stderr)(line)
    }
}

impl std::fmt::Debug for OutputSinks {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OutputSinks").finish_non_exhaustive()
    }
}

/// How a command's standard error is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StderrMode {
    /// Stream each line to the stderr sink as it arrives
    Stream,
    /// Buffer it and return it in [`CommandOutcome::stderr`]
    Capture,
}

/// Result of a finished command
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutcome {
    /// Whether the process exited with status zero
    pub success: bool,
    /// Exit code, `None` when terminated by a signal
    pub code: Option<i32>,
    /// Captured standard error (empty unless [`StderrMode::Capture`])
    pub stderr: String,
}

/// A command ready to be run once
#[async_trait]
pub trait RunnableCommand: Send {
    /// Run to completion, streaming stdout to `sinks`
    async fn run(self: Box<Self>, sinks: &OutputSinks, stderr: StderrMode)
        -> CupResult<CommandOutcome>;
}

/// Builds runnable commands from a program and its arguments
pub trait CommandFactory: Send + Sync {
    fn command(&self, program: &Path, args: Vec<String>) -> Box<dyn RunnableCommand>;
}

impl<F> CommandFactory for F
where
    F: Fn(&Path, Vec<String>) -> Box<dyn RunnableCommand> + Send + Sync,
{
    fn command(&self, program: &Path, args: Vec<String>) -> Box<dyn RunnableCommand> {
        self(program, args)
    }
}
