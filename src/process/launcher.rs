//! Stateless spawn-and-wait wrapper around a [`CommandFactory`]

use crate::error::{CupError, CupResult};
use crate::process::command::{CommandFactory, CommandOutcome, OutputSinks, StderrMode};
use crate::process::native::native_command;
use std::path::Path;
use std::sync::Arc;

/// Runs executables through an injectable command factory
#[derive(Clone)]
pub struct Launcher {
    factory: Arc<dyn CommandFactory>,
    sinks: OutputSinks,
}

impl Launcher {
    /// Create a launcher over a custom factory
    pub fn new(factory: Arc<dyn CommandFactory>, sinks: OutputSinks) -> Self {
        Self { factory, sinks }
    }

    /// Create a launcher that spawns real processes
    pub fn native(sinks: OutputSinks) -> Self {
        Self::new(Arc::new(native_command), sinks)
    }

    /// Operator-visible output sinks
    pub fn sinks(&self) -> &OutputSinks {
        &self.sinks
    }

    /// Run with both streams forwarded live; non-zero exit is an error
    pub async fn run(&self, program: &Path, args: Vec<String>) -> CupResult<()> {
        let command = describe_command(program, &args);
        let outcome = self
            .factory
            .command(program, args)
            .run(&self.sinks, StderrMode::Stream)
            .await?;

        if outcome.success {
            Ok(())
        } else {
            Err(CupError::CommandExit {
                command,
                code: outcome.code,
            })
        }
    }

    /// Run with stderr captured; the caller interprets the outcome
    pub async fn run_captured(&self, program: &Path, args: Vec<String>) -> CupResult<CommandOutcome> {
        self.factory
            .command(program, args)
            .run(&self.sinks, StderrMode::Capture)
            .await
    }
}

/// Render a command line for logs and errors, hiding password values
pub fn describe_command(program: &Path, args: &[String]) -> String {
    let name = program
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| program.display().to_string());

    let mut parts = vec![name];
    let mut redact_next = false;
    for arg in args {
        if redact_next {
            parts.push("********".to_string());
            redact_next = false;
        } else {
            redact_next = arg == "--password" || arg == "-p";
            parts.push(arg.clone());
        }
    }
    parts.join(" ")
}
