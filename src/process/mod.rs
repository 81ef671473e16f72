//! Subprocess execution for the fly CLI
//!
//! Commands are built through an injectable [`CommandFactory`] so callers
//! can swap the real process spawner for a fake:
//! - [`native_command`]: spawns a tokio child process
//! - tests: scripted commands that never touch the OS

mod command;
mod launcher;
mod native;

#[cfg(test)]
pub(crate) mod testing;

pub use command::{
    CommandFactory, CommandOutcome, LineSink, OutputSinks, RunnableCommand, StderrMode,
};
pub use launcher::{describe_command, Launcher};
pub use native::native_command;
