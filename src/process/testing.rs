//! Scripted command fakes shared by unit tests

use crate::error::CupResult;
use crate::process::command::{
    CommandFactory, CommandOutcome, OutputSinks, RunnableCommand, StderrMode,
};
use async_trait::async_trait;
use std::collections::VecDeque;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Canned result for one fake command
#[derive(Debug, Clone, Default)]
pub(crate) struct FakeResult {
    pub success: bool,
    pub stdout: String,
    pub stderr: String,
}

impl FakeResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            ..Self::default()
        }
    }

    pub fn fail(stderr: &str) -> Self {
        Self {
            success: false,
            stderr: stderr.to_string(),
            ..Self::default()
        }
    }
}

#[derive(Default)]
struct Script {
    results: VecDeque<FakeResult>,
    calls: Vec<Vec<String>>,
    documents: Vec<String>,
}

/// Factory replaying results in order; succeeds once the script runs out
#[derive(Clone, Default)]
pub(crate) struct ScriptedFactory {
    script: Arc<Mutex<Script>>,
}

impl ScriptedFactory {
    pub fn new(results: Vec<FakeResult>) -> Self {
        Self {
            script: Arc::new(Mutex::new(Script {
                results: results.into(),
                ..Script::default()
            })),
        }
    }

    /// Argument vectors of every command run so far
    pub fn calls(&self) -> Vec<Vec<String>> {
        self.script.lock().unwrap().calls.clone()
    }

    /// Contents of files passed via `--config` at the time they ran
    pub fn documents(&self) -> Vec<String> {
        self.script.lock().unwrap().documents.clone()
    }
}

impl CommandFactory for ScriptedFactory {
    fn command(&self, _program: &Path, args: Vec<String>) -> Box<dyn RunnableCommand> {
        Box::new(FakeCommand {
            script: self.script.clone(),
            args,
        })
    }
}

struct FakeCommand {
    script: Arc<Mutex<Script>>,
    args: Vec<String>,
}

#[async_trait]
impl RunnableCommand for FakeCommand {
    async fn run(
        self: Box<Self>,
        sinks: &OutputSinks,
        mode: StderrMode,
    ) -> CupResult<CommandOutcome> {
        let document = self
            .args
            .iter()
            .position(|a| a == "--config")
            .and_then(|i| self.args.get(i + 1))
            .and_then(|path| std::fs::read_to_string(path).ok());

        let result = {
            let mut script = self.script.lock().unwrap();
            script.calls.push(self.args.clone());
            if let Some(document) = document {
                script.documents.push(document);
            }
            script.results.pop_front().unwrap_or_else(FakeResult::ok)
        };

        for line in result.stdout.lines() {
            sinks.out(line);
        }
        let stderr = match mode {
            StderrMode::Stream => {
                for line in result.stderr.lines() {
                    sinks.err(line);
                }
                String::new()
            }
            StderrMode::Capture => result.stderr,
        };

        Ok(CommandOutcome {
            success: result.success,
            code: Some(if result.success { 0 } else { 1 }),
            stderr,
        })
    }
}
