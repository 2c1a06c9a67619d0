use crate::command_line::CommandLine;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ExecutorError {
    #[error("Failed to spawn {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("Command exited with {}", exit_label(.code))]
    NonZeroExit { code: Option<i32>, stderr: String },
    #[error("Command timed out after {0:?}")]
    Timeout(Duration),
}

impl ExecutorError {
    /// Captured stderr, when the process got far enough to produce any.
    pub fn stderr(&self) -> Option<&str> {
        match self {
            ExecutorError::NonZeroExit { stderr, .. } => Some(stderr),
            _ => None,
        }
    }
}

fn exit_label(code: &Option<i32>) -> String {
    match code {
        Some(code) => format!("status {}", code),
        None => "no status (terminated by signal)".to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub exit_code: Option<i32>,
}

/// Runs one external command to completion.
#[async_trait]
pub trait CommandRunner: Send + Sync {
    async fn run(&self, command: &CommandLine) -> Result<CommandOutput, ExecutorError>;
}

/// Spawns real processes through `tokio::process`.
///
/// No timeout is applied unless one is configured; a hung tool then hangs the
/// caller.
#[derive(Debug, Clone, Default)]
pub struct ProcessRunner {
    timeout: Option<Duration>,
}

impl ProcessRunner {
    pub fn new() -> Self {
        Self { timeout: None }
    }

    pub fn with_timeout(timeout: Option<Duration>) -> Self {
        Self { timeout }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }
}

#[async_trait]
impl CommandRunner for ProcessRunner {
    async fn run(&self, command: &CommandLine) -> Result<CommandOutput, ExecutorError> {
        tracing::info!("Executing command: {}", command);

        let mut cmd = tokio::process::Command::new(&command.program);
        cmd.args(&command.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let exec = cmd.output();
        let output = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, exec)
                .await
                .map_err(|_| ExecutorError::Timeout(limit))?,
            None => exec.await,
        }
        .map_err(|e| ExecutorError::Spawn {
            program: command.program.clone(),
            source: e,
        })?;

        let result = CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
            exit_code: output.status.code(),
        };

        if output.status.success() {
            Ok(result)
        } else {
            tracing::warn!("Command failed ({:?}): {}", result.exit_code, command);
            Err(ExecutorError::NonZeroExit {
                code: result.exit_code,
                stderr: result.stderr,
            })
        }
    }
}
