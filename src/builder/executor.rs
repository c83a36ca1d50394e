use std::collections::BTreeMap;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{create_tool, merge, BuildTool, ToolKind};
use crate::config::Config;
use crate::error::{BuildError, ProcessError};
use crate::models::{BuildRequest, CommandDescriptor};
use crate::process::{ExecutionOutcome, ExecutionState, ProcessRunner, SystemRunner};

/// Runs builds of one tool kind.
///
/// The executor owns no per-build state apart from the remaining-time
/// override, so one instance may run many requests in sequence. Callers are
/// expected to hold the [`PathLock`](crate::fs::locking::PathLock) for the
/// project root while [`build`](Self::build) runs.
pub struct BuildExecutor {
    tool: Box<dyn BuildTool>,
    executable: String,
    runner: Arc<dyn ProcessRunner>,
    remaining_timeout: Option<Duration>,
}

impl std::fmt::Debug for BuildExecutor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BuildExecutor")
            .field("tool", &self.tool)
            .field("executable", &self.executable)
            .field("remaining_timeout", &self.remaining_timeout)
            .finish_non_exhaustive()
    }
}

impl BuildExecutor {
    /// Executor for `tool` that runs `executable` (ignored by wrapper tools)
    pub fn new(tool: Box<dyn BuildTool>, executable: impl Into<String>) -> Self {
        Self {
            tool,
            executable: executable.into(),
            runner: Arc::new(SystemRunner::new()),
            remaining_timeout: None,
        }
    }

    pub fn from_config(kind: ToolKind, config: &Config) -> Self {
        Self::new(create_tool(kind), config.executable_for(kind))
    }

    /// Replace the process runner, mainly for tests
    pub fn with_runner(mut self, runner: Arc<dyn ProcessRunner>) -> Self {
        self.runner = runner;
        self
    }

    pub fn tool(&self) -> &dyn BuildTool {
        self.tool.as_ref()
    }

    pub fn executable(&self) -> &str {
        &self.executable
    }

    /// Enforce `remaining` instead of each request's own timeout until cleared.
    ///
    /// Used when an earlier phase has already spent part of a shared deadline.
    pub fn set_remaining_timeout(&mut self, remaining: Duration) {
        self.remaining_timeout = Some(remaining);
    }

    pub fn clear_remaining_timeout(&mut self) {
        self.remaining_timeout = None;
    }

    pub fn remaining_timeout(&self) -> Option<Duration> {
        self.remaining_timeout
    }

    /// Timeout that will be enforced for `request`
    pub fn effective_timeout(&self, request: &BuildRequest) -> Duration {
        self.remaining_timeout.unwrap_or_else(|| request.timeout())
    }

    pub fn merge_arguments(&self, request: &BuildRequest) -> Vec<String> {
        merge::merge_arguments(self.tool.as_ref(), request)
    }

    pub fn merge_environment(&self, request: &BuildRequest) -> BTreeMap<String, String> {
        merge::merge_environment(self.tool.as_ref(), request)
    }

    /// Resolve `request` into the exact command that would be run
    pub fn command_for(&self, request: &BuildRequest) -> Result<CommandDescriptor, BuildError> {
        if !request.project_root().is_dir() {
            return Err(BuildError::InvalidProjectRoot {
                repository_id: request.repository_id().to_string(),
                path: request.project_root().to_path_buf(),
            });
        }

        let executable = self.tool.resolve_executable(request, &self.executable)?;

        Ok(CommandDescriptor::new(
            request.repository_id(),
            executable,
            self.merge_arguments(request),
            request.project_root(),
            self.merge_environment(request),
            request.output().clone(),
            self.effective_timeout(request),
        ))
    }

    /// Run the build and return how it ended.
    ///
    /// Anything other than a successful exit is an error.
    pub fn execute(&self, request: &BuildRequest) -> Result<ExecutionOutcome, BuildError> {
        let command = self.command_for(request)?;
        let summary = command.summary();
        let repository_id = request.repository_id();

        info!(
            repository = repository_id,
            tool = %self.tool.kind(),
            timeout_ms = command.timeout().as_millis() as u64,
            command = %summary,
            "starting build"
        );

        let outcome = self
            .runner
            .run(&command)
            .map_err(|e| process_failure(repository_id, &command, e))?;

        debug!(repository = repository_id, outcome = %outcome.summary(), "build finished");

        match outcome.state {
            ExecutionState::Succeeded => {
                info!(
                    repository = repository_id,
                    duration_ms = outcome.duration.as_millis() as u64,
                    "build succeeded"
                );
                Ok(outcome)
            }
            ExecutionState::Failed { exit_code } => {
                warn!(repository = repository_id, ?exit_code, "build failed");
                Err(BuildError::Failed {
                    repository_id: repository_id.to_string(),
                    command: summary,
                    exit_code,
                    stdout: outcome.stdout,
                    stderr: outcome.stderr,
                })
            }
            ExecutionState::TimedOut => {
                warn!(repository = repository_id, "build timed out");
                Err(BuildError::TimedOut {
                    repository_id: repository_id.to_string(),
                    command: summary,
                    timeout: command.timeout(),
                    stdout: outcome.stdout,
                    stderr: outcome.stderr,
                })
            }
            state @ (ExecutionState::NotStarted | ExecutionState::Running) => Err(BuildError::Io {
                repository_id: repository_id.to_string(),
                command: summary,
                source: io::Error::other(format!("runner returned non-terminal state {state}")),
            }),
        }
    }

    /// Run the build, discarding the outcome on success
    pub fn build(&self, request: &BuildRequest) -> Result<(), BuildError> {
        self.execute(request).map(|_| ())
    }
}

fn process_failure(
    repository_id: &str,
    command: &CommandDescriptor,
    err: ProcessError,
) -> BuildError {
    match err {
        ProcessError::Spawn { source, .. }
            if matches!(
                source.kind(),
                io::ErrorKind::NotFound | io::ErrorKind::PermissionDenied
            ) =>
        {
            BuildError::ExecutableResolution {
                repository_id: repository_id.to_string(),
                executable: command.executable().display().to_string(),
                reason: source.to_string(),
            }
        }
        ProcessError::Spawn { source, .. }
        | ProcessError::OutputFile { source, .. }
        | ProcessError::Wait { source, .. } => BuildError::Io {
            repository_id: repository_id.to_string(),
            command: command.summary(),
            source,
        },
    }
}
