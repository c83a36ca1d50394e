//! Running one command under a deadline

use std::process::{Child, Command, ExitStatus, Stdio};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use wait_timeout::ChildExt;

use super::output::{stdio_for, OutputCollector};
use super::result::{ExecutionOutcome, ExecutionState};
use super::{is_process_alive, terminate_process_group};
use crate::error::ProcessError;
use crate::models::CommandDescriptor;

/// Runs a fully resolved command and reports how it ended.
///
/// Implementations block the calling thread until the process exits or its
/// deadline passes. A process still running at the deadline, and everything
/// it started, must be terminated before `run` returns.
pub trait ProcessRunner: Send + Sync {
    fn run(&self, command: &CommandDescriptor) -> Result<ExecutionOutcome, ProcessError>;
}

/// [`ProcessRunner`] backed by `std::process`.
///
/// On Unix the child becomes the leader of a new process group so that a
/// timeout can kill the whole tree with one signal.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl SystemRunner {
    pub fn new() -> Self {
        Self
    }

    fn spawn(&self, command: &CommandDescriptor) -> Result<Child, ProcessError> {
        let (stdout, stderr) = stdio_for(command.output())?;

        let mut cmd = Command::new(command.executable());
        cmd.args(command.arguments())
            .current_dir(command.working_directory())
            .envs(command.environment())
            .stdin(Stdio::null())
            .stdout(stdout)
            .stderr(stderr);

        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.process_group(0);
        }

        cmd.spawn().map_err(|source| ProcessError::Spawn {
            command: command.summary(),
            source,
        })
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, command: &CommandDescriptor) -> Result<ExecutionOutcome, ProcessError> {
        let mut state = ExecutionState::NotStarted;
        let start = Instant::now();

        let mut child = self.spawn(command)?;
        let pid = child.id();
        advance(&mut state, ExecutionState::Running, pid);

        let collector = OutputCollector::start(child.stdout.take(), child.stderr.take());

        let waited = wait_until_deadline(&mut child, command.timeout());
        let status = match waited {
            Ok(status) => status,
            Err(source) => {
                terminate_process_group(&mut child);
                return Err(ProcessError::Wait {
                    command: command.summary(),
                    source,
                });
            }
        };

        let terminal = match status {
            Some(status) if status.success() => ExecutionState::Succeeded,
            Some(status) => ExecutionState::Failed {
                exit_code: status.code(),
            },
            None => {
                warn!(
                    pid,
                    timeout_ms = command.timeout().as_millis() as u64,
                    command = %command.summary(),
                    "deadline exceeded, terminating process group"
                );
                terminate_process_group(&mut child);
                if is_process_alive(pid) {
                    warn!(pid, "process still present after termination");
                }
                ExecutionState::TimedOut
            }
        };
        advance(&mut state, terminal, pid);

        let duration = start.elapsed();
        let (stdout, stderr) = collector.finish();

        Ok(ExecutionOutcome {
            state,
            pid,
            duration,
            stdout,
            stderr,
        })
    }
}

/// Wait for `child` to exit; `Ok(None)` means the deadline passed first.
///
/// A timeout too large to be represented as an instant waits forever.
fn wait_until_deadline(
    child: &mut Child,
    timeout: Duration,
) -> std::io::Result<Option<ExitStatus>> {
    if Instant::now().checked_add(timeout).is_none() {
        return child.wait().map(Some);
    }
    child.wait_timeout(timeout)
}

fn advance(state: &mut ExecutionState, next: ExecutionState, pid: u32) {
    debug_assert!(
        state.can_transition_to(&next),
        "invalid execution transition {state} -> {next}"
    );
    debug!(pid, from = %state, to = %next, "execution state changed");
    *state = next;
}
