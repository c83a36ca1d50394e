//! Result types for a single external process execution

use std::time::Duration;

/// Lifecycle of one execution attempt.
///
/// Transitions:
/// - `NotStarted` -> `Running` (process spawned)
/// - `Running` -> `Succeeded` | `Failed` | `TimedOut`
///
/// The last three are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExecutionState {
    #[default]
    NotStarted,
    Running,
    /// Exited with status zero
    Succeeded,
    /// Exited with a non-zero status, or was killed by a signal (`None`)
    Failed { exit_code: Option<i32> },
    /// Still running at the deadline and terminated
    TimedOut,
}

impl ExecutionState {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ExecutionState::Succeeded | ExecutionState::Failed { .. } | ExecutionState::TimedOut
        )
    }

    pub fn can_transition_to(&self, next: &ExecutionState) -> bool {
        match self {
            ExecutionState::NotStarted => matches!(next, ExecutionState::Running),
            ExecutionState::Running => next.is_terminal(),
            _ => false,
        }
    }
}

impl std::fmt::Display for ExecutionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutionState::NotStarted => write!(f, "NOT_STARTED"),
            ExecutionState::Running => write!(f, "RUNNING"),
            ExecutionState::Succeeded => write!(f, "SUCCEEDED"),
            ExecutionState::Failed {
                exit_code: Some(code),
            } => write!(f, "FAILED({code})"),
            ExecutionState::Failed { exit_code: None } => write!(f, "FAILED(signal)"),
            ExecutionState::TimedOut => write!(f, "TIMED_OUT"),
        }
    }
}

/// What happened when a command was run to completion or to its deadline
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionOutcome {
    /// Terminal state reached
    pub state: ExecutionState,
    /// OS process id of the spawned process
    pub pid: u32,
    pub duration: Duration,
    /// Captured stdout, only for [`OutputSink::Capture`](crate::models::OutputSink::Capture)
    pub stdout: Option<String>,
    /// Captured stderr, only for [`OutputSink::Capture`](crate::models::OutputSink::Capture)
    pub stderr: Option<String>,
}

impl ExecutionOutcome {
    pub fn succeeded(&self) -> bool {
        self.state == ExecutionState::Succeeded
    }

    pub fn timed_out(&self) -> bool {
        self.state == ExecutionState::TimedOut
    }

    /// One-line status, e.g. `FAILED(2) pid 4242 (1530ms)`
    pub fn summary(&self) -> String {
        format!(
            "{} pid {} ({}ms)",
            self.state,
            self.pid,
            self.duration.as_millis()
        )
    }
}
