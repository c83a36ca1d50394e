//! Error taxonomy for path locking and build execution
//!
//! Every error carries enough context to be reported without the caller
//! holding on to the request: the request or repository id, the path or
//! command involved, and the underlying cause.

use std::fmt;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Stage of lock acquisition that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockFailureReason {
    /// The path could not be resolved to its canonical form (usually missing)
    Canonicalize,
    /// The sentinel lock file could not be opened or created
    OpenLockFile,
    /// The OS-level advisory lock could not be taken
    AdvisoryLock,
}

impl fmt::Display for LockFailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LockFailureReason::Canonicalize => write!(f, "cannot resolve path"),
            LockFailureReason::OpenLockFile => write!(f, "cannot open lock file"),
            LockFailureReason::AdvisoryLock => write!(f, "cannot take advisory lock"),
        }
    }
}

/// Failure to establish a [`PathLock`](crate::fs::locking::PathLock).
///
/// Fatal for the invocation that requested the lock. No partially acquired
/// lock is left behind when this is returned.
#[derive(Debug, Error)]
#[error("[{request_id}] failed to lock {}: {reason}", path.display())]
pub struct LockAcquisitionError {
    pub request_id: String,
    pub path: PathBuf,
    pub reason: LockFailureReason,
    #[source]
    pub source: io::Error,
}

impl LockAcquisitionError {
    pub(crate) fn new(
        request_id: &str,
        path: impl Into<PathBuf>,
        reason: LockFailureReason,
        source: io::Error,
    ) -> Self {
        Self {
            request_id: request_id.to_string(),
            path: path.into(),
            reason,
            source,
        }
    }
}

/// Failure of a single build invocation.
///
/// Produced at most once per call to
/// [`BuildExecutor::build`](crate::builder::BuildExecutor::build) and never
/// retried internally.
#[derive(Debug, Error)]
pub enum BuildError {
    /// The request's project root is not an existing directory
    #[error("[{repository_id}] project root {} is not a directory", path.display())]
    InvalidProjectRoot {
        repository_id: String,
        path: PathBuf,
    },

    /// The configured or resolved executable cannot be run
    #[error("[{repository_id}] cannot run executable {executable}: {reason}")]
    ExecutableResolution {
        repository_id: String,
        executable: String,
        reason: String,
    },

    /// The build tool exited with a non-zero status, or was killed by a signal
    #[error("[{repository_id}] build failed ({}): {command}", describe_exit(*exit_code))]
    Failed {
        repository_id: String,
        command: String,
        exit_code: Option<i32>,
        /// Output collected under [`OutputSink::Capture`](crate::models::OutputSink::Capture)
        stdout: Option<String>,
        stderr: Option<String>,
    },

    /// The build did not finish before its deadline and was terminated
    #[error("[{repository_id}] build timed out after {}ms: {command}", timeout.as_millis())]
    TimedOut {
        repository_id: String,
        command: String,
        timeout: Duration,
        /// Output collected before the build was killed
        stdout: Option<String>,
        stderr: Option<String>,
    },

    /// Waiting on or collecting output from the build process failed
    #[error("[{repository_id}] I/O error while running {command}: {source}")]
    Io {
        repository_id: String,
        command: String,
        #[source]
        source: io::Error,
    },
}

impl BuildError {
    /// Repository the failed build belonged to
    pub fn repository_id(&self) -> &str {
        match self {
            BuildError::InvalidProjectRoot { repository_id, .. }
            | BuildError::ExecutableResolution { repository_id, .. }
            | BuildError::Failed { repository_id, .. }
            | BuildError::TimedOut { repository_id, .. }
            | BuildError::Io { repository_id, .. } => repository_id,
        }
    }

    /// Whether the failure was caused by the deadline expiring
    pub fn is_timeout(&self) -> bool {
        matches!(self, BuildError::TimedOut { .. })
    }

    /// Exit code of the failed build, if it exited on its own
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            BuildError::Failed { exit_code, .. } => *exit_code,
            _ => None,
        }
    }

    /// Captured stdout of a build that ran and failed or timed out
    pub fn stdout(&self) -> Option<&str> {
        match self {
            BuildError::Failed { stdout, .. } | BuildError::TimedOut { stdout, .. } => {
                stdout.as_deref()
            }
            _ => None,
        }
    }

    /// Captured stderr of a build that ran and failed or timed out
    pub fn stderr(&self) -> Option<&str> {
        match self {
            BuildError::Failed { stderr, .. } | BuildError::TimedOut { stderr, .. } => {
                stderr.as_deref()
            }
            _ => None,
        }
    }
}

/// Failure of the process execution primitive itself, as opposed to the
/// build it ran
#[derive(Debug, Error)]
pub enum ProcessError {
    #[error("failed to spawn {command}: {source}")]
    Spawn {
        command: String,
        #[source]
        source: io::Error,
    },

    #[error("failed to open output file {}: {source}", path.display())]
    OutputFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to wait for {command}: {source}")]
    Wait {
        command: String,
        #[source]
        source: io::Error,
    },
}

fn describe_exit(exit_code: Option<i32>) -> String {
    match exit_code {
        Some(code) => format!("exit code {code}"),
        None => "terminated by signal".to_string(),
    }
}
