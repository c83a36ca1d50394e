//! Process execution primitive
//!
//! Runs one build-tool command with a working directory, environment and
//! deadline, and reports how it ended. A process that outlives its deadline
//! is killed together with every process it started.
//!
//! # Timeout Behavior
//!
//! When a command exceeds its timeout:
//! - SIGKILL is sent to the child's process group (Unix), or the child is
//!   terminated with TerminateProcess (Windows)
//! - The child is reaped before control returns to the caller
//! - The outcome is [`ExecutionState::TimedOut`]

mod output;
mod result;
mod runner;


pub use output::MAX_OUTPUT_SIZE;
pub use result::{ExecutionOutcome, ExecutionState};
pub use runner::{ProcessRunner, SystemRunner};

use std::process::Child;

#[cfg(unix)]
use nix::errno::Errno;
#[cfg(unix)]
use nix::sys::signal::{kill, killpg, Signal};
#[cfg(unix)]
use nix::unistd::Pid;

/// Check if a process with the given PID is alive
///
/// Uses `kill` with the null signal, which distinguishes:
/// - process exists and we can signal it (`Ok(())`)
/// - process exists but we lack permission (`EPERM`)
/// - process does not exist (`ESRCH`)
///
/// A PID that does not fit in `i32` is reported as not alive.
#[cfg(unix)]
pub fn is_process_alive(pid: u32) -> bool {
    let Ok(pid) = i32::try_from(pid) else {
        return false;
    };

    match kill(Pid::from_raw(pid), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
pub fn is_process_alive(_pid: u32) -> bool {
    false
}

/// Kill `child` and the process group it leads, then reap it.
///
/// Errors are ignored: the group may already be gone.
pub(crate) fn terminate_process_group(child: &mut Child) {
    #[cfg(unix)]
    {
        if let Ok(pid) = i32::try_from(child.id()) {
            let _ = killpg(Pid::from_raw(pid), Signal::SIGKILL);
        }
    }
    let _ = child.kill();
    let _ = child.wait();
}
