//! Exclusive access to source trees across threads and processes
//!
//! A [`PathLock`] combines two locks on the canonical form of a path:
//!
//! - an in-process [`ReentrantLock`] from the [`PathLockRegistry`], which
//!   serializes threads of this process and lets the owning thread re-enter
//!   (a build that triggers a nested build of the same tree);
//! - an OS-level advisory lock on a sentinel file beside the path, which
//!   serializes separate processes on the same machine.
//!
//! The in-process lock is always taken first and released last, so threads
//! of one process never race each other for the OS-level lock.

mod advisory;
mod reentrant;
mod registry;


pub use advisory::{lock_file_path, AdvisoryFileLocker, FileLocker, LOCK_FILE_SUFFIX};
pub use reentrant::ReentrantLock;
pub use registry::{PathLock, PathLockRegistry};
