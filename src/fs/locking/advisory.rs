//! OS-level advisory locks on sentinel files
//!
//! Advisory locks are cooperative: they only exclude other participants that
//! lock the same sentinel file. The sentinel is never deleted, since removing
//! it while another process waits on it would let a third process lock a
//! fresh inode and run concurrently.

use fs2::FileExt;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};

/// Suffix appended to the locked path's file name to form the sentinel
pub const LOCK_FILE_SUFFIX: &str = ".lock";

/// Takes and releases exclusive OS-level locks on an open file.
///
/// The production implementation is [`AdvisoryFileLocker`]; tests substitute
/// their own to inject failures.
pub trait FileLocker: Send + Sync + std::fmt::Debug {
    /// Block until an exclusive lock on `file` is held
    fn lock_exclusive(&self, file: &File) -> io::Result<()>;

    /// Release the lock held on `file`
    fn unlock(&self, file: &File) -> io::Result<()>;
}

/// `flock(2)` / `LockFileEx` advisory locks via `fs2`
#[derive(Debug, Default, Clone, Copy)]
pub struct AdvisoryFileLocker;

impl FileLocker for AdvisoryFileLocker {
    fn lock_exclusive(&self, file: &File) -> io::Result<()> {
        FileExt::lock_exclusive(file)
    }

    fn unlock(&self, file: &File) -> io::Result<()> {
        FileExt::unlock(file)
    }
}

/// Sentinel lock file for a canonical path: `<parent>/<name>.lock`.
///
/// Paths without a file name (the filesystem root) get a sentinel inside
/// the path itself.
pub fn lock_file_path(canonical: &Path) -> PathBuf {
    match (canonical.parent(), canonical.file_name()) {
        (Some(parent), Some(name)) => {
            let mut file_name = name.to_os_string();
            file_name.push(LOCK_FILE_SUFFIX);
            parent.join(file_name)
        }
        _ => canonical.join(LOCK_FILE_SUFFIX),
    }
}
