use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

use super::advisory::{lock_file_path, AdvisoryFileLocker, FileLocker};
use super::reentrant::ReentrantLock;
use crate::error::{LockAcquisitionError, LockFailureReason};

/// Table of per-path locks shared by every build in this process.
///
/// Construct one at startup and hand it (usually behind an `Arc`) to every
/// caller that needs to lock a source tree. Entries are created on first use
/// and kept for the registry's lifetime.
#[derive(Debug)]
pub struct PathLockRegistry {
    locks: Mutex<HashMap<PathBuf, Arc<PathEntry>>>,
    locker: Arc<dyn FileLocker>,
    release_failures: Arc<AtomicUsize>,
}

impl Default for PathLockRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl PathLockRegistry {
    /// Registry using `fs2` advisory file locks
    pub fn new() -> Self {
        Self::with_locker(Arc::new(AdvisoryFileLocker))
    }

    pub fn with_locker(locker: Arc<dyn FileLocker>) -> Self {
        Self {
            locks: Mutex::new(HashMap::new()),
            locker,
            release_failures: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Claim exclusive access to `path` for the calling thread.
    ///
    /// Blocks until no other thread of this process and no other process
    /// holds the path. The in-process lock is taken first and the OS-level
    /// lock second; if the second step fails the first is undone before the
    /// error is returned.
    ///
    /// A thread that already holds the path may acquire it again. The OS-level
    /// lock is taken by the first claim and held until the thread's last
    /// claim on the path is released, in whatever order the claims close.
    pub fn acquire(
        &self,
        path: &Path,
        request_id: &str,
    ) -> Result<PathLock, LockAcquisitionError> {
        let canonical = fs::canonicalize(path).map_err(|e| {
            LockAcquisitionError::new(request_id, path, LockFailureReason::Canonicalize, e)
        })?;
        let lock_file_path = lock_file_path(&canonical);
        let entry = self.lock_for(&canonical);

        debug!(request_id, path = %canonical.display(), "waiting for path lock");
        let depth = entry.thread_lock.lock();

        if depth == 1 {
            match self.lock_file(&lock_file_path, request_id) {
                Ok(file) => *entry.file() = Some(file),
                Err(e) => {
                    entry.thread_lock.unlock();
                    return Err(e);
                }
            }
        } else {
            debug!(request_id, depth, path = %canonical.display(), "re-entered path lock");
        }

        debug!(request_id, path = %canonical.display(), "path lock acquired");
        Ok(PathLock {
            path: canonical,
            lock_file_path,
            nested: depth > 1,
            entry,
            locker: Arc::clone(&self.locker),
            release_failures: Arc::clone(&self.release_failures),
            request_id: request_id.to_string(),
            released: false,
            _not_send: PhantomData,
        })
    }

    /// Whether any thread of this process currently holds `path`
    pub fn is_locked(&self, path: &Path) -> bool {
        let Ok(canonical) = fs::canonicalize(path) else {
            return false;
        };
        self.locks()
            .get(&canonical)
            .is_some_and(|entry| entry.thread_lock.is_locked())
    }

    /// Number of distinct paths ever locked through this registry
    pub fn len(&self) -> usize {
        self.locks().len()
    }

    pub fn is_empty(&self) -> bool {
        self.locks().is_empty()
    }

    /// Number of OS-level releases that failed and were only logged
    pub fn release_failures(&self) -> usize {
        self.release_failures.load(Ordering::SeqCst)
    }

    fn lock_for(&self, canonical: &Path) -> Arc<PathEntry> {
        let mut locks = self.locks();
        Arc::clone(locks.entry(canonical.to_path_buf()).or_default())
    }

    fn lock_file(
        &self,
        lock_file_path: &Path,
        request_id: &str,
    ) -> Result<File, LockAcquisitionError> {
        // Never truncate: the sentinel's contents are irrelevant and another
        // process may hold it open.
        #[allow(clippy::suspicious_open_options)]
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .open(lock_file_path)
            .map_err(|e| {
                LockAcquisitionError::new(
                    request_id,
                    lock_file_path,
                    LockFailureReason::OpenLockFile,
                    e,
                )
            })?;
        self.locker.lock_exclusive(&file).map_err(|e| {
            LockAcquisitionError::new(
                request_id,
                lock_file_path,
                LockFailureReason::AdvisoryLock,
                e,
            )
        })?;
        Ok(file)
    }

    fn locks(&self) -> MutexGuard<'_, HashMap<PathBuf, Arc<PathEntry>>> {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Registry state for one canonical path.
///
/// The sentinel file is owned by the hold as a whole rather than by any
/// single claim: it is locked when the depth goes from zero to one and
/// unlocked when the last claim is released.
#[derive(Debug, Default)]
struct PathEntry {
    thread_lock: ReentrantLock,
    /// Locked sentinel, `Some` while any claim on the path is live
    file: Mutex<Option<File>>,
}

impl PathEntry {
    fn file(&self) -> MutexGuard<'_, Option<File>> {
        self.file.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// An exclusive claim on a canonical path.
///
/// Release it with [`close`](Self::close); dropping it releases it as well.
/// The claim belongs to the thread that acquired it and cannot be sent to
/// another thread.
#[derive(Debug)]
pub struct PathLock {
    path: PathBuf,
    lock_file_path: PathBuf,
    /// Whether the thread already held the path when this claim was made
    nested: bool,
    entry: Arc<PathEntry>,
    locker: Arc<dyn FileLocker>,
    release_failures: Arc<AtomicUsize>,
    request_id: String,
    released: bool,
    _not_send: PhantomData<*const ()>,
}

impl PathLock {
    /// The canonical path this lock guards
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_file_path(&self) -> &Path {
        &self.lock_file_path
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }

    /// Whether this claim re-entered a lock the thread already held
    pub fn is_nested(&self) -> bool {
        self.nested
    }

    /// Release the claim.
    ///
    /// When this is the thread's last claim on the path, the OS-level lock
    /// is released first. A failure there is logged and counted but never
    /// returned; the in-process lock is released regardless.
    pub fn close(mut self) {
        self.release();
    }

    fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;

        if !self.entry.thread_lock.is_held_by_current_thread() {
            warn!(
                request_id = %self.request_id,
                path = %self.path.display(),
                "path lock released by a thread that does not own it"
            );
            return;
        }

        // Only the owning thread changes the depth, so this cannot race.
        let last = self.entry.thread_lock.depth() == 1;
        if let Some(file) = last.then(|| self.entry.file().take()).flatten() {
            if let Err(e) = self.locker.unlock(&file) {
                self.release_failures.fetch_add(1, Ordering::SeqCst);
                warn!(
                    request_id = %self.request_id,
                    lock_file = %self.lock_file_path.display(),
                    error = %e,
                    "could not release lock file"
                );
            }
            // Closing the descriptor drops any advisory lock still attached to it.
            drop(file);
        }

        self.entry.thread_lock.unlock();
        debug!(request_id = %self.request_id, path = %self.path.display(), "path lock released");
    }
}

impl Drop for PathLock {
    fn drop(&mut self) {
        self.release();
    }
}
