//! Counting reentrant lock owned by a single thread at a time

use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::thread::{self, ThreadId};

#[derive(Debug, Default)]
struct Ownership {
    owner: Option<ThreadId>,
    depth: usize,
}

/// Mutual exclusion between threads that the owning thread may re-enter.
///
/// Each successful [`lock`](Self::lock) must be paired with one
/// [`unlock`](Self::unlock) on the same thread; other threads are admitted
/// only once the depth drops back to zero.
#[derive(Debug, Default)]
pub struct ReentrantLock {
    state: Mutex<Ownership>,
    released: Condvar,
}

impl ReentrantLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Block until the calling thread owns the lock.
    ///
    /// Returns the hold depth after acquiring; `1` means this call took the
    /// lock from free, anything higher is a nested acquisition.
    pub fn lock(&self) -> usize {
        let me = thread::current().id();
        let mut state = self.state();
        loop {
            match state.owner {
                None => {
                    state.owner = Some(me);
                    state.depth = 1;
                    return 1;
                }
                Some(owner) if owner == me => {
                    state.depth += 1;
                    return state.depth;
                }
                Some(_) => {
                    state = self
                        .released
                        .wait(state)
                        .unwrap_or_else(PoisonError::into_inner);
                }
            }
        }
    }

    /// Like [`lock`](Self::lock) but returns `None` instead of blocking
    pub fn try_lock(&self) -> Option<usize> {
        let me = thread::current().id();
        let mut state = self.state();
        match state.owner {
            None => {
                state.owner = Some(me);
                state.depth = 1;
                Some(1)
            }
            Some(owner) if owner == me => {
                state.depth += 1;
                Some(state.depth)
            }
            Some(_) => None,
        }
    }

    /// Release one level of ownership.
    ///
    /// Returns the remaining depth, or `None` if the calling thread does not
    /// hold the lock (nothing is changed in that case).
    pub fn unlock(&self) -> Option<usize> {
        let me = thread::current().id();
        let mut state = self.state();
        if state.owner != Some(me) || state.depth == 0 {
            return None;
        }
        state.depth -= 1;
        if state.depth == 0 {
            state.owner = None;
            drop(state);
            self.released.notify_one();
            return Some(0);
        }
        Some(state.depth)
    }

    pub fn is_locked(&self) -> bool {
        self.state().owner.is_some()
    }

    pub fn is_held_by_current_thread(&self) -> bool {
        self.state().owner == Some(thread::current().id())
    }

    /// Current hold depth, zero when free
    pub fn depth(&self) -> usize {
        self.state().depth
    }

    // The guarded state is two plain fields that are never left half-written,
    // so a poisoned mutex is still consistent.
    fn state(&self) -> MutexGuard<'_, Ownership> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
