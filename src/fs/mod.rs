pub mod locking;

pub use locking::{PathLock, PathLockRegistry};
