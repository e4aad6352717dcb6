//! Collaborators the store depends on but does not own: schedulers that run
//! units of work and the lock that serializes state transitions.

mod lock;
mod scheduler;

pub use lock::{ExecutionContext, Lock, LockExt, ReentrantLock, ThreadContext};
pub use scheduler::{ImmediateScheduler, QueueScheduler, Scheduler, Task, ThreadScheduler};
