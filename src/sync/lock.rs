//! Fail-fast, owner-reentrant mutual exclusion.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use crate::error::StoreError;

const UNOWNED: u64 = 0;

/// Identity of the calling execution context (a thread, a task, ...).
///
/// Ids must be non-zero and stable for the lifetime of the context.
pub trait ExecutionContext: Send + Sync {
    fn current_id(&self) -> u64;
}

static NEXT_THREAD_ID: AtomicU64 = AtomicU64::new(1);

thread_local! {
    static THREAD_ID: u64 = NEXT_THREAD_ID.fetch_add(1, Ordering::Relaxed);
}

/// Identifies execution contexts by OS thread.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadContext;

impl ExecutionContext for ThreadContext {
    fn current_id(&self) -> u64 {
        THREAD_ID.with(|id| *id)
    }
}

/// Mutual exclusion collaborator consumed by the store.
///
/// Nested acquisitions by the owning context succeed. Acquisition by any other
/// context while the lock is held fails immediately instead of waiting.
pub trait Lock: Send + Sync {
    fn try_acquire(&self) -> Result<(), StoreError>;

    /// Undoes one successful `try_acquire`.
    fn release(&self);
}

pub trait LockExt: Lock {
    /// Runs `work` while holding the lock. The lock is released even if
    /// `work` panics.
    fn run_exclusively<R>(&self, work: impl FnOnce() -> R) -> Result<R, StoreError> {
        self.try_acquire()?;
        let _release = scopeguard::guard((), |()| self.release());
        Ok(work())
    }
}

impl<L: Lock + ?Sized> LockExt for L {}

/// Default [`Lock`]: an owner token plus a hold count.
pub struct ReentrantLock {
    owner: AtomicU64,
    depth: AtomicUsize,
    context: Arc<dyn ExecutionContext>,
}

impl ReentrantLock {
    pub fn new() -> Self {
        Self::with_context(Arc::new(ThreadContext))
    }

    /// Uses `context` to tell owners apart, e.g. task ids on a cooperative
    /// single-threaded executor.
    pub fn with_context(context: Arc<dyn ExecutionContext>) -> Self {
        Self {
            owner: AtomicU64::new(UNOWNED),
            depth: AtomicUsize::new(0),
            context,
        }
    }

    /// Current owner id, if held.
    pub fn owner(&self) -> Option<u64> {
        match self.owner.load(Ordering::Acquire) {
            UNOWNED => None,
            owner => Some(owner),
        }
    }

    pub fn is_held_by_current(&self) -> bool {
        self.owner() == Some(self.context.current_id())
    }
}

impl Default for ReentrantLock {
    fn default() -> Self {
        Self::new()
    }
}

impl Lock for ReentrantLock {
    fn try_acquire(&self) -> Result<(), StoreError> {
        let me = self.context.current_id();
        match self
            .owner
            .compare_exchange(UNOWNED, me, Ordering::AcqRel, Ordering::Acquire)
        {
            Ok(_) => {}
            Err(owner) if owner == me => {}
            Err(owner) => return Err(StoreError::ConcurrentAccess { owner }),
        }
        self.depth.fetch_add(1, Ordering::AcqRel);
        Ok(())
    }

    fn release(&self) {
        // only the owner gets here, so depth is not contended
        if self.depth.fetch_sub(1, Ordering::AcqRel) == 1 {
            self.owner.store(UNOWNED, Ordering::Release);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use std::thread;

    struct SwitchableContext(AtomicU64);

    impl ExecutionContext for SwitchableContext {
        fn current_id(&self) -> u64 {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[test]
    fn test_nested_acquisition_by_owner_succeeds() {
        let lock = ReentrantLock::new();
        let result = lock.run_exclusively(|| lock.run_exclusively(|| 42));
        assert_eq!(result, Ok(Ok(42)));
        assert_eq!(lock.owner(), None);
    }

    #[test]
    fn test_foreign_thread_fails_fast() {
        let lock = Arc::new(ReentrantLock::new());
        let (entered_tx, entered_rx) = mpsc::channel();
        let (release_tx, release_rx) = mpsc::channel::<()>();

        let holder = {
            let lock = Arc::clone(&lock);
            thread::spawn(move || {
                lock.run_exclusively(|| {
                    entered_tx.send(()).unwrap();
                    release_rx.recv().unwrap();
                })
            })
        };

        entered_rx.recv().unwrap();
        let result = lock.run_exclusively(|| ());
        assert!(matches!(result, Err(StoreError::ConcurrentAccess { .. })));
        assert!(!lock.is_held_by_current());

        release_tx.send(()).unwrap();
        holder.join().unwrap().unwrap();
        assert_eq!(lock.run_exclusively(|| 1), Ok(1));
    }

    #[test]
    fn test_released_after_panic() {
        let lock = ReentrantLock::new();
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = lock.run_exclusively(|| panic!("boom"));
        }));
        assert!(result.is_err());
        assert_eq!(lock.owner(), None);
    }

    #[test]
    fn test_custom_context_distinguishes_tasks() {
        let context = Arc::new(SwitchableContext(AtomicU64::new(7)));
        let lock = ReentrantLock::with_context(context.clone());

        lock.try_acquire().unwrap();
        assert_eq!(lock.owner(), Some(7));

        context.0.store(8, Ordering::SeqCst);
        assert_eq!(
            lock.try_acquire(),
            Err(StoreError::ConcurrentAccess { owner: 7 })
        );

        context.0.store(7, Ordering::SeqCst);
        lock.release();
        assert_eq!(lock.owner(), None);
    }
}
