use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

type OnUnsubscribe = Box<dyn FnOnce() + Send>;

struct Inner {
    unsubscribed: AtomicBool,
    on_unsubscribe: Mutex<Option<OnUnsubscribe>>,
}

/// Handle returned by `subscribe`.
///
/// Subscriptions live until [`Subscription::unsubscribe`] is called; dropping
/// the handle does not unsubscribe. Clones share the same registration.
#[derive(Clone)]
pub struct Subscription {
    inner: Arc<Inner>,
}

impl Subscription {
    /// Wraps the logic that detaches a subscriber. It runs at most once.
    pub fn new(on_unsubscribe: impl FnOnce() + Send + 'static) -> Self {
        Self {
            inner: Arc::new(Inner {
                unsubscribed: AtomicBool::new(false),
                on_unsubscribe: Mutex::new(Some(Box::new(on_unsubscribe))),
            }),
        }
    }

    /// Stops delivery. Calling it again is a no-op.
    pub fn unsubscribe(&self) {
        if self.inner.unsubscribed.swap(true, Ordering::AcqRel) {
            return;
        }
        let detach = self.inner.on_unsubscribe.lock().take();
        if let Some(detach) = detach {
            detach();
        }
    }

    pub fn is_unsubscribed(&self) -> bool {
        self.inner.unsubscribed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("unsubscribed", &self.is_unsubscribed())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_unsubscribe_runs_once() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let subscription = Subscription::new(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        let clone = subscription.clone();

        assert!(!subscription.is_unsubscribed());
        subscription.unsubscribe();
        subscription.unsubscribe();
        clone.unsubscribe();

        assert!(clone.is_unsubscribed());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
