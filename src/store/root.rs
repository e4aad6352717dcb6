//! The single owner of the canonical state tree.
//!
//! Every transition runs on the update scheduler while holding the lock:
//!
//! ```text
//! dispatch(mutate) ──→ [update scheduler] ──→ lock ──→ mutate(tree) ──→ compare
//!                                                                      │
//!                                  [notification scheduler] ←── changed?
//! ```

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Weak};
use std::thread;

use parking_lot::{Mutex, RwLock};

use crate::error::StoreError;
use crate::optic::{Getter, Lens};
use crate::store::subscription::Subscription;
use crate::sync::{Lock, LockExt, Scheduler, Task};
use crate::tree::{StateTree, StateValue};

pub(crate) type Mutation = Box<dyn FnOnce(&StateTree) -> StateTree + Send>;

/// Work that runs while holding the lock, outside any single transition.
pub(crate) type Batch = Box<dyn FnOnce(&RootStateStore) + Send>;

enum Outcome {
    Pending,
    Failed(StoreError),
    Returned,
}

static NEXT_ROOT_ID: AtomicU64 = AtomicU64::new(1);

/// Something that receives committed trees.
trait Notify: Send + Sync {
    fn notify(&self, tree: &StateTree, revision: u64);
    fn is_active(&self) -> bool;
    fn deactivate(&self);
}

/// A callback bound to the projection it observes.
///
/// Each subscriber remembers the last value it delivered and the revision it
/// came from, so it only ever sees distinct consecutive values and never goes
/// back to an older revision.
struct Subscriber<S> {
    projection: Lens<StateTree, S>,
    callback: Box<dyn Fn(S) + Send + Sync>,
    last: Mutex<Option<(u64, S)>>,
    active: AtomicBool,
}

impl<S: StateValue> Notify for Subscriber<S> {
    fn notify(&self, tree: &StateTree, revision: u64) {
        if !self.is_active() {
            return;
        }
        let value = self.projection.get(tree);
        {
            let mut last = self.last.lock();
            if let Some((seen, previous)) = last.as_mut() {
                if revision < *seen {
                    return;
                }
                *seen = revision;
                if *previous == value {
                    return;
                }
            }
            *last = Some((revision, value.clone()));
        }
        // the callback may dispatch; nothing is locked here
        (self.callback)(value);
    }

    fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    fn deactivate(&self) {
        self.active.store(false, Ordering::Release);
    }
}

struct Revisioned {
    tree: StateTree,
    revision: u64,
}

pub(crate) struct RootStateStore {
    id: u64,
    state: RwLock<Revisioned>,
    dispatching: AtomicBool,
    lock: Arc<dyn Lock>,
    update_scheduler: Arc<dyn Scheduler>,
    notification_scheduler: Arc<dyn Scheduler>,
    subscribers: Mutex<BTreeMap<u64, Arc<dyn Notify>>>,
    next_subscriber: AtomicU64,
}

impl RootStateStore {
    pub(crate) fn new(
        initial: StateTree,
        lock: Arc<dyn Lock>,
        update_scheduler: Arc<dyn Scheduler>,
        notification_scheduler: Arc<dyn Scheduler>,
    ) -> Arc<Self> {
        let id = NEXT_ROOT_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(root = id, "root state store created");
        Arc::new(Self {
            id,
            state: RwLock::new(Revisioned {
                tree: initial,
                revision: 0,
            }),
            dispatching: AtomicBool::new(false),
            lock,
            update_scheduler,
            notification_scheduler,
            subscribers: Mutex::new(BTreeMap::new()),
            next_subscriber: AtomicU64::new(1),
        })
    }

    pub(crate) fn id(&self) -> u64 {
        self.id
    }

    /// Current tree. Readers never block a transition for longer than the
    /// clone of a reference count.
    pub(crate) fn snapshot(&self) -> StateTree {
        self.state.read().tree.clone()
    }

    pub(crate) fn revision(&self) -> u64 {
        self.state.read().revision
    }

    /// Submits `mutate` to the update scheduler.
    ///
    /// If the scheduler runs the work before returning, its outcome is
    /// returned. Otherwise the work was only accepted and `Ok(())` is returned;
    /// a later failure is logged.
    pub(crate) fn dispatch(self: &Arc<Self>, mutate: Mutation) -> Result<(), StoreError> {
        self.submit(move |store| store.apply(mutate))
    }

    /// Submits `batch`, which runs under the lock and may apply any number of
    /// transitions through [`RootStateStore::apply`].
    pub(crate) fn dispatch_batch(self: &Arc<Self>, batch: Batch) -> Result<(), StoreError> {
        self.submit(move |store| store.run_batch(batch))
    }

    fn submit(
        self: &Arc<Self>,
        work: impl FnOnce(&RootStateStore) -> Result<(), StoreError> + Send + 'static,
    ) -> Result<(), StoreError> {
        let caller = thread::current().id();
        let outcome = Arc::new(Mutex::new(Outcome::Pending));
        let slot = Arc::clone(&outcome);
        let store = Arc::clone(self);
        self.update_scheduler.schedule(Box::new(move || {
            let Err(err) = work(&store) else {
                return;
            };
            let mut slot = slot.lock();
            // only work run inside `schedule` reports back to the caller
            if thread::current().id() == caller && matches!(*slot, Outcome::Pending) {
                *slot = Outcome::Failed(err);
            } else {
                tracing::warn!(root = store.id, error = %err, "deferred state transition rejected");
            }
        }));
        let result = std::mem::replace(&mut *outcome.lock(), Outcome::Returned);
        match result {
            Outcome::Failed(err) => Err(err),
            Outcome::Pending | Outcome::Returned => Ok(()),
        }
    }

    /// Applies one transition on the current thread.
    pub(crate) fn apply(&self, mutate: impl FnOnce(&StateTree) -> StateTree) -> Result<(), StoreError> {
        let notification = self.lock.run_exclusively(|| {
            if self.dispatching.swap(true, Ordering::AcqRel) {
                return Err(StoreError::ReentrantDispatch);
            }
            let next = {
                let _reset = scopeguard::guard((), |()| {
                    self.dispatching.store(false, Ordering::Release);
                });
                let current = self.snapshot();
                mutate(&current)
            };
            Ok(self.commit(next))
        })??;

        if let Some(task) = notification {
            self.notification_scheduler.schedule(task);
        }
        Ok(())
    }

    fn run_batch(&self, batch: Batch) -> Result<(), StoreError> {
        self.lock.run_exclusively(|| {
            if self.dispatching.load(Ordering::Acquire) {
                return Err(StoreError::ReentrantDispatch);
            }
            batch(self);
            Ok(())
        })?
    }

    /// Blocks until both schedulers have run everything submitted so far.
    pub(crate) fn flush(&self) {
        self.update_scheduler.flush();
        self.notification_scheduler.flush();
    }

    /// Replaces the tree if `next` differs and prepares the fan-out.
    fn commit(&self, next: StateTree) -> Option<Task> {
        let revision = {
            let mut state = self.state.write();
            if state.tree == next {
                tracing::trace!(root = self.id, "state unchanged, no notification");
                return None;
            }
            state.tree = next.clone();
            state.revision += 1;
            state.revision
        };
        let subscribers: Vec<Arc<dyn Notify>> = self.subscribers.lock().values().cloned().collect();
        tracing::debug!(
            root = self.id,
            revision,
            subscribers = subscribers.len(),
            "state changed"
        );
        Some(Box::new(move || {
            for subscriber in subscribers {
                subscriber.notify(&next, revision);
            }
        }))
    }

    /// Registers `callback` on `projection`. The same update-scheduler task
    /// that registers it delivers the current value, before any later change.
    pub(crate) fn subscribe<S: StateValue>(
        self: &Arc<Self>,
        projection: Lens<StateTree, S>,
        callback: Box<dyn Fn(S) + Send + Sync>,
    ) -> Subscription {
        let id = self.next_subscriber.fetch_add(1, Ordering::Relaxed);
        let subscriber: Arc<dyn Notify> = Arc::new(Subscriber {
            projection,
            callback,
            last: Mutex::new(None),
            active: AtomicBool::new(true),
        });

        let store = Arc::clone(self);
        let registered = Arc::clone(&subscriber);
        self.update_scheduler.schedule(Box::new(move || {
            if let Some((tree, revision)) = store.register(id, Arc::clone(&registered)) {
                registered.notify(&tree, revision);
            }
        }));

        let root: Weak<Self> = Arc::downgrade(self);
        Subscription::new(move || {
            subscriber.deactivate();
            if let Some(root) = root.upgrade() {
                root.subscribers.lock().remove(&id);
                tracing::trace!(root = root.id, subscriber = id, "unsubscribed");
            }
        })
    }

    /// Adds `subscriber` and returns the state it starts from, unless it was
    /// cancelled before registration ran.
    fn register(&self, id: u64, subscriber: Arc<dyn Notify>) -> Option<(StateTree, u64)> {
        let (tree, revision) = {
            let mut subscribers = self.subscribers.lock();
            // cancelled before registration ran
            if !subscriber.is_active() {
                return None;
            }
            subscribers.insert(id, subscriber);
            let state = self.state.read();
            (state.tree.clone(), state.revision)
        };
        tracing::trace!(root = self.id, subscriber = id, revision, "subscribed");
        Some((tree, revision))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::{ImmediateScheduler, QueueScheduler, ReentrantLock};
    use crate::tree::{StateNode, StateRef};

    fn root_store(
        value: i32,
        notifications: Arc<dyn Scheduler>,
    ) -> (Arc<RootStateStore>, StateRef<i32>) {
        let node = StateNode::new(value);
        let store = RootStateStore::new(
            StateTree::new(node.clone()),
            Arc::new(ReentrantLock::new()),
            Arc::new(ImmediateScheduler),
            notifications,
        );
        (store, StateRef::root(node))
    }

    fn set_to(node: &StateRef<i32>, value: i32) -> Mutation {
        let lens = node.value();
        Box::new(move |tree| crate::optic::Setter::set(&lens, tree, value))
    }

    #[test]
    fn test_revision_only_moves_on_change() {
        let (store, node) = root_store(1, Arc::new(ImmediateScheduler));
        store.dispatch(set_to(&node, 1)).unwrap();
        assert_eq!(store.revision(), 0);
        store.dispatch(set_to(&node, 2)).unwrap();
        assert_eq!(store.revision(), 1);
        assert_eq!(node.value().get(&store.snapshot()), 2);
    }

    #[test]
    fn test_queued_deliveries_arrive_in_order() {
        let queue = Arc::new(QueueScheduler::new());
        let (store, node) = root_store(1, queue.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = store.subscribe(node.value(), Box::new(move |v| sink.lock().push(v)));

        // the initial value goes out on the update scheduler
        assert_eq!(*seen.lock(), vec![1]);

        store.dispatch(set_to(&node, 2)).unwrap();
        store.dispatch(set_to(&node, 3)).unwrap();
        assert_eq!(queue.run_pending(), 2);
        assert_eq!(*seen.lock(), vec![1, 2, 3]);
    }

    #[test]
    fn test_unsubscribe_before_delivery_suppresses_it() {
        let queue = Arc::new(QueueScheduler::new());
        let (store, node) = root_store(1, queue.clone());
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = store.subscribe(node.value(), Box::new(move |v| sink.lock().push(v)));

        store.dispatch(set_to(&node, 2)).unwrap();
        subscription.unsubscribe();
        assert_eq!(queue.run_pending(), 1);
        assert_eq!(*seen.lock(), vec![1]);
    }

    #[test]
    fn test_cancelled_before_registration_never_registers() {
        let updates = Arc::new(QueueScheduler::new());
        let store = RootStateStore::new(
            StateTree::new(StateNode::new(1)),
            Arc::new(ReentrantLock::new()),
            updates.clone(),
            Arc::new(ImmediateScheduler),
        );
        let node = StateRef::root(StateNode::new(1));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = store.subscribe(node.value(), Box::new(move |v| sink.lock().push(v)));

        subscription.unsubscribe();
        updates.run_pending();
        assert!(store.subscribers.lock().is_empty());
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn test_batch_applies_each_transition() {
        let (store, node) = root_store(1, Arc::new(ImmediateScheduler));
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = store.subscribe(node.value(), Box::new(move |v| sink.lock().push(v)));

        let lens = node.value();
        store
            .dispatch_batch(Box::new(move |root: &RootStateStore| {
                for value in [2, 2, 5] {
                    root.apply(|tree| crate::optic::Setter::set(&lens, tree, value))
                        .unwrap();
                }
            }))
            .unwrap();

        assert_eq!(store.revision(), 2);
        assert_eq!(*seen.lock(), vec![1, 2, 5]);
    }

    #[test]
    fn test_batch_inside_transition_is_reentrant() {
        let (store, node) = root_store(1, Arc::new(ImmediateScheduler));
        let inner = Arc::clone(&store);
        let lens = node.value();
        let result = Arc::new(Mutex::new(None));
        let slot = result.clone();

        store
            .dispatch(Box::new(move |tree| {
                *slot.lock() = Some(inner.dispatch_batch(Box::new(|_: &RootStateStore| {})));
                crate::optic::Setter::set(&lens, tree, 2)
            }))
            .unwrap();

        assert_eq!(*result.lock(), Some(Err(StoreError::ReentrantDispatch)));
        assert_eq!(store.revision(), 1);
    }
}
