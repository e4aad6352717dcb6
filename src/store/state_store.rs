//! Typed, narrowed views over a [`RootStateStore`].

use std::fmt;
use std::sync::Arc;

use crate::config::{ConfigError, StoreConfig};
use crate::error::StoreError;
use crate::optic::{Getter, Lens, Setter};
use crate::store::reducer::{Reducer, ReducerStore};
use crate::store::root::RootStateStore;
use crate::store::scope::StateScope;
use crate::store::subscription::Subscription;
use crate::sync::{ImmediateScheduler, Lock, ReentrantLock, Scheduler};
use crate::tree::{zip_values, StateKey, StateNode, StateRef, StateTree, StateValue};

/// Dispatches action creators from inside [`StoreView::dispatch_async`].
///
/// Each creator sees the state current at the moment it runs and becomes a
/// transition of its own. Creators that return `None` change nothing.
pub struct AsyncDispatcher<'a, S, A = S> {
    root: &'a RootStateStore,
    lens: &'a Lens<StateTree, S>,
    reduce: &'a (dyn Fn(S, A) -> S + Send + Sync),
}

impl<S: StateValue, A> AsyncDispatcher<'_, S, A> {
    pub fn dispatch(&self, creator: impl FnOnce(&S) -> Option<A>) -> Result<(), StoreError> {
        self.root.apply(|tree: &StateTree| {
            let state = self.lens.get(tree);
            match creator(&state) {
                Some(action) => self.lens.set(tree, (self.reduce)(state, action)),
                None => tree.clone(),
            }
        })
    }
}

/// A view of `S` somewhere in a root's state.
///
/// Views come from [`StateStore::view`], [`StateStore::zip`] and
/// [`StoreView::map`]. They can read, write and observe their slice but have no
/// node of their own, so they cannot hold sub-states.
pub struct StoreView<S> {
    root: Arc<RootStateStore>,
    value: Lens<StateTree, S>,
}

impl<S> Clone for StoreView<S> {
    fn clone(&self) -> Self {
        StoreView {
            root: Arc::clone(&self.root),
            value: self.value.clone(),
        }
    }
}

impl<S> AsRef<StoreView<S>> for StoreView<S> {
    fn as_ref(&self) -> &StoreView<S> {
        self
    }
}

impl<S: StateValue> StoreView<S> {
    /// Replaces the state with `f(state)`.
    pub fn dispatch(&self, f: impl FnOnce(S) -> S + Send + 'static) -> Result<(), StoreError> {
        let lens = self.value.clone();
        self.root
            .dispatch(Box::new(move |tree: &StateTree| lens.modify(tree, f)))
    }

    /// Asks `f` for a new state. `None` leaves the state untouched.
    pub fn dispatch_with(
        &self,
        f: impl FnOnce(&S) -> Option<S> + Send + 'static,
    ) -> Result<(), StoreError> {
        let lens = self.value.clone();
        self.root.dispatch(Box::new(move |tree: &StateTree| {
            match f(&lens.get(tree)) {
                Some(next) => lens.set(tree, next),
                None => tree.clone(),
            }
        }))
    }

    /// Hands the current state and an [`AsyncDispatcher`] to `f`, which may
    /// dispatch any number of state creators.
    ///
    /// `f` holds the lock for its whole run, so its transitions are not
    /// interleaved with other dispatches.
    pub fn dispatch_async(
        &self,
        f: impl FnOnce(&S, &AsyncDispatcher<'_, S>) + Send + 'static,
    ) -> Result<(), StoreError> {
        self.run_async(|_: S, next: S| next, f)
    }

    pub(crate) fn run_async<A: 'static>(
        &self,
        reduce: impl Fn(S, A) -> S + Send + Sync + 'static,
        f: impl FnOnce(&S, &AsyncDispatcher<'_, S, A>) + Send + 'static,
    ) -> Result<(), StoreError> {
        let lens = self.value.clone();
        self.root
            .dispatch_batch(Box::new(move |root: &RootStateStore| {
                let state = lens.get(&root.snapshot());
                let dispatcher = AsyncDispatcher {
                    root,
                    lens: &lens,
                    reduce: &reduce,
                };
                f(&state, &dispatcher);
            }))
    }

    /// Runs `f` with a mutable handle on the state. The handle's final value
    /// is committed like the result of [`StoreView::dispatch`].
    pub fn with_state(
        &self,
        f: impl FnOnce(&mut StateScope<S>) + Send + 'static,
    ) -> Result<(), StoreError> {
        let lens = self.value.clone();
        self.root.dispatch(Box::new(move |tree: &StateTree| {
            let mut scope = StateScope::new(tree.clone(), lens);
            f(&mut scope);
            scope.into_tree()
        }))
    }

    /// Calls `callback` with the current state, then with every distinct new
    /// state until unsubscribed.
    pub fn subscribe(&self, callback: impl Fn(S) + Send + Sync + 'static) -> Subscription {
        self.root.subscribe(self.value.clone(), Box::new(callback))
    }

    pub fn state(&self) -> S {
        self.value.get(&self.root.snapshot())
    }

    /// Waits until work already handed to the schedulers has run. Only
    /// thread schedulers make this block.
    pub fn flush(&self) {
        self.root.flush();
    }

    /// Number of committed changes on the root so far.
    pub fn revision(&self) -> u64 {
        self.root.revision()
    }

    pub fn map<T: StateValue>(&self, lens: Lens<S, T>) -> StoreView<T> {
        StoreView {
            root: Arc::clone(&self.root),
            value: self.value.compose(lens),
        }
    }

    /// Pairs this view with another view over the same root.
    pub fn zip<T: StateValue>(
        &self,
        other: &impl AsRef<StoreView<T>>,
    ) -> Result<StoreView<(S, T)>, StoreError> {
        let other = other.as_ref();
        if !Arc::ptr_eq(&self.root, &other.root) {
            return Err(StoreError::CrossRootComposition);
        }
        Ok(StoreView {
            root: Arc::clone(&self.root),
            value: zip_values(self.value.clone(), other.value.clone()),
        })
    }

    /// Routes actions of type `A` through `reducer`.
    pub fn with_reducer<A, F>(&self, reducer: F) -> ReducerStore<S, A>
    where
        A: Send + 'static,
        F: Fn(S, A) -> S + Send + Sync + 'static,
    {
        ReducerStore::new(self.clone(), reducer)
    }

    pub fn with_reducer_of<R>(&self) -> ReducerStore<S, R::Action>
    where
        R: Reducer<State = S> + 'static,
        R::Action: Send + 'static,
    {
        self.with_reducer(R::reduce)
    }
}

impl<S: StateValue> fmt::Debug for StoreView<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StoreView")
            .field("root", &self.root.id())
            .field("state", &self.state())
            .finish()
    }
}

/// A store bound to a node of the state tree.
///
/// The root store is created with [`StateStore::new`] or [`StoreBuilder`].
/// Every store derived from it through [`StateStore::map`] or
/// [`StateStore::sub_state`] shares the same root state.
pub struct StateStore<S> {
    view: StoreView<S>,
    node: StateRef<S>,
}

impl<S> Clone for StateStore<S> {
    fn clone(&self) -> Self {
        StateStore {
            view: self.view.clone(),
            node: self.node.clone(),
        }
    }
}

impl<S> AsRef<StoreView<S>> for StateStore<S> {
    fn as_ref(&self) -> &StoreView<S> {
        &self.view
    }
}

impl StateStore<()> {
    pub fn builder() -> StoreBuilder {
        StoreBuilder::new()
    }
}

impl<S: StateValue> StateStore<S> {
    /// Root store with immediate schedulers and a thread-owned lock.
    pub fn new(initial: S) -> StateStore<S> {
        StoreBuilder::new().build(initial)
    }

    fn bind(root: Arc<RootStateStore>, node: StateRef<S>) -> StateStore<S> {
        StateStore {
            view: StoreView {
                root,
                value: node.value(),
            },
            node,
        }
    }

    pub fn dispatch(&self, f: impl FnOnce(S) -> S + Send + 'static) -> Result<(), StoreError> {
        self.view.dispatch(f)
    }

    pub fn dispatch_with(
        &self,
        f: impl FnOnce(&S) -> Option<S> + Send + 'static,
    ) -> Result<(), StoreError> {
        self.view.dispatch_with(f)
    }

    pub fn dispatch_async(
        &self,
        f: impl FnOnce(&S, &AsyncDispatcher<'_, S>) + Send + 'static,
    ) -> Result<(), StoreError> {
        self.view.dispatch_async(f)
    }

    pub fn with_state(
        &self,
        f: impl FnOnce(&mut StateScope<S>) + Send + 'static,
    ) -> Result<(), StoreError> {
        self.view.with_state(f)
    }

    pub fn subscribe(&self, callback: impl Fn(S) + Send + Sync + 'static) -> Subscription {
        self.view.subscribe(callback)
    }

    pub fn state(&self) -> S {
        self.view.state()
    }

    pub fn flush(&self) {
        self.view.flush()
    }

    pub fn revision(&self) -> u64 {
        self.view.revision()
    }

    /// Narrows the store through `lens`. Sub-states of the result live under
    /// this store's node.
    pub fn map<T: StateValue>(&self, lens: Lens<S, T>) -> StateStore<T> {
        StateStore::bind(Arc::clone(&self.view.root), self.node.map(lens))
    }

    /// Store of `(this state, child state)` where the child lives under `key`
    /// and starts as `init()` the first time it is read.
    pub fn sub_state<C, F>(&self, key: impl Into<StateKey>, init: F) -> StateStore<(S, C)>
    where
        C: StateValue,
        F: Fn() -> C + Send + Sync + 'static,
    {
        StateStore::bind(Arc::clone(&self.view.root), self.node.add_child(key, init))
    }

    pub fn view(&self) -> StoreView<S> {
        self.view.clone()
    }

    pub fn zip<T: StateValue>(
        &self,
        other: &impl AsRef<StoreView<T>>,
    ) -> Result<StoreView<(S, T)>, StoreError> {
        self.view.zip(other)
    }

    pub fn with_reducer<A, F>(&self, reducer: F) -> ReducerStore<S, A>
    where
        A: Send + 'static,
        F: Fn(S, A) -> S + Send + Sync + 'static,
    {
        self.view.with_reducer(reducer)
    }

    pub fn with_reducer_of<R>(&self) -> ReducerStore<S, R::Action>
    where
        R: Reducer<State = S> + 'static,
        R::Action: Send + 'static,
    {
        self.view.with_reducer_of::<R>()
    }
}

impl<S: StateValue> fmt::Debug for StateStore<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StateStore")
            .field("root", &self.view.root.id())
            .field("state", &self.state())
            .finish()
    }
}

/// Assembles a root store from its collaborators.
///
/// Anything not provided defaults to [`ImmediateScheduler`] and a
/// [`ReentrantLock`] keyed by thread.
#[derive(Default)]
pub struct StoreBuilder {
    update: Option<Arc<dyn Scheduler>>,
    notification: Option<Arc<dyn Scheduler>>,
    lock: Option<Arc<dyn Lock>>,
}

impl StoreBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheduler that runs state transitions and subscription registration.
    pub fn update_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.update = Some(scheduler);
        self
    }

    /// Scheduler that delivers values to subscribers.
    pub fn notification_scheduler(mut self, scheduler: Arc<dyn Scheduler>) -> Self {
        self.notification = Some(scheduler);
        self
    }

    pub fn lock(mut self, lock: Arc<dyn Lock>) -> Self {
        self.lock = Some(lock);
        self
    }

    /// Takes both schedulers from `config`. Thread schedulers are started
    /// here.
    pub fn with_config(self, config: &StoreConfig) -> Result<Self, ConfigError> {
        Ok(self
            .update_scheduler(config.update.build("update")?)
            .notification_scheduler(config.notification.build("notification")?))
    }

    pub fn build<S: StateValue>(self, initial: S) -> StateStore<S> {
        let node = StateNode::new(initial);
        let root = RootStateStore::new(
            StateTree::new(node.clone()),
            self.lock.unwrap_or_else(|| Arc::new(ReentrantLock::new())),
            self.update.unwrap_or_else(|| Arc::new(ImmediateScheduler)),
            self.notification
                .unwrap_or_else(|| Arc::new(ImmediateScheduler)),
        );
        StateStore::bind(root, StateRef::root(node))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optic::first;
    use parking_lot::Mutex;

    #[test]
    fn test_map_writes_through_to_parent() {
        let store = StateStore::new((1, "one".to_string()));
        let left = store.map(first());

        left.dispatch(|n| n + 1).unwrap();
        assert_eq!(store.state(), (2, "one".to_string()));
    }

    #[test]
    fn test_sub_state_through_mapped_store() {
        let store = StateStore::new((1, 2));
        let child = store.map(first()).sub_state("child", || "c".to_string());

        child.dispatch(|(n, c)| (n * 10, c + "!")).unwrap();
        assert_eq!(store.state(), (10, 2));
        assert_eq!(child.state(), (10, "c!".to_string()));
    }

    #[test]
    fn test_dispatch_with_none_keeps_state() {
        let store = StateStore::new(5);
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = store.subscribe(move |v| sink.lock().push(v));

        store.dispatch_with(|_| None).unwrap();
        store.dispatch_with(|v| Some(v + 1)).unwrap();

        assert_eq!(*seen.lock(), vec![5, 6]);
        assert_eq!(store.revision(), 1);
    }

    #[test]
    fn test_zip_requires_same_root() {
        let store = StateStore::new((1, 2));
        let other = StateStore::new(3);
        assert_eq!(
            store.zip(&other).unwrap_err(),
            StoreError::CrossRootComposition
        );

        let child = store.sub_state("x", || 9);
        let zipped = store.zip(&child).unwrap();
        assert_eq!(zipped.state(), ((1, 2), ((1, 2), 9)));
    }

    #[test]
    fn test_builder_needs_no_type_annotations() {
        let store = StateStore::builder()
            .update_scheduler(Arc::new(ImmediateScheduler))
            .build("built".to_string());
        store.dispatch(|s| s + "!").unwrap();
        assert_eq!(store.state(), "built!");
    }

    #[test]
    fn test_dispatch_async_on_zipped_view() {
        let store = StateStore::new((1, 2));
        let child = store.sub_state("x", || 0);
        let zipped = store.zip(&child).unwrap();

        zipped
            .dispatch_async(|state, dispatcher| {
                let ((a, b), _) = state.clone();
                dispatcher
                    .dispatch(move |(_, (_, c))| Some(((a + b, b), ((a + b, b), c + 1))))
                    .unwrap();
            })
            .unwrap();

        assert_eq!(store.state(), (3, 2));
        assert_eq!(child.state(), ((3, 2), 1));
    }

    #[test]
    fn test_debug_shows_state() {
        let store = StateStore::new(7);
        assert!(format!("{store:?}").contains("state: 7"));
    }
}
