//! Action-driven stores: reducers, middleware and helpers around them.

use std::sync::Arc;

use crate::error::StoreError;
use crate::store::scope::StateScope;
use crate::store::state_store::{AsyncDispatcher, StoreView};
use crate::store::subscription::Subscription;
use crate::tree::StateValue;

/// A named state transition function.
///
/// The reducer is the only place where the state reacts to an action. It must
/// be a pure function: `(State, Action) -> State`.
pub trait Reducer {
    /// The state type this reducer operates on.
    type State: StateValue;

    /// The action type this reducer handles.
    type Action;

    /// Process an action and return the new state.
    fn reduce(state: Self::State, action: Self::Action) -> Self::State;
}

/// Anything actions can be sent to.
pub trait Dispatcher<A> {
    fn dispatch(&self, action: A) -> Result<(), StoreError>;
}

/// Sees every action dispatched to a [`ReducerStore`] before it is reduced.
///
/// A middleware may hand the action (or a different one) to `next`, return
/// `None` to swallow it, or dispatch further actions through `store`.
pub trait Middleware<S, A>: Send + Sync {
    fn handle(&self, store: &dyn Dispatcher<A>, state: &S, action: A, next: Next<'_, S, A>)
        -> Option<A>;
}

/// The rest of a middleware chain.
pub struct Next<'a, S, A> {
    rest: &'a [Arc<dyn Middleware<S, A>>],
    store: &'a dyn Dispatcher<A>,
    state: &'a S,
}

impl<S, A> Next<'_, S, A> {
    /// Passes `action` down the chain. Returns the action that reaches the
    /// reducer, if any.
    pub fn run(self, action: A) -> Option<A> {
        match self.rest.split_first() {
            Some((head, rest)) => head.handle(
                self.store,
                self.state,
                action,
                Next {
                    rest,
                    store: self.store,
                    state: self.state,
                },
            ),
            None => Some(action),
        }
    }
}

type ReduceFn<S, A> = dyn Fn(S, A) -> S + Send + Sync;

/// Boxed reducer function, as accepted by [`fold`].
pub type BoxedReducer<S, A> = Box<ReduceFn<S, A>>;

/// Combines `reducers` into one that applies them left to right.
pub fn fold<S, A>(
    reducers: Vec<BoxedReducer<S, A>>,
) -> Result<impl Fn(S, A) -> S + Send + Sync + 'static, StoreError>
where
    S: 'static,
    A: Clone + 'static,
{
    if reducers.is_empty() {
        return Err(StoreError::EmptyReducerList);
    }
    Ok(move |state: S, action: A| {
        reducers
            .iter()
            .fold(state, |state, reducer| reducer(state, action.clone()))
    })
}

/// A store that changes its state only through actions of type `A`.
///
/// It holds no state of its own: subscribing and reading go to the wrapped
/// view.
pub struct ReducerStore<S, A> {
    view: StoreView<S>,
    reducer: Arc<ReduceFn<S, A>>,
    middleware: Vec<Arc<dyn Middleware<S, A>>>,
}

impl<S, A> Clone for ReducerStore<S, A> {
    fn clone(&self) -> Self {
        ReducerStore {
            view: self.view.clone(),
            reducer: Arc::clone(&self.reducer),
            middleware: self.middleware.clone(),
        }
    }
}

impl<S: StateValue, A: Send + 'static> ReducerStore<S, A> {
    pub(crate) fn new(view: StoreView<S>, reducer: impl Fn(S, A) -> S + Send + Sync + 'static) -> Self {
        ReducerStore {
            view,
            reducer: Arc::new(reducer),
            middleware: Vec::new(),
        }
    }

    /// Appends `middleware` to the end of the chain.
    pub fn with_middleware(mut self, middleware: impl Middleware<S, A> + 'static) -> Self {
        self.middleware.push(Arc::new(middleware));
        self
    }

    /// Runs `action` through the middleware chain, then reduces what comes
    /// out of it.
    ///
    /// Middleware sees the state as of the call, not the state the reducer
    /// will eventually be applied to.
    pub fn dispatch(&self, action: A) -> Result<(), StoreError> {
        let action = if self.middleware.is_empty() {
            Some(action)
        } else {
            let state = self.view.state();
            Next {
                rest: &self.middleware,
                store: self,
                state: &state,
            }
            .run(action)
        };
        let Some(action) = action else {
            tracing::trace!("action swallowed by middleware");
            return Ok(());
        };
        let reducer = Arc::clone(&self.reducer);
        self.view.dispatch(move |state| reducer(state, action))
    }

    /// Asks `f` for an action based on the current state and reduces it.
    /// `None` dispatches nothing. Middleware is not involved.
    pub fn dispatch_with(
        &self,
        f: impl FnOnce(&S) -> Option<A> + Send + 'static,
    ) -> Result<(), StoreError> {
        let reducer = Arc::clone(&self.reducer);
        self.view
            .dispatch_with(move |state| f(state).map(|action| reducer(state.clone(), action)))
    }

    /// Hands the current state and an [`AsyncDispatcher`] to `f`, which may
    /// dispatch any number of action creators. Each action is reduced as its
    /// own transition. Middleware is not involved.
    pub fn dispatch_async(
        &self,
        f: impl FnOnce(&S, &AsyncDispatcher<'_, S, A>) + Send + 'static,
    ) -> Result<(), StoreError> {
        let reducer = Arc::clone(&self.reducer);
        self.view
            .run_async(move |state, action| reducer(state, action), f)
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

    pub fn view(&self) -> StoreView<S> {
        self.view.clone()
    }
}

impl<S: StateValue, A: Send + 'static> Dispatcher<A> for ReducerStore<S, A> {
    fn dispatch(&self, action: A) -> Result<(), StoreError> {
        ReducerStore::dispatch(self, action)
    }
}
