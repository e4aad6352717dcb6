//! Error types surfaced by the store.

use thiserror::Error;

/// Errors raised by store operations.
///
/// None of these are retried by the store. They signal misuse to the caller of
/// the offending operation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    /// `dispatch` or `with_state` was invoked from inside an in-flight dispatch
    /// on the same root.
    #[error("an action is already being dispatched")]
    ReentrantDispatch,

    /// The state lock is held by a different execution context.
    #[error("state is locked by another execution context (owner {owner})")]
    ConcurrentAccess { owner: u64 },

    /// Two views backed by different root stores were combined.
    #[error("cannot combine stores backed by different roots")]
    CrossRootComposition,

    /// `fold` was called without any reducer.
    #[error("no reducers passed")]
    EmptyReducerList,
}
