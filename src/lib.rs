//! Hierarchical immutable state with lens-based projections.
//!
//! A single [`RootStateStore`](store) owns the state tree. Typed views narrow
//! it with lenses ([`StateStore::map`]) or extend it with keyed children
//! ([`StateStore::sub_state`]), and all of them share one serialized update
//! path and one subscriber registry.
//!
//! ```
//! use lenstore::StateStore;
//!
//! let store = StateStore::new(23);
//! let child = store.sub_state("sub", || 2);
//!
//! store.dispatch(|n| n * 2).unwrap();
//! assert_eq!(child.state(), (46, 2));
//! ```

pub mod config;
pub mod error;
pub mod logging;
pub mod optic;
pub mod store;
pub mod sync;
pub mod todo;
pub mod tree;

pub use error::StoreError;
pub use optic::{Getter, Lens, Setter};
pub use store::{
    fold, AsyncDispatcher, Dispatcher, Middleware, Next, Reducer, ReducerStore, StateScope, StateStore,
    StoreBuilder, StoreView, Subscription,
};
pub use tree::{StateKey, StateValue};
