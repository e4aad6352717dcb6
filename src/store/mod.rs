//! Stores: the root state machine and the typed views built on top of it.

mod reducer;
mod root;
mod scope;
mod state_store;
mod subscription;

pub use reducer::{fold, BoxedReducer, Dispatcher, Middleware, Next, Reducer, ReducerStore};
pub use scope::StateScope;
pub use state_store::{AsyncDispatcher, StateStore, StoreBuilder, StoreView};
pub use subscription::Subscription;
