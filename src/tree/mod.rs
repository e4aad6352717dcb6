//! The state tree: a root value plus keyed, independently addressable
//! sub-states, and the refs used to navigate it.

mod node;
mod state_ref;

pub use node::{Children, StateKey, StateNode, StateTree, StateValue};
pub use state_ref::{zip_values, StateRef};
