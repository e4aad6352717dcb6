use crate::optic::{Getter, Lens, Setter};
use crate::tree::{StateTree, StateValue};

/// Mutable handle over a store's state for the duration of `with_state`.
///
/// Reads and writes go to a working copy of the tree owned by the running
/// transition. Whatever the handle holds when the closure returns becomes the
/// candidate state.
pub struct StateScope<S> {
    tree: StateTree,
    lens: Lens<StateTree, S>,
}

impl<S: StateValue> StateScope<S> {
    pub(crate) fn new(tree: StateTree, lens: Lens<StateTree, S>) -> Self {
        Self { tree, lens }
    }

    pub fn get(&self) -> S {
        self.lens.get(&self.tree)
    }

    pub fn set(&mut self, value: S) {
        self.tree = self.lens.set(&self.tree, value);
    }

    pub fn update(&mut self, f: impl FnOnce(S) -> S) {
        self.tree = self.lens.modify(&self.tree, f);
    }

    /// Narrows the scope through `lens`, runs `f`, then writes back.
    pub fn focus<T: StateValue>(&mut self, lens: Lens<S, T>, f: impl FnOnce(&mut StateScope<T>)) {
        let mut inner = StateScope::new(self.tree.clone(), self.lens.compose(lens));
        f(&mut inner);
        self.tree = inner.tree;
    }

    pub(crate) fn into_tree(self) -> StateTree {
        self.tree
    }
}
