//! Lenses from the root of a state tree to a (possibly nested) node.

use crate::optic::{Getter, Lens, Setter};
use crate::tree::node::{StateKey, StateNode, StateTree, StateValue};

/// A reference to a node of type `V` somewhere inside a [`StateTree`].
///
/// It is a lens from the erased root to a `StateNode<V>`. Mapping a ref keeps
/// the node's children reachable, so sub-states can be nested through a mapped
/// ref as well.
pub struct StateRef<V> {
    node: Lens<StateTree, StateNode<V>>,
}

impl<V> Clone for StateRef<V> {
    fn clone(&self) -> Self {
        StateRef {
            node: self.node.clone(),
        }
    }
}

impl<V: StateValue> StateRef<V> {
    /// Ref to the root node of a tree created from `initial`.
    ///
    /// The root is always written through this ref, so the down-cast on read
    /// only misses for a tree that never came from this ref. Such a tree reads
    /// as `initial`.
    pub fn root(initial: StateNode<V>) -> StateRef<V> {
        StateRef {
            node: Lens::new(
                move |tree: &StateTree| match tree.node::<V>() {
                    Some(node) => node.clone(),
                    None => {
                        tracing::warn!(
                            expected = std::any::type_name::<V>(),
                            "root state has an unexpected shape"
                        );
                        initial.clone()
                    }
                },
                |_: &StateTree, node: StateNode<V>| StateTree::new(node),
            ),
        }
    }

    /// Lens from the root tree to this node's value.
    pub fn value(&self) -> Lens<StateTree, V> {
        self.node.compose(StateNode::value_lens())
    }

    /// Lens from the root tree to the node itself.
    pub fn node(&self) -> &Lens<StateTree, StateNode<V>> {
        &self.node
    }

    /// Reshapes the value through `lens`; the children stay attached.
    pub fn map<T: StateValue>(&self, lens: Lens<V, T>) -> StateRef<T> {
        let reader = lens.clone();
        StateRef {
            node: self.node.compose(Lens::new(
                move |node: &StateNode<V>| {
                    StateNode::with_children(reader.get(node.value()), node.children().clone())
                },
                move |node: &StateNode<V>, mapped: StateNode<T>| {
                    let (value, children) = mapped.into_parts();
                    StateNode::with_children(lens.set(node.value(), value), children)
                },
            )),
        }
    }

    /// Attaches a child state under `key`.
    ///
    /// Reading resolves the existing child at `key`, or synthesizes one from
    /// `init` when the key is absent (or holds a different shape). The value
    /// seen through the returned ref is `(parent value, child value)`; writing
    /// splits the pair back and stores the child under `key`.
    pub fn add_child<C, F>(&self, key: impl Into<StateKey>, init: F) -> StateRef<(V, C)>
    where
        C: StateValue,
        F: Fn() -> C + Send + Sync + 'static,
    {
        let key = key.into();
        let write_key = key.clone();
        StateRef {
            node: self.node.compose(Lens::new(
                move |parent: &StateNode<V>| {
                    let child = match parent.children().get::<C>(&key) {
                        Some(child) => child.clone(),
                        None => {
                            if parent.children().contains_key(&key) {
                                tracing::warn!(
                                    key = %key,
                                    expected = std::any::type_name::<C>(),
                                    "child state has a different shape, reinitializing"
                                );
                            }
                            StateNode::new(init())
                        }
                    };
                    let (child_value, grandchildren) = child.into_parts();
                    StateNode::with_children((parent.value().clone(), child_value), grandchildren)
                },
                move |parent: &StateNode<V>, pair: StateNode<(V, C)>| {
                    let ((value, child_value), grandchildren) = pair.into_parts();
                    let child = StateNode::with_children(child_value, grandchildren);
                    StateNode::with_children(
                        value,
                        parent.children().insert(write_key.clone(), child),
                    )
                },
            )),
        }
    }

    /// Pairs the values of two refs into one lens. The result has no node of
    /// its own, so it cannot carry children.
    pub fn zip<T: StateValue>(&self, other: &StateRef<T>) -> Lens<StateTree, (V, T)> {
        zip_values(self.value(), other.value())
    }
}

/// Pairs two value lenses over the same tree. Writing applies the left half
/// first, then the right half on top of it.
pub fn zip_values<A, B>(left: Lens<StateTree, A>, right: Lens<StateTree, B>) -> Lens<StateTree, (A, B)>
where
    A: StateValue,
    B: StateValue,
{
    let (read_left, read_right) = (left.clone(), right.clone());
    Lens::new(
        move |tree: &StateTree| (read_left.get(tree), read_right.get(tree)),
        move |tree: &StateTree, (a, b): (A, B)| right.set(&left.set(tree, a), b),
    )
}
