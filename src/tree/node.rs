//! Immutable state nodes.
//!
//! A [`StateNode<V>`] holds a value plus a keyed map of child nodes. Children
//! are heterogeneous: every child may carry a different value type. They are
//! stored type-erased and down-cast on read, keyed by [`StateKey`].

use std::any::Any;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::optic::Lens;

/// Capability required from every value held by the store.
///
/// `PartialEq` is not incidental: the store compares old and new trees by
/// structural equality to decide whether subscribers are notified.
pub trait StateValue: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

impl<T> StateValue for T where T: Clone + PartialEq + fmt::Debug + Send + Sync + 'static {}

/// Key of a child state under its parent.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StateKey {
    Name(Arc<str>),
    Index(i64),
}

impl fmt::Display for StateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StateKey::Name(name) => write!(f, "{}", name),
            StateKey::Index(index) => write!(f, "#{}", index),
        }
    }
}

impl From<&str> for StateKey {
    fn from(name: &str) -> Self {
        StateKey::Name(Arc::from(name))
    }
}

impl From<String> for StateKey {
    fn from(name: String) -> Self {
        StateKey::Name(Arc::from(name))
    }
}

impl From<i32> for StateKey {
    fn from(index: i32) -> Self {
        StateKey::Index(i64::from(index))
    }
}

impl From<i64> for StateKey {
    fn from(index: i64) -> Self {
        StateKey::Index(index)
    }
}

impl From<u32> for StateKey {
    fn from(index: u32) -> Self {
        StateKey::Index(i64::from(index))
    }
}

/// Type-erased view of a `StateNode<V>` for any `V`.
trait ErasedNode: Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn ErasedNode) -> bool;
}

impl<V: StateValue> ErasedNode for StateNode<V> {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn ErasedNode) -> bool {
        other
            .as_any()
            .downcast_ref::<StateNode<V>>()
            .is_some_and(|other| other == self)
    }
}

fn same_node(a: &Arc<dyn ErasedNode>, b: &Arc<dyn ErasedNode>) -> bool {
    Arc::ptr_eq(a, b) || a.dyn_eq(b.as_ref())
}

/// Persistent map of child nodes.
///
/// Inserting returns a new map; unchanged children are shared with the
/// previous version.
#[derive(Clone, Default)]
pub struct Children(Arc<BTreeMap<StateKey, Arc<dyn ErasedNode>>>);

impl Children {
    /// Returns the child at `key` if it exists and holds a `StateNode<C>`.
    pub fn get<C: StateValue>(&self, key: &StateKey) -> Option<&StateNode<C>> {
        self.0
            .get(key)
            .and_then(|node| node.as_any().downcast_ref::<StateNode<C>>())
    }

    pub fn contains_key(&self, key: &StateKey) -> bool {
        self.0.contains_key(key)
    }

    /// Returns a copy of this map with `node` stored at `key`.
    pub fn insert<C: StateValue>(&self, key: StateKey, node: StateNode<C>) -> Children {
        let mut map = self.0.clone();
        Arc::make_mut(&mut map).insert(key, Arc::new(node));
        Children(map)
    }

    pub fn keys(&self) -> impl Iterator<Item = &StateKey> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl PartialEq for Children {
    fn eq(&self, other: &Self) -> bool {
        if Arc::ptr_eq(&self.0, &other.0) {
            return true;
        }
        self.0.len() == other.0.len()
            && self.0.iter().all(|(key, node)| {
                other
                    .0
                    .get(key)
                    .is_some_and(|other| same_node(node, other))
            })
    }
}

impl fmt::Debug for Children {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.0.iter()).finish()
    }
}

/// A value plus its keyed children.
///
/// The value and the children are independent: replacing one never touches the
/// other.
#[derive(Clone, Debug, PartialEq)]
pub struct StateNode<V> {
    value: V,
    children: Children,
}

impl<V> StateNode<V> {
    /// A node without children.
    pub fn new(value: V) -> StateNode<V> {
        StateNode {
            value,
            children: Children::default(),
        }
    }

    pub fn with_children(value: V, children: Children) -> StateNode<V> {
        StateNode { value, children }
    }

    pub fn value(&self) -> &V {
        &self.value
    }

    pub fn children(&self) -> &Children {
        &self.children
    }

    pub fn into_parts(self) -> (V, Children) {
        (self.value, self.children)
    }
}

impl<V: StateValue> StateNode<V> {
    /// Projects the node's value; writing keeps the children untouched.
    pub fn value_lens() -> Lens<StateNode<V>, V> {
        Lens::new(
            |node: &StateNode<V>| node.value.clone(),
            |node: &StateNode<V>, value: V| StateNode {
                value,
                children: node.children.clone(),
            },
        )
    }
}

/// The root of a state tree with its value type erased.
///
/// Equality is structural. Cloning only bumps a reference count.
#[derive(Clone)]
pub struct StateTree(Arc<dyn ErasedNode>);

impl StateTree {
    pub fn new<V: StateValue>(root: StateNode<V>) -> StateTree {
        StateTree(Arc::new(root))
    }

    /// Returns the root node if it holds a `V`.
    pub fn node<V: StateValue>(&self) -> Option<&StateNode<V>> {
        self.0.as_any().downcast_ref::<StateNode<V>>()
    }

    /// True when both trees are the very same allocation.
    pub fn ptr_eq(&self, other: &StateTree) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for StateTree {
    fn eq(&self, other: &Self) -> bool {
        same_node(&self.0, &other.0)
    }
}

impl fmt::Debug for StateTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}
