//! Bucket entries.
//!
//! A `Node<T>` pairs a cached hash with a slot that is either `Occupied` (a
//! live handle) or a `Tombstone` (unlinked, but kept alive because an
//! iterator still points at it) — the same three-state idea `chashmap`
//! expresses with its `Bucket::{Contains, Empty, Removed}` enum, collapsed to
//! two states here because an empty bucket slot in this crate is simply the
//! absence of a `Vec` entry rather than a sentinel value.
//!
//! Nodes are shared via `Arc` rather than linked by raw pointers: the
//! container's own embedded lock already serializes every bucket mutation
//! (see `hash.rs`), so the only thing `Node` needs from shared ownership is
//! stable identity for iterator pinning, which `Arc` gives for free. The
//! `Mutex` around the state is not the container's lock — it exists purely
//! so that an `Arc<Node<T>>` held by a pinning iterator and one held in the
//! bucket `Vec` can agree on whether the node has since been unlinked.

use parking_lot::Mutex;

use crate::header::Handle;

pub(crate) enum NodeState<T> {
    Occupied(Handle<T>),
    Tombstone,
}

pub(crate) struct Node<T> {
    hash: u64,
    state: Mutex<NodeState<T>>,
}

impl<T> Node<T> {
    pub(crate) fn occupied(handle: Handle<T>, hash: u64) -> Node<T> {
        Node {
            hash,
            state: Mutex::new(NodeState::Occupied(handle)),
        }
    }

    pub(crate) fn hash(&self) -> u64 {
        self.hash
    }

    /// Clone out the handle, if this node is still occupied.
    pub(crate) fn peek(&self) -> Option<Handle<T>> {
        match &*self.state.lock() {
            NodeState::Occupied(handle) => Some(handle.clone()),
            NodeState::Tombstone => None,
        }
    }

    /// Run `f` against the occupied payload without cloning the handle.
    pub(crate) fn with_payload<R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        match &*self.state.lock() {
            NodeState::Occupied(handle) => Some(f(handle)),
            NodeState::Tombstone => None,
        }
    }

    /// Turn this node into a tombstone, handing back the handle it held (the
    /// caller now owns that reference — this is the moment `Unlink` transfers
    /// the reference to its caller).
    ///
    /// A no-op, returning `None`, if the node was already a tombstone.
    pub(crate) fn unlink(&self) -> Option<Handle<T>> {
        let mut state = self.state.lock();
        match std::mem::replace(&mut *state, NodeState::Tombstone) {
            NodeState::Occupied(handle) => Some(handle),
            NodeState::Tombstone => None,
        }
    }

    pub(crate) fn is_tombstone(&self) -> bool {
        matches!(&*self.state.lock(), NodeState::Tombstone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flags::LockKind;

    #[test]
    fn fresh_node_is_occupied() {
        let node = Node::occupied(Handle::allocate(1, None, LockKind::None), 42);
        assert!(!node.is_tombstone());
        assert_eq!(node.hash(), 42);
        assert_eq!(*node.peek().unwrap(), 1);
    }

    #[test]
    fn unlink_turns_node_into_tombstone_once() {
        let node = Node::occupied(Handle::allocate(1, None, LockKind::None), 0);
        let handle = node.unlink().expect("first unlink yields the handle");
        assert_eq!(*handle, 1);
        assert!(node.is_tombstone());
        assert!(node.unlink().is_none());
        assert!(node.peek().is_none());
    }

    #[test]
    fn with_payload_sees_live_value_only() {
        let node = Node::occupied(Handle::allocate(7, None, LockKind::None), 0);
        assert_eq!(node.with_payload(|v| *v), Some(7));
        node.unlink();
        assert_eq!(node.with_payload(|v| *v), None);
    }
}
