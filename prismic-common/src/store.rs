//! Node store
//!
//! The only mutable resource shared between concurrent normalizations. Every id
//! moves through `Unvisited -> Pending -> {Ready | Failed}` at most once per
//! run; the check-then-claim in [`NodeStore::reserve`] happens under a single
//! write lock so two tasks can never both claim the same id.

use indexmap::IndexMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tokio::sync::mpsc;

use crate::node::{Node, NodeId};
use crate::{Error, Result};

/// Observable state of one id in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeState {
    /// Claimed by a normalization (or a link fetch) that has not finished
    Pending,
    /// The fetch or normalization for this id failed; never retried in this run
    Failed,
    /// A real node exists
    Ready,
}

enum Slot {
    Pending,
    Failed,
    Ready(Arc<Node>),
}

impl Slot {
    fn state(&self) -> NodeState {
        match self {
            Slot::Pending => NodeState::Pending,
            Slot::Failed => NodeState::Failed,
            Slot::Ready(_) => NodeState::Ready,
        }
    }
}

/// Addressable collection of emitted nodes keyed by deterministic id
pub struct NodeStore {
    slots: RwLock<IndexMap<NodeId, Slot>>,
    events: Option<mpsc::UnboundedSender<Arc<Node>>>,
}

impl Default for NodeStore {
    fn default() -> Self {
        Self::new()
    }
}

impl NodeStore {
    pub fn new() -> Self {
        Self {
            slots: RwLock::new(IndexMap::new()),
            events: None,
        }
    }

    /// Create a store that hands every created node to `events` as it lands
    pub fn with_events(events: mpsc::UnboundedSender<Arc<Node>>) -> Self {
        Self {
            slots: RwLock::new(IndexMap::new()),
            events: Some(events),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, IndexMap<NodeId, Slot>> {
        self.slots.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, IndexMap<NodeId, Slot>> {
        self.slots.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Claim `id` for creation
    ///
    /// Returns `true` only for the first caller; any existing placeholder,
    /// failure marker or node makes this return `false`.
    pub fn reserve(&self, id: NodeId) -> bool {
        let mut slots = self.write();
        if slots.contains_key(&id) {
            return false;
        }
        slots.insert(id, Slot::Pending);
        true
    }

    /// Store a real node, replacing a placeholder if one exists
    ///
    /// Creating a second real node under the same id is an identity collision
    /// and is rejected.
    pub fn insert(&self, node: Node) -> Result<Arc<Node>> {
        let node = Arc::new(node);
        {
            let mut slots = self.write();
            if let Some(Slot::Ready(existing)) = slots.get(&node.id) {
                return Err(Error::NodeConflict(format!(
                    "node {} already exists with type {}",
                    node.id,
                    existing.node_type()
                )));
            }
            slots.insert(node.id, Slot::Ready(node.clone()));
        }

        self.announce(&node);
        Ok(node)
    }

    /// Store a node unless one already exists; returns the stored node
    pub fn insert_if_absent(&self, node: Node) -> Arc<Node> {
        let node = {
            let mut slots = self.write();
            if let Some(Slot::Ready(existing)) = slots.get(&node.id) {
                return existing.clone();
            }
            let node = Arc::new(node);
            slots.insert(node.id, Slot::Ready(node.clone()));
            node
        };
        self.announce(&node);
        node
    }

    fn announce(&self, node: &Arc<Node>) {
        tracing::debug!(
            id = %node.id,
            node_type = %node.node_type(),
            "creating node"
        );

        if let Some(events) = &self.events {
            // A dropped receiver only means nobody is listening any more
            let _ = events.send(node.clone());
        }
    }

    /// Mark a claimed id as failed (terminal for this run)
    pub fn mark_failed(&self, id: NodeId) {
        let mut slots = self.write();
        match slots.get(&id) {
            Some(Slot::Ready(_)) => {}
            _ => {
                slots.insert(id, Slot::Failed);
            }
        }
    }

    /// Real node for `id`, if one exists
    pub fn get(&self, id: &NodeId) -> Option<Arc<Node>> {
        match self.read().get(id) {
            Some(Slot::Ready(node)) => Some(node.clone()),
            _ => None,
        }
    }

    /// Nodes for `ids`, in order; missing or unfinished ids yield `None`
    pub fn get_many(&self, ids: &[NodeId]) -> Vec<Option<Arc<Node>>> {
        let slots = self.read();
        ids.iter()
            .map(|id| match slots.get(id) {
                Some(Slot::Ready(node)) => Some(node.clone()),
                _ => None,
            })
            .collect()
    }

    /// Whether any entry (placeholder, failure or node) exists for `id`
    pub fn contains(&self, id: &NodeId) -> bool {
        self.read().contains_key(id)
    }

    pub fn state(&self, id: &NodeId) -> Option<NodeState> {
        self.read().get(id).map(Slot::state)
    }

    /// All real nodes in creation order
    pub fn nodes(&self) -> Vec<Arc<Node>> {
        self.read()
            .values()
            .filter_map(|slot| match slot {
                Slot::Ready(node) => Some(node.clone()),
                _ => None,
            })
            .collect()
    }

    /// Number of real nodes
    pub fn len(&self) -> usize {
        self.read()
            .values()
            .filter(|slot| matches!(slot, Slot::Ready(_)))
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::create_node_id;
    use serde_json::Map;

    fn node(key: &str) -> Node {
        Node::new(create_node_id(key), Map::new(), "PrismicPage", "digest")
    }

    #[test]
    fn test_reserve_is_at_most_once() {
        let store = NodeStore::new();
        let id = create_node_id("page a");
        assert!(store.reserve(id));
        assert!(!store.reserve(id));
        assert_eq!(store.state(&id), Some(NodeState::Pending));
        assert!(store.get(&id).is_none());
        assert!(store.contains(&id));
    }

    #[test]
    fn test_insert_replaces_placeholder() {
        let store = NodeStore::new();
        let n = node("page a");
        assert!(store.reserve(n.id));
        store.insert(n.clone()).unwrap();
        assert_eq!(store.state(&n.id), Some(NodeState::Ready));
        assert_eq!(store.get(&n.id).unwrap().id, n.id);
        assert!(!store.reserve(n.id));
    }

    #[test]
    fn test_second_real_node_is_rejected() {
        let store = NodeStore::new();
        store.insert(node("page a")).unwrap();
        let err = store.insert(node("page a")).unwrap_err();
        assert!(matches!(err, Error::NodeConflict(_)));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_insert_if_absent_keeps_first() {
        let store = NodeStore::new();
        let first = store.insert_if_absent(node("File a"));
        let second = store.insert_if_absent(node("File a"));
        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_mark_failed_is_terminal() {
        let store = NodeStore::new();
        let id = create_node_id("page gone");
        assert!(store.reserve(id));
        store.mark_failed(id);
        assert_eq!(store.state(&id), Some(NodeState::Failed));
        assert!(!store.reserve(id));
        assert!(store.get(&id).is_none());
    }

    #[test]
    fn test_get_many_preserves_order() {
        let store = NodeStore::new();
        let a = store.insert(node("a")).unwrap();
        let b = store.insert(node("b")).unwrap();
        let missing = create_node_id("missing");
        let got = store.get_many(&[b.id, missing, a.id]);
        assert_eq!(got[0].as_ref().unwrap().id, b.id);
        assert!(got[1].is_none());
        assert_eq!(got[2].as_ref().unwrap().id, a.id);
    }

    #[tokio::test]
    async fn test_events_receive_created_nodes() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let store = NodeStore::with_events(tx);
        let id = store.insert(node("page a")).unwrap().id;
        let received = rx.recv().await.unwrap();
        assert_eq!(received.id, id);
    }

    #[test]
    fn test_concurrent_reserve_single_winner() {
        let store = Arc::new(NodeStore::new());
        let id = create_node_id("contended");
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let store = store.clone();
                std::thread::spawn(move || store.reserve(id))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();
        assert_eq!(winners, 1);
    }
}
