//! Ordered child storage with a text index.
//!
//! Siblings keep insertion order in `order`; `by_text` maps a text to the
//! first sibling carrying it, giving O(1) lookup during comparison. The
//! index is maintained by [`ConfigTree`](super::ConfigTree), which owns the
//! node texts.

use std::collections::HashMap;

use super::NodeId;

/// The ordered children of one node plus a first-occurrence text index.
#[derive(Debug, Clone, Default)]
pub(crate) struct Children {
    /// Insertion-ordered child ids
    pub(crate) order: Vec<NodeId>,
    /// Text of a child to the first child carrying it
    pub(crate) by_text: HashMap<String, NodeId>,
}

impl Children {
    /// Append a child, indexing its text unless an earlier sibling already
    /// claimed it.
    pub(crate) fn append(&mut self, id: NodeId, text: &str) {
        self.order.push(id);
        self.by_text.entry(text.to_string()).or_insert(id);
    }

    /// Append a duplicate child without touching the index; the first
    /// sibling keeps the text mapping.
    pub(crate) fn append_unindexed(&mut self, id: NodeId) {
        self.order.push(id);
    }

    /// Remove one child by identity. Returns true when it was present.
    pub(crate) fn remove(&mut self, id: NodeId) -> bool {
        let before = self.order.len();
        self.order.retain(|&c| c != id);
        before != self.order.len()
    }

    /// Rebuild the text index from `(id, text)` pairs in sibling order.
    pub(crate) fn rebuild_index(&mut self, texts: impl IntoIterator<Item = (NodeId, String)>) {
        self.by_text.clear();
        for (id, text) in texts {
            self.by_text.entry(text).or_insert(id);
        }
    }

    pub(crate) fn get(&self, text: &str) -> Option<NodeId> {
        self.by_text.get(text).copied()
    }

    pub(crate) fn contains_text(&self, text: &str) -> bool {
        self.by_text.contains_key(text)
    }

    pub(crate) fn len(&self) -> usize {
        self.order.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
