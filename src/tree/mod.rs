//! The hierarchical configuration tree.
//!
//! A [`ConfigTree`] owns its nodes in an arena; a [`NodeId`] is a copyable
//! handle into it and a [`NodeRef`] couples a handle with a borrow of the
//! tree for read access. Parent links are plain ids, so back references
//! never form ownership cycles; a node is valid exactly as long as its tree.
//!
//! Mutation happens through `&mut ConfigTree` methods; the tree is not safe
//! for concurrent mutation and performs none of its own locking.

mod children;
mod query;
mod render;

pub use query::{Descendants, NodeRef, SortedDescendants};
pub use render::{CommentStyle, Dump, DumpLine};

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::driver::Driver;
use crate::error::{Error, Result};

use children::Children;

/// Default sibling order weight; lower values sort earlier.
pub const DEFAULT_ORDER_WEIGHT: i32 = 500;

static NEXT_TREE_ID: AtomicU64 = AtomicU64::new(1);

/// A copyable handle to a node within one [`ConfigTree`].
///
/// Ids are only meaningful against the tree that produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(u32);

impl NodeId {
    /// The root of every tree.
    pub const ROOT: NodeId = NodeId(0);

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Provenance record attached by [`ConfigTree::merge`], remembering which
/// source tree contributed a node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Instance {
    /// Process-unique id of the contributing tree
    pub id: u64,
    /// Tags carried by the contributing node
    pub tags: BTreeSet<String>,
    /// Comments carried by the contributing node
    pub comments: BTreeSet<String>,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) text: String,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Children,
    pub(crate) tags: BTreeSet<String>,
    pub(crate) comments: BTreeSet<String>,
    pub(crate) order_weight: i32,
    pub(crate) new_in_config: bool,
    pub(crate) negated: bool,
    pub(crate) instances: Vec<Instance>,
}

impl Node {
    fn new(text: String, parent: Option<NodeId>) -> Self {
        Node {
            text,
            parent,
            children: Children::default(),
            tags: BTreeSet::new(),
            comments: BTreeSet::new(),
            order_weight: DEFAULT_ORDER_WEIGHT,
            new_in_config: false,
            negated: false,
            instances: Vec::new(),
        }
    }
}

/// A hierarchical configuration: the root of the tree plus the arena that
/// owns every node.
#[derive(Debug, Clone)]
pub struct ConfigTree {
    driver: Arc<Driver>,
    slots: Vec<Option<Node>>,
    free: Vec<u32>,
    id: u64,
}

impl ConfigTree {
    /// Create an empty tree for a driver.
    pub fn new(driver: Arc<Driver>) -> Self {
        ConfigTree {
            driver,
            slots: vec![Some(Node::new(String::new(), None))],
            free: Vec::new(),
            id: NEXT_TREE_ID.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// The driver this tree was built with.
    pub fn driver(&self) -> &Arc<Driver> {
        &self.driver
    }

    /// Process-unique id of this tree, recorded into [`Instance`]s on merge.
    pub fn tree_id(&self) -> u64 {
        self.id
    }

    pub(crate) fn node(&self, id: NodeId) -> &Node {
        self.slots[id.index()].as_ref().expect("stale NodeId")
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.slots[id.index()].as_mut().expect("stale NodeId")
    }

    fn alloc(&mut self, node: Node) -> NodeId {
        if let Some(slot) = self.free.pop() {
            self.slots[slot as usize] = Some(node);
            NodeId(slot)
        } else {
            self.slots.push(Some(node));
            NodeId((self.slots.len() - 1) as u32)
        }
    }

    /// Root-to-node command texts, excluding the root itself.
    pub fn path(&self, id: NodeId) -> Vec<&str> {
        let mut path = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            if node_id == NodeId::ROOT {
                break;
            }
            let node = self.node(node_id);
            path.push(node.text.as_str());
            current = node.parent;
        }
        path.reverse();
        path
    }

    fn path_string(&self, parent: NodeId, text: &str) -> String {
        let mut path = self.path(parent);
        path.push(text);
        path.join(" / ")
    }

    /// Whether `parent` may hold several children with identical text.
    pub fn allows_duplicate_children(&self, parent: NodeId) -> bool {
        if parent == NodeId::ROOT {
            return false;
        }
        let path = self.path(parent);
        self.driver.parent_allows_duplicate_child(&path)
    }

    // ========================================================================
    // Child insertion
    // ========================================================================

    /// Add a child, erroring with [`Error::DuplicateChild`] when a sibling
    /// with the same text exists and the parent does not allow duplicates.
    pub fn add_child(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        self.insert_child(parent, text, DuplicatePolicy::Reject)
    }

    /// Add a child, returning the existing sibling when one with the same
    /// text is already present (and duplicates are not allowed).
    pub fn add_child_if_absent(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        self.insert_child(parent, text, DuplicatePolicy::ReturnExisting)
    }

    /// Add a child without consulting the text index; used when restoring
    /// dumps that legitimately carry duplicate siblings.
    pub(crate) fn add_child_forced(&mut self, parent: NodeId, text: &str) -> Result<NodeId> {
        self.insert_child(parent, text, DuplicatePolicy::Force)
    }

    fn insert_child(
        &mut self,
        parent: NodeId,
        text: &str,
        policy: DuplicatePolicy,
    ) -> Result<NodeId> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::EmptyChildText);
        }

        if policy != DuplicatePolicy::Force {
            if let Some(existing) = self.node(parent).children.get(text) {
                if self.allows_duplicate_children(parent) {
                    let id = self.alloc(Node::new(text.to_string(), Some(parent)));
                    self.node_mut(parent).children.append_unindexed(id);
                    return Ok(id);
                }
                return match policy {
                    DuplicatePolicy::ReturnExisting => Ok(existing),
                    _ => Err(Error::DuplicateChild {
                        path: self.path_string(parent, text),
                    }),
                };
            }
        }

        let id = self.alloc(Node::new(text.to_string(), Some(parent)));
        self.node_mut(parent).children.append(id, text);
        Ok(id)
    }

    /// Add a chain of children, each the child of the previous; returns the
    /// deepest node. Existing nodes along the chain are reused.
    pub fn add_children_deep<I, S>(&mut self, parent: NodeId, lines: I) -> Result<NodeId>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut base = parent;
        for line in lines {
            base = self.add_child_if_absent(base, line.as_ref())?;
        }
        Ok(base)
    }

    // ========================================================================
    // Deletion, text edits, moves
    // ========================================================================

    /// Delete a node and its whole subtree.
    pub fn delete(&mut self, id: NodeId) {
        if id == NodeId::ROOT {
            // Clearing the root means clearing the tree.
            let children: Vec<NodeId> = self.node(NodeId::ROOT).children.order.clone();
            for child in children {
                self.delete(child);
            }
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.node_mut(parent).children.remove(id);
            self.rebuild_child_index(parent);
        }
        self.free_subtree(id);
    }

    fn free_subtree(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.node(id).children.order.clone();
        for child in children {
            self.free_subtree(child);
        }
        self.slots[id.index()] = None;
        self.free.push(id.0);
    }

    /// Replace a node's text, keeping the parent's text index consistent.
    pub fn set_text(&mut self, id: NodeId, text: &str) {
        let text = text.trim().to_string();
        let parent = self.node(id).parent;
        self.node_mut(id).text = text;
        if let Some(parent) = parent {
            self.rebuild_child_index(parent);
        }
    }

    fn rebuild_child_index(&mut self, parent: NodeId) {
        let pairs: Vec<(NodeId, String)> = self
            .node(parent)
            .children
            .order
            .iter()
            .map(|&c| (c, self.node(c).text.clone()))
            .collect();
        self.node_mut(parent).children.rebuild_index(pairs);
    }

    /// Reparent a subtree under `new_parent`.
    ///
    /// Fails with [`Error::CycleDetected`] when `new_parent` lives inside
    /// the subtree being moved.
    pub fn move_node(&mut self, id: NodeId, new_parent: NodeId) -> Result<()> {
        let mut cursor = Some(new_parent);
        while let Some(ancestor) = cursor {
            if ancestor == id {
                return Err(Error::CycleDetected {
                    path: self.path(id).join(" / "),
                });
            }
            cursor = self.node(ancestor).parent;
        }

        if let Some(old_parent) = self.node(id).parent {
            self.node_mut(old_parent).children.remove(id);
            self.rebuild_child_index(old_parent);
        }
        let text = self.node(id).text.clone();
        self.node_mut(id).parent = Some(new_parent);
        self.node_mut(new_parent).children.append(id, &text);
        Ok(())
    }

    // ========================================================================
    // Node metadata
    // ========================================================================

    /// Add tags to a node; branches push the tags down to leaf descendants.
    pub fn add_tags<I, S>(&mut self, id: NodeId, tags: I)
    where
        I: IntoIterator<Item = S> + Clone,
        S: Into<String>,
    {
        if self.node(id).children.is_empty() {
            self.node_mut(id)
                .tags
                .extend(tags.into_iter().map(Into::into));
        } else {
            let children: Vec<NodeId> = self.node(id).children.order.clone();
            for child in children {
                self.add_tags(child, tags.clone());
            }
        }
    }

    /// Remove tags from a node; branches strip them from leaf descendants.
    pub fn remove_tags<I, S>(&mut self, id: NodeId, tags: I)
    where
        I: IntoIterator<Item = S> + Clone,
        S: AsRef<str>,
    {
        if self.node(id).children.is_empty() {
            for tag in tags {
                self.node_mut(id).tags.remove(tag.as_ref());
            }
        } else {
            let children: Vec<NodeId> = self.node(id).children.order.clone();
            for child in children {
                self.remove_tags(child, tags.clone());
            }
        }
    }

    /// Attach a free-form comment to a node.
    pub fn add_comment(&mut self, id: NodeId, comment: impl Into<String>) {
        self.node_mut(id).comments.insert(comment.into());
    }

    /// Set a node's sibling order weight.
    pub fn set_order_weight(&mut self, id: NodeId, weight: i32) {
        self.node_mut(id).order_weight = weight;
    }

    pub(crate) fn set_negated(&mut self, id: NodeId, negated: bool) {
        self.node_mut(id).negated = negated;
    }

    /// Flag a node and its whole subtree as new in the delta.
    pub(crate) fn mark_new_in_config(&mut self, id: NodeId) {
        self.node_mut(id).new_in_config = true;
        let children: Vec<NodeId> = self.node(id).children.order.clone();
        for child in children {
            self.mark_new_in_config(child);
        }
    }

    // ========================================================================
    // Copies and merging
    // ========================================================================

    /// Copy a node (text, comments, weight, leaf tags, negation) from
    /// another tree, without its children.
    ///
    /// With `merged` set, an [`Instance`] recording the source tree is
    /// appended.
    pub fn add_shallow_copy_of(
        &mut self,
        parent: NodeId,
        source: NodeRef<'_>,
        merged: bool,
    ) -> Result<NodeId> {
        let id = self.add_child(parent, source.text())?;
        self.copy_metadata(id, source, merged);
        Ok(id)
    }

    /// Copy a node and its whole subtree from another tree.
    pub fn add_deep_copy_of(
        &mut self,
        parent: NodeId,
        source: NodeRef<'_>,
        merged: bool,
    ) -> Result<NodeId> {
        let id = self.add_shallow_copy_of(parent, source, merged)?;
        for child in source.children() {
            self.add_deep_copy_of(id, child, merged)?;
        }
        Ok(id)
    }

    fn copy_metadata(&mut self, id: NodeId, source: NodeRef<'_>, merged: bool) {
        if merged {
            let instance = Instance {
                id: source.tree().tree_id(),
                tags: source.tags(),
                comments: source.own_comments().clone(),
            };
            self.node_mut(id).instances.push(instance);
        }
        let comments: Vec<String> = source.own_comments().iter().cloned().collect();
        self.node_mut(id).comments.extend(comments);
        self.node_mut(id).order_weight = source.order_weight();
        self.node_mut(id).negated = source.is_negated();
        if source.is_leaf() {
            let tags = source.tags();
            self.add_tags(id, tags);
        }
    }

    /// Merge another tree into this one by deep copy, recording instances.
    ///
    /// Raises [`Error::DuplicateChild`] eagerly when a section collides
    /// under a parent that does not allow duplicates.
    pub fn merge(&mut self, other: &ConfigTree) -> Result<()> {
        if self.driver.platform() != other.driver.platform() {
            return Err(Error::DriverMismatch {
                left: self.driver.platform(),
                right: other.driver.platform(),
            });
        }
        for child in other.root().children() {
            self.add_deep_copy_of(NodeId::ROOT, child, true)?;
        }
        Ok(())
    }

    /// A new tree holding deep copies of this tree's children.
    pub fn deep_copy(&self) -> Self {
        let mut copy = ConfigTree::new(Arc::clone(&self.driver));
        for child in self.root().children() {
            // Copying into an empty tree cannot collide.
            let _ = copy.add_deep_copy_of(NodeId::ROOT, child, false);
        }
        copy
    }

    /// Total node count, excluding the root.
    pub fn len(&self) -> usize {
        self.slots.iter().flatten().count() - 1
    }

    /// True when the root has no children.
    pub fn is_empty(&self) -> bool {
        self.node(NodeId::ROOT).children.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DuplicatePolicy {
    Reject,
    ReturnExisting,
    Force,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver;
    use crate::platform::Platform;

    fn tree() -> ConfigTree {
        ConfigTree::new(driver::for_platform(Platform::Generic))
    }

    #[test]
    fn test_add_child_and_lookup() {
        let mut config = tree();
        let interface = config.add_child(NodeId::ROOT, "interface Vlan2").unwrap();
        let shutdown = config.add_child(interface, "shutdown").unwrap();

        assert_eq!(config.root().child_by_text("interface Vlan2").unwrap().id(), interface);
        assert_eq!(config.path(shutdown), vec!["interface Vlan2", "shutdown"]);
        assert_eq!(config.node_ref(shutdown).depth(), 2);
    }

    #[test]
    fn test_duplicate_child_rejected() {
        let mut config = tree();
        config.add_child(NodeId::ROOT, "hostname r1").unwrap();
        let err = config.add_child(NodeId::ROOT, "hostname r1").unwrap_err();
        assert!(matches!(err, Error::DuplicateChild { .. }));

        let existing = config
            .add_child_if_absent(NodeId::ROOT, "hostname r1")
            .unwrap();
        assert_eq!(
            config.root().child_by_text("hostname r1").unwrap().id(),
            existing
        );
    }

    #[test]
    fn test_empty_text_rejected() {
        let mut config = tree();
        assert!(matches!(
            config.add_child(NodeId::ROOT, "   "),
            Err(Error::EmptyChildText)
        ));
    }

    #[test]
    fn test_delete_updates_index() {
        let mut config = tree();
        let ntp = config.add_child(NodeId::ROOT, "ntp server 10.0.0.1").unwrap();
        config.add_child(NodeId::ROOT, "ntp server 10.0.0.2").unwrap();
        config.delete(ntp);

        assert!(config.root().child_by_text("ntp server 10.0.0.1").is_none());
        assert!(config.root().child_by_text("ntp server 10.0.0.2").is_some());
        assert_eq!(config.len(), 1);
    }

    #[test]
    fn test_set_text_rebuilds_index() {
        let mut config = tree();
        let vlan = config.add_child(NodeId::ROOT, "vlan 2").unwrap();
        config.set_text(vlan, "vlan 3");

        assert!(config.root().child_by_text("vlan 2").is_none());
        assert_eq!(config.root().child_by_text("vlan 3").unwrap().id(), vlan);
    }

    #[test]
    fn test_move_node_detects_cycles() {
        let mut config = tree();
        let a = config.add_child(NodeId::ROOT, "a").unwrap();
        let b = config.add_child(a, "b").unwrap();

        assert!(matches!(
            config.move_node(a, b),
            Err(Error::CycleDetected { .. })
        ));

        let c = config.add_child(NodeId::ROOT, "c").unwrap();
        config.move_node(b, c).unwrap();
        assert_eq!(config.path(b), vec!["c", "b"]);
    }

    #[test]
    fn test_branch_tags_propagate_to_leaves() {
        let mut config = tree();
        let interface = config.add_child(NodeId::ROOT, "interface Vlan2").unwrap();
        let shutdown = config.add_child(interface, "shutdown").unwrap();
        config.add_tags(interface, ["safe"]);

        assert!(config.node_ref(shutdown).own_tags().contains("safe"));
        assert!(config.node_ref(interface).own_tags().is_empty());
        // Branch tag access is the recursive union over leaves.
        assert!(config.node_ref(interface).tags().contains("safe"));
    }

    #[test]
    fn test_deep_copy_detaches_from_source() {
        let mut config = tree();
        let vlan = config.add_child(NodeId::ROOT, "vlan 2").unwrap();
        config.add_child(vlan, "name test").unwrap();

        let mut copy = config.deep_copy();
        assert_eq!(copy.lines(), config.lines());
        copy.delete(NodeId::ROOT);
        assert!(copy.is_empty());
        assert!(!config.is_empty());
    }

    #[test]
    fn test_merge_records_instances_and_rejects_collisions() {
        let mut left = tree();
        left.add_child(NodeId::ROOT, "hostname r1").unwrap();

        let mut right = tree();
        let vlan = right.add_child(NodeId::ROOT, "vlan 2").unwrap();
        right.add_child(vlan, "name test").unwrap();

        left.merge(&right).unwrap();
        let merged = left.root().child_by_text("vlan 2").unwrap();
        assert_eq!(merged.instances().len(), 1);
        assert_eq!(merged.instances()[0].id, right.tree_id());

        // A second merge collides on "vlan 2".
        assert!(matches!(
            left.merge(&right),
            Err(Error::DuplicateChild { .. })
        ));
    }
}
