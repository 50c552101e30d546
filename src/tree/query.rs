//! Read access: node references, traversal, and match-rule queries.

use std::collections::BTreeSet;

use crate::error::Result;
use crate::matching::{Lineage, MatchMode, MatchRule};

use super::{ConfigTree, Instance, NodeId};

impl ConfigTree {
    /// A read handle on the root.
    pub fn root(&self) -> NodeRef<'_> {
        NodeRef {
            tree: self,
            id: NodeId::ROOT,
        }
    }

    /// A read handle on any node of this tree.
    pub fn node_ref(&self, id: NodeId) -> NodeRef<'_> {
        NodeRef { tree: self, id }
    }

    /// Depth-first pre-order over all nodes, in insertion order.
    pub fn all_children(&self) -> Descendants<'_> {
        self.root().all_children()
    }

    /// Depth-first pre-order over all nodes, siblings sorted by
    /// `(order_weight, insertion index)`.
    pub fn all_children_sorted(&self) -> SortedDescendants<'_> {
        self.root().all_children_sorted()
    }

    /// First root child matching the rule, if any.
    pub fn get_child(&self, rule: &MatchRule) -> Result<Option<NodeRef<'_>>> {
        self.root().get_child(rule)
    }

    /// All root children matching the rule.
    pub fn get_children(&self, rule: &MatchRule) -> Result<Vec<NodeRef<'_>>> {
        self.root().get_children(rule)
    }

    /// First node reached by an anchored walk of the rules from the root.
    pub fn get_child_deep(&self, rules: &[MatchRule]) -> Result<Option<NodeRef<'_>>> {
        Ok(self.get_children_deep(rules)?.into_iter().next())
    }

    /// All nodes reached by an anchored walk of the rules from the root:
    /// the first rule selects among root children, the second among their
    /// children, and so on.
    pub fn get_children_deep(&self, rules: &[MatchRule]) -> Result<Vec<NodeRef<'_>>> {
        self.root().get_children_deep(rules)
    }
}

/// A node handle bundled with a borrow of its tree.
#[derive(Debug, Clone, Copy)]
pub struct NodeRef<'a> {
    pub(crate) tree: &'a ConfigTree,
    pub(crate) id: NodeId,
}

impl<'a> NodeRef<'a> {
    /// The underlying id.
    pub fn id(self) -> NodeId {
        self.id
    }

    /// The tree this node belongs to.
    pub fn tree(self) -> &'a ConfigTree {
        self.tree
    }

    /// True for the tree root.
    pub fn is_root(self) -> bool {
        self.id == NodeId::ROOT
    }

    /// Canonical command text; empty for the root.
    pub fn text(self) -> &'a str {
        &self.tree.node(self.id).text
    }

    /// The containing node, or `None` for the root.
    pub fn parent(self) -> Option<NodeRef<'a>> {
        self.tree
            .node(self.id)
            .parent
            .map(|id| self.tree.node_ref(id))
    }

    /// Ordered children.
    pub fn children(self) -> impl DoubleEndedIterator<Item = NodeRef<'a>> + ExactSizeIterator + Clone {
        let tree = self.tree;
        tree.node(self.id)
            .children
            .order
            .iter()
            .map(move |&id| tree.node_ref(id))
    }

    /// Children sorted by `(order_weight, insertion index)`.
    pub fn children_sorted(self) -> Vec<NodeRef<'a>> {
        let mut children: Vec<NodeRef<'a>> = self.children().collect();
        children.sort_by_key(|c| c.order_weight());
        children
    }

    /// First child with exactly this text.
    pub fn child_by_text(self, text: &str) -> Option<NodeRef<'a>> {
        self.tree
            .node(self.id)
            .children
            .get(text)
            .map(|id| self.tree.node_ref(id))
    }

    /// True when any child carries this text.
    pub fn has_child_text(self, text: &str) -> bool {
        self.tree.node(self.id).children.contains_text(text)
    }

    /// Number of direct children.
    pub fn child_count(self) -> usize {
        self.tree.node(self.id).children.len()
    }

    /// True when the node has no children and is not the root.
    pub fn is_leaf(self) -> bool {
        !self.is_branch()
    }

    /// True when the node has children or is the root.
    pub fn is_branch(self) -> bool {
        self.is_root() || !self.tree.node(self.id).children.is_empty()
    }

    /// Distance from the root; the root is at depth 0.
    pub fn depth(self) -> usize {
        let mut depth = 0;
        let mut current = self.tree.node(self.id).parent;
        while let Some(id) = current {
            depth += 1;
            current = self.tree.node(id).parent;
        }
        depth
    }

    /// Root-to-self command texts, excluding the root.
    pub fn path(self) -> Vec<&'a str> {
        self.tree.path(self.id)
    }

    /// Root-to-self nodes, excluding the root.
    pub fn lineage(self) -> Vec<NodeRef<'a>> {
        let mut nodes = Vec::new();
        let mut current = Some(self.id);
        while let Some(id) = current {
            if id == NodeId::ROOT {
                break;
            }
            nodes.push(self.tree.node_ref(id));
            current = self.tree.node(id).parent;
        }
        nodes.reverse();
        nodes
    }

    /// Tags: a leaf's own set, or the recursive union over a branch's
    /// leaves.
    pub fn tags(self) -> BTreeSet<String> {
        if self.is_leaf() {
            return self.tree.node(self.id).tags.clone();
        }
        let mut tags = BTreeSet::new();
        for child in self.children() {
            tags.extend(child.tags());
        }
        tags
    }

    /// The tag set stored on this node itself.
    pub fn own_tags(self) -> &'a BTreeSet<String> {
        &self.tree.node(self.id).tags
    }

    /// Comments stored on this node.
    pub fn own_comments(self) -> &'a BTreeSet<String> {
        &self.tree.node(self.id).comments
    }

    /// Sibling order weight.
    pub fn order_weight(self) -> i32 {
        self.tree.node(self.id).order_weight
    }

    /// True when the node was created as remediation output.
    pub fn is_new_in_config(self) -> bool {
        self.tree.node(self.id).new_in_config
    }

    /// True when a set-syntax statement is a `delete`.
    pub fn is_negated(self) -> bool {
        self.tree.node(self.id).negated
    }

    /// Merge provenance records.
    pub fn instances(self) -> &'a [Instance] {
        &self.tree.node(self.id).instances
    }

    /// Depth-first pre-order over the subtree, excluding this node.
    pub fn all_children(self) -> Descendants<'a> {
        let mut stack: Vec<NodeId> = self.tree.node(self.id).children.order.clone();
        stack.reverse();
        Descendants {
            tree: self.tree,
            stack,
        }
    }

    /// Depth-first pre-order over the subtree with sorted siblings,
    /// excluding this node.
    pub fn all_children_sorted(self) -> SortedDescendants<'a> {
        let mut first: Vec<NodeId> = self.children_sorted().iter().map(|c| c.id()).collect();
        first.reverse();
        SortedDescendants {
            tree: self.tree,
            stack: vec![first],
        }
    }

    /// First child matching the rule.
    pub fn get_child(self, rule: &MatchRule) -> Result<Option<NodeRef<'a>>> {
        let matcher = rule.compile()?;
        Ok(self.children().find(|c| matcher.matches(c.text())))
    }

    /// All children matching the rule.
    pub fn get_children(self, rule: &MatchRule) -> Result<Vec<NodeRef<'a>>> {
        let matcher = rule.compile()?;
        Ok(self
            .children()
            .filter(|c| matcher.matches(c.text()))
            .collect())
    }

    /// All descendants reached by an anchored walk of the rules.
    pub fn get_children_deep(self, rules: &[MatchRule]) -> Result<Vec<NodeRef<'a>>> {
        let Some((first, remaining)) = rules.split_first() else {
            return Ok(Vec::new());
        };
        let mut found = Vec::new();
        for child in self.get_children(first)? {
            if remaining.is_empty() {
                found.push(child);
            } else {
                found.extend(child.get_children_deep(remaining)?);
            }
        }
        Ok(found)
    }

    /// Test a compiled lineage against this node's root-to-self path.
    pub fn is_lineage_match(self, lineage: &Lineage, mode: MatchMode) -> bool {
        lineage.matches_path(&self.path(), mode)
    }

    /// Test declarative match rules against this node's path, compiling
    /// them on the fly.
    pub fn matches_rules(self, rules: &[MatchRule], mode: MatchMode) -> Result<bool> {
        let lineage = Lineage::compile(rules, "query")?;
        Ok(self.is_lineage_match(&lineage, mode))
    }

    /// Structural equality with a node of another tree: text, leaf tags,
    /// and children, ignoring comments, weights, and provenance.
    pub fn subtree_eq(self, other: NodeRef<'_>) -> bool {
        if self.text() != other.text() || self.tags() != other.tags() {
            return false;
        }
        if self.child_count() != other.child_count() {
            return false;
        }
        self.children()
            .zip(other.children())
            .all(|(a, b)| a.subtree_eq(b))
    }
}

/// Pre-order iterator over a subtree in insertion order.
pub struct Descendants<'a> {
    tree: &'a ConfigTree,
    stack: Vec<NodeId>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.stack.pop()?;
        let node = self.tree.node(id);
        self.stack.extend(node.children.order.iter().rev().copied());
        Some(self.tree.node_ref(id))
    }
}

/// Pre-order iterator over a subtree with siblings sorted by
/// `(order_weight, insertion index)`.
pub struct SortedDescendants<'a> {
    tree: &'a ConfigTree,
    stack: Vec<Vec<NodeId>>,
}

impl<'a> Iterator for SortedDescendants<'a> {
    type Item = NodeRef<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let level = self.stack.last_mut()?;
            match level.pop() {
                Some(id) => {
                    let mut children: Vec<NodeId> = self
                        .tree
                        .node_ref(id)
                        .children_sorted()
                        .iter()
                        .map(|c| c.id())
                        .collect();
                    children.reverse();
                    self.stack.push(children);
                    return Some(self.tree.node_ref(id));
                }
                None => {
                    self.stack.pop();
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver;
    use crate::platform::Platform;

    fn sample() -> ConfigTree {
        let mut config = ConfigTree::new(driver::for_platform(Platform::Generic));
        let interface = config.add_child(NodeId::ROOT, "interface Vlan2").unwrap();
        config.add_child(interface, "description test").unwrap();
        config.add_child(interface, "shutdown").unwrap();
        config.add_child(NodeId::ROOT, "hostname r1").unwrap();
        config
    }

    #[test]
    fn test_all_children_preorder() {
        let config = sample();
        let texts: Vec<&str> = config.all_children().map(|n| n.text()).collect();
        assert_eq!(
            texts,
            vec![
                "interface Vlan2",
                "description test",
                "shutdown",
                "hostname r1"
            ]
        );
    }

    #[test]
    fn test_sorted_traversal_respects_weights() {
        let mut config = sample();
        let interface = config.root().child_by_text("interface Vlan2").unwrap().id();
        let shutdown = config.node_ref(interface).child_by_text("shutdown").unwrap().id();
        config.set_order_weight(shutdown, 200);

        let texts: Vec<String> = config
            .all_children_sorted()
            .map(|n| n.text().to_string())
            .collect();
        assert_eq!(
            texts,
            vec![
                "interface Vlan2",
                "shutdown",
                "description test",
                "hostname r1"
            ]
        );
    }

    #[test]
    fn test_get_children_deep_walks_anchored() {
        let config = sample();
        let found = config
            .get_children_deep(&[
                MatchRule::startswith("interface"),
                MatchRule::startswith("description"),
            ])
            .unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].text(), "description test");

        // Anchored walk does not float across levels.
        let missing = config
            .get_children_deep(&[MatchRule::startswith("description")])
            .unwrap();
        assert!(missing.is_empty());
    }

    #[test]
    fn test_subtree_eq() {
        let a = sample();
        let b = sample();
        assert!(a.root().child_by_text("interface Vlan2").unwrap().subtree_eq(
            b.root().child_by_text("interface Vlan2").unwrap()
        ));
        assert!(!a
            .root()
            .child_by_text("interface Vlan2")
            .unwrap()
            .subtree_eq(b.root().child_by_text("hostname r1").unwrap()));
    }
}
