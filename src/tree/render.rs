//! Rendering trees back to device-ready text, and dump snapshots.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::driver::ConfigSyntax;
use crate::error::Result;

use super::{ConfigTree, NodeId, NodeRef};

/// Which comments a rendered line carries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommentStyle {
    /// Bare command text
    #[default]
    WithoutComments,
    /// Append the node's own comments as `!comment, comment`
    WithComments,
    /// Append merge-instance counts (and instance comments), optionally
    /// restricted to instances carrying a tag
    Merged {
        /// Only count instances carrying this tag
        tag: Option<String>,
    },
}

impl ConfigTree {
    /// Render to lines without sectional-exit tokens.
    pub fn lines(&self) -> Vec<String> {
        self.render_lines(false)
    }

    /// Render to lines, closing sections with their exit tokens (the
    /// matched rule's text, or `exit` for unmatched branches).
    pub fn lines_with_exits(&self) -> Vec<String> {
        self.render_lines(true)
    }

    /// Render to a single string without sectional-exit tokens.
    pub fn text(&self) -> String {
        self.lines().join("\n")
    }

    fn render_lines(&self, sectional_exiting: bool) -> Vec<String> {
        let mut out = Vec::new();
        match self.driver().syntax() {
            ConfigSyntax::SetStatements => {
                for node in self.all_children_sorted() {
                    if node.is_leaf() {
                        out.push(node.set_style_text());
                    }
                }
            }
            ConfigSyntax::Indented => {
                for child in self.root().children_sorted() {
                    self.render_subtree(child, sectional_exiting, &mut out);
                }
            }
        }
        out
    }

    fn render_subtree(&self, node: NodeRef<'_>, sectional_exiting: bool, out: &mut Vec<String>) {
        out.push(node.cisco_style_text(&CommentStyle::WithoutComments));
        for child in node.children_sorted() {
            self.render_subtree(child, sectional_exiting, out);
        }
        if sectional_exiting {
            if let Some(exit_text) = self.sectional_exit_text(node) {
                let indent = self.driver().indentation() * node.depth();
                out.push(format!("{}{}", " ".repeat(indent), exit_text));
            }
        }
    }

    /// The token closing this section when rendering with exits: a matched
    /// rule's text (empty suppresses), else `exit` for branches.
    pub(crate) fn sectional_exit_text(&self, node: NodeRef<'_>) -> Option<String> {
        if let Some(exit_text) = self.driver().sectional_exit_rule(&node.path()) {
            if exit_text.is_empty() {
                return None;
            }
            return Some(exit_text.to_string());
        }
        if node.is_leaf() {
            return None;
        }
        Some("exit".to_string())
    }
}

impl NodeRef<'_> {
    /// Indentation prefix: `indentation × (depth - 1)` spaces.
    pub fn indentation(self) -> String {
        let width = self.tree().driver().indentation();
        " ".repeat(width * self.depth().saturating_sub(1))
    }

    /// A Cisco style formatted line: indentation + text, optionally
    /// followed by ` !comment` annotations.
    pub fn cisco_style_text(self, style: &CommentStyle) -> String {
        let mut comments: Vec<String> = Vec::new();
        match style {
            CommentStyle::WithoutComments => {}
            CommentStyle::WithComments => {
                comments.extend(self.own_comments().iter().cloned());
            }
            CommentStyle::Merged { tag } => {
                let mut instance_count = 0;
                let mut instance_comments = std::collections::BTreeSet::new();
                for instance in self.instances() {
                    if tag.as_ref().map_or(true, |t| instance.tags.contains(t)) {
                        instance_count += 1;
                        instance_comments.extend(instance.comments.iter().cloned());
                    }
                }
                let word = if instance_count == 1 {
                    "instance"
                } else {
                    "instances"
                };
                comments.push(format!("{instance_count} {word}"));
                comments.extend(instance_comments);
            }
        }

        let comments_str = if comments.is_empty() {
            String::new()
        } else {
            comments.sort();
            format!(" !{}", comments.join(", "))
        };
        format!("{}{}{}", self.indentation(), self.text(), comments_str)
    }

    /// A full-path `set`/`delete` statement for a set-syntax leaf.
    pub fn set_style_text(self) -> String {
        let verb = if self.is_negated() {
            self.tree().driver().negation_prefix().trim_end()
        } else {
            let declaration = self.tree().driver().declaration_prefix().trim_end();
            if declaration.is_empty() {
                "set"
            } else {
                declaration
            }
        };
        format!("{} {}", verb, self.path().join(" "))
    }
}

impl fmt::Display for ConfigTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

// ============================================================================
// Dump snapshots
// ============================================================================

/// One node of a serialized tree snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DumpLine {
    /// Distance from the root (first level is 1)
    pub depth: usize,
    /// Canonical command text
    pub text: String,
    /// Tags stored on the node
    #[serde(default)]
    pub tags: Vec<String>,
    /// Comments stored on the node
    #[serde(default)]
    pub comments: Vec<String>,
    /// Remediation-output marker
    #[serde(default)]
    pub new_in_config: bool,
    /// Set-syntax delete marker
    #[serde(default)]
    pub negated: bool,
}

/// A serializable snapshot of a tree, in sorted pre-order.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Dump {
    /// Snapshot lines, depth-first
    pub lines: Vec<DumpLine>,
}

impl ConfigTree {
    /// Snapshot the tree for serialization.
    pub fn dump(&self) -> Dump {
        Dump {
            lines: self
                .all_children_sorted()
                .map(|node| DumpLine {
                    depth: node.depth(),
                    text: node.text().to_string(),
                    tags: node.own_tags().iter().cloned().collect(),
                    comments: node.own_comments().iter().cloned().collect(),
                    new_in_config: node.is_new_in_config(),
                    negated: node.is_negated(),
                })
                .collect(),
        }
    }

    /// Restore a tree from a snapshot. Duplicate siblings are restored
    /// verbatim.
    pub fn from_dump(driver: std::sync::Arc<crate::driver::Driver>, dump: &Dump) -> Result<Self> {
        let mut config = ConfigTree::new(driver);
        let mut last: Option<(NodeId, usize)> = None;
        for line in &dump.lines {
            let parent = match last {
                None => NodeId::ROOT,
                Some((last_id, last_depth)) => {
                    if line.depth == 1 {
                        NodeId::ROOT
                    } else if line.depth == last_depth + 1 {
                        last_id
                    } else {
                        // Walk up from the previous node to the right level.
                        let mut cursor = last_id;
                        for _ in 0..(last_depth + 1 - line.depth) {
                            cursor = self_parent(&config, cursor);
                        }
                        cursor
                    }
                }
            };
            let id = config.add_child_forced(parent, &line.text)?;
            for tag in &line.tags {
                config.node_mut(id).tags.insert(tag.clone());
            }
            for comment in &line.comments {
                config.node_mut(id).comments.insert(comment.clone());
            }
            config.node_mut(id).new_in_config = line.new_in_config;
            config.node_mut(id).negated = line.negated;
            last = Some((id, line.depth));
        }
        Ok(config)
    }
}

fn self_parent(config: &ConfigTree, id: NodeId) -> NodeId {
    config
        .node_ref(id)
        .parent()
        .map(|p| p.id())
        .unwrap_or(NodeId::ROOT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver;
    use crate::platform::Platform;
    use std::sync::Arc;

    fn ios_tree() -> ConfigTree {
        let mut config = ConfigTree::new(driver::for_platform(Platform::CiscoIos));
        let interface = config.add_child(NodeId::ROOT, "interface Vlan2").unwrap();
        config.add_child(interface, "ip address 10.0.0.1 255.255.255.0").unwrap();
        config
    }

    #[test]
    fn test_cisco_style_indentation() {
        let config = ios_tree();
        assert_eq!(
            config.lines(),
            vec![
                "interface Vlan2".to_string(),
                "  ip address 10.0.0.1 255.255.255.0".to_string(),
            ]
        );
    }

    #[test]
    fn test_lines_with_exits_appends_default_exit() {
        let config = ios_tree();
        let lines = config.lines_with_exits();
        assert_eq!(lines.last().map(String::as_str), Some("exit"));
    }

    #[test]
    fn test_comment_styles() {
        let mut config = ios_tree();
        let interface = config.root().child_by_text("interface Vlan2").unwrap().id();
        config.add_comment(interface, "new section");

        let plain = config
            .node_ref(interface)
            .cisco_style_text(&CommentStyle::WithoutComments);
        assert_eq!(plain, "interface Vlan2");

        let with = config
            .node_ref(interface)
            .cisco_style_text(&CommentStyle::WithComments);
        assert_eq!(with, "interface Vlan2 !new section");
    }

    #[test]
    fn test_dump_round_trip() {
        let config = ios_tree();
        let dump = config.dump();
        let restored = ConfigTree::from_dump(
            Arc::clone(config.driver()),
            &dump,
        )
        .unwrap();
        assert_eq!(restored.lines(), config.lines());
        assert_eq!(restored.dump(), dump);
    }

    #[test]
    fn test_set_style_rendering() {
        let mut config = ConfigTree::new(driver::for_platform(Platform::JuniperJunos));
        let leaf = config
            .add_children_deep(
                NodeId::ROOT,
                ["interfaces", "irb", "unit 2", "family inet", "disable"],
            )
            .unwrap();
        assert_eq!(
            config.lines(),
            vec!["set interfaces irb unit 2 family inet disable".to_string()]
        );

        config.set_negated(leaf, true);
        assert_eq!(
            config.lines(),
            vec!["delete interfaces irb unit 2 family inet disable".to_string()]
        );
    }
}
