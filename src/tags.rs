//! Tagging and tag-filtered rendering.
//!
//! A [`TagRule`] couples a lineage with a set of tags to apply. Rules are
//! additive and order-independent, and applying the same rules twice is a
//! no-op. Rendering can then be restricted to subtrees whose leaves carry
//! (or avoid) given tags, which is how operators split one remediation
//! into safe and review-required change sets.

use std::collections::BTreeSet;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::Result;
use crate::matching::{Lineage, MatchRule};
use crate::tree::{CommentStyle, ConfigTree, NodeId, NodeRef};

/// A rule applying tags to every node matching a lineage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagRule {
    /// Lineage selecting the nodes to tag
    pub lineage: Vec<MatchRule>,
    /// Tags applied to matching nodes (a single string or a list in YAML)
    #[serde(alias = "add_tags", deserialize_with = "one_or_many_tags")]
    pub apply_tags: BTreeSet<String>,
}

fn one_or_many_tags<'de, D>(deserializer: D) -> std::result::Result<BTreeSet<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum OneOrMany {
        One(String),
        Many(BTreeSet<String>),
    }
    Ok(match OneOrMany::deserialize(deserializer)? {
        OneOrMany::One(tag) => BTreeSet::from([tag]),
        OneOrMany::Many(tags) => tags,
    })
}

impl ConfigTree {
    /// Apply tag rules to every matching node. Matched branches push the
    /// tags down to their leaf descendants.
    pub fn apply_tag_rules(&mut self, rules: &[TagRule]) -> Result<()> {
        let mode = self.driver().match_mode();
        let compiled: Vec<(Lineage, &BTreeSet<String>)> = rules
            .iter()
            .map(|rule| {
                let lineage = Lineage::compile(&rule.lineage, "tag rule")?;
                Ok((lineage, &rule.apply_tags))
            })
            .collect::<Result<Vec<_>>>()?;

        let mut updates: Vec<(NodeId, Vec<String>)> = Vec::new();
        for node in self.all_children() {
            let path = node.path();
            for (lineage, tags) in &compiled {
                if lineage.matches_path(&path, mode) {
                    updates.push((node.id(), tags.iter().cloned().collect()));
                }
            }
        }
        for (id, tags) in updates {
            self.add_tags(id, tags);
        }
        Ok(())
    }

    /// Render only the subtrees kept by the include/exclude tag sets.
    ///
    /// A leaf is kept iff `include` is empty or intersects its tags, and
    /// `exclude` is disjoint from them; a branch is kept iff any of its
    /// descendants is.
    pub fn filtered_lines(
        &self,
        include_tags: &BTreeSet<String>,
        exclude_tags: &BTreeSet<String>,
    ) -> Vec<String> {
        let mut out = Vec::new();
        for child in self.root().children_sorted() {
            filtered_subtree(child, include_tags, exclude_tags, &mut out);
        }
        out
    }

    /// [`ConfigTree::filtered_lines`] joined into one string.
    pub fn filtered_text(
        &self,
        include_tags: &BTreeSet<String>,
        exclude_tags: &BTreeSet<String>,
    ) -> String {
        self.filtered_lines(include_tags, exclude_tags).join("\n")
    }

    /// A new tree holding only the subtrees whose tags are a superset of
    /// `tags`.
    pub fn with_tags(&self, tags: &BTreeSet<String>) -> Result<ConfigTree> {
        let mut subset = ConfigTree::new(std::sync::Arc::clone(self.driver()));
        with_tags_at(self.root(), tags, &mut subset, NodeId::ROOT)?;
        Ok(subset)
    }
}

/// Given the line tags and the include/exclude sets, decide whether the
/// line is kept.
pub fn line_inclusion_test(
    tags: &BTreeSet<String>,
    include_tags: &BTreeSet<String>,
    exclude_tags: &BTreeSet<String>,
) -> bool {
    let included = include_tags.is_empty() || !tags.is_disjoint(include_tags);
    included && tags.is_disjoint(exclude_tags)
}

fn filtered_subtree(
    node: NodeRef<'_>,
    include_tags: &BTreeSet<String>,
    exclude_tags: &BTreeSet<String>,
    out: &mut Vec<String>,
) {
    if node.is_leaf() {
        if line_inclusion_test(&node.tags(), include_tags, exclude_tags) {
            out.push(node.cisco_style_text(&CommentStyle::WithoutComments));
        }
        return;
    }
    let mut kept_children = Vec::new();
    for child in node.children_sorted() {
        filtered_subtree(child, include_tags, exclude_tags, &mut kept_children);
    }
    if !kept_children.is_empty() {
        out.push(node.cisco_style_text(&CommentStyle::WithoutComments));
        out.append(&mut kept_children);
    }
}

fn with_tags_at(
    source: NodeRef<'_>,
    tags: &BTreeSet<String>,
    subset: &mut ConfigTree,
    parent: NodeId,
) -> Result<()> {
    for child in source.children() {
        if tags.is_subset(&child.tags()) {
            let copy = subset.add_shallow_copy_of(parent, child, false)?;
            with_tags_at(child, tags, subset, copy)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver;
    use crate::platform::Platform;

    fn tagged_config() -> ConfigTree {
        let mut config = ConfigTree::parse(
            driver::for_platform(Platform::CiscoIos),
            "ntp server 10.0.0.1\nntp server 10.0.0.2\ninterface Vlan2\n  shutdown\n",
        )
        .unwrap();
        config
            .apply_tag_rules(&[TagRule {
                lineage: vec![MatchRule::startswith("ntp")],
                apply_tags: BTreeSet::from(["ntp".to_string()]),
            }])
            .unwrap();
        config
    }

    #[test]
    fn test_apply_tag_rules_tags_matching_nodes() {
        let config = tagged_config();
        let ntp = config.root().child_by_text("ntp server 10.0.0.1").unwrap();
        assert!(ntp.tags().contains("ntp"));
        let interface = config.root().child_by_text("interface Vlan2").unwrap();
        assert!(interface.tags().is_empty());
    }

    #[test]
    fn test_apply_tag_rules_is_idempotent() {
        let mut config = tagged_config();
        let before = config.dump();
        config
            .apply_tag_rules(&[TagRule {
                lineage: vec![MatchRule::startswith("ntp")],
                apply_tags: BTreeSet::from(["ntp".to_string()]),
            }])
            .unwrap();
        assert_eq!(config.dump(), before);
    }

    #[test]
    fn test_filtered_text_include() {
        let config = tagged_config();
        let include = BTreeSet::from(["ntp".to_string()]);
        assert_eq!(
            config.filtered_text(&include, &BTreeSet::new()),
            "ntp server 10.0.0.1\nntp server 10.0.0.2"
        );
    }

    #[test]
    fn test_filtered_text_exclude() {
        let config = tagged_config();
        let exclude = BTreeSet::from(["ntp".to_string()]);
        assert_eq!(
            config.filtered_text(&BTreeSet::new(), &exclude),
            "interface Vlan2\n  shutdown"
        );
    }

    #[test]
    fn test_branch_kept_when_descendant_kept() {
        let mut config = ConfigTree::parse(
            driver::for_platform(Platform::CiscoIos),
            "interface Vlan2\n  ip address 10.0.0.1 255.255.255.0\n  shutdown\n",
        )
        .unwrap();
        config
            .apply_tag_rules(&[TagRule {
                lineage: vec![
                    MatchRule::startswith("interface"),
                    MatchRule::startswith("shutdown"),
                ],
                apply_tags: BTreeSet::from(["risky".to_string()]),
            }])
            .unwrap();

        let include = BTreeSet::from(["risky".to_string()]);
        assert_eq!(
            config.filtered_text(&include, &BTreeSet::new()),
            "interface Vlan2\n  shutdown"
        );
    }

    #[test]
    fn test_tag_rule_yaml_v2_shape() {
        let yaml = "- lineage:\n    - startswith: [ntp, 'no ntp']\n  add_tags: ntp\n";
        let rules: Vec<TagRule> = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules[0].apply_tags.contains("ntp"));
    }

    #[test]
    fn test_with_tags_extracts_subset() {
        let config = tagged_config();
        let subset = config.with_tags(&BTreeSet::from(["ntp".to_string()])).unwrap();
        assert_eq!(
            subset.lines(),
            vec!["ntp server 10.0.0.1", "ntp server 10.0.0.2"]
        );
    }
}
