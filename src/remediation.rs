//! The remediation engine.
//!
//! [`ConfigTree::config_to_get_to`] walks a running and a generated config
//! in parallel and emits a third tree of edits: additions from the
//! generated side, negations of running-only commands (subject to the
//! driver's negation and idempotency rules), and recursive edits inside
//! shared sections. Sectional exits are materialized as leaves and order
//! weights assigned afterwards, so rendering the delta in sorted order
//! yields a device-ready command sequence.
//!
//! The same walk with the arguments swapped produces a rollback;
//! [`ConfigTree::future`] predicts the post-merge state of a running config
//! under a non-strict overlay; [`ConfigTree::difference`] extracts the
//! subset of one config missing from another.

use std::collections::BTreeSet;
use std::collections::HashMap;
use std::sync::Arc;

use crate::driver::{ConfigSyntax, Driver};
use crate::error::{Error, Result};
use crate::tree::{ConfigTree, NodeId, NodeRef};

/// Order weight pinning materialized sectional exits after their siblings.
const EXIT_ORDER_WEIGHT: i32 = i32::MAX;

impl ConfigTree {
    /// Compute the commands needed to transition from this config (the
    /// running config) to `target` (the generated config).
    pub fn config_to_get_to(&self, target: &ConfigTree) -> Result<ConfigTree> {
        self.ensure_same_platform(target)?;
        let mut delta = ConfigTree::new(Arc::clone(self.driver()));
        config_to_get_to_at(self, NodeId::ROOT, target, NodeId::ROOT, &mut delta, NodeId::ROOT)?;
        delta.materialize_sectional_exits()?;
        delta.set_order_weights();
        Ok(delta)
    }

    /// Compute the subset of this config that is not present in `target`.
    ///
    /// Negated and defaulted commands are ignored, and ACL entries compare
    /// with their sequence numbers stripped.
    pub fn difference(&self, target: &ConfigTree) -> Result<ConfigTree> {
        self.ensure_same_platform(target)?;
        let mut delta = ConfigTree::new(Arc::clone(self.driver()));
        difference_at(
            self,
            NodeId::ROOT,
            Some(target.root()),
            &mut delta,
            NodeId::ROOT,
            None,
        )?;
        Ok(delta)
    }

    /// Predict the config after `overlay` is applied to this config.
    ///
    /// Unlike [`ConfigTree::merge`], overlapping sections are allowed and
    /// the overlay wins. The quality of the prediction depends on how well
    /// the driver's idempotency rules are tuned.
    pub fn future(&self, overlay: &ConfigTree) -> Result<ConfigTree> {
        self.ensure_same_platform(overlay)?;
        let mut future = ConfigTree::new(Arc::clone(self.driver()));
        future_at(self, NodeId::ROOT, overlay, NodeId::ROOT, &mut future, NodeId::ROOT)?;
        Ok(future)
    }

    fn ensure_same_platform(&self, other: &ConfigTree) -> Result<()> {
        if self.driver().platform() != other.driver().platform() {
            return Err(Error::DriverMismatch {
                left: self.driver().platform(),
                right: other.driver().platform(),
            });
        }
        Ok(())
    }

    /// Assign each node's order weight from the first matching ordering
    /// rule; unmatched nodes keep their current weight.
    pub fn set_order_weights(&mut self) {
        let driver = Arc::clone(self.driver());
        let updates: Vec<(NodeId, i32)> = self
            .all_children()
            .filter_map(|node| {
                driver
                    .order_weight(&node.path())
                    .map(|weight| (node.id(), weight))
            })
            .collect();
        for (id, weight) in updates {
            self.set_order_weight(id, weight);
        }
    }

    /// Append an exit leaf to every section whose lineage matches a
    /// sectional exiting rule with a non-empty token.
    fn materialize_sectional_exits(&mut self) -> Result<()> {
        let driver = Arc::clone(self.driver());
        if driver.syntax() == ConfigSyntax::SetStatements {
            return Ok(());
        }
        let sections: Vec<(NodeId, String)> = self
            .all_children()
            .filter(|node| !node.is_leaf())
            .filter_map(|node| {
                driver
                    .sectional_exit_rule(&node.path())
                    .filter(|exit_text| !exit_text.is_empty())
                    .map(|exit_text| (node.id(), exit_text.to_string()))
            })
            .collect();
        for (id, exit_text) in sections {
            let exit = self.add_child_if_absent(id, &exit_text)?;
            self.set_order_weight(exit, EXIT_ORDER_WEIGHT);
        }
        Ok(())
    }

    /// Negate a node of this tree in place.
    ///
    /// Indented grammars rewrite the text through the driver's NegateWith
    /// rules, `default`-when rules, or negation-prefix swap; set-statement
    /// grammars toggle the delete marker on the subtree's leaves.
    pub fn negate(&mut self, id: NodeId) {
        let driver = Arc::clone(self.driver());
        if driver.syntax() == ConfigSyntax::SetStatements {
            self.toggle_negated_leaves(id);
            return;
        }

        let new_text = {
            let node = self.node_ref(id);
            let path = node.path();
            if let Some(use_text) = driver.negate_with(&path) {
                use_text.to_string()
            } else if driver.negation_default_when(&path) {
                format!("default {}", driver.text_without_negation(node.text()))
            } else {
                driver.swap_negation(node.text())
            }
        };
        self.set_text(id, &new_text);
    }

    fn toggle_negated_leaves(&mut self, id: NodeId) {
        if self.node_ref(id).is_leaf() {
            let negated = self.node_ref(id).is_negated();
            self.set_negated(id, !negated);
            return;
        }
        let children: Vec<NodeId> = self.node_ref(id).children().map(|c| c.id()).collect();
        for child in children {
            self.toggle_negated_leaves(child);
        }
    }
}

/// Whether `node` is an idempotent change: a member of an idempotent
/// command family (and not excluded by an avoid rule) with a counterpart
/// among `others`.
fn is_idempotent_command<'o, I>(driver: &Driver, node: NodeRef<'_>, others: I) -> bool
where
    I: Iterator<Item = NodeRef<'o>> + Clone,
{
    // Avoid list commands from matching as idempotent.
    if driver.idempotent_avoid(&node.path()) {
        return false;
    }
    driver.idempotent_for(node, others).is_some()
}

fn config_to_get_to_at(
    running: &ConfigTree,
    r_parent: NodeId,
    generated: &ConfigTree,
    g_parent: NodeId,
    delta: &mut ConfigTree,
    d_parent: NodeId,
) -> Result<()> {
    negations(running, r_parent, generated, g_parent, delta, d_parent)?;
    additions_and_recursion(running, r_parent, generated, g_parent, delta, d_parent)?;
    Ok(())
}

/// Children of running absent from generated get negated, unless another
/// generated sibling supersedes them idempotently.
fn negations(
    running: &ConfigTree,
    r_parent: NodeId,
    generated: &ConfigTree,
    g_parent: NodeId,
    delta: &mut ConfigTree,
    d_parent: NodeId,
) -> Result<()> {
    let driver = running.driver();
    let generated_parent = generated.node_ref(g_parent);

    for r_child in running.node_ref(r_parent).children() {
        if generated_parent.has_child_text(r_child.text()) {
            continue;
        }
        if is_idempotent_command(driver, r_child, generated_parent.children()) {
            continue;
        }

        if driver.syntax() == ConfigSyntax::SetStatements {
            // Emit full-path delete statements for the whole subtree.
            let copy = delta.add_deep_copy_of(d_parent, r_child, false)?;
            delta.negate(copy);
        } else {
            let negated = delta.add_child(d_parent, r_child.text())?;
            delta.negate(negated);
            if r_child.child_count() > 0 {
                delta.add_comment(negated, format!("removes {} lines", r_child.child_count() + 1));
            }
        }
    }
    Ok(())
}

/// Children of generated absent from running are added wholesale; shared
/// sections recurse (or overwrite, per the driver's sectional rules).
fn additions_and_recursion(
    running: &ConfigTree,
    r_parent: NodeId,
    generated: &ConfigTree,
    g_parent: NodeId,
    delta: &mut ConfigTree,
    d_parent: NodeId,
) -> Result<()> {
    let driver = Arc::clone(running.driver());

    for g_child in generated.node_ref(g_parent).children() {
        if let Some(r_child) = running.node_ref(r_parent).child_by_text(g_child.text()) {
            let path = r_child.path();
            if driver.use_sectional_overwrite(&path) {
                overwrite_with(r_child, g_child, delta, d_parent, true)?;
                continue;
            }
            if driver.use_sectional_overwrite_no_negate(&path) {
                overwrite_with(r_child, g_child, delta, d_parent, false)?;
                continue;
            }

            let subtree = delta.add_child_forced(d_parent, g_child.text())?;
            config_to_get_to_at(
                running,
                r_child.id(),
                generated,
                g_child.id(),
                delta,
                subtree,
            )?;
            if delta.node_ref(subtree).is_leaf() {
                delta.delete(subtree);
            }
        } else {
            // Already in the delta means the running config carried the
            // negated form and the swap was emitted above.
            if delta.node_ref(d_parent).has_child_text(g_child.text()) {
                continue;
            }
            let new_item = delta.add_deep_copy_of(d_parent, g_child, false)?;
            delta.mark_new_in_config(new_item);
            if g_child.child_count() > 0 {
                delta.add_comment(new_item, "new section");
            }
        }
    }
    Ok(())
}

/// Replace a section wholesale: negate the running section (unless
/// `negate` is false) and re-create it from the generated side.
fn overwrite_with(
    r_child: NodeRef<'_>,
    g_child: NodeRef<'_>,
    delta: &mut ConfigTree,
    d_parent: NodeId,
    negate: bool,
) -> Result<()> {
    let children_differ = r_child.child_count() != g_child.child_count()
        || !r_child
            .children()
            .zip(g_child.children())
            .all(|(a, b)| a.subtree_eq(b));
    if !children_differ {
        return Ok(());
    }

    let existing = delta
        .node_ref(d_parent)
        .child_by_text(r_child.text())
        .map(|n| n.id());
    if negate {
        let negated = match existing {
            Some(id) => id,
            None => delta.add_child(d_parent, r_child.text())?,
        };
        delta.negate(negated);
        delta.add_comment(negated, "dropping section");
    } else if let Some(id) = existing {
        delta.delete(id);
    }

    if r_child.child_count() > 0 {
        let new_item = delta.add_deep_copy_of(d_parent, g_child, false)?;
        delta.add_comment(new_item, "re-create section");
    }
    Ok(())
}

// ============================================================================
// difference
// ============================================================================

fn strip_acl_sequence_number(text: &str) -> String {
    let mut words: Vec<&str> = text.split_whitespace().collect();
    if words
        .first()
        .is_some_and(|w| w.chars().all(|c| c.is_ascii_digit()))
    {
        words.remove(0);
    }
    words.join(" ")
}

fn difference_at(
    source: &ConfigTree,
    s_parent: NodeId,
    target_parent: Option<NodeRef<'_>>,
    delta: &mut ConfigTree,
    d_parent: NodeId,
    target_acl_children: Option<&HashMap<String, NodeId>>,
) -> Result<()> {
    let acl_prefixes = ["ip access-list ", "ipv4 access-list ", "ipv6 access-list "];
    let driver = source.driver();

    for s_child in source.node_ref(s_parent).children() {
        // Not dealing with negations and defaults here.
        if s_child.text().starts_with(driver.negation_prefix())
            || s_child.text().starts_with("default ")
        {
            continue;
        }

        let target_child: Option<NodeRef<'_>> = match target_acl_children {
            Some(mapping) => mapping
                .get(&strip_acl_sequence_number(s_child.text()))
                .and_then(|&id| target_parent.map(|p| p.tree().node_ref(id))),
            None => target_parent.and_then(|p| p.child_by_text(s_child.text())),
        };

        match target_child {
            None => {
                delta.add_deep_copy_of(d_parent, s_child, false)?;
            }
            Some(target_child) => {
                let d_child = delta.add_child_forced(d_parent, s_child.text())?;
                if acl_prefixes.iter().any(|p| s_child.text().starts_with(p)) {
                    let mapping: HashMap<String, NodeId> = target_child
                        .children()
                        .map(|c| (strip_acl_sequence_number(c.text()), c.id()))
                        .collect();
                    difference_at(
                        source,
                        s_child.id(),
                        Some(target_child),
                        delta,
                        d_child,
                        Some(&mapping),
                    )?;
                } else {
                    difference_at(source, s_child.id(), Some(target_child), delta, d_child, None)?;
                }
                if delta.node_ref(d_child).is_leaf() {
                    delta.delete(d_child);
                }
            }
        }
    }
    Ok(())
}

// ============================================================================
// future
// ============================================================================

fn future_at(
    running: &ConfigTree,
    r_parent: NodeId,
    overlay: &ConfigTree,
    o_parent: NodeId,
    future: &mut ConfigTree,
    f_parent: NodeId,
) -> Result<()> {
    let driver = Arc::clone(running.driver());
    let running_parent = running.node_ref(r_parent);
    let overlay_parent = overlay.node_ref(o_parent);

    // Overlay commands that merely negate a running command cancel out.
    let mut negated_or_recursed: BTreeSet<String> = BTreeSet::new();
    let mut overlay_ignore: BTreeSet<String> = BTreeSet::new();
    for r_child in running_parent.children() {
        if let Some(negation_text) = driver.negate_with(&r_child.path()) {
            if overlay_parent.has_child_text(negation_text) {
                negated_or_recursed.insert(r_child.text().to_string());
                overlay_ignore.insert(negation_text.to_string());
            }
        }
    }

    for o_child in overlay_parent.children() {
        if overlay_ignore.contains(o_child.text()) {
            continue;
        }
        let path = o_child.path();
        if driver.use_sectional_overwrite(&path) || driver.use_sectional_overwrite_no_negate(&path)
        {
            future.add_deep_copy_of(f_parent, o_child, false)?;
            negated_or_recursed.insert(o_child.text().to_string());
        } else if let Some(r_match) = driver.idempotent_for(o_child, running_parent.children()) {
            future.add_deep_copy_of(f_parent, o_child, false)?;
            negated_or_recursed.insert(r_match.text().to_string());
        } else if let Some(r_child) = running_parent.child_by_text(o_child.text()) {
            let f_child = future.add_shallow_copy_of(f_parent, r_child, false)?;
            future_at(running, r_child.id(), overlay, o_child.id(), future, f_child)?;
            negated_or_recursed.insert(o_child.text().to_string());
        } else if o_child.text().starts_with(driver.negation_prefix()) {
            let unnegated = driver.text_without_negation(o_child.text()).to_string();
            if running_parent.has_child_text(&unnegated) {
                negated_or_recursed.insert(unnegated);
            } else {
                // Account for negated commands already in the running config.
                future.add_shallow_copy_of(f_parent, o_child, false)?;
            }
        } else if running_parent
            .has_child_text(&format!("{}{}", driver.negation_prefix(), o_child.text()))
        {
            negated_or_recursed
                .insert(format!("{}{}", driver.negation_prefix(), o_child.text()));
        } else {
            future.add_deep_copy_of(f_parent, o_child, false)?;
        }
    }

    for r_child in running_parent.children() {
        if negated_or_recursed.contains(r_child.text()) {
            continue;
        }
        future.add_deep_copy_of(f_parent, r_child, false)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver;
    use crate::platform::Platform;

    fn parse(platform: Platform, text: &str) -> ConfigTree {
        ConfigTree::parse(driver::for_platform(platform), text).unwrap()
    }

    fn remediation_lines(platform: Platform, running: &str, generated: &str) -> Vec<String> {
        let running = parse(platform, running);
        let generated = parse(platform, generated);
        running.config_to_get_to(&generated).unwrap().lines()
    }

    #[test]
    fn test_identical_configs_produce_empty_delta() {
        let text = "interface Vlan2\n  ip address 10.0.0.1 255.255.255.0\n";
        let lines = remediation_lines(Platform::CiscoIos, text, text);
        assert!(lines.is_empty());
    }

    #[test]
    fn test_remediation_from_empty_is_deep_copy_flagged_new() {
        let generated = parse(Platform::CiscoIos, "vlan 3\n  name new\n");
        let running = parse(Platform::CiscoIos, "");
        let delta = running.config_to_get_to(&generated).unwrap();
        assert_eq!(delta.lines(), generated.lines());
        assert!(delta.all_children().all(|n| n.is_new_in_config()));
    }

    #[test]
    fn test_vlan_addition_with_idempotent_name() {
        let lines = remediation_lines(
            Platform::CiscoIos,
            "vlan 3\n  name old\n",
            "vlan 3\n  name new\nvlan 4\n  name v4\n",
        );
        assert_eq!(
            lines,
            vec!["vlan 3", "  name new", "vlan 4", "  name v4"]
        );
    }

    #[test]
    fn test_shutdown_toggle_swaps_negation() {
        let lines = remediation_lines(
            Platform::CiscoIos,
            "interface Vlan2\n  shutdown\n",
            "interface Vlan2\n  no shutdown\n",
        );
        assert_eq!(lines, vec!["interface Vlan2", "  no shutdown"]);
    }

    #[test]
    fn test_negate_with_rule_applies() {
        let lines = remediation_lines(
            Platform::CiscoIos,
            "logging console debugging\nhostname r1\n",
            "hostname r1\n",
        );
        assert_eq!(lines, vec!["no logging console"]);
    }

    #[test]
    fn test_rollback_restores_running() {
        let running = parse(Platform::CiscoIos, "vlan 3\n  name old\n");
        let generated = parse(
            Platform::CiscoIos,
            "vlan 3\n  name new\nvlan 4\n  name v4\n",
        );
        let rollback = generated.config_to_get_to(&running).unwrap();
        assert_eq!(
            rollback.lines(),
            vec!["no vlan 4", "vlan 3", "  name old"]
        );
    }

    #[test]
    fn test_junos_delete_emits_full_path() {
        let lines = remediation_lines(
            Platform::JuniperJunos,
            "set interfaces irb unit 2 family inet disable\n",
            "",
        );
        assert_eq!(lines, vec!["delete interfaces irb unit 2 family inet disable"]);
    }

    #[test]
    fn test_negation_removes_section_with_comment() {
        let running = parse(Platform::CiscoIos, "vlan 3\n  name old\n  state active\n");
        let generated = parse(Platform::CiscoIos, "");
        let delta = running.config_to_get_to(&generated).unwrap();
        let negated = delta.root().children().next().unwrap();
        assert_eq!(negated.text(), "no vlan 3");
        assert!(negated.own_comments().contains("removes 3 lines"));
    }

    #[test]
    fn test_sectional_exit_materialized_for_matched_sections() {
        let lines = remediation_lines(
            Platform::CiscoIos,
            "router bgp 65000\n",
            "router bgp 65000\n address-family ipv4\n  network 10.0.0.0\n",
        );
        assert_eq!(
            lines,
            vec![
                "router bgp 65000",
                "  address-family ipv4",
                "    network 10.0.0.0",
                "    exit-address-family",
            ]
        );
    }

    #[test]
    fn test_sectional_overwrite_no_negate_recreates_section() {
        let lines = remediation_lines(
            Platform::CiscoXr,
            "route-policy RP\n  pass\n",
            "route-policy RP\n  drop\n",
        );
        assert_eq!(
            lines,
            vec!["route-policy RP", "  drop", "  end-policy"]
        );
    }

    #[test]
    fn test_ordering_weights_sink_no_shutdown() {
        let lines = remediation_lines(
            Platform::CiscoIos,
            "interface Vlan2\n  shutdown\n",
            "interface Vlan2\n  no shutdown\n  description up\n",
        );
        assert_eq!(
            lines,
            vec!["interface Vlan2", "  description up", "  no shutdown"]
        );
    }

    #[test]
    fn test_idempotent_avoid_still_negates() {
        let lines = remediation_lines(
            Platform::CiscoNxos,
            "interface Ethernet1/1\n  ip address 10.0.0.1/24 secondary\n",
            "interface Ethernet1/1\n  ip address 10.0.1.1/24 secondary\n",
        );
        assert_eq!(
            lines,
            vec![
                "interface Ethernet1/1",
                "  no ip address 10.0.0.1/24 secondary",
                "  ip address 10.0.1.1/24 secondary",
            ]
        );
    }

    #[test]
    fn test_negation_default_when_rule() {
        let lines = remediation_lines(
            Platform::AristaEos,
            "interface Ethernet1\n  logging event link-status\n",
            "interface Ethernet1\n",
        );
        assert_eq!(
            lines,
            vec!["interface Ethernet1", "  default logging event link-status"]
        );
    }

    #[test]
    fn test_driver_mismatch_rejected() {
        let running = parse(Platform::CiscoIos, "hostname r1\n");
        let generated = parse(Platform::AristaEos, "hostname r1\n");
        assert!(matches!(
            running.config_to_get_to(&generated),
            Err(Error::DriverMismatch { .. })
        ));
    }

    #[test]
    fn test_difference_ignores_negations_and_matches_acl_entries() {
        let source = parse(
            Platform::CiscoIos,
            "no spanning-tree vlan 5\nip access-list extended edge\n  permit ip any any\nntp server 10.0.0.1\n",
        );
        let target = parse(
            Platform::CiscoIos,
            "ip access-list extended edge\n  permit ip any any\n",
        );
        let delta = source.difference(&target).unwrap();
        assert_eq!(delta.lines(), vec!["ntp server 10.0.0.1"]);
    }

    #[test]
    fn test_future_overlay_wins_and_negations_cancel() {
        let running = parse(
            Platform::CiscoIos,
            "interface Vlan2\n  shutdown\nntp server 10.0.0.1\n",
        );
        let overlay = parse(
            Platform::CiscoIos,
            "interface Vlan2\n  no shutdown\nvlan 9\n  name nine\n",
        );
        let future = running.future(&overlay).unwrap();
        let lines = future.lines();
        assert!(lines.contains(&"ntp server 10.0.0.1".to_string()));
        assert!(lines.contains(&"vlan 9".to_string()));
        assert!(!lines.contains(&"  shutdown".to_string()));
    }
}
