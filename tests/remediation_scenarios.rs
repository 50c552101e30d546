//! End-to-end remediation scenarios, exercised through the public API the
//! way external tooling consumes it: parse both configs, build a
//! workflow, and inspect the rendered edits.

use std::collections::BTreeSet;

use confdiff::prelude::*;
use confdiff::{driver, loader};

fn parse(platform: Platform, text: &str) -> ConfigTree {
    ConfigTree::parse(driver::for_platform(platform), text).unwrap()
}

fn remediation_lines(platform: Platform, running: &str, generated: &str) -> Vec<String> {
    let mut workflow = WorkflowRemediation::new(
        parse(platform, running),
        parse(platform, generated),
    )
    .unwrap();
    workflow.remediation_config().unwrap().lines()
}

// ============================================================================
// Scenario: VLAN addition with idempotent name replacement
// ============================================================================

#[test]
fn test_vlan_addition() {
    let lines = remediation_lines(
        Platform::CiscoIos,
        "vlan 3\n  name old\n",
        "vlan 3\n  name new\nvlan 4\n  name v4\n",
    );
    assert_eq!(lines, vec!["vlan 3", "  name new", "vlan 4", "  name v4"]);
    // No explicit negation of the old name is emitted.
    assert!(!lines.iter().any(|l| l.contains("no name")));
}

// ============================================================================
// Scenario: interface shutdown toggle
// ============================================================================

#[test]
fn test_interface_shutdown_toggle() {
    let lines = remediation_lines(
        Platform::CiscoIos,
        "interface Vlan2\n  shutdown\n",
        "interface Vlan2\n  no shutdown\n",
    );
    assert_eq!(lines, vec!["interface Vlan2", "  no shutdown"]);
}

// ============================================================================
// Scenario: negate-with rule
// ============================================================================

#[test]
fn test_negate_with_default() {
    let lines = remediation_lines(
        Platform::CiscoIos,
        "logging console debugging\n",
        "",
    );
    assert_eq!(lines, vec!["no logging console"]);
}

// ============================================================================
// Scenario: rollback
// ============================================================================

#[test]
fn test_rollback_of_vlan_addition() {
    let running = parse(Platform::CiscoIos, "vlan 3\n  name old\n");
    let generated = parse(Platform::CiscoIos, "vlan 3\n  name new\nvlan 4\n  name v4\n");
    let mut workflow = WorkflowRemediation::new(running, generated).unwrap();

    let rollback = workflow.rollback_config().unwrap().lines();
    assert!(rollback.contains(&"no vlan 4".to_string()));
    assert!(rollback.contains(&"vlan 3".to_string()));
    assert!(rollback.contains(&"  name old".to_string()));
}

// ============================================================================
// Scenario: Junos flat statements
// ============================================================================

#[test]
fn test_junos_flat_delete() {
    let lines = remediation_lines(
        Platform::JuniperJunos,
        "set interfaces irb unit 2 family inet disable\n",
        "",
    );
    assert_eq!(
        lines,
        vec!["delete interfaces irb unit 2 family inet disable"]
    );
}

#[test]
fn test_junos_flat_addition() {
    let lines = remediation_lines(
        Platform::JuniperJunos,
        "",
        "set system host-name r1\nset system services ssh\n",
    );
    assert_eq!(
        lines,
        vec!["set system host-name r1", "set system services ssh"]
    );
}

#[test]
fn test_junos_braced_input_remediates_like_flat() {
    let braced = "system {\n    host-name r1;\n}\n";
    let flat = "set system host-name r1\n";
    let from_braced = remediation_lines(Platform::JuniperJunos, braced, "");
    let from_flat = remediation_lines(Platform::JuniperJunos, flat, "");
    assert_eq!(from_braced, from_flat);
    assert_eq!(from_braced, vec!["delete system host-name r1"]);
}

// ============================================================================
// Scenario: tag filtering
// ============================================================================

#[test]
fn test_tag_filtered_remediation() {
    let running = parse(Platform::CiscoIos, "no ntp server 10.0.0.1\n");
    let generated = parse(
        Platform::CiscoIos,
        "ntp server 10.0.0.1\ninterface Vlan2\n  shutdown\n",
    );
    let mut workflow = WorkflowRemediation::new(running, generated).unwrap();

    let tag_rules = loader::load_tag_rules(
        "- lineage:\n    - startswith: [ntp, 'no ntp']\n  add_tags: ntp\n",
    )
    .unwrap();
    workflow.apply_remediation_tag_rules(&tag_rules).unwrap();

    let include = BTreeSet::from(["ntp".to_string()]);
    let text = workflow
        .remediation_config_filtered_text(&include, &BTreeSet::new())
        .unwrap();
    assert_eq!(text, "ntp server 10.0.0.1");

    let exclude = BTreeSet::from(["ntp".to_string()]);
    let text = workflow
        .remediation_config_filtered_text(&BTreeSet::new(), &exclude)
        .unwrap();
    assert_eq!(text, "interface Vlan2\n  shutdown");
}

// ============================================================================
// Larger mixed scenario
// ============================================================================

#[test]
fn test_mixed_interface_and_acl_remediation() {
    let running = concat!(
        "hostname edge1\n",
        "interface GigabitEthernet0/1\n",
        "  description old uplink\n",
        "  ip address 192.0.2.1 255.255.255.0\n",
        "  shutdown\n",
        "ip access-list extended edge\n",
        "  permit ip host 10.0.0.1 any\n",
        "ntp server 10.0.0.5\n",
    );
    let generated = concat!(
        "hostname edge1\n",
        "interface GigabitEthernet0/1\n",
        "  description core uplink\n",
        "  ip address 192.0.2.1 255.255.255.0\n",
        "  no shutdown\n",
        "ip access-list extended edge\n",
        "  permit ip host 10.0.0.1 any\n",
        "  permit ip host 10.0.0.2 any\n",
    );
    let lines = remediation_lines(Platform::CiscoIos, running, generated);

    // Description replaced idempotently, shutdown swapped, ACL entry and
    // negation of the stale NTP server emitted.
    assert!(lines.contains(&"  description core uplink".to_string()));
    assert!(!lines.iter().any(|l| l.contains("no description")));
    assert!(lines.contains(&"  no shutdown".to_string()));
    assert!(lines.contains(&"no ntp server 10.0.0.5".to_string()));
    assert!(lines.iter().any(|l| l.contains("permit ip host 10.0.0.2 any")));
}

#[test]
fn test_unified_diff_through_workflow() {
    let running = parse(Platform::CiscoIos, "vlan 3\n  name old\n");
    let generated = parse(Platform::CiscoIos, "vlan 3\n  name new\n");
    let workflow = WorkflowRemediation::new(running, generated).unwrap();
    assert_eq!(
        workflow.unified_diff(),
        vec!["vlan 3", "  - name old", "  + name new"]
    );
}
