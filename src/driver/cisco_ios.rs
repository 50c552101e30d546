//! Cisco IOS / IOS-XE rule table.

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::debug;

use crate::matching::MatchRule;
use crate::rules::{
    DriverRules, IdempotentCommandsRule, NegateWithRule, OrderingRule, PerLineSubRule,
    SectionalExitingRule,
};
use crate::tree::{ConfigTree, NodeId};

pub(crate) fn rules() -> DriverRules {
    DriverRules {
        negate_with: vec![NegateWithRule {
            lineage: vec![MatchRule::startswith("logging console ")],
            use_text: "no logging console".to_string(),
        }],
        sectional_exiting: vec![
            SectionalExitingRule {
                lineage: vec![
                    MatchRule::startswith("router bgp"),
                    MatchRule::startswith("template peer-policy"),
                ],
                exit_text: "exit-peer-policy".to_string(),
            },
            SectionalExitingRule {
                lineage: vec![
                    MatchRule::startswith("router bgp"),
                    MatchRule::startswith("template peer-session"),
                ],
                exit_text: "exit-peer-session".to_string(),
            },
            SectionalExitingRule {
                lineage: vec![
                    MatchRule::startswith("router bgp"),
                    MatchRule::startswith("address-family"),
                ],
                exit_text: "exit-address-family".to_string(),
            },
        ],
        ordering: vec![
            OrderingRule {
                lineage: vec![
                    MatchRule::startswith("interface"),
                    MatchRule::startswith("switchport mode "),
                ],
                weight: 490,
            },
            OrderingRule {
                lineage: vec![MatchRule::startswith("no vlan filter")],
                weight: 700,
            },
            OrderingRule {
                lineage: vec![
                    MatchRule::startswith("interface"),
                    MatchRule::startswith("no shutdown"),
                ],
                weight: 700,
            },
            OrderingRule {
                lineage: vec![
                    MatchRule::startswith("aaa group server tacacs+ "),
                    MatchRule::startswith("no server "),
                ],
                weight: 510,
            },
            OrderingRule {
                lineage: vec![MatchRule::startswith("no tacacs-server ")],
                weight: 510,
            },
        ],
        per_line_sub: vec![
            sub("^Building configuration.*", ""),
            sub("^Current configuration.*", ""),
            sub("^! Last configuration change.*", ""),
            sub("^! NVRAM config last updated.*", ""),
            sub("^ntp clock-period .*", ""),
            sub("^version.*", ""),
            sub("^ logging event link-status$", ""),
            sub("^ logging event subif-link-status$", ""),
            sub("^\\s*ipv6 unreachables disable$", ""),
            sub("^end$", ""),
            sub("^\\s*[#!].*", ""),
            sub("^ no ip address", ""),
            sub("^ exit-peer-policy", ""),
            sub("^ exit-peer-session", ""),
            sub("^ exit-address-family", ""),
            sub("^crypto key generate rsa general-keys.*$", ""),
        ],
        idempotent_commands: vec![
            idempotent(vec![
                MatchRule::startswith("vlan"),
                MatchRule::startswith("name"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface "),
                MatchRule::startswith("description "),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface "),
                MatchRule::startswith("ip address "),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface "),
                MatchRule::startswith("switchport mode "),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface "),
                MatchRule::startswith("authentication host-mode "),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface "),
                MatchRule::startswith("authentication event server dead action authorize vlan "),
            ]),
            idempotent(vec![MatchRule::startswith("errdisable recovery interval ")]),
            idempotent(vec![MatchRule::re_search(r"^(no )?logging console.*")]),
        ],
        post_load_callbacks: vec![
            rm_ipv6_acl_sequence_numbers,
            remove_ipv4_acl_remarks,
            add_acl_sequence_numbers,
            rm_10g_interfaces,
        ],
        ..DriverRules::default()
    }
}

fn sub(search: &str, replace: &str) -> PerLineSubRule {
    PerLineSubRule {
        search: search.to_string(),
        replace: replace.to_string(),
    }
}

fn idempotent(lineage: Vec<MatchRule>) -> IdempotentCommandsRule {
    IdempotentCommandsRule { lineage }
}

/// If there are sequence numbers in an IPv6 ACL, remove them.
fn rm_ipv6_acl_sequence_numbers(config: &mut ConfigTree) {
    let mut edits: Vec<(NodeId, String)> = Vec::new();
    for acl in config.root().children() {
        if !acl.text().starts_with("ipv6 access-list ") {
            continue;
        }
        for entry in acl.children() {
            if entry.text().starts_with("sequence") {
                let rest: Vec<&str> = entry.text().split_whitespace().skip(2).collect();
                edits.push((entry.id(), rest.join(" ")));
            }
        }
    }
    for (id, text) in edits {
        config.set_text(id, &text);
    }
}

fn remove_ipv4_acl_remarks(config: &mut ConfigTree) {
    let mut deletions: Vec<NodeId> = Vec::new();
    for acl in config.root().children() {
        if !acl.text().starts_with("ip access-list ") {
            continue;
        }
        for entry in acl.children() {
            if entry.text().starts_with("remark") {
                deletions.push(entry.id());
            }
        }
    }
    for id in deletions {
        config.delete(id);
    }
}

/// Add ACL sequence numbers.
fn add_acl_sequence_numbers(config: &mut ConfigTree) {
    let mut edits: Vec<(NodeId, String)> = Vec::new();
    for acl in config.root().children() {
        if !acl.text().starts_with("ip access-list") {
            continue;
        }
        let mut sequence_number = 10;
        for entry in acl.children() {
            if entry.text().starts_with("permit") || entry.text().starts_with("deny") {
                edits.push((entry.id(), format!("{sequence_number} {}", entry.text())));
                sequence_number += 10;
            }
        }
    }
    for (id, text) in edits {
        config.set_text(id, &text);
    }
}

/// Remove dummy 10g interfaces.
///
/// On 3850s with 4x1g modules, TenGigabitEthernet interfaces appear in the
/// config alongside GigabitEthernet with the same numbering.
fn rm_10g_interfaces(config: &mut ConfigTree) {
    static MODULE_PORTS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^interface (?:Ten)?GigabitEthernet\d/1/[1-4]$").unwrap());
    static SLOT0_PORTS: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"^interface TenGigabitEthernet\d/0/(49|5[0-6])$").unwrap());

    let mut deletions: Vec<NodeId> = Vec::new();
    for interface in config.root().children() {
        if MODULE_PORTS.is_match(interface.text()) {
            match interface.child_count() {
                // An interface with no children is a dummy interface.
                0 => deletions.push(interface.id()),
                // A TenGigabit interface matching a populated Gigabit
                // interface number with 1 child (e.g. shutdown) is a dummy.
                1 if interface.text().contains("TenGigabitEthernet") => {
                    let gigabit_name = interface
                        .text()
                        .replace("TenGigabitEthernet", "GigabitEthernet");
                    if let Some(other) = config.root().child_by_text(&gigabit_name) {
                        if other.child_count() > 0 {
                            deletions.push(interface.id());
                        }
                    }
                }
                _ => {}
            }
        } else if SLOT0_PORTS.is_match(interface.text()) && interface.child_count() == 0 {
            // 10g interfaces can show up in the 0 slot on ports greater
            // than 48 even though they are on a module.
            deletions.push(interface.id());
        }
    }
    for id in deletions {
        debug!(
            interface = %config.node_ref(id).text(),
            "deleting dummy interface"
        );
        config.delete(id);
    }
}
