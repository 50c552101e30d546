//! Arista EOS rule table.

use crate::matching::MatchRule;
use crate::rules::{
    DriverRules, IdempotentCommandsRule, NegationDefaultWhenRule, PerLineSubRule,
    SectionalExitingRule,
};

pub(crate) fn rules() -> DriverRules {
    DriverRules {
        sectional_exiting: vec![
            exiting(
                vec![
                    MatchRule::startswith("router bgp"),
                    MatchRule::startswith("template peer-policy"),
                ],
                "exit-peer-policy",
            ),
            exiting(
                vec![
                    MatchRule::startswith("router bgp"),
                    MatchRule::startswith("template peer-session"),
                ],
                "exit-peer-session",
            ),
            exiting(
                vec![
                    MatchRule::startswith("router bgp"),
                    MatchRule::startswith("address-family"),
                ],
                "exit-address-family",
            ),
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
        ],
        idempotent_commands: vec![
            idempotent(vec![MatchRule::startswith("hostname")]),
            idempotent(vec![MatchRule::startswith("logging source-interface")]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("ip address"),
            ]),
            idempotent(vec![
                MatchRule::startswith("line vty"),
                MatchRule::startswith("transport input"),
            ]),
            idempotent(vec![
                MatchRule::startswith("line vty"),
                MatchRule::startswith("access-class"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::re_search(r"standby \d+ (priority|authentication md5)"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router bgp"),
                MatchRule::startswith("bgp router-id"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router ospf"),
                MatchRule::startswith("router-id"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router ospf"),
                MatchRule::startswith("maximum-paths"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router bgp"),
                MatchRule::re_search(r"neighbor \S+ description"),
            ]),
            idempotent(vec![MatchRule::startswith("snmp-server community")]),
            idempotent(vec![MatchRule::startswith("snmp-server location")]),
            idempotent(vec![
                MatchRule::equals("line con 0"),
                MatchRule::startswith("exec-timeout"),
            ]),
            idempotent(vec![MatchRule::startswith("logging buffered")]),
            idempotent(vec![MatchRule::startswith("tacacs-server key")]),
            idempotent(vec![MatchRule::startswith("logging facility")]),
            idempotent(vec![MatchRule::startswith("vlan internal allocation policy")]),
            idempotent(vec![MatchRule::startswith("username admin")]),
            idempotent(vec![MatchRule::startswith("snmp-server user")]),
            idempotent(vec![MatchRule::startswith("banner")]),
            idempotent(vec![MatchRule::startswith("ntp source")]),
            idempotent(vec![
                MatchRule::startswith("management"),
                MatchRule::startswith("idle-timeout"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("mtu"),
            ]),
        ],
        negation_default_when: vec![NegationDefaultWhenRule {
            lineage: vec![
                MatchRule::startswith("interface"),
                MatchRule::equals("logging event link-status"),
            ],
        }],
        ..DriverRules::default()
    }
}

fn exiting(lineage: Vec<MatchRule>, exit_text: &str) -> SectionalExitingRule {
    SectionalExitingRule {
        lineage,
        exit_text: exit_text.to_string(),
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
