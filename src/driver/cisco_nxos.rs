//! Cisco NX-OS rule table.

use crate::matching::MatchRule;
use crate::rules::{
    DriverRules, IdempotentCommandsAvoidRule, IdempotentCommandsRule, NegateWithRule,
    NegationDefaultWhenRule, PerLineSubRule,
};

pub(crate) fn rules() -> DriverRules {
    DriverRules {
        per_line_sub: vec![
            sub("^Building configuration.*", ""),
            sub("^Current configuration.*", ""),
            sub("^ntp clock-period .*", ""),
            sub("^snmp-server location  ", "snmp-server location "),
            sub("^version.*", ""),
            sub("^boot (system|kickstart) .*", ""),
            sub("!.*", ""),
        ],
        idempotent_commands_avoid: vec![IdempotentCommandsAvoidRule {
            lineage: vec![
                MatchRule::startswith("interface"),
                MatchRule::re_search("ip address.*secondary"),
            ],
        }],
        idempotent_commands: vec![
            idempotent(vec![MatchRule::startswith("power redundancy-mode")]),
            idempotent(vec![MatchRule::startswith("cli alias name wr ")]),
            idempotent(vec![MatchRule::startswith("aaa authentication login console")]),
            idempotent(vec![MatchRule::startswith("port-channel load-balance")]),
            idempotent(vec![MatchRule::startswith("hostname ")]),
            idempotent(vec![MatchRule::startswith("ip tftp source-interface")]),
            idempotent(vec![MatchRule::startswith("ip telnet source-interface")]),
            idempotent(vec![MatchRule::startswith("ip tacacs source-interface")]),
            idempotent(vec![MatchRule::startswith("logging source-interface")]),
            idempotent(vec![
                MatchRule::startswith("hardware access-list tcam region ifacl"),
            ]),
            idempotent(vec![
                MatchRule::startswith("hardware access-list tcam region vacl"),
            ]),
            idempotent(vec![
                MatchRule::startswith("hardware access-list tcam region qos"),
            ]),
            idempotent(vec![
                MatchRule::startswith("hardware access-list tcam region racl"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router ospf"),
                MatchRule::startswith("vrf"),
                MatchRule::startswith("maximum-paths"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router ospf"),
                MatchRule::startswith("maximum-paths"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router ospf"),
                MatchRule::startswith("log-adjacency-changes"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router bgp"),
                MatchRule::startswith("address-family"),
                MatchRule::startswith("maximum-paths"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router bgp"),
                MatchRule::startswith("template"),
                MatchRule::startswith("address-family"),
                MatchRule::startswith("send-community"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::re_search(r"^hsrp \d+"),
                MatchRule::startswith("priority"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::re_search(r"^hsrp \d+"),
                MatchRule::startswith("authentication md5 key-string"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("ip address"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("duplex"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("speed"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("switchport mode"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("switchport access vlan"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("switchport trunk native vlan"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("switchport trunk allowed vlan"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("udld port"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("ip ospf cost"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("ipv6 link-local"),
            ]),
            idempotent(vec![
                MatchRule::startswith("vlan"),
                MatchRule::startswith("name"),
            ]),
        ],
        negation_default_when: vec![
            NegationDefaultWhenRule {
                lineage: vec![
                    MatchRule::startswith("router bgp"),
                    MatchRule::startswith("neighbor"),
                    MatchRule::startswith("address-family"),
                    MatchRule::equals("send-community"),
                ],
            },
            NegationDefaultWhenRule {
                lineage: vec![
                    MatchRule::startswith("interface"),
                    MatchRule::contains("ip ospf passive-interface"),
                ],
            },
            NegationDefaultWhenRule {
                lineage: vec![
                    MatchRule::startswith("interface"),
                    MatchRule::contains("ospfv3 passive-interface"),
                ],
            },
        ],
        negate_with: vec![
            NegateWithRule {
                lineage: vec![
                    MatchRule::startswith("router bgp"),
                    MatchRule::startswith("address-family"),
                    MatchRule::startswith("maximum-paths ibgp"),
                ],
                use_text: "default maximum-paths ibgp".to_string(),
            },
            NegateWithRule {
                lineage: vec![
                    MatchRule::startswith("router bgp"),
                    MatchRule::startswith("vrf"),
                    MatchRule::startswith("address-family"),
                    MatchRule::startswith("maximum-paths ibgp"),
                ],
                use_text: "default maximum-paths ibgp".to_string(),
            },
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
