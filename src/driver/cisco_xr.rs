//! Cisco IOS-XR rule table.

use crate::matching::MatchRule;
use crate::rules::{
    DriverRules, IdempotentCommandsRule, IndentAdjustRule, OrderingRule,
    ParentAllowsDuplicateChildRule, PerLineSubRule, SectionalExitingRule,
    SectionalOverwriteNoNegateRule, SectionalOverwriteRule,
};

pub(crate) fn rules() -> DriverRules {
    DriverRules {
        sectional_exiting: vec![
            exiting(vec![MatchRule::startswith("route-policy")], "end-policy"),
            exiting(vec![MatchRule::startswith("prefix-set")], "end-set"),
            exiting(vec![MatchRule::startswith("policy-map")], "end-policy-map"),
            exiting(vec![MatchRule::startswith("class-map")], "end-class-map"),
            exiting(vec![MatchRule::startswith("community-set")], "end-set"),
            exiting(vec![MatchRule::startswith("extcommunity-set")], "end-set"),
            exiting(vec![MatchRule::startswith("template")], "end-template"),
            exiting(vec![MatchRule::startswith("interface")], "root"),
            exiting(vec![MatchRule::startswith("router bgp")], "root"),
        ],
        sectional_overwrite: vec![SectionalOverwriteRule {
            lineage: vec![MatchRule::startswith("template")],
        }],
        sectional_overwrite_no_negate: vec![
            no_negate(vec![MatchRule::startswith("as-path-set")]),
            no_negate(vec![MatchRule::startswith("prefix-set")]),
            no_negate(vec![MatchRule::startswith("route-policy")]),
            no_negate(vec![MatchRule::startswith("extcommunity-set")]),
            no_negate(vec![MatchRule::startswith("community-set")]),
        ],
        ordering: vec![
            OrderingRule {
                lineage: vec![MatchRule::startswith("vrf ")],
                weight: 300,
            },
            OrderingRule {
                lineage: vec![MatchRule::startswith("no vrf ")],
                weight: 700,
            },
        ],
        indent_adjust: vec![IndentAdjustRule {
            start_expression: "^\\s*template".to_string(),
            end_expression: "^\\s*end-template".to_string(),
        }],
        parent_allows_duplicate_child: vec![ParentAllowsDuplicateChildRule {
            lineage: vec![MatchRule::startswith("route-policy")],
        }],
        per_line_sub: vec![
            sub("^Building configuration.*", ""),
            sub("^Current configuration.*", ""),
            sub("^ntp clock-period .*", ""),
            sub(".*speed.*", ""),
            sub(".*duplex.*", ""),
            sub(".*negotiation auto.*", ""),
            sub(".*parity none.*", ""),
            sub("^end-policy$", " end-policy"),
            sub("^end-set$", " end-set"),
            sub("^end$", ""),
            sub("^\\s*[#!].*", ""),
        ],
        idempotent_commands: vec![
            idempotent(vec![
                MatchRule::startswith("router bgp"),
                MatchRule::startswith("vrf"),
                MatchRule::startswith("address-family"),
                MatchRule::startswith("additional-paths selection route-policy"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router bgp"),
                MatchRule::startswith("bgp router-id"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router bgp"),
                MatchRule::startswith("neighbor-group"),
                MatchRule::startswith("address-family"),
                MatchRule::startswith("soft-reconfiguration inbound"),
            ]),
            idempotent(vec![
                MatchRule::startswith("router ospf"),
                MatchRule::startswith("router-id"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("description"),
            ]),
            idempotent(vec![
                MatchRule::startswith("interface"),
                MatchRule::startswith("ipv4 address"),
            ]),
            idempotent(vec![MatchRule::startswith("hostname ")]),
            idempotent(vec![MatchRule::startswith("logging source-interface")]),
            idempotent(vec![MatchRule::startswith("snmp-server community")]),
            idempotent(vec![MatchRule::startswith("snmp-server location")]),
            idempotent(vec![MatchRule::re_search(r"^(no )?logging console.*")]),
        ],
        ..DriverRules::default()
    }
}

fn exiting(lineage: Vec<MatchRule>, exit_text: &str) -> SectionalExitingRule {
    SectionalExitingRule {
        lineage,
        exit_text: exit_text.to_string(),
    }
}

fn no_negate(lineage: Vec<MatchRule>) -> SectionalOverwriteNoNegateRule {
    SectionalOverwriteNoNegateRule { lineage }
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
