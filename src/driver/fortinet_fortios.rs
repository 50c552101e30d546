//! Fortinet FortiOS rule table.
//!
//! FortiOS sections open with `config ...`/`edit ...` and close with
//! `end`/`next`; the closing tokens are stripped at parse time by the
//! post-load callback and re-materialized through the sectional exiting
//! rules. Idempotency additionally matches on the `set <name>` object name
//! (see [`Driver::idempotent_for`](crate::driver::Driver::idempotent_for)).

use crate::matching::MatchRule;
use crate::rules::{DriverRules, ParentAllowsDuplicateChildRule, SectionalExitingRule};
use crate::tree::{ConfigTree, NodeId};

pub(crate) fn rules() -> DriverRules {
    DriverRules {
        sectional_exiting: vec![
            SectionalExitingRule {
                lineage: vec![MatchRule::startswith("config ")],
                exit_text: "end".to_string(),
            },
            SectionalExitingRule {
                lineage: vec![
                    MatchRule::startswith("config "),
                    MatchRule::startswith("edit "),
                ],
                exit_text: "next".to_string(),
            },
        ],
        parent_allows_duplicate_child: vec![ParentAllowsDuplicateChildRule {
            lineage: vec![MatchRule::startswith("end")],
        }],
        post_load_callbacks: vec![strip_block_terminators],
        ..DriverRules::default()
    }
}

/// Remove stray `next`/`end` leaves that survived sectional-exit stripping,
/// normalizing configs whose blocks closed at unexpected depths.
fn strip_block_terminators(config: &mut ConfigTree) {
    let deletions: Vec<NodeId> = config
        .all_children()
        .filter(|node| node.is_leaf() && matches!(node.text(), "next" | "end"))
        .map(|node| node.id())
        .collect();
    for id in deletions {
        config.delete(id);
    }
}
