//! VyOS rule table.
//!
//! VyOS configs load as flat `set ...` command lines at the root; negation
//! swaps `set` for `delete` at the statement level. No lineage rules are
//! needed beyond the defaults.

use crate::rules::DriverRules;

pub(crate) fn rules() -> DriverRules {
    DriverRules::default()
}
