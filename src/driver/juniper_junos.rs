//! Juniper Junos rule table.
//!
//! Junos uses the flat `set`/`delete` statement syntax; the parser converts
//! braced configuration blocks to statements first, and negation swaps the
//! statement verb rather than prefixing text. No lineage rules are needed
//! beyond the defaults.

use crate::rules::DriverRules;

pub(crate) fn rules() -> DriverRules {
    DriverRules::default()
}
