//! Default rule table for unknown platforms: indentation-only parsing with
//! `no `-prefix negation and no platform quirks.

use crate::rules::DriverRules;

pub(crate) fn rules() -> DriverRules {
    DriverRules::default()
}
