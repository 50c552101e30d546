//! File and YAML loaders.
//!
//! The engine itself never touches the filesystem; these helpers sit above
//! it for callers that keep configs, tag rules, and legacy (v2) option
//! files on disk. v2 option files overlay extra rules onto a platform's
//! builtin driver; v2 tag files (`lineage:`/`add_tags:`) deserialize
//! directly into [`TagRule`]s.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;

use crate::driver::{builtin_rules, Driver};
use crate::error::Result;
use crate::matching::MatchRule;
use crate::platform::Platform;
use crate::rules::{
    FullTextSubRule, IdempotentCommandsAvoidRule, IdempotentCommandsRule, IndentAdjustRule,
    NegateWithRule, NegationDefaultWhenRule, OrderingRule, ParentAllowsDuplicateChildRule,
    PerLineSubRule, SectionalExitingRule, SectionalOverwriteNoNegateRule, SectionalOverwriteRule,
};
use crate::tags::TagRule;

/// Read a configuration file into memory.
pub fn read_config_file(path: impl AsRef<Path>) -> Result<String> {
    Ok(std::fs::read_to_string(path)?)
}

/// Load and validate tag rules from YAML text.
pub fn load_tag_rules(yaml: &str) -> Result<Vec<TagRule>> {
    Ok(serde_yaml::from_str(yaml)?)
}

/// Load and validate tag rules from a YAML file.
pub fn load_tag_rules_from_file(path: impl AsRef<Path>) -> Result<Vec<TagRule>> {
    load_tag_rules(&read_config_file(path)?)
}

/// A legacy v2 options document.
///
/// Unknown keys (e.g. `style`) are ignored, matching the permissiveness of
/// the v2 loader.
#[derive(Debug, Clone, Default, Deserialize)]
struct V2Options {
    #[serde(default)]
    sectional_overwrite: Vec<LineageRule>,
    #[serde(default)]
    sectional_overwrite_no_negate: Vec<LineageRule>,
    #[serde(default)]
    ordering: Vec<OrderingRule>,
    #[serde(default)]
    indent_adjust: Vec<IndentAdjustRule>,
    #[serde(default)]
    parent_allows_duplicate_child: Vec<LineageRule>,
    #[serde(default)]
    sectional_exiting: Vec<SectionalExitingRule>,
    #[serde(default)]
    full_text_sub: Vec<FullTextSubRule>,
    #[serde(default)]
    per_line_sub: Vec<PerLineSubRule>,
    #[serde(default, alias = "idempotent_commands_blacklist")]
    idempotent_commands_avoid: Vec<LineageRule>,
    #[serde(default)]
    idempotent_commands: Vec<LineageRule>,
    #[serde(default)]
    negation_default_when: Vec<LineageRule>,
    #[serde(default, alias = "negation_negate_with")]
    negate_with: Vec<NegateWithRule>,
}

#[derive(Debug, Clone, Deserialize)]
struct LineageRule {
    lineage: Vec<MatchRule>,
}

/// Build a driver from a platform's builtin rules overlaid with a v2
/// options document.
pub fn load_v2_options(yaml: &str, platform: Platform) -> Result<Arc<Driver>> {
    let options: V2Options = serde_yaml::from_str(yaml)?;
    let mut rules = builtin_rules(platform);

    rules.sectional_overwrite.extend(
        options
            .sectional_overwrite
            .into_iter()
            .map(|r| SectionalOverwriteRule { lineage: r.lineage }),
    );
    rules.sectional_overwrite_no_negate.extend(
        options
            .sectional_overwrite_no_negate
            .into_iter()
            .map(|r| SectionalOverwriteNoNegateRule { lineage: r.lineage }),
    );
    rules.ordering.extend(options.ordering);
    rules.indent_adjust.extend(options.indent_adjust);
    rules.parent_allows_duplicate_child.extend(
        options
            .parent_allows_duplicate_child
            .into_iter()
            .map(|r| ParentAllowsDuplicateChildRule { lineage: r.lineage }),
    );
    rules.sectional_exiting.extend(options.sectional_exiting);
    rules.full_text_sub.extend(options.full_text_sub);
    rules.per_line_sub.extend(options.per_line_sub);
    rules.idempotent_commands_avoid.extend(
        options
            .idempotent_commands_avoid
            .into_iter()
            .map(|r| IdempotentCommandsAvoidRule { lineage: r.lineage }),
    );
    rules.idempotent_commands.extend(
        options
            .idempotent_commands
            .into_iter()
            .map(|r| IdempotentCommandsRule { lineage: r.lineage }),
    );
    rules.negation_default_when.extend(
        options
            .negation_default_when
            .into_iter()
            .map(|r| NegationDefaultWhenRule { lineage: r.lineage }),
    );
    rules.negate_with.extend(options.negate_with);

    Ok(Arc::new(Driver::new(platform, rules)?))
}

/// Build a driver from a platform's builtin rules overlaid with a v2
/// options file.
pub fn load_v2_options_from_file(
    path: impl AsRef<Path>,
    platform: Platform,
) -> Result<Arc<Driver>> {
    load_v2_options(&read_config_file(path)?, platform)
}
