//! Platform drivers.
//!
//! A [`Driver`] is the immutable rule bundle and behavior hooks for one
//! platform: how comparison, negation, ordering, idempotency, sectional
//! exit, and per-line rewriting behave for that OS. Drivers are built from
//! declarative [`DriverRules`](crate::rules::DriverRules) tables; all
//! regexes compile once at construction, so rule evaluation during
//! remediation never touches the regex parser.
//!
//! Builtin drivers live behind a process-wide registry
//! ([`for_platform`]), initialized on first use and immutable afterwards.
//! Platform behavior differences (FortiOS idempotency, set-syntax
//! negation) are dispatched on the [`Platform`] variant rather than through
//! inheritance.

mod arista_eos;
mod cisco_ios;
mod cisco_nxos;
mod cisco_xr;
mod fortinet_fortios;
mod generic;
mod juniper_junos;
mod vyos;

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{Error, Result};
use crate::matching::{Lineage, MatchMode};
use crate::platform::Platform;
use crate::rules::{DriverRules, PostLoadCallback};
use crate::tree::NodeRef;

/// The grammar family a platform's configuration text uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigSyntax {
    /// Cisco-style indentation-delimited command trees
    Indented,
    /// Juniper-style flat `set`/`delete` statements (braced input is
    /// converted first)
    SetStatements,
}

/// The immutable rule bundle and behavior hooks for a single platform.
#[derive(Debug)]
pub struct Driver {
    platform: Platform,
    syntax: ConfigSyntax,
    indentation: usize,
    negation_prefix: String,
    declaration_prefix: String,
    match_mode: MatchMode,
    rules: CompiledRules,
}

#[derive(Debug, Default)]
struct CompiledRules {
    negate_with: Vec<(Lineage, String)>,
    negation_default_when: Vec<Lineage>,
    sectional_exiting: Vec<(Lineage, String)>,
    sectional_overwrite: Vec<Lineage>,
    sectional_overwrite_no_negate: Vec<Lineage>,
    ordering: Vec<(Lineage, i32)>,
    per_line_sub: Vec<(Regex, String)>,
    full_text_sub: Vec<(Regex, String)>,
    idempotent_commands: Vec<Lineage>,
    idempotent_commands_avoid: Vec<Lineage>,
    indent_adjust: Vec<(Regex, Regex)>,
    parent_allows_duplicate_child: Vec<Lineage>,
    unused_object_rules: Vec<CompiledUnusedObjectRule>,
    post_load_callbacks: Vec<PostLoadCallback>,
}

/// A compiled unused-object detection rule.
#[derive(Debug)]
pub struct CompiledUnusedObjectRule {
    /// Identifier for the object type (e.g. `ipv4-acl`)
    pub object_type: String,
    pub(crate) definition: Lineage,
    pub(crate) definition_name_regex: Option<Regex>,
    pub(crate) removal_template: String,
    pub(crate) removal_order_weight: i32,
    pub(crate) case_sensitive: bool,
    pub(crate) references: Vec<CompiledReferencePattern>,
}

#[derive(Debug)]
pub(crate) struct CompiledReferencePattern {
    pub(crate) context: Lineage,
    pub(crate) extract: Regex,
    pub(crate) capture_group: usize,
    pub(crate) reference_type: String,
    pub(crate) ignore: Vec<Regex>,
}

impl Driver {
    /// Compile a driver from declarative rules, with the platform's default
    /// scalars and floating lineage matching.
    pub fn new(platform: Platform, rules: DriverRules) -> Result<Self> {
        Driver::with_match_mode(platform, rules, MatchMode::Floating)
    }

    /// Compile a driver with an explicit lineage matching mode.
    pub fn with_match_mode(
        platform: Platform,
        rules: DriverRules,
        match_mode: MatchMode,
    ) -> Result<Self> {
        let (syntax, negation_prefix, declaration_prefix) = match platform {
            Platform::JuniperJunos => (ConfigSyntax::SetStatements, "delete ", "set "),
            Platform::Vyos => (ConfigSyntax::Indented, "delete ", "set "),
            Platform::FortinetFortios => (ConfigSyntax::Indented, "unset ", "set "),
            _ => (ConfigSyntax::Indented, "no ", ""),
        };
        Ok(Driver {
            platform,
            syntax,
            indentation: 2,
            negation_prefix: negation_prefix.to_string(),
            declaration_prefix: declaration_prefix.to_string(),
            match_mode,
            rules: CompiledRules::compile(rules)?,
        })
    }

    /// The platform this driver serves.
    pub fn platform(&self) -> Platform {
        self.platform
    }

    /// The grammar family this driver parses and renders.
    pub fn syntax(&self) -> ConfigSyntax {
        self.syntax
    }

    /// Indentation width in columns (default 2).
    pub fn indentation(&self) -> usize {
        self.indentation
    }

    /// Prefix used to negate a command (`"no "`, `"delete "`, `"unset "`).
    pub fn negation_prefix(&self) -> &str {
        &self.negation_prefix
    }

    /// Prefix used to declare a command where the grammar has one
    /// (`"set "`), otherwise empty.
    pub fn declaration_prefix(&self) -> &str {
        &self.declaration_prefix
    }

    /// The lineage matching mode rule checks run under.
    pub fn match_mode(&self) -> MatchMode {
        self.match_mode
    }

    /// Strip the negation prefix from a command, if present.
    pub fn text_without_negation<'t>(&self, text: &'t str) -> &'t str {
        text.strip_prefix(self.negation_prefix.as_str()).unwrap_or(text)
    }

    // ========================================================================
    // Parse-time rewriting
    // ========================================================================

    /// Apply whole-input rewrites in declaration order.
    pub fn apply_full_text_subs(&self, raw: &str) -> String {
        let mut text = raw.to_string();
        for (search, replace) in &self.rules.full_text_sub {
            text = search.replace_all(&text, replace.as_str()).into_owned();
        }
        text
    }

    /// Apply per-line rewrites in declaration order.
    pub fn apply_per_line_subs(&self, line: &str) -> String {
        let mut line = line.to_string();
        for (search, replace) in &self.rules.per_line_sub {
            line = search.replace_all(&line, replace.as_str()).into_owned();
        }
        line
    }

    pub(crate) fn indent_adjust_rules(&self) -> &[(Regex, Regex)] {
        &self.rules.indent_adjust
    }

    pub(crate) fn post_load_callbacks(&self) -> &[PostLoadCallback] {
        &self.rules.post_load_callbacks
    }

    /// The compiled unused-object detection rules.
    pub fn unused_object_rules(&self) -> &[CompiledUnusedObjectRule] {
        &self.rules.unused_object_rules
    }

    // ========================================================================
    // Lineage rule checks (all take a root-to-node path of texts)
    // ========================================================================

    /// Fixed replacement negation for a node, from the first matching
    /// NegateWith rule.
    pub fn negate_with(&self, path: &[&str]) -> Option<&str> {
        self.rules
            .negate_with
            .iter()
            .find(|(lineage, _)| lineage.matches_path(path, self.match_mode))
            .map(|(_, use_text)| use_text.as_str())
    }

    /// Whether a node negates via `default <command>`.
    pub fn negation_default_when(&self, path: &[&str]) -> bool {
        self.matches_any(&self.rules.negation_default_when, path)
    }

    /// The exit token for a section, from the first matching rule. An empty
    /// token suppresses the default `exit`.
    pub fn sectional_exit_rule(&self, path: &[&str]) -> Option<&str> {
        self.rules
            .sectional_exiting
            .iter()
            .find(|(lineage, _)| lineage.matches_path(path, self.match_mode))
            .map(|(_, exit_text)| exit_text.as_str())
    }

    /// Whether a shared section is replaced wholesale (negate + re-create).
    pub fn use_sectional_overwrite(&self, path: &[&str]) -> bool {
        self.matches_any(&self.rules.sectional_overwrite, path)
    }

    /// Whether a shared section is replaced wholesale without negation.
    pub fn use_sectional_overwrite_no_negate(&self, path: &[&str]) -> bool {
        self.matches_any(&self.rules.sectional_overwrite_no_negate, path)
    }

    /// Order weight from the first matching ordering rule.
    pub fn order_weight(&self, path: &[&str]) -> Option<i32> {
        self.rules
            .ordering
            .iter()
            .find(|(lineage, _)| lineage.matches_path(path, self.match_mode))
            .map(|(_, weight)| *weight)
    }

    /// Whether a node is excluded from idempotent treatment.
    pub fn idempotent_avoid(&self, path: &[&str]) -> bool {
        self.matches_any(&self.rules.idempotent_commands_avoid, path)
    }

    /// Whether a parent may hold duplicate-text children.
    pub fn parent_allows_duplicate_child(&self, path: &[&str]) -> bool {
        self.matches_any(&self.rules.parent_allows_duplicate_child, path)
    }

    fn matches_any(&self, lineages: &[Lineage], path: &[&str]) -> bool {
        lineages
            .iter()
            .any(|lineage| lineage.matches_path(path, self.match_mode))
    }

    // ========================================================================
    // Behavior hooks
    // ========================================================================

    /// Find the sibling that `config` supersedes: a command of the same
    /// idempotent family, present among `others` with a different argument.
    ///
    /// FortiOS additionally treats two `set <name> ...` statements with the
    /// same object name as the same command.
    pub fn idempotent_for<'o, I>(&self, config: NodeRef<'_>, others: I) -> Option<NodeRef<'o>>
    where
        I: Iterator<Item = NodeRef<'o>> + Clone,
    {
        if self.platform == Platform::FortinetFortios {
            let declaration = self.declaration_prefix.as_str();
            if let Some(object) = config
                .text()
                .strip_prefix(declaration)
                .and_then(|rest| rest.split_whitespace().next())
            {
                for other in others.clone() {
                    let other_object = other
                        .text()
                        .strip_prefix(declaration)
                        .and_then(|rest| rest.split_whitespace().next());
                    if other_object == Some(object) {
                        return Some(other);
                    }
                }
            }
        }

        let config_path = config.path();
        for lineage in &self.rules.idempotent_commands {
            if lineage.matches_path(&config_path, self.match_mode) {
                for other in others.clone() {
                    if lineage.matches_path(&other.path(), self.match_mode) {
                        return Some(other);
                    }
                }
            }
        }
        None
    }

    /// Swap the negation of a command's text.
    ///
    /// Platforms with a declaration prefix swap between declaration and
    /// negation forms; the rest toggle the negation prefix.
    pub fn swap_negation(&self, text: &str) -> String {
        match self.platform {
            Platform::FortinetFortios => {
                if let Some(rest) = text.strip_prefix(self.negation_prefix.as_str()) {
                    format!("{}{}", self.declaration_prefix, rest)
                } else if let Some(rest) = text.strip_prefix(self.declaration_prefix.as_str()) {
                    // Only the object name survives into the unset form.
                    let object = rest.split_whitespace().next().unwrap_or(rest);
                    format!("{}{}", self.negation_prefix, object)
                } else {
                    format!("{}{}", self.negation_prefix, text)
                }
            }
            Platform::JuniperJunos | Platform::Vyos => {
                if let Some(rest) = text.strip_prefix(self.negation_prefix.as_str()) {
                    format!("{}{}", self.declaration_prefix, rest)
                } else if let Some(rest) = text.strip_prefix(self.declaration_prefix.as_str()) {
                    format!("{}{}", self.negation_prefix, rest)
                } else {
                    format!("{}{}", self.negation_prefix, text)
                }
            }
            _ => match text.strip_prefix(self.negation_prefix.as_str()) {
                Some(rest) => rest.to_string(),
                None => format!("{}{}", self.negation_prefix, text),
            },
        }
    }
}

impl CompiledRules {
    fn compile(rules: DriverRules) -> Result<Self> {
        fn lineages(
            rules: impl IntoIterator<Item = Vec<crate::matching::MatchRule>>,
            context: &str,
        ) -> Result<Vec<Lineage>> {
            rules
                .into_iter()
                .map(|lineage| Lineage::compile(&lineage, context))
                .collect()
        }

        fn subs(
            pairs: impl IntoIterator<Item = (String, String)>,
            context: &str,
        ) -> Result<Vec<(Regex, String)>> {
            pairs
                .into_iter()
                .map(|(search, replace)| {
                    let search = Regex::new(&search)
                        .map_err(|e| Error::bad_pattern(context, &search, &e))?;
                    Ok((search, replace))
                })
                .collect()
        }

        let negate_with = rules
            .negate_with
            .into_iter()
            .map(|rule| {
                let lineage = Lineage::compile(&rule.lineage, "negate_with")?;
                Ok((lineage, rule.use_text))
            })
            .collect::<Result<Vec<_>>>()?;

        let sectional_exiting = rules
            .sectional_exiting
            .into_iter()
            .map(|rule| {
                let lineage = Lineage::compile(&rule.lineage, "sectional_exiting")?;
                Ok((lineage, rule.exit_text))
            })
            .collect::<Result<Vec<_>>>()?;

        let ordering = rules
            .ordering
            .into_iter()
            .map(|rule| {
                let lineage = Lineage::compile(&rule.lineage, "ordering")?;
                Ok((lineage, rule.weight))
            })
            .collect::<Result<Vec<_>>>()?;

        let indent_adjust = rules
            .indent_adjust
            .into_iter()
            .map(|rule| {
                let start = Regex::new(&rule.start_expression).map_err(|e| {
                    Error::bad_pattern("indent_adjust", &rule.start_expression, &e)
                })?;
                let end = Regex::new(&rule.end_expression)
                    .map_err(|e| Error::bad_pattern("indent_adjust", &rule.end_expression, &e))?;
                Ok((start, end))
            })
            .collect::<Result<Vec<_>>>()?;

        let unused_object_rules = rules
            .unused_object_rules
            .into_iter()
            .map(|rule| {
                let definition = Lineage::compile(&rule.definition_match, "unused_object")?;
                let definition_name_regex = match &rule.definition_name_regex {
                    Some(pattern) => Some(
                        Regex::new(pattern)
                            .map_err(|e| Error::bad_pattern("unused_object", pattern, &e))?,
                    ),
                    None => None,
                };
                let references = rule
                    .reference_patterns
                    .into_iter()
                    .map(|pattern| {
                        let context =
                            Lineage::compile(&pattern.match_rules, "unused_object reference")?;
                        let extract = Regex::new(&pattern.extract_regex).map_err(|e| {
                            Error::bad_pattern(
                                "unused_object reference",
                                &pattern.extract_regex,
                                &e,
                            )
                        })?;
                        let ignore = pattern
                            .ignore_patterns
                            .iter()
                            .map(|p| {
                                Regex::new(p).map_err(|e| {
                                    Error::bad_pattern("unused_object ignore", p, &e)
                                })
                            })
                            .collect::<Result<Vec<_>>>()?;
                        Ok(CompiledReferencePattern {
                            context,
                            extract,
                            capture_group: pattern.capture_group,
                            reference_type: pattern.reference_type,
                            ignore,
                        })
                    })
                    .collect::<Result<Vec<_>>>()?;
                Ok(CompiledUnusedObjectRule {
                    object_type: rule.object_type,
                    definition,
                    definition_name_regex,
                    removal_template: rule.removal_template,
                    removal_order_weight: rule.removal_order_weight,
                    case_sensitive: rule.case_sensitive,
                    references,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(CompiledRules {
            negate_with,
            negation_default_when: lineages(
                rules.negation_default_when.into_iter().map(|r| r.lineage),
                "negation_default_when",
            )?,
            sectional_exiting,
            sectional_overwrite: lineages(
                rules.sectional_overwrite.into_iter().map(|r| r.lineage),
                "sectional_overwrite",
            )?,
            sectional_overwrite_no_negate: lineages(
                rules
                    .sectional_overwrite_no_negate
                    .into_iter()
                    .map(|r| r.lineage),
                "sectional_overwrite_no_negate",
            )?,
            ordering,
            per_line_sub: subs(
                rules
                    .per_line_sub
                    .into_iter()
                    .map(|r| (r.search, r.replace)),
                "per_line_sub",
            )?,
            full_text_sub: subs(
                rules
                    .full_text_sub
                    .into_iter()
                    .map(|r| (r.search, r.replace)),
                "full_text_sub",
            )?,
            idempotent_commands: lineages(
                rules.idempotent_commands.into_iter().map(|r| r.lineage),
                "idempotent_commands",
            )?,
            idempotent_commands_avoid: lineages(
                rules
                    .idempotent_commands_avoid
                    .into_iter()
                    .map(|r| r.lineage),
                "idempotent_commands_avoid",
            )?,
            indent_adjust,
            parent_allows_duplicate_child: lineages(
                rules
                    .parent_allows_duplicate_child
                    .into_iter()
                    .map(|r| r.lineage),
                "parent_allows_duplicate_child",
            )?,
            unused_object_rules,
            post_load_callbacks: rules.post_load_callbacks,
        })
    }
}

/// Declarative builtin rule table for a platform.
pub fn builtin_rules(platform: Platform) -> DriverRules {
    match platform {
        Platform::AristaEos => arista_eos::rules(),
        Platform::CiscoIos => cisco_ios::rules(),
        Platform::CiscoNxos => cisco_nxos::rules(),
        Platform::CiscoXr => cisco_xr::rules(),
        Platform::FortinetFortios => fortinet_fortios::rules(),
        Platform::Generic => generic::rules(),
        Platform::JuniperJunos => juniper_junos::rules(),
        Platform::Vyos => vyos::rules(),
    }
}

static REGISTRY: Lazy<HashMap<Platform, Arc<Driver>>> = Lazy::new(|| {
    Platform::ALL
        .iter()
        .map(|&platform| {
            let driver = Driver::new(platform, builtin_rules(platform))
                .expect("builtin driver rule tables are valid");
            (platform, Arc::new(driver))
        })
        .collect()
});

/// The shared builtin driver for a platform.
pub fn for_platform(platform: Platform) -> Arc<Driver> {
    Arc::clone(&REGISTRY[&platform])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_covers_all_platforms() {
        for platform in Platform::ALL {
            assert_eq!(for_platform(platform).platform(), platform);
        }
    }

    #[test]
    fn test_scalar_defaults_per_platform() {
        let ios = for_platform(Platform::CiscoIos);
        assert_eq!(ios.negation_prefix(), "no ");
        assert_eq!(ios.declaration_prefix(), "");
        assert_eq!(ios.indentation(), 2);
        assert_eq!(ios.syntax(), ConfigSyntax::Indented);

        let junos = for_platform(Platform::JuniperJunos);
        assert_eq!(junos.negation_prefix(), "delete ");
        assert_eq!(junos.syntax(), ConfigSyntax::SetStatements);
    }

    #[test]
    fn test_swap_negation_default() {
        let ios = for_platform(Platform::CiscoIos);
        assert_eq!(ios.swap_negation("shutdown"), "no shutdown");
        assert_eq!(ios.swap_negation("no shutdown"), "shutdown");
    }

    #[test]
    fn test_swap_negation_set_style() {
        let vyos = for_platform(Platform::Vyos);
        assert_eq!(
            vyos.swap_negation("set system host-name r1"),
            "delete system host-name r1"
        );
        assert_eq!(
            vyos.swap_negation("delete system host-name r1"),
            "set system host-name r1"
        );

        let fortios = for_platform(Platform::FortinetFortios);
        assert_eq!(fortios.swap_negation("set status enable"), "unset status");
        assert_eq!(fortios.swap_negation("unset status"), "set status");
    }

    #[test]
    fn test_invalid_pattern_is_fatal_at_construction() {
        let mut rules = DriverRules::default();
        rules.per_line_sub.push(crate::rules::PerLineSubRule {
            search: "(unclosed".to_string(),
            replace: String::new(),
        });
        assert!(matches!(
            Driver::new(Platform::Generic, rules),
            Err(Error::InvalidRule(_))
        ));
    }

    #[test]
    fn test_ios_negate_with_rule() {
        let ios = for_platform(Platform::CiscoIos);
        assert_eq!(
            ios.negate_with(&["logging console debugging"]),
            Some("no logging console")
        );
        assert_eq!(ios.negate_with(&["logging buffered 64000"]), None);
    }
}
