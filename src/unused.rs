//! Unused-object analysis.
//!
//! Network configurations accumulate objects (ACLs, prefix-lists,
//! route-maps) that are defined but no longer referenced anywhere. The
//! driver's unused-object rules describe where each object type is defined,
//! where it may be referenced, and how to remove it; the analysis walks the
//! tree once per rule and produces removal commands for the orphans.
//!
//! Builtin drivers ship without unused-object rules; callers supply them by
//! building a custom [`Driver`](crate::driver::Driver) with
//! [`UnusedObjectRule`](crate::rules::UnusedObjectRule)s in its table.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::driver::CompiledUnusedObjectRule;
use crate::error::Result;
use crate::tree::{ConfigTree, NodeId, NodeRef};

/// A discovered object definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedObjectDefinition {
    /// Type of the object (e.g. `ipv4-acl`)
    pub object_type: String,
    /// Name of the object
    pub name: String,
    /// Root-to-definition path
    pub definition_location: Vec<String>,
}

/// A discovered reference to an object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedObjectReference {
    /// Type of the object being referenced
    pub object_type: String,
    /// Name of the referenced object
    pub name: String,
    /// Root-to-reference path
    pub reference_location: Vec<String>,
    /// Reference kind, from the matching pattern
    pub reference_type: String,
}

/// Results of an unused-object analysis.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnusedObjectAnalysis {
    /// Every definition found, per rule order
    pub defined_objects: Vec<UnusedObjectDefinition>,
    /// Every reference found, per rule order
    pub referenced_objects: Vec<UnusedObjectReference>,
    /// Definitions with no surviving reference
    pub unused_objects: Vec<UnusedObjectDefinition>,
    /// Commands removing the unused definitions
    pub removal_commands: Vec<String>,
}

impl ConfigTree {
    /// Analyze this config against the driver's unused-object rules.
    pub fn analyze_unused_objects(&self) -> UnusedObjectAnalysis {
        let mut analysis = UnusedObjectAnalysis::default();
        let driver = Arc::clone(self.driver());

        for rule in driver.unused_object_rules() {
            let definitions = find_definitions(self, rule);
            let references = find_references(self, rule);

            let referenced_names: BTreeSet<String> = references
                .iter()
                .map(|r| normalize(&r.name, rule.case_sensitive))
                .collect();
            let unused: Vec<UnusedObjectDefinition> = definitions
                .iter()
                .filter(|d| !referenced_names.contains(&normalize(&d.name, rule.case_sensitive)))
                .cloned()
                .collect();

            debug!(
                object_type = rule.object_type.as_str(),
                defined = definitions.len(),
                unused = unused.len(),
                "analyzed object usage"
            );

            analysis
                .removal_commands
                .extend(unused.iter().map(|d| removal_command(d, rule)));
            analysis.defined_objects.extend(definitions);
            analysis.referenced_objects.extend(references);
            analysis.unused_objects.extend(unused);
        }
        analysis
    }

    /// Build a removal config for this config's unused objects, ordered by
    /// each rule's removal weight.
    pub fn unused_object_removal_config(&self) -> Result<ConfigTree> {
        let driver = Arc::clone(self.driver());
        let mut removal = ConfigTree::new(Arc::clone(self.driver()));

        for rule in driver.unused_object_rules() {
            let definitions = find_definitions(self, rule);
            let references = find_references(self, rule);
            let referenced_names: BTreeSet<String> = references
                .iter()
                .map(|r| normalize(&r.name, rule.case_sensitive))
                .collect();

            for definition in definitions {
                if referenced_names.contains(&normalize(&definition.name, rule.case_sensitive)) {
                    continue;
                }
                let command = removal_command(&definition, rule);
                let id = removal.add_child_if_absent(NodeId::ROOT, &command)?;
                removal.set_order_weight(id, rule.removal_order_weight);
            }
        }
        Ok(removal)
    }
}

fn normalize(name: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        name.to_string()
    } else {
        name.to_lowercase()
    }
}

fn removal_command(definition: &UnusedObjectDefinition, rule: &CompiledUnusedObjectRule) -> String {
    rule.removal_template.replace("{name}", &definition.name)
}

fn find_definitions(
    config: &ConfigTree,
    rule: &CompiledUnusedObjectRule,
) -> Vec<UnusedObjectDefinition> {
    let mode = config.driver().match_mode();
    let mut definitions = Vec::new();
    for node in config.all_children() {
        if !node.is_lineage_match(&rule.definition, mode) {
            continue;
        }
        if let Some(name) = definition_name(node, rule) {
            definitions.push(UnusedObjectDefinition {
                object_type: rule.object_type.clone(),
                name,
                definition_location: node.path().iter().map(|s| s.to_string()).collect(),
            });
        }
    }
    definitions
}

/// The object name from a definition line: an explicit capture when the
/// rule carries a name regex, else the second whitespace token.
fn definition_name(node: NodeRef<'_>, rule: &CompiledUnusedObjectRule) -> Option<String> {
    if let Some(regex) = &rule.definition_name_regex {
        return regex
            .captures(node.text())
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_string());
    }
    node.text().split_whitespace().nth(1).map(str::to_string)
}

fn find_references(
    config: &ConfigTree,
    rule: &CompiledUnusedObjectRule,
) -> Vec<UnusedObjectReference> {
    let mode = config.driver().match_mode();
    let mut references = Vec::new();
    for pattern in &rule.references {
        for node in config.all_children() {
            if !node.is_lineage_match(&pattern.context, mode) {
                continue;
            }
            let Some(captures) = pattern.extract.captures(node.text()) else {
                continue;
            };
            let Some(name) = captures.get(pattern.capture_group) else {
                continue;
            };
            let name = name.as_str();
            if pattern.ignore.iter().any(|re| re.is_match(name)) {
                continue;
            }
            references.push(UnusedObjectReference {
                object_type: rule.object_type.clone(),
                name: name.to_string(),
                reference_location: node.path().iter().map(|s| s.to_string()).collect(),
                reference_type: pattern.reference_type.clone(),
            });
        }
    }
    references
}
