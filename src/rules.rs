//! Driver rule payloads.
//!
//! Every rule couples a lineage (an ordered tuple of [`MatchRule`]s) with a
//! small payload controlling one aspect of comparison: how a command is
//! negated, how sections close, how siblings order, which commands are
//! idempotent, and which text rewrites run at parse time. A
//! [`DriverRules`] aggregate carries one collection per rule kind and is
//! compiled into an immutable [`Driver`](crate::driver::Driver).

use serde::{Deserialize, Serialize};

use crate::matching::MatchRule;
use crate::tree::ConfigTree;

/// Negate matching nodes with a fixed replacement command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegateWithRule {
    /// Lineage selecting the nodes this rule applies to
    pub lineage: Vec<MatchRule>,
    /// Replacement text used as the negation
    #[serde(rename = "use")]
    pub use_text: String,
}

/// Negate matching nodes with `default <command>` instead of a negation
/// prefix swap.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NegationDefaultWhenRule {
    /// Lineage selecting the nodes this rule applies to
    pub lineage: Vec<MatchRule>,
}

/// Closing token for a matched section (e.g. `exit-address-family`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionalExitingRule {
    /// Lineage selecting the section head
    pub lineage: Vec<MatchRule>,
    /// Token emitted to close the section
    pub exit_text: String,
}

/// Replace a section wholesale (negate then re-create) rather than diffing
/// its children.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionalOverwriteRule {
    /// Lineage selecting the section head
    pub lineage: Vec<MatchRule>,
}

/// Replace a section wholesale without negating it first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionalOverwriteNoNegateRule {
    /// Lineage selecting the section head
    pub lineage: Vec<MatchRule>,
}

/// Override the default sibling order weight (500) for matching nodes.
/// Lower weights sort earlier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderingRule {
    /// Lineage selecting the nodes this rule applies to
    pub lineage: Vec<MatchRule>,
    /// Weight assigned to matching nodes
    #[serde(alias = "order", default = "default_order_weight")]
    pub weight: i32,
}

fn default_order_weight() -> i32 {
    500
}

/// Regex rewrite applied line-by-line at parse time. A line rewritten to
/// the empty string is dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PerLineSubRule {
    /// Pattern searched within each line
    pub search: String,
    /// Replacement text
    pub replace: String,
}

/// Regex rewrite applied to the whole input before line splitting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FullTextSubRule {
    /// Pattern searched within the input
    pub search: String,
    /// Replacement text
    pub replace: String,
}

/// Sibling commands matching this lineage are the same command differing
/// only in argument; the newer one supersedes without explicit negation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotentCommandsRule {
    /// Lineage selecting the command family
    pub lineage: Vec<MatchRule>,
}

/// Matching nodes are excluded from idempotent treatment (e.g. list
/// commands that legitimately repeat).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IdempotentCommandsAvoidRule {
    /// Lineage selecting the nodes to exclude
    pub lineage: Vec<MatchRule>,
}

/// Virtual indent increment between matching open/close markers, for
/// grammars whose block bodies are not physically indented.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndentAdjustRule {
    /// Pattern opening the virtual block
    pub start_expression: String,
    /// Pattern closing the virtual block
    pub end_expression: String,
}

/// Parents matching this lineage may hold several children with identical
/// text (e.g. IOS-XR `route-policy` statements).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParentAllowsDuplicateChildRule {
    /// Lineage selecting the parent
    pub lineage: Vec<MatchRule>,
}

/// Where an object of some type may be referenced in the configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferencePattern {
    /// Lineage locating reference contexts
    pub match_rules: Vec<MatchRule>,
    /// Regex extracting the referenced object name
    pub extract_regex: String,
    /// Which capture group holds the object name
    #[serde(default = "default_capture_group")]
    pub capture_group: usize,
    /// Descriptive reference kind (e.g. `interface-applied`)
    pub reference_type: String,
    /// Names matching any of these regexes are not counted as references
    #[serde(default)]
    pub ignore_patterns: Vec<String>,
}

fn default_capture_group() -> usize {
    1
}

/// How to identify and remove one unused object type (ACLs, prefix-lists,
/// route-maps, ...).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnusedObjectRule {
    /// Identifier for the object type (e.g. `ipv4-acl`)
    pub object_type: String,
    /// Lineage locating object definitions
    pub definition_match: Vec<MatchRule>,
    /// Regex extracting the object name from a definition line; when
    /// absent, the second whitespace-separated token is used
    #[serde(default)]
    pub definition_name_regex: Option<String>,
    /// Template for the removal command; `{name}` is substituted
    pub removal_template: String,
    /// Order weight assigned to generated removal commands
    #[serde(default = "default_removal_weight")]
    pub removal_order_weight: i32,
    /// Whether object names compare case-sensitively
    #[serde(default = "default_true")]
    pub case_sensitive: bool,
    /// Reference contexts consulted before declaring an object unused
    pub reference_patterns: Vec<ReferencePattern>,
}

fn default_removal_weight() -> i32 {
    600
}

fn default_true() -> bool {
    true
}

/// Callback invoked on a freshly parsed tree, used for platform cleanup
/// such as ACL sequence numbering.
pub type PostLoadCallback = fn(&mut ConfigTree);

/// The full rule table for one platform, in declarative (uncompiled) form.
///
/// Collections keep declaration order; parse-time substitutions and first-
/// match rule lookups depend on it.
#[derive(Debug, Clone, Default)]
pub struct DriverRules {
    /// Fixed-replacement negations
    pub negate_with: Vec<NegateWithRule>,
    /// `default`-style negations
    pub negation_default_when: Vec<NegationDefaultWhenRule>,
    /// Section closing tokens
    pub sectional_exiting: Vec<SectionalExitingRule>,
    /// Wholesale section replacement (with negation)
    pub sectional_overwrite: Vec<SectionalOverwriteRule>,
    /// Wholesale section replacement (without negation)
    pub sectional_overwrite_no_negate: Vec<SectionalOverwriteNoNegateRule>,
    /// Sibling ordering overrides
    pub ordering: Vec<OrderingRule>,
    /// Parse-time per-line rewrites
    pub per_line_sub: Vec<PerLineSubRule>,
    /// Parse-time whole-input rewrites
    pub full_text_sub: Vec<FullTextSubRule>,
    /// Idempotent command families
    pub idempotent_commands: Vec<IdempotentCommandsRule>,
    /// Exclusions from idempotent treatment
    pub idempotent_commands_avoid: Vec<IdempotentCommandsAvoidRule>,
    /// Virtual indent blocks
    pub indent_adjust: Vec<IndentAdjustRule>,
    /// Parents allowed duplicate children
    pub parent_allows_duplicate_child: Vec<ParentAllowsDuplicateChildRule>,
    /// Unused-object detection rules
    pub unused_object_rules: Vec<UnusedObjectRule>,
    /// Post-parse cleanup callbacks, run in order
    pub post_load_callbacks: Vec<PostLoadCallback>,
}
