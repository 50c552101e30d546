//! Line and lineage matching.
//!
//! A [`MatchRule`] is a declarative predicate over a single line of
//! configuration text. An ordered sequence of match rules (a *lineage*)
//! matches a node by testing the node's root-to-self path. Rules are
//! evaluated constantly during remediation, so drivers compile them once
//! into [`LineMatcher`]s with prebuilt regexes.
//!
//! Two lineage modes exist:
//! - [`MatchMode::Floating`] (default): the final rule must match the node
//!   itself; earlier rules must match some strictly increasing subsequence
//!   of the node's ancestors.
//! - [`MatchMode::Strict`]: the rule count must equal the node's depth and
//!   rules pair off against the whole root-to-node path.

use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// A match expression: a single string or a set of alternatives.
///
/// Any alternative matching counts as a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Expression {
    /// A single candidate string
    One(String),
    /// Any-of alternatives
    Any(Vec<String>),
}

impl Expression {
    fn test(&self, text: &str, op: impl Fn(&str, &str) -> bool) -> bool {
        match self {
            Expression::One(e) => op(text, e),
            Expression::Any(alternatives) => alternatives.iter().any(|e| op(text, e)),
        }
    }
}

impl From<&str> for Expression {
    fn from(value: &str) -> Self {
        Expression::One(value.to_string())
    }
}

impl From<String> for Expression {
    fn from(value: String) -> Self {
        Expression::One(value)
    }
}

/// A declarative predicate over one line of configuration text.
///
/// Absent fields are unconstrained; all present fields must match. Each text
/// field accepts either a single string or a list of alternatives.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MatchRule {
    /// Exact text equality
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equals: Option<Expression>,
    /// Text prefix test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub startswith: Option<Expression>,
    /// Text suffix test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endswith: Option<Expression>,
    /// Substring test
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contains: Option<Expression>,
    /// Regex search; comparatively slow, compiled once at driver construction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub re_search: Option<String>,
}

impl MatchRule {
    /// Rule matching on exact text.
    pub fn equals(text: impl Into<Expression>) -> Self {
        MatchRule {
            equals: Some(text.into()),
            ..MatchRule::default()
        }
    }

    /// Rule matching on a text prefix.
    pub fn startswith(prefix: impl Into<Expression>) -> Self {
        MatchRule {
            startswith: Some(prefix.into()),
            ..MatchRule::default()
        }
    }

    /// Rule matching on any of several text prefixes.
    pub fn startswith_any<I, S>(prefixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        MatchRule {
            startswith: Some(Expression::Any(
                prefixes.into_iter().map(Into::into).collect(),
            )),
            ..MatchRule::default()
        }
    }

    /// Rule matching on a text suffix.
    pub fn endswith(suffix: impl Into<Expression>) -> Self {
        MatchRule {
            endswith: Some(suffix.into()),
            ..MatchRule::default()
        }
    }

    /// Rule matching on a substring.
    pub fn contains(fragment: impl Into<Expression>) -> Self {
        MatchRule {
            contains: Some(fragment.into()),
            ..MatchRule::default()
        }
    }

    /// Rule matching on a regex search.
    pub fn re_search(pattern: impl Into<String>) -> Self {
        MatchRule {
            re_search: Some(pattern.into()),
            ..MatchRule::default()
        }
    }

    /// True when no field constrains the match.
    pub fn is_unconstrained(&self) -> bool {
        self.equals.is_none()
            && self.startswith.is_none()
            && self.endswith.is_none()
            && self.contains.is_none()
            && self.re_search.is_none()
    }

    /// Compile into a reusable predicate, validating the regex.
    pub fn compile(&self) -> Result<LineMatcher> {
        LineMatcher::compile(self, "match rule")
    }
}

/// How a lineage of rules is laid against a node's root-to-self path.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// Any-ancestor-subsequence ending at the node (the default)
    #[default]
    Floating,
    /// Rule count equals node depth; rules pair off over the whole path
    Strict,
}

/// A compiled [`MatchRule`].
#[derive(Debug, Clone)]
pub struct LineMatcher {
    equals: Option<Expression>,
    startswith: Option<Expression>,
    endswith: Option<Expression>,
    contains: Option<Expression>,
    re_search: Option<Regex>,
}

impl LineMatcher {
    pub(crate) fn compile(rule: &MatchRule, context: &str) -> Result<Self> {
        let re_search = match &rule.re_search {
            Some(pattern) => Some(
                Regex::new(pattern).map_err(|e| Error::bad_pattern(context, pattern, &e))?,
            ),
            None => None,
        };
        Ok(LineMatcher {
            equals: rule.equals.clone(),
            startswith: rule.startswith.clone(),
            endswith: rule.endswith.clone(),
            contains: rule.contains.clone(),
            re_search,
        })
    }

    /// Test a single line of text against all present fields.
    pub fn matches(&self, text: &str) -> bool {
        if let Some(equals) = &self.equals {
            if !equals.test(text, |t, e| t == e) {
                return false;
            }
        }
        if let Some(startswith) = &self.startswith {
            if !startswith.test(text, |t, e| t.starts_with(e)) {
                return false;
            }
        }
        if let Some(re) = &self.re_search {
            if !re.is_match(text) {
                return false;
            }
        }
        // The below filters are less commonly used
        if let Some(endswith) = &self.endswith {
            if !endswith.test(text, |t, e| t.ends_with(e)) {
                return false;
            }
        }
        if let Some(contains) = &self.contains {
            if !contains.test(text, |t, e| t.contains(e)) {
                return false;
            }
        }
        true
    }
}

/// An ordered, compiled lineage of match rules.
#[derive(Debug, Clone)]
pub struct Lineage {
    rules: Vec<LineMatcher>,
}

impl Lineage {
    /// Compile a lineage, rejecting empty rule sequences.
    pub fn compile(rules: &[MatchRule], context: &str) -> Result<Self> {
        if rules.is_empty() {
            return Err(Error::InvalidRule(format!("{context}: empty lineage")));
        }
        let rules = rules
            .iter()
            .map(|rule| LineMatcher::compile(rule, context))
            .collect::<Result<Vec<_>>>()?;
        Ok(Lineage { rules })
    }

    /// Number of rules in the lineage.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True when the lineage holds no rules. Unreachable for compiled
    /// lineages; present for completeness.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// The leaf-most rule, which always anchors at the node itself.
    pub(crate) fn last_rule(&self) -> &LineMatcher {
        self.rules
            .last()
            .unwrap_or_else(|| unreachable!("compiled lineages are non-empty"))
    }

    /// Test the lineage against a root-to-node path of line texts.
    ///
    /// The last path element is the node's own text.
    pub fn matches_path(&self, path: &[&str], mode: MatchMode) -> bool {
        let Some((&node_text, ancestors)) = path.split_last() else {
            return false;
        };
        match mode {
            MatchMode::Floating => {
                if !self.last_rule().matches(node_text) {
                    return false;
                }
                // Walk remaining rules backward over the ancestors; greedy
                // backward assignment preserves the strictly increasing
                // subsequence requirement.
                let mut remaining = self.rules[..self.rules.len() - 1].iter().rev();
                let mut rule = match remaining.next() {
                    Some(rule) => rule,
                    None => return true,
                };
                for &ancestor in ancestors.iter().rev() {
                    if rule.matches(ancestor) {
                        rule = match remaining.next() {
                            Some(next) => next,
                            None => return true,
                        };
                    }
                }
                false
            }
            MatchMode::Strict => {
                self.rules.len() == path.len()
                    && self
                        .rules
                        .iter()
                        .zip(path)
                        .all(|(rule, text)| rule.matches(text))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn path<'a>(texts: &'a [&'a str]) -> &'a [&'a str] {
        texts
    }

    #[test]
    fn test_equals_single_and_set() {
        let single = MatchRule::equals("ntp server 10.0.0.1").compile().unwrap();
        assert!(single.matches("ntp server 10.0.0.1"));
        assert!(!single.matches("ntp server 10.0.0.2"));

        let any = MatchRule::equals(Expression::Any(vec![
            "a".to_string(),
            "b".to_string(),
        ]))
        .compile()
        .unwrap();
        assert!(any.matches("b"));
        assert!(!any.matches("c"));
    }

    #[test]
    fn test_startswith_alternatives() {
        let rule = MatchRule::startswith_any(["description ", "ip address "])
            .compile()
            .unwrap();
        assert!(rule.matches("description uplink"));
        assert!(rule.matches("ip address 10.0.0.1/24"));
        assert!(!rule.matches("shutdown"));
    }

    #[test]
    fn test_all_present_fields_must_match() {
        let rule = MatchRule {
            startswith: Some("logging".into()),
            contains: Some("console".into()),
            ..MatchRule::default()
        }
        .compile()
        .unwrap();
        assert!(rule.matches("logging console debugging"));
        assert!(!rule.matches("logging monitor debugging"));
    }

    #[test]
    fn test_re_search_is_validated() {
        assert!(MatchRule::re_search(r"^(no )?logging").compile().is_ok());
        assert!(matches!(
            MatchRule::re_search("(unclosed").compile(),
            Err(Error::InvalidRule(_))
        ));
    }

    #[test]
    fn test_empty_lineage_rejected() {
        assert!(matches!(
            Lineage::compile(&[], "test"),
            Err(Error::InvalidRule(_))
        ));
    }

    #[test]
    fn test_floating_matches_subsequence() {
        let lineage = Lineage::compile(
            &[
                MatchRule::startswith("router bgp"),
                MatchRule::startswith("address-family"),
            ],
            "test",
        )
        .unwrap();

        // Adjacent ancestors
        assert!(lineage.matches_path(
            path(&["router bgp 65000", "address-family ipv4"]),
            MatchMode::Floating,
        ));
        // A gap between matched ancestors is allowed when floating
        assert!(lineage.matches_path(
            path(&["router bgp 65000", "vrf blue", "address-family ipv4"]),
            MatchMode::Floating,
        ));
        // The final rule must match the node itself
        assert!(!lineage.matches_path(
            path(&["router bgp 65000", "address-family ipv4", "maximum-paths 4"]),
            MatchMode::Floating,
        ));
    }

    #[test]
    fn test_strict_requires_full_path_pairing() {
        let lineage = Lineage::compile(
            &[
                MatchRule::startswith("router bgp"),
                MatchRule::startswith("address-family"),
            ],
            "test",
        )
        .unwrap();

        assert!(lineage.matches_path(
            path(&["router bgp 65000", "address-family ipv4"]),
            MatchMode::Strict,
        ));
        // Gaps are not allowed in strict mode
        assert!(!lineage.matches_path(
            path(&["router bgp 65000", "vrf blue", "address-family ipv4"]),
            MatchMode::Strict,
        ));
    }

    #[test]
    fn test_single_rule_lineage_ignores_ancestors_when_floating() {
        let lineage = Lineage::compile(&[MatchRule::startswith("shutdown")], "test").unwrap();
        assert!(lineage.matches_path(
            path(&["interface Vlan2", "shutdown"]),
            MatchMode::Floating
        ));
        assert!(!lineage.matches_path(
            path(&["interface Vlan2", "shutdown"]),
            MatchMode::Strict
        ));
    }

    #[test]
    fn test_yaml_round_trip() {
        let yaml = "startswith: [ntp, 'no ntp']\n";
        let rule: MatchRule = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(
            rule.startswith,
            Some(Expression::Any(vec!["ntp".into(), "no ntp".into()]))
        );
    }
}
