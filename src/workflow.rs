//! Remediation workflow for a single device.
//!
//! [`WorkflowRemediation`] pairs a running and a generated config and
//! lazily derives the remediation (running → generated) and rollback
//! (generated → running) configs, caching both. Tag rules can be applied
//! to the remediation afterwards to slice it into reviewable change sets.

use std::collections::BTreeSet;

use crate::diff::unified_diff;
use crate::error::{Error, Result};
use crate::tags::TagRule;
use crate::tree::{CommentStyle, ConfigTree};

/// Manages configuration remediation for one device by comparing its
/// running and generated configurations.
#[derive(Debug)]
pub struct WorkflowRemediation {
    running_config: ConfigTree,
    generated_config: ConfigTree,
    remediation: Option<ConfigTree>,
    rollback: Option<ConfigTree>,
}

impl WorkflowRemediation {
    /// Pair a running and a generated config.
    ///
    /// Both must have been built with the same platform driver.
    pub fn new(running_config: ConfigTree, generated_config: ConfigTree) -> Result<Self> {
        if running_config.driver().platform() != generated_config.driver().platform() {
            return Err(Error::DriverMismatch {
                left: running_config.driver().platform(),
                right: generated_config.driver().platform(),
            });
        }
        Ok(WorkflowRemediation {
            running_config,
            generated_config,
            remediation: None,
            rollback: None,
        })
    }

    /// The device's current configuration.
    pub fn running_config(&self) -> &ConfigTree {
        &self.running_config
    }

    /// The device's target configuration.
    pub fn generated_config(&self) -> &ConfigTree {
        &self.generated_config
    }

    /// The commands transitioning running → generated, computed once and
    /// cached.
    pub fn remediation_config(&mut self) -> Result<&ConfigTree> {
        if self.remediation.is_none() {
            self.remediation = Some(
                self.running_config
                    .config_to_get_to(&self.generated_config)?,
            );
        }
        Ok(self
            .remediation
            .as_ref()
            .expect("remediation computed above"))
    }

    /// The commands transitioning generated → running, computed once and
    /// cached.
    pub fn rollback_config(&mut self) -> Result<&ConfigTree> {
        if self.rollback.is_none() {
            self.rollback = Some(
                self.generated_config
                    .config_to_get_to(&self.running_config)?,
            );
        }
        Ok(self.rollback.as_ref().expect("rollback computed above"))
    }

    /// Tree-aware unified diff between the running and generated configs.
    pub fn unified_diff(&self) -> Vec<String> {
        unified_diff(&self.running_config, &self.generated_config)
    }

    /// Apply tag rules to the remediation config.
    pub fn apply_remediation_tag_rules(&mut self, tag_rules: &[TagRule]) -> Result<()> {
        self.remediation_config()?;
        if let Some(remediation) = self.remediation.as_mut() {
            remediation.apply_tag_rules(tag_rules)?;
        }
        Ok(())
    }

    /// Render the remediation, restricted to the include/exclude tag sets
    /// when either is non-empty.
    pub fn remediation_config_filtered_text(
        &mut self,
        include_tags: &BTreeSet<String>,
        exclude_tags: &BTreeSet<String>,
    ) -> Result<String> {
        let remediation = self.remediation_config()?;
        if include_tags.is_empty() && exclude_tags.is_empty() {
            let lines: Vec<String> = remediation
                .all_children_sorted()
                .map(|node| node.cisco_style_text(&CommentStyle::WithoutComments))
                .collect();
            return Ok(lines.join("\n"));
        }
        Ok(remediation.filtered_text(include_tags, exclude_tags))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver;
    use crate::matching::MatchRule;
    use crate::platform::Platform;

    fn workflow() -> WorkflowRemediation {
        let running = ConfigTree::parse(
            driver::for_platform(Platform::CiscoIos),
            "vlan 3\n  name old\nntp server 10.0.0.1\n",
        )
        .unwrap();
        let generated = ConfigTree::parse(
            driver::for_platform(Platform::CiscoIos),
            "vlan 3\n  name new\nntp server 10.0.0.2\n",
        )
        .unwrap();
        WorkflowRemediation::new(running, generated).unwrap()
    }

    #[test]
    fn test_remediation_and_rollback_invert() {
        let mut workflow = workflow();
        let remediation = workflow.remediation_config().unwrap().lines();
        assert!(remediation.contains(&"  name new".to_string()));

        let rollback = workflow.rollback_config().unwrap().lines();
        assert!(rollback.contains(&"  name old".to_string()));
        assert!(rollback.contains(&"ntp server 10.0.0.1".to_string()));
    }

    #[test]
    fn test_remediation_is_cached() {
        let mut workflow = workflow();
        let first = workflow.remediation_config().unwrap().tree_id();
        let second = workflow.remediation_config().unwrap().tree_id();
        assert_eq!(first, second);
    }

    #[test]
    fn test_driver_mismatch_rejected() {
        let running =
            ConfigTree::parse(driver::for_platform(Platform::CiscoIos), "hostname r1\n").unwrap();
        let generated =
            ConfigTree::parse(driver::for_platform(Platform::Vyos), "hostname r1\n").unwrap();
        assert!(matches!(
            WorkflowRemediation::new(running, generated),
            Err(Error::DriverMismatch { .. })
        ));
    }

    #[test]
    fn test_filtered_remediation_text() {
        let mut workflow = workflow();
        workflow
            .apply_remediation_tag_rules(&[TagRule {
                lineage: vec![MatchRule::startswith("ntp")],
                apply_tags: BTreeSet::from(["ntp".to_string()]),
            }])
            .unwrap();

        let include = BTreeSet::from(["ntp".to_string()]);
        let text = workflow
            .remediation_config_filtered_text(&include, &BTreeSet::new())
            .unwrap();
        assert!(text.contains("ntp server 10.0.0.2"));
        assert!(!text.contains("name new"));
    }
}
