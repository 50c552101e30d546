//! # confdiff - Hierarchical Network Configuration Remediation
//!
//! confdiff computes the minimal set of command-line edits required to
//! transform a network device's *running* configuration into a target
//! *generated* configuration, producing output that is syntactically valid
//! for the device's operating system. It also produces the inverse (a
//! rollback), tag-filtered subsets of the edits, a tree-aware unified
//! diff, and the merge substrate consumed by multi-device reporters.
//!
//! The input/output universe is plain text in Cisco-IOS-style indented
//! command trees or Juniper-style `set`/`delete` statements. No network
//! I/O is performed; callers read device configs however they like and
//! pass the text in.
//!
//! ## Core Concepts
//!
//! - **ConfigTree**: the in-memory hierarchy of commands parsed from text
//! - **Driver**: an immutable, per-platform bundle of rules controlling
//!   comparison, negation, ordering, idempotency, and sectional exits
//! - **Remediation**: the tree of edits whose rendering, applied in order,
//!   transitions running → generated
//! - **Rollback**: remediation with the arguments swapped
//! - **Lineage**: an ordered tuple of match rules tested against a node's
//!   root-to-self path
//! - **Tags**: post-hoc labels used to slice a remediation into separately
//!   reviewable change sets
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                        Configuration Text                            │
//! │            (indented command trees / set statements)                 │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                             Parser                                   │
//! │        (per-line rewrites, indent analysis, banner folding)          │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!          ┌─────────────────────────┼─────────────────────────┐
//!          ▼                         ▼                         ▼
//! ┌─────────────────┐   ┌─────────────────────┐   ┌─────────────────────┐
//! │   ConfigTree    │   │   Driver Registry   │   │     Tag Engine      │
//! │  (running and   │   │  (per-platform      │   │  (lineage-matched   │
//! │   generated)    │   │   rule bundles)     │   │   tag application)  │
//! └─────────────────┘   └─────────────────────┘   └─────────────────────┘
//!          │                         │                         │
//!          └─────────────────────────┼─────────────────────────┘
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                       Remediation Engine                             │
//! │     (additions, negations, overwrites, exits, order weights)         │
//! └─────────────────────────────────────────────────────────────────────┘
//!                                    │
//!                                    ▼
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │              Rendered Edits / Rollback / Unified Diff                │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Example
//!
//! ```rust
//! use confdiff::prelude::*;
//!
//! fn main() -> confdiff::Result<()> {
//!     let driver = confdiff::driver::for_platform(Platform::CiscoIos);
//!     let running = ConfigTree::parse(driver.clone(), "vlan 3\n  name old\n")?;
//!     let generated = ConfigTree::parse(driver, "vlan 3\n  name new\nvlan 4\n  name v4\n")?;
//!
//!     let mut workflow = WorkflowRemediation::new(running, generated)?;
//!     let remediation = workflow.remediation_config()?;
//!     assert_eq!(
//!         remediation.lines(),
//!         vec!["vlan 3", "  name new", "vlan 4", "  name v4"]
//!     );
//!     Ok(())
//! }
//! ```
//!
//! The engine is single-threaded and synchronous; trees are not safe for
//! concurrent mutation. The only process-wide state is the driver
//! registry, initialized on first use and immutable afterwards.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Re-export commonly used items in prelude
pub mod prelude {
    //! Convenient re-exports of commonly used types and traits.

    pub use crate::diff::unified_diff;
    pub use crate::error::{Error, Result};
    pub use crate::matching::{MatchMode, MatchRule};
    pub use crate::platform::Platform;
    pub use crate::tags::TagRule;
    pub use crate::tree::{ConfigTree, NodeId, NodeRef};
    pub use crate::workflow::WorkflowRemediation;
}

// ============================================================================
// Core Modules
// ============================================================================

pub mod error;
pub mod matching;
pub mod platform;
pub mod rules;

// ============================================================================
// Engine Components
// ============================================================================

pub mod diff;
pub mod driver;
mod parser;
mod remediation;
pub mod tags;
pub mod tree;
pub mod unused;

// ============================================================================
// Workflow and Loaders
// ============================================================================

pub mod loader;
pub mod workflow;

pub use error::{Error, Result};
pub use matching::{MatchMode, MatchRule};
pub use platform::Platform;
pub use tree::ConfigTree;
pub use workflow::WorkflowRemediation;

/// Parse configuration text with a platform's builtin driver.
///
/// Shorthand for [`ConfigTree::parse`] with [`driver::for_platform`].
pub fn parse(platform: Platform, text: &str) -> Result<ConfigTree> {
    ConfigTree::parse(driver::for_platform(platform), text)
}
