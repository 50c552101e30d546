//! Error types for confdiff.
//!
//! This module defines the error types used throughout confdiff, providing
//! rich error information for debugging and user feedback.

use thiserror::Error;

use crate::platform::Platform;

/// Result type alias for confdiff operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The main error type for confdiff.
#[derive(Error, Debug)]
pub enum Error {
    // ========================================================================
    // Parse Errors
    // ========================================================================
    /// A configuration line could not be placed in the hierarchy.
    #[error("Failed to parse line {line}: {message}: '{text}'")]
    Parse {
        /// 1-based line number in the input text
        line: usize,
        /// The offending line, after substitutions
        text: String,
        /// What went wrong
        message: String,
    },

    // ========================================================================
    // Tree Errors
    // ========================================================================
    /// A sibling with the same text already exists under a parent that does
    /// not allow duplicate children.
    #[error("Found a duplicate section: {path}")]
    DuplicateChild {
        /// Root-to-node path of the rejected child
        path: String,
    },

    /// A reparenting operation would have made a node its own ancestor.
    #[error("Move would create a cycle at: {path}")]
    CycleDetected {
        /// Root-to-node path of the node being moved
        path: String,
    },

    /// Child text must be non-empty.
    #[error("Cannot add a child with empty text")]
    EmptyChildText,

    // ========================================================================
    // Driver Errors
    // ========================================================================
    /// Driver factory lookup failed.
    #[error("Unsupported platform: '{0}'")]
    UnsupportedPlatform(String),

    /// A rule failed validation at driver construction.
    #[error("Invalid driver rule: {0}")]
    InvalidRule(String),

    /// Two configs built with different platform drivers were combined.
    #[error("Driver mismatch: {left} vs {right}; both configs must use the same driver")]
    DriverMismatch {
        /// Platform of the left-hand config
        left: Platform,
        /// Platform of the right-hand config
        right: Platform,
    },

    // ========================================================================
    // Loader Errors
    // ========================================================================
    /// Reading a configuration or rule file failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A YAML rule file could not be deserialized.
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl Error {
    /// Build an [`Error::InvalidRule`] from a failed regex compilation.
    pub(crate) fn bad_pattern(context: &str, pattern: &str, err: &regex::Error) -> Self {
        Error::InvalidRule(format!("{context}: bad pattern '{pattern}': {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::DuplicateChild {
            path: "interface Vlan2 / ip address 10.0.0.1/24".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Found a duplicate section: interface Vlan2 / ip address 10.0.0.1/24"
        );
    }

    #[test]
    fn test_parse_error_carries_line_number() {
        let err = Error::Parse {
            line: 42,
            text: "orphan".to_string(),
            message: "missing parent".to_string(),
        };
        let rendered = err.to_string();
        assert!(rendered.contains("42"));
        assert!(rendered.contains("orphan"));
    }
}
