//! Verifier configuration
//!
//! Loaded from TOML by callers that want file-based settings:
//!
//! ```toml
//! check_unobserved_sources = true
//! collect_witnesses = true
//! max_nodes = 100000
//! ```
//!
//! Missing keys take their defaults.

use crate::error::VerifyError;
use dogma_ir::{ValidationContext, DEFAULT_MAX_NODES};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Verifier settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VerifierConfig {
    /// Check the direct reads of sources from which no sink is reachable
    pub check_unobserved_sources: bool,
    /// Compute a witness path for every finding
    pub collect_witnesses: bool,
    /// Largest workflow accepted
    pub max_nodes: usize,
}

impl Default for VerifierConfig {
    fn default() -> Self {
        Self {
            check_unobserved_sources: true,
            collect_witnesses: true,
            max_nodes: DEFAULT_MAX_NODES,
        }
    }
}

impl VerifierConfig {
    /// Create default configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle the unobserved-source check
    #[must_use]
    pub fn with_unobserved_sources(mut self, enabled: bool) -> Self {
        self.check_unobserved_sources = enabled;
        self
    }

    /// Toggle witness collection
    #[must_use]
    pub fn with_witnesses(mut self, enabled: bool) -> Self {
        self.collect_witnesses = enabled;
        self
    }

    /// Set the node limit
    #[must_use]
    pub fn with_max_nodes(mut self, max_nodes: usize) -> Self {
        self.max_nodes = max_nodes;
        self
    }

    /// Parse TOML configuration
    ///
    /// # Errors
    /// `VerifyError::Config` on malformed TOML or unknown keys.
    pub fn from_toml(content: &str) -> Result<Self, VerifyError> {
        toml::from_str(content).map_err(|e| VerifyError::Config(e.to_string()))
    }

    /// Read TOML configuration from disk
    ///
    /// # Errors
    /// `VerifyError::Config` if the file cannot be read or parsed.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, VerifyError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| VerifyError::Config(format!("{}: {e}", path.display())))?;
        Self::from_toml(&content)
    }

    /// Structural validation limits derived from this configuration
    #[must_use]
    pub fn validation_context(&self) -> ValidationContext {
        ValidationContext {
            max_nodes: self.max_nodes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = VerifierConfig::default();
        assert!(config.check_unobserved_sources);
        assert!(config.collect_witnesses);
        assert_eq!(config.max_nodes, DEFAULT_MAX_NODES);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = VerifierConfig::from_toml("check_unobserved_sources = false").unwrap();
        assert!(!config.check_unobserved_sources);
        assert!(config.collect_witnesses);
    }

    #[test]
    fn unknown_key_rejected() {
        let result = VerifierConfig::from_toml("strict = true");
        assert!(matches!(result, Err(VerifyError::Config(_))));
    }

    #[test]
    fn loads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_nodes = 10\ncollect_witnesses = false").unwrap();

        let config = VerifierConfig::from_path(file.path()).unwrap();
        assert_eq!(config.max_nodes, 10);
        assert!(!config.collect_witnesses);
        assert_eq!(config.validation_context().max_nodes, 10);
    }

    #[test]
    fn builder_methods() {
        let config = VerifierConfig::new()
            .with_unobserved_sources(false)
            .with_witnesses(false)
            .with_max_nodes(5);
        assert_eq!(
            config,
            VerifierConfig {
                check_unobserved_sources: false,
                collect_witnesses: false,
                max_nodes: 5,
            }
        );
    }
}
