//! Anchor configuration.
//!
//! Loaded from JSON; every field has a default so partial files are fine.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{AnchorError, Result};

/// Default capacity of a single anchor.
pub const DEFAULT_MAX_LEAVES: usize = 256;

/// Tunables for an anchor instance.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AnchorConfig {
    /// Maximum number of leaves one anchor accepts.
    pub max_leaves: usize,
    /// Refuse the all-zero leaf with `InvalidLeaf`.
    pub reject_zero_leaf: bool,
}

impl Default for AnchorConfig {
    fn default() -> Self {
        Self {
            max_leaves: DEFAULT_MAX_LEAVES,
            reject_zero_leaf: false,
        }
    }
}

impl AnchorConfig {
    /// Config with a custom capacity and defaults elsewhere.
    pub fn with_max_leaves(max_leaves: usize) -> Self {
        Self {
            max_leaves,
            ..Self::default()
        }
    }

    /// Parse and validate a JSON document.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    /// Check the capacity fits the `u32` leaf counter.
    pub fn validate(&self) -> Result<()> {
        if self.max_leaves == 0 {
            return Err(AnchorError::InvalidConfig {
                reason: "max_leaves must be at least 1".into(),
            });
        }
        if self.max_leaves > u32::MAX as usize {
            return Err(AnchorError::InvalidConfig {
                reason: format!("max_leaves {} exceeds u32::MAX", self.max_leaves),
            });
        }
        Ok(())
    }
}
