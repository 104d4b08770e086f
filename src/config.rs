// Copyright 2025 Cowboy AI, LLC.

//! Configuration for the encapsulation engine

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::errors::{MetaobjectError, MetaobjectResult};

/// Default prefix marking a behaviour's private methods
pub const DEFAULT_PRIVATE_PREFIX: &str = "_";

/// Settings applied when encapsulating a behaviour definition
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct EncapsulationConfig {
    /// Method names starting with this prefix are private to the context
    pub private_prefix: String,
}

impl Default for EncapsulationConfig {
    fn default() -> Self {
        Self {
            private_prefix: DEFAULT_PRIVATE_PREFIX.to_string(),
        }
    }
}

impl EncapsulationConfig {
    /// Load from a JSON document; missing fields take their defaults
    pub fn from_json(json: &str) -> MetaobjectResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject settings that would make every method public
    pub fn validate(&self) -> MetaobjectResult<()> {
        if self.private_prefix.is_empty() {
            return Err(MetaobjectError::configuration(
                "private prefix must not be empty",
            ));
        }
        Ok(())
    }

    /// True if `name` is private under this configuration
    pub fn is_private(&self, name: &str) -> bool {
        name.starts_with(&self.private_prefix)
    }
}
