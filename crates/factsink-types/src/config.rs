//! Processor configuration types.
//!
//! `ProcessorConfig` is what a `factsink.toml` file deserializes into. The
//! infra loader layers environment variables on top of it.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::memory::ROOT_NAMESPACE;

/// Env var naming the memory store. Also used in error messages.
pub const MEMORY_ID_ENV: &str = "AGENTCORE_MEMORY_ID";
/// Env var naming the extraction model.
pub const MODEL_ID_ENV: &str = "MY_BEDROCK_MODEL_ID";

/// Settings for one processor process.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessorConfig {
    #[serde(default = "default_region")]
    pub region: String,

    /// Memory store identifier. Required for the AgentCore backend.
    #[serde(default)]
    pub memory_id: Option<String>,

    /// Model used for extraction. Required.
    #[serde(default)]
    pub model_id: Option<String>,

    /// Output token cap for the extraction call.
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    /// Namespaces attached to every record.
    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<String>,

    /// Fact keys that are dropped before persistence (case-insensitive).
    #[serde(default)]
    pub deny_keys: Vec<String>,
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_max_tokens() -> u32 {
    300
}

fn default_namespaces() -> Vec<String> {
    vec![ROOT_NAMESPACE.to_string()]
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            memory_id: None,
            model_id: None,
            max_tokens: default_max_tokens(),
            namespaces: default_namespaces(),
            deny_keys: Vec::new(),
        }
    }
}

impl ProcessorConfig {
    pub fn require_memory_id(&self) -> Result<&str, ConfigError> {
        non_empty(self.memory_id.as_deref()).ok_or(ConfigError::Missing(MEMORY_ID_ENV))
    }

    pub fn require_model_id(&self) -> Result<&str, ConfigError> {
        non_empty(self.model_id.as_deref()).ok_or(ConfigError::Missing(MODEL_ID_ENV))
    }

    /// Check invariants that deserialization alone cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_tokens == 0 {
            return Err(ConfigError::Invalid {
                field: "max_tokens",
                message: "must be greater than zero".to_string(),
            });
        }
        if self.namespaces.is_empty() {
            return Err(ConfigError::Invalid {
                field: "namespaces",
                message: "at least one namespace is required".to_string(),
            });
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "region",
                message: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
