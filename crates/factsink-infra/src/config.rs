//! Processor configuration loader.
//!
//! Resolution order, later wins:
//! 1. built-in defaults ([`ProcessorConfig::default`])
//! 2. a TOML file (`--config`, else `FACTSINK_CONFIG`)
//! 3. environment variables
//!
//! The environment is read through a lookup function so tests never touch
//! the real process environment.

use std::path::{Path, PathBuf};

use factsink_types::config::{MEMORY_ID_ENV, MODEL_ID_ENV, ProcessorConfig};
use factsink_types::error::ConfigError;

pub const CONFIG_PATH_ENV: &str = "FACTSINK_CONFIG";
pub const REGION_ENV: &str = "AWS_REGION";
pub const DEFAULT_REGION_ENV: &str = "AWS_DEFAULT_REGION";
pub const MAX_TOKENS_ENV: &str = "FACTSINK_MAX_TOKENS";
pub const DENY_KEYS_ENV: &str = "FACTSINK_DENY_KEYS";

/// Load configuration from the real process environment.
pub async fn load_config(path: Option<&Path>) -> Result<ProcessorConfig, ConfigError> {
    load_config_with(path, |key| std::env::var(key).ok()).await
}

/// Load configuration, reading env vars through `lookup`.
///
/// A config file that was asked for but cannot be read or parsed is an
/// error; no file at all means defaults.
pub async fn load_config_with(
    path: Option<&Path>,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<ProcessorConfig, ConfigError> {
    let path: Option<PathBuf> = path
        .map(Path::to_path_buf)
        .or_else(|| non_empty(lookup(CONFIG_PATH_ENV)).map(PathBuf::from));

    let mut config = match &path {
        Some(path) => read_config_file(path).await?,
        None => ProcessorConfig::default(),
    };

    apply_env_overrides(&mut config, &lookup)?;
    config.validate()?;

    tracing::debug!(
        region = %config.region,
        memory_id = config.memory_id.as_deref(),
        model_id = config.model_id.as_deref(),
        max_tokens = config.max_tokens,
        deny_keys = config.deny_keys.len(),
        "Configuration loaded"
    );
    Ok(config)
}

async fn read_config_file(path: &Path) -> Result<ProcessorConfig, ConfigError> {
    let read_error = |message: String| ConfigError::Read {
        path: path.display().to_string(),
        message,
    };

    let content = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| read_error(e.to_string()))?;

    toml::from_str::<ProcessorConfig>(&content).map_err(|e| read_error(e.to_string()))
}

fn apply_env_overrides(
    config: &mut ProcessorConfig,
    lookup: &impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    if let Some(region) = non_empty(lookup(REGION_ENV)).or_else(|| non_empty(lookup(DEFAULT_REGION_ENV))) {
        config.region = region;
    }
    if let Some(memory_id) = non_empty(lookup(MEMORY_ID_ENV)) {
        config.memory_id = Some(memory_id);
    }
    if let Some(model_id) = non_empty(lookup(MODEL_ID_ENV)) {
        config.model_id = Some(model_id);
    }
    if let Some(raw) = non_empty(lookup(MAX_TOKENS_ENV)) {
        config.max_tokens = raw.parse().map_err(|_| ConfigError::Invalid {
            field: MAX_TOKENS_ENV,
            message: format!("expected a positive integer, got '{raw}'"),
        })?;
    }
    if let Some(raw) = lookup(DENY_KEYS_ENV) {
        config.deny_keys = raw
            .split(',')
            .map(str::trim)
            .filter(|k| !k.is_empty())
            .map(str::to_string)
            .collect();
    }
    Ok(())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tempfile::TempDir;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[tokio::test]
    async fn test_defaults_without_file_or_env() {
        let config = load_config_with(None, env(&[])).await.unwrap();
        assert_eq!(config, ProcessorConfig::default());
    }

    #[tokio::test]
    async fn test_env_only() {
        let config = load_config_with(
            None,
            env(&[
                (REGION_ENV, "eu-west-1"),
                (MEMORY_ID_ENV, "UserInfoSelfManagedMemory-abc"),
                (MODEL_ID_ENV, "anthropic.claude-3-haiku-20240307-v1:0"),
                (MAX_TOKENS_ENV, "512"),
                (DENY_KEYS_ENV, "ssn, password,,"),
            ]),
        )
        .await
        .unwrap();
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.require_memory_id().unwrap(), "UserInfoSelfManagedMemory-abc");
        assert_eq!(
            config.require_model_id().unwrap(),
            "anthropic.claude-3-haiku-20240307-v1:0"
        );
        assert_eq!(config.max_tokens, 512);
        assert_eq!(config.deny_keys, vec!["ssn".to_string(), "password".to_string()]);
    }

    #[tokio::test]
    async fn test_env_overrides_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("factsink.toml");
        tokio::fs::write(
            &path,
            r#"
region = "us-west-2"
model_id = "from-file"
max_tokens = 200
namespaces = ["/", "/users"]
"#,
        )
        .await
        .unwrap();

        let config = load_config_with(Some(&path), env(&[(MODEL_ID_ENV, "from-env")]))
            .await
            .unwrap();
        assert_eq!(config.region, "us-west-2");
        assert_eq!(config.model_id.as_deref(), Some("from-env"));
        assert_eq!(config.max_tokens, 200);
        assert_eq!(config.namespaces.len(), 2);
    }

    #[tokio::test]
    async fn test_config_path_from_env() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("c.toml");
        tokio::fs::write(&path, "memory_id = \"mem-from-file\"\n")
            .await
            .unwrap();

        let config = load_config_with(
            None,
            env(&[(CONFIG_PATH_ENV, path.to_str().unwrap())]),
        )
        .await
        .unwrap();
        assert_eq!(config.memory_id.as_deref(), Some("mem-from-file"));
    }

    #[tokio::test]
    async fn test_default_region_fallback() {
        let config = load_config_with(None, env(&[(DEFAULT_REGION_ENV, "ap-south-1")]))
            .await
            .unwrap();
        assert_eq!(config.region, "ap-south-1");
    }

    #[tokio::test]
    async fn test_malformed_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.toml");
        tokio::fs::write(&path, "this is not { valid toml !!!")
            .await
            .unwrap();
        let err = load_config_with(Some(&path), env(&[])).await.unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let tmp = TempDir::new().unwrap();
        let err = load_config_with(Some(&tmp.path().join("nope.toml")), env(&[]))
            .await
            .unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[tokio::test]
    async fn test_bad_max_tokens() {
        for raw in ["abc", "-1", "0"] {
            let err = load_config_with(None, env(&[(MAX_TOKENS_ENV, raw)]))
                .await
                .unwrap_err();
            assert!(matches!(err, ConfigError::Invalid { .. }), "{raw}");
        }
    }
}
