//! Application state wiring adapters into the extraction handler.
//!
//! The handler is generic over its three ports; `AppState` pins them to the
//! infra backends chosen at startup and erases the result behind
//! `BoxNotificationProcessor`, so the Lambda loop, the HTTP endpoint and the
//! CLI all share one shape.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use factsink_core::message::BoxNotificationProcessor;
use factsink_core::pipeline::TranscriptExtractionHandler;
use factsink_infra::agentcore::AgentCoreMemoryStore;
use factsink_infra::aws::AwsCredentials;
use factsink_infra::backends::{MemoryStoreBackend, ObjectStoreBackend};
use factsink_infra::llm::BedrockProvider;
use factsink_infra::local::LocalObjectStore;
use factsink_infra::s3::S3ObjectStore;
use factsink_infra::sns::SubscriptionConfirmer;
use factsink_infra::sqlite::{DatabasePool, SqliteMemoryStore};
use factsink_types::config::ProcessorConfig;

pub type ConcreteHandler =
    TranscriptExtractionHandler<ObjectStoreBackend, BedrockProvider, MemoryStoreBackend>;

/// Local stand-ins selected on the command line.
#[derive(Debug, Clone, Default)]
pub struct BackendOptions {
    /// Read payloads from `<dir>/<bucket>/<key>` instead of S3.
    pub local_root: Option<PathBuf>,
    /// Write records to this SQLite file instead of AgentCore.
    pub sqlite: Option<PathBuf>,
}

/// Shared state for the Lambda loop, HTTP handlers and CLI commands.
#[derive(Clone)]
pub struct AppState {
    pub processor: Arc<BoxNotificationProcessor>,
    pub confirmer: SubscriptionConfirmer,
}

impl AppState {
    /// Build every adapter and the handler. Any missing setting fails here,
    /// before the first notification is read.
    pub async fn init(config: &ProcessorConfig, options: &BackendOptions) -> Result<Self> {
        let objects = build_object_store(config, options)?;
        let memory = build_memory_store(config, options).await?;
        let llm = build_llm(config)?;

        tracing::info!(
            objects = objects.name(),
            memory = memory.name(),
            model_id = llm.model_id(),
            region = %config.region,
            "Extraction handler ready"
        );

        let handler: ConcreteHandler = TranscriptExtractionHandler::new(objects, llm, memory, config);
        Self::from_processor(BoxNotificationProcessor::new(handler))
    }

    pub fn from_processor(processor: BoxNotificationProcessor) -> Result<Self> {
        Ok(Self {
            processor: Arc::new(processor),
            confirmer: SubscriptionConfirmer::new().context("Failed to build SNS confirmer")?,
        })
    }
}

pub fn build_object_store(
    config: &ProcessorConfig,
    options: &BackendOptions,
) -> Result<ObjectStoreBackend> {
    if let Some(root) = &options.local_root {
        return Ok(ObjectStoreBackend::Local(LocalObjectStore::new(root)));
    }
    let credentials = AwsCredentials::from_env().context("S3 needs AWS credentials")?;
    let store = S3ObjectStore::new(credentials, &config.region)?;
    Ok(ObjectStoreBackend::S3(store))
}

pub async fn build_memory_store(
    config: &ProcessorConfig,
    options: &BackendOptions,
) -> Result<MemoryStoreBackend> {
    if let Some(path) = &options.sqlite {
        ensure_parent_dir(path).await?;
        let pool = DatabasePool::open(path)
            .await
            .with_context(|| format!("Failed to open SQLite store at {}", path.display()))?;
        return Ok(MemoryStoreBackend::Sqlite(SqliteMemoryStore::new(pool)));
    }

    let memory_id = config.require_memory_id()?;
    let credentials = AwsCredentials::from_env().context("AgentCore needs AWS credentials")?;
    let store = AgentCoreMemoryStore::new(credentials, &config.region, memory_id)?;
    tracing::debug!(memory_id = store.memory_id(), "Using AgentCore memory store");
    Ok(MemoryStoreBackend::AgentCore(store))
}

pub fn build_llm(config: &ProcessorConfig) -> Result<BedrockProvider> {
    let model_id = config.require_model_id()?;
    BedrockProvider::from_env(model_id, &config.region)
        .with_context(|| format!("Failed to configure Bedrock for model '{model_id}'"))
}

async fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(parent)
            .await
            .with_context(|| format!("Failed to create {}", parent.display()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use factsink_types::error::ConfigError;

    #[tokio::test]
    async fn test_sqlite_backend_skips_memory_id() {
        let tmp = tempfile::tempdir().unwrap();
        let options = BackendOptions {
            local_root: Some(tmp.path().to_path_buf()),
            sqlite: Some(tmp.path().join("nested").join("memory.db")),
        };
        let config = ProcessorConfig::default();

        assert_eq!(build_object_store(&config, &options).unwrap().name(), "local");
        let memory = build_memory_store(&config, &options).await.unwrap();
        assert_eq!(memory.name(), "sqlite");
        assert!(tmp.path().join("nested").join("memory.db").exists());
    }

    #[test]
    fn test_missing_model_id_is_reported_by_env_name() {
        let err = build_llm(&ProcessorConfig::default()).err().unwrap();
        let config_err = err.downcast_ref::<ConfigError>().unwrap();
        assert!(matches!(config_err, ConfigError::Missing("MY_BEDROCK_MODEL_ID")));
    }
}
