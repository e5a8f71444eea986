//! Runtime-selected adapters.
//!
//! The handler is generic over its ports, so the binary picks a concrete
//! backend at startup and wraps it in one of these enums. Dispatch is a
//! plain match; no boxing is needed for two variants.

use factsink_core::memory::store::MemoryStore;
use factsink_core::storage::object_store::ObjectStore;
use factsink_types::error::{MemoryStoreError, StorageError};
use factsink_types::memory::{BatchWriteOutcome, MemoryRecord, MemoryRecordSummary};
use factsink_types::notification::PayloadLocation;

use crate::agentcore::AgentCoreMemoryStore;
use crate::local::LocalObjectStore;
use crate::s3::S3ObjectStore;
use crate::sqlite::SqliteMemoryStore;

/// Where payload objects are read from.
pub enum ObjectStoreBackend {
    S3(S3ObjectStore),
    Local(LocalObjectStore),
}

impl ObjectStoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            ObjectStoreBackend::S3(_) => "s3",
            ObjectStoreBackend::Local(_) => "local",
        }
    }
}

impl ObjectStore for ObjectStoreBackend {
    async fn get_object(&self, location: &PayloadLocation) -> Result<Vec<u8>, StorageError> {
        match self {
            ObjectStoreBackend::S3(store) => store.get_object(location).await,
            ObjectStoreBackend::Local(store) => store.get_object(location).await,
        }
    }
}

/// Where extracted records are written.
pub enum MemoryStoreBackend {
    AgentCore(AgentCoreMemoryStore),
    Sqlite(SqliteMemoryStore),
}

impl MemoryStoreBackend {
    pub fn name(&self) -> &'static str {
        match self {
            MemoryStoreBackend::AgentCore(_) => "agentcore",
            MemoryStoreBackend::Sqlite(_) => "sqlite",
        }
    }
}

impl MemoryStore for MemoryStoreBackend {
    async fn batch_create(
        &self,
        records: &[MemoryRecord],
    ) -> Result<BatchWriteOutcome, MemoryStoreError> {
        match self {
            MemoryStoreBackend::AgentCore(store) => store.batch_create(records).await,
            MemoryStoreBackend::Sqlite(store) => store.batch_create(records).await,
        }
    }

    async fn list(
        &self,
        namespace: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecordSummary>, MemoryStoreError> {
        match self {
            MemoryStoreBackend::AgentCore(store) => store.list(namespace, limit).await,
            MemoryStoreBackend::Sqlite(store) => store.list(namespace, limit).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::DatabasePool;
    use chrono::Utc;
    use factsink_types::memory::MemoryContent;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_local_backend_dispatch() {
        let tmp = TempDir::new().unwrap();
        tokio::fs::create_dir_all(tmp.path().join("b")).await.unwrap();
        tokio::fs::write(tmp.path().join("b").join("k.json"), b"[]")
            .await
            .unwrap();

        let backend = ObjectStoreBackend::Local(LocalObjectStore::new(tmp.path()));
        assert_eq!(backend.name(), "local");
        let body = backend
            .get_object(&PayloadLocation {
                bucket: "b".into(),
                key: "k.json".into(),
            })
            .await
            .unwrap();
        assert_eq!(body, b"[]");
    }

    #[tokio::test]
    async fn test_sqlite_backend_dispatch() {
        let tmp = TempDir::new().unwrap();
        let pool = DatabasePool::open(&tmp.path().join("m.db")).await.unwrap();
        let backend = MemoryStoreBackend::Sqlite(SqliteMemoryStore::new(pool));
        assert_eq!(backend.name(), "sqlite");

        backend
            .batch_create(&[MemoryRecord {
                request_identifier: "S1-name".into(),
                namespaces: vec!["/".into()],
                content: MemoryContent {
                    text: "name: Ann".into(),
                },
                timestamp: Utc::now(),
            }])
            .await
            .unwrap();
        assert_eq!(backend.list("/", 10).await.unwrap().len(), 1);
    }
}
