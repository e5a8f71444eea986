//! SQLite memory store implementation.
//!
//! Implements `MemoryStore` from `factsink-core` using sqlx with split
//! read/write pools: raw queries, a private Row struct, writes on the
//! single-connection writer.
//!
//! A batch is one transaction. Each record is upserted on its
//! `request_identifier`, so replaying the same notification leaves one row
//! per fact with the latest text.

use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::Row;

use factsink_core::memory::store::MemoryStore;
use factsink_types::error::MemoryStoreError;
use factsink_types::memory::{
    BatchWriteOutcome, MemoryContent, MemoryRecord, MemoryRecordSummary,
};

use super::pool::DatabasePool;

/// SQLite-backed implementation of `MemoryStore`.
#[derive(Clone)]
pub struct SqliteMemoryStore {
    pool: DatabasePool,
}

impl SqliteMemoryStore {
    pub fn new(pool: DatabasePool) -> Self {
        Self { pool }
    }
}

// ---------------------------------------------------------------------------
// Private Row type for SQLite-to-domain mapping
// ---------------------------------------------------------------------------

struct MemoryRecordRow {
    request_identifier: String,
    content_text: String,
    namespaces: String,
    created_at: String,
}

impl MemoryRecordRow {
    fn from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            request_identifier: row.try_get("request_identifier")?,
            content_text: row.try_get("content_text")?,
            namespaces: row.try_get("namespaces")?,
            created_at: row.try_get("created_at")?,
        })
    }

    fn into_summary(self) -> Result<MemoryRecordSummary, MemoryStoreError> {
        let namespaces: Vec<String> = serde_json::from_str(&self.namespaces)
            .map_err(|e| MemoryStoreError::Database(format!("invalid namespaces column: {e}")))?;
        Ok(MemoryRecordSummary {
            memory_record_id: self.request_identifier,
            content: MemoryContent {
                text: self.content_text,
            },
            namespaces,
            created_at: parse_datetime(&self.created_at)?,
            memory_strategy_id: None,
        })
    }
}

fn parse_datetime(s: &str) -> Result<DateTime<Utc>, MemoryStoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MemoryStoreError::Database(format!("invalid datetime: {e}")))
}

fn db_error(e: sqlx::Error) -> MemoryStoreError {
    MemoryStoreError::Database(e.to_string())
}

// ---------------------------------------------------------------------------
// MemoryStore implementation
// ---------------------------------------------------------------------------

impl MemoryStore for SqliteMemoryStore {
    async fn batch_create(
        &self,
        records: &[MemoryRecord],
    ) -> Result<BatchWriteOutcome, MemoryStoreError> {
        let mut tx = self.pool.writer.begin().await.map_err(db_error)?;

        for record in records {
            let namespaces = serde_json::to_string(&record.namespaces)
                .map_err(|e| MemoryStoreError::Database(e.to_string()))?;
            // Fixed-width so lexical order matches time order.
            let ts = record.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true);

            sqlx::query(
                r#"INSERT INTO memory_records (request_identifier, content_text, namespaces, created_at, updated_at)
                   VALUES (?, ?, ?, ?, ?)
                   ON CONFLICT(request_identifier) DO UPDATE SET
                       content_text = excluded.content_text,
                       namespaces = excluded.namespaces,
                       updated_at = excluded.updated_at"#,
            )
            .bind(&record.request_identifier)
            .bind(&record.content.text)
            .bind(namespaces)
            .bind(&ts)
            .bind(&ts)
            .execute(&mut *tx)
            .await
            .map_err(db_error)?;
        }

        tx.commit().await.map_err(db_error)?;
        tracing::debug!(record_count = records.len(), "Upserted memory records");

        Ok(BatchWriteOutcome {
            successful: records
                .iter()
                .map(|r| r.request_identifier.clone())
                .collect(),
            failed: Vec::new(),
        })
    }

    async fn list(
        &self,
        namespace: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecordSummary>, MemoryStoreError> {
        // Namespace filter is a prefix match on any of the record's namespaces.
        let rows = sqlx::query(
            r#"SELECT request_identifier, content_text, namespaces, created_at
               FROM memory_records
               WHERE EXISTS (
                   SELECT 1 FROM json_each(memory_records.namespaces) AS ns
                   WHERE substr(ns.value, 1, length(?1)) = ?1
               )
               ORDER BY created_at DESC, request_identifier
               LIMIT ?2"#,
        )
        .bind(namespace)
        .bind(i64::try_from(limit).unwrap_or(i64::MAX))
        .fetch_all(&self.pool.reader)
        .await
        .map_err(db_error)?;

        rows.iter()
            .map(|row| {
                MemoryRecordRow::from_row(row)
                    .map_err(db_error)?
                    .into_summary()
            })
            .collect()
    }
}
