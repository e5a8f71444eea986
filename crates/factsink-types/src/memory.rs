//! Memory store records.
//!
//! A [`MemoryRecord`] is the persisted form of one extracted fact. Its
//! `request_identifier` is derived from the session and the fact key, so the
//! same fact delivered twice maps to the same identifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default namespace set: one flat namespace.
pub const ROOT_NAMESPACE: &str = "/";

/// Text body of a memory record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryContent {
    pub text: String,
}

/// One record submitted to the memory store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecord {
    pub request_identifier: String,
    pub namespaces: Vec<String>,
    pub content: MemoryContent,
    /// Serialized as an RFC 3339 / ISO-8601 string.
    pub timestamp: DateTime<Utc>,
}

/// A record the store refused within an otherwise accepted batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FailedRecord {
    pub request_identifier: String,
    #[serde(default)]
    pub error_code: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
}

/// What a batch write reported back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchWriteOutcome {
    pub successful: Vec<String>,
    pub failed: Vec<FailedRecord>,
}

/// One row of a memory listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryRecordSummary {
    pub memory_record_id: String,
    pub content: MemoryContent,
    pub namespaces: Vec<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory_strategy_id: Option<String>,
}

/// Result of processing one notification (or a batch of them).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessOutcome {
    pub ok: bool,
    pub stored: usize,
}

impl ProcessOutcome {
    pub fn stored(count: usize) -> Self {
        Self {
            ok: true,
            stored: count,
        }
    }

    /// Combine outcomes from several notifications in one delivery.
    pub fn merge(self, other: ProcessOutcome) -> Self {
        Self {
            ok: self.ok && other.ok,
            stored: self.stored + other.stored,
        }
    }
}
