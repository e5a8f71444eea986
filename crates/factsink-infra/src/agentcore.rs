//! AgentCoreMemoryStore -- [`MemoryStore`] over the Bedrock AgentCore
//! data-plane API.
//!
//! - `POST /memories/{id}/memoryRecords/batchCreate` for writes
//! - `POST /memories/{id}/memoryRecords` for paginated listing
//!
//! Timestamps travel as epoch seconds on the wire.

use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use factsink_core::memory::store::MemoryStore;
use factsink_types::error::MemoryStoreError;
use factsink_types::memory::{
    BatchWriteOutcome, FailedRecord, MemoryContent, MemoryRecord, MemoryRecordSummary,
};

use crate::aws::sigv4::encode_path;
use crate::aws::{AwsCredentials, RequestSigner, error_body, http_client};

const SERVICE: &str = "bedrock-agentcore";

/// Largest page the list API accepts.
const MAX_PAGE_SIZE: usize = 100;

pub struct AgentCoreMemoryStore {
    client: reqwest::Client,
    signer: RequestSigner,
    memory_id: String,
    endpoint: Option<reqwest::Url>,
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct BatchCreateRequest<'a> {
    records: Vec<WireRecord<'a>>,
    client_token: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WireRecord<'a> {
    request_identifier: &'a str,
    namespaces: &'a [String],
    content: &'a MemoryContent,
    timestamp: f64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BatchCreateResponse {
    #[serde(default)]
    successful_records: Vec<WireRecordStatus>,
    #[serde(default)]
    failed_records: Vec<WireRecordStatus>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireRecordStatus {
    #[serde(default)]
    request_identifier: String,
    #[serde(default)]
    error_code: Option<serde_json::Value>,
    #[serde(default)]
    error_message: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ListRequest<'a> {
    namespace: &'a str,
    max_results: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListResponse {
    #[serde(default)]
    memory_record_summaries: Vec<WireSummary>,
    #[serde(default)]
    next_token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSummary {
    memory_record_id: String,
    content: MemoryContent,
    #[serde(default)]
    namespaces: Vec<String>,
    #[serde(default)]
    created_at: Option<f64>,
    #[serde(default)]
    memory_strategy_id: Option<String>,
}

fn epoch_seconds(ts: DateTime<Utc>) -> f64 {
    ts.timestamp_millis() as f64 / 1000.0
}

fn from_epoch_seconds(secs: f64) -> DateTime<Utc> {
    Utc.timestamp_millis_opt((secs * 1000.0).round() as i64)
        .single()
        .unwrap_or_default()
}

impl From<WireSummary> for MemoryRecordSummary {
    fn from(w: WireSummary) -> Self {
        Self {
            memory_record_id: w.memory_record_id,
            content: w.content,
            namespaces: w.namespaces,
            created_at: w.created_at.map(from_epoch_seconds).unwrap_or_default(),
            memory_strategy_id: w.memory_strategy_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

impl AgentCoreMemoryStore {
    pub fn new(
        credentials: AwsCredentials,
        region: impl Into<String>,
        memory_id: impl Into<String>,
    ) -> Result<Self, MemoryStoreError> {
        let client = http_client(Duration::from_secs(30))
            .map_err(|e| MemoryStoreError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            signer: RequestSigner::new(credentials, region, SERVICE),
            memory_id: memory_id.into(),
            endpoint: None,
        })
    }

    /// Send requests to `endpoint` instead of the regional AgentCore endpoint.
    pub fn with_endpoint(mut self, endpoint: reqwest::Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn memory_id(&self) -> &str {
        &self.memory_id
    }

    fn url(&self, action: Option<&str>) -> Result<reqwest::Url, MemoryStoreError> {
        let base = match &self.endpoint {
            Some(endpoint) => endpoint.as_str().trim_end_matches('/').to_string(),
            None => format!("https://{SERVICE}.{}.amazonaws.com", self.signer.region()),
        };
        let mut segments = vec!["memories", self.memory_id.as_str(), "memoryRecords"];
        segments.extend(action);
        let raw = format!("{base}{}", encode_path(segments));
        reqwest::Url::parse(&raw)
            .map_err(|e| MemoryStoreError::Request(format!("bad URL {raw}: {e}")))
    }

    async fn post_json<B: Serialize, R: for<'de> Deserialize<'de>>(
        &self,
        url: reqwest::Url,
        body: &B,
    ) -> Result<R, MemoryStoreError> {
        let bytes = serde_json::to_vec(body)
            .map_err(|e| MemoryStoreError::Request(format!("failed to encode request: {e}")))?;

        let response = self
            .signer
            .signed_request(
                &self.client,
                reqwest::Method::POST,
                url,
                Some("application/json"),
                bytes,
            )
            .map_err(|e| MemoryStoreError::Request(e.to_string()))?
            .send()
            .await
            .map_err(|e| MemoryStoreError::Request(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let message = error_body(response).await;
            tracing::warn!(status = %status, body = %message, "AgentCore error response");
            return Err(MemoryStoreError::Rejected {
                status: status.as_u16(),
                message,
            });
        }

        response
            .json::<R>()
            .await
            .map_err(|e| MemoryStoreError::Deserialization(e.to_string()))
    }
}

impl MemoryStore for AgentCoreMemoryStore {
    #[tracing::instrument(
        name = "agentcore_batch_create",
        skip_all,
        fields(memory_id = %self.memory_id, record_count = records.len())
    )]
    async fn batch_create(
        &self,
        records: &[MemoryRecord],
    ) -> Result<BatchWriteOutcome, MemoryStoreError> {
        let request = BatchCreateRequest {
            records: records
                .iter()
                .map(|r| WireRecord {
                    request_identifier: &r.request_identifier,
                    namespaces: &r.namespaces,
                    content: &r.content,
                    timestamp: epoch_seconds(r.timestamp),
                })
                .collect(),
            client_token: Uuid::now_v7().to_string(),
        };

        let response: BatchCreateResponse =
            self.post_json(self.url(Some("batchCreate"))?, &request).await?;

        Ok(BatchWriteOutcome {
            successful: response
                .successful_records
                .into_iter()
                .map(|r| r.request_identifier)
                .collect(),
            failed: response
                .failed_records
                .into_iter()
                .map(|r| FailedRecord {
                    request_identifier: r.request_identifier,
                    error_code: r.error_code.map(|c| match c {
                        serde_json::Value::String(s) => s,
                        other => other.to_string(),
                    }),
                    error_message: r.error_message,
                })
                .collect(),
        })
    }

    #[tracing::instrument(name = "agentcore_list", skip(self), fields(memory_id = %self.memory_id))]
    async fn list(
        &self,
        namespace: &str,
        limit: usize,
    ) -> Result<Vec<MemoryRecordSummary>, MemoryStoreError> {
        let url = self.url(None)?;
        let mut out = Vec::new();
        let mut next_token = None;

        while out.len() < limit {
            let request = ListRequest {
                namespace,
                max_results: (limit - out.len()).min(MAX_PAGE_SIZE),
                next_token: next_token.take(),
            };
            let page: ListResponse = self.post_json(url.clone(), &request).await?;
            out.extend(page.memory_record_summaries.into_iter().map(Into::into));

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        out.truncate(limit);
        Ok(out)
    }
}
