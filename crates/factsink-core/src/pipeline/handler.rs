//! TranscriptExtractionHandler -- the notification-to-memory pipeline.
//!
//! One linear run per notification:
//! parse location → fetch payload → build transcript → extract facts →
//! map to records → persist in one batch.
//!
//! The handler holds no mutable state. Its three collaborators are passed in
//! at construction, so any of them can be swapped for a test double.

use chrono::Utc;

use factsink_types::config::ProcessorConfig;
use factsink_types::error::PipelineError;
use factsink_types::memory::{MemoryRecord, ProcessOutcome};
use factsink_types::notification::{DeliveryNotification, PayloadLocation};
use factsink_types::payload::ConversationPayload;

use crate::llm::provider::LlmProvider;
use crate::memory::extractor::FactExtractor;
use crate::memory::records::{FactFilter, map_facts};
use crate::memory::store::MemoryStore;
use crate::storage::object_store::ObjectStore;

use super::location::parse_payload_location;
use super::transcript::build_transcript;

/// Processes delivery notifications end to end.
pub struct TranscriptExtractionHandler<S, L, M> {
    objects: S,
    llm: L,
    memory: M,
    extractor: FactExtractor,
    filter: FactFilter,
    namespaces: Vec<String>,
}

impl<S, L, M> TranscriptExtractionHandler<S, L, M>
where
    S: ObjectStore,
    L: LlmProvider,
    M: MemoryStore,
{
    pub fn new(objects: S, llm: L, memory: M, config: &ProcessorConfig) -> Self {
        Self {
            objects,
            llm,
            memory,
            extractor: FactExtractor::new(config.max_tokens),
            filter: FactFilter::new(&config.deny_keys),
            namespaces: config.namespaces.clone(),
        }
    }

    /// Run the whole pipeline for one notification.
    ///
    /// Returns the number of records submitted. Any failure is terminal for
    /// this notification and is returned unchanged to the caller.
    #[tracing::instrument(
        name = "handle_notification",
        skip_all,
        fields(location = %notification.s3_payload_location)
    )]
    pub async fn handle(
        &self,
        notification: &DeliveryNotification,
    ) -> Result<ProcessOutcome, PipelineError> {
        let location = parse_payload_location(&notification.s3_payload_location)?;
        let payload = self.fetch_payload(&location).await?;

        let transcript = build_transcript(&payload);
        tracing::debug!(transcript = %transcript, "Transcript built");

        let extracted = self.extractor.extract(&self.llm, &transcript).await?;
        tracing::debug!(facts = ?extracted.facts, "Facts extracted");

        let facts = self.filter.apply(extracted.facts);
        for fact in &facts {
            tracing::debug!(
                key = fact.key.as_deref(),
                confidence = fact.confidence,
                "Processing fact"
            );
        }

        let records = map_facts(&payload.session_id, &facts, &self.namespaces, Utc::now());
        tracing::info!(
            record_count = records.len(),
            actor_id = payload.actor_id.as_deref(),
            session_id = %payload.session_id,
            "Created memory records"
        );

        self.persist(&records).await
    }

    /// Download and decode the conversation payload.
    async fn fetch_payload(
        &self,
        location: &PayloadLocation,
    ) -> Result<ConversationPayload, PipelineError> {
        let bytes = self.objects.get_object(location).await.map_err(|e| {
            tracing::error!(bucket = %location.bucket, key = %location.key, error = %e, "Payload fetch failed");
            PipelineError::PayloadRetrieval(format!("{location}: {e}"))
        })?;

        serde_json::from_slice::<ConversationPayload>(&bytes).map_err(|e| {
            tracing::error!(bucket = %location.bucket, key = %location.key, error = %e, "Payload is not a conversation");
            PipelineError::PayloadRetrieval(format!("{location}: invalid payload JSON: {e}"))
        })
    }

    /// Submit all records in one batch, or nothing when there are none.
    async fn persist(&self, records: &[MemoryRecord]) -> Result<ProcessOutcome, PipelineError> {
        if records.is_empty() {
            tracing::info!("No records to store");
            return Ok(ProcessOutcome::stored(0));
        }

        tracing::info!(record_count = records.len(), "Storing memory records");

        let outcome = self.memory.batch_create(records).await.map_err(|e| {
            tracing::error!(error = %e, "Error storing records");
            PipelineError::Persistence(e.to_string())
        })?;

        if !outcome.failed.is_empty() {
            let rejected: Vec<&str> = outcome
                .failed
                .iter()
                .map(|f| f.request_identifier.as_str())
                .collect();
            tracing::error!(
                failed = ?rejected,
                accepted = outcome.successful.len(),
                "Memory store rejected part of the batch"
            );
            return Err(PipelineError::Persistence(format!(
                "{} of {} records rejected: {}",
                rejected.len(),
                records.len(),
                rejected.join(", ")
            )));
        }

        tracing::info!(record_count = records.len(), "Stored memory records");
        Ok(ProcessOutcome::stored(records.len()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    use factsink_types::error::{MemoryStoreError, StorageError};
    use factsink_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};
    use factsink_types::memory::{BatchWriteOutcome, FailedRecord, MemoryRecordSummary};

    #[derive(Default)]
    struct FakeObjects {
        objects: HashMap<(String, String), Vec<u8>>,
    }

    impl FakeObjects {
        fn with(bucket: &str, key: &str, body: &str) -> Self {
            let mut objects = HashMap::new();
            objects.insert((bucket.to_string(), key.to_string()), body.as_bytes().to_vec());
            Self { objects }
        }
    }

    impl ObjectStore for FakeObjects {
        async fn get_object(&self, location: &PayloadLocation) -> Result<Vec<u8>, StorageError> {
            self.objects
                .get(&(location.bucket.clone(), location.key.clone()))
                .cloned()
                .ok_or_else(|| StorageError::NotFound(location.to_string()))
        }
    }

    struct FakeLlm {
        reply: Result<String, ()>,
        prompts: Mutex<Vec<String>>,
    }

    impl FakeLlm {
        fn replying(text: &str) -> Self {
            Self {
                reply: Ok(text.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: Err(()),
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    impl LlmProvider for FakeLlm {
        fn name(&self) -> &str {
            "fake"
        }

        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            self.prompts
                .lock()
                .unwrap()
                .push(request.messages[0].content.clone());
            match &self.reply {
                Ok(text) => Ok(CompletionResponse {
                    id: "msg".to_string(),
                    content: text.clone(),
                    model: "fake".to_string(),
                    stop_reason: StopReason::EndTurn,
                    usage: Usage::default(),
                }),
                Err(()) => Err(LlmError::Provider {
                    message: "boom".to_string(),
                }),
            }
        }
    }

    #[derive(Default)]
    struct FakeMemory {
        batches: Mutex<Vec<Vec<MemoryRecord>>>,
        fail: bool,
        reject: bool,
    }

    impl MemoryStore for FakeMemory {
        async fn batch_create(
            &self,
            records: &[MemoryRecord],
        ) -> Result<BatchWriteOutcome, MemoryStoreError> {
            self.batches.lock().unwrap().push(records.to_vec());
            if self.fail {
                return Err(MemoryStoreError::Rejected {
                    status: 500,
                    message: "internal".to_string(),
                });
            }
            if self.reject {
                return Ok(BatchWriteOutcome {
                    successful: Vec::new(),
                    failed: vec![FailedRecord {
                        request_identifier: records[0].request_identifier.clone(),
                        error_code: Some("ValidationException".to_string()),
                        error_message: None,
                    }],
                });
            }
            Ok(BatchWriteOutcome {
                successful: records.iter().map(|r| r.request_identifier.clone()).collect(),
                failed: Vec::new(),
            })
        }

        async fn list(
            &self,
            _namespace: &str,
            _limit: usize,
        ) -> Result<Vec<MemoryRecordSummary>, MemoryStoreError> {
            Ok(Vec::new())
        }
    }

    const PAYLOAD: &str = r#"{"actorId":"U1","sessionId":"S1","currentContext":[{"role":"user","content":{"text":"My name is Ann"}}]}"#;
    const ONE_FACT: &str = r#"{"facts":[{"key":"name","value":"Ann","confidence":0.9}]}"#;

    fn notification(uri: &str) -> DeliveryNotification {
        DeliveryNotification {
            s3_payload_location: uri.to_string(),
        }
    }

    fn handler(
        objects: FakeObjects,
        llm: FakeLlm,
        memory: FakeMemory,
    ) -> TranscriptExtractionHandler<FakeObjects, FakeLlm, FakeMemory> {
        TranscriptExtractionHandler::new(objects, llm, memory, &ProcessorConfig::default())
    }

    #[tokio::test]
    async fn test_end_to_end_single_fact() {
        let h = handler(
            FakeObjects::with("events", "p/1.json", PAYLOAD),
            FakeLlm::replying(ONE_FACT),
            FakeMemory::default(),
        );

        let before = Utc::now();
        let outcome = h.handle(&notification("s3://events/p/1.json")).await.unwrap();
        let after = Utc::now();

        assert_eq!(outcome, ProcessOutcome::stored(1));

        let prompts = h.llm.prompts.lock().unwrap();
        assert!(prompts[0].ends_with("Text:\nuser: My name is Ann"));

        let batches = h.memory.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        let record = &batches[0][0];
        assert_eq!(batches[0].len(), 1);
        assert_eq!(record.request_identifier, "S1-name");
        assert_eq!(record.namespaces, vec!["/".to_string()]);
        assert_eq!(record.content.text, "name: Ann");
        assert!(record.timestamp >= before && record.timestamp <= after);
    }

    #[tokio::test]
    async fn test_zero_facts_skips_persistence() {
        let h = handler(
            FakeObjects::with("events", "k", PAYLOAD),
            FakeLlm::replying(r#"{"facts":[]}"#),
            FakeMemory::default(),
        );
        let outcome = h.handle(&notification("s3://events/k")).await.unwrap();
        assert_eq!(outcome, ProcessOutcome::stored(0));
        assert!(h.memory.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persistence_failure_propagates() {
        let h = handler(
            FakeObjects::with("events", "k", PAYLOAD),
            FakeLlm::replying(ONE_FACT),
            FakeMemory {
                fail: true,
                ..FakeMemory::default()
            },
        );
        let err = h.handle(&notification("s3://events/k")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Persistence(_)));
        assert_eq!(h.memory.batches.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_partial_rejection_is_a_failure() {
        let h = handler(
            FakeObjects::with("events", "k", PAYLOAD),
            FakeLlm::replying(ONE_FACT),
            FakeMemory {
                reject: true,
                ..FakeMemory::default()
            },
        );
        let err = h.handle(&notification("s3://events/k")).await.unwrap_err();
        assert!(matches!(err, PipelineError::Persistence(_)));
        assert!(err.to_string().contains("S1-name"));
    }

    #[tokio::test]
    async fn test_malformed_location_stops_before_fetch() {
        let h = handler(
            FakeObjects::default(),
            FakeLlm::replying(ONE_FACT),
            FakeMemory::default(),
        );
        let err = h.handle(&notification("https://events/k")).await.unwrap_err();
        assert!(matches!(err, PipelineError::MalformedReference(_)));
        assert!(h.llm.prompts.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_object_is_retrieval_error() {
        let h = handler(
            FakeObjects::default(),
            FakeLlm::replying(ONE_FACT),
            FakeMemory::default(),
        );
        let err = h.handle(&notification("s3://events/missing")).await.unwrap_err();
        assert!(matches!(err, PipelineError::PayloadRetrieval(_)));
    }

    #[tokio::test]
    async fn test_non_json_payload_is_retrieval_error() {
        let h = handler(
            FakeObjects::with("events", "k", "not json"),
            FakeLlm::replying(ONE_FACT),
            FakeMemory::default(),
        );
        let err = h.handle(&notification("s3://events/k")).await.unwrap_err();
        assert!(matches!(err, PipelineError::PayloadRetrieval(_)));
    }

    #[tokio::test]
    async fn test_non_json_model_reply_is_extraction_error() {
        let h = handler(
            FakeObjects::with("events", "k", PAYLOAD),
            FakeLlm::replying("I found a name: Ann"),
            FakeMemory::default(),
        );
        let err = h.handle(&notification("s3://events/k")).await.unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFormat(_)));
        assert!(h.memory.batches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_model_failure_is_extraction_error() {
        let h = handler(
            FakeObjects::with("events", "k", PAYLOAD),
            FakeLlm::failing(),
            FakeMemory::default(),
        );
        let err = h.handle(&notification("s3://events/k")).await.unwrap_err();
        assert_eq!(err.kind(), "ExtractionFormatError");
    }

    #[tokio::test]
    async fn test_denied_keys_are_not_persisted() {
        let config = ProcessorConfig {
            deny_keys: vec!["ssn".to_string()],
            ..ProcessorConfig::default()
        };
        let h = TranscriptExtractionHandler::new(
            FakeObjects::with("events", "k", PAYLOAD),
            FakeLlm::replying(
                r#"{"facts":[{"key":"ssn","value":"123-45-6789"},{"key":"name","value":"Ann"}]}"#,
            ),
            FakeMemory::default(),
            &config,
        );
        let outcome = h.handle(&notification("s3://events/k")).await.unwrap();
        assert_eq!(outcome.stored, 1);
        let batches = h.memory.batches.lock().unwrap();
        assert_eq!(batches[0][0].request_identifier, "S1-name");
    }

    #[tokio::test]
    async fn test_all_facts_go_in_one_batch() {
        let h = handler(
            FakeObjects::with("events", "k", PAYLOAD),
            FakeLlm::replying(
                r#"{"facts":[{"key":"name","value":"Ann"},{"key":"contact","value":"email"},{"value":"x"}]}"#,
            ),
            FakeMemory::default(),
        );
        let outcome = h.handle(&notification("s3://events/k")).await.unwrap();
        assert_eq!(outcome.stored, 3);
        let batches = h.memory.batches.lock().unwrap();
        assert_eq!(batches.len(), 1);
        let ids: Vec<&str> = batches[0].iter().map(|r| r.request_identifier.as_str()).collect();
        assert_eq!(ids, vec!["S1-name", "S1-contact", "S1-unknown"]);
        let ts = batches[0][0].timestamp;
        assert!(batches[0].iter().all(|r| r.timestamp == ts));
    }
}
