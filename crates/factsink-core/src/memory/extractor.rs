//! Fact extraction via LLM.
//!
//! `FactExtractor` embeds a conversation transcript in a fixed instruction
//! prompt, sends it as a single user message, and parses the reply as a
//! strict `{"facts": [...]}` JSON object.
//!
//! Unlike a best-effort extractor, a reply that is not valid JSON is a hard
//! failure: there is no repair pass and no retry.

use factsink_types::error::PipelineError;
use factsink_types::fact::ExtractionOutput;
use factsink_types::llm::{CompletionRequest, Message};

use crate::llm::provider::LlmProvider;

/// Instruction block sent ahead of the transcript.
///
/// The sensitive-data rule is advisory: nothing checks the model obeyed it
/// except the optional key denylist applied afterwards.
pub const EXTRACTION_INSTRUCTIONS: &str = r#"You extract durable user memory for an assistant.
Return ONLY valid JSON:
{
  "facts":[{"key":"...", "value":"...", "confidence":0.0-1.0}]
}
Rules:
- Do NOT store secrets or highly sensitive identifiers (SSNs, passwords, full DOB, etc).
- Prefer stable long-lived facts (name, preferred contact method, etc).
"#;

/// Maximum characters of a bad reply included in error messages and logs.
const PREVIEW_CHARS: usize = 200;

/// Builds extraction requests and parses their replies.
#[derive(Debug, Clone)]
pub struct FactExtractor {
    max_tokens: u32,
}

impl FactExtractor {
    pub fn new(max_tokens: u32) -> Self {
        Self { max_tokens }
    }

    /// The full prompt for `transcript`.
    pub fn prompt(transcript: &str) -> String {
        format!("{EXTRACTION_INSTRUCTIONS}\n\nText:\n{transcript}")
    }

    /// Build the completion request for `transcript`. The instructions
    /// travel in the user turn; there is no system prompt.
    pub fn build_request(&self, transcript: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![Message::user(Self::prompt(transcript))],
            max_tokens: self.max_tokens,
        }
    }

    /// Run the extraction call and parse the reply.
    ///
    /// Both a failed model call and an unparseable reply map to
    /// [`PipelineError::ExtractionFormat`].
    #[tracing::instrument(
        name = "extract_facts",
        skip_all,
        fields(provider = provider.name(), transcript_chars = transcript.len())
    )]
    pub async fn extract<P: LlmProvider>(
        &self,
        provider: &P,
        transcript: &str,
    ) -> Result<ExtractionOutput, PipelineError> {
        let request = self.build_request(transcript);

        let response = provider.complete(&request).await.map_err(|e| {
            tracing::error!(error = %e, "Extraction model call failed");
            PipelineError::ExtractionFormat(format!("model invocation failed: {e}"))
        })?;

        tracing::debug!(
            stop_reason = %response.stop_reason,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            "Extraction model replied"
        );

        Self::parse_output(&response.content)
    }

    /// Parse a model reply as an [`ExtractionOutput`].
    pub fn parse_output(raw: &str) -> Result<ExtractionOutput, PipelineError> {
        let trimmed = raw.trim();
        serde_json::from_str::<ExtractionOutput>(trimmed).map_err(|e| {
            let preview: String = trimmed.chars().take(PREVIEW_CHARS).collect();
            tracing::error!(
                error = %e,
                content_preview = %preview,
                "Extraction reply is not the expected JSON object"
            );
            PipelineError::ExtractionFormat(format!("reply is not valid JSON ({e}): {preview}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use factsink_types::llm::{CompletionResponse, LlmError, MessageRole, StopReason, Usage};

    struct CannedProvider {
        reply: Result<String, ()>,
    }

    impl LlmProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> Result<CompletionResponse, LlmError> {
            match &self.reply {
                Ok(text) => Ok(CompletionResponse {
                    id: "msg_1".to_string(),
                    content: text.clone(),
                    model: "test".to_string(),
                    stop_reason: StopReason::EndTurn,
                    usage: Usage::default(),
                }),
                Err(()) => Err(LlmError::Overloaded("busy".to_string())),
            }
        }
    }

    #[test]
    fn test_prompt_layout() {
        let prompt = FactExtractor::prompt("user: hi");
        assert!(prompt.starts_with("You extract durable user memory"));
        assert!(prompt.ends_with("\n\nText:\nuser: hi"));
    }

    #[test]
    fn test_instructions_contain_contract() {
        assert!(EXTRACTION_INSTRUCTIONS.contains("Return ONLY valid JSON"));
        assert!(EXTRACTION_INSTRUCTIONS.contains(r#""facts""#));
        assert!(EXTRACTION_INSTRUCTIONS.contains("Do NOT store secrets"));
    }

    #[test]
    fn test_build_request() {
        let request = FactExtractor::new(300).build_request("user: hi");
        assert_eq!(request.max_tokens, 300);
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].role, MessageRole::User);
        assert!(request.messages[0].content.ends_with("Text:\nuser: hi"));
    }

    #[test]
    fn test_parse_output_trims_whitespace() {
        let out = FactExtractor::parse_output("\n  {\"facts\":[]}  \n").unwrap();
        assert!(out.facts.is_empty());
    }

    #[test]
    fn test_parse_output_rejects_prose() {
        let err = FactExtractor::parse_output("Sure! Here are the facts").unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFormat(_)));
        assert!(err.to_string().contains("Sure! Here are the facts"));
    }

    #[test]
    fn test_parse_output_preview_respects_char_boundaries() {
        let raw = "é".repeat(500);
        let err = FactExtractor::parse_output(&raw).unwrap_err();
        assert!(matches!(err, PipelineError::ExtractionFormat(_)));
    }

    #[tokio::test]
    async fn test_extract_parses_reply() {
        let provider = CannedProvider {
            reply: Ok(r#"{"facts":[{"key":"name","value":"Ann","confidence":0.9}]}"#.to_string()),
        };
        let out = FactExtractor::new(300)
            .extract(&provider, "user: My name is Ann")
            .await
            .unwrap();
        assert_eq!(out.facts.len(), 1);
        assert_eq!(out.facts[0].key.as_deref(), Some("name"));
    }

    #[tokio::test]
    async fn test_extract_tolerates_odd_confidence_and_key() {
        let provider = CannedProvider {
            reply: Ok(r#"{"facts":[
                {"key":"name","value":"Ann","confidence":"high"},
                {"key":42,"value":"answer","confidence":0.5}
            ]}"#
                .to_string()),
        };
        let out = FactExtractor::new(300)
            .extract(&provider, "user: My name is Ann")
            .await
            .unwrap();
        assert_eq!(out.facts.len(), 2);
        assert_eq!(out.facts[0].confidence, None);
        assert_eq!(out.facts[0].key.as_deref(), Some("name"));
        assert_eq!(out.facts[1].key.as_deref(), Some("42"));

        let records = crate::memory::records::map_facts(
            "S1",
            &out.facts,
            &["/".to_string()],
            chrono::Utc::now(),
        );
        assert_eq!(records[0].request_identifier, "S1-name");
        assert_eq!(records[1].request_identifier, "S1-42");
        assert_eq!(records[1].content.text, "42: answer");
    }

    #[tokio::test]
    async fn test_extract_model_failure_is_extraction_error() {
        let provider = CannedProvider { reply: Err(()) };
        let err = FactExtractor::new(300)
            .extract(&provider, "user: hi")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "ExtractionFormatError");
    }
}
