//! LlmProvider trait definition.
//!
//! The abstraction every text-generation backend implements. Only the
//! non-streaming completion call is needed by the extraction pipeline.

use factsink_types::llm::{CompletionRequest, CompletionResponse, LlmError};

/// Trait for LLM provider backends (Bedrock, test doubles).
///
/// Uses native async fn in traits (RPITIT, Rust 2024 edition).
/// Implementations live in factsink-infra.
pub trait LlmProvider: Send + Sync {
    /// Human-readable provider name (e.g., "bedrock").
    fn name(&self) -> &str;

    /// Send a completion request and receive the full response.
    fn complete(
        &self,
        request: &CompletionRequest,
    ) -> impl std::future::Future<Output = Result<CompletionResponse, LlmError>> + Send;
}
