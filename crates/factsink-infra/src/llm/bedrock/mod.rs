//! AWS Bedrock LLM provider implementation.
//!
//! Implements [`LlmProvider`](factsink_core::llm::provider::LlmProvider) for
//! the Bedrock Runtime `invoke` action, authenticated with SigV4 or a Bedrock
//! API key (bearer token).

mod client;
pub mod types;

pub use client::{BEARER_TOKEN_ENV, BedrockAuth, BedrockProvider};
