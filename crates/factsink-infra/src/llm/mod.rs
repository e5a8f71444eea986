//! LLM provider implementations.
//!
//! Only AWS Bedrock is needed: the extraction model is addressed by a
//! Bedrock model ID.

pub mod bedrock;

pub use bedrock::BedrockProvider;
