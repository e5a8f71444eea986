//! Pipeline logic and port trait definitions for factsink.
//!
//! This crate defines the "ports" (`ObjectStore`, `LlmProvider`,
//! `MemoryStore`) that the infrastructure layer implements, and the
//! `TranscriptExtractionHandler` that drives them. It depends only on
//! `factsink-types` -- never on `factsink-infra` or any network/database crate.

pub mod llm;
pub mod memory;
pub mod message;
pub mod pipeline;
pub mod storage;
