//! Memory persistence and fact extraction.
//!
//! This module defines the `MemoryStore` trait that the infrastructure layer
//! implements, the `FactExtractor` that asks an LLM for durable user facts,
//! and the mapping from extracted facts to storable records.

pub mod extractor;
pub mod records;
pub mod store;
