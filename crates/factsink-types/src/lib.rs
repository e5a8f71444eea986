//! Shared domain types for factsink.
//!
//! Notifications, conversation payloads, extracted facts, memory records,
//! configuration, and the error types shared by every layer.
//!
//! Zero infrastructure dependencies -- only serde, chrono, thiserror.

pub mod config;
pub mod error;
pub mod fact;
pub mod llm;
pub mod memory;
pub mod notification;
pub mod payload;
