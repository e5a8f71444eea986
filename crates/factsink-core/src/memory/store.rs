//! MemoryStore trait definition.
//!
//! The write side is a single batch call: either the whole batch is
//! accepted or the call fails. Follows the same RPITIT pattern as
//! `ObjectStore` and `LlmProvider`.

use factsink_types::error::MemoryStoreError;
use factsink_types::memory::{BatchWriteOutcome, MemoryRecord, MemoryRecordSummary};

/// Persistence for extracted memory records.
///
/// Implementations live in factsink-infra (`AgentCoreMemoryStore`,
/// `SqliteMemoryStore`).
pub trait MemoryStore: Send + Sync {
    /// Submit every record in one batch call.
    ///
    /// Records are keyed by `request_identifier`. Whether a repeated
    /// identifier is deduplicated is up to the backing store.
    fn batch_create(
        &self,
        records: &[MemoryRecord],
    ) -> impl std::future::Future<Output = Result<BatchWriteOutcome, MemoryStoreError>> + Send;

    /// List records under a namespace, newest first, up to `limit`.
    fn list(
        &self,
        namespace: &str,
        limit: usize,
    ) -> impl std::future::Future<Output = Result<Vec<MemoryRecordSummary>, MemoryStoreError>> + Send;
}
