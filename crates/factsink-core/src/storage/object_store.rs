//! Object store trait.

use factsink_types::error::StorageError;
use factsink_types::notification::PayloadLocation;

/// Read-only access to payload objects.
///
/// Uses RPITIT (native async fn in traits, Rust 2024 edition).
pub trait ObjectStore: Send + Sync {
    /// Fetch the full body of the object at `location`.
    fn get_object(
        &self,
        location: &PayloadLocation,
    ) -> impl std::future::Future<Output = Result<Vec<u8>, StorageError>> + Send;
}
