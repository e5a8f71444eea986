//! SQLite storage layer.
//!
//! A local [`MemoryStore`](factsink_core::memory::store::MemoryStore) backed
//! by SQLite with WAL mode and split read/write connection pools.

pub mod memory;
pub mod pool;

pub use memory::SqliteMemoryStore;
pub use pool::DatabasePool;
