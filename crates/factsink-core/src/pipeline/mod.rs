//! The extraction pipeline: from a payload reference to stored records.

pub mod handler;
pub mod location;
pub mod transcript;

pub use handler::TranscriptExtractionHandler;
