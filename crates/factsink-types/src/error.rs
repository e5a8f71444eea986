use thiserror::Error;

/// Terminal failures of the extraction pipeline.
///
/// Every variant is fatal for the notification being processed. Nothing in
/// the pipeline retries; redelivery is up to whatever invoked it.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("malformed payload reference: {0}")]
    MalformedReference(String),

    #[error("invalid notification: {0}")]
    InvalidNotification(String),

    #[error("payload retrieval failed: {0}")]
    PayloadRetrieval(String),

    #[error("extraction failed: {0}")]
    ExtractionFormat(String),

    #[error("persistence failed: {0}")]
    Persistence(String),
}

impl PipelineError {
    /// Stable error type name, reported to the Lambda runtime as `errorType`.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::MalformedReference(_) => "MalformedReferenceError",
            PipelineError::InvalidNotification(_) => "InvalidNotificationError",
            PipelineError::PayloadRetrieval(_) => "PayloadRetrievalError",
            PipelineError::ExtractionFormat(_) => "ExtractionFormatError",
            PipelineError::Persistence(_) => "PersistenceError",
        }
    }

    /// Whether the inbound event itself was unusable (as opposed to a
    /// downstream service failing).
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            PipelineError::MalformedReference(_) | PipelineError::InvalidNotification(_)
        )
    }
}

/// Errors from object storage reads.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("object not found: {0}")]
    NotFound(String),

    #[error("access denied: {0}")]
    AccessDenied(String),

    #[error("storage request failed: {0}")]
    Request(String),

    #[error("storage service returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("io error: {0}")]
    Io(String),
}

/// Errors from memory store operations.
#[derive(Debug, Error)]
pub enum MemoryStoreError {
    #[error("memory store request failed: {0}")]
    Request(String),

    #[error("memory store rejected request (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("memory store response malformed: {0}")]
    Deserialization(String),

    #[error("database error: {0}")]
    Database(String),
}

/// Errors raised while resolving process configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("required configuration '{0}' is not set")]
    Missing(&'static str),

    #[error("invalid value for '{field}': {message}")]
    Invalid { field: &'static str, message: String },

    #[error("failed to read config file {path}: {message}")]
    Read { path: String, message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_error_kinds() {
        assert_eq!(
            PipelineError::MalformedReference("x".into()).kind(),
            "MalformedReferenceError"
        );
        assert_eq!(
            PipelineError::Persistence("x".into()).kind(),
            "PersistenceError"
        );
    }

    #[test]
    fn test_client_error_classification() {
        assert!(PipelineError::InvalidNotification("x".into()).is_client_error());
        assert!(PipelineError::MalformedReference("x".into()).is_client_error());
        assert!(!PipelineError::PayloadRetrieval("x".into()).is_client_error());
        assert!(!PipelineError::ExtractionFormat("x".into()).is_client_error());
    }

    #[test]
    fn test_config_error_display() {
        let err = ConfigError::Missing("AGENTCORE_MEMORY_ID");
        assert_eq!(
            err.to_string(),
            "required configuration 'AGENTCORE_MEMORY_ID' is not set"
        );
    }

    #[test]
    fn test_storage_error_display() {
        let err = StorageError::Http {
            status: 503,
            message: "slow down".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "storage service returned HTTP 503: slow down"
        );
    }
}
