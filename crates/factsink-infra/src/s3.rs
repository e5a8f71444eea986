//! S3ObjectStore -- [`ObjectStore`] over the S3 REST API.
//!
//! Plain SigV4-signed `GET`s. Virtual-hosted addressing is used unless the
//! bucket name contains a dot (which breaks the wildcard TLS certificate)
//! or a custom endpoint is configured, in which case path-style is used.

use std::time::Duration;

use factsink_core::storage::object_store::ObjectStore;
use factsink_types::error::StorageError;
use factsink_types::notification::PayloadLocation;

use crate::aws::sigv4::{encode_path, uri_encode};
use crate::aws::{AwsCredentials, RequestSigner, error_body, http_client};

const SERVICE: &str = "s3";

pub struct S3ObjectStore {
    client: reqwest::Client,
    signer: RequestSigner,
    endpoint: Option<reqwest::Url>,
}

impl S3ObjectStore {
    pub fn new(credentials: AwsCredentials, region: impl Into<String>) -> Result<Self, StorageError> {
        let client = http_client(Duration::from_secs(30))
            .map_err(|e| StorageError::Request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            signer: RequestSigner::new(credentials, region, SERVICE),
            endpoint: None,
        })
    }

    /// Send requests to `endpoint` (path-style) instead of AWS.
    pub fn with_endpoint(mut self, endpoint: reqwest::Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Object URL for `location`. A `.` or `..` key segment is refused since
    /// URL parsing would resolve it away and address another object.
    fn object_url(&self, location: &PayloadLocation) -> Result<reqwest::Url, StorageError> {
        if location.key.split('/').any(|s| s == "." || s == "..") {
            return Err(StorageError::Request(format!(
                "object key has a dot segment: {location}"
            )));
        }
        let key_path = encode_path(location.key.split('/'));
        let bucket = uri_encode(&location.bucket, true);

        let raw = match &self.endpoint {
            Some(endpoint) => format!(
                "{}/{bucket}{key_path}",
                endpoint.as_str().trim_end_matches('/')
            ),
            None if location.bucket.contains('.') => format!(
                "https://s3.{}.amazonaws.com/{bucket}{key_path}",
                self.signer.region()
            ),
            None => format!(
                "https://{bucket}.s3.{}.amazonaws.com{key_path}",
                self.signer.region()
            ),
        };

        reqwest::Url::parse(&raw)
            .map_err(|e| StorageError::Request(format!("invalid object URL {raw}: {e}")))
    }
}

impl ObjectStore for S3ObjectStore {
    #[tracing::instrument(name = "s3_get_object", skip_all, fields(bucket = %location.bucket, key = %location.key))]
    async fn get_object(&self, location: &PayloadLocation) -> Result<Vec<u8>, StorageError> {
        let url = self.object_url(location)?;

        let response = self
            .signer
            .signed_request(&self.client, reqwest::Method::GET, url, None, Vec::new())
            .map_err(|e| StorageError::Request(e.to_string()))?
            .send()
            .await
            .map_err(|e| StorageError::Request(format!("HTTP request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = error_body(response).await;
            tracing::warn!(status = %status, body = %body, "S3 error response");
            return Err(match status.as_u16() {
                404 => StorageError::NotFound(location.to_string()),
                403 => StorageError::AccessDenied(location.to_string()),
                s => StorageError::Http {
                    status: s,
                    message: body,
                },
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| StorageError::Request(format!("failed to read object body: {e}")))?;
        tracing::debug!(size = bytes.len(), "Fetched payload object");
        Ok(bytes.to_vec())
    }
}
