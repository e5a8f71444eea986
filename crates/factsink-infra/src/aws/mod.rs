//! Minimal AWS plumbing shared by the S3, Bedrock and AgentCore adapters:
//! credentials, SigV4 signing and a signed-request helper on top of reqwest.

pub mod credentials;
pub mod sigv4;

use std::time::Duration;

use chrono::Utc;

pub use credentials::AwsCredentials;
pub use sigv4::SigningError;

use sigv4::{SignableRequest, SigningParams};

/// Build the shared HTTP client used for AWS calls.
pub fn http_client(timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder()
        .timeout(timeout)
        .connect_timeout(Duration::from_secs(10))
        .build()
}

/// Signs requests for one service in one region.
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: AwsCredentials,
    region: String,
    service: &'static str,
}

impl RequestSigner {
    pub fn new(credentials: AwsCredentials, region: impl Into<String>, service: &'static str) -> Self {
        Self {
            credentials,
            region: region.into(),
            service,
        }
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Build a signed request. `body` is sent as-is; a JSON body should pass
    /// `Some("application/json")` so the content type is signed too.
    pub fn signed_request(
        &self,
        client: &reqwest::Client,
        method: reqwest::Method,
        url: reqwest::Url,
        content_type: Option<&str>,
        body: Vec<u8>,
    ) -> Result<reqwest::RequestBuilder, SigningError> {
        let extra: Vec<(&str, &str)> = content_type
            .map(|ct| vec![("content-type", ct)])
            .unwrap_or_default();

        let headers = sigv4::sign(
            &SignableRequest {
                method: method.as_str(),
                url: &url,
                headers: &extra,
                body: &body,
            },
            &SigningParams {
                credentials: &self.credentials,
                region: &self.region,
                service: self.service,
                time: Utc::now(),
            },
        )?;

        let mut builder = client.request(method, url);
        for (name, value) in extra {
            builder = builder.header(name, value);
        }
        for (name, value) in headers {
            builder = builder.header(name, value);
        }
        if !body.is_empty() {
            builder = builder.body(body);
        }
        Ok(builder)
    }
}

/// Read an error response body for logging, capped so a large HTML error
/// page does not flood the logs.
pub(crate) async fn error_body(response: reqwest::Response) -> String {
    let text = response.text().await.unwrap_or_default();
    text.chars().take(1024).collect()
}
