//! SNS subscription confirmation for the HTTP endpoint.
//!
//! SNS sends a `SubscriptionConfirmation` with a `SubscribeURL`; visiting it
//! activates the subscription. Only `https` URLs on a regional SNS host
//! (`sns.<region>.amazonaws.com`, or `.amazonaws.com.cn` in China) are
//! followed, so a forged message cannot point us at another AWS-hosted
//! service such as an S3 bucket.

use std::time::Duration;

#[derive(Debug, thiserror::Error)]
pub enum SubscriptionError {
    #[error("refusing to confirm subscription via '{0}'")]
    UntrustedUrl(String),

    #[error("confirmation request failed: {0}")]
    Request(String),

    #[error("confirmation returned HTTP {status}: {message}")]
    Http { status: u16, message: String },
}

#[derive(Clone)]
pub struct SubscriptionConfirmer {
    client: reqwest::Client,
    allow_any_host: bool,
}

impl SubscriptionConfirmer {
    pub fn new() -> Result<Self, SubscriptionError> {
        let client = crate::aws::http_client(Duration::from_secs(10))
            .map_err(|e| SubscriptionError::Request(e.to_string()))?;
        Ok(Self {
            client,
            allow_any_host: false,
        })
    }

    /// Skip the host check. Only for pointing at a local mock.
    pub fn allow_any_host(mut self) -> Self {
        self.allow_any_host = true;
        self
    }

    fn validate(&self, subscribe_url: &str) -> Result<reqwest::Url, SubscriptionError> {
        let untrusted = || SubscriptionError::UntrustedUrl(subscribe_url.to_string());
        let url = reqwest::Url::parse(subscribe_url).map_err(|_| untrusted())?;
        if self.allow_any_host {
            return Ok(url);
        }
        let trusted = url.scheme() == "https" && url.host_str().is_some_and(is_sns_host);
        if trusted { Ok(url) } else { Err(untrusted()) }
    }

    #[tracing::instrument(skip(self, topic_arn), fields(topic_arn = topic_arn.unwrap_or("")))]
    pub async fn confirm(
        &self,
        subscribe_url: &str,
        topic_arn: Option<&str>,
    ) -> Result<(), SubscriptionError> {
        let url = self.validate(subscribe_url)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| SubscriptionError::Request(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(SubscriptionError::Http {
                status: status.as_u16(),
                message: crate::aws::error_body(response).await,
            });
        }
        tracing::info!("SNS subscription confirmed");
        Ok(())
    }
}

fn is_sns_host(host: &str) -> bool {
    let Some(rest) = host.strip_prefix("sns.") else {
        return false;
    };
    let region = rest
        .strip_suffix(".amazonaws.com")
        .or_else(|| rest.strip_suffix(".amazonaws.com.cn"));
    region.is_some_and(|r| {
        !r.is_empty() && r.bytes().all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
    })
}
