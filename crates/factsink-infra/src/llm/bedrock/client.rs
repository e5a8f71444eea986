//! BedrockProvider -- concrete [`LlmProvider`] implementation for AWS Bedrock.
//!
//! Sends non-streaming `invoke` requests to the Bedrock Runtime API. Two
//! authentication modes are supported:
//! - SigV4 with the ambient AWS credentials (the Lambda execution role)
//! - a Bedrock API key sent as a Bearer token
//!
//! Secrets are wrapped in [`secrecy::SecretString`] and are never logged
//! or included in `Debug` output.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::Instrument;

use factsink_core::llm::provider::LlmProvider;
use factsink_types::llm::{CompletionRequest, CompletionResponse, LlmError, StopReason, Usage};

use super::types::{BedrockMessage, BedrockRequest, BedrockResponse};
use crate::aws::sigv4::encode_path;
use crate::aws::{AwsCredentials, RequestSigner, error_body, http_client};

/// Env var holding a Bedrock API key. When set it takes precedence over SigV4.
pub const BEARER_TOKEN_ENV: &str = "AWS_BEARER_TOKEN_BEDROCK";

const SERVICE: &str = "bedrock";

/// How requests are authenticated.
pub enum BedrockAuth {
    SigV4(AwsCredentials),
    Bearer(SecretString),
}

/// AWS Bedrock Claude LLM provider.
pub struct BedrockProvider {
    client: reqwest::Client,
    auth: Auth,
    region: String,
    model_id: String,
    endpoint: Option<reqwest::Url>,
}

enum Auth {
    SigV4(RequestSigner),
    Bearer(SecretString),
}

// BedrockProvider intentionally does NOT derive Debug to prevent
// accidental exposure of credentials.

impl BedrockProvider {
    /// The Anthropic API version for Bedrock.
    const API_VERSION: &'static str = "bedrock-2023-05-31";

    /// Prefix used to identify Bedrock API keys.
    const KEY_PREFIX: &'static str = "bedrock-api-key-";

    /// Create a new Bedrock provider.
    ///
    /// With bearer auth, a `bedrock-api-key-` prefix is stripped and the
    /// remainder used as the token. If the token's embedded credential scope
    /// names a region, that region wins over `region`. `model` is the Bedrock
    /// model ID, inference profile ID or ARN, used exactly as given.
    pub fn new(auth: BedrockAuth, model: &str, region: impl Into<String>) -> Result<Self, LlmError> {
        let client = http_client(Duration::from_secs(120)).map_err(|e| LlmError::Provider {
            message: format!("failed to build HTTP client: {e}"),
        })?;

        let mut region = region.into();
        let auth = match auth {
            BedrockAuth::SigV4(credentials) => {
                Auth::SigV4(RequestSigner::new(credentials, region.clone(), SERVICE))
            }
            BedrockAuth::Bearer(key) => {
                let raw_key = key.expose_secret();
                let token_part = raw_key.strip_prefix(Self::KEY_PREFIX).unwrap_or(raw_key);
                if let Some(detected) = Self::detect_region_from_token(token_part) {
                    region = detected;
                }
                Auth::Bearer(SecretString::from(token_part.to_string()))
            }
        };

        Ok(Self {
            client,
            auth,
            region,
            model_id: model.to_string(),
            endpoint: None,
        })
    }

    /// Pick bearer auth when [`BEARER_TOKEN_ENV`] is set, SigV4 otherwise.
    pub fn from_env(model: &str, region: impl Into<String>) -> Result<Self, LlmError> {
        let auth = match std::env::var(BEARER_TOKEN_ENV) {
            Ok(token) if !token.trim().is_empty() => BedrockAuth::Bearer(SecretString::from(token)),
            _ => BedrockAuth::SigV4(AwsCredentials::from_env().map_err(|e| {
                tracing::error!(error = %e, "No credentials for Bedrock");
                LlmError::AuthenticationFailed
            })?),
        };
        Self::new(auth, model, region)
    }

    /// Send requests to `endpoint` instead of the regional Bedrock endpoint.
    pub fn with_endpoint(mut self, endpoint: reqwest::Url) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Try to extract the AWS region from a base64-encoded presigned URL token.
    ///
    /// The token decodes to a URL like:
    /// `bedrock.amazonaws.com/?...&X-Amz-Credential=AKIA.../20260212/us-east-1/bedrock/aws4_request&...`
    fn detect_region_from_token(token: &str) -> Option<String> {
        use base64::Engine;
        let decoded = base64::engine::general_purpose::STANDARD
            .decode(token)
            .ok()?;
        let text = String::from_utf8(decoded).ok()?;

        let cred_start = text.find("X-Amz-Credential=")?;
        let cred_value = &text[cred_start + "X-Amz-Credential=".len()..];
        // <access-key>/<date>/<region>/<service>/aws4_request, possibly %2F-encoded
        let cred_value = cred_value.replace("%2F", "/");
        let parts: Vec<&str> = cred_value.split('/').collect();
        if parts.len() >= 3 {
            let region = parts[2].split('&').next().unwrap_or(parts[2]);
            tracing::info!(region = %region, "Detected region from Bedrock bearer token");
            Some(region.to_string())
        } else {
            None
        }
    }

    /// Full `invoke` URL. The model ID is encoded as one path segment.
    fn invoke_url(&self) -> Result<reqwest::Url, LlmError> {
        let base = match &self.endpoint {
            Some(endpoint) => endpoint.as_str().trim_end_matches('/').to_string(),
            None => format!("https://bedrock-runtime.{}.amazonaws.com", self.region),
        };
        let raw = format!(
            "{base}{}",
            encode_path(["model", self.model_id.as_str(), "invoke"])
        );
        reqwest::Url::parse(&raw).map_err(|e| LlmError::InvalidRequest(format!("bad URL {raw}: {e}")))
    }

    /// Convert a generic [`CompletionRequest`] into a [`BedrockRequest`].
    fn to_bedrock_request(&self, request: &CompletionRequest) -> BedrockRequest {
        BedrockRequest {
            anthropic_version: Self::API_VERSION.to_string(),
            max_tokens: request.max_tokens,
            messages: request
                .messages
                .iter()
                .map(|m| BedrockMessage {
                    role: m.role.to_string(),
                    content: m.content.clone(),
                })
                .collect(),
        }
    }

    fn build_request(
        &self,
        url: reqwest::Url,
        body: Vec<u8>,
    ) -> Result<reqwest::RequestBuilder, LlmError> {
        match &self.auth {
            Auth::SigV4(signer) => signer
                .signed_request(
                    &self.client,
                    reqwest::Method::POST,
                    url,
                    Some("application/json"),
                    body,
                )
                .map_err(|e| LlmError::Provider {
                    message: format!("request signing failed: {e}"),
                }),
            Auth::Bearer(token) => Ok(self
                .client
                .post(url)
                .header("Authorization", format!("Bearer {}", token.expose_secret()))
                .header("Content-Type", "application/json")
                .body(body)),
        }
    }
}

impl LlmProvider for BedrockProvider {
    fn name(&self) -> &str {
        "bedrock"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<CompletionResponse, LlmError> {
        let span = tracing::info_span!(
            "gen_ai.complete",
            gen_ai.system = "aws.bedrock",
            gen_ai.request.model = %self.model_id,
            gen_ai.request.max_tokens = request.max_tokens,
            gen_ai.usage.input_tokens = tracing::field::Empty,
            gen_ai.usage.output_tokens = tracing::field::Empty,
        );
        self.invoke(request, &span).instrument(span.clone()).await
    }
}

impl BedrockProvider {
    async fn invoke(
        &self,
        request: &CompletionRequest,
        span: &tracing::Span,
    ) -> Result<CompletionResponse, LlmError> {
        let url = self.invoke_url()?;
        let body = serde_json::to_vec(&self.to_bedrock_request(request))
            .map_err(|e| LlmError::InvalidRequest(format!("failed to encode request: {e}")))?;

        tracing::debug!(url = %url, region = %self.region, "Bedrock invoke request");

        let response = self
            .build_request(url, body)?
            .send()
            .await
            .map_err(|e| LlmError::Provider {
                message: format!("HTTP request failed: {e}"),
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = error_body(response).await;
            tracing::warn!(status = %status, body = %error_body, "Bedrock API error response");
            return Err(match status.as_u16() {
                401 | 403 => LlmError::AuthenticationFailed,
                400 | 404 | 422 => LlmError::InvalidRequest(format!("HTTP {status}: {error_body}")),
                429 => LlmError::RateLimited {
                    retry_after_ms: None,
                },
                503 | 529 => LlmError::Overloaded(error_body),
                s if s >= 500 => LlmError::Provider {
                    message: format!("Bedrock server error HTTP {status}: {error_body}"),
                },
                _ => LlmError::Provider {
                    message: format!("HTTP {status}: {error_body}"),
                },
            });
        }

        let bedrock_resp: BedrockResponse = response.json().await.map_err(|e| {
            LlmError::Deserialization(format!("failed to parse response: {e}"))
        })?;

        span.record("gen_ai.usage.input_tokens", bedrock_resp.usage.input_tokens);
        span.record("gen_ai.usage.output_tokens", bedrock_resp.usage.output_tokens);

        let stop_reason = match bedrock_resp.stop_reason.as_deref() {
            Some("max_tokens") => StopReason::MaxTokens,
            Some("stop_sequence") => StopReason::StopSequence,
            _ => StopReason::EndTurn,
        };

        Ok(CompletionResponse {
            content: bedrock_resp.text(),
            id: bedrock_resp.id,
            model: bedrock_resp.model,
            stop_reason,
            usage: Usage {
                input_tokens: bedrock_resp.usage.input_tokens,
                output_tokens: bedrock_resp.usage.output_tokens,
            },
        })
    }
}
