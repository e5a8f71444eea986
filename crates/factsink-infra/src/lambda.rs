//! Client for the AWS Lambda Runtime API.
//!
//! A custom runtime polls `/invocation/next`, runs the handler, and reports
//! either `/invocation/<id>/response` or `/invocation/<id>/error`. Startup
//! failures go to `/init/error`. The API host comes from
//! `AWS_LAMBDA_RUNTIME_API`.

use std::time::Duration;

use serde::Serialize;

pub const RUNTIME_API_ENV: &str = "AWS_LAMBDA_RUNTIME_API";

const API_VERSION: &str = "2018-06-01";
const REQUEST_ID_HEADER: &str = "lambda-runtime-aws-request-id";
const DEADLINE_HEADER: &str = "lambda-runtime-deadline-ms";
const FUNCTION_ARN_HEADER: &str = "lambda-runtime-invoked-function-arn";
const TRACE_ID_HEADER: &str = "lambda-runtime-trace-id";

#[derive(Debug, thiserror::Error)]
pub enum RuntimeApiError {
    #[error("{RUNTIME_API_ENV} is not set")]
    MissingEndpoint,

    #[error("invalid runtime API endpoint '{0}'")]
    InvalidEndpoint(String),

    #[error("runtime API request failed: {0}")]
    Request(String),

    #[error("runtime API returned HTTP {status}: {message}")]
    Http { status: u16, message: String },

    #[error("invocation is missing the {0} header")]
    MissingHeader(&'static str),
}

/// One event handed to the function.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub request_id: String,
    pub deadline_ms: Option<u64>,
    pub function_arn: Option<String>,
    pub trace_id: Option<String>,
    pub body: Vec<u8>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorReport<'a> {
    error_message: &'a str,
    error_type: &'a str,
}

pub struct LambdaRuntimeClient {
    client: reqwest::Client,
    base: reqwest::Url,
}

impl LambdaRuntimeClient {
    /// `endpoint` is `host:port` as Lambda provides it, or a full URL.
    pub fn new(endpoint: &str) -> Result<Self, RuntimeApiError> {
        let raw = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
            format!("{}/{API_VERSION}/", endpoint.trim_end_matches('/'))
        } else {
            format!("http://{endpoint}/{API_VERSION}/")
        };
        let base = reqwest::Url::parse(&raw)
            .map_err(|_| RuntimeApiError::InvalidEndpoint(endpoint.to_string()))?;

        // No request timeout: /next long-polls until an event arrives.
        let client = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .build()
            .map_err(|e| RuntimeApiError::Request(e.to_string()))?;

        Ok(Self { client, base })
    }

    pub fn from_env() -> Result<Self, RuntimeApiError> {
        let endpoint = std::env::var(RUNTIME_API_ENV)
            .ok()
            .filter(|v| !v.trim().is_empty())
            .ok_or(RuntimeApiError::MissingEndpoint)?;
        Self::new(&endpoint)
    }

    fn url(&self, path: &str) -> Result<reqwest::Url, RuntimeApiError> {
        self.base
            .join(path)
            .map_err(|e| RuntimeApiError::InvalidEndpoint(format!("{path}: {e}")))
    }

    /// Block until the next event is available.
    pub async fn next_invocation(&self) -> Result<Invocation, RuntimeApiError> {
        let response = self
            .client
            .get(self.url("runtime/invocation/next")?)
            .send()
            .await
            .map_err(|e| RuntimeApiError::Request(e.to_string()))?;
        let response = check_status(response).await?;

        let header = |name: &str| {
            response
                .headers()
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::to_string)
        };

        let request_id =
            header(REQUEST_ID_HEADER).ok_or(RuntimeApiError::MissingHeader(REQUEST_ID_HEADER))?;
        let deadline_ms = header(DEADLINE_HEADER).and_then(|v| v.parse().ok());
        let function_arn = header(FUNCTION_ARN_HEADER);
        let trace_id = header(TRACE_ID_HEADER);

        let body = response
            .bytes()
            .await
            .map_err(|e| RuntimeApiError::Request(e.to_string()))?
            .to_vec();

        Ok(Invocation {
            request_id,
            deadline_ms,
            function_arn,
            trace_id,
            body,
        })
    }

    pub async fn send_response(
        &self,
        request_id: &str,
        body: &serde_json::Value,
    ) -> Result<(), RuntimeApiError> {
        let url = self.url(&format!("runtime/invocation/{request_id}/response"))?;
        self.post(url, body).await
    }

    pub async fn send_error(
        &self,
        request_id: &str,
        error_type: &str,
        message: &str,
    ) -> Result<(), RuntimeApiError> {
        let url = self.url(&format!("runtime/invocation/{request_id}/error"))?;
        self.post(
            url,
            &ErrorReport {
                error_message: message,
                error_type,
            },
        )
        .await
    }

    /// Report a failure that happened before the first invocation.
    pub async fn init_error(&self, error_type: &str, message: &str) -> Result<(), RuntimeApiError> {
        let url = self.url("runtime/init/error")?;
        self.post(
            url,
            &ErrorReport {
                error_message: message,
                error_type,
            },
        )
        .await
    }

    async fn post(&self, url: reqwest::Url, body: &impl Serialize) -> Result<(), RuntimeApiError> {
        let response = self
            .client
            .post(url)
            .json(body)
            .send()
            .await
            .map_err(|e| RuntimeApiError::Request(e.to_string()))?;
        check_status(response).await.map(|_| ())
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RuntimeApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    Err(RuntimeApiError::Http {
        status: status.as_u16(),
        message: crate::aws::error_body(response).await,
    })
}
