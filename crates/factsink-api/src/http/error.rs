//! Application error type mapping to HTTP status codes and envelope format.
//!
//! SNS retries any delivery that does not get a 2xx, so only events that
//! can never succeed are answered with 4xx.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use factsink_infra::sns::SubscriptionError;
use factsink_types::error::PipelineError;

use crate::http::response::ApiResponse;

#[derive(Debug)]
pub enum AppError {
    Pipeline(PipelineError),
    Subscription(SubscriptionError),
}

impl From<PipelineError> for AppError {
    fn from(e: PipelineError) -> Self {
        AppError::Pipeline(e)
    }
}

impl From<SubscriptionError> for AppError {
    fn from(e: SubscriptionError) -> Self {
        AppError::Subscription(e)
    }
}

impl AppError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            AppError::Pipeline(e) if e.is_client_error() => (StatusCode::BAD_REQUEST, e.kind()),
            AppError::Pipeline(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.kind()),
            AppError::Subscription(SubscriptionError::UntrustedUrl(_)) => {
                (StatusCode::BAD_REQUEST, "UNTRUSTED_SUBSCRIBE_URL")
            }
            AppError::Subscription(_) => (StatusCode::BAD_GATEWAY, "SUBSCRIPTION_CONFIRMATION_FAILED"),
        }
    }

    fn message(&self) -> String {
        match self {
            AppError::Pipeline(e) => e.to_string(),
            AppError::Subscription(e) => e.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();
        let message = self.message();

        if status.is_server_error() {
            tracing::error!(code, error = %message, "SNS delivery failed");
        } else {
            tracing::warn!(code, error = %message, "SNS delivery rejected");
        }

        let body = ApiResponse::error(code, &message, uuid::Uuid::now_v7().to_string());
        (status, axum::Json(body)).into_response()
    }
}
