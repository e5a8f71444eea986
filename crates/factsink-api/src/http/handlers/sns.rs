//! SNS HTTP(S) subscription endpoint.
//!
//! SNS posts its JSON with `Content-Type: text/plain`, so the body is taken
//! as raw bytes and the event shape is detected from its keys.

use std::time::Instant;

use axum::Json;
use axum::body::Bytes;
use axum::extract::State;
use uuid::Uuid;

use factsink_core::message::{InboundEvent, decode_event};
use factsink_types::memory::ProcessOutcome;

use crate::http::error::AppError;
use crate::http::response::ApiResponse;
use crate::state::AppState;

/// POST /sns - Receive one SNS delivery.
///
/// - `Notification` (or a bare delivery notification) runs the pipeline.
/// - `SubscriptionConfirmation` visits the `SubscribeURL`.
/// - `UnsubscribeConfirmation` is acknowledged and ignored.
pub async fn receive_sns(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<ApiResponse<ProcessOutcome>>, AppError> {
    let start = Instant::now();
    let request_id = Uuid::now_v7().to_string();

    let outcome = match decode_event(&body)? {
        InboundEvent::Notifications(notifications) => {
            tracing::debug!(
                request_id = %request_id,
                count = notifications.len(),
                "SNS notification received"
            );
            state.processor.process_all(&notifications).await?
        }
        InboundEvent::SubscriptionConfirmation {
            subscribe_url,
            topic_arn,
        } => {
            state
                .confirmer
                .confirm(&subscribe_url, topic_arn.as_deref())
                .await?;
            ProcessOutcome::stored(0)
        }
        InboundEvent::UnsubscribeConfirmation { topic_arn } => {
            tracing::info!(topic_arn = topic_arn.as_deref().unwrap_or(""), "SNS unsubscribed");
            ProcessOutcome::stored(0)
        }
    };

    let elapsed = start.elapsed().as_millis() as u64;
    Ok(Json(ApiResponse::success(outcome, request_id, elapsed)))
}
