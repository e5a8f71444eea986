//! Lambda custom runtime loop.
//!
//! One invocation at a time: fetch the event, run every notification in it,
//! report the merged outcome or the first failure, repeat. A handler error
//! is reported to Lambda and the loop keeps going; only Runtime API failures
//! end the process.

use std::future::Future;

use anyhow::{Context, Result};
use tracing::Instrument;

use factsink_core::message::{InboundEvent, decode_event};
use factsink_infra::lambda::{Invocation, LambdaRuntimeClient};
use factsink_types::error::PipelineError;
use factsink_types::memory::ProcessOutcome;

use crate::state::AppState;

/// Run until the Runtime API becomes unreachable.
///
/// `init` builds the state; if it fails the error goes to `/init/error` and
/// is returned so the process exits non-zero.
pub async fn run(
    client: LambdaRuntimeClient,
    init: impl Future<Output = Result<AppState>>,
) -> Result<()> {
    let state = match init.await {
        Ok(state) => state,
        Err(e) => {
            let message = format!("{e:#}");
            tracing::error!(error = %message, "Initialization failed");
            if let Err(report) = client.init_error("InitializationError", &message).await {
                tracing::error!(error = %report, "Could not report init error");
            }
            return Err(e);
        }
    };

    tracing::info!("Lambda runtime loop started");
    loop {
        let invocation = client
            .next_invocation()
            .await
            .context("Failed to fetch next invocation")?;
        handle_invocation(&client, &state, invocation).await?;
    }
}

async fn handle_invocation(
    client: &LambdaRuntimeClient,
    state: &AppState,
    invocation: Invocation,
) -> Result<()> {
    let span = tracing::info_span!(
        "invocation",
        request_id = %invocation.request_id,
        trace_id = invocation.trace_id.as_deref().unwrap_or(""),
    );

    async {
        match process_event(state, &invocation.body).await {
            Ok(outcome) => {
                tracing::info!(stored = outcome.stored, "Invocation succeeded");
                let body = serde_json::to_value(outcome)?;
                client
                    .send_response(&invocation.request_id, &body)
                    .await
                    .context("Failed to send invocation response")?;
            }
            Err(e) => {
                tracing::error!(error_type = e.kind(), error = %e, "Invocation failed");
                client
                    .send_error(&invocation.request_id, e.kind(), &e.to_string())
                    .await
                    .context("Failed to send invocation error")?;
            }
        }
        Ok::<_, anyhow::Error>(())
    }
    .instrument(span)
    .await
}

/// Decode a Lambda event and run it through the processor.
pub async fn process_event(state: &AppState, body: &[u8]) -> Result<ProcessOutcome, PipelineError> {
    match decode_event(body)? {
        InboundEvent::Notifications(notifications) => {
            state.processor.process_all(&notifications).await
        }
        // Lambda subscriptions are confirmed by SNS itself.
        InboundEvent::SubscriptionConfirmation { topic_arn, .. }
        | InboundEvent::UnsubscribeConfirmation { topic_arn } => {
            tracing::warn!(
                topic_arn = topic_arn.as_deref().unwrap_or(""),
                "Ignoring subscription message delivered to Lambda"
            );
            Ok(ProcessOutcome::stored(0))
        }
    }
}
