//! Inbound event decoding.
//!
//! Three shapes are accepted and told apart by their top-level keys:
//! - `Records`: a Lambda event produced by an SNS subscription
//! - `Type`: an SNS HTTP(S) delivery
//! - `s3PayloadLocation`: a bare notification, as replayed from the CLI

use serde_json::Value;

use factsink_types::error::PipelineError;
use factsink_types::notification::{
    DeliveryNotification, LambdaSnsEvent, SnsHttpMessage, SnsMessageType,
};

/// What an inbound event asks us to do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InboundEvent {
    /// Notifications to run through the pipeline, in delivery order.
    Notifications(Vec<DeliveryNotification>),
    /// SNS wants the subscription confirmed by fetching `subscribe_url`.
    SubscriptionConfirmation {
        subscribe_url: String,
        topic_arn: Option<String>,
    },
    /// SNS reports the endpoint was unsubscribed. Nothing to do.
    UnsubscribeConfirmation { topic_arn: Option<String> },
}

/// Decode an SNS `Message` string into a [`DeliveryNotification`].
pub fn decode_message(message: &str) -> Result<DeliveryNotification, PipelineError> {
    serde_json::from_str(message).map_err(|e| {
        PipelineError::InvalidNotification(format!("message is not a delivery notification: {e}"))
    })
}

/// Decode a raw event body of any supported shape.
pub fn decode_event(body: &[u8]) -> Result<InboundEvent, PipelineError> {
    let value: Value = serde_json::from_slice(body)
        .map_err(|e| PipelineError::InvalidNotification(format!("event is not JSON: {e}")))?;

    let Value::Object(map) = &value else {
        return Err(PipelineError::InvalidNotification(
            "event is not a JSON object".to_string(),
        ));
    };

    if map.contains_key("Records") {
        decode_lambda_event(value)
    } else if map.contains_key("Type") {
        decode_sns_http(value)
    } else if map.contains_key("s3PayloadLocation") {
        let notification = serde_json::from_value(value).map_err(|e| {
            PipelineError::InvalidNotification(format!("bad notification: {e}"))
        })?;
        Ok(InboundEvent::Notifications(vec![notification]))
    } else {
        Err(PipelineError::InvalidNotification(
            "unrecognized event shape".to_string(),
        ))
    }
}

fn decode_lambda_event(value: Value) -> Result<InboundEvent, PipelineError> {
    let event: LambdaSnsEvent = serde_json::from_value(value)
        .map_err(|e| PipelineError::InvalidNotification(format!("bad SNS event: {e}")))?;

    if event.records.is_empty() {
        return Err(PipelineError::InvalidNotification(
            "event has no records".to_string(),
        ));
    }

    let notifications = event
        .records
        .iter()
        .map(|record| {
            tracing::debug!(
                message_id = record.sns.message_id.as_deref(),
                topic_arn = record.sns.topic_arn.as_deref(),
                "Decoding SNS record"
            );
            decode_message(&record.sns.message)
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(InboundEvent::Notifications(notifications))
}

fn decode_sns_http(value: Value) -> Result<InboundEvent, PipelineError> {
    let message: SnsHttpMessage = serde_json::from_value(value)
        .map_err(|e| PipelineError::InvalidNotification(format!("bad SNS message: {e}")))?;

    match message.message_type {
        SnsMessageType::Notification => Ok(InboundEvent::Notifications(vec![decode_message(
            &message.message,
        )?])),
        SnsMessageType::SubscriptionConfirmation => {
            let subscribe_url = message.subscribe_url.ok_or_else(|| {
                PipelineError::InvalidNotification(
                    "subscription confirmation without SubscribeURL".to_string(),
                )
            })?;
            Ok(InboundEvent::SubscriptionConfirmation {
                subscribe_url,
                topic_arn: message.topic_arn,
            })
        }
        SnsMessageType::UnsubscribeConfirmation => Ok(InboundEvent::UnsubscribeConfirmation {
            topic_arn: message.topic_arn,
        }),
    }
}
