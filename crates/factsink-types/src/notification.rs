//! Inbound notification shapes.
//!
//! A [`DeliveryNotification`] only carries a pointer to the conversation
//! payload. It reaches us wrapped in one of two SNS envelopes: the Lambda
//! event (`Records[].Sns.Message`) or an SNS HTTP(S) subscription POST.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The decoded message body: a reference to the payload in object storage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryNotification {
    #[serde(rename = "s3PayloadLocation")]
    pub s3_payload_location: String,
}

/// Bucket and key of a payload object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadLocation {
    pub bucket: String,
    /// Object key, without a leading `/`.
    pub key: String,
}

impl fmt::Display for PayloadLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Lambda event produced by an SNS subscription.
#[derive(Debug, Clone, Deserialize)]
pub struct LambdaSnsEvent {
    #[serde(rename = "Records", default)]
    pub records: Vec<LambdaSnsRecord>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LambdaSnsRecord {
    #[serde(rename = "Sns")]
    pub sns: SnsRecordBody,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SnsRecordBody {
    #[serde(rename = "MessageId", default)]
    pub message_id: Option<String>,
    #[serde(rename = "TopicArn", default)]
    pub topic_arn: Option<String>,
    /// JSON-encoded [`DeliveryNotification`].
    #[serde(rename = "Message")]
    pub message: String,
}

/// Message types SNS posts to an HTTP(S) subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub enum SnsMessageType {
    Notification,
    SubscriptionConfirmation,
    UnsubscribeConfirmation,
}

/// Body of an SNS HTTP(S) delivery.
#[derive(Debug, Clone, Deserialize)]
pub struct SnsHttpMessage {
    #[serde(rename = "Type")]
    pub message_type: SnsMessageType,
    #[serde(rename = "MessageId", default)]
    pub message_id: Option<String>,
    #[serde(rename = "TopicArn", default)]
    pub topic_arn: Option<String>,
    #[serde(rename = "Message", default)]
    pub message: String,
    #[serde(rename = "SubscribeURL", default)]
    pub subscribe_url: Option<String>,
}
