//! Facts as returned by the extraction model.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A single fact proposed by the model.
///
/// Every field is optional because the model output is only shaped by the
/// prompt. `confidence` is advisory and never enforced. A non-string key is
/// kept in its compact JSON form and a non-numeric confidence is dropped, so
/// one odd fact never fails the whole reply.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractedFact {
    #[serde(default, deserialize_with = "key_from_any")]
    pub key: Option<String>,
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, deserialize_with = "number_or_none")]
    pub confidence: Option<f64>,
}

fn key_from_any<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Option::<Value>::deserialize(deserializer)? {
        None | Some(Value::Null) => None,
        Some(Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}

fn number_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
    Ok(Option::<Value>::deserialize(deserializer)?.and_then(|v| v.as_f64()))
}

impl ExtractedFact {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: Some(key.into()),
            value: Some(Value::String(value.into())),
            confidence: None,
        }
    }
}

/// The JSON object the model is instructed to return.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExtractionOutput {
    #[serde(default)]
    pub facts: Vec<ExtractedFact>,
}
