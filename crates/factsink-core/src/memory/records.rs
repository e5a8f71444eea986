//! Mapping extracted facts to memory records.
//!
//! The request identifier is `<sessionId>-<key>`, so the same fact from the
//! same session always lands on the same identifier. Every record in a batch
//! shares one timestamp, taken when the batch is assembled.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use serde_json::Value;

use factsink_types::fact::ExtractedFact;
use factsink_types::memory::{MemoryContent, MemoryRecord};

/// Stand-in for a fact that arrived without a key.
pub const UNKNOWN_KEY: &str = "unknown";

/// `<session>-<key>`, with [`UNKNOWN_KEY`] for a keyless fact.
pub fn request_identifier(session_id: &str, key: Option<&str>) -> String {
    format!("{session_id}-{}", key.unwrap_or(UNKNOWN_KEY))
}

/// `<key>: <value>`.
///
/// String values are used verbatim, other JSON values are rendered compactly
/// and a missing value renders as an empty string.
pub fn fact_text(fact: &ExtractedFact) -> String {
    let key = fact.key.as_deref().unwrap_or(UNKNOWN_KEY);
    let value = match &fact.value {
        None | Some(Value::Null) => String::new(),
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
    };
    format!("{key}: {value}")
}

/// Build one record per fact, all stamped with `timestamp`.
pub fn map_facts(
    session_id: &str,
    facts: &[ExtractedFact],
    namespaces: &[String],
    timestamp: DateTime<Utc>,
) -> Vec<MemoryRecord> {
    facts
        .iter()
        .map(|fact| MemoryRecord {
            request_identifier: request_identifier(session_id, fact.key.as_deref()),
            namespaces: namespaces.to_vec(),
            content: MemoryContent {
                text: fact_text(fact),
            },
            timestamp,
        })
        .collect()
}

/// Drops facts whose key is on a configured denylist.
///
/// Matching is case-insensitive on the trimmed key. An empty filter passes
/// everything through.
#[derive(Debug, Clone, Default)]
pub struct FactFilter {
    denied: HashSet<String>,
}

impl FactFilter {
    pub fn new<S: AsRef<str>>(keys: &[S]) -> Self {
        let denied = keys
            .iter()
            .map(|k| k.as_ref().trim().to_lowercase())
            .filter(|k| !k.is_empty())
            .collect();
        Self { denied }
    }

    pub fn is_empty(&self) -> bool {
        self.denied.is_empty()
    }

    pub fn is_denied(&self, fact: &ExtractedFact) -> bool {
        fact.key
            .as_deref()
            .is_some_and(|k| self.denied.contains(&k.trim().to_lowercase()))
    }

    /// Keep only the facts that are not denied.
    pub fn apply(&self, facts: Vec<ExtractedFact>) -> Vec<ExtractedFact> {
        if self.is_empty() {
            return facts;
        }
        facts
            .into_iter()
            .filter(|fact| {
                if self.is_denied(fact) {
                    tracing::warn!(
                        key = fact.key.as_deref().unwrap_or(UNKNOWN_KEY),
                        "Dropping fact with denied key"
                    );
                    false
                } else {
                    true
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn root() -> Vec<String> {
        vec!["/".to_string()]
    }

    #[test]
    fn test_maps_named_fact() {
        let now = Utc::now();
        let records = map_facts("S1", &[ExtractedFact::new("name", "Ann")], &root(), now);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].request_identifier, "S1-name");
        assert_eq!(records[0].content.text, "name: Ann");
        assert_eq!(records[0].namespaces, vec!["/".to_string()]);
        assert_eq!(records[0].timestamp, now);
    }

    #[test]
    fn test_keyless_fact_uses_unknown() {
        let fact = ExtractedFact {
            key: None,
            value: Some(Value::from("blue")),
            confidence: Some(0.4),
        };
        let records = map_facts("S1", &[fact], &root(), Utc::now());
        assert_eq!(records[0].request_identifier, "S1-unknown");
        assert_eq!(records[0].content.text, "unknown: blue");
    }

    #[test]
    fn test_non_string_and_missing_values() {
        let number = ExtractedFact {
            key: Some("age".to_string()),
            value: Some(Value::from(42)),
            confidence: None,
        };
        let missing = ExtractedFact {
            key: Some("nickname".to_string()),
            value: None,
            confidence: None,
        };
        assert_eq!(fact_text(&number), "age: 42");
        assert_eq!(fact_text(&missing), "nickname: ");
    }

    #[test]
    fn test_batch_shares_one_timestamp() {
        let ts = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        let facts = vec![
            ExtractedFact::new("name", "Ann"),
            ExtractedFact::new("contact", "email"),
        ];
        let records = map_facts("S9", &facts, &root(), ts);
        assert!(records.iter().all(|r| r.timestamp == ts));
        assert_eq!(records[1].request_identifier, "S9-contact");
    }

    #[test]
    fn test_identifier_is_stable_per_session_and_key() {
        assert_eq!(
            request_identifier("S1", Some("name")),
            request_identifier("S1", Some("name"))
        );
        assert_ne!(
            request_identifier("S1", Some("name")),
            request_identifier("S2", Some("name"))
        );
    }

    #[test]
    fn test_empty_facts_map_to_no_records() {
        assert!(map_facts("S1", &[], &root(), Utc::now()).is_empty());
    }

    #[test]
    fn test_filter_drops_denied_keys_case_insensitively() {
        let filter = FactFilter::new(&["SSN", " password "]);
        let kept = filter.apply(vec![
            ExtractedFact::new("ssn", "123-45-6789"),
            ExtractedFact::new("Password", "hunter2"),
            ExtractedFact::new("name", "Ann"),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].key.as_deref(), Some("name"));
    }

    #[test]
    fn test_empty_filter_keeps_everything() {
        let filter = FactFilter::new::<&str>(&[]);
        assert!(filter.is_empty());
        let kept = filter.apply(vec![ExtractedFact::default()]);
        assert_eq!(kept.len(), 1);
    }
}
