//! Payload location parsing.
//!
//! Notifications point at their payload with an `s3://bucket/key` URI.
//! Everything after the first `/` following the bucket is the object key,
//! including any `?` or `#`, which are legal key characters. Keys with a
//! `.` or `..` segment are refused: an HTTP client would collapse them and
//! fetch a different object than the one named.

use factsink_types::error::PipelineError;
use factsink_types::notification::PayloadLocation;

const OBJECT_STORAGE_SCHEME: &str = "s3";

/// Parse `s3://bucket/key` into a [`PayloadLocation`].
///
/// Fails with [`PipelineError::MalformedReference`] when the scheme is not
/// `s3`, when the bucket or key is empty, or when either contains a dot
/// segment.
pub fn parse_payload_location(uri: &str) -> Result<PayloadLocation, PipelineError> {
    let malformed = || PipelineError::MalformedReference(format!("unexpected s3PayloadLocation: {uri}"));

    let (scheme, rest) = uri.trim().split_once("://").ok_or_else(malformed)?;
    if !scheme.eq_ignore_ascii_case(OBJECT_STORAGE_SCHEME) {
        return Err(malformed());
    }

    let (bucket, path) = rest.split_once('/').ok_or_else(malformed)?;
    let key = path.trim_start_matches('/');
    if bucket.is_empty() || key.is_empty() || is_dot_segment(bucket) {
        return Err(malformed());
    }
    if key.split('/').any(is_dot_segment) {
        return Err(malformed());
    }

    Ok(PayloadLocation {
        bucket: bucket.to_string(),
        key: key.to_string(),
    })
}

fn is_dot_segment(segment: &str) -> bool {
    segment == "." || segment == ".."
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parsed(uri: &str) -> (String, String) {
        let loc = parse_payload_location(uri).unwrap();
        (loc.bucket, loc.key)
    }

    #[test]
    fn test_nested_key() {
        assert_eq!(
            parsed("s3://bucket/key/more"),
            ("bucket".to_string(), "key/more".to_string())
        );
    }

    #[test]
    fn test_single_segment_key() {
        assert_eq!(
            parsed("s3://memory-events/payload.json"),
            ("memory-events".to_string(), "payload.json".to_string())
        );
    }

    #[test]
    fn test_extra_leading_slashes_are_stripped() {
        assert_eq!(parsed("s3://b//k").1, "k");
    }

    #[test]
    fn test_scheme_is_case_insensitive() {
        assert_eq!(parsed("S3://b/k").0, "b");
    }

    #[test]
    fn test_key_keeps_query_like_characters() {
        assert_eq!(parsed("s3://b/k?v=1#x").1, "k?v=1#x");
    }

    #[test]
    fn test_rejects_other_schemes() {
        for uri in ["https://bucket/key", "file:///tmp/key", "gs://bucket/key"] {
            let err = parse_payload_location(uri).unwrap_err();
            assert!(matches!(err, PipelineError::MalformedReference(_)), "{uri}");
        }
    }

    #[test]
    fn test_rejects_missing_host_or_path() {
        for uri in ["s3:///key", "s3://bucket", "s3://bucket/", "s3://", "bucket/key", ""] {
            assert!(parse_payload_location(uri).is_err(), "{uri}");
        }
    }

    #[test]
    fn test_rejects_dot_segments() {
        for uri in [
            "s3://bucket/a/../secret.json",
            "s3://bucket/../other/k",
            "s3://bucket/./k",
            "s3://bucket/k/..",
            "s3://../k",
        ] {
            let err = parse_payload_location(uri).unwrap_err();
            assert!(matches!(err, PipelineError::MalformedReference(_)), "{uri}");
        }
    }

    #[test]
    fn test_dots_inside_segments_are_fine() {
        assert_eq!(parsed("s3://b/a..b/.hidden/v1.2.json").1, "a..b/.hidden/v1.2.json");
    }

    #[test]
    fn test_error_names_the_location() {
        let err = parse_payload_location("http://x/y").unwrap_err();
        assert!(err.to_string().contains("http://x/y"));
    }
}
