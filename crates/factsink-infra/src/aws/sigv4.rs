//! AWS Signature Version 4 request signing.
//!
//! Produces the headers (`x-amz-date`, `Authorization`, and where needed
//! `x-amz-security-token` / `x-amz-content-sha256`) that authenticate one
//! HTTP request. Only header-based signing is implemented; presigned URLs
//! are not needed here.
//!
//! The request path handed in must already be URI-encoded the AWS way (see
//! [`uri_encode`]). S3 signs that path as-is; every other service encodes it
//! a second time.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use secrecy::ExposeSecret;
use sha2::{Digest, Sha256};

use super::credentials::AwsCredentials;

type HmacSha256 = Hmac<Sha256>;

pub const ALGORITHM: &str = "AWS4-HMAC-SHA256";

const S3_SERVICE: &str = "s3";

/// Errors from credential lookup and request signing.
#[derive(Debug, thiserror::Error)]
pub enum SigningError {
    #[error("missing AWS credential: {0}")]
    MissingCredentials(&'static str),

    #[error("cannot sign request without a host: {0}")]
    MissingHost(String),

    #[error("invalid signing key")]
    InvalidKey,
}

/// The parts of an HTTP request that go into the signature.
#[derive(Debug, Clone)]
pub struct SignableRequest<'a> {
    pub method: &'a str,
    pub url: &'a reqwest::Url,
    /// Extra headers that will be sent and should be signed (e.g. `content-type`).
    pub headers: &'a [(&'a str, &'a str)],
    pub body: &'a [u8],
}

/// Who signs, for which endpoint, and when.
#[derive(Debug, Clone)]
pub struct SigningParams<'a> {
    pub credentials: &'a AwsCredentials,
    pub region: &'a str,
    pub service: &'a str,
    pub time: DateTime<Utc>,
}

/// Headers to add to the outgoing request, in a stable order.
pub type SignedHeaders = Vec<(String, String)>;

/// Sign `request` and return the headers that carry the signature.
pub fn sign(
    request: &SignableRequest<'_>,
    params: &SigningParams<'_>,
) -> Result<SignedHeaders, SigningError> {
    let amz_date = params.time.format("%Y%m%dT%H%M%SZ").to_string();
    let date = params.time.format("%Y%m%d").to_string();
    let payload_hash = hex_encode(&Sha256::digest(request.body));
    let is_s3 = params.service == S3_SERVICE;

    let mut added: SignedHeaders = vec![("x-amz-date".to_string(), amz_date.clone())];
    if is_s3 {
        added.push(("x-amz-content-sha256".to_string(), payload_hash.clone()));
    }
    if let Some(token) = &params.credentials.session_token {
        added.push((
            "x-amz-security-token".to_string(),
            token.expose_secret().to_string(),
        ));
    }

    let mut headers: BTreeMap<String, String> = BTreeMap::new();
    headers.insert("host".to_string(), host_header(request.url)?);
    for (name, value) in request
        .headers
        .iter()
        .map(|(n, v)| (*n, *v))
        .chain(added.iter().map(|(n, v)| (n.as_str(), v.as_str())))
    {
        headers.insert(name.to_lowercase(), normalize_header_value(value));
    }

    let signed_headers = headers.keys().cloned().collect::<Vec<_>>().join(";");
    let canonical = canonical_request(
        request.method,
        &canonical_uri(request.url.path(), is_s3),
        &canonical_query(request.url),
        &headers,
        &signed_headers,
        &payload_hash,
    );

    let scope = format!("{date}/{}/{}/aws4_request", params.region, params.service);
    let to_sign = string_to_sign(&amz_date, &scope, &canonical);

    let key = signing_key(
        params.credentials.secret_access_key.expose_secret(),
        &date,
        params.region,
        params.service,
    )?;
    let signature = hex_encode(&hmac(&key, to_sign.as_bytes())?);

    added.push((
        "authorization".to_string(),
        format!(
            "{ALGORITHM} Credential={}/{scope}, SignedHeaders={signed_headers}, Signature={signature}",
            params.credentials.access_key_id
        ),
    ));
    Ok(added)
}

/// Derive the per-day, per-region, per-service signing key.
pub fn signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, SigningError> {
    let k_date = hmac(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let k_region = hmac(&k_date, region.as_bytes())?;
    let k_service = hmac(&k_region, service.as_bytes())?;
    hmac(&k_service, b"aws4_request")
}

/// URI-encode per the SigV4 rules: unreserved characters stay, everything
/// else becomes `%XX` (uppercase). `/` is kept unless `encode_slash` is set.
pub fn uri_encode(input: &str, encode_slash: bool) -> String {
    let mut out = String::with_capacity(input.len());
    for byte in input.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b'/' if !encode_slash => out.push('/'),
            other => out.push_str(&format!("%{other:02X}")),
        }
    }
    out
}

/// Join path segments into an encoded absolute path (`/a/b%3Ac`).
pub fn encode_path<'a>(segments: impl IntoIterator<Item = &'a str>) -> String {
    segments
        .into_iter()
        .map(|s| format!("/{}", uri_encode(s, true)))
        .collect()
}

pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

fn hmac(key: &[u8], data: &[u8]) -> Result<Vec<u8>, SigningError> {
    let mut mac = HmacSha256::new_from_slice(key).map_err(|_| SigningError::InvalidKey)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn host_header(url: &reqwest::Url) -> Result<String, SigningError> {
    let host = url
        .host_str()
        .ok_or_else(|| SigningError::MissingHost(url.to_string()))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

/// Trim and collapse runs of spaces.
fn normalize_header_value(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn canonical_uri(path: &str, is_s3: bool) -> String {
    if path.is_empty() {
        "/".to_string()
    } else if is_s3 {
        path.to_string()
    } else {
        uri_encode(path, false)
    }
}

fn canonical_query(url: &reqwest::Url) -> String {
    let mut pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| (uri_encode(&k, true), uri_encode(&v, true)))
        .collect();
    pairs.sort();
    pairs
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&")
}

fn canonical_request(
    method: &str,
    uri: &str,
    query: &str,
    headers: &BTreeMap<String, String>,
    signed_headers: &str,
    payload_hash: &str,
) -> String {
    let canonical_headers: String = headers
        .iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect();
    format!("{method}\n{uri}\n{query}\n{canonical_headers}\n{signed_headers}\n{payload_hash}")
}

fn string_to_sign(amz_date: &str, scope: &str, canonical_request: &str) -> String {
    let hashed = hex_encode(&Sha256::digest(canonical_request.as_bytes()));
    format!("{ALGORITHM}\n{amz_date}\n{scope}\n{hashed}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    const EXAMPLE_SECRET: &str = "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY";

    fn example_credentials(token: Option<&str>) -> AwsCredentials {
        AwsCredentials::new("AKIDEXAMPLE", EXAMPLE_SECRET, token.map(str::to_string))
    }

    fn example_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2015, 8, 30, 12, 36, 0).unwrap()
    }

    fn header<'a>(headers: &'a SignedHeaders, name: &str) -> Option<&'a str> {
        headers
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.as_str())
    }

    fn sign_get(url: &str, service: &str, token: Option<&str>) -> SignedHeaders {
        let url = reqwest::Url::parse(url).unwrap();
        let credentials = example_credentials(token);
        sign(
            &SignableRequest {
                method: "GET",
                url: &url,
                headers: &[],
                body: b"",
            },
            &SigningParams {
                credentials: &credentials,
                region: "us-east-1",
                service,
                time: example_time(),
            },
        )
        .unwrap()
    }

    #[test]
    fn test_signing_key_matches_published_example() {
        let key = signing_key(EXAMPLE_SECRET, "20120215", "us-east-1", "iam").unwrap();
        assert_eq!(
            hex_encode(&key),
            "f4780e2d9f65fa895f9c67b32ce1baf0b0d8a43505a000a1a9e090d414db404d"
        );
    }

    #[test]
    fn test_get_vanilla() {
        let headers = sign_get("https://example.amazonaws.com/", "service", None);
        assert_eq!(header(&headers, "x-amz-date"), Some("20150830T123600Z"));
        assert_eq!(
            header(&headers, "authorization"),
            Some(
                "AWS4-HMAC-SHA256 Credential=AKIDEXAMPLE/20150830/us-east-1/service/aws4_request, \
                 SignedHeaders=host;x-amz-date, \
                 Signature=5fa00fa31553b73ebf1942676e86291e8372ff2a2260956d9b8aae1d763fbf31"
            )
        );
        assert!(header(&headers, "x-amz-content-sha256").is_none());
    }

    #[test]
    fn test_get_vanilla_query_order_key_case() {
        let headers = sign_get(
            "https://example.amazonaws.com/?Param2=value2&Param1=value1",
            "service",
            None,
        );
        let auth = header(&headers, "authorization").unwrap();
        assert!(auth.ends_with(
            "Signature=b97d918cfa904a5beff61c982a1b6f458b799221646efd99d3219ec94cdf2500"
        ));
    }

    #[test]
    fn test_session_token_is_signed() {
        let headers = sign_get("https://example.amazonaws.com/", "service", Some("TOKEN"));
        assert_eq!(header(&headers, "x-amz-security-token"), Some("TOKEN"));
        assert!(
            header(&headers, "authorization")
                .unwrap()
                .contains("SignedHeaders=host;x-amz-date;x-amz-security-token,")
        );
    }

    #[test]
    fn test_s3_adds_content_hash() {
        let headers = sign_get("https://bucket.s3.us-east-1.amazonaws.com/key", "s3", None);
        assert_eq!(
            header(&headers, "x-amz-content-sha256"),
            Some("e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855")
        );
        assert!(
            header(&headers, "authorization")
                .unwrap()
                .contains("SignedHeaders=host;x-amz-content-sha256;x-amz-date,")
        );
    }

    #[test]
    fn test_canonical_uri_double_encodes_outside_s3() {
        assert_eq!(canonical_uri("/model/a%3A0/invoke", false), "/model/a%253A0/invoke");
        assert_eq!(canonical_uri("/a%3A0", true), "/a%3A0");
        assert_eq!(canonical_uri("", false), "/");
    }

    #[test]
    fn test_uri_encode() {
        assert_eq!(uri_encode("a b/c~d", false), "a%20b/c~d");
        assert_eq!(uri_encode("a/b", true), "a%2Fb");
        assert_eq!(uri_encode("v1:0", true), "v1%3A0");
        assert_eq!(uri_encode("é", true), "%C3%A9");
    }

    #[test]
    fn test_encode_path() {
        assert_eq!(
            encode_path(["model", "anthropic.claude-v1:0", "invoke"]),
            "/model/anthropic.claude-v1%3A0/invoke"
        );
    }

    #[test]
    fn test_host_includes_non_default_port() {
        let url = reqwest::Url::parse("http://127.0.0.1:9000/x").unwrap();
        assert_eq!(host_header(&url).unwrap(), "127.0.0.1:9000");
    }

    #[test]
    fn test_header_values_are_normalized() {
        assert_eq!(normalize_header_value("  a   b  c "), "a b c");
    }
}
