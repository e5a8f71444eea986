//! Static AWS credentials read from the environment.
//!
//! The secret key and session token are wrapped in [`SecretString`] and never
//! appear in `Debug` output.

use std::fmt;

use secrecy::SecretString;

use super::sigv4::SigningError;

pub const ACCESS_KEY_ID_ENV: &str = "AWS_ACCESS_KEY_ID";
pub const SECRET_ACCESS_KEY_ENV: &str = "AWS_SECRET_ACCESS_KEY";
pub const SESSION_TOKEN_ENV: &str = "AWS_SESSION_TOKEN";

/// An access key pair, plus a session token for temporary credentials
/// (always present inside Lambda).
#[derive(Clone)]
pub struct AwsCredentials {
    pub access_key_id: String,
    pub secret_access_key: SecretString,
    pub session_token: Option<SecretString>,
}

impl AwsCredentials {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key: SecretString::from(secret_access_key.into()),
            session_token: session_token.map(SecretString::from),
        }
    }

    /// Read credentials from the process environment.
    pub fn from_env() -> Result<Self, SigningError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read credentials through `lookup`. Empty values count as missing.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, SigningError> {
        let get = |key: &'static str| lookup(key).filter(|v| !v.trim().is_empty());

        let access_key_id =
            get(ACCESS_KEY_ID_ENV).ok_or(SigningError::MissingCredentials(ACCESS_KEY_ID_ENV))?;
        let secret_access_key = get(SECRET_ACCESS_KEY_ENV)
            .ok_or(SigningError::MissingCredentials(SECRET_ACCESS_KEY_ENV))?;

        Ok(Self::new(
            access_key_id,
            secret_access_key,
            get(SESSION_TOKEN_ENV),
        ))
    }
}

impl fmt::Debug for AwsCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AwsCredentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field("session_token", &self.session_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}
