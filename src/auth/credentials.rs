//! Bitstamp API key pairs.
//!
//! The secret is the raw HMAC key (Bitstamp does not base64 it) and is kept
//! in a [`SecretString`] so it never shows up in `Debug` output or logs.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};

use super::signature::AUTH_PREFIX;

/// Default environment variable holding the API key.
pub const API_KEY_ENV: &str = "BITSTAMP_API_KEY";
/// Default environment variable holding the API secret.
pub const API_SECRET_ENV: &str = "BITSTAMP_API_SECRET";

/// An API key and its secret.
#[derive(Clone)]
pub struct Credentials {
    /// The API key, sent in clear in `X-Auth`.
    pub api_key: String,
    api_secret: SecretString,
}

impl Credentials {
    /// Create credentials from an API key and secret.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: SecretString::from(api_secret.into()),
        }
    }

    /// The secret, for keying the HMAC.
    pub fn expose_secret(&self) -> &str {
        self.api_secret.expose_secret()
    }

    /// Value of the `X-Auth` header: `BITSTAMP <api_key>`.
    pub fn auth_header_value(&self) -> String {
        format!("{AUTH_PREFIX}{}", self.api_key)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .finish()
    }
}

/// Source of credentials for the REST client.
///
/// Implement this to pull keys from a vault or rotate them at runtime.
pub trait CredentialsProvider: Send + Sync {
    /// The credentials to sign the next request with.
    fn get_credentials(&self) -> &Credentials;
}

impl CredentialsProvider for Credentials {
    fn get_credentials(&self) -> &Credentials {
        self
    }
}

impl<T: CredentialsProvider + ?Sized> CredentialsProvider for Arc<T> {
    fn get_credentials(&self) -> &Credentials {
        (**self).get_credentials()
    }
}

/// Credentials fixed at construction.
#[derive(Clone, Debug)]
pub struct StaticCredentials {
    credentials: Credentials,
}

impl StaticCredentials {
    /// Wrap a key and secret.
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            credentials: Credentials::new(api_key, api_secret),
        }
    }
}

impl CredentialsProvider for StaticCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}

/// Credentials read once from the environment.
///
/// Values are trimmed; a missing or blank variable counts as unset.
#[derive(Clone, Debug)]
pub struct EnvCredentials {
    credentials: Credentials,
}

impl EnvCredentials {
    /// Read `BITSTAMP_API_KEY` and `BITSTAMP_API_SECRET`.
    pub fn try_from_env() -> Option<Self> {
        Self::try_from_env_vars(API_KEY_ENV, API_SECRET_ENV)
    }

    /// Read credentials from custom variable names.
    pub fn try_from_env_vars(key_var: &str, secret_var: &str) -> Option<Self> {
        Self::try_from_lookup(key_var, secret_var, |name| std::env::var(name).ok())
    }

    /// Read credentials through `lookup`, e.g. a parsed `.env` map.
    pub fn try_from_lookup(
        key_var: &str,
        secret_var: &str,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Option<Self> {
        let read = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let api_key = read(key_var)?;
        let api_secret = read(secret_var)?;

        Some(Self {
            credentials: Credentials::new(api_key, api_secret),
        })
    }
}

impl CredentialsProvider for EnvCredentials {
    fn get_credentials(&self) -> &Credentials {
        &self.credentials
    }
}
