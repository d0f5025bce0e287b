//! HMAC-SHA256 request signing for Bitstamp API v2 authentication.
//!
//! Bitstamp private endpoints require a signature computed as:
//! ```text
//! HMAC-SHA256(
//!     "BITSTAMP " + api_key + "POST" + "www.bitstamp.net" + path
//!         + content_type + nonce + timestamp + "v2" + url_encoded_body,
//!     api_secret,
//! )
//! ```
//!
//! The digest is hex encoded and sent in `X-Auth-Signature` together with
//! the key, nonce, timestamp and version headers.

use std::collections::BTreeMap;

use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use sha2::Sha256;
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

use crate::auth::{Credentials, NonceProvider};
use crate::error::BitstampError;

type HmacSha256 = Hmac<Sha256>;

/// Form parameters of a private request.
///
/// A `BTreeMap` keeps the encoded body in lexicographic key order, so the
/// string that is signed is byte-for-byte the string that is sent.
pub type FormParams = BTreeMap<String, String>;

/// Protocol tag that prefixes both the message and the `X-Auth` header.
pub const AUTH_PREFIX: &str = "BITSTAMP ";
/// The only HTTP method this client signs.
pub const SIGNED_METHOD: &str = "POST";
/// Host literal included in every signature, independent of the base URL.
pub const SIGNED_HOST: &str = "www.bitstamp.net";
/// Authentication scheme version.
pub const AUTH_VERSION: &str = "v2";
/// Content type of every request that carries a body.
pub const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";
/// Bitstamp rejects timestamps taken at `now` as expired; signing ten
/// seconds ahead is what the exchange accepts.
pub const TIMESTAMP_OFFSET: Duration = Duration::seconds(10);

/// Authentication header names.
pub mod headers {
    /// `BITSTAMP <api key>`.
    pub const X_AUTH: &str = "X-Auth";
    /// Hex-encoded HMAC-SHA256.
    pub const X_AUTH_SIGNATURE: &str = "X-Auth-Signature";
    /// UUID nonce.
    pub const X_AUTH_NONCE: &str = "X-Auth-Nonce";
    /// Unix milliseconds.
    pub const X_AUTH_TIMESTAMP: &str = "X-Auth-Timestamp";
    /// Always `v2`.
    pub const X_AUTH_VERSION: &str = "X-Auth-Version";
}

/// Everything that goes into one signature.
///
/// Built per request and dropped once the request is dispatched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningContext {
    path: String,
    content_type: String,
    nonce: Uuid,
    timestamp_ms: u64,
    encoded_params: String,
}

impl SigningContext {
    /// Build a context from explicit parts.
    ///
    /// The content type must be empty exactly when `encoded_params` is empty,
    /// and [`FORM_CONTENT_TYPE`] otherwise. Any other pairing would produce a
    /// signature the server rejects, so it is refused here.
    pub fn new(
        path: impl Into<String>,
        content_type: impl Into<String>,
        nonce: Uuid,
        timestamp_ms: u64,
        encoded_params: impl Into<String>,
    ) -> Result<Self, BitstampError> {
        let content_type = content_type.into();
        let encoded_params = encoded_params.into();

        match (content_type.is_empty(), encoded_params.is_empty()) {
            (true, true) => {}
            (false, false) if content_type == FORM_CONTENT_TYPE => {}
            (false, false) => {
                return Err(BitstampError::InvalidRequest(format!(
                    "unsupported content type {content_type:?}, expected {FORM_CONTENT_TYPE:?}"
                )));
            }
            (true, false) => {
                return Err(BitstampError::InvalidRequest(
                    "content type is required when the request has parameters".to_string(),
                ));
            }
            (false, true) => {
                return Err(BitstampError::InvalidRequest(
                    "content type must be empty when the request has no parameters".to_string(),
                ));
            }
        }

        Ok(Self {
            path: path.into(),
            content_type,
            nonce,
            timestamp_ms,
            encoded_params,
        })
    }

    /// Build a context from form parameters, deriving the body and content type.
    pub fn for_params(
        path: impl Into<String>,
        params: &FormParams,
        nonce: Uuid,
        timestamp_ms: u64,
    ) -> Result<Self, BitstampError> {
        let encoded = encode_params(params)?;
        let content_type = content_type_for(&encoded);
        Self::new(path, content_type, nonce, timestamp_ms, encoded)
    }

    /// The request path, e.g. `/api/v2/balance/`.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// The content type, empty for requests without a body.
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    /// The request nonce.
    pub fn nonce(&self) -> Uuid {
        self.nonce
    }

    /// Signing time in Unix milliseconds.
    pub fn timestamp_ms(&self) -> u64 {
        self.timestamp_ms
    }

    /// The URL-encoded body.
    pub fn encoded_params(&self) -> &str {
        &self.encoded_params
    }

    /// The canonical message that gets signed.
    pub fn message(&self, api_key: &str) -> String {
        format!(
            "{AUTH_PREFIX}{api_key}{SIGNED_METHOD}{SIGNED_HOST}{}{}{}{}{AUTH_VERSION}{}",
            self.path, self.content_type, self.nonce, self.timestamp_ms, self.encoded_params
        )
    }
}

/// The five authentication headers of a signed request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthHeaders {
    /// `X-Auth`
    pub auth: String,
    /// `X-Auth-Signature`
    pub signature: String,
    /// `X-Auth-Nonce`
    pub nonce: String,
    /// `X-Auth-Timestamp`
    pub timestamp: String,
    /// `X-Auth-Version`
    pub version: String,
}

impl AuthHeaders {
    /// Header name/value pairs in a fixed order.
    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &str)> {
        [
            (headers::X_AUTH, self.auth.as_str()),
            (headers::X_AUTH_SIGNATURE, self.signature.as_str()),
            (headers::X_AUTH_NONCE, self.nonce.as_str()),
            (headers::X_AUTH_TIMESTAMP, self.timestamp.as_str()),
            (headers::X_AUTH_VERSION, self.version.as_str()),
        ]
        .into_iter()
    }

    /// Convert into a header map for `reqwest`.
    pub fn header_map(&self) -> Result<HeaderMap, BitstampError> {
        let mut map = HeaderMap::with_capacity(5);
        for (name, value) in self.iter() {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| BitstampError::InvalidRequest(format!("invalid header name: {e}")))?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                BitstampError::InvalidRequest(format!("invalid value for {name}: {e}"))
            })?;
            map.insert(name, value);
        }
        Ok(map)
    }
}

/// URL-encode form parameters in key order.
pub fn encode_params(params: &FormParams) -> Result<String, BitstampError> {
    serde_urlencoded::to_string(params)
        .map_err(|e| BitstampError::InvalidRequest(format!("failed to encode parameters: {e}")))
}

/// The content type that pairs with an encoded body.
pub fn content_type_for(encoded_params: &str) -> &'static str {
    if encoded_params.is_empty() {
        ""
    } else {
        FORM_CONTENT_TYPE
    }
}

/// The `X-Auth-Timestamp` value for a request signed at `now`.
///
/// Milliseconds, truncated to whole seconds: the server rejects timestamps
/// with a sub-second part.
pub fn signing_timestamp_ms(now: OffsetDateTime) -> Result<u64, BitstampError> {
    let seconds = (now + TIMESTAMP_OFFSET).unix_timestamp();
    u64::try_from(seconds)
        .map(|seconds| seconds.saturating_mul(1000))
        .map_err(|_| BitstampError::Signing(format!("timestamp {seconds} is before the epoch")))
}

/// Sign a fully specified request.
///
/// Deterministic: the same credentials and context always give the same headers.
///
/// # Example
///
/// ```rust
/// use bitstamp_api_client::auth::{Credentials, SigningContext, sign_request};
/// use uuid::Uuid;
///
/// # fn main() -> Result<(), Box<dyn std::error::Error>> {
/// let credentials = Credentials::new("api_key", "api_secret");
/// let context = SigningContext::new(
///     "/api/v2/balance/",
///     "",
///     Uuid::from_u128(1),
///     1_700_000_010_000,
///     "",
/// )?;
/// let headers = sign_request(&credentials, &context)?;
/// assert_eq!(headers.auth, "BITSTAMP api_key");
/// # Ok(())
/// # }
/// ```
pub fn sign_request(
    credentials: &Credentials,
    context: &SigningContext,
) -> Result<AuthHeaders, BitstampError> {
    let message = context.message(&credentials.api_key);

    let mut hmac = HmacSha256::new_from_slice(credentials.expose_secret().as_bytes())
        .map_err(|e| BitstampError::Signing(format!("Invalid HMAC key: {e}")))?;
    hmac.update(message.as_bytes());
    let digest = hmac.finalize().into_bytes();

    Ok(AuthHeaders {
        auth: credentials.auth_header_value(),
        signature: hex::encode(digest),
        nonce: context.nonce.to_string(),
        timestamp: context.timestamp_ms.to_string(),
        version: AUTH_VERSION.to_string(),
    })
}

/// Sign a request to `path` with a fresh nonce and the current time.
pub fn sign(
    credentials: &Credentials,
    path: &str,
    params: &FormParams,
    nonce_provider: &dyn NonceProvider,
) -> Result<AuthHeaders, BitstampError> {
    let nonce = nonce_provider.next_nonce()?;
    let timestamp_ms = signing_timestamp_ms(OffsetDateTime::now_utc())?;
    let context = SigningContext::for_params(path, params, nonce, timestamp_ms)?;
    sign_request(credentials, &context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::RandomNonce;
    use time::macros::datetime;

    const NONCE: &str = "f93c979d-b00d-43a9-9b9c-fd4cd9547fa6";

    fn fixture_nonce() -> Uuid {
        Uuid::parse_str(NONCE).unwrap()
    }

    fn params(pairs: &[(&str, &str)]) -> FormParams {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_known_vector_with_body() {
        let credentials = Credentials::new("test_key", "test_secret");
        let context = SigningContext::new(
            "/api/v2/order_status/",
            FORM_CONTENT_TYPE,
            fixture_nonce(),
            1_700_000_010_000,
            "id=42",
        )
        .unwrap();

        assert_eq!(
            context.message("test_key"),
            "BITSTAMP test_keyPOSTwww.bitstamp.net/api/v2/order_status/\
             application/x-www-form-urlencodedf93c979d-b00d-43a9-9b9c-fd4cd9547fa6\
             1700000010000v2id=42"
        );

        let headers = sign_request(&credentials, &context).unwrap();
        assert_eq!(
            headers.signature,
            "00c12d5231f35f2aab27981de41539cc9a7e816f9c1416854a942f092b5a32f4"
        );
    }

    #[test]
    fn test_known_vector_without_body() {
        let credentials = Credentials::new("test_key", "test_secret");
        let context =
            SigningContext::for_params("/api/v2/balance/", &FormParams::new(), fixture_nonce(), 1_700_000_010_000)
                .unwrap();

        assert_eq!(context.content_type(), "");
        let headers = sign_request(&credentials, &context).unwrap();
        assert_eq!(
            headers.signature,
            "5a2046312af64011be20982c7573e96cd826ae595db53fffe037f80065ad7f3c"
        );
        assert_eq!(headers.auth, "BITSTAMP test_key");
        assert_eq!(headers.nonce, NONCE);
        assert_eq!(headers.timestamp, "1700000010000");
        assert_eq!(headers.version, "v2");
    }

    #[test]
    fn test_signature_consistency() {
        let credentials = Credentials::new("key", "my_secret");
        let context = SigningContext::for_params(
            "/api/v2/cancel_order/",
            &params(&[("id", "7")]),
            fixture_nonce(),
            12345,
        )
        .unwrap();

        let sig1 = sign_request(&credentials, &context).unwrap();
        let sig2 = sign_request(&credentials, &context.clone()).unwrap();
        assert_eq!(sig1, sig2);
    }

    #[test]
    fn test_signature_changes_with_nonce() {
        let credentials = Credentials::new("key", "my_secret");
        let a = SigningContext::new("/api/v2/balance/", "", Uuid::from_u128(1), 12345, "").unwrap();
        let b = SigningContext::new("/api/v2/balance/", "", Uuid::from_u128(2), 12345, "").unwrap();

        let sig1 = sign_request(&credentials, &a).unwrap();
        let sig2 = sign_request(&credentials, &b).unwrap();
        assert_ne!(sig1.signature, sig2.signature);
    }

    #[test]
    fn test_fresh_signatures_differ_only_in_request_specific_headers() {
        let credentials = Credentials::new("key", "my_secret");
        let body = params(&[("amount", "1.5"), ("price", "100")]);

        let first = sign(&credentials, "/api/v2/buy/btcusd/", &body, &RandomNonce).unwrap();
        let second = sign(&credentials, "/api/v2/buy/btcusd/", &body, &RandomNonce).unwrap();

        assert_eq!(first.auth, second.auth);
        assert_eq!(first.version, second.version);
        assert_ne!(first.nonce, second.nonce);
        assert_ne!(first.signature, second.signature);
    }

    #[test]
    fn test_params_encoded_in_key_order() {
        let encoded = encode_params(&params(&[("price", "100.5"), ("amount", "0.1"), ("daily_order", "True")]))
            .unwrap();
        assert_eq!(encoded, "amount=0.1&daily_order=True&price=100.5");
        assert_eq!(content_type_for(&encoded), FORM_CONTENT_TYPE);
        assert_eq!(content_type_for(""), "");
    }

    #[test]
    fn test_content_type_pairing_is_enforced() {
        let nonce = fixture_nonce();

        let err = SigningContext::new("/api/v2/balance/", FORM_CONTENT_TYPE, nonce, 1, "").unwrap_err();
        assert!(matches!(err, BitstampError::InvalidRequest(_)));

        let err = SigningContext::new("/api/v2/order_status/", "", nonce, 1, "id=1").unwrap_err();
        assert!(matches!(err, BitstampError::InvalidRequest(_)));

        let err = SigningContext::new("/api/v2/order_status/", "application/json", nonce, 1, "id=1")
            .unwrap_err();
        assert!(matches!(err, BitstampError::InvalidRequest(_)));
    }

    #[test]
    fn test_timestamp_is_ten_seconds_ahead_in_millis() {
        let now = datetime!(2023-11-14 22:13:20.250 UTC);
        assert_eq!(signing_timestamp_ms(now).unwrap(), 1_700_000_010_000);

        let now = datetime!(2023-11-14 22:13:20.999 UTC);
        assert_eq!(signing_timestamp_ms(now).unwrap(), 1_700_000_010_000);
    }

    #[test]
    fn test_header_map_contains_all_headers() {
        let credentials = Credentials::new("key", "secret");
        let context = SigningContext::new("/api/v2/balance/", "", fixture_nonce(), 1, "").unwrap();
        let map = sign_request(&credentials, &context).unwrap().header_map().unwrap();

        assert_eq!(map.len(), 5);
        assert_eq!(map.get("x-auth").unwrap().to_str().unwrap(), "BITSTAMP key");
        assert_eq!(map.get("X-Auth-Nonce").unwrap().to_str().unwrap(), NONCE);
        assert_eq!(map.get("X-Auth-Version").unwrap().to_str().unwrap(), "v2");
    }
}
