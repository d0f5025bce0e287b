//! Bitstamp private REST API client implementation.

use std::num::NonZeroU32;
use std::sync::Arc;
use std::time::Duration;

use governor::{DefaultDirectRateLimiter, Quota, RateLimiter};
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue, USER_AGENT};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_tracing::TracingMiddleware;
use time::OffsetDateTime;
use url::Url;

use crate::auth::{
    CredentialsProvider, FormParams, NonceProvider, RandomNonce, SigningContext, sign_request,
    signing_timestamp_ms,
};
use crate::error::{ApiError, BitstampError};
use crate::rest::endpoints::BITSTAMP_BASE_URL;

/// Default request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

/// Default request budget: Bitstamp allows 400 requests per second per key.
pub const DEFAULT_REQUESTS_PER_SECOND: NonZeroU32 = NonZeroU32::MIN.saturating_add(399);

/// The Bitstamp private REST API client.
///
/// Every call is a signed `POST`. The client signs, rate limits and checks
/// Bitstamp's error envelope; it never retries, since a replayed nonce is
/// rejected and a replayed order may be placed twice.
///
/// # Example
///
/// ```rust,no_run
/// use bitstamp_api_client::rest::PrivateRestClient;
/// use bitstamp_api_client::auth::StaticCredentials;
/// use std::sync::Arc;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let credentials = Arc::new(StaticCredentials::new("api_key", "api_secret"));
///     let client = PrivateRestClient::builder()
///         .credentials(credentials)
///         .build()?;
///
///     let balances = client.get_balances().await?;
///     println!("USD available: {:?}", balances.available("usd"));
///
///     Ok(())
/// }
/// ```
#[derive(Clone)]
pub struct PrivateRestClient {
    http_client: ClientWithMiddleware,
    base_url: Url,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    nonce_provider: Arc<dyn NonceProvider>,
    rate_limiter: Option<Arc<DefaultDirectRateLimiter>>,
}

impl PrivateRestClient {
    /// Create a new client builder.
    pub fn builder() -> PrivateRestClientBuilder {
        PrivateRestClientBuilder::new()
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Make an authenticated POST request and return the raw response body.
    ///
    /// The body is only returned once it has been checked for an error envelope.
    pub async fn private_post(
        &self,
        path: &str,
        params: &FormParams,
    ) -> Result<String, BitstampError> {
        let credentials = self
            .credentials
            .as_ref()
            .ok_or(BitstampError::MissingCredentials)?;
        let creds = credentials.get_credentials();

        if let Some(limiter) = &self.rate_limiter {
            limiter.until_ready().await;
        }

        // Sign as late as possible so the timestamp reflects the send time.
        let nonce = self.nonce_provider.next_nonce()?;
        let timestamp_ms = signing_timestamp_ms(OffsetDateTime::now_utc())?;
        let context = SigningContext::for_params(path, params, nonce, timestamp_ms)?;
        let auth_headers = sign_request(creds, &context)?;

        let url = self.base_url.join(path)?;
        let mut request = self
            .http_client
            .post(url)
            .headers(auth_headers.header_map()?);

        // Bitstamp rejects a Content-Type header on requests without a body.
        if !context.encoded_params().is_empty() {
            request = request
                .header(CONTENT_TYPE, context.content_type())
                .body(context.encoded_params().to_string());
        }
        drop(context);

        tracing::debug!(path, nonce = %nonce, "sending private request");
        let response = request.send().await?;
        self.read_body(path, response).await
    }

    /// Make an authenticated POST request and parse the JSON response.
    pub(crate) async fn private_post_json<T>(
        &self,
        path: &str,
        params: &FormParams,
    ) -> Result<T, BitstampError>
    where
        T: serde::de::DeserializeOwned,
    {
        let body = self.private_post(path, params).await?;
        serde_json::from_str(&body).map_err(|e| {
            BitstampError::InvalidResponse(format!("Failed to parse response: {}. Body: {}", e, body))
        })
    }

    /// Read a response body, surfacing error envelopes and HTTP failures.
    async fn read_body(
        &self,
        path: &str,
        response: reqwest::Response,
    ) -> Result<String, BitstampError> {
        let status = response.status();
        let body = response.text().await?;

        // Bitstamp often returns 200 for errors, so the envelope is checked first.
        if let Some(api_error) = ApiError::from_body(&body) {
            tracing::warn!(path, %status, error = %api_error, "Bitstamp API error");
            return Err(BitstampError::Api(api_error));
        }

        if !status.is_success() {
            return Err(BitstampError::InvalidResponse(format!(
                "HTTP {}: {}",
                status, body
            )));
        }

        Ok(body)
    }
}

impl std::fmt::Debug for PrivateRestClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrivateRestClient")
            .field("base_url", &self.base_url.as_str())
            .field("has_credentials", &self.credentials.is_some())
            .field("rate_limited", &self.rate_limiter.is_some())
            .finish()
    }
}

/// Builder for [`PrivateRestClient`].
pub struct PrivateRestClientBuilder {
    base_url: String,
    credentials: Option<Arc<dyn CredentialsProvider>>,
    nonce_provider: Option<Arc<dyn NonceProvider>>,
    user_agent: Option<String>,
    timeout: Duration,
    quota: Option<Quota>,
}

impl PrivateRestClientBuilder {
    /// Create a new builder with default settings.
    pub fn new() -> Self {
        Self {
            base_url: BITSTAMP_BASE_URL.to_string(),
            credentials: None,
            nonce_provider: None,
            user_agent: None,
            timeout: DEFAULT_TIMEOUT,
            quota: Some(Quota::per_second(DEFAULT_REQUESTS_PER_SECOND)),
        }
    }

    /// Set the base URL (useful for testing with a mock server).
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// Set the credentials provider for authenticated requests.
    pub fn credentials(mut self, credentials: Arc<dyn CredentialsProvider>) -> Self {
        self.credentials = Some(credentials);
        self
    }

    /// Set a custom nonce provider.
    pub fn nonce_provider(mut self, provider: Arc<dyn NonceProvider>) -> Self {
        self.nonce_provider = Some(provider);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Set the request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set the client-side request quota.
    pub fn rate_limit(mut self, quota: Quota) -> Self {
        self.quota = Some(quota);
        self
    }

    /// Disable client-side rate limiting.
    pub fn without_rate_limit(mut self) -> Self {
        self.quota = None;
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<PrivateRestClient, BitstampError> {
        let base_url = Url::parse(&self.base_url)?;

        let mut headers = HeaderMap::new();
        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("bitstamp-api-client/{}", env!("CARGO_PKG_VERSION")));
        let header_value = HeaderValue::from_str(&user_agent)
            .unwrap_or_else(|_| HeaderValue::from_static("bitstamp-api-client"));
        headers.insert(USER_AGENT, header_value);

        let reqwest_client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(self.timeout)
            .build()?;

        let client = ClientBuilder::new(reqwest_client)
            .with(TracingMiddleware::default())
            .build();

        let nonce_provider = self
            .nonce_provider
            .unwrap_or_else(|| Arc::new(RandomNonce::new()));

        Ok(PrivateRestClient {
            http_client: client,
            base_url,
            credentials: self.credentials,
            nonce_provider,
            rate_limiter: self.quota.map(|quota| Arc::new(RateLimiter::direct(quota))),
        })
    }
}

impl Default for PrivateRestClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_quota() {
        assert_eq!(DEFAULT_REQUESTS_PER_SECOND.get(), 400);
    }

    #[test]
    fn test_builder_rejects_bad_base_url() {
        let result = PrivateRestClient::builder().base_url("not a url").build();
        assert!(matches!(result, Err(BitstampError::Url(_))));
    }

    #[tokio::test]
    async fn test_private_post_requires_credentials() {
        let client = PrivateRestClient::builder().build().unwrap();
        let result = client
            .private_post("/api/v2/balance/", &FormParams::new())
            .await;
        assert!(matches!(result, Err(BitstampError::MissingCredentials)));
    }
}
