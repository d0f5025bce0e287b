//! Error types for the Bitstamp client library.

use thiserror::Error;

/// The main error type for all Bitstamp client operations.
#[derive(Error, Debug)]
pub enum BitstampError {
    /// HTTP request failed
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// HTTP request with middleware failed
    #[error("HTTP request failed: {0}")]
    HttpMiddleware(#[from] reqwest_middleware::Error),

    /// WebSocket protocol error
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// Write or read failure on a streaming connection
    #[error("Transport error: {0}")]
    Transport(String),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    Url(#[from] url::ParseError),

    /// Bitstamp API returned an error envelope
    #[error("Bitstamp API error: {0}")]
    Api(ApiError),

    /// Signature or nonce generation failed.
    ///
    /// This points at a broken runtime rather than a bad request and is not
    /// worth retrying.
    #[error("Signing error: {0}")]
    Signing(String),

    /// Request rejected locally before anything was signed or sent
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Invalid response from the API
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Operation not allowed in the current connection state
    #[error("Invalid state: {0}")]
    InvalidState(String),

    /// WebSocket connection closed
    #[error("WebSocket connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for the closure
        reason: String,
    },

    /// No frame arrived before the read deadline
    #[error("Read deadline exceeded")]
    DeadlineExceeded,

    /// Missing required credentials
    #[error("Missing credentials: API key and secret required for private endpoints")]
    MissingCredentials,
}

/// Error envelope returned by Bitstamp in the response body.
///
/// Bitstamp answers failed private calls with
/// `{"status": "error", "reason": ..., "code": "..."}`, often with HTTP 200.
/// `reason` is either a string or an object of field errors, so it is kept as
/// raw JSON.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct ApiError {
    /// Always `"error"` for a real envelope.
    pub status: String,
    /// Server-provided reason, verbatim.
    #[serde(default)]
    pub reason: serde_json::Value,
    /// Error code such as `API0005`, when the server sends one.
    #[serde(default)]
    pub code: Option<String>,
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.code {
            Some(code) => write!(f, "{}: {}", code, self.reason_text()),
            None => write!(f, "{}", self.reason_text()),
        }
    }
}

impl ApiError {
    /// Create a new API error from a code and a plain-text reason.
    pub fn new(code: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            status: "error".to_string(),
            reason: serde_json::Value::String(reason.into()),
            code: Some(code.into()),
        }
    }

    /// Try to read an error envelope out of a response body.
    ///
    /// Returns `None` for bodies that are not JSON objects or whose `status`
    /// is anything other than `"error"`.
    pub fn from_body(body: &str) -> Option<Self> {
        serde_json::from_str::<Self>(body)
            .ok()
            .filter(|envelope| envelope.status == "error")
    }

    /// The reason as display text. Structured reasons are rendered as compact JSON.
    pub fn reason_text(&self) -> String {
        match &self.reason {
            serde_json::Value::String(s) => s.clone(),
            serde_json::Value::Null => "unknown error".to_string(),
            other => other.to_string(),
        }
    }

    /// Check if this is the "Order could not be placed" error.
    ///
    /// Bitstamp recommends retrying order placement in this case. The client
    /// never retries on its own; callers decide.
    pub fn is_order_not_placed(&self) -> bool {
        self.reason_text().contains(error_codes::ORDER_NOT_PLACED)
    }

    /// Check if the request was rejected for authentication reasons.
    pub fn is_auth_failure(&self) -> bool {
        matches!(
            self.code.as_deref(),
            Some(error_codes::API_KEY_NOT_FOUND)
                | Some(error_codes::INVALID_NONCE)
                | Some(error_codes::INVALID_SIGNATURE)
                | Some(error_codes::TIMESTAMP_OUT_OF_BOUNDS)
                | Some(error_codes::CONTENT_TYPE_NOT_ALLOWED)
        )
    }
}

/// Known Bitstamp error codes and messages for pattern matching.
pub mod error_codes {
    /// API key not found.
    pub const API_KEY_NOT_FOUND: &str = "API0001";
    /// Nonce already used or malformed.
    pub const INVALID_NONCE: &str = "API0004";
    /// Signature does not match.
    pub const INVALID_SIGNATURE: &str = "API0005";
    /// `X-Auth-Timestamp` outside the accepted window.
    pub const TIMESTAMP_OUT_OF_BOUNDS: &str = "API0017";
    /// `Content-Type` sent on a request without a body.
    pub const CONTENT_TYPE_NOT_ALLOWED: &str = "API0020";

    /// Reason text for which the exchange recommends retrying.
    pub const ORDER_NOT_PLACED: &str = "Order could not be placed";
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_api_error_from_body() {
        let body = r#"{"status": "error", "reason": "Invalid signature", "code": "API0005"}"#;
        let error = ApiError::from_body(body).unwrap();
        assert_eq!(error.code.as_deref(), Some("API0005"));
        assert_eq!(error.reason_text(), "Invalid signature");
        assert!(error.is_auth_failure());
    }

    #[test]
    fn test_api_error_structured_reason() {
        let body = r#"{"status": "error", "reason": {"__all__": ["Order could not be placed."]}}"#;
        let error = ApiError::from_body(body).unwrap();
        assert!(error.code.is_none());
        assert!(error.is_order_not_placed());
        assert_eq!(error.to_string(), r#"{"__all__":["Order could not be placed."]}"#);
    }

    #[test]
    fn test_success_body_is_not_an_error() {
        assert!(ApiError::from_body(r#"{"status": "success"}"#).is_none());
        assert!(ApiError::from_body(r#"[{"id": 1}]"#).is_none());
        assert!(ApiError::from_body("not json").is_none());
    }

    #[test]
    fn test_api_error_display() {
        let error = ApiError::new("API0004", "Invalid nonce");
        assert_eq!(error.to_string(), "API0004: Invalid nonce");
    }
}
