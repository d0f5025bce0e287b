//! Authentication module for Bitstamp API.
//!
//! This module provides:
//! - Credential management with secure secret storage
//! - UUID nonce generation for replay protection
//! - HMAC-SHA256 signature generation for authenticated requests

mod credentials;
mod nonce;
mod signature;

pub use credentials::{
    API_KEY_ENV, API_SECRET_ENV, Credentials, CredentialsProvider, EnvCredentials,
    StaticCredentials,
};
pub use nonce::{FixedNonce, NonceProvider, RandomNonce};
pub use signature::{
    AUTH_PREFIX, AUTH_VERSION, AuthHeaders, FORM_CONTENT_TYPE, FormParams, SIGNED_HOST,
    SIGNED_METHOD, SigningContext, TIMESTAMP_OFFSET, content_type_for, encode_params, headers,
    sign, sign_request, signing_timestamp_ms,
};
