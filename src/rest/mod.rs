//! Bitstamp private REST API client.
//!
//! Thin request/response marshalling on top of [`crate::auth`]: every call
//! is signed with a fresh nonce and timestamp, and error envelopes come back
//! as [`crate::error::BitstampError::Api`].

mod client;
mod endpoints;
pub mod private;

pub use client::{
    DEFAULT_REQUESTS_PER_SECOND, DEFAULT_TIMEOUT, PrivateRestClient, PrivateRestClientBuilder,
};
pub use endpoints::*;
