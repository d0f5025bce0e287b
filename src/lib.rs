//! # Bitstamp Client
//!
//! An async Rust client library for the Bitstamp private REST API and
//! WebSocket streams.
//!
//! ## Features
//!
//! - HMAC-SHA256 request signing with UUID nonces (`X-Auth` v2 scheme)
//! - Private REST endpoints: balances, transactions, orders, WebSocket token
//! - Keepalive-managed WebSocket connections with read deadlines
//! - Built-in client-side rate limiting
//! - Financial precision with `rust_decimal`
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use bitstamp_api_client::BitstampError;
//! use bitstamp_api_client::auth::EnvCredentials;
//! use bitstamp_api_client::rest::PrivateRestClient;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let credentials =
//!         Arc::new(EnvCredentials::try_from_env().ok_or(BitstampError::MissingCredentials)?);
//!     let client = PrivateRestClient::builder().credentials(credentials).build()?;
//!     let balances = client.get_balances().await?;
//!     println!("BTC available: {:?}", balances.available("btc"));
//!     Ok(())
//! }
//! ```

pub mod auth;
pub mod error;
pub mod rest;
pub mod types;
pub mod ws;

// Re-export commonly used types at crate root
pub use error::BitstampError;
pub use types::common::{BuySell, OrderStatus, OrderType};

/// Result type alias using BitstampError
pub type Result<T> = std::result::Result<T, BitstampError>;
