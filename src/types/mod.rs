//! Common types used across the Bitstamp client library.

pub mod common;
pub mod serde_helpers;

pub use common::*;
