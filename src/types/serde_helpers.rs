//! Custom serde helpers for Bitstamp's loosely typed responses.
//!
//! The same field can arrive as a JSON number on one endpoint and as a
//! string on another (`"type": 0` vs `"type": "0"`, `"id": 123` vs
//! `"id": "123"`). These modules accept both.

use std::fmt;

use serde::{Deserializer, de};

use crate::types::BuySell;

/// Deserialize an unsigned integer given either as a number or a string.
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use bitstamp_api_client::types::serde_helpers::numeric_code;
///
/// #[derive(Deserialize, Debug)]
/// struct Order {
///     #[serde(deserialize_with = "numeric_code::deserialize")]
///     id: u64,
/// }
///
/// let a: Order = serde_json::from_str(r#"{"id": 1234}"#).unwrap();
/// let b: Order = serde_json::from_str(r#"{"id": "1234"}"#).unwrap();
/// assert_eq!(a.id, b.id);
/// ```
pub mod numeric_code {
    use super::*;

    /// Deserialize a `u64` from a number or a numeric string.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<u64, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct NumericCodeVisitor;

        impl de::Visitor<'_> for NumericCodeVisitor {
            type Value = u64;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("an unsigned integer or a numeric string")
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(v)
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                u64::try_from(v).map_err(|_| E::custom(format!("negative code {v}")))
            }

            fn visit_str<E>(self, v: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                v.trim().parse().map_err(E::custom)
            }
        }

        deserializer.deserialize_any(NumericCodeVisitor)
    }
}

/// Deserialize Bitstamp's `0`/`1` order side code into [`BuySell`].
///
/// # Example
///
/// ```rust
/// use serde::Deserialize;
/// use bitstamp_api_client::types::BuySell;
/// use bitstamp_api_client::types::serde_helpers::side_code;
///
/// #[derive(Deserialize, Debug)]
/// struct Fill {
///     #[serde(rename = "type", deserialize_with = "side_code::deserialize")]
///     side: BuySell,
/// }
///
/// let fill: Fill = serde_json::from_str(r#"{"type": "1"}"#).unwrap();
/// assert_eq!(fill.side, BuySell::Sell);
/// ```
pub mod side_code {
    use super::*;

    /// Deserialize a side from `0`, `1`, `"0"` or `"1"`.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<BuySell, D::Error>
    where
        D: Deserializer<'de>,
    {
        let code = numeric_code::deserialize(deserializer)?;
        BuySell::from_code(code)
            .ok_or_else(|| de::Error::custom(format!("unknown order side code {code}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Deserialize, Debug)]
    struct Sample {
        #[serde(deserialize_with = "numeric_code::deserialize")]
        id: u64,
        #[serde(rename = "type", deserialize_with = "side_code::deserialize")]
        side: BuySell,
    }

    #[test]
    fn test_mixed_representations() {
        let a: Sample = serde_json::from_str(r#"{"id": 42, "type": 0}"#).unwrap();
        let b: Sample = serde_json::from_str(r#"{"id": "42", "type": "0"}"#).unwrap();
        assert_eq!(a.id, 42);
        assert_eq!(b.id, 42);
        assert_eq!(a.side, BuySell::Buy);
        assert_eq!(b.side, BuySell::Buy);
    }

    #[test]
    fn test_rejects_bad_codes() {
        assert!(serde_json::from_str::<Sample>(r#"{"id": -1, "type": 0}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"id": "x", "type": 0}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"id": 1, "type": 5}"#).is_err());
    }
}
