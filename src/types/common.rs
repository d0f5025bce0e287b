//! Common domain types for Bitstamp API.

use serde::{Deserialize, Serialize};

/// Buy or sell side of an order.
///
/// Bitstamp encodes the side of orders and fills as `0` (buy) and `1` (sell),
/// sometimes as a string; see [`crate::types::serde_helpers::side_code`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuySell {
    /// Buy order
    Buy,
    /// Sell order
    Sell,
}

impl BuySell {
    /// Decode Bitstamp's numeric side code.
    pub fn from_code(code: u64) -> Option<Self> {
        match code {
            0 => Some(BuySell::Buy),
            1 => Some(BuySell::Sell),
            _ => None,
        }
    }

    /// The path segment used by the order placement endpoints.
    pub fn as_path_segment(&self) -> &'static str {
        match self {
            BuySell::Buy => "buy",
            BuySell::Sell => "sell",
        }
    }
}

impl std::fmt::Display for BuySell {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_path_segment())
    }
}

/// Order type for trading.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderType {
    /// Market order - execute immediately at best available price
    Market,
    /// Limit order - execute at specified price or better
    Limit,
}

impl std::fmt::Display for OrderType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderType::Market => write!(f, "market"),
            OrderType::Limit => write!(f, "limit"),
        }
    }
}

/// Execution flag of a limit order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeInForce {
    /// Good till cancelled
    #[default]
    Gtc,
    /// Expires at midnight UTC (`daily_order`)
    Daily,
    /// Fill or kill (`fok_order`)
    Fok,
    /// Immediate or cancel (`ioc_order`)
    Ioc,
}

impl TimeInForce {
    /// The form field that enables this flag, if any.
    pub fn form_field(&self) -> Option<&'static str> {
        match self {
            TimeInForce::Gtc => None,
            TimeInForce::Daily => Some("daily_order"),
            TimeInForce::Fok => Some("fok_order"),
            TimeInForce::Ioc => Some("ioc_order"),
        }
    }
}

/// Status of an order as reported by `order_status`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    /// Order is open and active
    Open,
    /// Order has been completely filled
    Finished,
    /// Order has been canceled
    Canceled,
    /// Order expired
    Expired,
    /// Status not known to this client
    #[serde(untagged)]
    Other(String),
}

/// Kind of a user transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TransactionType {
    /// Deposit
    Deposit,
    /// Withdrawal
    Withdrawal,
    /// Market trade
    MarketTrade,
    /// Sub account transfer
    SubAccountTransfer,
    /// Credited with staked assets
    CreditedWithStakedAssets,
    /// Sent assets to staking
    SentAssetsToStaking,
    /// Staking reward
    StakingReward,
    /// Referral reward
    ReferralReward,
    /// Inter account transfer
    InterAccountTransfer,
    /// Any other code
    Unknown(u64),
}

impl From<u64> for TransactionType {
    fn from(code: u64) -> Self {
        match code {
            0 => TransactionType::Deposit,
            1 => TransactionType::Withdrawal,
            2 => TransactionType::MarketTrade,
            14 => TransactionType::SubAccountTransfer,
            25 => TransactionType::CreditedWithStakedAssets,
            26 => TransactionType::SentAssetsToStaking,
            27 => TransactionType::StakingReward,
            32 => TransactionType::ReferralReward,
            35 => TransactionType::InterAccountTransfer,
            other => TransactionType::Unknown(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_codes() {
        assert_eq!(BuySell::from_code(0), Some(BuySell::Buy));
        assert_eq!(BuySell::from_code(1), Some(BuySell::Sell));
        assert_eq!(BuySell::from_code(2), None);
        assert_eq!(BuySell::Sell.to_string(), "sell");
    }

    #[test]
    fn test_order_status_unknown_value() {
        let status: OrderStatus = serde_json::from_str(r#""Finished""#).unwrap();
        assert_eq!(status, OrderStatus::Finished);

        let status: OrderStatus = serde_json::from_str(r#""Pending""#).unwrap();
        assert_eq!(status, OrderStatus::Other("Pending".into()));
    }

    #[test]
    fn test_time_in_force_fields() {
        assert_eq!(TimeInForce::Gtc.form_field(), None);
        assert_eq!(TimeInForce::Fok.form_field(), Some("fok_order"));
        assert_eq!(TransactionType::from(2), TransactionType::MarketTrade);
        assert_eq!(TransactionType::from(99), TransactionType::Unknown(99));
    }
}
