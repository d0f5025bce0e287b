//! Request and response types for private endpoints.

use std::collections::HashMap;
use std::time::Duration;

use rust_decimal::Decimal;
use serde::Deserialize;
use serde_with::{DurationSeconds, serde_as};

use crate::auth::FormParams;
use crate::error::BitstampError;
use crate::types::serde_helpers::{numeric_code, side_code};
use crate::types::{BuySell, OrderStatus, OrderType, TimeInForce, TransactionType};

/// Account balances as returned by `/api/v2/balance/`.
///
/// Bitstamp returns a flat object keyed `{currency}_balance`,
/// `{currency}_available`, `{currency}_reserved` and `{pair}_fee`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct Balances {
    /// Raw entries by key.
    pub entries: HashMap<String, Option<Decimal>>,
}

impl Balances {
    fn lookup(&self, currency: &str, suffix: &str) -> Option<Decimal> {
        let key = format!("{}_{}", currency.to_lowercase(), suffix);
        self.entries.get(&key).copied().flatten()
    }

    /// Total balance of a currency.
    pub fn total(&self, currency: &str) -> Option<Decimal> {
        self.lookup(currency, "balance")
    }

    /// Available balance of a currency.
    pub fn available(&self, currency: &str) -> Option<Decimal> {
        self.lookup(currency, "available")
    }

    /// Balance of a currency reserved in open orders.
    pub fn reserved(&self, currency: &str) -> Option<Decimal> {
        self.lookup(currency, "reserved")
    }

    /// Trading fee for a pair, in percent.
    pub fn fee(&self, pair: &str) -> Option<Decimal> {
        self.lookup(pair, "fee")
    }
}

/// A single entry of `/api/v2/user_transactions/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserTransaction {
    /// Transaction ID.
    #[serde(deserialize_with = "numeric_code::deserialize")]
    pub id: u64,
    /// Date and time, e.g. `2024-01-02 10:00:00.123456`.
    pub datetime: String,
    /// Raw transaction type code.
    #[serde(rename = "type", deserialize_with = "numeric_code::deserialize")]
    pub type_code: u64,
    /// Transaction fee.
    #[serde(default)]
    pub fee: Option<Decimal>,
    /// Order that caused the transaction, for trades.
    #[serde(default)]
    pub order_id: Option<u64>,
    /// Per-currency amounts and pair rates (`usd`, `btc`, `btc_usd`, ...).
    #[serde(flatten)]
    pub amounts: HashMap<String, serde_json::Value>,
}

impl UserTransaction {
    /// Decoded transaction type.
    pub fn transaction_type(&self) -> TransactionType {
        TransactionType::from(self.type_code)
    }
}

/// An open order from `/api/v2/open_orders/all/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OpenOrder {
    /// Order ID.
    #[serde(deserialize_with = "numeric_code::deserialize")]
    pub id: u64,
    /// Date and time of creation.
    pub datetime: String,
    /// Order side.
    #[serde(rename = "type", deserialize_with = "side_code::deserialize")]
    pub side: BuySell,
    /// Limit price.
    pub price: Decimal,
    /// Remaining amount.
    pub amount: Decimal,
    /// Pair, e.g. `BTC/USD`.
    #[serde(default)]
    pub currency_pair: Option<String>,
    /// Client order ID, if one was set.
    #[serde(default)]
    pub client_order_id: Option<String>,
}

/// A fill listed in an order status response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderFill {
    /// Trade ID.
    pub tid: u64,
    /// Fill price.
    pub price: Decimal,
    /// Fee charged.
    pub fee: Decimal,
    /// Date and time of the fill.
    pub datetime: String,
    /// Raw transaction type code.
    #[serde(rename = "type", deserialize_with = "numeric_code::deserialize")]
    pub type_code: u64,
    /// Per-currency amounts.
    #[serde(flatten)]
    pub amounts: HashMap<String, serde_json::Value>,
}

/// Response of `/api/v2/order_status/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OrderStatusResponse {
    /// Order ID.
    #[serde(deserialize_with = "numeric_code::deserialize")]
    pub id: u64,
    /// Order status.
    pub status: OrderStatus,
    /// Fills so far.
    #[serde(default)]
    pub transactions: Vec<OrderFill>,
    /// Amount not yet filled.
    #[serde(default)]
    pub amount_remaining: Option<Decimal>,
    /// Client order ID, if one was set.
    #[serde(default)]
    pub client_order_id: Option<String>,
}

/// Response of `/api/v2/cancel_order/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CancelOrderResponse {
    /// Order ID.
    #[serde(deserialize_with = "numeric_code::deserialize")]
    pub id: u64,
    /// Amount that was cancelled.
    pub amount: Decimal,
    /// Order price.
    pub price: Decimal,
    /// Order side.
    #[serde(rename = "type", deserialize_with = "side_code::deserialize")]
    pub side: BuySell,
}

/// An order listed in a cancel-all response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CancelledOrder {
    /// Order ID.
    #[serde(deserialize_with = "numeric_code::deserialize")]
    pub id: u64,
    /// Amount that was cancelled.
    pub amount: Decimal,
    /// Order price.
    pub price: Decimal,
    /// Order side.
    #[serde(rename = "type", deserialize_with = "side_code::deserialize")]
    pub side: BuySell,
    /// Pair, e.g. `BTC/USD`.
    #[serde(default)]
    pub currency_pair: Option<String>,
}

/// Response of `/api/v2/cancel_all_orders/`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CancelAllOrdersResponse {
    /// Whether the cancellation succeeded.
    pub success: bool,
    /// Orders that were cancelled.
    #[serde(default)]
    pub canceled: Vec<CancelledOrder>,
}

/// Response of the order placement endpoints.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PlaceOrderResponse {
    /// Order ID.
    #[serde(deserialize_with = "numeric_code::deserialize")]
    pub id: u64,
    /// Date and time of creation.
    pub datetime: String,
    /// Order side.
    #[serde(rename = "type", deserialize_with = "side_code::deserialize")]
    pub side: BuySell,
    /// Order price.
    pub price: Decimal,
    /// Order amount.
    pub amount: Decimal,
    /// Client order ID, if one was set.
    #[serde(default)]
    pub client_order_id: Option<String>,
}

/// Response of `/api/v2/websockets_token/`.
#[serde_as]
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct WebSocketToken {
    /// Token for private channel subscriptions.
    pub token: String,
    /// User ID, part of private channel names.
    #[serde(deserialize_with = "numeric_code::deserialize")]
    pub user_id: u64,
    /// How long the token stays valid.
    #[serde_as(as = "DurationSeconds<u64>")]
    #[serde(rename = "valid_sec")]
    pub valid_for: Duration,
}

/// Request to place a limit or market order.
///
/// # Example
///
/// ```rust
/// use bitstamp_api_client::rest::private::PlaceOrderRequest;
/// use bitstamp_api_client::types::{BuySell, TimeInForce};
/// use rust_decimal::Decimal;
///
/// let request = PlaceOrderRequest::limit("btcusd", BuySell::Buy, Decimal::new(1, 3), Decimal::new(30000, 0))
///     .time_in_force(TimeInForce::Ioc);
/// assert!(request.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct PlaceOrderRequest {
    /// Pair, e.g. `btcusd`.
    pub pair: String,
    /// Order side.
    pub side: BuySell,
    /// Order type.
    pub order_type: OrderType,
    /// Amount in base currency.
    pub amount: Decimal,
    /// Limit price; ignored for market orders.
    pub price: Option<Decimal>,
    /// Execution flag; limit orders only.
    pub time_in_force: TimeInForce,
}

impl PlaceOrderRequest {
    /// Create a limit order request.
    pub fn limit(pair: impl Into<String>, side: BuySell, amount: Decimal, price: Decimal) -> Self {
        Self {
            pair: pair.into(),
            side,
            order_type: OrderType::Limit,
            amount,
            price: Some(price),
            time_in_force: TimeInForce::Gtc,
        }
    }

    /// Create a market order request.
    pub fn market(pair: impl Into<String>, side: BuySell, amount: Decimal) -> Self {
        Self {
            pair: pair.into(),
            side,
            order_type: OrderType::Market,
            amount,
            price: None,
            time_in_force: TimeInForce::Gtc,
        }
    }

    /// Set the execution flag.
    pub fn time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = time_in_force;
        self
    }

    /// Check the request before anything is signed.
    pub fn validate(&self) -> Result<(), BitstampError> {
        if self.pair.trim().is_empty() {
            return Err(BitstampError::InvalidRequest("pair isn't specified".into()));
        }
        if self.amount <= Decimal::ZERO {
            return Err(BitstampError::InvalidRequest(
                "amount must be greater than zero".into(),
            ));
        }
        if self.order_type == OrderType::Limit {
            match self.price {
                Some(price) if price > Decimal::ZERO => {}
                _ => {
                    return Err(BitstampError::InvalidRequest(
                        "price must be greater than zero for limit orders".into(),
                    ));
                }
            }
        }
        Ok(())
    }

    /// The endpoint path for this order.
    pub fn path(&self) -> String {
        crate::rest::endpoints::private::place_order(
            self.side,
            self.order_type,
            &self.pair.to_lowercase(),
        )
    }

    /// The form body for this order.
    pub fn form_params(&self) -> FormParams {
        let mut params = FormParams::new();
        params.insert("amount".into(), self.amount.normalize().to_string());

        if self.order_type == OrderType::Limit {
            if let Some(price) = self.price {
                params.insert("price".into(), price.normalize().to_string());
            }
            if let Some(field) = self.time_in_force.form_field() {
                params.insert(field.into(), "True".into());
            }
        }
        params
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    #[test]
    fn test_balances_lookup() {
        let json = r#"{"usd_balance": "100.50", "usd_available": "90.00", "usd_reserved": "10.50",
                       "btcusd_fee": "0.500", "eth_balance": null}"#;
        let balances: Balances = serde_json::from_str(json).unwrap();

        assert_eq!(balances.total("USD"), Some(dec("100.50")));
        assert_eq!(balances.available("usd"), Some(dec("90.00")));
        assert_eq!(balances.reserved("usd"), Some(dec("10.50")));
        assert_eq!(balances.fee("btcusd"), Some(dec("0.500")));
        assert_eq!(balances.total("eth"), None);
        assert_eq!(balances.total("xrp"), None);
    }

    #[test]
    fn test_user_transaction_parsing() {
        let json = r#"{"id": 1001, "datetime": "2024-01-02 10:00:00.123456", "type": "2",
                       "fee": "0.10", "order_id": 5555, "usd": "-20.00", "btc": "0.001",
                       "btc_usd": 20000.0}"#;
        let tx: UserTransaction = serde_json::from_str(json).unwrap();

        assert_eq!(tx.id, 1001);
        assert_eq!(tx.transaction_type(), TransactionType::MarketTrade);
        assert_eq!(tx.order_id, Some(5555));
        assert_eq!(tx.amounts.get("usd"), Some(&serde_json::json!("-20.00")));
    }

    #[test]
    fn test_open_order_string_codes() {
        let json = r#"{"id": "1383", "datetime": "2024-01-02 10:00:00", "type": "1",
                       "price": "30000.00", "amount": "0.5", "currency_pair": "BTC/USD"}"#;
        let order: OpenOrder = serde_json::from_str(json).unwrap();

        assert_eq!(order.id, 1383);
        assert_eq!(order.side, BuySell::Sell);
        assert_eq!(order.price, dec("30000.00"));
    }

    #[test]
    fn test_websocket_token() {
        let json = r#"{"token": "abc", "user_id": 77, "valid_sec": 60}"#;
        let token: WebSocketToken = serde_json::from_str(json).unwrap();
        assert_eq!(token.user_id, 77);
        assert_eq!(token.valid_for, Duration::from_secs(60));
    }

    #[test]
    fn test_order_validation() {
        let ok = PlaceOrderRequest::limit("btcusd", BuySell::Buy, dec("0.1"), dec("100"));
        assert!(ok.validate().is_ok());

        let no_pair = PlaceOrderRequest::market("", BuySell::Buy, dec("0.1"));
        assert!(matches!(no_pair.validate(), Err(BitstampError::InvalidRequest(_))));

        let no_amount = PlaceOrderRequest::market("btcusd", BuySell::Sell, Decimal::ZERO);
        assert!(matches!(no_amount.validate(), Err(BitstampError::InvalidRequest(_))));

        let no_price = PlaceOrderRequest::limit("btcusd", BuySell::Buy, dec("0.1"), Decimal::ZERO);
        assert!(matches!(no_price.validate(), Err(BitstampError::InvalidRequest(_))));

        // Market orders don't need a price.
        let market = PlaceOrderRequest::market("btcusd", BuySell::Buy, dec("0.1"));
        assert!(market.validate().is_ok());
    }

    #[test]
    fn test_order_form_params() {
        let limit = PlaceOrderRequest::limit("BTCUSD", BuySell::Buy, dec("0.100"), dec("30000.50"))
            .time_in_force(TimeInForce::Daily);
        assert_eq!(limit.path(), "/api/v2/buy/btcusd/");

        let params = limit.form_params();
        assert_eq!(params.get("amount").map(String::as_str), Some("0.1"));
        assert_eq!(params.get("price").map(String::as_str), Some("30000.5"));
        assert_eq!(params.get("daily_order").map(String::as_str), Some("True"));

        let market = PlaceOrderRequest::market("btcusd", BuySell::Sell, dec("2"))
            .time_in_force(TimeInForce::Fok);
        assert_eq!(market.path(), "/api/v2/sell/market/btcusd/");
        let params = market.form_params();
        assert_eq!(params.len(), 1);
        assert_eq!(params.get("amount").map(String::as_str), Some("2"));
    }
}
