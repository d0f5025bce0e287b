//! Bitstamp REST API endpoint constants.

/// Base URL for the Bitstamp REST API.
pub const BITSTAMP_BASE_URL: &str = "https://www.bitstamp.net";

/// Private endpoints (authentication required).
pub mod private {
    /// Get account balances.
    pub const BALANCE: &str = "/api/v2/balance/";
    /// Get user transactions.
    pub const USER_TRANSACTIONS: &str = "/api/v2/user_transactions/";
    /// Get open orders for all pairs.
    pub const OPEN_ORDERS_ALL: &str = "/api/v2/open_orders/all/";
    /// Get order status.
    pub const ORDER_STATUS: &str = "/api/v2/order_status/";
    /// Cancel an order.
    pub const CANCEL_ORDER: &str = "/api/v2/cancel_order/";
    /// Cancel all orders.
    pub const CANCEL_ALL_ORDERS: &str = "/api/v2/cancel_all_orders/";
    /// Get a WebSocket authentication token.
    pub const WEBSOCKETS_TOKEN: &str = "/api/v2/websockets_token/";

    use crate::types::{BuySell, OrderType};

    /// Order placement path for a side, order type and pair.
    ///
    /// Limit orders go to `/api/v2/{side}/{pair}/`, market orders to
    /// `/api/v2/{side}/market/{pair}/`.
    pub fn place_order(side: BuySell, order_type: OrderType, pair: &str) -> String {
        match order_type {
            OrderType::Limit => format!("/api/v2/{}/{}/", side.as_path_segment(), pair),
            OrderType::Market => format!("/api/v2/{}/market/{}/", side.as_path_segment(), pair),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BuySell, OrderType};

    #[test]
    fn test_place_order_paths() {
        assert_eq!(
            private::place_order(BuySell::Buy, OrderType::Limit, "btcusd"),
            "/api/v2/buy/btcusd/"
        );
        assert_eq!(
            private::place_order(BuySell::Sell, OrderType::Market, "etheur"),
            "/api/v2/sell/market/etheur/"
        );
    }
}
