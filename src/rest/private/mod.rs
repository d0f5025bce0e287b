//! Private REST API endpoints (authentication required).
//!
//! These endpoints require API credentials to be configured on the client.

mod types;

pub use types::*;

use crate::auth::FormParams;
use crate::error::BitstampError;
use crate::rest::PrivateRestClient;
use crate::rest::endpoints::private;

fn id_params(id: u64) -> FormParams {
    FormParams::from([("id".to_string(), id.to_string())])
}

impl PrivateRestClient {
    /// Get account balances.
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
    ///     let credentials = Arc::new(StaticCredentials::new("key", "secret"));
    ///     let client = PrivateRestClient::builder().credentials(credentials).build()?;
    ///
    ///     let balances = client.get_balances().await?;
    ///     println!("BTC: {:?}", balances.total("btc"));
    ///     Ok(())
    /// }
    /// ```
    pub async fn get_balances(&self) -> Result<Balances, BitstampError> {
        self.private_post_json(private::BALANCE, &FormParams::new())
            .await
    }

    /// Get the user transaction history.
    pub async fn get_transactions(&self) -> Result<Vec<UserTransaction>, BitstampError> {
        self.private_post_json(private::USER_TRANSACTIONS, &FormParams::new())
            .await
    }

    /// Get open orders across all pairs.
    pub async fn get_open_orders(&self) -> Result<Vec<OpenOrder>, BitstampError> {
        self.private_post_json(private::OPEN_ORDERS_ALL, &FormParams::new())
            .await
    }

    /// Get the status of an order.
    pub async fn get_order_status(&self, id: u64) -> Result<OrderStatusResponse, BitstampError> {
        self.private_post_json(private::ORDER_STATUS, &id_params(id))
            .await
    }

    /// Cancel an order.
    pub async fn cancel_order(&self, id: u64) -> Result<CancelOrderResponse, BitstampError> {
        self.private_post_json(private::CANCEL_ORDER, &id_params(id))
            .await
    }

    /// Cancel all open orders.
    pub async fn cancel_all_orders(&self) -> Result<CancelAllOrdersResponse, BitstampError> {
        self.private_post_json(private::CANCEL_ALL_ORDERS, &FormParams::new())
            .await
    }

    /// Place a limit or market order.
    ///
    /// The request is validated locally first; an invalid request is never sent.
    /// An "Order could not be placed" rejection is returned as-is, see
    /// [`crate::error::ApiError::is_order_not_placed`].
    pub async fn place_order(
        &self,
        request: &PlaceOrderRequest,
    ) -> Result<PlaceOrderResponse, BitstampError> {
        request.validate()?;
        self.private_post_json(&request.path(), &request.form_params())
            .await
    }

    /// Get a token for private WebSocket channels.
    pub async fn get_websocket_token(&self) -> Result<WebSocketToken, BitstampError> {
        self.private_post_json(private::WEBSOCKETS_TOKEN, &FormParams::new())
            .await
    }
}
