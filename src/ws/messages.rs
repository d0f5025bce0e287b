//! Bitstamp WebSocket message types.

use serde::{Deserialize, Serialize};

use crate::error::BitstampError;

/// Event names.
pub mod events {
    pub const SUBSCRIBE: &str = "bts:subscribe";
    pub const UNSUBSCRIBE: &str = "bts:unsubscribe";
    pub const SUBSCRIPTION_SUCCEEDED: &str = "bts:subscription_succeeded";
    pub const UNSUBSCRIPTION_SUCCEEDED: &str = "bts:unsubscription_succeeded";
    pub const REQUEST_RECONNECT: &str = "bts:request_reconnect";
    pub const ERROR: &str = "bts:error";
    pub const TRADE: &str = "trade";
    pub const DATA: &str = "data";
    pub const ORDER_CREATED: &str = "order_created";
    pub const ORDER_CHANGED: &str = "order_changed";
    pub const ORDER_DELETED: &str = "order_deleted";
}

/// Channel names. Pairs are lowercase, e.g. `btcusd`.
pub mod channels {
    /// Public trades of a pair.
    pub fn live_trades(pair: &str) -> String {
        format!("live_trades_{}", pair)
    }

    /// Top 100 order book snapshots of a pair.
    pub fn order_book(pair: &str) -> String {
        format!("order_book_{}", pair)
    }

    /// Order book updates of a pair.
    pub fn diff_order_book(pair: &str) -> String {
        format!("diff_order_book_{}", pair)
    }

    /// Public order events of a pair.
    pub fn live_orders(pair: &str) -> String {
        format!("live_orders_{}", pair)
    }

    /// The account's order events; needs a token from
    /// [`get_websocket_token`](crate::rest::PrivateRestClient::get_websocket_token).
    pub fn private_my_orders(pair: &str, user_id: u64) -> String {
        format!("private-my_orders_{}-{}", pair, user_id)
    }

    /// The account's fills.
    pub fn private_my_trades(pair: &str, user_id: u64) -> String {
        format!("private-my_trades_{}-{}", pair, user_id)
    }
}

/// Subscribe or unsubscribe request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelRequest {
    /// `bts:subscribe` or `bts:unsubscribe`.
    pub event: String,
    /// Channel and optional token.
    pub data: ChannelData,
}

/// Payload of a [`ChannelRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelData {
    /// Channel name.
    pub channel: String,
    /// WebSocket token, private channels only.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub auth: Option<String>,
}

impl ChannelRequest {
    /// Subscribe to a public channel.
    pub fn subscribe(channel: impl Into<String>) -> Self {
        Self::new(events::SUBSCRIBE, channel.into(), None)
    }

    /// Subscribe to a private channel.
    pub fn subscribe_private(channel: impl Into<String>, token: impl Into<String>) -> Self {
        Self::new(events::SUBSCRIBE, channel.into(), Some(token.into()))
    }

    /// Unsubscribe from a channel.
    pub fn unsubscribe(channel: impl Into<String>) -> Self {
        Self::new(events::UNSUBSCRIBE, channel.into(), None)
    }

    fn new(event: &str, channel: String, auth: Option<String>) -> Self {
        Self {
            event: event.to_string(),
            data: ChannelData { channel, auth },
        }
    }

    /// Serialize to the JSON text sent over the socket.
    pub fn to_json(&self) -> Result<String, BitstampError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Any message received from the socket.
///
/// `data` is left as raw JSON since its shape depends on the channel.
#[derive(Debug, Clone, Deserialize)]
pub struct StreamEvent {
    /// Event name, see [`events`].
    pub event: String,
    /// Channel the event belongs to; empty for connection-level events.
    #[serde(default)]
    pub channel: String,
    /// Event payload.
    #[serde(default)]
    pub data: serde_json::Value,
}

impl StreamEvent {
    /// Parse a received frame.
    pub fn parse(frame: &[u8]) -> Result<Self, BitstampError> {
        Ok(serde_json::from_slice(frame)?)
    }

    /// The server asks clients to reconnect, usually ahead of maintenance.
    pub fn is_reconnect_request(&self) -> bool {
        self.event == events::REQUEST_RECONNECT
    }

    /// The server rejected a request.
    pub fn is_error(&self) -> bool {
        self.event == events::ERROR
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_subscribe_json() {
        let request = ChannelRequest::subscribe(channels::live_trades("btcusd"));
        assert_eq!(
            request.to_json().unwrap(),
            r#"{"event":"bts:subscribe","data":{"channel":"live_trades_btcusd"}}"#
        );
    }

    #[test]
    fn test_private_subscribe_json() {
        let request =
            ChannelRequest::subscribe_private(channels::private_my_orders("ethusd", 7), "tok");
        assert_eq!(
            request.to_json().unwrap(),
            r#"{"event":"bts:subscribe","data":{"channel":"private-my_orders_ethusd-7","auth":"tok"}}"#
        );
    }

    #[test]
    fn test_parse_events() {
        let event = StreamEvent::parse(
            br#"{"event":"trade","channel":"live_trades_btcusd","data":{"id":1,"price":50000}}"#,
        )
        .unwrap();
        assert_eq!(event.event, events::TRADE);
        assert_eq!(event.data["price"], 50000);

        let event =
            StreamEvent::parse(br#"{"event":"bts:request_reconnect","channel":"","data":""}"#)
                .unwrap();
        assert!(event.is_reconnect_request());
        assert!(!event.is_error());
    }
}
