//! Bitstamp WebSocket streaming.
//!
//! [`StreamConnection`] owns one socket, keeps it alive with pings and pongs,
//! and hands data frames to the consumer through a bounded [`FrameStream`].
//! The socket is reached through the [`FrameReader`] and [`FrameWriter`]
//! traits, so any transport (including an in-memory one) can drive it.

mod config;
mod connection;
mod keepalive;
pub mod messages;
mod observer;
mod transport;

pub use config::{
    DEFAULT_CLOSE_TIMEOUT, DEFAULT_PING_INTERVAL, DEFAULT_PONG_WAIT, DEFAULT_QUEUE_CAPACITY,
    StreamConfig, StreamConfigBuilder, WS_URL,
};
pub use connection::{
    ConnectionState, FrameStream, StreamConnection, WebSocketConnection, WsStream,
};
pub use observer::{ConnectionEvent, ConnectionObserver, TracingObserver};
pub use transport::{Frame, FrameReader, FrameSocket, FrameWriter, PongHandler, ReadDeadline};
