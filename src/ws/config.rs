//! Stream connection settings.

use std::time::Duration;

/// Bitstamp WebSocket endpoint.
pub const WS_URL: &str = "wss://ws.bitstamp.net";

/// Default interval between keepalive pings.
pub const DEFAULT_PING_INTERVAL: Duration = Duration::from_secs(10);

/// Default time a pong extends the read deadline by.
pub const DEFAULT_PONG_WAIT: Duration = Duration::from_secs(20);

/// Default bound on closing the socket during teardown.
pub const DEFAULT_CLOSE_TIMEOUT: Duration = Duration::from_secs(5);

/// Default capacity of the frame queue between reader and consumer.
pub const DEFAULT_QUEUE_CAPACITY: usize = 256;

/// Keepalive and buffering settings of a [`StreamConnection`](super::StreamConnection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Interval between keepalive pings.
    pub ping_interval: Duration,
    /// How far a received pong pushes the read deadline.
    pub pong_wait: Duration,
    /// Frames buffered before the reader waits on the consumer.
    pub queue_capacity: usize,
    /// How long teardown waits for the socket to close.
    pub close_timeout: Duration,
}

impl StreamConfig {
    /// Create a config builder.
    pub fn builder() -> StreamConfigBuilder {
        StreamConfigBuilder::default()
    }
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            ping_interval: DEFAULT_PING_INTERVAL,
            pong_wait: DEFAULT_PONG_WAIT,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
            close_timeout: DEFAULT_CLOSE_TIMEOUT,
        }
    }
}

/// Builder for [`StreamConfig`].
#[derive(Debug, Clone, Default)]
pub struct StreamConfigBuilder {
    config: StreamConfig,
}

impl StreamConfigBuilder {
    /// Set the keepalive ping interval.
    pub fn ping_interval(mut self, interval: Duration) -> Self {
        self.config.ping_interval = interval;
        self
    }

    /// Set how far a pong extends the read deadline.
    pub fn pong_wait(mut self, wait: Duration) -> Self {
        self.config.pong_wait = wait;
        self
    }

    /// Set the frame queue capacity (at least 1).
    pub fn queue_capacity(mut self, capacity: usize) -> Self {
        self.config.queue_capacity = capacity.max(1);
        self
    }

    /// Set how long teardown waits for the socket to close.
    pub fn close_timeout(mut self, timeout: Duration) -> Self {
        self.config.close_timeout = timeout;
        self
    }

    /// Build the config.
    pub fn build(self) -> StreamConfig {
        self.config
    }
}
