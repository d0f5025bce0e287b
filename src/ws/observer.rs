//! Lifecycle events of a [`StreamConnection`](super::StreamConnection).

use std::time::Duration;

use tokio::time::Instant;

/// Something that happened on a stream connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// The reader was started.
    Started {
        /// Per-message read timeout.
        read_timeout: Duration,
    },
    /// A keepalive ping was written.
    PingSent,
    /// Writing a keepalive ping failed; the connection is being torn down.
    PingFailed {
        /// The write error.
        error: String,
    },
    /// A pong arrived and pushed the read deadline out.
    PongReceived {
        /// The new read deadline, `None` when reads no longer time out.
        deadline: Option<Instant>,
    },
    /// No message arrived before the read deadline.
    DeadlineExceeded,
    /// Reading from the socket failed.
    ReadFailed {
        /// The read error.
        error: String,
    },
    /// The consumer dropped the frame stream.
    ConsumerDropped,
    /// [`stop`](super::StreamConnection::stop) was called on a live connection.
    StopRequested,
    /// Closing the socket failed. The connection is closed regardless.
    CloseFailed {
        /// The close error.
        error: String,
    },
    /// The connection was torn down.
    Closed,
}

/// Receives connection lifecycle events.
///
/// Called inline from the connection's tasks, so implementations must not
/// block.
pub trait ConnectionObserver: Send + Sync {
    /// Handle an event.
    fn on_event(&self, event: &ConnectionEvent);
}

impl<F> ConnectionObserver for F
where
    F: Fn(&ConnectionEvent) + Send + Sync,
{
    fn on_event(&self, event: &ConnectionEvent) {
        self(event)
    }
}

/// Observer that reports events through `tracing`.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl ConnectionObserver for TracingObserver {
    fn on_event(&self, event: &ConnectionEvent) {
        match event {
            ConnectionEvent::Started { read_timeout } => {
                tracing::debug!(service = "bitstamp", ?read_timeout, "stream reader started");
            }
            ConnectionEvent::PingSent => tracing::trace!(service = "bitstamp", "ping sent"),
            ConnectionEvent::PingFailed { error } => {
                tracing::warn!(service = "bitstamp", %error, "ping failed, closing connection");
            }
            ConnectionEvent::PongReceived { .. } => {
                tracing::trace!(service = "bitstamp", "pong received")
            }
            ConnectionEvent::DeadlineExceeded => {
                tracing::warn!(service = "bitstamp", "read deadline exceeded, closing connection");
            }
            ConnectionEvent::ReadFailed { error } => {
                tracing::warn!(service = "bitstamp", %error, "read failed, closing connection");
            }
            ConnectionEvent::ConsumerDropped => {
                tracing::debug!(service = "bitstamp", "frame stream dropped, closing connection");
            }
            ConnectionEvent::StopRequested => {
                tracing::debug!(service = "bitstamp", "stop requested")
            }
            ConnectionEvent::CloseFailed { error } => {
                tracing::debug!(service = "bitstamp", %error, "socket close failed");
            }
            ConnectionEvent::Closed => tracing::info!(service = "bitstamp", "connection closed"),
        }
    }
}
