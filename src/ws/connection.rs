//! Keepalive-managed stream connection.

use std::pin::Pin;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::{Context, Poll};
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{Stream, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{Mutex, mpsc};
use tokio::time::Instant;
use tokio_stream::wrappers::ReceiverStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tokio_util::sync::CancellationToken;

use super::config::StreamConfig;
use super::keepalive;
use super::observer::{ConnectionEvent, ConnectionObserver, TracingObserver};
use super::transport::{Frame, FrameReader, FrameSocket, FrameWriter};
use crate::error::BitstampError;

/// The TLS WebSocket stream produced by [`WebSocketConnection::connect`].
pub type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// A [`StreamConnection`] over a live WebSocket.
pub type WebSocketConnection =
    StreamConnection<SplitStream<WsStream>, SplitSink<WsStream, WsMessage>>;

/// Lifecycle state of a [`StreamConnection`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    /// Created, reader not started.
    Idle,
    /// Reader started and connection open.
    Running,
    /// Torn down. Terminal.
    Stopped,
}

/// State shared by the connection handle, the reader and the keepalive task.
pub(crate) struct Shared<W> {
    writer: Mutex<W>,
    /// Fired when teardown begins; interrupts reads, writes and the keepalive.
    pub(crate) cancel: CancellationToken,
    /// Fired once the socket is closed (or the close gave up).
    finished: CancellationToken,
    closed: AtomicBool,
    close_timeout: Duration,
    pub(crate) observer: Arc<dyn ConnectionObserver>,
}

impl<W: FrameWriter> Shared<W> {
    pub(crate) fn observe(&self, event: ConnectionEvent) {
        self.observer.on_event(&event);
    }

    fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Write a frame; writes are serialized by the writer lock.
    ///
    /// A write still pending when teardown begins is abandoned, releasing the
    /// lock for the close.
    pub(crate) async fn write(&self, frame: Frame) -> Result<(), BitstampError> {
        let closed = || BitstampError::Transport("connection is closed".to_string());
        if self.is_closed() {
            return Err(closed());
        }
        tokio::select! {
            biased;
            () = self.cancel.cancelled() => Err(closed()),
            result = async { self.writer.lock().await.write_frame(frame).await } => result,
        }
    }

    /// Close the connection.
    ///
    /// The first call closes the socket; every call returns only once that
    /// close has finished or timed out.
    pub(crate) async fn teardown(&self) {
        if self.closed.swap(true, Ordering::SeqCst) {
            self.finished.cancelled().await;
            return;
        }
        // Fires even if this future is dropped mid-close.
        let _finished = self.finished.clone().drop_guard();
        self.cancel.cancel();

        let close = async { self.writer.lock().await.close().await };
        let error = match tokio::time::timeout(self.close_timeout, close).await {
            Ok(Ok(())) => None,
            Ok(Err(e)) => Some(e.to_string()),
            Err(_) => Some(format!("close timed out after {:?}", self.close_timeout)),
        };
        if let Some(error) = error {
            self.observe(ConnectionEvent::CloseFailed { error });
        }
        self.observe(ConnectionEvent::Closed);
    }
}

/// A message stream over a socket, kept alive with pings.
///
/// [`start`](Self::start) spawns a reader task that forwards every data frame
/// to the returned [`FrameStream`] and a keepalive task that pings the peer.
/// The connection is torn down when a read fails, a read deadline passes, a
/// ping cannot be written, the consumer drops the stream, or
/// [`stop`](Self::stop) is called. The stream ends once the reader has
/// finished tearing down.
///
/// # Example
///
/// ```rust,no_run
/// use bitstamp_api_client::ws::{StreamConfig, WebSocketConnection, WS_URL};
/// use bitstamp_api_client::ws::messages::{ChannelRequest, channels};
/// use futures_util::StreamExt;
/// use std::time::Duration;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let mut conn = WebSocketConnection::connect(WS_URL, StreamConfig::default()).await?;
///     let mut frames = conn.start(Duration::from_secs(30))?;
///
///     let subscribe = ChannelRequest::subscribe(channels::live_trades("btcusd"));
///     conn.send(subscribe.to_json()?.into_bytes()).await?;
///
///     while let Some(frame) = frames.next().await {
///         println!("{}", String::from_utf8_lossy(&frame));
///     }
///     conn.stop().await;
///     Ok(())
/// }
/// ```
pub struct StreamConnection<R, W> {
    socket: Option<FrameSocket<R>>,
    shared: Arc<Shared<W>>,
    config: StreamConfig,
}

impl<R: FrameReader, W: FrameWriter> StreamConnection<R, W> {
    /// Wrap a socket, reporting events through `tracing`.
    pub fn new(reader: R, writer: W, config: StreamConfig) -> Self {
        Self::with_observer(reader, writer, config, Arc::new(TracingObserver))
    }

    /// Wrap a socket with a custom event observer.
    pub fn with_observer(
        reader: R,
        writer: W,
        config: StreamConfig,
        observer: Arc<dyn ConnectionObserver>,
    ) -> Self {
        Self {
            socket: Some(FrameSocket::new(reader)),
            shared: Arc::new(Shared {
                writer: Mutex::new(writer),
                cancel: CancellationToken::new(),
                finished: CancellationToken::new(),
                closed: AtomicBool::new(false),
                close_timeout: config.close_timeout,
                observer,
            }),
            config,
        }
    }

    /// The connection settings.
    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ConnectionState {
        if self.shared.is_closed() {
            ConnectionState::Stopped
        } else if self.socket.is_some() {
            ConnectionState::Idle
        } else {
            ConnectionState::Running
        }
    }

    /// Start reading.
    ///
    /// Each data frame must arrive within `read_timeout` of the previous one,
    /// unless a pong pushes the deadline further. Can be called once; must be
    /// called from within a Tokio runtime.
    pub fn start(&mut self, read_timeout: Duration) -> Result<FrameStream, BitstampError> {
        if self.shared.is_closed() {
            return Err(BitstampError::ConnectionClosed {
                reason: "connection stopped".to_string(),
            });
        }
        let socket = self
            .socket
            .take()
            .ok_or_else(|| BitstampError::InvalidState("connection already started".to_string()))?;

        let (tx, rx) = mpsc::channel(self.config.queue_capacity.max(1));
        self.shared.observe(ConnectionEvent::Started { read_timeout });

        tokio::spawn(read_loop(
            socket,
            read_timeout,
            tx,
            self.shared.clone(),
            self.config.clone(),
        ));

        Ok(FrameStream {
            inner: ReceiverStream::new(rx),
        })
    }

    /// Write a text message.
    pub async fn send(&self, payload: impl Into<Vec<u8>>) -> Result<(), BitstampError> {
        let text = String::from_utf8(payload.into())
            .map_err(|e| BitstampError::InvalidRequest(format!("payload is not UTF-8: {}", e)))?;

        self.shared
            .write(Frame::Text(text))
            .await
            .map_err(|e| match e {
                BitstampError::Transport(_) => e,
                other => BitstampError::Transport(other.to_string()),
            })
    }

    /// Tear the connection down and wait for the socket to close.
    ///
    /// Safe to call more than once, and concurrently with a teardown already
    /// under way.
    pub async fn stop(&self) {
        if !self.shared.is_closed() {
            self.shared.observe(ConnectionEvent::StopRequested);
        }
        self.shared.teardown().await;
    }

    /// Wait until the connection has been torn down and the socket closed.
    pub async fn closed(&self) {
        self.shared.finished.cancelled().await;
    }
}

impl WebSocketConnection {
    /// Connect to `url` and wrap the socket, reporting events through `tracing`.
    pub async fn connect(url: &str, config: StreamConfig) -> Result<Self, BitstampError> {
        Self::connect_with_observer(url, config, Arc::new(TracingObserver)).await
    }

    /// Connect to `url` and wrap the socket with a custom event observer.
    pub async fn connect_with_observer(
        url: &str,
        config: StreamConfig,
        observer: Arc<dyn ConnectionObserver>,
    ) -> Result<Self, BitstampError> {
        tracing::info!(url, "connecting to Bitstamp WebSocket");
        let (ws_stream, _) = connect_async(url).await?;
        let (writer, reader) = ws_stream.split();
        Ok(Self::with_observer(reader, writer, config, observer))
    }
}

impl<R, W> Drop for StreamConnection<R, W> {
    fn drop(&mut self) {
        self.shared.cancel.cancel();
    }
}

impl<R, W> std::fmt::Debug for StreamConnection<R, W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StreamConnection")
            .field("started", &self.socket.is_none())
            .field("closed", &self.shared.closed.load(Ordering::SeqCst))
            .field("config", &self.config)
            .finish()
    }
}

async fn read_loop<R: FrameReader, W: FrameWriter>(
    mut socket: FrameSocket<R>,
    read_timeout: Duration,
    tx: mpsc::Sender<Vec<u8>>,
    shared: Arc<Shared<W>>,
    config: StreamConfig,
) {
    socket.set_pong_handler(keepalive::pong_handler(
        socket.read_deadline(),
        config.pong_wait,
        shared.observer.clone(),
    ));
    tokio::spawn(keepalive::run(shared.clone(), config.ping_interval));

    loop {
        match Instant::now().checked_add(read_timeout) {
            Some(at) => socket.set_read_deadline(at),
            // A timeout past the end of the clock never expires.
            None => socket.clear_read_deadline(),
        }

        let payload = tokio::select! {
            biased;
            () = shared.cancel.cancelled() => break,
            result = socket.read_message() => match result {
                Ok(payload) => payload,
                Err(BitstampError::DeadlineExceeded) => {
                    shared.observe(ConnectionEvent::DeadlineExceeded);
                    break;
                }
                Err(e) => {
                    shared.observe(ConnectionEvent::ReadFailed { error: e.to_string() });
                    break;
                }
            },
        };

        tokio::select! {
            biased;
            () = shared.cancel.cancelled() => break,
            sent = tx.send(payload) => {
                if sent.is_err() {
                    shared.observe(ConnectionEvent::ConsumerDropped);
                    break;
                }
            }
        }
    }

    // The stream must not end before the socket is closed.
    shared.teardown().await;
    drop(tx);
}

/// Data frames delivered by a started [`StreamConnection`].
///
/// Ends when the connection is torn down.
#[derive(Debug)]
pub struct FrameStream {
    inner: ReceiverStream<Vec<u8>>,
}

impl FrameStream {
    /// Receive the next frame; `None` once the connection is gone.
    pub async fn recv(&mut self) -> Option<Vec<u8>> {
        self.inner.next().await
    }
}

impl Stream for FrameStream {
    type Item = Vec<u8>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.poll_next_unpin(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct PendingReader;

    impl FrameReader for PendingReader {
        async fn read_frame(&mut self) -> Result<Frame, BitstampError> {
            std::future::pending().await
        }
    }

    struct NullWriter;

    impl FrameWriter for NullWriter {
        async fn write_frame(&mut self, _frame: Frame) -> Result<(), BitstampError> {
            Ok(())
        }

        async fn close(&mut self) -> Result<(), BitstampError> {
            Ok(())
        }
    }

    fn connection() -> StreamConnection<PendingReader, NullWriter> {
        StreamConnection::new(PendingReader, NullWriter, StreamConfig::default())
    }

    #[tokio::test]
    async fn test_state_transitions() {
        let mut conn = connection();
        assert_eq!(conn.state(), ConnectionState::Idle);

        let _frames = conn.start(Duration::from_secs(30)).unwrap();
        assert_eq!(conn.state(), ConnectionState::Running);

        conn.stop().await;
        assert_eq!(conn.state(), ConnectionState::Stopped);
    }

    #[tokio::test]
    async fn test_start_twice_fails() {
        let mut conn = connection();
        let _frames = conn.start(Duration::from_secs(30)).unwrap();

        let err = conn.start(Duration::from_secs(30)).unwrap_err();
        assert!(matches!(err, BitstampError::InvalidState(_)));
        conn.stop().await;
    }

    #[tokio::test]
    async fn test_start_after_stop_fails() {
        let mut conn = connection();
        conn.stop().await;

        let err = conn.start(Duration::from_secs(30)).unwrap_err();
        assert!(matches!(err, BitstampError::ConnectionClosed { .. }));
    }

    #[tokio::test]
    async fn test_send_rejects_invalid_utf8() {
        let conn = connection();
        let err = conn.send(vec![0xff, 0xfe]).await.unwrap_err();
        assert!(matches!(err, BitstampError::InvalidRequest(_)));
    }
}
