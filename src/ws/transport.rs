//! Socket abstraction used by [`StreamConnection`](super::StreamConnection).
//!
//! A connection is driven through two halves: a [`FrameReader`] owned by the
//! reader task and a [`FrameWriter`] shared by the keepalive driver and
//! [`send`](super::StreamConnection::send). [`FrameSocket`] adds a read
//! deadline and a pong callback on top of a reader.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::sync::watch;
use tokio::time::Instant;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message as WsMessage;

use crate::error::BitstampError;

/// A WebSocket frame as seen by the connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Frame {
    /// UTF-8 text payload.
    Text(String),
    /// Binary payload.
    Binary(Vec<u8>),
    /// Ping control frame.
    Ping(Vec<u8>),
    /// Pong control frame.
    Pong(Vec<u8>),
    /// Close control frame.
    Close,
}

impl Frame {
    /// Create a text frame.
    pub fn text(payload: impl Into<String>) -> Self {
        Frame::Text(payload.into())
    }
}

/// Reading half of a message socket.
pub trait FrameReader: Send + 'static {
    /// Wait for the next frame, control frames included.
    ///
    /// The returned future must be cancel safe: dropping it before completion
    /// must not lose a frame.
    fn read_frame(&mut self) -> impl Future<Output = Result<Frame, BitstampError>> + Send;
}

/// Writing half of a message socket.
pub trait FrameWriter: Send + 'static {
    /// Write a single frame.
    fn write_frame(&mut self, frame: Frame)
    -> impl Future<Output = Result<(), BitstampError>> + Send;

    /// Close the socket.
    fn close(&mut self) -> impl Future<Output = Result<(), BitstampError>> + Send;
}

/// Callback invoked with the payload of every pong frame.
pub type PongHandler = Box<dyn FnMut(&[u8]) + Send>;

/// Shared read deadline of a [`FrameSocket`].
///
/// Cloned handles observe and update the same deadline. `None` means reads
/// wait indefinitely.
#[derive(Debug, Clone)]
pub struct ReadDeadline {
    at: Arc<watch::Sender<Option<Instant>>>,
}

impl Default for ReadDeadline {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(None);
        Self { at: Arc::new(tx) }
    }
}

impl ReadDeadline {
    /// The current deadline.
    pub fn get(&self) -> Option<Instant> {
        *self.at.borrow()
    }

    /// Replace the deadline.
    pub fn set(&self, at: Instant) {
        self.at.send_replace(Some(at));
    }

    /// Remove the deadline.
    pub fn clear(&self) {
        self.at.send_replace(None);
    }

    /// Set the deadline to `now + window` and return it.
    ///
    /// A window too large to represent clears the deadline and returns `None`.
    pub fn extend_from_now(&self, window: Duration) -> Option<Instant> {
        let at = Instant::now().checked_add(window);
        self.at.send_replace(at);
        at
    }
}

/// A frame reader with a read deadline and a pong callback.
pub struct FrameSocket<R> {
    reader: R,
    deadline: ReadDeadline,
    pong_handler: Option<PongHandler>,
}

impl<R: FrameReader> FrameSocket<R> {
    /// Wrap a reader. No deadline is armed and pongs are ignored.
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            deadline: ReadDeadline::default(),
            pong_handler: None,
        }
    }

    /// Set the point in time after which a pending read fails.
    pub fn set_read_deadline(&self, at: Instant) {
        self.deadline.set(at);
    }

    /// Let reads wait indefinitely.
    pub fn clear_read_deadline(&self) {
        self.deadline.clear();
    }

    /// A handle to the read deadline.
    pub fn read_deadline(&self) -> ReadDeadline {
        self.deadline.clone()
    }

    /// Register the callback for pong frames, replacing any previous one.
    ///
    /// The callback runs on the task that calls [`read_message`](Self::read_message).
    pub fn set_pong_handler(&mut self, handler: impl FnMut(&[u8]) + Send + 'static) {
        self.pong_handler = Some(Box::new(handler));
    }

    /// Read the next data frame.
    ///
    /// Pongs are passed to the pong handler and pings are skipped; both
    /// keep waiting under the (possibly updated) deadline. A close frame, a
    /// reader error or an expired deadline end the read with an error.
    pub async fn read_message(&mut self) -> Result<Vec<u8>, BitstampError> {
        loop {
            let frame = match self.deadline.get() {
                Some(at) => {
                    tokio::select! {
                        frame = self.reader.read_frame() => frame?,
                        () = tokio::time::sleep_until(at) => return Err(BitstampError::DeadlineExceeded),
                    }
                }
                None => self.reader.read_frame().await?,
            };

            match frame {
                Frame::Text(text) => return Ok(text.into_bytes()),
                Frame::Binary(data) => return Ok(data),
                Frame::Pong(payload) => {
                    if let Some(handler) = self.pong_handler.as_mut() {
                        handler(&payload);
                    }
                }
                Frame::Ping(_) => {}
                Frame::Close => {
                    return Err(BitstampError::ConnectionClosed {
                        reason: "close frame received".to_string(),
                    });
                }
            }
        }
    }
}

fn frame_from_message(message: WsMessage) -> Option<Frame> {
    match message {
        WsMessage::Text(text) => Some(Frame::Text(text.as_str().to_owned())),
        WsMessage::Binary(data) => Some(Frame::Binary(data.to_vec())),
        WsMessage::Ping(data) => Some(Frame::Ping(data.to_vec())),
        WsMessage::Pong(data) => Some(Frame::Pong(data.to_vec())),
        WsMessage::Close(_) => Some(Frame::Close),
        // Raw frames only show up when writing.
        WsMessage::Frame(_) => None,
    }
}

fn message_from_frame(frame: Frame) -> WsMessage {
    match frame {
        Frame::Text(text) => WsMessage::Text(text.into()),
        Frame::Binary(data) => WsMessage::Binary(data.into()),
        Frame::Ping(data) => WsMessage::Ping(data.into()),
        Frame::Pong(data) => WsMessage::Pong(data.into()),
        Frame::Close => WsMessage::Close(None),
    }
}

impl<S> FrameReader for SplitStream<WebSocketStream<S>>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn read_frame(&mut self) -> Result<Frame, BitstampError> {
        loop {
            match self.next().await {
                Some(Ok(message)) => {
                    if let Some(frame) = frame_from_message(message) {
                        return Ok(frame);
                    }
                }
                Some(Err(e)) => return Err(BitstampError::WebSocket(e)),
                None => {
                    return Err(BitstampError::ConnectionClosed {
                        reason: "stream ended".to_string(),
                    });
                }
            }
        }
    }
}

impl<S> FrameWriter for SplitSink<WebSocketStream<S>, WsMessage>
where
    S: AsyncRead + AsyncWrite + Unpin + Send + 'static,
{
    async fn write_frame(&mut self, frame: Frame) -> Result<(), BitstampError> {
        self.send(message_from_frame(frame)).await?;
        Ok(())
    }

    async fn close(&mut self) -> Result<(), BitstampError> {
        SinkExt::close(self).await?;
        Ok(())
    }
}
