//! Ping/pong keepalive.
//!
//! The keepalive task writes a ping every `ping_interval`. Pongs are seen by
//! the reader, whose pong handler pushes the read deadline `pong_wait` into
//! the future. A silent peer therefore trips the deadline and the reader
//! tears the connection down.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{Instant, sleep_until};

use super::connection::Shared;
use super::observer::{ConnectionEvent, ConnectionObserver};
use super::transport::{Frame, FrameWriter, ReadDeadline};

/// Build the pong handler installed on the reader's socket.
///
/// Every pong extends the deadline, even one that is already further out. A
/// `pong_wait` too large to represent clears the deadline.
pub(crate) fn pong_handler(
    deadline: ReadDeadline,
    pong_wait: Duration,
    observer: Arc<dyn ConnectionObserver>,
) -> impl FnMut(&[u8]) + Send + 'static {
    move |_payload: &[u8]| {
        let at = deadline.extend_from_now(pong_wait);
        observer.on_event(&ConnectionEvent::PongReceived { deadline: at });
    }
}

/// Write pings until the connection is cancelled or a ping fails.
pub(crate) async fn run<W: FrameWriter>(shared: Arc<Shared<W>>, ping_interval: Duration) {
    loop {
        // An interval past the end of the clock never fires.
        let Some(next) = Instant::now().checked_add(ping_interval) else {
            shared.cancel.cancelled().await;
            break;
        };

        tokio::select! {
            biased;
            () = shared.cancel.cancelled() => break,
            () = sleep_until(next) => {}
        }

        match shared.write(Frame::Ping(Vec::new())).await {
            Ok(()) => shared.observe(ConnectionEvent::PingSent),
            // Interrupted by teardown, not a ping failure.
            Err(_) if shared.cancel.is_cancelled() => break,
            Err(e) => {
                shared.observe(ConnectionEvent::PingFailed { error: e.to_string() });
                shared.teardown().await;
                break;
            }
        }
    }
}
