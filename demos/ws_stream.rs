//! Example: Public trades over a keepalive-managed WebSocket.
//!
//! Run with: cargo run --example ws_stream

use std::time::Duration;

use bitstamp_api_client::ws::messages::{ChannelRequest, StreamEvent, channels};
use bitstamp_api_client::ws::{StreamConfig, WS_URL, WebSocketConnection};
use futures_util::StreamExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let mut conn = WebSocketConnection::connect(WS_URL, StreamConfig::default()).await?;
    let mut frames = conn.start(Duration::from_secs(30))?;

    let subscribe = ChannelRequest::subscribe(channels::live_trades("btcusd"));
    conn.send(subscribe.to_json()?).await?;

    let mut seen = 0;
    while let Some(frame) = frames.next().await {
        let event = StreamEvent::parse(&frame)?;
        if event.is_reconnect_request() {
            println!("Server requested reconnect");
            break;
        }
        println!("{} {}: {}", event.event, event.channel, event.data);

        seen += 1;
        if seen >= 20 {
            break;
        }
    }

    let unsubscribe = ChannelRequest::unsubscribe(channels::live_trades("btcusd"));
    let _ = conn.send(unsubscribe.to_json()?).await;
    conn.stop().await;
    Ok(())
}
