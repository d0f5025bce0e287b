use std::sync::Arc;
use std::time::Duration;

use bitstamp_api_client::auth::EnvCredentials;
use bitstamp_api_client::rest::PrivateRestClient;
use bitstamp_api_client::ws::messages::{ChannelRequest, StreamEvent, channels, events};
use bitstamp_api_client::ws::{StreamConfig, WS_URL, WebSocketConnection};

fn live_tests_enabled() -> bool {
    std::env::var("BITSTAMP_LIVE_TESTS").ok().as_deref() == Some("1")
}

#[tokio::test]
#[ignore]
async fn live_private_rest_smoke() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    if !live_tests_enabled() {
        return Ok(());
    }

    let credentials = match EnvCredentials::try_from_env() {
        Some(creds) => creds,
        None => return Ok(()),
    };
    let client = PrivateRestClient::builder()
        .credentials(Arc::new(credentials))
        .build()?;

    let _balances = client.get_balances().await?;
    let _orders = client.get_open_orders().await?;
    let token = client.get_websocket_token().await?;
    assert!(!token.token.is_empty());

    Ok(())
}

#[tokio::test]
#[ignore]
async fn live_public_stream_smoke() -> Result<(), Box<dyn std::error::Error>> {
    let _ = dotenv::dotenv();
    if !live_tests_enabled() {
        return Ok(());
    }

    let mut conn = WebSocketConnection::connect(WS_URL, StreamConfig::default()).await?;
    let mut frames = conn.start(Duration::from_secs(30))?;

    let subscribe = ChannelRequest::subscribe(channels::order_book("btcusd"));
    conn.send(subscribe.to_json()?).await?;

    let frame = tokio::time::timeout(Duration::from_secs(10), frames.recv())
        .await?
        .ok_or("stream ended before subscription ack")?;
    let event = StreamEvent::parse(&frame)?;
    assert_eq!(event.event, events::SUBSCRIPTION_SUCCEEDED);

    conn.stop().await;
    Ok(())
}
