//! Example: Signed private REST calls.
//!
//! Run with: cargo run --example private_balance
//!
//! Reads BITSTAMP_API_KEY and BITSTAMP_API_SECRET from the environment.

use std::sync::Arc;

use bitstamp_api_client::auth::{
    Credentials, EnvCredentials, RandomNonce, SigningContext, sign_request,
};
use bitstamp_api_client::error::BitstampError;
use bitstamp_api_client::rest::PrivateRestClient;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Offline signature, handy for comparing against another client.
    let creds = Credentials::new("api_key", "api_secret");
    let context = SigningContext::new(
        "/api/v2/balance/",
        "",
        "f93c979d-b00d-43a9-9b9c-fd4cd9547fa6".parse()?,
        1_700_000_010_000,
        "",
    )?;
    let headers = sign_request(&creds, &context)?;
    for (name, value) in headers.iter() {
        println!("{name}: {value}");
    }

    let Some(credentials) = EnvCredentials::try_from_env() else {
        println!("Set BITSTAMP_API_KEY and BITSTAMP_API_SECRET to call the API.");
        return Ok(());
    };

    let client = PrivateRestClient::builder()
        .credentials(Arc::new(credentials))
        .nonce_provider(Arc::new(RandomNonce::new()))
        .build()?;

    match client.get_balances().await {
        Ok(balances) => {
            for currency in ["btc", "eth", "usd", "eur"] {
                println!(
                    "{currency}: total={:?} available={:?}",
                    balances.total(currency),
                    balances.available(currency)
                );
            }
        }
        Err(BitstampError::Api(err)) if err.is_auth_failure() => {
            println!("Authentication rejected: {err}");
            return Ok(());
        }
        Err(err) => return Err(err.into()),
    }

    let orders = client.get_open_orders().await?;
    println!("Open orders: {}", orders.len());

    Ok(())
}
