//! The menu publisher's backend web server.

use axum::handler::HandlerWithoutStateExt;
use menu_publisher::publisher;
use tokio::net::TcpListener;

/// # Errors
///
/// See implementation.
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let address = dotenvy::var("ADDRESS")?;

    println!("Listening to {address}...");

    let listener = TcpListener::bind(address).await?;

    println!("Ready!");

    axum::serve(listener, publisher::handler.into_make_service()).await?;

    Ok(())
}
