//! Line Chat Server - Entry Point
//!
//! Binds the listener and runs the accept loop.

use std::env;

use tracing::info;
use tracing_subscriber::EnvFilter;

use line_chat::{ChatServer, NetworkConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging with environment filter
    // Use RUST_LOG env var to control log level
    // e.g., RUST_LOG=debug or RUST_LOG=line_chat=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_chat=info")),
        )
        .init();

    // Bind address from command line, else from the environment
    let addr = match env::args().nth(1) {
        Some(addr) => addr,
        None => NetworkConfig::from_env()?.addr(),
    };

    // Bind failure is fatal
    let server = ChatServer::bind(&addr).await?;
    info!("Line chat server listening on {}", server.local_addr()?);

    server.run().await;

    Ok(())
}
