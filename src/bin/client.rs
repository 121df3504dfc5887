//! Line Chat Client - Entry Point
//!
//! Dials the configured server, prints everything it receives and sends
//! each stdin line prefixed with the nickname given as first argument.

use std::env;
use std::io;
use std::sync::Arc;

use futures_util::StreamExt;
use tokio_util::codec::{FramedRead, LinesCodec};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use line_chat::client::{format_outgoing, ConsoleListener, DEFAULT_NICKNAME};
use line_chat::{Connection, NetworkConfig};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Logs go to stderr so they do not mix with chat output
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("line_chat=warn")),
        )
        .with_writer(io::stderr)
        .init();

    let nickname = env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_NICKNAME.to_string());
    let config = NetworkConfig::from_env()?;

    let console = Arc::new(ConsoleListener::new(io::stdout()));
    let connection = match Connection::connect(console.clone(), &config.addr()).await {
        Ok(connection) => connection,
        Err(e) => {
            console.print(&format!("Connection error: {e}"));
            return Ok(());
        }
    };

    let mut input = FramedRead::new(tokio::io::stdin(), LinesCodec::new());
    while let Some(line) = input.next().await {
        let line = line?;
        if let Some(outgoing) = format_outgoing(&nickname, &line) {
            connection.send(&outgoing).await;
        }
        if connection.is_closed() {
            break;
        }
    }

    debug!("Input closed, disconnecting");
    connection.disconnect().await;

    Ok(())
}
