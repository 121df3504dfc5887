//! Line-oriented TCP Chat Library
//!
//! A minimal chat backbone: a TCP server that relays newline-delimited
//! text between all connected peers, and a connection type that turns a
//! raw socket into an event-driven string channel.
//!
//! # Features
//! - CR+LF terminated UTF-8 lines, no other framing
//! - One receive task per connection reporting to a `ConnectionListener`
//! - Serialized sends and idempotent disconnect
//! - Broadcast of join, message and leave announcements to every live peer
//!
//! # Architecture
//! Uses the Actor pattern with `mpsc` channels:
//! - `BroadcastRegistry` is the actor owning the live set
//! - Each `Connection` runs a receive task that reports to the registry
//!   through a `RegistryHandle`
//! - No locks around the live set - all access goes through the actor
//!
//! # Example
//! ```ignore
//! use line_chat::ChatServer;
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = ChatServer::bind("127.0.0.1:8187").await.unwrap();
//!     server.run().await;
//! }
//! ```

pub mod client;
pub mod codec;
pub mod config;
pub mod connection;
pub mod error;
pub mod listener;
pub mod message;
pub mod registry;
pub mod server;
pub mod types;

#[cfg(test)]
pub(crate) mod testutil;

// Re-export main types for convenience
pub use client::ConsoleListener;
pub use codec::LineCodec;
pub use config::NetworkConfig;
pub use connection::Connection;
pub use error::{ConfigError, ConnectionError, ServerError};
pub use listener::ConnectionListener;
pub use message::Announcement;
pub use registry::{BroadcastRegistry, RegistryEvent, RegistryHandle};
pub use server::ChatServer;
pub use types::ConnectionId;
