//! Error types for the chat server
//!
//! Defines per-connection errors, server startup/accept errors and
//! configuration errors. Uses thiserror for ergonomic error definitions.

use std::io;
use std::num::ParseIntError;

use thiserror::Error;

/// Per-connection errors
///
/// All of these stay contained to the connection that raised them and are
/// surfaced through the listener's `on_exception` callback, except `Dial`
/// and `Wrap` which fail construction before any task exists.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Dialing the remote endpoint failed (no receive task started)
    #[error("Failed to connect to {addr}: {source}")]
    Dial {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// The accepted or dialed stream could not be wrapped
    #[error("Failed to set up connection stream: {0}")]
    Wrap(#[source] io::Error),

    /// Reading the next line failed (terminates the receive loop)
    #[error("Receive failed: {0}")]
    Receive(#[source] io::Error),

    /// Writing a line failed (triggers disconnect of this connection)
    #[error("Send failed: {0}")]
    Send(#[source] io::Error),

    /// Closing the transport failed (swallowed after being reported)
    #[error("Close failed: {0}")]
    Close(#[source] io::Error),
}

/// Server-level errors
#[derive(Debug, Error)]
pub enum ServerError {
    /// Binding the listening socket failed (fatal)
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: io::Error,
    },

    /// Accepting an inbound connection failed (logged, accept loop continues)
    #[error("Failed to accept connection: {0}")]
    Accept(#[source] io::Error),

    /// An accepted stream could not be wrapped (logged, accept loop continues)
    #[error("Failed to set up accepted connection: {0}")]
    Setup(#[from] ConnectionError),
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Port value is not a valid u16
    #[error("Invalid port '{value}': {source}")]
    InvalidPort {
        value: String,
        #[source]
        source: ParseIntError,
    },
}
