//! Console chat client
//!
//! Renders connection events as plain text lines and formats outgoing
//! messages with the user's nickname.

use std::io::Write;
use std::sync::{Mutex, PoisonError};

use tracing::warn;

use crate::connection::Connection;
use crate::error::ConnectionError;
use crate::listener::ConnectionListener;

/// Nickname used when none is given
pub const DEFAULT_NICKNAME: &str = "Anonymous";

/// Listener that writes every event as a line to `W`
///
/// Callbacks may arrive from the receive task and from the input task at
/// the same time, so the output is guarded by a mutex.
#[derive(Debug)]
pub struct ConsoleListener<W> {
    out: Mutex<W>,
}

impl<W: Write + Send + 'static> ConsoleListener<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    /// Write one line of output
    pub fn print(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
            warn!("Failed to write console output: {}", e);
        }
    }

    /// Consume the listener and return the writer
    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<W: Write + Send + 'static> ConnectionListener for ConsoleListener<W> {
    fn on_connection_ready(&self, _connection: &Connection) {
        self.print("Connection established...");
    }

    fn on_receive_string(&self, _connection: &Connection, value: String) {
        self.print(&value);
    }

    fn on_disconnect(&self, _connection: &Connection) {
        self.print("Connection lost...");
    }

    fn on_exception(&self, _connection: &Connection, error: ConnectionError) {
        self.print(&format!("Connection error: {error}"));
    }
}

/// Build the outgoing line for `input`, or `None` for empty input
pub fn format_outgoing(nickname: &str, input: &str) -> Option<String> {
    if input.is_empty() {
        return None;
    }
    Some(format!("{nickname}: {input}"))
}
