//! Connection listener contract
//!
//! The four callbacks through which a `Connection` reports lifecycle and
//! data events to its owner. Implemented by the server's registry handle
//! and by the console client.

use crate::connection::Connection;
use crate::error::ConnectionError;

/// Receiver of connection events
///
/// Callbacks are invoked from the connection's receive task (and, for
/// `on_exception`, from whichever task hit a send or close failure).
/// They must not block: implementations hand work off or record it.
///
/// For one connection the receive task emits `on_connection_ready` first,
/// then any number of `on_receive_string`, then at most one
/// `on_exception` for a read fault, and `on_disconnect` exactly once last.
pub trait ConnectionListener: Send + Sync + 'static {
    /// The connection is up and its receive loop is running
    fn on_connection_ready(&self, connection: &Connection);

    /// A full line was received (terminator stripped, may be empty)
    fn on_receive_string(&self, connection: &Connection, value: String);

    /// The receive loop has ended; final event for this connection
    fn on_disconnect(&self, connection: &Connection);

    /// A receive, send or close operation failed
    fn on_exception(&self, connection: &Connection, error: ConnectionError);
}
