//! Broadcast registry actor
//!
//! The central actor that owns the live set of connections and fans every
//! announcement out to it. Connections report events through a
//! `RegistryHandle`, which only enqueues; all state changes and broadcasts
//! happen on the actor task, one event at a time.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::connection::Connection;
use crate::error::ConnectionError;
use crate::listener::ConnectionListener;
use crate::message::Announcement;
use crate::types::ConnectionId;

/// Events sent from connections (and diagnostics) to the registry actor
#[derive(Debug)]
pub enum RegistryEvent {
    /// Connection finished setup and its receive loop is running
    Ready { connection: Connection },
    /// A line arrived on a connection
    Received {
        connection: Connection,
        value: String,
    },
    /// Connection's receive loop ended
    Disconnected { connection: Connection },
    /// A connection operation failed
    Exception {
        connection: Connection,
        error: ConnectionError,
    },
    /// Request a snapshot of the live set
    Snapshot {
        reply: oneshot::Sender<Vec<Connection>>,
    },
}

/// Cloneable front door to the registry actor
///
/// Implements `ConnectionListener` by forwarding each callback as a
/// `RegistryEvent`, so callbacks never block the receive tasks.
#[derive(Debug, Clone)]
pub struct RegistryHandle {
    sender: mpsc::UnboundedSender<RegistryEvent>,
}

impl RegistryHandle {
    fn post(&self, event: RegistryEvent) {
        if self.sender.send(event).is_err() {
            warn!("Registry stopped, dropping event");
        }
    }

    /// This handle as a listener for new connections
    pub fn listener(&self) -> Arc<dyn ConnectionListener> {
        Arc::new(self.clone())
    }

    /// Snapshot of the live set, ordered consistently with all events
    /// processed so far
    ///
    /// Returns an empty list if the registry has stopped.
    pub async fn live_connections(&self) -> Vec<Connection> {
        let (reply, rx) = oneshot::channel();
        self.post(RegistryEvent::Snapshot { reply });
        rx.await.unwrap_or_default()
    }
}

impl ConnectionListener for RegistryHandle {
    fn on_connection_ready(&self, connection: &Connection) {
        self.post(RegistryEvent::Ready {
            connection: connection.clone(),
        });
    }

    fn on_receive_string(&self, connection: &Connection, value: String) {
        self.post(RegistryEvent::Received {
            connection: connection.clone(),
            value,
        });
    }

    fn on_disconnect(&self, connection: &Connection) {
        self.post(RegistryEvent::Disconnected {
            connection: connection.clone(),
        });
    }

    fn on_exception(&self, connection: &Connection, error: ConnectionError) {
        self.post(RegistryEvent::Exception {
            connection: connection.clone(),
            error,
        });
    }
}

/// The broadcast registry actor
///
/// Owns the live set. Membership is keyed by `ConnectionId`, so a
/// connection appears at most once.
pub struct BroadcastRegistry {
    /// Live connections: ConnectionId -> Connection
    live: HashMap<ConnectionId, Connection>,
    /// Event receiver channel
    receiver: mpsc::UnboundedReceiver<RegistryEvent>,
}

impl BroadcastRegistry {
    /// Create a new registry with the given event receiver
    fn new(receiver: mpsc::UnboundedReceiver<RegistryEvent>) -> Self {
        Self {
            live: HashMap::new(),
            receiver,
        }
    }

    /// Create a registry, spawn its event loop and return the handle
    ///
    /// Must be called from within a tokio runtime.
    pub fn spawn() -> RegistryHandle {
        let (sender, receiver) = mpsc::unbounded_channel();
        tokio::spawn(Self::new(receiver).run());
        RegistryHandle { sender }
    }

    /// Run the registry event loop
    ///
    /// Processes events one at a time until every handle is dropped.
    async fn run(mut self) {
        info!("Broadcast registry started");

        while let Some(event) = self.receiver.recv().await {
            self.handle_event(event).await;
        }

        info!("Broadcast registry shutting down");
    }

    /// Process a single event
    async fn handle_event(&mut self, event: RegistryEvent) {
        match event {
            RegistryEvent::Ready { connection } => {
                self.handle_ready(connection).await;
            }
            RegistryEvent::Received { connection, value } => {
                self.handle_received(connection, value).await;
            }
            RegistryEvent::Disconnected { connection } => {
                self.handle_disconnected(connection).await;
            }
            RegistryEvent::Exception { connection, error } => {
                self.handle_exception(connection, error);
            }
            RegistryEvent::Snapshot { reply } => {
                let _ = reply.send(self.live.values().cloned().collect());
            }
        }
    }

    /// Add the connection, then announce it to everyone including itself
    async fn handle_ready(&mut self, connection: Connection) {
        let announcement = Announcement::joined(&connection);
        self.live.insert(connection.id(), connection);
        debug!("Live connections: {}", self.live.len());
        self.broadcast(&announcement).await;
    }

    async fn handle_received(&mut self, connection: Connection, value: String) {
        self.broadcast(&Announcement::said(&connection, value)).await;
    }

    /// Remove the connection (if still present) and tell the rest
    async fn handle_disconnected(&mut self, connection: Connection) {
        if self.live.remove(&connection.id()).is_none() {
            debug!("Connection {} was already removed", connection);
        }
        debug!("Live connections: {}", self.live.len());
        self.broadcast(&Announcement::left(&connection)).await;
    }

    fn handle_exception(&mut self, connection: Connection, error: ConnectionError) {
        warn!("Connection {} error: {}", connection, error);
        self.live.remove(&connection.id());
    }

    /// Send one line to every member of the live set
    ///
    /// Each member handles its own send failure; the loop always reaches
    /// every member.
    async fn broadcast(&self, announcement: &Announcement) {
        let line = announcement.to_string();
        info!("{}", line);

        for connection in self.live.values() {
            connection.send(&line).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use futures_util::StreamExt;
    use tokio::net::TcpStream;
    use tokio_util::codec::{FramedRead, LinesCodec};

    use super::*;
    use crate::testutil::{reset, tcp_pair};

    type Peer = FramedRead<TcpStream, LinesCodec>;

    /// Register a fresh loopback connection with the registry
    async fn join(handle: &RegistryHandle) -> (Connection, Peer) {
        let (server_side, client) = tcp_pair().await;
        let conn = Connection::from_stream(handle.listener(), server_side).unwrap();
        (conn, FramedRead::new(client, LinesCodec::new()))
    }

    async fn next_line(peer: &mut Peer) -> String {
        tokio::time::timeout(Duration::from_secs(2), peer.next())
            .await
            .expect("timed out waiting for line")
            .expect("stream ended")
            .expect("read failed")
    }

    #[tokio::test]
    async fn test_ready_adds_and_announces_to_self() {
        let handle = BroadcastRegistry::spawn();
        let (conn, mut peer) = join(&handle).await;

        assert_eq!(next_line(&mut peer).await, format!("peer joined: {conn}"));
        assert_eq!(handle.live_connections().await, vec![conn]);
    }

    #[tokio::test]
    async fn test_received_line_reaches_every_member() {
        let handle = BroadcastRegistry::spawn();
        let (a, mut peer_a) = join(&handle).await;
        next_line(&mut peer_a).await;
        let (b, mut peer_b) = join(&handle).await;
        next_line(&mut peer_a).await;
        next_line(&mut peer_b).await;

        handle.on_receive_string(&a, "hello".to_string());

        let expected = format!("{a} says: hello");
        assert_eq!(next_line(&mut peer_a).await, expected);
        assert_eq!(next_line(&mut peer_b).await, expected);

        let live = handle.live_connections().await;
        assert_eq!(live.len(), 2);
        assert!(live.contains(&a) && live.contains(&b));
    }

    #[tokio::test]
    async fn test_disconnect_removes_and_announces_once() {
        let handle = BroadcastRegistry::spawn();
        let (a, mut peer_a) = join(&handle).await;
        next_line(&mut peer_a).await;
        let (b, mut peer_b) = join(&handle).await;
        next_line(&mut peer_a).await;
        next_line(&mut peer_b).await;

        b.disconnect().await;
        b.disconnect().await;

        assert_eq!(next_line(&mut peer_a).await, format!("peer left: {b}"));
        assert_eq!(handle.live_connections().await, vec![a.clone()]);

        // No second "peer left"
        a.send("marker").await;
        assert_eq!(next_line(&mut peer_a).await, "marker");
    }

    #[tokio::test]
    async fn test_broadcast_survives_reset_member() {
        let handle = BroadcastRegistry::spawn();
        let (a, mut peer_a) = join(&handle).await;
        next_line(&mut peer_a).await;
        let (b, mut peer_b) = join(&handle).await;
        next_line(&mut peer_a).await;
        next_line(&mut peer_b).await;

        reset(peer_b.into_inner());
        handle.on_receive_string(&a, "after reset".to_string());

        // The line and the departure may arrive in either order
        let mut lines = vec![next_line(&mut peer_a).await, next_line(&mut peer_a).await];
        lines.sort();
        let mut expected = vec![format!("{a} says: after reset"), format!("peer left: {b}")];
        expected.sort();
        assert_eq!(lines, expected);

        assert!(b.is_closed());
        assert_eq!(handle.live_connections().await, vec![a]);
    }

    #[tokio::test]
    async fn test_exception_removes_without_broadcast() {
        let handle = BroadcastRegistry::spawn();
        let (a, mut peer_a) = join(&handle).await;
        next_line(&mut peer_a).await;
        let (b, mut peer_b) = join(&handle).await;
        next_line(&mut peer_a).await;
        next_line(&mut peer_b).await;

        handle.on_exception(
            &b,
            ConnectionError::Send(std::io::Error::other("simulated")),
        );
        assert_eq!(handle.live_connections().await, vec![a.clone()]);

        // Removed member no longer receives broadcasts
        handle.on_receive_string(&a, "after".to_string());
        assert_eq!(next_line(&mut peer_a).await, format!("{a} says: after"));
        assert!(
            tokio::time::timeout(Duration::from_millis(100), peer_b.next())
                .await
                .is_err()
        );
    }

    #[tokio::test]
    async fn test_duplicate_disconnect_event_is_tolerated() {
        let handle = BroadcastRegistry::spawn();
        let (a, mut peer_a) = join(&handle).await;
        next_line(&mut peer_a).await;

        let (ghost_side, _ghost_client) = tcp_pair().await;
        let (recorder, _events) = crate::testutil::RecordingListener::new();
        let ghost = Connection::from_stream(recorder, ghost_side).unwrap();

        // Never registered, so removal is a no-op
        handle.on_disconnect(&ghost);
        assert_eq!(next_line(&mut peer_a).await, format!("peer left: {ghost}"));
        assert_eq!(handle.live_connections().await, vec![a]);
    }
}
