//! Shared helpers for unit tests

use std::sync::Arc;
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;

use crate::connection::Connection;
use crate::error::ConnectionError;
use crate::listener::ConnectionListener;

/// Event observed by a `RecordingListener`
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Recorded {
    Ready,
    Received(String),
    Disconnected,
    /// Debug rendering of the error, e.g. `Receive(...)`
    Exception(String),
}

/// Listener that forwards every callback into a channel
pub(crate) struct RecordingListener {
    events: mpsc::UnboundedSender<Recorded>,
}

impl RecordingListener {
    pub(crate) fn new() -> (Arc<Self>, mpsc::UnboundedReceiver<Recorded>) {
        let (events, rx) = mpsc::unbounded_channel();
        (Arc::new(Self { events }), rx)
    }
}

impl ConnectionListener for RecordingListener {
    fn on_connection_ready(&self, _connection: &Connection) {
        let _ = self.events.send(Recorded::Ready);
    }

    fn on_receive_string(&self, _connection: &Connection, value: String) {
        let _ = self.events.send(Recorded::Received(value));
    }

    fn on_disconnect(&self, _connection: &Connection) {
        let _ = self.events.send(Recorded::Disconnected);
    }

    fn on_exception(&self, _connection: &Connection, error: ConnectionError) {
        let _ = self.events.send(Recorded::Exception(format!("{error:?}")));
    }
}

/// Wait for the next recorded event, failing the test after two seconds
pub(crate) async fn next_event(rx: &mut mpsc::UnboundedReceiver<Recorded>) -> Recorded {
    tokio::time::timeout(Duration::from_secs(2), rx.recv())
        .await
        .expect("timed out waiting for event")
        .expect("event channel closed")
}

/// Connected loopback pair: (accepted side, dialing side)
pub(crate) async fn tcp_pair() -> (TcpStream, TcpStream) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let (client, accepted) = tokio::join!(TcpStream::connect(addr), listener.accept());
    (accepted.unwrap().0, client.unwrap())
}

/// Close `stream` with an RST instead of a FIN and give the kernel time to
/// deliver it
///
/// Blocks the thread on purpose: on the current-thread test runtime no
/// other task runs before the caller's next await, so the reset is seen by
/// the caller's own I/O first.
pub(crate) fn reset(stream: TcpStream) {
    #[allow(deprecated)]
    stream.set_linger(Some(Duration::ZERO)).unwrap();
    drop(stream);
    std::thread::sleep(Duration::from_millis(20));
}
