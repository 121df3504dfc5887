//! Line-oriented TCP connection
//!
//! Wraps one accepted or dialed `TcpStream`, runs a dedicated receive task
//! that turns incoming lines into listener events, and exposes `send` and
//! `disconnect` for use from any task.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::io::AsyncWriteExt;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::codec::{FramedRead, FramedWrite};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::codec::LineCodec;
use crate::error::ConnectionError;
use crate::listener::ConnectionListener;
use crate::types::ConnectionId;

/// Handle to a live TCP connection
///
/// Cheap to clone; all clones refer to the same transport endpoint and
/// compare equal. Equality and hashing use the `ConnectionId` only.
#[derive(Clone)]
pub struct Connection {
    inner: Arc<Inner>,
}

struct Inner {
    id: ConnectionId,
    peer_addr: SocketAddr,
    /// Outbound half; the lock serializes `send` and `disconnect`
    writer: Mutex<FramedWrite<OwnedWriteHalf, LineCodec>>,
    /// Set once the write half has been shut down
    closed: AtomicBool,
    /// Stops the receive task
    cancel: CancellationToken,
    listener: Arc<dyn ConnectionListener>,
}

impl Connection {
    /// Wrap an already established stream and start its receive task
    ///
    /// Must be called from within a tokio runtime.
    pub fn from_stream(
        listener: Arc<dyn ConnectionListener>,
        stream: TcpStream,
    ) -> Result<Self, ConnectionError> {
        let peer_addr = stream.peer_addr().map_err(ConnectionError::Wrap)?;
        let (read_half, write_half) = stream.into_split();

        let connection = Self {
            inner: Arc::new(Inner {
                id: ConnectionId::new(),
                peer_addr,
                writer: Mutex::new(FramedWrite::new(write_half, LineCodec::new())),
                closed: AtomicBool::new(false),
                cancel: CancellationToken::new(),
                listener,
            }),
        };

        debug!("Connection {} established with {}", connection.id(), peer_addr);

        let reader = FramedRead::new(read_half, LineCodec::new());
        tokio::spawn(connection.clone().receive_loop(reader));

        Ok(connection)
    }

    /// Dial `addr` and wrap the resulting stream
    ///
    /// On failure no task is started and the listener is never invoked.
    pub async fn connect(
        listener: Arc<dyn ConnectionListener>,
        addr: &str,
    ) -> Result<Self, ConnectionError> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|source| ConnectionError::Dial {
                addr: addr.to_string(),
                source,
            })?;
        Self::from_stream(listener, stream)
    }

    /// Identity of this connection
    pub fn id(&self) -> ConnectionId {
        self.inner.id
    }

    /// Remote address and port
    pub fn peer_addr(&self) -> SocketAddr {
        self.inner.peer_addr
    }

    /// Whether the transport has been closed
    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Send one line, appending the CR+LF terminator
    ///
    /// Concurrent sends on the same connection never interleave. A write
    /// failure is reported through `on_exception` and disconnects this
    /// connection. Sending on a closed connection does nothing.
    pub async fn send(&self, text: &str) {
        let mut writer = self.inner.writer.lock().await;
        if self.is_closed() {
            debug!("Dropping line for closed connection {}", self);
            return;
        }

        let result = writer.send(text.to_owned()).await;
        if let Err(e) = result {
            warn!("Send to {} failed: {}", self, e);
            // Reported under the guard so it precedes the final `on_disconnect`
            self.inner
                .listener
                .on_exception(self, ConnectionError::Send(e));
            drop(writer);
            self.disconnect().await;
        }
    }

    /// Stop the receive task and close the transport
    ///
    /// Safe to call repeatedly and from several tasks; only the first call
    /// closes. A close failure is reported through `on_exception`.
    pub async fn disconnect(&self) {
        self.inner.cancel.cancel();

        let mut writer = self.inner.writer.lock().await;
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }

        let result = writer.get_mut().shutdown().await;
        debug!("Connection {} closed", self);

        if let Err(e) = result {
            self.inner
                .listener
                .on_exception(self, ConnectionError::Close(e));
        }
    }

    /// Receive task: the sole producer of this connection's events
    async fn receive_loop(self, mut reader: FramedRead<OwnedReadHalf, LineCodec>) {
        let listener = Arc::clone(&self.inner.listener);
        listener.on_connection_ready(&self);

        loop {
            let next = tokio::select! {
                biased;
                () = self.inner.cancel.cancelled() => {
                    debug!("Receive loop for {} cancelled", self);
                    break;
                }
                next = reader.next() => next,
            };

            match next {
                Some(Ok(line)) => listener.on_receive_string(&self, line),
                Some(Err(e)) => {
                    warn!("Receive from {} failed: {}", self, e);
                    listener.on_exception(&self, ConnectionError::Receive(e));
                    break;
                }
                None => {
                    debug!("End of stream from {}", self);
                    break;
                }
            }
        }

        // Release the transport on every exit path before the final event
        drop(reader);
        self.disconnect().await;
        listener.on_disconnect(&self);
    }
}

impl PartialEq for Connection {
    fn eq(&self, other: &Self) -> bool {
        self.inner.id == other.inner.id
    }
}

impl Eq for Connection {}

impl Hash for Connection {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.inner.id.hash(state);
    }
}

impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.inner.peer_addr)
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.inner.id)
            .field("peer_addr", &self.inner.peer_addr)
            .field("closed", &self.is_closed())
            .finish()
    }
}
