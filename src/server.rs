//! TCP chat server
//!
//! Binds the listening socket, starts the broadcast registry and wraps
//! every accepted stream into a `Connection` reporting to the registry.

use std::net::SocketAddr;

use tokio::net::TcpListener;
use tracing::{debug, error, info};

use crate::connection::Connection;
use crate::error::ServerError;
use crate::registry::{BroadcastRegistry, RegistryHandle};

/// A bound chat server, ready to accept connections
pub struct ChatServer {
    listener: TcpListener,
    registry: RegistryHandle,
}

impl ChatServer {
    /// Bind `addr` and start the registry actor
    ///
    /// A bind failure is fatal for the server.
    pub async fn bind(addr: &str) -> Result<Self, ServerError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| ServerError::Bind {
                addr: addr.to_string(),
                source,
            })?;

        let registry = BroadcastRegistry::spawn();

        Ok(Self { listener, registry })
    }

    /// Address the server is actually listening on
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Handle to the registry, for inspecting the live set
    pub fn registry(&self) -> RegistryHandle {
        self.registry.clone()
    }

    /// Accept connections forever
    ///
    /// Accept failures and connection setup failures are logged and the
    /// loop carries on.
    pub async fn run(self) {
        info!("Chat server accepting connections");

        loop {
            match self.accept_one().await {
                Ok(connection) => debug!("Accepted connection {}", connection),
                Err(e) => error!("{}", e),
            }
        }
    }

    async fn accept_one(&self) -> Result<Connection, ServerError> {
        let (stream, addr) = self.listener.accept().await.map_err(ServerError::Accept)?;
        info!("New connection from {}", addr);
        Ok(Connection::from_stream(self.registry.listener(), stream)?)
    }
}
