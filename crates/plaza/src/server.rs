//! `PlazaServer` builder and accept loop.
//!
//! This is the thin glue at the edge of the system: bind, accept, spawn a
//! handler task per connection. The interesting state machine lives in
//! [`handler`](crate::handler); the collaborators (verifier, directory,
//! spawn policy) are injected here and shared by every handler.

use std::sync::Arc;
use std::time::Duration;

use plaza_protocol::JsonCodec;
use plaza_room::RoomRegistry;
use plaza_session::{SpaceDirectory, SpawnPolicy, TokenVerifier};
use plaza_transport::{Transport, WebSocketTransport};

use crate::PlazaError;
use crate::handler::handle_connection;

/// Server-wide tunables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Deadline for each of the two external calls made during `join`
    /// (token verification, space lookup). A verifier that doesn't answer
    /// in time costs the client its connection, not the server a task.
    pub join_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            join_timeout: Duration::from_secs(5),
        }
    }
}

/// Shared server state passed to each connection handler task.
pub(crate) struct ServerState<V, D, P> {
    pub(crate) registry: RoomRegistry,
    pub(crate) verifier: V,
    pub(crate) directory: D,
    pub(crate) spawn: P,
    pub(crate) codec: JsonCodec,
    pub(crate) config: ServerConfig,
}

/// Builder for configuring and starting a Plaza server.
///
/// # Example
///
/// ```rust,ignore
/// let server = PlazaServer::builder()
///     .bind("0.0.0.0:8080")
///     .build(my_verifier, my_directory, RandomSpawn)
///     .await?;
/// server.run().await
/// ```
pub struct PlazaServerBuilder {
    bind_addr: String,
    config: ServerConfig,
}

impl PlazaServerBuilder {
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            config: ServerConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the server configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Builds the server with the injected collaborators: identity
    /// verifier, space directory, and spawn policy.
    ///
    /// The room registry is constructed here and owned by the server —
    /// there is no process-global state, so two servers in one process
    /// (as in tests) never observe each other.
    pub async fn build<V, D, P>(
        self,
        verifier: V,
        directory: D,
        spawn: P,
    ) -> Result<PlazaServer<V, D, P>, PlazaError>
    where
        V: TokenVerifier,
        D: SpaceDirectory,
        P: SpawnPolicy,
    {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: RoomRegistry::new(),
            verifier,
            directory,
            spawn,
            codec: JsonCodec,
            config: self.config,
        });

        Ok(PlazaServer { transport, state })
    }
}

impl Default for PlazaServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Plaza presence server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct PlazaServer<V, D, P> {
    transport: WebSocketTransport,
    state: Arc<ServerState<V, D, P>>,
}

impl<V, D, P> PlazaServer<V, D, P>
where
    V: TokenVerifier,
    D: SpaceDirectory,
    P: SpawnPolicy,
{
    /// Creates a new builder.
    pub fn builder() -> PlazaServerBuilder {
        PlazaServerBuilder::new()
    }

    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the server accept loop.
    ///
    /// Accepts incoming connections and spawns a handler task for each.
    /// Runs until the process is terminated.
    pub async fn run(mut self) -> Result<(), PlazaError> {
        tracing::info!("Plaza server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
