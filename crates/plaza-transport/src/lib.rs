//! Transport abstraction layer for Plaza.
//!
//! The wire protocol is one JSON object per frame, so the traits here
//! speak in text frames rather than byte buffers. [`Transport`] accepts
//! connections; [`Connection`] sends and receives frames on one of them.
//!
//! # Feature Flags
//!
//! - `websocket` (default) — WebSocket transport via `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

/// Accepts new incoming connections.
pub trait Transport: Send + Sync + 'static {
    /// The connection type produced by this transport.
    type Connection: Connection;
    /// The error type for transport operations.
    type Error: std::error::Error + Send + Sync;

    /// Waits for and accepts the next incoming connection.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// A single connection carrying text frames in both directions.
pub trait Connection: Send + Sync + 'static {
    /// The error type for connection operations.
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame to the remote peer. Frames to a given connection
    /// are delivered in the order they are sent.
    async fn send(&self, frame: &str) -> Result<(), Self::Error>;

    /// Receives the next frame from the remote peer.
    ///
    /// Returns `Ok(None)` when the connection is closed — cleanly or not,
    /// the caller's reaction is the same: tear the session down.
    async fn recv(&self) -> Result<Option<String>, Self::Error>;

    /// Closes the connection.
    async fn close(&self) -> Result<(), Self::Error>;
}
