//! WebSocket transport implementation using `tokio-tungstenite`.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::sync::Mutex;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, Transport, TransportError};

type WsStream = tokio_tungstenite::WebSocketStream<tokio::net::TcpStream>;

/// A WebSocket-based [`Transport`] that listens for incoming connections.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds a new WebSocket transport to the given address.
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(TransportError::AcceptFailed)?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }

    /// Returns the local address the listener is bound to. Needed when
    /// binding to port 0 (tests).
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Error = TransportError;

    async fn accept(&mut self) -> Result<Self::Connection, Self::Error> {
        let (stream, peer) = self
            .listener
            .accept()
            .await
            .map_err(TransportError::AcceptFailed)?;

        let ws = tokio_tungstenite::accept_async(stream).await.map_err(|e| {
            TransportError::AcceptFailed(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                e,
            ))
        })?;

        tracing::debug!(%peer, "accepted WebSocket connection");

        Ok(WebSocketConnection {
            peer,
            ws: Arc::new(Mutex::new(ws)),
        })
    }
}

/// A single WebSocket connection carrying one JSON object per text frame.
pub struct WebSocketConnection {
    peer: SocketAddr,
    ws: Arc<Mutex<WsStream>>,
}

impl WebSocketConnection {
    /// The remote peer's address, for logging.
    pub fn peer(&self) -> SocketAddr {
        self.peer
    }
}

impl Connection for WebSocketConnection {
    type Error = TransportError;

    async fn send(&self, frame: &str) -> Result<(), Self::Error> {
        use futures_util::SinkExt;
        let msg = Message::Text(frame.to_owned().into());
        self.ws.lock().await.send(msg).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }

    async fn recv(&self) -> Result<Option<String>, Self::Error> {
        use futures_util::StreamExt;
        loop {
            let msg = self.ws.lock().await.next().await;
            match msg {
                Some(Ok(Message::Text(text))) => {
                    return Ok(Some(text.as_str().to_owned()));
                }
                // Tolerate clients that send the JSON in binary frames,
                // as long as it is valid UTF-8.
                Some(Ok(Message::Binary(data))) => {
                    match String::from_utf8(data.into()) {
                        Ok(text) => return Ok(Some(text)),
                        Err(_) => {
                            tracing::debug!(peer = %self.peer, "non-UTF-8 binary frame skipped");
                            continue;
                        }
                    }
                }
                Some(Ok(Message::Close(_))) | None => return Ok(None),
                Some(Ok(_)) => continue, // ping/pong/raw frame
                Some(Err(e)) => {
                    return Err(TransportError::ReceiveFailed(std::io::Error::new(
                        std::io::ErrorKind::ConnectionReset,
                        e,
                    )));
                }
            }
        }
    }

    async fn close(&self) -> Result<(), Self::Error> {
        self.ws.lock().await.close(None).await.map_err(|e| {
            TransportError::SendFailed(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                e,
            ))
        })
    }
}
