//! Unified error type for the Plaza server crate.

use plaza_protocol::ProtocolError;
use plaza_session::SessionError;
use plaza_transport::TransportError;

/// Top-level error that wraps the layer-specific errors.
///
/// Connection handlers bubble this up to the accept loop, which logs it
/// and moves on; no error here ever takes the server down.
#[derive(Debug, thiserror::Error)]
pub enum PlazaError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session-level error (auth, unknown space, duplicate occupancy).
    #[error(transparent)]
    Session(#[from] SessionError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_transport_error() {
        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "gone");
        let err: PlazaError = TransportError::SendFailed(io).into();
        assert!(matches!(err, PlazaError::Transport(_)));
        assert!(err.to_string().contains("send failed"));
    }

    #[test]
    fn test_from_session_error() {
        let err: PlazaError = SessionError::AuthFailed("nope".into()).into();
        assert!(matches!(err, PlazaError::Session(_)));
        assert!(err.to_string().contains("nope"));
    }
}
