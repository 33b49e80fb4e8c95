//! Error types for the protocol layer.

/// Errors that can occur while encoding or decoding wire frames.
#[derive(Debug, thiserror::Error)]
pub enum ProtocolError {
    /// Serialization of an outbound message failed.
    #[cfg(feature = "json")]
    #[error("encode failed: {0}")]
    Encode(serde_json::Error),

    /// An inbound frame was malformed or did not match any known message.
    ///
    /// Decode failures are never fatal for a connection — the handler logs
    /// them and ignores the frame.
    #[cfg(feature = "json")]
    #[error("decode failed: {0}")]
    Decode(serde_json::Error),
}
