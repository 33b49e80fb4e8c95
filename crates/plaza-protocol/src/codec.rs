//! Codec trait and the JSON implementation.
//!
//! The protocol is one JSON object per WebSocket text frame, so the codec
//! works in `String`s rather than byte buffers. Everything above the
//! transport goes through the [`Codec`] trait, which keeps the door open
//! for a compact binary framing later without touching the handler.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Encodes outbound messages to frames and decodes inbound frames.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into one wire frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Encode`] if serialization fails.
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError>;

    /// Deserializes one wire frame.
    ///
    /// # Errors
    /// Returns [`ProtocolError::Decode`] if the frame is malformed or does
    /// not match the expected message shape.
    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError>;
}

/// A [`Codec`] backed by `serde_json`.
///
/// Human-readable, trivially inspectable in browser DevTools, and what the
/// reference client already speaks. Behind the `json` feature flag
/// (enabled by default).
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<String, ProtocolError> {
        serde_json::to_string(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, frame: &str) -> Result<T, ProtocolError> {
        serde_json::from_str(frame).map_err(ProtocolError::Decode)
    }
}
