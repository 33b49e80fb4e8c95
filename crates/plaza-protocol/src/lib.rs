//! Wire protocol for Plaza.
//!
//! This crate defines the language clients and the server speak:
//!
//! - **Types** ([`ClientMessage`], [`ServerMessage`], the id newtypes,
//!   [`Position`], [`Bounds`]) — the structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages map
//!   to WebSocket text frames.
//! - **Errors** ([`ProtocolError`]) — what can go wrong in between.
//!
//! The protocol layer knows nothing about connections, rooms, or identity
//! verification; it only shapes and parses frames.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{
    Bounds, ClientMessage, OccupantInfo, Position, ServerMessage, SessionId,
    SpaceId, UserId,
};
