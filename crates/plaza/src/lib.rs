//! # Plaza
//!
//! Server-authoritative presence synchronization for 2D grid spaces.
//!
//! Plaza keeps every connected client's view of a shared space consistent:
//! who is present, where they stand, and when they arrive, move, or leave.
//! Applications supply three policies — a [`TokenVerifier`] for identity,
//! a [`SpaceDirectory`] for space lookup, and a [`SpawnPolicy`] for entry
//! positions — and the server handles transport, sessions, and rooms.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use plaza::prelude::*;
//!
//! // Implement TokenVerifier and build a directory, then:
//! // let server = PlazaServer::builder()
//! //     .bind("0.0.0.0:8080")
//! //     .build(verifier, directory, RandomSpawn)
//! //     .await?;
//! // server.run().await
//! ```

mod error;
mod handler;
mod server;

pub use error::PlazaError;
pub use server::{PlazaServer, PlazaServerBuilder, ServerConfig};

/// Everything an application needs to stand up a server.
pub mod prelude {
    pub use crate::{PlazaError, PlazaServer, PlazaServerBuilder, ServerConfig};
    pub use plaza_protocol::{
        Bounds, ClientMessage, OccupantInfo, Position, ServerMessage, SessionId, SpaceId, UserId,
    };
    pub use plaza_session::{
        RandomSpawn, ScriptedSpawn, SessionError, SpaceDirectory, SpawnPolicy,
        StaticSpaceDirectory, TokenVerifier,
    };
}

pub use plaza_protocol as protocol;
pub use plaza_room as room;
pub use plaza_session as session;
pub use plaza_transport as transport;

pub use plaza_session::{SpaceDirectory, SpawnPolicy, TokenVerifier};
