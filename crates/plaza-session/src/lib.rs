//! Connection sessions for Plaza.
//!
//! This crate owns everything about one connection's lifecycle:
//!
//! 1. **Identity** — the [`TokenVerifier`] seam turns a credential into a
//!    stable [`UserId`](plaza_protocol::UserId).
//! 2. **Space resolution** — the [`SpaceDirectory`] seam resolves a space
//!    id to its grid dimensions.
//! 3. **The state machine** — [`Session`] tracks
//!    `Unjoined → Active → Terminated` and is the single authority over a
//!    connection's position.
//! 4. **Movement rules** — [`validate_move`] and spawn placement
//!    ([`SpawnPolicy`]).
//!
//! The room registry and the network handler live above this crate; they
//! drive the state machine but never mutate its position directly.

#![allow(async_fn_in_trait)]

mod directory;
mod error;
mod session;
mod spawn;
mod verify;

pub use directory::{SpaceDirectory, StaticSpaceDirectory};
pub use error::SessionError;
pub use session::{MoveOutcome, Session, SessionState, validate_move};
pub use spawn::{RandomSpawn, ScriptedSpawn, SpawnPolicy};
pub use verify::TokenVerifier;
