//! Room membership for Plaza.
//!
//! A room is the unit of occupancy and broadcast isolation: everyone in
//! the same space sees each other's arrivals, moves, and departures, and
//! nothing from any other space. The [`RoomRegistry`] is the single source
//! of truth for "who is where".
//!
//! # Key types
//!
//! - [`RoomRegistry`] — add/remove/broadcast/membership queries
//! - [`Occupant`] — one session's entry in a room
//! - [`OccupantSender`] — the per-connection outbound channel

mod error;
mod registry;

pub use error::RoomError;
pub use registry::{Occupant, OccupantSender, RoomRegistry};
