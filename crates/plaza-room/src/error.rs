//! Error types for the room layer.

/// Errors raised while admitting an occupant into a room.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The occupant's verified identity already holds a session in this
    /// room. Admission is refused; the room is untouched.
    #[error("identity already present in room")]
    IdentityAlreadyPresent,
}
