//! Error types for the session layer.

use plaza_protocol::{SpaceId, UserId};

/// Errors raised while admitting a connection into a room.
///
/// All of these are terminal for the connection. Only
/// [`AlreadyInSpace`](SessionError::AlreadyInSpace) produces a reply
/// before the close; the others close silently.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The credential was invalid, expired, or rejected by the
    /// [`TokenVerifier`](crate::TokenVerifier).
    #[error("authentication failed: {0}")]
    AuthFailed(String),

    /// The requested space does not exist.
    #[error("space {0} not found")]
    SpaceNotFound(SpaceId),

    /// The verified identity already holds an active session in this room.
    #[error("user {user} is already connected in space {space}")]
    AlreadyInSpace { user: UserId, space: SpaceId },

    /// The identity verifier or space directory did not answer within the
    /// join deadline.
    #[error("join timed out")]
    JoinTimeout,
}
