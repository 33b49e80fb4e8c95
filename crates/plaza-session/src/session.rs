//! The connection session state machine.
//!
//! One [`Session`] exists per live connection and is the single owner of
//! that connection's room membership and authoritative position. It is a
//! three-state machine:
//!
//! ```text
//!   Unjoined ──(join accepted)──→ Active ──(close / violation)──→ Terminated
//!       │                                                             ▲
//!       └──────────────(close / violation)───────────────────────────┘
//! ```
//!
//! `Terminated` is terminal — a dead session is discarded, never reused.

use plaza_protocol::{Bounds, Position, SessionId, SpaceId, UserId};
use rand::Rng;
use rand::distr::Alphanumeric;

/// Length of generated session ids, matching the reference client's
/// expectations (short, URL-safe, unique per connection).
const SESSION_ID_LEN: usize = 10;

/// Decides a single movement request.
///
/// Pure over (current position, bounds, requested position): replaying the
/// same request sequence from the same start always yields the same
/// accept/reject outcomes.
///
/// A request is accepted iff the target lies inside the bounds and is
/// exactly one orthogonal cell away — no diagonals, no teleports, no
/// zero-length moves.
pub fn validate_move(current: Position, requested: Position, bounds: Bounds) -> bool {
    if !bounds.contains(requested) {
        return false;
    }
    let dx = (requested.x - current.x).abs();
    let dy = (requested.y - current.y).abs();
    (dx == 1 && dy == 0) || (dx == 0 && dy == 1)
}

/// Lifecycle state of a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// Connected but not yet admitted into any room. The only message
    /// honored in this state is `join`.
    Unjoined,

    /// Admitted into a room. `position` is authoritative; `bounds` is the
    /// room's cached dimensions, fixed at join time.
    Active {
        space_id: SpaceId,
        position: Position,
        bounds: Bounds,
    },

    /// The connection closed or was torn down. No way back.
    Terminated,
}

/// What happened to a movement request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The step was legal; the session's position is now the new value.
    Accepted(Position),

    /// The step was illegal; carries the unchanged authoritative position
    /// to echo back to the mover.
    Rejected(Position),

    /// The session isn't Active — the request is dropped without reply.
    Ignored,
}

/// Server-side state for one live connection.
#[derive(Debug)]
pub struct Session {
    id: SessionId,
    user_id: Option<UserId>,
    state: SessionState,
}

impl Session {
    /// Creates the session for a newly accepted connection, with a fresh
    /// random id and no identity yet.
    pub fn connect() -> Self {
        Self {
            id: generate_session_id(),
            user_id: None,
            state: SessionState::Unjoined,
        }
    }

    /// The connection-scoped id other occupants see.
    pub fn id(&self) -> &SessionId {
        &self.id
    }

    /// The verified identity, present once the session has joined.
    pub fn user_id(&self) -> Option<&UserId> {
        self.user_id.as_ref()
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_unjoined(&self) -> bool {
        matches!(self.state, SessionState::Unjoined)
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    /// The room this session occupies, if Active.
    pub fn space_id(&self) -> Option<&SpaceId> {
        match &self.state {
            SessionState::Active { space_id, .. } => Some(space_id),
            _ => None,
        }
    }

    /// The authoritative position, if Active.
    pub fn position(&self) -> Option<Position> {
        match &self.state {
            SessionState::Active { position, .. } => Some(*position),
            _ => None,
        }
    }

    /// Transitions Unjoined → Active after a successful join.
    ///
    /// Sets the identity (immutable afterwards), the room, and the spawn
    /// position. Returns `false` without touching anything if the session
    /// is not Unjoined.
    pub fn activate(
        &mut self,
        user_id: UserId,
        space_id: SpaceId,
        spawn: Position,
        bounds: Bounds,
    ) -> bool {
        if !self.is_unjoined() {
            tracing::warn!(session_id = %self.id, "activate on non-unjoined session ignored");
            return false;
        }
        self.user_id = Some(user_id);
        self.state = SessionState::Active {
            space_id,
            position: spawn,
            bounds,
        };
        true
    }

    /// Applies the movement rule to a requested target cell.
    ///
    /// On acceptance the session's stored position advances; on rejection
    /// it is untouched. Requests outside the Active state are ignored.
    pub fn request_move(&mut self, requested: Position) -> MoveOutcome {
        match &mut self.state {
            SessionState::Active {
                position, bounds, ..
            } => {
                if validate_move(*position, requested, *bounds) {
                    *position = requested;
                    MoveOutcome::Accepted(requested)
                } else {
                    MoveOutcome::Rejected(*position)
                }
            }
            _ => MoveOutcome::Ignored,
        }
    }

    /// Transitions to Terminated from any state. Idempotent.
    pub fn terminate(&mut self) {
        self.state = SessionState::Terminated;
    }
}

/// Generates a random alphanumeric session id.
fn generate_session_id() -> SessionId {
    let id: String = rand::rng()
        .sample_iter(Alphanumeric)
        .take(SESSION_ID_LEN)
        .map(char::from)
        .collect();
    SessionId::new(id)
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn active_session(x: i32, y: i32, width: u32, height: u32) -> Session {
        let mut session = Session::connect();
        assert!(session.activate(
            UserId::new("u1"),
            SpaceId::new("s1"),
            Position::new(x, y),
            Bounds::new(width, height),
        ));
        session
    }

    // =====================================================================
    // validate_move
    // =====================================================================

    #[test]
    fn test_validate_move_accepts_all_four_orthogonal_steps() {
        let bounds = Bounds::new(10, 10);
        let from = Position::new(5, 5);
        for to in [
            Position::new(6, 5),
            Position::new(4, 5),
            Position::new(5, 6),
            Position::new(5, 4),
        ] {
            assert!(validate_move(from, to, bounds), "step to {to} refused");
        }
    }

    #[test]
    fn test_validate_move_rejects_diagonal() {
        let bounds = Bounds::new(10, 10);
        assert!(!validate_move(
            Position::new(5, 5),
            Position::new(6, 6),
            bounds
        ));
    }

    #[test]
    fn test_validate_move_rejects_zero_length() {
        let bounds = Bounds::new(10, 10);
        assert!(!validate_move(
            Position::new(5, 5),
            Position::new(5, 5),
            bounds
        ));
    }

    #[test]
    fn test_validate_move_rejects_teleport() {
        let bounds = Bounds::new(10, 10);
        assert!(!validate_move(
            Position::new(4, 3),
            Position::new(6, 6),
            bounds
        ));
    }

    #[test]
    fn test_validate_move_rejects_out_of_bounds() {
        let bounds = Bounds::new(10, 10);
        // Stepping off every edge, each a legal unit step geometrically.
        assert!(!validate_move(
            Position::new(0, 3),
            Position::new(-1, 3),
            bounds
        ));
        assert!(!validate_move(
            Position::new(9, 3),
            Position::new(10, 3),
            bounds
        ));
        assert!(!validate_move(
            Position::new(3, 0),
            Position::new(3, -1),
            bounds
        ));
        assert!(!validate_move(
            Position::new(3, 9),
            Position::new(3, 10),
            bounds
        ));
    }

    // =====================================================================
    // Session lifecycle
    // =====================================================================

    #[test]
    fn test_connect_starts_unjoined_without_identity() {
        let session = Session::connect();
        assert!(session.is_unjoined());
        assert!(session.user_id().is_none());
        assert!(session.position().is_none());
        assert_eq!(session.id().as_str().len(), SESSION_ID_LEN);
        assert!(session.id().as_str().chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_connect_generates_distinct_ids() {
        let a = Session::connect();
        let b = Session::connect();
        assert_ne!(a.id(), b.id());
    }

    #[test]
    fn test_activate_sets_room_identity_and_spawn() {
        let session = active_session(3, 3, 10, 10);
        assert!(session.is_active());
        assert_eq!(session.user_id(), Some(&UserId::new("u1")));
        assert_eq!(session.space_id(), Some(&SpaceId::new("s1")));
        assert_eq!(session.position(), Some(Position::new(3, 3)));
    }

    #[test]
    fn test_activate_twice_is_refused() {
        let mut session = active_session(3, 3, 10, 10);
        let again = session.activate(
            UserId::new("u2"),
            SpaceId::new("s2"),
            Position::new(0, 0),
            Bounds::new(5, 5),
        );
        assert!(!again);
        // First join's state is untouched.
        assert_eq!(session.user_id(), Some(&UserId::new("u1")));
        assert_eq!(session.space_id(), Some(&SpaceId::new("s1")));
    }

    #[test]
    fn test_activate_after_terminate_is_refused() {
        let mut session = Session::connect();
        session.terminate();
        assert!(!session.activate(
            UserId::new("u1"),
            SpaceId::new("s1"),
            Position::new(0, 0),
            Bounds::new(5, 5),
        ));
        assert_eq!(*session.state(), SessionState::Terminated);
    }

    // =====================================================================
    // request_move
    // =====================================================================

    #[test]
    fn test_request_move_accepted_advances_position() {
        let mut session = active_session(4, 3, 10, 10);
        let outcome = session.request_move(Position::new(4, 4));
        assert_eq!(outcome, MoveOutcome::Accepted(Position::new(4, 4)));
        assert_eq!(session.position(), Some(Position::new(4, 4)));
    }

    #[test]
    fn test_request_move_rejected_keeps_position() {
        let mut session = active_session(4, 3, 10, 10);
        let outcome = session.request_move(Position::new(6, 6));
        assert_eq!(outcome, MoveOutcome::Rejected(Position::new(4, 3)));
        assert_eq!(session.position(), Some(Position::new(4, 3)));
    }

    #[test]
    fn test_request_move_while_unjoined_is_ignored() {
        let mut session = Session::connect();
        assert_eq!(session.request_move(Position::new(1, 0)), MoveOutcome::Ignored);
    }

    #[test]
    fn test_request_move_after_terminate_is_ignored() {
        let mut session = active_session(4, 3, 10, 10);
        session.terminate();
        assert_eq!(session.request_move(Position::new(4, 4)), MoveOutcome::Ignored);
    }

    #[test]
    fn test_replayed_move_sequence_yields_identical_outcomes() {
        // Movement validation is pure: same start, same bounds, same
        // requests — same accept/reject sequence.
        let requests = [
            Position::new(4, 3),
            Position::new(6, 6),
            Position::new(-1, 3),
            Position::new(4, 4),
            Position::new(4, 4),
        ];

        let run = || {
            let mut session = active_session(3, 3, 10, 10);
            requests
                .iter()
                .map(|&to| session.request_move(to))
                .collect::<Vec<_>>()
        };

        let first = run();
        let second = run();
        assert_eq!(first, second);
        assert_eq!(
            first,
            vec![
                MoveOutcome::Accepted(Position::new(4, 3)),
                MoveOutcome::Rejected(Position::new(4, 3)),
                MoveOutcome::Rejected(Position::new(4, 3)),
                MoveOutcome::Accepted(Position::new(4, 4)),
                MoveOutcome::Rejected(Position::new(4, 4)),
            ]
        );
    }
}
