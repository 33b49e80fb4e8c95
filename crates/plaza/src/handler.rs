//! Per-connection handler: the join/move state machine over a live socket.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Create an Unjoined [`Session`] with a fresh session id
//!   2. Wait for `join` → verify token, resolve space, register, snapshot
//!   3. Loop: validate `move` requests, forward room broadcasts
//!   4. On any exit, deregister and announce `user-left` exactly once

use std::sync::Arc;

use plaza_protocol::{
    ClientMessage, Codec, OccupantInfo, Position, ServerMessage, SessionId, SpaceId,
};
use plaza_room::{Occupant, OccupantSender};
use plaza_session::{
    MoveOutcome, Session, SessionError, SpaceDirectory, SpawnPolicy, TokenVerifier,
};
use plaza_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::PlazaError;
use crate::server::ServerState;

/// Sent once before closing a connection that tried to double-join a room.
const ALREADY_CONNECTED: &str = "Already connected in this space.";

/// Drop guard that deregisters an Active session from its room when the
/// handler exits — on clean close, abrupt disconnect, send error, or
/// panic. Created only after a successful join, so a connection that
/// never joined tears down without touching the registry.
///
/// Registry operations are synchronous, so the departure broadcast and
/// removal run directly in `Drop`.
struct RoomGuard<V, D, P> {
    state: Arc<ServerState<V, D, P>>,
    space_id: SpaceId,
    session_id: SessionId,
}

impl<V, D, P> Drop for RoomGuard<V, D, P> {
    fn drop(&mut self) {
        self.state.registry.broadcast(
            &self.space_id,
            ServerMessage::UserLeft {
                user_id: self.session_id.clone(),
            },
            &self.session_id,
        );
        self.state.registry.leave(&self.space_id, &self.session_id);
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<V, D, P>(
    conn: WebSocketConnection,
    state: Arc<ServerState<V, D, P>>,
) -> Result<(), PlazaError>
where
    V: TokenVerifier,
    D: SpaceDirectory,
    P: SpawnPolicy,
{
    let mut session = Session::connect();
    let session_id = session.id().clone();
    tracing::debug!(%session_id, peer = %conn.peer(), "handling new connection");

    // The occupant's outbound queue. The registry holds the sender (via
    // broadcast); this task drains the receiver, so messages reach the
    // socket in the order they were enqueued.
    let (outbound_tx, mut outbound_rx) = mpsc::unbounded_channel::<ServerMessage>();
    let mut guard: Option<RoomGuard<V, D, P>> = None;

    let result = loop {
        tokio::select! {
            inbound = conn.recv() => {
                let frame = match inbound {
                    Ok(Some(frame)) => frame,
                    Ok(None) => {
                        tracing::debug!(%session_id, "connection closed");
                        break Ok(());
                    }
                    Err(e) => {
                        tracing::debug!(%session_id, error = %e, "recv error");
                        break Ok(());
                    }
                };

                let msg: ClientMessage = match state.codec.decode(&frame) {
                    Ok(msg) => msg,
                    Err(e) => {
                        // Malformed frames are never fatal.
                        tracing::debug!(%session_id, error = %e, "undecodable frame ignored");
                        continue;
                    }
                };

                match handle_message(&conn, &state, &mut session, &outbound_tx, &mut guard, msg).await {
                    Ok(false) => {}
                    Ok(true) => break Ok(()),
                    Err(e) => break Err(e),
                }
            }

            broadcast = outbound_rx.recv() => {
                // The sender lives in this scope, so the channel can't
                // close while we're still looping.
                if let Some(msg) = broadcast {
                    let frame = state.codec.encode(&msg)?;
                    if let Err(e) = conn.send(&frame).await {
                        break Err(PlazaError::Transport(e));
                    }
                }
            }
        }
    };

    // Exactly-once cleanup: dropping the guard broadcasts user-left and
    // removes the session from its room, if it ever joined one.
    drop(guard);
    session.terminate();
    result
}

/// Dispatches one decoded client message. Returns `Ok(true)` when the
/// connection should close.
async fn handle_message<V, D, P>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<V, D, P>>,
    session: &mut Session,
    outbound_tx: &OccupantSender,
    guard: &mut Option<RoomGuard<V, D, P>>,
    msg: ClientMessage,
) -> Result<bool, PlazaError>
where
    V: TokenVerifier,
    D: SpaceDirectory,
    P: SpawnPolicy,
{
    match msg {
        ClientMessage::Join { space_id, token } => {
            if !session.is_unjoined() {
                tracing::debug!(session_id = %session.id(), "join after join ignored");
                return Ok(false);
            }
            handle_join(conn, state, session, outbound_tx, guard, space_id, token).await
        }

        ClientMessage::Move { x, y } => {
            handle_move(conn, state, session, Position::new(x, y)).await?;
            Ok(false)
        }
    }
}

/// Runs the join sequence and the failure policy around it. Every failure
/// is terminal for the connection; only a duplicate identity gets a reason
/// before the close, the rest close silently so a probing client learns
/// nothing from the teardown.
async fn handle_join<V, D, P>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<V, D, P>>,
    session: &mut Session,
    outbound_tx: &OccupantSender,
    guard: &mut Option<RoomGuard<V, D, P>>,
    space_id: SpaceId,
    token: String,
) -> Result<bool, PlazaError>
where
    V: TokenVerifier,
    D: SpaceDirectory,
    P: SpawnPolicy,
{
    let session_id = session.id().clone();

    let (spawn, users) = match admit(state, session, outbound_tx, &space_id, &token).await {
        Ok(admitted) => admitted,
        Err(err @ SessionError::AlreadyInSpace { .. }) => {
            tracing::info!(%session_id, error = %err, "join refused");
            let frame = state.codec.encode(&ServerMessage::Error {
                message: ALREADY_CONNECTED.to_string(),
            })?;
            let _ = conn.send(&frame).await;
            let _ = conn.close().await;
            return Ok(true);
        }
        Err(err) => {
            tracing::info!(%session_id, %space_id, error = %err, "join refused");
            let _ = conn.close().await;
            return Ok(true);
        }
    };

    // Admission registered us, so from here on the guard owns teardown.
    *guard = Some(RoomGuard {
        state: Arc::clone(state),
        space_id: space_id.clone(),
        session_id: session_id.clone(),
    });

    // Snapshot goes to the joiner only; everyone else already has the
    // arrival announcement queued by the registry.
    let snapshot = state.codec.encode(&ServerMessage::SpaceJoined {
        user_id: session_id.clone(),
        spawn,
        users,
    })?;
    conn.send(&snapshot).await.map_err(PlazaError::Transport)?;

    tracing::info!(%session_id, %space_id, %spawn, "session joined");
    Ok(false)
}

/// Verifies the token, resolves the space, and atomically registers the
/// session in its room. On success the session is Active, the room has
/// announced the arrival, and the returned snapshot holds the members
/// present at the instant of admission.
async fn admit<V, D, P>(
    state: &Arc<ServerState<V, D, P>>,
    session: &mut Session,
    outbound_tx: &OccupantSender,
    space_id: &SpaceId,
    token: &str,
) -> Result<(Position, Vec<OccupantInfo>), SessionError>
where
    V: TokenVerifier,
    D: SpaceDirectory,
    P: SpawnPolicy,
{
    let deadline = state.config.join_timeout;

    let user_id = tokio::time::timeout(deadline, state.verifier.verify(token))
        .await
        .map_err(|_| SessionError::JoinTimeout)??;

    let bounds = tokio::time::timeout(deadline, state.directory.lookup(space_id))
        .await
        .map_err(|_| SessionError::JoinTimeout)??;

    let spawn = state.spawn.draw(bounds);

    // The registry enforces the one-identity-per-room invariant inside
    // its own critical section; there is no check-then-join window here.
    let users = state
        .registry
        .join(
            space_id.clone(),
            bounds,
            Occupant::new(
                session.id().clone(),
                user_id.clone(),
                spawn,
                outbound_tx.clone(),
            ),
        )
        .map_err(|_| SessionError::AlreadyInSpace {
            user: user_id.clone(),
            space: space_id.clone(),
        })?;

    session.activate(user_id, space_id.clone(), spawn, bounds);
    Ok((spawn, users))
}

/// Applies a movement request: silent on accept (others hear the
/// broadcast), private rejection on refusal, ignored while unjoined.
async fn handle_move<V, D, P>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<V, D, P>>,
    session: &mut Session,
    requested: Position,
) -> Result<(), PlazaError>
where
    V: TokenVerifier,
    D: SpaceDirectory,
    P: SpawnPolicy,
{
    match session.request_move(requested) {
        MoveOutcome::Accepted(position) => {
            let session_id = session.id().clone();
            // Active sessions always have a room.
            if let Some(space_id) = session.space_id() {
                state.registry.update_position(space_id, &session_id, position);
                state.registry.broadcast(
                    space_id,
                    ServerMessage::UserMoved {
                        id: session_id.clone(),
                        x: position.x,
                        y: position.y,
                    },
                    &session_id,
                );
            }
            tracing::debug!(%session_id, %position, "move accepted");
        }

        MoveOutcome::Rejected(position) => {
            tracing::debug!(
                session_id = %session.id(),
                %requested,
                authoritative = %position,
                "move rejected"
            );
            let frame = state.codec.encode(&ServerMessage::MovementRejected {
                x: position.x,
                y: position.y,
            })?;
            conn.send(&frame).await.map_err(PlazaError::Transport)?;
        }

        MoveOutcome::Ignored => {
            tracing::debug!(session_id = %session.id(), "move before join ignored");
        }
    }

    Ok(())
}
