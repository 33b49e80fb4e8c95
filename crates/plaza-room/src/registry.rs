//! The room registry: who is in which space, and how to reach them.
//!
//! One registry instance serves the whole process. It is constructed
//! explicitly and injected into every connection handler — there is no
//! global singleton, so tests run isolated registries side by side.
//!
//! Every operation except [`join`](RoomRegistry::join) is total: absent
//! rooms and absent occupants are treated as empty. `join` is the one
//! fallible operation because it also enforces the per-room identity
//! invariant — the check, the insert, the membership snapshot, and the
//! arrival announcement all happen in one critical section, so no
//! interleaving can admit an identity twice or show an arrival both in a
//! snapshot and as an announcement. The map lives behind a mutex held only
//! for the duration of a mutation or a snapshot copy; sends go through
//! unbounded channels and never block, so holding the lock across them is
//! harmless.

use std::collections::HashMap;
use std::sync::Mutex;

use plaza_protocol::{
    Bounds, OccupantInfo, Position, ServerMessage, SessionId, SpaceId, UserId,
};
use tokio::sync::mpsc;

use crate::RoomError;

/// Channel sender for delivering outbound messages to one occupant's
/// connection handler. Unbounded: sends never block, and a vanished
/// receiver just means the occupant is mid-disconnect.
pub type OccupantSender = mpsc::UnboundedSender<ServerMessage>;

/// One registered occupant of a room.
#[derive(Debug, Clone)]
pub struct Occupant {
    pub session_id: SessionId,
    pub user_id: UserId,
    pub position: Position,
    pub sender: OccupantSender,
}

impl Occupant {
    pub fn new(
        session_id: SessionId,
        user_id: UserId,
        position: Position,
        sender: OccupantSender,
    ) -> Self {
        Self {
            session_id,
            user_id,
            position,
            sender,
        }
    }
}

/// A room: the space's cached bounds plus its current occupant set.
#[derive(Debug)]
struct Room {
    bounds: Bounds,
    occupants: HashMap<SessionId, Occupant>,
}

impl Room {
    fn new(bounds: Bounds) -> Self {
        Self {
            bounds,
            occupants: HashMap::new(),
        }
    }
}

/// Process-wide mapping from space id to occupant set.
#[derive(Debug, Default)]
pub struct RoomRegistry {
    rooms: Mutex<HashMap<SpaceId, Room>>,
}

impl RoomRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Admits an occupant into a room, creating the room on first join.
    ///
    /// Atomically: refuses the join if the occupant's identity is already
    /// present, otherwise inserts the occupant, announces the arrival to
    /// everyone already there, and returns the members present at the
    /// instant of admission (excluding the joiner). Because all four steps
    /// share one critical section, a concurrent arrival is visible either
    /// in the returned snapshot or as a later announcement, never both.
    ///
    /// Bounds are cached when the room is created and stay fixed for the
    /// room's lifetime; later joins supply the same value and it is
    /// ignored.
    ///
    /// # Errors
    /// Returns [`RoomError::IdentityAlreadyPresent`] if the identity holds
    /// a session in this room; the room is left untouched.
    pub fn join(
        &self,
        space_id: SpaceId,
        bounds: Bounds,
        occupant: Occupant,
    ) -> Result<Vec<OccupantInfo>, RoomError> {
        let mut rooms = self.lock();
        if let Some(room) = rooms.get(&space_id) {
            if room
                .occupants
                .values()
                .any(|o| o.user_id == occupant.user_id)
            {
                return Err(RoomError::IdentityAlreadyPresent);
            }
        }

        let room = rooms
            .entry(space_id.clone())
            .or_insert_with(|| Room::new(bounds));

        let members: Vec<OccupantInfo> = room
            .occupants
            .values()
            .map(|o| OccupantInfo {
                id: o.session_id.clone(),
                x: o.position.x,
                y: o.position.y,
            })
            .collect();

        let arrival = ServerMessage::UserJoined {
            user_id: occupant.session_id.clone(),
            x: occupant.position.x,
            y: occupant.position.y,
        };
        for other in room.occupants.values() {
            let _ = other.sender.send(arrival.clone());
        }

        tracing::info!(
            space_id = %space_id,
            session_id = %occupant.session_id,
            occupants = room.occupants.len() + 1,
            "occupant joined"
        );
        room.occupants
            .insert(occupant.session_id.clone(), occupant);
        Ok(members)
    }

    /// Removes an occupant from a room.
    ///
    /// No-op if the room or the occupant is absent — teardown after a
    /// failed join calls this safely. The room entry is dropped once its
    /// last occupant leaves.
    pub fn leave(&self, space_id: &SpaceId, session_id: &SessionId) {
        let mut rooms = self.lock();
        let Some(room) = rooms.get_mut(space_id) else {
            return;
        };
        if room.occupants.remove(session_id).is_some() {
            tracing::info!(
                %space_id,
                %session_id,
                occupants = room.occupants.len(),
                "occupant left"
            );
        }
        if room.occupants.is_empty() {
            rooms.remove(space_id);
            tracing::debug!(%space_id, "room emptied, entry dropped");
        }
    }

    /// Delivers `message` to every occupant of the room except `exclude`.
    ///
    /// No-op for unknown rooms. Delivery order across occupants is
    /// unspecified; per-occupant ordering follows from each occupant's
    /// own channel.
    pub fn broadcast(
        &self,
        space_id: &SpaceId,
        message: ServerMessage,
        exclude: &SessionId,
    ) {
        // Snapshot the recipients under the lock, send outside it.
        let recipients: Vec<OccupantSender> = {
            let rooms = self.lock();
            let Some(room) = rooms.get(space_id) else {
                return;
            };
            room.occupants
                .values()
                .filter(|o| o.session_id != *exclude)
                .map(|o| o.sender.clone())
                .collect()
        };

        for sender in recipients {
            // A closed receiver means the occupant is disconnecting;
            // their own teardown handles deregistration.
            let _ = sender.send(message.clone());
        }
    }

    /// Lists the room's occupants (id + position) excluding one session.
    /// Used to build join snapshots. Empty for unknown rooms.
    pub fn members_except(
        &self,
        space_id: &SpaceId,
        exclude: &SessionId,
    ) -> Vec<OccupantInfo> {
        let rooms = self.lock();
        let Some(room) = rooms.get(space_id) else {
            return Vec::new();
        };
        room.occupants
            .values()
            .filter(|o| o.session_id != *exclude)
            .map(|o| OccupantInfo {
                id: o.session_id.clone(),
                x: o.position.x,
                y: o.position.y,
            })
            .collect()
    }

    /// Returns `true` iff some occupant of the room holds this verified
    /// identity. The per-room uniqueness invariant is enforced inside
    /// [`join`](Self::join); this query is for introspection.
    pub fn is_identity_present(&self, space_id: &SpaceId, user_id: &UserId) -> bool {
        let rooms = self.lock();
        rooms
            .get(space_id)
            .is_some_and(|room| {
                room.occupants.values().any(|o| o.user_id == *user_id)
            })
    }

    /// Syncs the registry's copy of an occupant's position after an
    /// accepted move. No-op if the room or occupant is gone.
    pub fn update_position(
        &self,
        space_id: &SpaceId,
        session_id: &SessionId,
        position: Position,
    ) {
        let mut rooms = self.lock();
        if let Some(occupant) = rooms
            .get_mut(space_id)
            .and_then(|room| room.occupants.get_mut(session_id))
        {
            occupant.position = position;
        }
    }

    /// The bounds cached for a room, if the room exists.
    pub fn bounds(&self, space_id: &SpaceId) -> Option<Bounds> {
        self.lock().get(space_id).map(|room| room.bounds)
    }

    /// The number of occupants currently in a room (0 for unknown rooms).
    pub fn occupant_count(&self, space_id: &SpaceId) -> usize {
        self.lock()
            .get(space_id)
            .map_or(0, |room| room.occupants.len())
    }

    /// The number of live (non-empty) rooms.
    pub fn room_count(&self) -> usize {
        self.lock().len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<SpaceId, Room>> {
        self.rooms.lock().expect("room registry lock poisoned")
    }
}
