//! Core protocol types for Plaza's wire format.
//!
//! Every frame on the wire is one JSON object, adjacently tagged:
//! `{"type": "<kebab-case event>", "payload": {...}}`. The shapes here are
//! load-bearing — the browser client parses these fields by name, so the
//! serde attributes pin the exact JSON the server speaks.

use serde::{Deserialize, Serialize};

use std::fmt;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// The externally visible id of one live connection.
///
/// Generated fresh at connect time (a short random alphanumeric string),
/// never reused. This — not the verified user id — is what other occupants
/// see in `user-joined` / `user-moved` / `user-left` events, and what the
/// registry uses as its broadcast-exclusion key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Wraps an already-generated id string.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Returns the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// The stable identity recovered from a verified credential.
///
/// Independent of any one connection: the same user reconnecting gets a new
/// [`SessionId`] but the same `UserId`. Duplicate-occupancy detection in a
/// room compares this, not the session id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(String);

impl UserId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifies a space — the rectangular grid a room is built around.
///
/// Room ids and space ids are the same value: joining space `s` puts the
/// session in room `s`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SpaceId(String);

impl SpaceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Grid geometry
// ---------------------------------------------------------------------------

/// An integer grid coordinate.
///
/// Signed so that requested moves like `(-1, 3)` survive deserialization
/// and are rejected by validation rather than by the codec.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub x: i32,
    pub y: i32,
}

impl Position {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// The fixed dimensions of a space, as reported by the space directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bounds {
    pub width: u32,
    pub height: u32,
}

impl Bounds {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Returns `true` if `pos` lies within `[0,width) × [0,height)`.
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= 0
            && pos.y >= 0
            && (pos.x as u32) < self.width
            && (pos.y as u32) < self.height
    }
}

/// One other occupant of a room, as listed in a join snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OccupantInfo {
    pub id: SessionId,
    pub x: i32,
    pub y: i32,
}

// ---------------------------------------------------------------------------
// Client → server messages
// ---------------------------------------------------------------------------

/// Messages a client may send.
///
/// The tag is the kebab-case event name, payload fields are camelCase —
/// `{"type": "join", "payload": {"spaceId": "...", "token": "..."}}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ClientMessage {
    /// Request admission into a space. Valid only while unjoined.
    Join { space_id: SpaceId, token: String },

    /// Request a single-cell step to `(x, y)`. Valid only while active.
    Move { x: i32, y: i32 },
}

// ---------------------------------------------------------------------------
// Server → client messages
// ---------------------------------------------------------------------------

/// Messages the server sends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    tag = "type",
    content = "payload",
    rename_all = "kebab-case",
    rename_all_fields = "camelCase"
)]
pub enum ServerMessage {
    /// Join snapshot, sent to the joining session only: its assigned
    /// session id, its spawn cell, and everybody already in the room.
    SpaceJoined {
        user_id: SessionId,
        spawn: Position,
        users: Vec<OccupantInfo>,
    },

    /// A new occupant arrived. Broadcast to everyone else in the room.
    UserJoined { user_id: SessionId, x: i32, y: i32 },

    /// An occupant's accepted move. Broadcast to everyone else.
    UserMoved { id: SessionId, x: i32, y: i32 },

    /// A move was refused. Sent to the mover only, carrying the unchanged
    /// authoritative position so the client can resynchronize.
    MovementRejected { x: i32, y: i32 },

    /// An occupant's connection closed. Broadcast to everyone else.
    UserLeft { user_id: SessionId },

    /// A terminal protocol error, sent once before the server closes the
    /// connection (currently only duplicate occupancy).
    Error { message: String },
}

// =========================================================================
// Tests
// =========================================================================
