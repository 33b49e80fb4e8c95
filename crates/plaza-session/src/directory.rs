//! Space lookup hook.
//!
//! Spaces are created and persisted elsewhere (the CRUD API); the presence
//! core only needs their dimensions. [`SpaceDirectory`] is the read-only
//! seam: resolve a [`SpaceId`] to its [`Bounds`], once per join. An unknown
//! space is terminal for the joining connection.

use std::collections::HashMap;

use plaza_protocol::{Bounds, SpaceId};

use crate::SessionError;

/// Read-only lookup of a space's dimensions.
pub trait SpaceDirectory: Send + Sync + 'static {
    /// Resolves `space_id` to the space's fixed dimensions.
    ///
    /// # Errors
    /// Returns [`SessionError::SpaceNotFound`] if no such space exists.
    fn lookup(
        &self,
        space_id: &SpaceId,
    ) -> impl std::future::Future<Output = Result<Bounds, SessionError>> + Send;
}

/// An in-memory [`SpaceDirectory`] over a fixed set of spaces.
///
/// Enough for demos and tests; production wires this trait to the real
/// space store instead.
#[derive(Debug, Default)]
pub struct StaticSpaceDirectory {
    spaces: HashMap<SpaceId, Bounds>,
}

impl StaticSpaceDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a space, replacing any previous entry with the same id.
    pub fn with_space(mut self, space_id: SpaceId, bounds: Bounds) -> Self {
        self.spaces.insert(space_id, bounds);
        self
    }
}

impl SpaceDirectory for StaticSpaceDirectory {
    async fn lookup(&self, space_id: &SpaceId) -> Result<Bounds, SessionError> {
        self.spaces
            .get(space_id)
            .copied()
            .ok_or_else(|| SessionError::SpaceNotFound(space_id.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_static_directory_resolves_registered_space() {
        let dir = StaticSpaceDirectory::new()
            .with_space(SpaceId::new("s1"), Bounds::new(10, 20));

        let bounds = dir.lookup(&SpaceId::new("s1")).await.unwrap();
        assert_eq!(bounds, Bounds::new(10, 20));
    }

    #[tokio::test]
    async fn test_static_directory_unknown_space_is_not_found() {
        let dir = StaticSpaceDirectory::new();
        let result = dir.lookup(&SpaceId::new("nope")).await;
        assert!(matches!(result, Err(SessionError::SpaceNotFound(_))));
    }
}
