//! Spawn placement.
//!
//! Where a freshly joined session materializes is a policy decision, and
//! the random source behind it is injectable so deterministic tests can
//! script exact spawn cells.

use std::collections::VecDeque;
use std::sync::Mutex;

use plaza_protocol::{Bounds, Position};
use rand::Rng;

/// Chooses the initial cell for a joining session.
pub trait SpawnPolicy: Send + Sync + 'static {
    /// Draws a spawn position within `[0,width) × [0,height)`.
    fn draw(&self, bounds: Bounds) -> Position;
}

/// Uniform random placement over the whole space.
///
/// No collision check against existing occupants or static elements —
/// two sessions may legitimately spawn on the same cell.
#[derive(Debug, Default)]
pub struct RandomSpawn;

impl SpawnPolicy for RandomSpawn {
    fn draw(&self, bounds: Bounds) -> Position {
        let mut rng = rand::rng();
        // Degenerate zero-sized spaces spawn at the origin.
        let x = rng.random_range(0..bounds.width.max(1));
        let y = rng.random_range(0..bounds.height.max(1));
        Position::new(x as i32, y as i32)
    }
}

/// A [`SpawnPolicy`] that replays a fixed sequence of positions, then
/// falls back to the origin. For tests.
#[derive(Debug, Default)]
pub struct ScriptedSpawn {
    queue: Mutex<VecDeque<Position>>,
}

impl ScriptedSpawn {
    pub fn new(positions: impl IntoIterator<Item = Position>) -> Self {
        Self {
            queue: Mutex::new(positions.into_iter().collect()),
        }
    }
}

impl SpawnPolicy for ScriptedSpawn {
    fn draw(&self, _bounds: Bounds) -> Position {
        self.queue
            .lock()
            .expect("spawn queue lock poisoned")
            .pop_front()
            .unwrap_or(Position::new(0, 0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_spawn_stays_in_bounds() {
        let bounds = Bounds::new(7, 3);
        let policy = RandomSpawn;
        for _ in 0..200 {
            let pos = policy.draw(bounds);
            assert!(bounds.contains(pos), "spawn {pos} escaped {bounds:?}");
        }
    }

    #[test]
    fn test_random_spawn_handles_one_by_one_space() {
        let pos = RandomSpawn.draw(Bounds::new(1, 1));
        assert_eq!(pos, Position::new(0, 0));
    }

    #[test]
    fn test_scripted_spawn_replays_sequence_then_origin() {
        let policy = ScriptedSpawn::new([Position::new(3, 3), Position::new(5, 1)]);
        let bounds = Bounds::new(10, 10);

        assert_eq!(policy.draw(bounds), Position::new(3, 3));
        assert_eq!(policy.draw(bounds), Position::new(5, 1));
        assert_eq!(policy.draw(bounds), Position::new(0, 0));
    }
}
