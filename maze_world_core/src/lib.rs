use serde::{Deserialize, Serialize};

pub mod episode;
pub mod generator;
pub mod grid;
pub mod path;
pub mod targets;

/// Identifies a room within a generated maze; doubles as the region id
/// used to tag the room's cells.
pub type RoomId = usize;

/// Represents a 2D cell coordinate, `x` growing rightward and `y` downward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Position {
    pub x: usize,
    pub y: usize,
}

impl Position {
    pub fn new(x: usize, y: usize) -> Self {
        Position { x, y }
    }

    /// Returns this position offset by `(dx, dy)`, or `None` if the offset
    /// would underflow either coordinate.
    pub fn offset(&self, dx: isize, dy: isize) -> Option<Position> {
        let x = self.x.checked_add_signed(dx)?;
        let y = self.y.checked_add_signed(dy)?;
        Some(Position { x, y })
    }
}
