use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{Position, RoomId, grid::Grid};

/// The grid is partitioned into this many blocks per axis when labeling
/// wall variations.
pub const WALL_VARIATION_BLOCKS: usize = 3;

/// Placement attempts per requested room before giving up on the remainder.
const ROOM_PLACEMENT_ATTEMPTS: usize = 10;

/// Represents errors arising from maze generation and target placement.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MazeError {
    #[error("room_min_size ({min}) exceeds room_max_size ({max})")]
    RoomSizeBounds { min: usize, max: usize },
    #[error("Grid size ({width}, {height}) leaves no interior inside the outer wall ring")]
    GridTooSmall { width: usize, height: usize },
    #[error("Could not place {targets} targets after {attempts} maze regenerations")]
    PlacementExhausted { targets: usize, attempts: usize },
}

/// Represents the static kind of a single maze cell.
///
/// Walls carry a variation label identifying which block of the grid they
/// fall in, consumed by rendering collaborators to vary wall appearance
/// per block. The label has no effect on connectivity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Cell {
    Wall { variation: u8 },
    Corridor,
}

impl Cell {
    #[inline]
    pub fn is_walkable(&self) -> bool {
        matches!(self, Cell::Corridor)
    }
}

impl Default for Cell {
    fn default() -> Self {
        Cell::Wall { variation: 0 }
    }
}

/// Configuration for maze generation.
///
/// `width` and `height` include the 1-cell outer wall ring, so the walkable
/// interior is at most `(width - 2) x (height - 2)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MazeConfig {
    pub width: usize,
    pub height: usize,
    pub max_rooms: usize,
    pub room_min_size: usize,
    pub room_max_size: usize,
    pub spawns_per_room: usize,
    pub targets_per_room: usize,
}

impl Default for MazeConfig {
    fn default() -> Self {
        MazeConfig {
            width: 11,
            height: 11,
            max_rooms: 6,
            room_min_size: 3,
            room_max_size: 5,
            spawns_per_room: 1,
            targets_per_room: 1,
        }
    }
}

impl MazeConfig {
    /// Creates a config for a square maze with an interior of
    /// `interior_size x interior_size` cells plus the outer wall ring.
    pub fn with_interior(interior_size: usize) -> Self {
        MazeConfig {
            width: interior_size + 2,
            height: interior_size + 2,
            ..MazeConfig::default()
        }
    }

    /// Checks the config for structurally invalid values. These are fatal
    /// and never retried.
    pub fn validate(&self) -> Result<(), MazeError> {
        if self.room_min_size > self.room_max_size {
            return Err(MazeError::RoomSizeBounds {
                min: self.room_min_size,
                max: self.room_max_size,
            });
        }
        if self.width < 3 || self.height < 3 {
            return Err(MazeError::GridTooSmall {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// An axis-aligned rectangular room of corridor cells within the maze
/// interior, with its designated spawn and target slots.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: RoomId,
    pub x: usize,
    pub y: usize,
    pub width: usize,
    pub height: usize,
    pub spawn_slots: Vec<Position>,
    pub target_slots: Vec<Position>,
}

impl Room {
    pub fn contains(&self, pos: Position) -> bool {
        pos.x >= self.x
            && pos.x < self.x + self.width
            && pos.y >= self.y
            && pos.y < self.y + self.height
    }

    pub fn center(&self) -> Position {
        Position {
            x: self.x + self.width / 2,
            y: self.y + self.height / 2,
        }
    }

    /// Iterates the room's cells in row-major order.
    pub fn cells(&self) -> impl Iterator<Item = Position> + '_ {
        (self.y..self.y + self.height)
            .flat_map(move |y| (self.x..self.x + self.width).map(move |x| Position { x, y }))
    }

    /// Checks whether two rooms overlap or sit directly adjacent (no wall
    /// cell between them). Rooms are kept a full cell apart so each stays
    /// a distinct region.
    fn touches(&self, other: &Room) -> bool {
        self.x <= other.x + other.width
            && other.x <= self.x + self.width
            && self.y <= other.y + other.height
            && other.y <= self.y + self.height
    }
}

/// A generated maze layout: the cell grid plus the rooms carved into it.
///
/// A `Maze` is immutable once returned from [`Maze::generate`];
/// regeneration produces a fresh value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Maze {
    grid: Grid<Cell>,
    rooms: Vec<Room>,
}

impl Maze {
    /// Generates a maze from `config`, deterministically in `seed`.
    ///
    /// Up to `max_rooms` non-overlapping rooms are sampled into the
    /// interior and connected by L-shaped corridors; fewer rooms than
    /// requested is a valid outcome when space runs out. The outer ring
    /// is always wall, and every room is reachable from every other.
    pub fn generate(config: &MazeConfig, seed: u64) -> Result<Maze, MazeError> {
        config.validate()?;
        let mut rng = StdRng::seed_from_u64(seed);

        let mut grid = Grid::filled(config.width, config.height, Cell::Wall { variation: 0 });
        let mut rooms = place_rooms(config, &mut rng);

        for room in &rooms {
            for pos in room.cells() {
                grid[pos] = Cell::Corridor;
            }
        }
        for i in 1..rooms.len() {
            let from = rooms[i - 1].center();
            let to = rooms[i].center();
            carve_corridor(&mut grid, from, to, &mut rng);
        }
        for room in &mut rooms {
            draw_slots(room, config, &mut rng);
        }
        label_wall_variations(&mut grid);

        Ok(Maze { grid, rooms })
    }

    pub fn grid(&self) -> &Grid<Cell> {
        &self.grid
    }

    pub fn rooms(&self) -> &[Room] {
        &self.rooms
    }

    pub fn width(&self) -> usize {
        self.grid.width()
    }

    pub fn height(&self) -> usize {
        self.grid.height()
    }

    /// Checks whether `pos` is an in-bounds corridor cell.
    pub fn walkable(&self, pos: Position) -> bool {
        self.grid.get(pos).is_some_and(Cell::is_walkable)
    }

    /// All spawn slots across all rooms.
    pub fn spawn_positions(&self) -> Vec<Position> {
        self.rooms
            .iter()
            .flat_map(|room| room.spawn_slots.iter().copied())
            .collect()
    }

    /// The candidate pool for target placement: every room's target slots.
    pub fn target_positions(&self) -> Vec<Position> {
        self.rooms
            .iter()
            .flat_map(|room| room.target_slots.iter().copied())
            .collect()
    }

    /// The maze as a walkability layer: 0 = wall, 1 = corridor.
    pub fn layout(&self) -> Grid<u8> {
        let mut layout = Grid::new(self.width(), self.height());
        for (pos, cell) in self.grid.enumerate() {
            if cell.is_walkable() {
                layout[pos] = 1;
            }
        }
        layout
    }
}

/// Samples up to `max_rooms` pairwise non-touching rooms inside the
/// interior by bounded rejection sampling.
fn place_rooms(config: &MazeConfig, rng: &mut StdRng) -> Vec<Room> {
    let mut rooms: Vec<Room> = Vec::new();
    let min_size = config.room_min_size.max(1);
    let max_w = config.room_max_size.min(config.width - 2);
    let max_h = config.room_max_size.min(config.height - 2);
    if min_size > max_w || min_size > max_h {
        // Not even the smallest allowed room fits the interior.
        return rooms;
    }

    let attempts = config.max_rooms.saturating_mul(ROOM_PLACEMENT_ATTEMPTS);
    for _ in 0..attempts {
        if rooms.len() == config.max_rooms {
            break;
        }
        let width = rng.random_range(min_size..=max_w);
        let height = rng.random_range(min_size..=max_h);
        let x = rng.random_range(1..=config.width - 1 - width);
        let y = rng.random_range(1..=config.height - 1 - height);
        let candidate = Room {
            id: rooms.len(),
            x,
            y,
            width,
            height,
            spawn_slots: Vec::new(),
            target_slots: Vec::new(),
        };
        if rooms.iter().any(|room| candidate.touches(room)) {
            continue;
        }
        rooms.push(candidate);
    }
    rooms
}

/// Carves an L-shaped corridor between two interior cells, picking the
/// elbow orientation at random.
fn carve_corridor(grid: &mut Grid<Cell>, from: Position, to: Position, rng: &mut StdRng) {
    if rng.random_bool(0.5) {
        carve_horizontal(grid, from.x, to.x, from.y);
        carve_vertical(grid, from.y, to.y, to.x);
    } else {
        carve_vertical(grid, from.y, to.y, from.x);
        carve_horizontal(grid, from.x, to.x, to.y);
    }
}

fn carve_horizontal(grid: &mut Grid<Cell>, x1: usize, x2: usize, y: usize) {
    for x in x1.min(x2)..=x1.max(x2) {
        grid[(x, y)] = Cell::Corridor;
    }
}

fn carve_vertical(grid: &mut Grid<Cell>, y1: usize, y2: usize, x: usize) {
    for y in y1.min(y2)..=y1.max(y2) {
        grid[(x, y)] = Cell::Corridor;
    }
}

/// Draws the room's spawn and target slots as distinct cells from a
/// shuffle of the room's area.
fn draw_slots(room: &mut Room, config: &MazeConfig, rng: &mut StdRng) {
    let mut cells: Vec<Position> = room.cells().collect();
    cells.shuffle(rng);
    let mut drawn = cells.into_iter();
    room.spawn_slots = drawn.by_ref().take(config.spawns_per_room).collect();
    room.target_slots = drawn.take(config.targets_per_room).collect();
}

/// Stamps each wall cell with the index of the grid block it falls in,
/// partitioning the grid `WALL_VARIATION_BLOCKS` ways per axis.
fn label_wall_variations(grid: &mut Grid<Cell>) {
    let nblocks = WALL_VARIATION_BLOCKS;
    let (width, height) = (grid.width(), grid.height());
    let mut label = 0u8;
    for block_y in 0..nblocks {
        for block_x in 0..nblocks {
            let y_from = block_y * height / nblocks;
            let y_to = (block_y + 1) * height / nblocks;
            let x_from = block_x * width / nblocks;
            let x_to = (block_x + 1) * width / nblocks;
            for y in y_from..y_to {
                for x in x_from..x_to {
                    if let Cell::Wall { variation } = &mut grid[(x, y)] {
                        *variation = label;
                    }
                }
            }
            label += 1;
        }
    }
}
