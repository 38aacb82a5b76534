use rand::{Rng, SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Serialize};

use crate::{
    Position,
    generator::{Maze, MazeConfig, MazeError, Room},
};

/// Default cap on maze regenerations before target placement gives up.
pub const DEFAULT_MAX_REGENERATIONS: usize = 32;

/// Draws `n_targets` distinct target positions from the rooms' slot pool.
///
/// The pool is every room's target slots, shuffled with the caller's rng.
/// Returns `None` when the pool is too small — a recoverable signal that
/// the maze has too few rooms and should be regenerated.
pub fn place_targets(
    rooms: &[Room],
    n_targets: usize,
    rng: &mut impl Rng,
) -> Option<Vec<Position>> {
    let mut pool: Vec<Position> = rooms
        .iter()
        .flat_map(|room| room.target_slots.iter().copied())
        .collect();
    if pool.len() < n_targets {
        return None;
    }
    pool.shuffle(rng);
    pool.truncate(n_targets);
    Some(pool)
}

/// Draws a uniformly random target index, rejecting any index currently
/// flagged activated (the target the agent is touching).
///
/// With a single target there is nothing to reject and index 0 is the only
/// possible draw. At most one index is expected to be activated at a time.
pub fn pick_next_target(rng: &mut impl Rng, activated: &[bool]) -> usize {
    if activated.len() <= 1 {
        return 0;
    }
    loop {
        let ix = rng.random_range(0..activated.len());
        if !activated[ix] {
            return ix;
        }
    }
}

/// Per-episode target state: the placed positions, which target is active,
/// and how many targets have been obtained so far.
///
/// Exactly one target is active at a time; `targets_obtained` only ever
/// increases within an episode.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TargetAssignment {
    positions: Vec<Position>,
    active: usize,
    obtained: u32,
}

impl TargetAssignment {
    /// Creates the assignment and draws the initial active target.
    pub fn new(positions: Vec<Position>, rng: &mut impl Rng) -> Self {
        let activated = vec![false; positions.len()];
        let active = pick_next_target(rng, &activated);
        TargetAssignment {
            positions,
            active,
            obtained: 0,
        }
    }

    pub fn positions(&self) -> &[Position] {
        &self.positions
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_position(&self) -> Position {
        self.positions[self.active]
    }

    pub fn targets_obtained(&self) -> u32 {
        self.obtained
    }

    /// Records that the active target was reached and cycles to a new one.
    ///
    /// The just-reached target counts as activated while the agent stands
    /// on it, so the new draw excludes it unless it is the only target.
    /// Returns the new active index.
    pub fn on_active_reached(&mut self, rng: &mut impl Rng) -> usize {
        self.obtained += 1;
        let mut activated = vec![false; self.positions.len()];
        activated[self.active] = true;
        self.active = pick_next_target(rng, &activated);
        self.active
    }
}

/// Generates a maze and places `n_targets` targets, regenerating with a
/// fresh seed whenever the maze came out with too few target slots.
///
/// Each attempt draws its generator seed from a seed stream derived from
/// `seed`, so the whole loop is deterministic. The retry loop is bounded:
/// after `max_attempts` failed placements the configuration is considered
/// unsatisfiable and `MazeError::PlacementExhausted` is returned.
pub fn generate_with_targets(
    config: &MazeConfig,
    n_targets: usize,
    seed: u64,
    max_attempts: usize,
) -> Result<(Maze, TargetAssignment), MazeError> {
    config.validate()?;
    let mut rng = StdRng::seed_from_u64(seed);
    for _ in 0..max_attempts {
        let maze = Maze::generate(config, rng.random())?;
        if let Some(positions) = place_targets(maze.rooms(), n_targets, &mut rng) {
            let assignment = TargetAssignment::new(positions, &mut rng);
            return Ok((maze, assignment));
        }
    }
    Err(MazeError::PlacementExhausted {
        targets: n_targets,
        attempts: max_attempts,
    })
}
