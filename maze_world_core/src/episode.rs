use rand::{Rng, SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    Position,
    generator::{Cell, Maze, MazeConfig, MazeError},
    grid::Grid,
    path::shortest_path,
    targets::{TargetAssignment, generate_with_targets},
};

/// Layout value painted over cells on the oracle path (walls are 0,
/// corridors 1).
pub const PATH_MARKER: u8 = 2;

/// Represents actions the agent can take within an episode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Wait,
    Move { dx: isize, dy: isize },
}

/// The outcome of a single step: the reward earned and, when the active
/// target was reached, its index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StepOutcome {
    pub reward: f32,
    pub reached: Option<usize>,
}

/// A single target-cycling episode over a generated maze.
///
/// Owns the maze, the target assignment, and the agent position. Moving
/// onto the active target yields a unit reward and cycles the active
/// target to a different index. Episode termination (time limit) is the
/// caller's concern.
#[derive(Debug, Clone)]
pub struct MazeEpisode {
    maze: Maze,
    assignment: TargetAssignment,
    agent: Position,
    rng: StdRng,
}

impl MazeEpisode {
    /// Generates a maze with placed targets (regenerating up to
    /// `max_attempts` times) and spawns the agent on a random spawn slot.
    pub fn new(
        config: &MazeConfig,
        n_targets: usize,
        seed: u64,
        max_attempts: usize,
    ) -> Result<Self, MazeError> {
        let mut rng = StdRng::seed_from_u64(seed);
        let (maze, assignment) =
            generate_with_targets(config, n_targets, rng.random(), max_attempts)?;
        let agent = spawn_position(&maze, &mut rng);
        Ok(MazeEpisode {
            maze,
            assignment,
            agent,
            rng,
        })
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn assignment(&self) -> &TargetAssignment {
        &self.assignment
    }

    pub fn agent(&self) -> Position {
        self.agent
    }

    /// Applies one action. Movement is one cell in a cardinal direction;
    /// longer or diagonal moves, moves into walls, and moves out of bounds
    /// all leave the agent in place. That is a quiet non-event, not an
    /// error.
    pub fn step(&mut self, action: Action) -> StepOutcome {
        if let Action::Move { dx, dy } = action {
            if dx.unsigned_abs() + dy.unsigned_abs() <= 1 {
                if let Some(next) = self.agent.offset(dx, dy) {
                    if self.maze.walkable(next) {
                        self.agent = next;
                    }
                }
            }
        }

        if !self.assignment.is_empty() && self.agent == self.assignment.active_position() {
            let reached = self.assignment.active_index();
            self.assignment.on_active_reached(&mut self.rng);
            return StepOutcome {
                reward: 1.0,
                reached: Some(reached),
            };
        }
        StepOutcome {
            reward: 0.0,
            reached: None,
        }
    }

    /// The shortest corridor path from the agent to the active target, or
    /// `None` if there is no target or the target is unreachable.
    pub fn oracle_path(&self) -> Option<Vec<Position>> {
        if self.assignment.is_empty() {
            return None;
        }
        shortest_path(
            self.maze.grid(),
            Cell::is_walkable,
            self.agent,
            self.assignment.active_position(),
        )
    }

    /// The walkability layout (0 = wall, 1 = corridor).
    pub fn layout(&self) -> Grid<u8> {
        self.maze.layout()
    }

    /// Oracle observation: the layout with the shortest path to the active
    /// target painted as [`PATH_MARKER`]. An unreachable target simply
    /// leaves the layout unmarked.
    pub fn layout_with_path(&self) -> Grid<u8> {
        let mut layout = self.maze.layout();
        if let Some(path) = self.oracle_path() {
            for pos in path {
                layout[pos] = PATH_MARKER;
            }
        }
        layout
    }
}

/// Picks the agent's starting cell: a random spawn slot when the maze has
/// any, otherwise a random corridor cell, otherwise the grid center (a
/// roomless maze has nowhere to walk anyway).
fn spawn_position(maze: &Maze, rng: &mut StdRng) -> Position {
    let spawns = maze.spawn_positions();
    if !spawns.is_empty() {
        return spawns[rng.random_range(0..spawns.len())];
    }
    let corridors: Vec<Position> = maze
        .grid()
        .enumerate()
        .filter(|(_, cell)| cell.is_walkable())
        .map(|(pos, _)| pos)
        .collect();
    if !corridors.is_empty() {
        return corridors[rng.random_range(0..corridors.len())];
    }
    Position::new(maze.width() / 2, maze.height() / 2)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::targets::DEFAULT_MAX_REGENERATIONS;

    fn episode(seed: u64) -> MazeEpisode {
        let config = MazeConfig {
            max_rooms: 4,
            ..MazeConfig::with_interior(9)
        };
        MazeEpisode::new(&config, 3, seed, DEFAULT_MAX_REGENERATIONS).unwrap()
    }

    fn step_toward(episode: &mut MazeEpisode, next: Position) -> StepOutcome {
        let agent = episode.agent();
        let dx = next.x as isize - agent.x as isize;
        let dy = next.y as isize - agent.y as isize;
        episode.step(Action::Move { dx, dy })
    }

    #[test]
    fn agent_spawns_on_a_spawn_slot() {
        let ep = episode(0);
        assert!(ep.maze().spawn_positions().contains(&ep.agent()));
        assert!(ep.maze().walkable(ep.agent()));
    }

    #[test]
    fn walls_block_movement() {
        let mut ep = episode(1);
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            let dx = rng.random_range(-1i32..=1) as isize;
            let dy = rng.random_range(-1i32..=1) as isize;
            ep.step(Action::Move { dx, dy });
            assert!(ep.maze().walkable(ep.agent()));
        }
    }

    #[test]
    fn moves_longer_than_one_cell_are_rejected() {
        // A multi-cell move could land on a corridor cell beyond a wall,
        // and a diagonal move could cut a wall corner; both must no-op.
        let mut ep = episode(2);
        let start = ep.agent();
        for (dx, dy) in [(2, 0), (-2, 0), (0, 2), (0, -3), (1, 1), (-1, 1), (2, 2)] {
            let outcome = ep.step(Action::Move { dx, dy });
            assert_eq!(ep.agent(), start);
            assert_eq!(outcome.reward, 0.0);
        }
    }

    #[test]
    fn wait_earns_nothing_off_target() {
        // Spawn and target slots live in disjoint rooms or are drawn as
        // distinct cells, so a fresh episode never starts on a target.
        let mut ep = episode(2);
        let obtained = ep.assignment().targets_obtained();
        let outcome = ep.step(Action::Wait);
        assert_eq!(outcome.reward, 0.0);
        assert_eq!(outcome.reached, None);
        assert_eq!(ep.assignment().targets_obtained(), obtained);
    }

    #[test]
    fn reaching_the_active_target_rewards_and_cycles() {
        let mut ep = episode(3);
        let before = ep.assignment().active_index();
        let path = ep.oracle_path().expect("active target must be reachable");
        let mut reward = 0.0;
        let mut reached = None;
        for next in path.into_iter().skip(1) {
            let outcome = step_toward(&mut ep, next);
            reward = outcome.reward;
            reached = outcome.reached;
        }
        assert_eq!(reward, 1.0);
        assert_eq!(reached, Some(before));
        assert_eq!(ep.assignment().targets_obtained(), 1);
        assert_ne!(ep.assignment().active_index(), before);
    }

    #[test]
    fn obtained_count_is_monotone_across_cycles() {
        let mut ep = episode(4);
        let mut last = ep.assignment().targets_obtained();
        for _ in 0..5 {
            let path = ep.oracle_path().expect("active target must be reachable");
            for next in path.into_iter().skip(1) {
                step_toward(&mut ep, next);
            }
            let obtained = ep.assignment().targets_obtained();
            assert!(obtained > last);
            last = obtained;
        }
        assert!(last >= 5);
    }

    #[test]
    fn oracle_overlay_marks_only_corridor_cells() {
        let ep = episode(5);
        let plain = ep.layout();
        let overlaid = ep.layout_with_path();
        let mut marked = 0;
        for (pos, value) in overlaid.enumerate() {
            match *value {
                PATH_MARKER => {
                    assert_eq!(plain[pos], 1, "path marker on a wall at {:?}", pos);
                    marked += 1;
                }
                other => assert_eq!(other, plain[pos]),
            }
        }
        let path = ep.oracle_path().unwrap();
        assert_eq!(marked, path.len());
        assert!(path.contains(&ep.agent()));
        assert!(path.contains(&ep.assignment().active_position()));
    }
}
