use maze_world_core::{
    Position,
    episode::{Action, MazeEpisode},
    generator::{Maze, MazeConfig},
    path::shortest_path,
    targets::{DEFAULT_MAX_REGENERATIONS, generate_with_targets},
};

/// The 9x9-interior / 4-room layout used throughout: the small
/// explore-goal-locations shape.
fn small_config() -> MazeConfig {
    MazeConfig {
        max_rooms: 4,
        room_min_size: 3,
        room_max_size: 5,
        ..MazeConfig::with_interior(9)
    }
}

#[test]
fn generation_and_placement_succeed_for_the_small_layout() {
    let (maze, assignment) =
        generate_with_targets(&small_config(), 3, 42, DEFAULT_MAX_REGENERATIONS).unwrap();

    assert_eq!(maze.width(), 11);
    assert_eq!(maze.height(), 11);
    assert_eq!(assignment.len(), 3);

    // Three distinct positions, each inside a distinct room.
    let mut rooms_hit: Vec<usize> = assignment
        .positions()
        .iter()
        .map(|pos| {
            maze.rooms()
                .iter()
                .find(|room| room.contains(*pos))
                .expect("target placed outside every room")
                .id
        })
        .collect();
    rooms_hit.sort_unstable();
    rooms_hit.dedup();
    assert_eq!(rooms_hit.len(), 3);

    let mut positions: Vec<Position> = assignment.positions().to_vec();
    positions.sort_by_key(|pos| (pos.y, pos.x));
    positions.dedup();
    assert_eq!(positions.len(), 3);
}

#[test]
fn every_target_is_reachable_from_every_spawn() {
    for seed in 0..10 {
        let (maze, assignment) =
            generate_with_targets(&small_config(), 3, seed, DEFAULT_MAX_REGENERATIONS).unwrap();
        for spawn in maze.spawn_positions() {
            for target in assignment.positions() {
                let path = shortest_path(
                    maze.grid(),
                    |cell| cell.is_walkable(),
                    spawn,
                    *target,
                );
                assert!(path.is_some(), "seed {seed}: target unreachable from spawn");
            }
        }
    }
}

#[test]
fn oracle_guided_agent_collects_targets_in_order() {
    let mut episode = MazeEpisode::new(&small_config(), 3, 42, DEFAULT_MAX_REGENERATIONS).unwrap();

    let mut collected = Vec::new();
    for _ in 0..4 {
        let expected = episode.assignment().active_index();
        let path = episode.oracle_path().expect("oracle path must exist");
        for next in path.into_iter().skip(1) {
            let agent = episode.agent();
            let action = Action::Move {
                dx: next.x as isize - agent.x as isize,
                dy: next.y as isize - agent.y as isize,
            };
            let outcome = episode.step(action);
            if let Some(reached) = outcome.reached {
                collected.push(reached);
            }
        }
        assert_eq!(collected.last(), Some(&expected));
    }

    assert_eq!(collected.len(), 4);
    assert_eq!(episode.assignment().targets_obtained(), 4);
    for pair in collected.windows(2) {
        assert_ne!(pair[0], pair[1], "active target must change after contact");
    }
}

#[test]
fn regenerated_mazes_share_no_state() {
    let config = small_config();
    let first = Maze::generate(&config, 1).unwrap();
    let snapshot = first.clone();
    let second = Maze::generate(&config, 2).unwrap();
    // Generating again must not mutate the previously returned maze.
    assert_eq!(first, snapshot);
    assert_ne!(second, first);
}
