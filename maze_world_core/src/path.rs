use std::collections::VecDeque;

use crate::{Position, grid::Grid};

/// Neighbor expansion order: west, east, north, south. Fixed so that among
/// equally short paths the search always reconstructs the same one.
const NEIGHBOR_OFFSETS: [(isize, isize); 4] = [(-1, 0), (1, 0), (0, -1), (0, 1)];

/// Finds one shortest path from `start` to `finish` over 4-connected cells
/// satisfying `walkable`, by breadth-first search.
///
/// The returned path includes both endpoints; `start == finish` yields a
/// single-cell path. Returns `None` when `finish` is unreachable or either
/// endpoint lies outside the grid — a normal outcome, not an error.
/// Runs in O(cells) time and space.
pub fn shortest_path<T, F>(
    grid: &Grid<T>,
    walkable: F,
    start: Position,
    finish: Position,
) -> Option<Vec<Position>>
where
    F: Fn(&T) -> bool,
{
    if !grid.in_bounds(start) || !grid.in_bounds(finish) {
        return None;
    }

    let mut visited: Grid<bool> = Grid::new(grid.width(), grid.height());
    let mut backtrace: Grid<Option<Position>> = Grid::new(grid.width(), grid.height());
    let mut queue = VecDeque::new();

    visited[start] = true;
    queue.push_back(start);

    'search: while let Some(current) = queue.pop_front() {
        for (dx, dy) in NEIGHBOR_OFFSETS {
            let Some(next) = current.offset(dx, dy) else {
                continue;
            };
            if !grid.in_bounds(next) || visited[next] || !walkable(&grid[next]) {
                continue;
            }
            visited[next] = true;
            backtrace[next] = Some(current);
            if next == finish {
                break 'search;
            }
            queue.push_back(next);
        }
    }

    if !visited[finish] {
        return None;
    }

    let mut path = vec![finish];
    let mut current = finish;
    while current != start {
        // Every visited cell except `start` has a back-pointer.
        current = backtrace[current].expect("visited cell without back-pointer");
        path.push(current);
    }
    path.reverse();
    Some(path)
}
