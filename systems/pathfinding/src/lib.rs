#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Stateless A* path planner over a tile grid enriched with mesh shortcuts.
//!
//! The walkability grid supplies fine-grained adjacency between neighbouring
//! tiles, while the navigation mesh contributes long-range edges between
//! mutually visible corners, snapped onto the nearest tiles. The start and
//! goal tiles join that visibility graph for the duration of one search: each
//! links to every snapped corner it can see, and to the other endpoint when
//! nothing blocks the straight line. All sources feed a single best-first
//! search whose heuristic is the straight-line distance to the goal tile, so
//! the returned route is the cheapest under cumulative Euclidean cost.

mod shortcuts;
mod sight;

use std::{cmp::Reverse, collections::BinaryHeap};

use log::debug;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};
use tileworld_core::{NavMesh, Path, TileCoord, TileSize, WalkabilityGrid};

use crate::shortcuts::Shortcuts;

/// Tile connectivity used by the grid half of the search.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Adjacency {
    /// Orthogonal neighbours only, each at unit cost.
    #[default]
    Four,
    /// Orthogonal and diagonal neighbours; diagonals cost √2 and never cut a
    /// blocked corner.
    Eight,
}

/// Planner configuration. Holds no search state, so one instance may serve
/// any number of agents.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Planner {
    adjacency: Adjacency,
}

impl Planner {
    /// Creates a planner using the provided tile adjacency.
    #[must_use]
    pub const fn new(adjacency: Adjacency) -> Self {
        Self { adjacency }
    }

    /// Tile adjacency used by the planner.
    #[must_use]
    pub const fn adjacency(&self) -> Adjacency {
        self.adjacency
    }

    /// Computes the cheapest route from `start` to `goal`.
    ///
    /// Returns an empty path when the start equals the goal, when either tile
    /// is outside the grid or blocking, or when no route exists.
    #[must_use]
    pub fn plan(
        &self,
        start: TileCoord,
        goal: TileCoord,
        grid: &WalkabilityGrid,
        mesh: &NavMesh,
        tile_size: TileSize,
    ) -> Path {
        if start == goal || !grid.is_walkable(start) || !grid.is_walkable(goal) {
            return Path::empty();
        }
        let (Some(start_index), Some(goal_index)) = (grid.index(start), grid.index(goal)) else {
            return Path::empty();
        };

        let mut shortcuts = Shortcuts::snap(mesh, grid, tile_size);
        shortcuts.attach_endpoints(grid, start, goal);
        let heuristic = |index: usize| {
            grid.tile_at_index(index)
                .map_or(f32::INFINITY, |tile| tile.euclidean_distance(goal))
        };

        let count = grid.len();
        let mut cost = vec![f32::INFINITY; count];
        let mut parent: Vec<Option<usize>> = vec![None; count];
        let mut closed = vec![false; count];
        let mut frontier = BinaryHeap::new();

        cost[start_index] = 0.0;
        frontier.push(Reverse((OrderedFloat(heuristic(start_index)), start_index)));

        while let Some(Reverse((_, current))) = frontier.pop() {
            if closed[current] {
                continue;
            }
            closed[current] = true;

            if current == goal_index {
                let path = reconstruct(grid, &parent, start_index, goal_index);
                debug!(
                    "planned {} waypoints from {start:?} to {goal:?} at cost {:.2}",
                    path.len(),
                    cost[goal_index]
                );
                return path;
            }

            let Some(tile) = grid.tile_at_index(current) else {
                continue;
            };
            let grid_steps = neighbors(tile, grid, self.adjacency);
            for (next, step) in grid_steps.chain(shortcuts.outgoing(current)) {
                if closed[next] {
                    continue;
                }
                let candidate = cost[current] + step;
                if candidate < cost[next] {
                    cost[next] = candidate;
                    parent[next] = Some(current);
                    frontier.push(Reverse((OrderedFloat(candidate + heuristic(next)), next)));
                }
            }
        }

        debug!("no route from {start:?} to {goal:?}");
        Path::empty()
    }
}

/// Computes the cheapest route using four-way adjacency.
///
/// Convenience wrapper around [`Planner::plan`] with the default planner.
#[must_use]
pub fn plan(
    start: TileCoord,
    goal: TileCoord,
    grid: &WalkabilityGrid,
    mesh: &NavMesh,
    tile_size: TileSize,
) -> Path {
    Planner::default().plan(start, goal, grid, mesh, tile_size)
}

fn reconstruct(
    grid: &WalkabilityGrid,
    parent: &[Option<usize>],
    start_index: usize,
    goal_index: usize,
) -> Path {
    let mut waypoints = Vec::new();
    let mut cursor = goal_index;
    while cursor != start_index {
        let Some(tile) = grid.tile_at_index(cursor) else {
            return Path::empty();
        };
        waypoints.push(tile);
        let Some(previous) = parent[cursor] else {
            return Path::empty();
        };
        cursor = previous;
    }
    waypoints.reverse();
    Path::new(waypoints)
}

/// Walkable neighbours of `tile` in ascending row-major index order.
fn neighbors(tile: TileCoord, grid: &WalkabilityGrid, adjacency: Adjacency) -> NeighborIter {
    let mut neighbors = NeighborIter::default();
    let offsets: &[(i64, i64)] = match adjacency {
        Adjacency::Four => &[(0, -1), (-1, 0), (1, 0), (0, 1)],
        Adjacency::Eight => &[
            (-1, -1),
            (0, -1),
            (1, -1),
            (-1, 0),
            (1, 0),
            (-1, 1),
            (0, 1),
            (1, 1),
        ],
    };

    for &(dx, dy) in offsets {
        let Some(next) = offset(tile, dx, dy) else {
            continue;
        };
        if !grid.is_walkable(next) {
            continue;
        }

        let diagonal = dx != 0 && dy != 0;
        if diagonal {
            let side_a = offset(tile, dx, 0);
            let side_b = offset(tile, 0, dy);
            let open = |side: Option<TileCoord>| side.map_or(false, |side| grid.is_walkable(side));
            if !open(side_a) || !open(side_b) {
                continue;
            }
        }

        if let Some(index) = grid.index(next) {
            let step = if diagonal {
                std::f32::consts::SQRT_2
            } else {
                1.0
            };
            neighbors.push(index, step);
        }
    }

    neighbors
}

fn offset(tile: TileCoord, dx: i64, dy: i64) -> Option<TileCoord> {
    let column = u32::try_from(i64::from(tile.column()) + dx).ok()?;
    let row = u32::try_from(i64::from(tile.row()) + dy).ok()?;
    Some(TileCoord::new(column, row))
}

#[derive(Clone, Debug, Default)]
struct NeighborIter {
    buffer: [Option<(usize, f32)>; 8],
    len: usize,
    cursor: usize,
}

impl NeighborIter {
    fn push(&mut self, index: usize, step: f32) {
        if self.len < self.buffer.len() {
            self.buffer[self.len] = Some((index, step));
            self.len += 1;
        }
    }
}

impl Iterator for NeighborIter {
    type Item = (usize, f32);

    fn next(&mut self) -> Option<Self::Item> {
        if self.cursor >= self.len {
            return None;
        }

        let value = self.buffer[self.cursor];
        self.cursor += 1;
        value
    }
}
