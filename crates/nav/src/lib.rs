//! Grid A* pathfinding over the collision world.
//!
//! Paths are integer grid cells, produced fresh per request and never
//! cached. An empty path is a normal outcome (already there, or goal
//! unreachable), never an error.

use glam::{IVec2, Vec3};
use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use spatial::{CollisionWorld, DEFAULT_HALF_EXTENT};

/// Frontier cap: the grid hash is unbounded, so "exhausted frontier" needs
/// a finite definition. Hitting the cap counts as unreachable.
pub const MAX_EXPANSIONS: usize = 4096;

/// Grid pathfinder. Stateless between requests; queries the collision world
/// it is handed each call.
#[derive(Debug, Clone)]
pub struct Pathfinder {
    max_expansions: usize,
}

impl Default for Pathfinder {
    fn default() -> Self {
        Self::new()
    }
}

impl Pathfinder {
    pub fn new() -> Self {
        Self {
            max_expansions: MAX_EXPANSIONS,
        }
    }

    pub fn with_max_expansions(max_expansions: usize) -> Self {
        Self { max_expansions }
    }

    /// A* from `start` to `goal` over integer-truncated cells.
    ///
    /// Returns the cells from just after the start (exclusive) to the goal
    /// (inclusive). 4-connected, unit cost per step, Manhattan heuristic —
    /// admissible and consistent, so returned paths are optimal in cost.
    /// Tie-breaking among equal-f frontier entries is heap order and only
    /// affects path shape. Blocked cells are whatever `check_collision`
    /// refuses at the probing entity's height.
    pub fn get_path(&self, world: &CollisionWorld, start: Vec3, goal: Vec3) -> Vec<IVec2> {
        let start_cell = IVec2::new(start.x as i32, start.y as i32);
        let goal_cell = IVec2::new(goal.x as i32, goal.y as i32);
        if start_cell == goal_cell {
            return Vec::new();
        }
        let probe_z = start.z;

        // Min-heap ordered by f = g + h; the insertion counter keeps
        // exploration deterministic among equal-f entries.
        let mut open: BinaryHeap<Reverse<(i32, u32, (i32, i32))>> = BinaryHeap::new();
        let mut g_score: HashMap<IVec2, i32> = HashMap::new();
        let mut came_from: HashMap<IVec2, IVec2> = HashMap::new();
        let mut counter = 0u32;

        g_score.insert(start_cell, 0);
        open.push(Reverse((
            manhattan(start_cell, goal_cell),
            counter,
            (start_cell.x, start_cell.y),
        )));

        let mut expansions = 0usize;
        while let Some(Reverse((_, _, (cx, cy)))) = open.pop() {
            let cell = IVec2::new(cx, cy);
            if cell == goal_cell {
                return reconstruct(&came_from, start_cell, goal_cell);
            }
            expansions += 1;
            if expansions > self.max_expansions {
                log::debug!(
                    "path {start_cell} -> {goal_cell} hit the expansion cap, treating as unreachable"
                );
                return Vec::new();
            }

            let Some(g_here) = g_score.get(&cell).copied() else {
                continue;
            };
            for neighbor in cardinal_neighbors(cell) {
                if is_blocked(world, neighbor, probe_z) {
                    continue;
                }
                let tentative = g_here + 1;
                if tentative < g_score.get(&neighbor).copied().unwrap_or(i32::MAX) {
                    g_score.insert(neighbor, tentative);
                    came_from.insert(neighbor, cell);
                    counter += 1;
                    open.push(Reverse((
                        tentative + manhattan(neighbor, goal_cell),
                        counter,
                        (neighbor.x, neighbor.y),
                    )));
                }
            }
        }

        // Frontier exhausted without reaching the goal: no path exists.
        Vec::new()
    }
}

/// The four cardinal neighbors; no diagonals.
fn cardinal_neighbors(cell: IVec2) -> [IVec2; 4] {
    [
        IVec2::new(cell.x - 1, cell.y),
        IVec2::new(cell.x + 1, cell.y),
        IVec2::new(cell.x, cell.y - 1),
        IVec2::new(cell.x, cell.y + 1),
    ]
}

fn manhattan(a: IVec2, b: IVec2) -> i32 {
    (a.x - b.x).abs() + (a.y - b.y).abs()
}

fn is_blocked(world: &CollisionWorld, cell: IVec2, probe_z: f32) -> bool {
    world.check_collision(
        Vec3::new(cell.x as f32, cell.y as f32, probe_z),
        DEFAULT_HALF_EXTENT,
    )
}

fn reconstruct(came_from: &HashMap<IVec2, IVec2>, start: IVec2, goal: IVec2) -> Vec<IVec2> {
    let mut path = vec![goal];
    let mut current = goal;
    while let Some(&prev) = came_from.get(&current) {
        if prev == start {
            break;
        }
        path.push(prev);
        current = prev;
    }
    path.reverse();
    path
}
