//! Grid reveal path planning
//!
//! The grid highlight wanders across neighbouring cells before landing on
//! the winning cell. The walk is purely cosmetic: the prize is already fixed
//! when the path is planned.

use crate::random::RandomSource;

/// Random-walk steps attempted before the target is appended
pub const WALK_STEPS: usize = 15;

/// Side of the smallest square grid holding `prize_count` cells
pub fn grid_side(prize_count: usize) -> usize {
    let mut side = 0;
    while side * side < prize_count {
        side += 1;
    }
    side
}

/// 8-connected neighbours of `index` in a square grid of `cell_count` cells
///
/// Row-major order, excluding `index` itself and anything past the end of a
/// partially filled grid.
pub fn neighbors(index: usize, cell_count: usize) -> Vec<usize> {
    let side = grid_side(cell_count);
    if side == 0 || index >= cell_count {
        return Vec::new();
    }
    let row = index / side;
    let col = index % side;

    let mut out = Vec::with_capacity(8);
    for r in row.saturating_sub(1)..=(row + 1).min(side - 1) {
        for c in col.saturating_sub(1)..=(col + 1).min(side - 1) {
            let candidate = r * side + c;
            if candidate != index && candidate < cell_count {
                out.push(candidate);
            }
        }
    }
    out
}

/// Builds highlight sequences ending on a target cell
#[derive(Debug, Clone, Copy)]
pub struct RevealPathPlanner {
    walk_steps: usize,
}

impl Default for RevealPathPlanner {
    fn default() -> Self {
        Self {
            walk_steps: WALK_STEPS,
        }
    }
}

impl RevealPathPlanner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_walk_steps(walk_steps: usize) -> Self {
        Self { walk_steps }
    }

    pub fn walk_steps(&self) -> usize {
        self.walk_steps
    }

    /// Plan a path over `cell_count` cells that ends on `target_index`
    ///
    /// Starts on a uniformly random cell and walks to uniformly chosen
    /// neighbours. A cell is recorded only the first time it is entered, so
    /// the path holds no duplicates except possibly the final target. The
    /// target is always the last element.
    pub fn plan(
        &self,
        cell_count: usize,
        target_index: usize,
        rng: &mut dyn RandomSource,
    ) -> Vec<usize> {
        if cell_count == 0 {
            return vec![target_index];
        }

        let mut visited = vec![false; cell_count];
        let mut path = Vec::with_capacity(self.walk_steps + 1);
        let mut current = rng.next_index(cell_count);

        for _ in 0..self.walk_steps {
            if !visited[current] {
                visited[current] = true;
                path.push(current);
            }

            let options = neighbors(current, cell_count);
            if !options.is_empty() {
                current = options[rng.next_index(options.len())];
            }
        }

        path.push(target_index);
        log::trace!("Reveal path over {} cells: {:?}", cell_count, path);
        path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::random::{ScriptedRandom, SystemRandom};
    use std::collections::HashSet;

    fn touching(a: usize, b: usize, side: usize) -> bool {
        let (ra, ca) = (a / side, a % side);
        let (rb, cb) = (b / side, b % side);
        a != b && ra.abs_diff(rb) <= 1 && ca.abs_diff(cb) <= 1
    }

    #[test]
    fn test_grid_side() {
        assert_eq!(grid_side(0), 0);
        assert_eq!(grid_side(1), 1);
        assert_eq!(grid_side(4), 2);
        assert_eq!(grid_side(5), 3);
        assert_eq!(grid_side(8), 3);
        assert_eq!(grid_side(9), 3);
        assert_eq!(grid_side(10), 4);
    }

    #[test]
    fn test_neighbors() {
        assert_eq!(neighbors(4, 9), vec![0, 1, 2, 3, 5, 6, 7, 8]);
        assert_eq!(neighbors(0, 9), vec![1, 3, 4]);
        assert_eq!(neighbors(8, 9), vec![4, 5, 7]);
        assert_eq!(neighbors(3, 5), vec![0, 1, 4]);
        assert!(neighbors(0, 1).is_empty());
        assert!(neighbors(9, 9).is_empty());
    }

    #[test]
    fn test_path_invariants() {
        let planner = RevealPathPlanner::new();
        let mut rng = SystemRandom::seeded(11);
        for n in [4usize, 9, 16] {
            for target in 0..n {
                for _ in 0..20 {
                    let path = planner.plan(n, target, &mut rng);
                    assert_eq!(*path.last().unwrap(), target);
                    assert!(path.len() <= WALK_STEPS + 1);
                    assert!(path.iter().all(|&c| c < n));

                    let walk = &path[..path.len() - 1];
                    let unique: HashSet<_> = walk.iter().collect();
                    assert_eq!(unique.len(), walk.len());
                }
            }
        }
    }

    #[test]
    fn test_walk_follows_neighbours() {
        // start 0.0 → cell 0; neighbours [1, 3, 4], 0.9 → 4;
        // neighbours of 4 are the other eight cells, 0.9 → 8
        let mut rng = ScriptedRandom::new(vec![0.0, 0.9, 0.9]);
        let path = RevealPathPlanner::with_walk_steps(3).plan(9, 2, &mut rng);
        assert_eq!(path, vec![0, 4, 8, 2]);
        assert!(touching(0, 4, 3));
        assert!(touching(4, 8, 3));
    }

    #[test]
    fn test_single_cell_stays_put() {
        let mut rng = SystemRandom::seeded(5);
        let path = RevealPathPlanner::new().plan(1, 0, &mut rng);
        assert_eq!(path, vec![0, 0]);
    }

    #[test]
    fn test_target_may_repeat_at_end() {
        // 2x2 walk 0 → 3 → 2 → 0; target 0 was already recorded
        let mut rng = ScriptedRandom::new(vec![0.0, 0.9, 0.9]);
        let path = RevealPathPlanner::with_walk_steps(4).plan(4, 0, &mut rng);
        assert_eq!(*path.last().unwrap(), 0);
        assert_eq!(path.iter().filter(|&&c| c == 0).count(), 2);
    }
}
