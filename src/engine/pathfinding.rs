// Tile pathfinding: 4-connected, unit-cost A* with a Manhattan heuristic.
//
// Manhattan distance is admissible and consistent for unit-cost cardinal
// moves, so the first time the goal is popped its path is optimal. Ties
// between equal f-scores are resolved by the heap's ordering of the tile
// index; any order yields an optimal path.
//
// Searches run to completion synchronously. On the 24 x 24 arena that is a
// few hundred node expansions at most.

use glam::IVec2;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use super::map::GridMap;

/// Ordered tiles from start to goal, both inclusive. Empty = no path.
pub type Path = Vec<IVec2>;

const NO_PARENT: usize = usize::MAX;

#[inline]
fn manhattan(a: IVec2, b: IVec2) -> u32 {
    ((a.x - b.x).abs() + (a.y - b.y).abs()) as u32
}

/// The four cardinal neighbours of a tile that are walkable.
fn walkable_neighbors(map: &GridMap, tile: IVec2) -> impl Iterator<Item = IVec2> + '_ {
    [IVec2::X, IVec2::NEG_X, IVec2::Y, IVec2::NEG_Y]
        .into_iter()
        .map(move |d| tile + d)
        .filter(move |&n| map.is_walkable(n))
}

/// Shortest 4-connected path from `start` to `goal`.
///
/// Returns an empty path if either end is out of bounds or not walkable,
/// or if the goal cannot be reached.
pub fn find_path(map: &GridMap, start: IVec2, goal: IVec2) -> Path {
    if !map.is_walkable(start) || !map.is_walkable(goal) {
        return Vec::new();
    }

    let n = map.tile_count();
    let mut g_score = vec![u32::MAX; n];
    let mut came_from = vec![NO_PARENT; n];
    let mut closed = vec![false; n];

    // Min-heap on (f, tile index).
    let mut open = BinaryHeap::new();

    let start_idx = map.index_of(start);
    let goal_idx = map.index_of(goal);
    g_score[start_idx] = 0;
    open.push(Reverse((manhattan(start, goal), start_idx)));

    while let Some(Reverse((_, idx))) = open.pop() {
        if closed[idx] {
            continue;
        }
        closed[idx] = true;

        if idx == goal_idx {
            return reconstruct(map, &came_from, idx);
        }

        let tile = map.tile_of_index(idx);
        let tentative = g_score[idx] + 1;
        for nb in walkable_neighbors(map, tile) {
            let ni = map.index_of(nb);
            if closed[ni] || tentative >= g_score[ni] {
                continue;
            }
            came_from[ni] = idx;
            g_score[ni] = tentative;
            open.push(Reverse((tentative + manhattan(nb, goal), ni)));
        }
    }

    Vec::new()
}

/// Walk the predecessor chain back from `end` and reverse it.
fn reconstruct(map: &GridMap, came_from: &[usize], end: usize) -> Path {
    let mut path = Vec::new();
    let mut idx = end;
    while idx != NO_PARENT {
        path.push(map.tile_of_index(idx));
        idx = came_from[idx];
    }
    path.reverse();
    path
}

/// Closest walkable tile to `tile`, searching Manhattan rings of growing
/// radius up to `max_radius`. Returns `tile` unchanged if nothing is found.
pub fn nearest_walkable(map: &GridMap, tile: IVec2, max_radius: i32) -> IVec2 {
    if map.is_walkable(tile) {
        return tile;
    }
    for r in 1..=max_radius {
        // Walk the ring |dx| + |dy| == r.
        for dx in -r..=r {
            let dy = r - dx.abs();
            for cand in [tile + IVec2::new(dx, dy), tile + IVec2::new(dx, -dy)] {
                if map.is_walkable(cand) {
                    return cand;
                }
            }
        }
    }
    tile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::open_room;

    fn assert_connected(path: &Path) {
        for pair in path.windows(2) {
            assert_eq!(manhattan(pair[0], pair[1]), 1, "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn path_to_self_is_single_tile() {
        let map = open_room(8, 8);
        let a = IVec2::new(3, 3);
        assert_eq!(find_path(&map, a, a), vec![a]);
    }

    #[test]
    fn unwalkable_or_out_of_bounds_ends_give_empty_path() {
        let map = open_room(8, 8);
        let floor = IVec2::new(3, 3);
        assert!(find_path(&map, IVec2::new(0, 3), floor).is_empty());
        assert!(find_path(&map, floor, IVec2::new(7, 7)).is_empty());
        assert!(find_path(&map, IVec2::new(-1, 3), floor).is_empty());
        assert!(find_path(&map, floor, IVec2::new(3, 99)).is_empty());
    }

    #[test]
    fn straight_corridor_length_is_manhattan_plus_one() {
        let map = open_room(12, 8);
        let (a, b) = (IVec2::new(1, 4), IVec2::new(10, 4));
        let path = find_path(&map, a, b);
        assert_eq!(path.len(), 10);
        assert_eq!(path.first(), Some(&a));
        assert_eq!(path.last(), Some(&b));
        assert_connected(&path);

        let (c, d) = (IVec2::new(5, 1), IVec2::new(5, 6));
        assert_eq!(find_path(&map, c, d).len(), 6);
    }

    #[test]
    fn path_runs_from_start_to_goal_around_walls() {
        let rows = [
            "#######",
            "#.....#",
            "#####.#",
            "#.....#",
            "#######",
        ];
        let map = GridMap::from_rows(7, 5, &rows).unwrap();
        let (start, goal) = (IVec2::new(1, 1), IVec2::new(1, 3));
        let path = find_path(&map, start, goal);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        // Must go round through (5, 2): 4 east, 2 south, 4 west.
        assert_eq!(path.len(), 11);
        assert!(path.contains(&IVec2::new(5, 2)));
        assert_connected(&path);
        assert!(path.iter().all(|&t| map.is_walkable(t)));
    }

    #[test]
    fn unreachable_goal_gives_empty_path() {
        let rows = ["#####", "#.#.#", "#####"];
        let map = GridMap::from_rows(5, 3, &rows).unwrap();
        assert!(find_path(&map, IVec2::new(1, 1), IVec2::new(3, 1)).is_empty());
    }

    #[test]
    fn optimal_on_reference_level() {
        let map = GridMap::reference().unwrap();
        // The x = 22 corridor cuts through the wall block on rows 6..8.
        let path = find_path(&map, IVec2::new(22, 1), IVec2::new(22, 9));
        assert_eq!(path.len(), 9);
        assert_connected(&path);
    }

    #[test]
    fn nearest_walkable_searches_rings() {
        let map = open_room(8, 8);
        assert_eq!(nearest_walkable(&map, IVec2::new(3, 3), 4), IVec2::new(3, 3));
        let near = nearest_walkable(&map, IVec2::new(0, 3), 4);
        assert_eq!(near, IVec2::new(1, 3));
        // Corner wall: nearest floor is diagonal, two steps away.
        let corner = nearest_walkable(&map, IVec2::new(0, 0), 4);
        assert_eq!(manhattan(corner, IVec2::new(0, 0)), 2);
        assert!(map.is_walkable(corner));
        // Too far: unchanged.
        assert_eq!(nearest_walkable(&map, IVec2::new(-10, -10), 3), IVec2::new(-10, -10));
    }
}
