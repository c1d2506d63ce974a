// Axis-aligned box vs. tile-grid occupancy.
//
// The probe is discrete: it tests the box at its destination only, so a
// very large per-frame step can skip over a one-tile wall. Player and walker
// speeds are low enough that a step never exceeds a tile at normal frame rates.

use glam::{IVec2, Vec2};
use super::map::GridMap;

/// True if a box centered at `center` fits entirely inside the map and every
/// tile it overlaps is walkable.
pub fn can_occupy(map: &GridMap, center: Vec2, half_extents: Vec2) -> bool {
    let min = center - half_extents;
    let max = center + half_extents;

    if min.x < 0.0 || min.y < 0.0 || max.x >= map.width() as f32 || max.y >= map.height() as f32 {
        return false;
    }

    // A box can span several tiles; check every one.
    let lo = min.floor().as_ivec2();
    let hi = max.floor().as_ivec2();
    for y in lo.y..=hi.y {
        for x in lo.x..=hi.x {
            if !map.is_walkable(IVec2::new(x, y)) {
                return false;
            }
        }
    }
    true
}

/// Move `pos` by `delta`, sliding along walls.
///
/// Tries the full move first, then x-only, then y-only. Returns the new
/// position, which equals `pos` when every option is blocked.
pub fn slide_move(map: &GridMap, pos: Vec2, delta: Vec2, half_extents: Vec2) -> Vec2 {
    if delta == Vec2::ZERO {
        return pos;
    }
    let full = pos + delta;
    if can_occupy(map, full, half_extents) {
        return full;
    }
    let x_only = Vec2::new(pos.x + delta.x, pos.y);
    if delta.x != 0.0 && can_occupy(map, x_only, half_extents) {
        return x_only;
    }
    let y_only = Vec2::new(pos.x, pos.y + delta.y);
    if delta.y != 0.0 && can_occupy(map, y_only, half_extents) {
        return y_only;
    }
    pos
}
