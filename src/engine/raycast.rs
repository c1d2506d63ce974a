// Column ray caster (DDA grid traversal).
//
// One ray per screen column. Each ray walks the grid one tile boundary at a
// time until it enters a wall tile; the distance to that boundary, projected
// onto the view direction, gives the column's wall height and its depth.
//
// Camera model:
//   forward = (cos a, sin a), right = (-sin a, cos a)   (y grows downward)
//   ray(cam_x) = forward + right * plane_half * cam_x,   cam_x in [-1, 1)
// Because rays are not normalized, the DDA side distances are already the
// perpendicular (fish-eye free) distance.

use glam::{IVec2, Vec2};
use super::framebuffer::{FrameBuffer, Rgba};
use super::map::{GridMap, TileKind, WallTexture};
use super::texture::{SLOT_SIZE, TextureAtlas};

/// Smallest distance ever reported; keeps `height / dist` finite.
pub const MIN_WALL_DIST: f32 = 1e-4;
/// Stand-in for 1/0 when a ray component is (near) zero.
const HUGE: f32 = 1e30;
const DIR_EPSILON: f32 = 1e-8;

const CEILING_COLOR: Rgba = Rgba::rgb(48, 52, 64);
const FLOOR_COLOR: Rgba = Rgba::rgb(84, 76, 66);

// ============================================================================
// CAMERA
// ============================================================================

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub pos: Vec2,
    /// View direction in radians; 0 looks along +x.
    pub angle: f32,
    /// tan(fov / 2).
    pub plane_half: f32,
    /// Eye height as a fraction of the wall height.
    pub eye_height: f32,
}

impl Camera {
    pub fn forward(&self) -> Vec2 {
        Vec2::from_angle(self.angle)
    }

    pub fn right(&self) -> Vec2 {
        self.forward().perp()
    }

    /// Camera-space offset for screen column `x` of a `width`-wide screen.
    #[inline]
    pub fn column_offset(x: u32, width: u32) -> f32 {
        2.0 * x as f32 / width as f32 - 1.0
    }

    /// Screen rows covered by a wall (or sprite) of unit height at `dist`.
    /// Returns unclipped (top, bottom) in pixels.
    pub fn vertical_span(&self, dist: f32, screen_height: u32) -> (f32, f32) {
        let h = screen_height as f32;
        let line = h / dist;
        let horizon = h * 0.5;
        (horizon - line * (1.0 - self.eye_height), horizon + line * self.eye_height)
    }
}

// ============================================================================
// DEPTH BUFFER
// ============================================================================

/// Perpendicular wall distance per screen column, rewritten every frame.
pub struct DepthBuffer {
    columns: Vec<f32>,
}

impl DepthBuffer {
    pub fn new(width: u32) -> Self {
        Self { columns: vec![f32::INFINITY; width as usize] }
    }

    pub fn reset(&mut self) {
        self.columns.fill(f32::INFINITY);
    }

    #[inline]
    pub fn get(&self, x: u32) -> f32 {
        self.columns.get(x as usize).copied().unwrap_or(f32::INFINITY)
    }

    #[inline]
    pub fn set(&mut self, x: u32, dist: f32) {
        if let Some(d) = self.columns.get_mut(x as usize) {
            *d = dist;
        }
    }
}

// ============================================================================
// SINGLE RAY
// ============================================================================

/// Which kind of grid line the ray crossed last.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    /// Crossed a vertical line (x = const): east/west face.
    X,
    /// Crossed a horizontal line (y = const): north/south face. Drawn darker.
    Y,
}

#[derive(Debug, Clone, Copy)]
pub struct RayHit {
    pub perp_dist: f32,
    pub side: Side,
    /// Fractional hit position along the wall face, in [0, 1).
    pub wall_x: f32,
    pub tile: IVec2,
    /// `None` when the ray left the map without hitting a wall.
    pub texture: Option<WallTexture>,
    pub ray_dir: Vec2,
}

impl RayHit {
    /// Horizontal texel column inside the wall's atlas slot.
    pub fn texture_column(&self) -> u32 {
        let mut tex_x = ((self.wall_x * SLOT_SIZE as f32) as u32).min(SLOT_SIZE - 1);
        // Mirror so textures read left-to-right from every viewing side.
        if (self.side == Side::X && self.ray_dir.x > 0.0)
            || (self.side == Side::Y && self.ray_dir.y < 0.0)
        {
            tex_x = SLOT_SIZE - tex_x - 1;
        }
        tex_x
    }
}

#[inline]
fn inv_abs(d: f32) -> f32 {
    if d.abs() < DIR_EPSILON { HUGE } else { (1.0 / d).abs() }
}

/// Cast the ray for camera-space offset `cam_x`.
pub fn cast_ray(map: &GridMap, camera: &Camera, cam_x: f32) -> RayHit {
    let pos = camera.pos;
    let ray_dir = camera.forward() + camera.right() * (camera.plane_half * cam_x);

    let mut tile = IVec2::new(pos.x.floor() as i32, pos.y.floor() as i32);
    let delta = Vec2::new(inv_abs(ray_dir.x), inv_abs(ray_dir.y));

    let (step_x, mut side_x) = if ray_dir.x < 0.0 {
        (-1, (pos.x - tile.x as f32) * delta.x)
    } else {
        (1, (tile.x as f32 + 1.0 - pos.x) * delta.x)
    };
    let (step_y, mut side_y) = if ray_dir.y < 0.0 {
        (-1, (pos.y - tile.y as f32) * delta.y)
    } else {
        (1, (tile.y as f32 + 1.0 - pos.y) * delta.y)
    };

    let mut side;
    let texture = loop {
        if side_x < side_y {
            side_x += delta.x;
            tile.x += step_x;
            side = Side::X;
        } else {
            side_y += delta.y;
            tile.y += step_y;
            side = Side::Y;
        }
        match map.tile_at(tile) {
            Ok(TileKind::Wall(tex)) => break Some(tex),
            Ok(TileKind::Floor) => {}
            Err(_) => break None,
        }
    };

    let perp_dist = match side {
        Side::X => side_x - delta.x,
        Side::Y => side_y - delta.y,
    }
    .max(MIN_WALL_DIST);

    let hit_along = match side {
        Side::X => pos.y + perp_dist * ray_dir.y,
        Side::Y => pos.x + perp_dist * ray_dir.x,
    };

    RayHit {
        perp_dist,
        side,
        wall_x: hit_along - hit_along.floor(),
        tile,
        texture,
        ray_dir,
    }
}

// ============================================================================
// FULL SWEEP
// ============================================================================

/// Draw ceiling, walls and floor for every column and refill `depth`.
pub fn render_walls(
    frame: &mut FrameBuffer,
    depth: &mut DepthBuffer,
    map: &GridMap,
    atlas: &TextureAtlas,
    camera: &Camera,
    side_shade: f32,
) {
    let (width, height) = (frame.width, frame.height);
    depth.reset();

    for x in 0..width {
        let hit = cast_ray(map, camera, Camera::column_offset(x, width));
        depth.set(x, hit.perp_dist);

        let (wall_top, wall_bottom) = camera.vertical_span(hit.perp_dist, height);
        let draw_start = wall_top.max(0.0) as u32;
        let draw_end = (wall_bottom.min(height as f32) as u32).max(draw_start);

        frame.fill_column(x, 0, draw_start, CEILING_COLOR);
        frame.fill_column(x, draw_end, height, FLOOR_COLOR);

        let Some(tex) = hit.texture else {
            frame.fill_column(x, draw_start, draw_end, Rgba::BLACK);
            continue;
        };

        let tex_x = hit.texture_column();
        let shade = if hit.side == Side::Y { side_shade } else { 1.0 };

        // Step through texture rows at a fixed rate, starting where the
        // visible part of the wall begins.
        let step = SLOT_SIZE as f32 / (wall_bottom - wall_top);
        let mut tex_pos = (draw_start as f32 - wall_top) * step;
        for y in draw_start..draw_end {
            let tex_y = (tex_pos as u32).min(SLOT_SIZE - 1);
            tex_pos += step;
            let color = atlas.sample_slot(tex.slot(), tex_x, tex_y);
            frame.set(x, y, if shade < 1.0 { color.shaded(shade) } else { color });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::map::open_room;
    use std::f32::consts::FRAC_PI_2;

    fn camera(pos: Vec2, angle: f32) -> Camera {
        Camera { pos, angle, plane_half: 0.66, eye_height: 0.5 }
    }

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-3
    }

    #[test]
    fn straight_ray_reports_axis_distance() {
        // Walls at x = 0 and x = 10.
        let map = open_room(11, 11);
        let hit = cast_ray(&map, &camera(Vec2::new(5.5, 5.5), 0.0), 0.0);
        assert!(approx(hit.perp_dist, 4.5), "{}", hit.perp_dist);
        assert_eq!(hit.side, Side::X);
        assert_eq!(hit.tile, IVec2::new(10, 5));
        assert!(approx(hit.wall_x, 0.5));
        assert_eq!(hit.texture, Some(WallTexture::Pink));
    }

    #[test]
    fn flat_wall_has_constant_depth_across_columns() {
        let map = open_room(11, 11);
        let cam = camera(Vec2::new(5.5, 5.5), 0.0);
        for cam_x in [-0.9, -0.5, -0.1, 0.3, 0.8] {
            let hit = cast_ray(&map, &cam, cam_x);
            assert_eq!(hit.side, Side::X);
            assert!(approx(hit.perp_dist, 4.5), "cam_x {cam_x}: {}", hit.perp_dist);
        }
    }

    #[test]
    fn looking_down_hits_a_y_side() {
        let map = open_room(11, 11);
        let hit = cast_ray(&map, &camera(Vec2::new(5.5, 2.5), FRAC_PI_2), 0.0);
        assert_eq!(hit.side, Side::Y);
        assert_eq!(hit.tile, IVec2::new(5, 10));
        assert!(approx(hit.perp_dist, 7.5));
    }

    #[test]
    fn distance_is_clamped_when_touching_a_wall() {
        let map = open_room(11, 11);
        let hit = cast_ray(&map, &camera(Vec2::new(9.99999, 5.5), 0.0), 0.0);
        assert!(hit.perp_dist >= MIN_WALL_DIST);
    }

    #[test]
    fn texture_column_is_mirrored_per_side() {
        let map = open_room(11, 11);
        // 0.3 * 128 = 38.4: away from a texel boundary, so the sin(PI)
        // error on the west ray cannot change the truncated column.
        let east = cast_ray(&map, &camera(Vec2::new(5.5, 5.3), 0.0), 0.0);
        let west = cast_ray(&map, &camera(Vec2::new(5.5, 5.3), std::f32::consts::PI), 0.0);
        assert!(approx(east.wall_x, 0.3) && approx(west.wall_x, 0.3));
        assert_eq!(west.texture_column(), 38);
        assert_eq!(east.texture_column(), SLOT_SIZE - 38 - 1);
    }

    #[test]
    fn sweep_fills_depth_and_bands() {
        let map = open_room(11, 11);
        let atlas = TextureAtlas::procedural();
        let cam = camera(Vec2::new(5.5, 5.5), 0.0);
        let mut frame = FrameBuffer::new(64, 100);
        let mut depth = DepthBuffer::new(64);
        render_walls(&mut frame, &mut depth, &map, &atlas, &cam, 0.7);

        assert!(depth.get(64).is_infinite());
        for x in 0..64 {
            let expected = cast_ray(&map, &cam, Camera::column_offset(x, 64)).perp_dist;
            assert_eq!(depth.get(x), expected);
        }
        // 100 / 4.5 ≈ 22 px of wall around the horizon; ceiling above, floor below.
        assert_eq!(frame.get(32, 0), Some(CEILING_COLOR));
        assert_eq!(frame.get(32, 99), Some(FLOOR_COLOR));
        assert_ne!(frame.get(32, 50), Some(CEILING_COLOR));
        assert_ne!(frame.get(32, 50), Some(FLOOR_COLOR));
    }

    #[test]
    fn y_sides_are_shaded() {
        // Pink brick: body r = 220, mortar r = 150. Halved, both drop below 128.
        let map = open_room(11, 11);
        let atlas = TextureAtlas::procedural();
        let mut frame = FrameBuffer::new(16, 100);
        let mut depth = DepthBuffer::new(16);

        render_walls(&mut frame, &mut depth, &map, &atlas, &camera(Vec2::new(5.5, 5.5), 0.0), 0.5);
        assert!(frame.get(8, 50).unwrap().r >= 150);

        render_walls(&mut frame, &mut depth, &map, &atlas, &camera(Vec2::new(5.5, 5.5), FRAC_PI_2), 0.5);
        assert!(frame.get(8, 50).unwrap().r < 128);
    }
}
