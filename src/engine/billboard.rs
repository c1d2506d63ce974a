// Billboard sprites for agents, depth-tested against the wall depth buffer.
//
// Each agent is transformed into camera space:
//   forward = offset · camera.forward()     (distance along the view axis)
//   lateral = offset · camera.right()
// and projected with the same column mapping the ray caster uses, so a
// sprite standing in front of a wall lines up with that wall's columns.

use bevy_ecs::entity::Entity;
use glam::Vec2;
use super::agents::AgentSnapshot;
use super::components::SpriteKind;
use super::framebuffer::FrameBuffer;
use super::raycast::{Camera, DepthBuffer};
use super::texture::{SLOT_SIZE, TARGET_SLOT, TextureAtlas, WALKER_SLOT};

/// Sprites closer than this are not drawn (they would fill the screen).
pub const MIN_SPRITE_DIST: f32 = 0.1;

impl SpriteKind {
    pub fn atlas_slot(self) -> u32 {
        match self {
            SpriteKind::Walker => WALKER_SLOT,
            SpriteKind::Target => TARGET_SLOT,
        }
    }
}

/// Screen-space rectangle of one sprite. Edges are unclipped.
#[derive(Debug, Clone, Copy)]
pub struct SpriteProjection {
    /// Distance along the camera's forward axis.
    pub forward: f32,
    pub center_x: f32,
    /// Side length in pixels (sprites are square).
    pub size: f32,
    pub left: f32,
    pub right: f32,
    pub top: f32,
    pub bottom: f32,
}

impl SpriteProjection {
    /// First and one-past-last visible column.
    pub fn column_range(&self, screen_width: u32) -> (u32, u32) {
        let l = self.left.max(0.0) as u32;
        let r = self.right.min(screen_width as f32).max(0.0) as u32;
        (l, r.max(l))
    }

    /// True for exactly the columns `draw_billboards` draws.
    pub fn covers_column(&self, x: u32, screen_width: u32) -> bool {
        let (l, r) = self.column_range(screen_width);
        x >= l && x < r
    }
}

/// Project a world position. `None` if it is behind (or at) the camera.
pub fn project_agent(camera: &Camera, pos: Vec2, width: u32, height: u32) -> Option<SpriteProjection> {
    let offset = pos - camera.pos;
    let forward = offset.dot(camera.forward());
    if forward <= MIN_SPRITE_DIST {
        return None;
    }
    let lateral = offset.dot(camera.right());

    let center_x = width as f32 * 0.5 * (1.0 + lateral / (forward * camera.plane_half));
    let (top, bottom) = camera.vertical_span(forward, height);
    let size = bottom - top;

    Some(SpriteProjection {
        forward,
        center_x,
        size,
        left: center_x - size * 0.5,
        right: center_x + size * 0.5,
        top,
        bottom,
    })
}

/// Draw every agent, far to near, skipping columns hidden by walls and
/// color-keyed (near-white) texels.
pub fn draw_billboards(
    frame: &mut FrameBuffer,
    depth: &DepthBuffer,
    atlas: &TextureAtlas,
    camera: &Camera,
    agents: &[AgentSnapshot],
) {
    let (width, height) = (frame.width, frame.height);

    let mut visible: Vec<(SpriteProjection, SpriteKind)> = agents
        .iter()
        .filter_map(|a| project_agent(camera, a.pos, width, height).map(|p| (p, a.sprite)))
        .collect();
    visible.sort_by(|a, b| b.0.forward.total_cmp(&a.0.forward));

    for (proj, kind) in visible {
        let slot = kind.atlas_slot();
        let (x0, x1) = proj.column_range(width);
        let y0 = proj.top.max(0.0) as u32;
        let y1 = proj.bottom.min(height as f32).max(0.0) as u32;
        let texel = SLOT_SIZE as f32 / proj.size;

        for x in x0..x1 {
            if proj.forward >= depth.get(x) {
                continue;
            }
            let u = ((x as f32 - proj.left) * texel) as u32;
            for y in y0..y1 {
                let v = ((y as f32 - proj.top) * texel) as u32;
                let color = atlas.sample_slot(slot, u, v);
                if !color.is_color_key() {
                    frame.set(x, y, color);
                }
            }
        }
    }
}

/// Nearest agent whose sprite spans column `x` in front of the wall there.
pub fn pick_agent_at_column(
    camera: &Camera,
    wall_dist: f32,
    agents: &[AgentSnapshot],
    x: u32,
    width: u32,
    height: u32,
) -> Option<Entity> {
    agents
        .iter()
        .filter_map(|a| project_agent(camera, a.pos, width, height).map(|p| (p, a.entity)))
        .filter(|(p, _)| p.covers_column(x, width) && p.forward < wall_dist)
        .min_by(|a, b| a.0.forward.total_cmp(&b.0.forward))
        .map(|(_, e)| e)
}
