// Texture atlas: one square image split into fixed-size slots.
//
// Layout (slot index → position, 4 slots per row):
//   0..8   wall textures, in `WallTexture` order
//   8      walker sprite
//   9      target sprite
//
// Image decoding is not done here; the game builds the atlas procedurally
// from a handful of pattern functions.

use glam::UVec2;
use super::framebuffer::Rgba;
use super::map::WallTexture;

/// Side length of the whole atlas in pixels.
pub const ATLAS_SIZE: u32 = 512;
/// Side length of one slot in pixels.
pub const SLOT_SIZE: u32 = 128;
const SLOTS_PER_ROW: u32 = ATLAS_SIZE / SLOT_SIZE;

pub const WALKER_SLOT: u32 = 8;
pub const TARGET_SLOT: u32 = 9;

pub struct TextureAtlas {
    size: u32,
    pixels: Vec<Rgba>,
}

impl TextureAtlas {
    /// Pixel lookup; coordinates wrap around the atlas edge.
    #[inline]
    pub fn color_at(&self, x: u32, y: u32) -> Rgba {
        let x = x % self.size;
        let y = y % self.size;
        self.pixels[(y * self.size + x) as usize]
    }

    /// Top-left pixel of a slot.
    pub fn slot_origin(slot: u32) -> UVec2 {
        UVec2::new((slot % SLOTS_PER_ROW) * SLOT_SIZE, (slot / SLOTS_PER_ROW) * SLOT_SIZE)
    }

    /// Sample inside a slot with slot-local coordinates in [0, SLOT_SIZE).
    #[inline]
    pub fn sample_slot(&self, slot: u32, u: u32, v: u32) -> Rgba {
        let o = Self::slot_origin(slot);
        self.color_at(o.x + u.min(SLOT_SIZE - 1), o.y + v.min(SLOT_SIZE - 1))
    }

    /// Build the default atlas: simple patterns per wall plus two sprites on
    /// a white (color-keyed) background.
    pub fn procedural() -> Self {
        let mut atlas = Self {
            size: ATLAS_SIZE,
            pixels: vec![Rgba::WHITE; (ATLAS_SIZE * ATLAS_SIZE) as usize],
        };
        for tex in WallTexture::ALL {
            atlas.paint_slot(tex.slot(), |u, v| wall_pattern(tex, u, v));
        }
        atlas.paint_slot(WALKER_SLOT, walker_pattern);
        atlas.paint_slot(TARGET_SLOT, target_pattern);
        atlas
    }

    fn paint_slot(&mut self, slot: u32, f: impl Fn(u32, u32) -> Rgba) {
        let o = Self::slot_origin(slot);
        for v in 0..SLOT_SIZE {
            for u in 0..SLOT_SIZE {
                let idx = ((o.y + v) * self.size + o.x + u) as usize;
                self.pixels[idx] = f(u, v);
            }
        }
    }
}

// ============================================================================
// PATTERNS
// ============================================================================

fn wall_pattern(tex: WallTexture, u: u32, v: u32) -> Rgba {
    match tex {
        WallTexture::Smiley => {
            let (dx, dy) = (u as i32 - 64, v as i32 - 64);
            let d2 = dx * dx + dy * dy;
            let eye = |ex: i32| (u as i32 - ex).pow(2) + (v as i32 - 48).pow(2) < 64;
            let mouth = d2 > 28 * 28 && d2 < 36 * 36 && v > 70;
            if eye(46) || eye(82) || mouth {
                Rgba::rgb(40, 30, 0)
            } else if d2 < 56 * 56 {
                Rgba::rgb(240, 210, 40)
            } else {
                Rgba::rgb(90, 60, 120)
            }
        }
        WallTexture::Red => brick(u, v, Rgba::rgb(170, 40, 30), Rgba::rgb(120, 110, 100)),
        WallTexture::Bush => {
            let n = hash(u / 8, v / 8) % 60;
            Rgba::rgb(20 + n as u8 / 2, 100 + n as u8, 30)
        }
        WallTexture::Sky => {
            let cloud = hash(u / 16, v / 16) % 5 == 0;
            if cloud { Rgba::rgb(230, 235, 239) } else { Rgba::rgb(90, 150, 220 - (v / 4) as u8) }
        }
        WallTexture::Pink => brick(u, v, Rgba::rgb(220, 120, 170), Rgba::rgb(150, 80, 110)),
        WallTexture::Wallpaper => {
            if (u / 16) % 2 == 0 { Rgba::rgb(180, 160, 110) } else { Rgba::rgb(150, 120, 80) }
        }
        WallTexture::Dirt => {
            let n = hash(u / 4, v / 4) % 40;
            Rgba::rgb(110 + n as u8, 75 + n as u8 / 2, 40)
        }
        WallTexture::Exit => {
            let frame = u < 8 || u >= 120 || v < 8;
            if frame { Rgba::rgb(60, 60, 60) } else { Rgba::rgb(30, 180, 60) }
        }
    }
}

fn brick(u: u32, v: u32, body: Rgba, mortar: Rgba) -> Rgba {
    let row = v / 16;
    let offset = if row % 2 == 0 { 0 } else { 16 };
    if v % 16 < 2 || (u + offset) % 32 < 2 { mortar } else { body }
}

fn walker_pattern(u: u32, v: u32) -> Rgba {
    let (dx, dy) = (u as i32 - 64, v as i32 - 70);
    if dx * dx + dy * dy > 52 * 52 {
        return Rgba::WHITE;
    }
    let eye = |ex: i32| (u as i32 - ex).pow(2) + (v as i32 - 55).pow(2) < 100;
    if eye(44) || eye(84) {
        Rgba::rgb(255, 230, 0)
    } else {
        Rgba::rgb(150, 20, 30)
    }
}

fn target_pattern(u: u32, v: u32) -> Rgba {
    let (dx, dy) = (u as i32 - 64, v as i32 - 64);
    let d = ((dx * dx + dy * dy) as f32).sqrt() as u32;
    match d {
        0..12 => Rgba::rgb(200, 0, 0),
        12..24 => Rgba::rgb(20, 20, 20),
        24..36 => Rgba::rgb(200, 0, 0),
        36..48 => Rgba::rgb(20, 20, 20),
        48..60 => Rgba::rgb(200, 0, 0),
        _ => Rgba::WHITE,
    }
}

/// Cheap deterministic per-cell noise.
fn hash(x: u32, y: u32) -> u32 {
    let mut h = x.wrapping_mul(374_761_393) ^ y.wrapping_mul(668_265_263);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    h ^ (h >> 16)
}
