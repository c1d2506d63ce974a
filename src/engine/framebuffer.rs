// CPU-side RGBA frame, uploaded to a GPU texture once per frame by main.rs.

/// One 8-bit-per-channel pixel. Byte layout matches `Rgba8UnormSrgb`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba {
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// Multiply RGB by `f` (clamped to [0, 1]); alpha untouched.
    pub fn shaded(self, f: f32) -> Self {
        let f = f.clamp(0.0, 1.0);
        Self {
            r: (self.r as f32 * f) as u8,
            g: (self.g as f32 * f) as u8,
            b: (self.b as f32 * f) as u8,
            a: self.a,
        }
    }

    /// Color key used by sprite sheets: near-white means transparent.
    pub fn is_color_key(self) -> bool {
        self.r >= 240 && self.g >= 240 && self.b >= 240
    }
}

pub struct FrameBuffer {
    pub width: u32,
    pub height: u32,
    pixels: Vec<Rgba>,
}

impl FrameBuffer {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![Rgba::BLACK; (width * height) as usize],
        }
    }

    #[inline]
    pub fn set(&mut self, x: u32, y: u32, color: Rgba) {
        if x < self.width && y < self.height {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }

    /// `None` outside the buffer, matching `set` which ignores those writes.
    #[inline]
    pub fn get(&self, x: u32, y: u32) -> Option<Rgba> {
        if x < self.width && y < self.height {
            Some(self.pixels[(y * self.width + x) as usize])
        } else {
            None
        }
    }

    /// Fill a vertical run `[y0, y1)` of column `x` with one color.
    pub fn fill_column(&mut self, x: u32, y0: u32, y1: u32, color: Rgba) {
        let y1 = y1.min(self.height);
        for y in y0..y1 {
            self.pixels[(y * self.width + x) as usize] = color;
        }
    }

    /// Axis-aligned filled rectangle; clipped to the buffer.
    pub fn fill_rect(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: Rgba) {
        let (w, h) = (self.width as i32, self.height as i32);
        for y in y0.max(0)..y1.min(h) {
            for x in x0.max(0)..x1.min(w) {
                self.pixels[(y * w + x) as usize] = color;
            }
        }
    }

    /// Filled axis-aligned ellipse centered on (cx, cy); clipped to the buffer.
    pub fn fill_ellipse(&mut self, cx: f32, cy: f32, rx: f32, ry: f32, color: Rgba) {
        if rx <= 0.0 || ry <= 0.0 {
            return;
        }
        let (w, h) = (self.width as i32, self.height as i32);
        let y0 = ((cy - ry).floor() as i32).max(0);
        let y1 = ((cy + ry).ceil() as i32).min(h);
        let x0 = ((cx - rx).floor() as i32).max(0);
        let x1 = ((cx + rx).ceil() as i32).min(w);
        for y in y0..y1 {
            for x in x0..x1 {
                let dx = (x as f32 + 0.5 - cx) / rx;
                let dy = (y as f32 + 0.5 - cy) / ry;
                if dx * dx + dy * dy <= 1.0 {
                    self.pixels[(y * w + x) as usize] = color;
                }
            }
        }
    }

    /// Raw bytes for `queue.write_texture`.
    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::cast_slice(&self.pixels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_layout_is_rgba() {
        let mut fb = FrameBuffer::new(2, 1);
        fb.set(1, 0, Rgba::rgb(1, 2, 3));
        assert_eq!(fb.as_bytes(), &[0, 0, 0, 255, 1, 2, 3, 255]);
    }

    #[test]
    fn primitives_are_clipped() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.fill_rect(-2, -2, 2, 2, Rgba::WHITE);
        assert_eq!(fb.get(1, 1), Some(Rgba::WHITE));
        assert_eq!(fb.get(2, 2), Some(Rgba::BLACK));
        fb.fill_ellipse(4.0, 4.0, 1.0, 1.0, Rgba::rgb(9, 9, 9));
        assert_eq!(fb.get(3, 3), Some(Rgba::rgb(9, 9, 9)));
    }

    #[test]
    fn out_of_range_pixels_are_ignored() {
        let mut fb = FrameBuffer::new(4, 4);
        fb.set(10, 10, Rgba::WHITE);
        fb.set(4, 0, Rgba::WHITE);
        assert_eq!(fb.get(10, 10), None);
        assert_eq!(fb.get(4, 0), None);
        assert_eq!(fb.get(0, 4), None);
        assert_eq!(fb.get(3, 3), Some(Rgba::BLACK));
        assert!(fb.as_bytes().chunks(4).all(|px| px == [0, 0, 0, 255]));
    }

    #[test]
    fn color_key_only_matches_near_white() {
        assert!(Rgba::WHITE.is_color_key());
        assert!(Rgba::rgb(245, 250, 241).is_color_key());
        assert!(!Rgba::rgb(255, 255, 200).is_color_key());
        assert_eq!(Rgba::rgb(200, 100, 10).shaded(0.5), Rgba::rgb(100, 50, 5));
    }
}
