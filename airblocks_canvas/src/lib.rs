//! # airblocks_canvas
//!
//! A packed `0xAARRGGBB` framebuffer plus the handful of primitives both
//! AirBlocks windows draw with.  Every primitive takes signed coordinates
//! and clips against the buffer, so callers can draw partly off-screen
//! shapes without bounds checks of their own.
//!
//! The buffer layout matches what `minifb::Window::update_with_buffer`
//! expects: row-major, `width * height` pixels, alpha ignored.

pub mod font;

pub use font::{char_glyph, GLYPH_H, GLYPH_W};

// ════════════════════════════════════════════════════════════════════════════
// Colors
// ════════════════════════════════════════════════════════════════════════════

/// Pack an opaque color.
pub const fn rgb(r: u8, g: u8, b: u8) -> u32 {
    0xFF000000 | ((r as u32) << 16) | ((g as u32) << 8) | b as u32
}

/// Alpha-blend two ARGB colors. `t` = 0.0 → all `a`, `t` = 1.0 → all `b`.
pub fn blend(a: u32, b: u32, t: f32) -> u32 {
    let t = t.clamp(0.0, 1.0);
    let lerp = |ca: u32, cb: u32| (ca as f32 * (1.0-t) + cb as f32 * t).round() as u32;
    let ar = (a >> 16) & 0xFF; let br = (b >> 16) & 0xFF;
    let ag = (a >>  8) & 0xFF; let bg = (b >>  8) & 0xFF;
    let ab =  a        & 0xFF; let bb =  b        & 0xFF;
    0xFF000000 | (lerp(ar,br) << 16) | (lerp(ag,bg) << 8) | lerp(ab,bb)
}

/// Multiply a color's channels by `k` (0.0–1.0+), saturating.
pub fn shade(c: u32, k: f32) -> u32 {
    let ch = |v: u32| ((v as f32 * k).round() as u32).min(255);
    0xFF000000 | (ch((c >> 16) & 0xFF) << 16) | (ch((c >> 8) & 0xFF) << 8) | ch(c & 0xFF)
}

// ════════════════════════════════════════════════════════════════════════════
// Canvas
// ════════════════════════════════════════════════════════════════════════════

pub struct Canvas {
    width:  usize,
    height: usize,
    buf:    Vec<u32>,
}

impl Canvas {
    pub fn new(width: usize, height: usize, background: u32) -> Self {
        Canvas { width, height, buf: vec![background; width * height] }
    }

    pub fn width(&self)  -> usize { self.width }
    pub fn height(&self) -> usize { self.height }
    pub fn pixels(&self) -> &[u32] { &self.buf }

    pub fn clear(&mut self, color: u32) { self.buf.fill(color); }

    pub fn pixel(&self, x: i32, y: i32) -> Option<u32> {
        self.index(x, y).map(|i| self.buf[i])
    }

    fn index(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 { return None; }
        let (x, y) = (x as usize, y as usize);
        if x < self.width && y < self.height { Some(y * self.width + x) } else { None }
    }

    pub fn set_pixel(&mut self, x: i32, y: i32, color: u32) {
        if let Some(i) = self.index(x, y) {
            self.buf[i] = color;
        }
    }

    /// Clip a rectangle to the buffer; `None` when nothing is visible.
    fn clip(&self, x: i32, y: i32, w: i32, h: i32) -> Option<(usize, usize, usize, usize)> {
        let x0 = x.max(0);
        let y0 = y.max(0);
        let x1 = x.saturating_add(w).min(self.width as i32);
        let y1 = y.saturating_add(h).min(self.height as i32);
        if x0 >= x1 || y0 >= y1 { return None; }
        Some((x0 as usize, y0 as usize, x1 as usize, y1 as usize))
    }

    pub fn fill_rect(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) else { return };
        for row in y0..y1 {
            self.buf[row * self.width + x0..row * self.width + x1].fill(color);
        }
    }

    pub fn fill_rect_alpha(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32, alpha: f32) {
        let Some((x0, y0, x1, y1)) = self.clip(x, y, w, h) else { return };
        for row in y0..y1 {
            for px in &mut self.buf[row * self.width + x0..row * self.width + x1] {
                *px = blend(*px, color, alpha);
            }
        }
    }

    /// One-pixel rectangle outline.
    pub fn draw_border(&mut self, x: i32, y: i32, w: i32, h: i32, color: u32) {
        if w <= 0 || h <= 0 { return; }
        self.fill_rect(x,         y,         w, 1, color);
        self.fill_rect(x,         y + h - 1, w, 1, color);
        self.fill_rect(x,         y,         1, h, color);
        self.fill_rect(x + w - 1, y,         1, h, color);
    }

    /// Outline `thickness` pixels wide, growing inward.
    pub fn stroke_rect(&mut self, x: i32, y: i32, w: i32, h: i32, thickness: i32, color: u32) {
        for t in 0..thickness.max(1) {
            self.draw_border(x + t, y + t, w - 2 * t, h - 2 * t, color);
        }
    }

    /// Bresenham line, endpoints inclusive.
    pub fn line(&mut self, x0: i32, y0: i32, x1: i32, y1: i32, color: u32) {
        let dx =  (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y, mut err) = (x0, y0, dx + dy);
        loop {
            self.set_pixel(x, y, color);
            if x == x1 && y == y1 { break; }
            let e2 = 2 * err;
            if e2 >= dy { err += dy; x += sx; }
            if e2 <= dx { err += dx; y += sy; }
        }
    }

    pub fn fill_circle(&mut self, cx: i32, cy: i32, r: i32, color: u32) {
        for dy in -r..=r {
            let half = ((r * r - dy * dy) as f32).sqrt() as i32;
            self.fill_rect(cx - half, cy + dy, 2 * half + 1, 1, color);
        }
    }

    pub fn draw_diamond(&mut self, cx: i32, cy: i32, r: i32, color: u32) {
        for dy in 0..=r {
            let dx = r - dy;
            self.set_pixel(cx + dx, cy + dy, color);
            self.set_pixel(cx - dx, cy + dy, color);
            self.set_pixel(cx + dx, cy - dy, color);
            self.set_pixel(cx - dx, cy - dy, color);
        }
    }

    /// Clockwise arc starting at 3 o'clock, sweeping `progress` of a full
    /// turn.  Used for hold-to-confirm indicators.
    pub fn progress_arc(&mut self, cx: i32, cy: i32, r: i32, thickness: i32, progress: f32, color: u32) {
        let progress = progress.clamp(0.0, 1.0);
        if progress <= 0.0 || r <= 0 { return; }
        let sweep = progress * std::f32::consts::TAU;
        let steps = ((r as f32 * sweep).ceil() as usize).max(1) * 2;
        for i in 0..=steps {
            let a = sweep * i as f32 / steps as f32;
            for t in 0..thickness.max(1) {
                let rr = (r - t) as f32;
                self.set_pixel(
                    cx + (rr * a.cos()).round() as i32,
                    cy + (rr * a.sin()).round() as i32,
                    color,
                );
            }
        }
    }

    // ── text ─────────────────────────────────────────────────────────────

    /// Pixel width of `text` drawn at integer `scale`.
    pub fn text_width(text: &str, scale: i32) -> i32 {
        let n = text.chars().count() as i32;
        if n == 0 { return 0; }
        n * (GLYPH_W as i32 + 1) * scale - scale
    }

    /// Draw `text` with the 3×5 bitmap font, each font pixel `scale`
    /// screen pixels wide.
    pub fn text(&mut self, text: &str, x: i32, y: i32, scale: i32, color: u32) {
        let scale = scale.max(1);
        let mut cx = x;
        for ch in text.chars() {
            let glyph = char_glyph(ch);
            for (row, &bits) in glyph.iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (1 << (GLYPH_W - 1 - col)) != 0 {
                        self.fill_rect(
                            cx + col as i32 * scale,
                            y + row as i32 * scale,
                            scale, scale, color,
                        );
                    }
                }
            }
            cx += (GLYPH_W as i32 + 1) * scale;
            if cx >= self.width as i32 { break; }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
