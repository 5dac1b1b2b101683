//! Depth-buffered software rasteriser for axis-aligned cubes.
//!
//! Solid faces are split into triangles, back faces culled, and pixels
//! filled with a flat Lambert shade.  The depth buffer stores view-space
//! distance, interpolated perspective-correctly through `1/w`.  Wireframe
//! edges are depth-tested against it with a small relative bias so edges on
//! visible faces survive while hidden ones do not.

use glam::{Mat4, Vec3, Vec4Swizzles};

use airblocks_canvas::{shade, Canvas};

/// Unit cube corners, centred on the origin.
const CORNERS: [[f32; 3]; 8] = [
    [-0.5, -0.5, -0.5],
    [ 0.5, -0.5, -0.5],
    [ 0.5,  0.5, -0.5],
    [-0.5,  0.5, -0.5],
    [-0.5, -0.5,  0.5],
    [ 0.5, -0.5,  0.5],
    [ 0.5,  0.5,  0.5],
    [-0.5,  0.5,  0.5],
];

/// Quads as corner indices with their outward normals.
const FACES: [([usize; 4], [f32; 3]); 6] = [
    ([0, 1, 2, 3], [ 0.0,  0.0, -1.0]),
    ([4, 5, 6, 7], [ 0.0,  0.0,  1.0]),
    ([0, 4, 7, 3], [-1.0,  0.0,  0.0]),
    ([1, 5, 6, 2], [ 1.0,  0.0,  0.0]),
    ([3, 2, 6, 7], [ 0.0,  1.0,  0.0]),
    ([0, 1, 5, 4], [ 0.0, -1.0,  0.0]),
];

const EDGES: [(usize, usize); 12] = [
    (0, 1), (1, 2), (2, 3), (3, 0),
    (4, 5), (5, 6), (6, 7), (7, 4),
    (0, 4), (1, 5), (2, 6), (3, 7),
];

const AMBIENT: f32 = 0.25;
const DIFFUSE: f32 = 0.8;
/// Points lying closer than this to the eye plane are dropped.
const MIN_W:   f32 = 0.1;

/// Relative depth slack granted to wireframe lines.
pub const WIRE_BIAS: f32 = 0.004;

fn light_dir() -> Vec3 { Vec3::new(-1.0, 1.5, 1.0).normalize() }

/// Brightness multiplier for a face with outward normal `n`.
pub fn lambert(n: Vec3) -> f32 {
    (AMBIENT + DIFFUSE * n.dot(light_dir()).max(0.0)).min(1.0)
}

pub struct Raster {
    canvas: Canvas,
    depth:  Vec<f32>,
}

impl Raster {
    pub fn new(width: usize, height: usize, background: u32) -> Self {
        Raster {
            canvas: Canvas::new(width, height, background),
            depth:  vec![f32::INFINITY; width * height],
        }
    }

    pub fn canvas(&self) -> &Canvas { &self.canvas }
    pub fn canvas_mut(&mut self) -> &mut Canvas { &mut self.canvas }

    pub fn clear(&mut self, background: u32) {
        self.canvas.clear(background);
        self.depth.fill(f32::INFINITY);
    }

    /// Stored view distance at a pixel (`INFINITY` when empty).
    pub fn depth_at(&self, x: usize, y: usize) -> Option<f32> {
        (x < self.canvas.width() && y < self.canvas.height())
            .then(|| self.depth[y * self.canvas.width() + x])
    }

    /// Screen position `(x, y)` plus view distance `w`.
    pub fn project(&self, view_proj: &Mat4, p: Vec3) -> Option<Vec3> {
        let clip = *view_proj * p.extend(1.0);
        if clip.w < MIN_W { return None; }
        let ndc = clip.xyz() / clip.w;
        let w = self.canvas.width() as f32;
        let h = self.canvas.height() as f32;
        Some(Vec3::new(
            (ndc.x * 0.5 + 0.5) * w,
            (0.5 - ndc.y * 0.5) * h,
            clip.w,
        ))
    }

    // ── primitives ───────────────────────────────────────────────────────

    /// Fill a screen-space triangle (z = view distance), depth-tested.
    pub fn fill_triangle(&mut self, a: Vec3, b: Vec3, c: Vec3, color: u32) {
        let area = edge(a, b, c);
        if area.abs() < 1e-6 { return; }

        let (w, h) = (self.canvas.width() as i32, self.canvas.height() as i32);
        let x0 = a.x.min(b.x).min(c.x).floor().max(0.0) as i32;
        let y0 = a.y.min(b.y).min(c.y).floor().max(0.0) as i32;
        let x1 = (a.x.max(b.x).max(c.x).ceil() as i32).min(w - 1);
        let y1 = (a.y.max(b.y).max(c.y).ceil() as i32).min(h - 1);

        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = Vec3::new(x as f32 + 0.5, y as f32 + 0.5, 0.0);
                let l0 = edge(b, c, p) / area;
                let l1 = edge(c, a, p) / area;
                let l2 = edge(a, b, p) / area;
                if l0 < 0.0 || l1 < 0.0 || l2 < 0.0 { continue; }

                let inv_w = l0 / a.z + l1 / b.z + l2 / c.z;
                let depth = 1.0 / inv_w;
                let i = y as usize * self.canvas.width() + x as usize;
                if depth < self.depth[i] {
                    self.depth[i] = depth;
                    self.canvas.set_pixel(x, y, color);
                }
            }
        }
    }

    /// Screen-space line tested (not written) against the depth buffer.
    pub fn depth_line(&mut self, a: Vec3, b: Vec3, color: u32, bias: f32) {
        let steps = (b.x - a.x).abs().max((b.y - a.y).abs()).ceil().max(1.0) as usize;
        let width = self.canvas.width();
        for s in 0..=steps {
            let t = s as f32 / steps as f32;
            let x = a.x + (b.x - a.x) * t;
            let y = a.y + (b.y - a.y) * t;
            if x < 0.0 || y < 0.0 { continue; }
            let (xi, yi) = (x as usize, y as usize);
            if xi >= width || yi >= self.canvas.height() { continue; }

            let depth = 1.0 / ((1.0 - t) / a.z + t / b.z);
            if depth * (1.0 - bias) <= self.depth[yi * width + xi] {
                self.canvas.set_pixel(xi as i32, yi as i32, color);
            }
        }
    }

    // ── cubes ────────────────────────────────────────────────────────────

    /// Solid cube with per-face Lambert shading.  Faces turned away from
    /// `eye` are skipped.
    pub fn cube(&mut self, view_proj: &Mat4, eye: Vec3, center: Vec3, size: f32, color: u32) {
        let world = corners(center, size);
        let screen: Vec<Option<Vec3>> = world.iter().map(|&p| self.project(view_proj, p)).collect();

        for (quad, normal) in FACES.iter() {
            let n = Vec3::from_array(*normal);
            let face_center = center + n * (size * 0.5);
            if n.dot(eye - face_center) <= 0.0 { continue; }

            let [Some(a), Some(b), Some(c), Some(d)] = quad.map(|i| screen[i]) else { continue };
            let lit = shade(color, lambert(n));
            self.fill_triangle(a, b, c, lit);
            self.fill_triangle(a, c, d, lit);
        }
    }

    /// The twelve cube edges, depth-tested with [`WIRE_BIAS`].
    pub fn cube_edges(&mut self, view_proj: &Mat4, center: Vec3, size: f32, color: u32) {
        let world = corners(center, size);
        let screen: Vec<Option<Vec3>> = world.iter().map(|&p| self.project(view_proj, p)).collect();
        for &(i, j) in EDGES.iter() {
            if let (Some(a), Some(b)) = (screen[i], screen[j]) {
                self.depth_line(a, b, color, WIRE_BIAS);
            }
        }
    }
}

fn corners(center: Vec3, size: f32) -> [Vec3; 8] {
    CORNERS.map(|c| center + Vec3::from_array(c) * size)
}

/// Twice the signed area of `(a, b, p)` in screen space.
fn edge(a: Vec3, b: Vec3, p: Vec3) -> f32 {
    (b.x - a.x) * (p.y - a.y) - (b.y - a.y) * (p.x - a.x)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use airblocks_canvas::rgb;

    const BG:  u32 = rgb(30, 30, 30);
    const RED: u32 = rgb(200, 0, 0);
    const BLU: u32 = rgb(0, 0, 200);

    fn looking_down_z(raster: &Raster) -> (Mat4, Vec3) {
        let eye = Vec3::new(0.0, 0.0, 10.0);
        let aspect = raster.canvas().width() as f32 / raster.canvas().height() as f32;
        let vp = Mat4::perspective_rh_gl(45f32.to_radians(), aspect, 0.1, 1000.0)
            * Mat4::look_at_rh(eye, Vec3::ZERO, Vec3::Y);
        (vp, eye)
    }

    #[test]
    fn projects_origin_to_screen_centre() {
        let raster = Raster::new(200, 100, BG);
        let (vp, _) = looking_down_z(&raster);
        let p = raster.project(&vp, Vec3::ZERO).unwrap();
        assert!((p.x - 100.0).abs() < 1e-3);
        assert!((p.y - 50.0).abs() < 1e-3);
        assert!((p.z - 10.0).abs() < 1e-3);
    }

    #[test]
    fn points_behind_eye_are_dropped() {
        let raster = Raster::new(200, 100, BG);
        let (vp, _) = looking_down_z(&raster);
        assert!(raster.project(&vp, Vec3::new(0.0, 0.0, 20.0)).is_none());
    }

    #[test]
    fn cube_covers_centre_with_front_face_depth() {
        let mut raster = Raster::new(200, 200, BG);
        let (vp, eye) = looking_down_z(&raster);
        raster.cube(&vp, eye, Vec3::ZERO, 2.0, RED);

        let centre = raster.canvas().pixel(100, 100).unwrap();
        assert_ne!(centre, BG);
        // front face at z = +1 is 9 units from the eye
        let d = raster.depth_at(100, 100).unwrap();
        assert!((d - 9.0).abs() < 0.05, "depth {}", d);
        // corners of the window stay empty
        assert_eq!(raster.canvas().pixel(0, 0), Some(BG));
        assert_eq!(raster.depth_at(0, 0), Some(f32::INFINITY));
    }

    #[test]
    fn nearer_cube_wins_regardless_of_order() {
        let mut raster = Raster::new(200, 200, BG);
        let (vp, eye) = looking_down_z(&raster);
        raster.cube(&vp, eye, Vec3::new(0.0, 0.0, 3.0), 1.0, BLU);
        raster.cube(&vp, eye, Vec3::ZERO, 1.0, RED);
        let front = raster.canvas().pixel(100, 100).unwrap();
        assert_eq!(front, shade(BLU, lambert(Vec3::Z)));
    }

    #[test]
    fn hidden_edges_are_rejected() {
        let mut raster = Raster::new(200, 200, BG);
        let (vp, eye) = looking_down_z(&raster);
        raster.cube(&vp, eye, Vec3::new(0.0, 0.0, 3.0), 4.0, BLU);
        let before = raster.canvas().pixels().to_vec();
        // a small cube completely behind the big one
        raster.cube_edges(&vp, Vec3::new(0.0, 0.0, -3.0), 1.0, RED);
        assert_eq!(raster.canvas().pixels(), &before[..]);
    }

    #[test]
    fn visible_edges_are_drawn() {
        let mut raster = Raster::new(200, 200, BG);
        let (vp, eye) = looking_down_z(&raster);
        raster.cube(&vp, eye, Vec3::ZERO, 2.0, BLU);
        raster.cube_edges(&vp, Vec3::ZERO, 2.0, RED);
        assert!(raster.canvas().pixels().iter().any(|&p| p == RED));
    }

    #[test]
    fn top_face_is_brighter_than_bottom() {
        assert!(lambert(Vec3::Y) > lambert(Vec3::NEG_Y));
        assert_eq!(lambert(Vec3::NEG_Y), AMBIENT);
    }
}
