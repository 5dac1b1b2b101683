//! Smoothed orbit camera.
//!
//! Mouse input moves *target* angles and distance; [`ViewerCamera::update`]
//! eases the live values toward them every frame.  The view transform is
//! `translate(0, 0, -distance) · rotX(pitch) · rotY(yaw) · translate(-focus)`.
//!
//! Controls:
//! - Left drag: orbit (0.5°/px, pitch clamped to ±85°)
//! - Right drag: zoom (0.2 units/px)
//! - Wheel: zoom in/out by 3 units
//! - `F`: refocus on the scene bounds

use glam::{Mat4, Vec3};

use airblocks_scene::SceneBounds;

// ============================================================================
// CONSTANTS
// ============================================================================

const DEFAULT_YAW:      f32 = 0.0;
const DEFAULT_PITCH:    f32 = 20.0;
const DEFAULT_DISTANCE: f32 = 40.0;

/// Fraction of the remaining gap closed per frame.
pub const SMOOTHING: f32 = 0.15;

const FOV_DEG: f32 = 45.0;
const NEAR:    f32 = 0.1;
const FAR:     f32 = 1000.0;

pub const MIN_DISTANCE: f32 = 1.5;
pub const MAX_DISTANCE: f32 = 300.0;
const MAX_PITCH:        f32 = 85.0;

/// Degrees per pixel of left drag.
const ORBIT_SENSITIVITY: f32 = 0.5;
/// Distance units per pixel of right drag.
const ZOOM_SENSITIVITY:  f32 = 0.2;
/// Distance units per wheel notch.
const WHEEL_STEP:        f32 = 3.0;

// ============================================================================
// VIEWER CAMERA
// ============================================================================

#[derive(Debug, Clone)]
pub struct ViewerCamera {
    /// Live values, in degrees and world units.
    pub yaw:      f32,
    pub pitch:    f32,
    pub distance: f32,
    /// Point the camera orbits.  Jumps immediately on refocus.
    pub focus:    Vec3,
    /// Width / height of the viewport.
    pub aspect:   f32,

    target_yaw:      f32,
    target_pitch:    f32,
    target_distance: f32,

    last_mouse: Option<(f32, f32)>,
}

impl ViewerCamera {
    pub fn new(aspect: f32) -> Self {
        ViewerCamera {
            yaw:             DEFAULT_YAW,
            pitch:           DEFAULT_PITCH,
            distance:        DEFAULT_DISTANCE,
            focus:           Vec3::ZERO,
            aspect,
            target_yaw:      DEFAULT_YAW,
            target_pitch:    DEFAULT_PITCH,
            target_distance: DEFAULT_DISTANCE,
            last_mouse:      None,
        }
    }

    pub fn target_yaw(&self)      -> f32 { self.target_yaw }
    pub fn target_pitch(&self)    -> f32 { self.target_pitch }
    pub fn target_distance(&self) -> f32 { self.target_distance }

    // ========================================================================
    // INPUT
    // ========================================================================

    pub fn orbit(&mut self, dx: f32, dy: f32) {
        self.target_yaw += dx * ORBIT_SENSITIVITY;
        self.target_pitch = (self.target_pitch + dy * ORBIT_SENSITIVITY)
            .clamp(-MAX_PITCH, MAX_PITCH);
    }

    pub fn zoom_drag(&mut self, dy: f32) {
        self.set_target_distance(self.target_distance + dy * ZOOM_SENSITIVITY);
    }

    /// Positive `notches` zoom in.
    pub fn scroll(&mut self, notches: f32) {
        if notches > 0.0 {
            self.set_target_distance(self.target_distance - WHEEL_STEP);
        } else if notches < 0.0 {
            self.set_target_distance(self.target_distance + WHEEL_STEP);
        }
    }

    /// One frame of pointer state.  Drags are measured against the previous
    /// frame's position; a missing pointer breaks the drag.
    pub fn pointer(&mut self, pos: Option<(f32, f32)>, left: bool, right: bool) {
        if let (Some((x, y)), Some((lx, ly))) = (pos, self.last_mouse) {
            let (dx, dy) = (x - lx, y - ly);
            if left  { self.orbit(dx, dy); }
            if right { self.zoom_drag(dy); }
        }
        self.last_mouse = pos;
    }

    /// Centre on the scene and use its radius as the target distance.
    pub fn focus_on(&mut self, bounds: SceneBounds) {
        self.focus = bounds.center;
        self.set_target_distance(bounds.radius);
    }

    fn set_target_distance(&mut self, d: f32) {
        self.target_distance = d.clamp(MIN_DISTANCE, MAX_DISTANCE);
    }

    /// Ease the live values toward their targets.
    pub fn update(&mut self) {
        self.yaw      += (self.target_yaw      - self.yaw)      * SMOOTHING;
        self.pitch    += (self.target_pitch    - self.pitch)    * SMOOTHING;
        self.distance += (self.target_distance - self.distance) * SMOOTHING;
    }

    // ========================================================================
    // MATRICES
    // ========================================================================

    pub fn view(&self) -> Mat4 {
        Mat4::from_translation(Vec3::new(0.0, 0.0, -self.distance))
            * Mat4::from_rotation_x(self.pitch.to_radians())
            * Mat4::from_rotation_y(self.yaw.to_radians())
            * Mat4::from_translation(-self.focus)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh_gl(FOV_DEG.to_radians(), self.aspect.max(1e-3), NEAR, FAR)
    }

    pub fn view_projection(&self) -> Mat4 { self.projection() * self.view() }

    /// World-space eye position.
    pub fn eye(&self) -> Vec3 {
        self.view().inverse().transform_point3(Vec3::ZERO)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f32, b: f32) -> bool { (a - b).abs() < 1e-3 }

    #[test]
    fn starts_at_documented_pose() {
        let cam = ViewerCamera::new(1.0);
        assert_eq!((cam.yaw, cam.pitch, cam.distance), (0.0, 20.0, 40.0));
    }

    #[test]
    fn pitch_target_clamps() {
        let mut cam = ViewerCamera::new(1.0);
        cam.orbit(10.0, 1000.0);
        assert_eq!(cam.target_pitch(), 85.0);
        assert_eq!(cam.target_yaw(), 5.0);
        cam.orbit(0.0, -5000.0);
        assert_eq!(cam.target_pitch(), -85.0);
    }

    #[test]
    fn distance_target_clamps() {
        let mut cam = ViewerCamera::new(1.0);
        for _ in 0..200 { cam.scroll(1.0); }
        assert_eq!(cam.target_distance(), MIN_DISTANCE);
        cam.zoom_drag(1e6);
        assert_eq!(cam.target_distance(), MAX_DISTANCE);
    }

    #[test]
    fn update_eases_toward_target() {
        let mut cam = ViewerCamera::new(1.0);
        cam.scroll(-1.0); // 40 → 43
        cam.update();
        assert!(approx(cam.distance, 40.0 + 3.0 * SMOOTHING));
        for _ in 0..200 { cam.update(); }
        assert!(approx(cam.distance, 43.0));
    }

    #[test]
    fn pointer_drag_uses_frame_deltas() {
        let mut cam = ViewerCamera::new(1.0);
        cam.pointer(Some((100.0, 100.0)), true, false);
        cam.pointer(Some((110.0, 104.0)), true, false);
        assert!(approx(cam.target_yaw(), 5.0));
        assert!(approx(cam.target_pitch(), 22.0));
        // released: movement is ignored
        cam.pointer(Some((300.0, 300.0)), false, false);
        assert!(approx(cam.target_yaw(), 5.0));
    }

    #[test]
    fn focus_centres_view_on_bounds() {
        let mut cam = ViewerCamera::new(1.0);
        cam.focus_on(SceneBounds { center: Vec3::new(4.0, 1.0, -2.0), radius: 12.0 });
        assert_eq!(cam.target_distance(), 12.0);
        // the focus point sits on the view axis at the live distance
        let p = cam.view().transform_point3(cam.focus);
        assert!(approx(p.x, 0.0) && approx(p.y, 0.0) && approx(p.z, -cam.distance));
    }

    #[test]
    fn eye_is_distance_from_focus() {
        let mut cam = ViewerCamera::new(1.0);
        cam.yaw = 37.0;
        cam.pitch = -12.0;
        assert!((cam.eye().distance(cam.focus) - cam.distance).abs() < 1e-2);
    }
}
