//! Viewer state, HUD and window loop.
//!
//! The viewer never writes the scene.  It re-reads the snapshot every
//! `poll_every` rendered frames and swaps its whole scene when the file
//! content changed, refocusing the camera on the new bounds.

use std::path::PathBuf;
use std::time::Duration;

use glam::Vec3;
use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use thiserror::Error;

use airblocks_canvas::{rgb, shade};
use airblocks_scene::{persist, Scene, StructureRecord, DEFAULT_SCENE_FILE};

use crate::camera::ViewerCamera;
use crate::raster::Raster;

// ════════════════════════════════════════════════════════════════════════════
// Palette
// ════════════════════════════════════════════════════════════════════════════

pub const BACKGROUND:   u32 = rgb(30, 30, 30);
pub const VOXEL_ACTIVE: u32 = rgb(51, 102, 255);
pub const VOXEL_IDLE:   u32 = rgb(51, 204, 51);
/// Brightness of structures that are not active.
const IDLE_DIM:         f32 = 0.85;
pub const WIREFRAME:    u32 = rgb(179, 230, 255);
const HUD_TEXT:         u32 = rgb(179, 230, 255);

const HUD_SCALE:   i32 = 2;
const HUD_LINE_H:  i32 = 20;

// ════════════════════════════════════════════════════════════════════════════
// Errors / config
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum ViewerError {
    #[error("window: {0}")]
    Window(String),
}

#[derive(Clone, Debug)]
pub struct ViewerConfig {
    pub scene_path: PathBuf,
    pub width:      usize,
    pub height:     usize,
    /// Rendered frames between scene file polls.
    pub poll_every: u32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        ViewerConfig {
            scene_path: PathBuf::from(DEFAULT_SCENE_FILE),
            width:      1000,
            height:     700,
            poll_every: 10,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// ViewerState
// ════════════════════════════════════════════════════════════════════════════

pub struct ViewerState {
    scene_path: PathBuf,
    poll_every: u32,
    frame:      u64,
    scene:      Scene,
    /// Last records read from disk, compared against to detect changes.
    records:    Option<Vec<StructureRecord>>,
    camera:     ViewerCamera,
}

impl ViewerState {
    /// Builds the state and performs the first poll.
    pub fn new(cfg: &ViewerConfig) -> Self {
        let aspect = cfg.width as f32 / cfg.height.max(1) as f32;
        let mut state = ViewerState {
            scene_path: cfg.scene_path.clone(),
            poll_every: cfg.poll_every.max(1),
            frame:      0,
            scene:      Scene::new(),
            records:    None,
            camera:     ViewerCamera::new(aspect),
        };
        state.poll();
        state
    }

    pub fn scene(&self) -> &Scene { &self.scene }
    pub fn camera(&self) -> &ViewerCamera { &self.camera }
    pub fn camera_mut(&mut self) -> &mut ViewerCamera { &mut self.camera }

    /// Re-read the snapshot.  Returns whether the scene was replaced.
    ///
    /// A missing or unreadable file keeps the current scene.
    pub fn poll(&mut self) -> bool {
        let records = match persist::read(&self.scene_path) {
            Ok(Some(records)) => records,
            Ok(None) => return false,
            Err(e) => {
                log::debug!("scene poll ignored: {}", e);
                return false;
            }
        };
        if self.records.as_ref() == Some(&records) {
            return false;
        }

        self.scene = Scene::from_records(records.clone());
        self.records = Some(records);
        self.refocus();
        let stats = self.scene.stats();
        log::info!("scene reloaded: {} structures, {} blocks", stats.structures, stats.blocks);
        true
    }

    /// Count one rendered frame, polling when due.
    pub fn tick(&mut self) -> bool {
        self.frame += 1;
        self.frame % self.poll_every as u64 == 0 && self.poll()
    }

    pub fn refocus(&mut self) {
        self.camera.focus_on(self.scene.bounds());
    }

    /// Solid pass, wireframe pass, then the HUD.
    pub fn render(&self, raster: &mut Raster) {
        raster.clear(BACKGROUND);
        let vp = self.camera.view_projection();
        let eye = self.camera.eye();
        let active = self.scene.active();

        for s in self.scene.structures() {
            let color = if Some(s.id) == active {
                VOXEL_ACTIVE
            } else {
                shade(VOXEL_IDLE, IDLE_DIM)
            };
            for_each_voxel(s.cells.iter(), s.height, |c| raster.cube(&vp, eye, c, s.scale, color));
        }
        for s in self.scene.structures() {
            for_each_voxel(s.cells.iter(), s.height, |c| raster.cube_edges(&vp, c, s.scale, WIREFRAME));
        }

        let canvas = raster.canvas_mut();
        for (i, line) in hud_lines(&self.scene).iter().enumerate() {
            canvas.text(line, 10, 10 + i as i32 * HUD_LINE_H, HUD_SCALE, HUD_TEXT);
        }
    }
}

fn for_each_voxel<'a>(
    cells:  impl Iterator<Item = &'a airblocks_scene::Cell>,
    height: u32,
    mut f:  impl FnMut(Vec3),
) {
    for c in cells {
        for level in 0..height {
            f(Vec3::new(c.x as f32, level as f32, c.y as f32));
        }
    }
}

/// The four HUD rows.
pub fn hud_lines(scene: &Scene) -> [String; 4] {
    let stats = scene.stats();
    let active = stats.active.map_or_else(|| "None".to_string(), |i| i.to_string());
    [
        format!("Structures : {}", stats.structures),
        format!("Total Blocks : {}", stats.blocks),
        format!("Active ID : {}", active),
        format!("Max Height : {}", stats.max_height),
    ]
}

// ════════════════════════════════════════════════════════════════════════════
// Main loop
// ════════════════════════════════════════════════════════════════════════════

pub fn run(cfg: ViewerConfig) -> Result<(), ViewerError> {
    let mut window = Window::new(
        "AirBlocks 3D Viewer",
        cfg.width, cfg.height,
        WindowOptions {
            resize: false,
            ..WindowOptions::default()
        },
    ).map_err(|e| ViewerError::Window(e.to_string()))?;
    window.limit_update_rate(Some(Duration::from_millis(16)));

    let mut state = ViewerState::new(&cfg);
    let mut raster = Raster::new(cfg.width, cfg.height, BACKGROUND);
    log::info!("watching {}", cfg.scene_path.display());

    while window.is_open() && !window.is_key_down(Key::Escape) {
        let pos = window.get_mouse_pos(MouseMode::Discard);
        let left = window.get_mouse_down(MouseButton::Left);
        let right = window.get_mouse_down(MouseButton::Right);
        state.camera_mut().pointer(pos, left, right);
        if let Some((_, dy)) = window.get_scroll_wheel() {
            state.camera_mut().scroll(dy);
        }
        if window.is_key_pressed(Key::F, KeyRepeat::No) {
            state.refocus();
        }

        state.tick();
        state.camera_mut().update();
        state.render(&mut raster);

        if let Err(e) = window.update_with_buffer(raster.canvas().pixels(), cfg.width, cfg.height) {
            log::warn!("viewer present failed: {}", e);
        }
    }
    Ok(())
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
