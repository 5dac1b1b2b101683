//! Software-rendered editing overlay using `minifb`.
//!
//! Layout:
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │  MODE: BUILD                  3D MODE READY                    │
//! │ ┌──────────┐                                                   │
//! │ │  BUILD   │     ▢▢▢▢        grid, structures, blueprint       │
//! │ │  SCALE   │     ▢▢                                            │
//! │ │  GROUP   │              ✋ hand skeleton + cursor + rings     │
//! │ │ EXTRUDE  │                                                   │
//! │ └──────────┘                 BUILD OK                          │
//! │  status / key legend                                           │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! [`paint`] draws everything into a [`Canvas`]; [`Overlay`] owns the window,
//! turns mouse and keys into simulator samples and presents the canvas.

use std::collections::BTreeSet;
use std::sync::mpsc::Sender;
use std::time::{Duration, Instant};

use minifb::{Key, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};

use airblocks_canvas::{rgb, shade, Canvas};
use airblocks_scene::{Cell, Structure};

use crate::app::EditorError;
use crate::hand::{HandFrame, HAND_CONNECTIONS};
use crate::session::{EditorSession, FrameReport, Mode};
use crate::source::{HandPose, SimInput, SimPose};

// ════════════════════════════════════════════════════════════════════════════
// Palette
// ════════════════════════════════════════════════════════════════════════════

const BG_COLOR:      u32 = rgb(24, 24, 30);
const GRID_COLOR:    u32 = rgb(44, 44, 54);
const BLOCK_FILL:    u32 = rgb(0, 170, 220);
const BLOCK_EDGE:    u32 = rgb(0, 255, 255);
const ACTIVE_EDGE:   u32 = rgb(255, 255, 0);
const HOLO_FILL:     u32 = rgb(0, 200, 255);
const HOLO_SCAN:     u32 = rgb(220, 220, 0);
const CURSOR_COLOR:  u32 = rgb(255, 255, 0);
const RING_COLOR:    u32 = rgb(255, 255, 0);
const BONE_COLOR:    u32 = rgb(235, 235, 235);
const JOINT_COLOR:   u32 = rgb(255, 70, 70);
const MENU_SELECTED: u32 = rgb(0, 255, 0);
const MENU_HOVER:    u32 = rgb(0, 255, 255);
const MENU_IDLE:     u32 = rgb(120, 120, 120);
const MENU_BG:       u32 = rgb(16, 16, 20);
const TEXT_COLOR:    u32 = rgb(230, 230, 230);
const DIM_TEXT:      u32 = rgb(130, 130, 140);
const LOCK_COLOR:    u32 = rgb(255, 255, 0);
const FEEDBACK:      u32 = rgb(0, 255, 255);
const STATUS_BG:     u32 = rgb(12, 30, 60);

const STATUS_H: i32 = 28;

// ════════════════════════════════════════════════════════════════════════════
// Painting
// ════════════════════════════════════════════════════════════════════════════

/// Draw one overlay frame.  `elapsed` drives the blueprint animation.
pub fn paint(
    canvas:  &mut Canvas,
    session: &EditorSession,
    frame:   &HandFrame,
    report:  &FrameReport,
    elapsed: Duration,
    now:     Instant,
) {
    let cfg = session.config();
    let t = elapsed.as_secs_f32();
    canvas.clear(BG_COLOR);

    draw_grid(canvas, cfg.grid);
    for s in session.scene().structures() {
        let active = session.scene().active() == Some(s.id);
        draw_structure(canvas, s, cfg.grid, active);
    }
    if let Some(bp) = session.blueprint() {
        draw_blueprint(canvas, &bp.cells, &bp.outline(), cfg.grid, t);
    }

    // ── hands ────────────────────────────────────────────────────────────
    for hand in &frame.hands {
        let px: Vec<(i32, i32)> = hand.landmarks.iter()
            .map(|l| l.to_pixel(cfg.width, cfg.height))
            .collect();
        for &(a, b) in HAND_CONNECTIONS.iter() {
            canvas.line(px[a].0, px[a].1, px[b].0, px[b].1, BONE_COLOR);
        }
        for &(x, y) in &px {
            canvas.draw_diamond(x, y, 3, JOINT_COLOR);
        }
    }
    if let Some((x, y)) = report.cursor {
        canvas.fill_circle(x, y, 6, CURSOR_COLOR);
    }
    for ind in &report.indicators {
        canvas.progress_arc(ind.x, ind.y, ind.radius, ind.thickness, ind.progress, RING_COLOR);
    }

    // ── menu ─────────────────────────────────────────────────────────────
    for (i, mode) in Mode::ALL.iter().enumerate() {
        let (x, y, w, h) = cfg.menu.entry_rect(i);
        let color = if *mode == session.mode() {
            MENU_SELECTED
        } else if report.hovered_menu == Some(i) {
            MENU_HOVER
        } else {
            MENU_IDLE
        };
        canvas.fill_rect_alpha(x, y, w, h, MENU_BG, 0.6);
        canvas.stroke_rect(x, y, w, h, 2, color);
        canvas.text(mode.label(), x + 12, y + h / 2 - 7, 3, color);
    }

    // ── labels ───────────────────────────────────────────────────────────
    let width = cfg.width as i32;
    let height = cfg.height as i32;
    canvas.text(&format!("MODE: {}", session.mode().label()), 20, 30, 4, TEXT_COLOR);

    if session.is_locked() {
        centered(canvas, "3D MODE READY", width / 2, 80, 5, LOCK_COLOR);
    }
    if let (Some(h), Some((x, y))) = (report.height, report.cursor) {
        canvas.text(&format!("HEIGHT {}", h), x + 24, y - 24, 3, TEXT_COLOR);
    }
    if let (Some(s), Some((x, y))) = (report.scale, report.cursor) {
        canvas.text(&format!("SCALE {:.1}", s), x + 24, y - 24, 3, TEXT_COLOR);
    }
    match session.mode() {
        Mode::Scale   => centered(canvas, "PINCH + DRAG UP/DOWN TO SCALE", width / 2, height - 120, 3, DIM_TEXT),
        Mode::Extrude => centered(canvas, "PINCH + DRAG UP/DOWN TO EXTRUDE", width / 2, height - 120, 3, DIM_TEXT),
        Mode::Group   => centered(canvas, "PINCH A STRUCTURE TO SELECT", width / 2, height - 120, 3, DIM_TEXT),
        Mode::Build   => {}
    }
    if let Some(text) = session.feedback(now) {
        centered(canvas, text, width / 2, height - 80, 5, FEEDBACK);
    }

    // ── status bar ───────────────────────────────────────────────────────
    let stats = session.scene().stats();
    let history = session.history();
    canvas.fill_rect(0, height - STATUS_H, width, STATUS_H, STATUS_BG);
    canvas.text(
        &format!(
            "STRUCTURES {}  BLOCKS {}  UNDO {}  REDO {}",
            stats.structures, stats.blocks, history.undo_depth(), history.redo_depth(),
        ),
        10, height - STATUS_H + 9, 2, TEXT_COLOR,
    );
}

fn centered(canvas: &mut Canvas, text: &str, cx: i32, y: i32, scale: i32, color: u32) {
    canvas.text(text, cx - Canvas::text_width(text, scale) / 2, y, scale, color);
}

fn draw_grid(canvas: &mut Canvas, grid: i32) {
    let grid = grid.max(4);
    let (w, h) = (canvas.width() as i32, canvas.height() as i32);
    for x in (0..w).step_by(grid as usize) {
        canvas.fill_rect(x, 0, 1, h, GRID_COLOR);
    }
    for y in (0..h).step_by(grid as usize) {
        canvas.fill_rect(0, y, w, 1, GRID_COLOR);
    }
}

/// Stacked squares: each level rises half a cell and gets lighter.
fn draw_structure(canvas: &mut Canvas, s: &Structure, grid: i32, active: bool) {
    let size = ((grid as f32 * s.scale) as i32).max(2);
    let inset = (grid - size) / 2;
    let levels = s.height.max(1) as i32;

    for level in 0..levels {
        let lift = level * grid / 2;
        let fill = shade(BLOCK_FILL, 0.6 + 0.4 * (level + 1) as f32 / levels as f32);
        for cell in &s.cells {
            let px = cell.x * grid + inset;
            let py = cell.y * grid + inset - lift;
            canvas.fill_rect(px, py, size, size, fill);
            canvas.draw_border(px, py, size, size, BLOCK_EDGE);
            if active {
                canvas.stroke_rect(px - 2, py - 2, size + 4, size + 4, 2, ACTIVE_EDGE);
            }
        }
    }
}

/// Translucent "hologram" cells with an X brace and drifting scanlines.
fn draw_blueprint(
    canvas:  &mut Canvas,
    cells:   &BTreeSet<Cell>,
    outline: &BTreeSet<Cell>,
    grid:    i32,
    t:       f32,
) {
    let sway = (3.0 * (2.0 * t).sin()) as i32;
    let scan = (t * 80.0) as i32;

    for cell in cells {
        let px = cell.x * grid + sway;
        let py = cell.y * grid + sway;
        canvas.fill_rect_alpha(px, py, grid, grid, HOLO_FILL, 0.16);
        canvas.line(px, py, px + grid - 1, py + grid - 1, HOLO_FILL);
        canvas.line(px + grid - 1, py, px, py + grid - 1, HOLO_FILL);

        let mut y = scan.rem_euclid(12);
        while y < grid {
            canvas.fill_rect(px, py + y, grid, 1, HOLO_SCAN);
            y += 12;
        }

        let thickness = if outline.contains(cell) { 2 } else { 1 };
        canvas.stroke_rect(px, py, grid, grid, thickness, HOLO_FILL);
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Overlay window
// ════════════════════════════════════════════════════════════════════════════

/// Keyboard actions the run loop handles itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct EditorKeys {
    pub quit: bool,
    pub undo: bool,
    pub redo: bool,
}

pub struct Overlay {
    window:  Window,
    canvas:  Canvas,
    /// Present in simulation mode.
    sim_tx:  Option<Sender<SimInput>>,
    started: Instant,
}

impl Overlay {
    pub fn new(
        title:  &str,
        width:  usize,
        height: usize,
        sim_tx: Option<Sender<SimInput>>,
    ) -> Result<Self, EditorError> {
        let mut window = Window::new(
            title,
            width, height,
            WindowOptions {
                resize: false,
                ..WindowOptions::default()
            },
        ).map_err(|e| EditorError::Window(e.to_string()))?;

        window.limit_update_rate(Some(Duration::from_millis(16))); // ~60fps

        Ok(Overlay {
            window,
            canvas: Canvas::new(width, height, BG_COLOR),
            sim_tx,
            started: Instant::now(),
        })
    }

    pub fn is_open(&self) -> bool { self.window.is_open() }

    /// Read keys and, in simulation mode, send this frame's pointer sample.
    pub fn poll_input(&mut self) -> EditorKeys {
        let ctrl = self.window.is_key_down(Key::LeftCtrl)
                || self.window.is_key_down(Key::RightCtrl);
        let one_shot = |k: Key| self.window.is_key_pressed(k, KeyRepeat::No);

        let keys = EditorKeys {
            quit: one_shot(Key::Escape),
            undo: ctrl && one_shot(Key::Z),
            redo: ctrl && one_shot(Key::Y),
        };

        if let Some(tx) = &self.sim_tx {
            let (w, h) = (self.canvas.width() as f32, self.canvas.height() as f32);
            let pointer = self.window
                .get_mouse_pos(MouseMode::Discard)
                .map(|(x, y)| (x / w, y / h));

            let pose = if self.window.is_key_down(Key::H) {
                SimPose::Hidden
            } else if self.window.is_key_down(Key::Tab) {
                SimPose::TwoOpen
            } else if self.window.get_mouse_down(MouseButton::Left) {
                SimPose::Single(HandPose::Pinch)
            } else if self.window.get_mouse_down(MouseButton::Right) {
                SimPose::Single(HandPose::Fist)
            } else {
                SimPose::Single(HandPose::Open)
            };
            let _ = tx.send(SimInput { pointer, pose });
        }

        keys
    }

    /// Render one frame and present it.
    pub fn render(
        &mut self,
        session: &EditorSession,
        frame:   &HandFrame,
        report:  &FrameReport,
        now:     Instant,
    ) {
        paint(&mut self.canvas, session, frame, report, self.started.elapsed(), now);

        if self.sim_tx.is_some() {
            let y = self.canvas.height() as i32 - STATUS_H - 16;
            self.canvas.text(
                "LMB=PINCH  RMB=FIST  TAB=TWO HANDS  H=HIDE  CTRL+Z/Y=UNDO/REDO  ESC=QUIT",
                10, y, 2, DIM_TEXT,
            );
        }

        let (w, h) = (self.canvas.width(), self.canvas.height());
        if let Err(e) = self.window.update_with_buffer(self.canvas.pixels(), w, h) {
            log::warn!("overlay present failed: {}", e);
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use airblocks_scene::Scene;
    use crate::session::SessionConfig;

    fn blank(session: &EditorSession) -> Canvas {
        let cfg = session.config();
        Canvas::new(cfg.width, cfg.height, 0)
    }

    #[test]
    fn paints_background_menu_and_status() {
        let session = EditorSession::new(SessionConfig::default(), None);
        let mut canvas = blank(&session);
        let now = Instant::now();
        paint(&mut canvas, &session, &HandFrame::empty(), &FrameReport::default(), Duration::ZERO, now);

        // selected BUILD entry border at the menu origin
        assert_eq!(canvas.pixel(20, 80), Some(MENU_SELECTED));
        // SCALE entry is idle
        assert_eq!(canvas.pixel(20, 131), Some(MENU_IDLE));
        assert_eq!(canvas.pixel(640, 719), Some(STATUS_BG));
        assert_eq!(canvas.pixel(641, 361), Some(BG_COLOR));
    }

    fn tower(height: u32) -> Scene {
        let mut scene = Scene::new();
        scene.add_structure([Cell::new(10, 5)], 1.0, height);
        scene
    }

    #[test]
    fn structure_cells_are_filled() {
        let mut canvas = Canvas::new(1280, 720, 0);
        let scene = tower(1);
        draw_structure(&mut canvas, &scene.structures()[0], 40, false);
        assert_eq!(canvas.pixel(400, 200), Some(BLOCK_EDGE));
        assert_eq!(canvas.pixel(420, 220), Some(BLOCK_FILL));
    }

    #[test]
    fn taller_structures_rise_upward() {
        let mut canvas = Canvas::new(1280, 720, 0);
        let scene = tower(3);
        draw_structure(&mut canvas, &scene.structures()[0], 40, true);
        // top level is lifted by two half-cells
        assert_ne!(canvas.pixel(420, 180), Some(0));
        assert_eq!(canvas.pixel(420, 100), Some(0));
    }
}
