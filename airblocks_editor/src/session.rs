//! The editor state machine.
//!
//! [`EditorSession`] owns the scene, its history and every piece of gesture
//! state.  [`EditorSession::step`] consumes one [`HandFrame`] and runs the
//! per-frame rules in a fixed order:
//!
//! 1. two-hand lock (two open hands, no pinch, held → lock; fewer than two
//!    open hands → unlock)
//! 2. GROUP selection (pinch on a structure makes it active)
//! 3. fist move (held fist arms a drag of the active structure)
//! 4. menu (pinch on an entry switches mode)
//! 5. BUILD (held pinch starts a blueprint, drag shapes it, open hand commits)
//! 6. SCALE (pinch vertical drag changes scale)
//! 7. EXTRUDE (pinch vertical drag changes height)
//!
//! Every committed action records the pre-action scene for undo, writes the
//! snapshot file and shows a short feedback label.

use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use airblocks_scene::{Cell, History, Scene, StructureId, DEFAULT_HISTORY_LIMIT};

use crate::gesture::{FrameSignals, HandSignals, HoldGate, PINCH_THRESHOLD};
use crate::hand::HandFrame;

// ════════════════════════════════════════════════════════════════════════════
// Configuration
// ════════════════════════════════════════════════════════════════════════════

/// Menu geometry: a vertical column of equal entries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MenuLayout {
    pub x: i32,
    pub y: i32,
    pub w: i32,
    pub h: i32,
}

impl Default for MenuLayout {
    fn default() -> Self { MenuLayout { x: 20, y: 80, w: 160, h: 50 } }
}

impl MenuLayout {
    /// `(x, y, w, h)` of entry `i`.
    pub fn entry_rect(&self, i: usize) -> (i32, i32, i32, i32) {
        (self.x, self.y + i as i32 * self.h, self.w, self.h)
    }

    /// Entry strictly containing the pixel, if any.
    pub fn hit(&self, px: i32, py: i32) -> Option<usize> {
        (0..Mode::ALL.len()).find(|&i| {
            let (x, y, w, h) = self.entry_rect(i);
            x < px && px < x + w && y < py && py < y + h
        })
    }
}

/// Tunables for one editing session.
#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Canvas size landmarks are projected onto.
    pub width:           usize,
    pub height:          usize,
    /// Pixel size of one grid cell.
    pub grid:            i32,
    /// Hold-to-confirm time for build, move and lock.
    pub hold:            Duration,
    pub pinch_threshold: f32,
    /// Vertical pixels per extrude/scale step.
    pub drag_step_px:    i32,
    pub scale_step:      f32,
    pub history_limit:   usize,
    /// How long a commit label stays on screen.
    pub feedback:        Duration,
    pub menu:            MenuLayout,
}

impl Default for SessionConfig {
    fn default() -> Self {
        SessionConfig {
            width:           1280,
            height:          720,
            grid:            40,
            hold:            Duration::from_millis(500),
            pinch_threshold: PINCH_THRESHOLD,
            drag_step_px:    10,
            scale_step:      0.1,
            history_limit:   DEFAULT_HISTORY_LIMIT,
            feedback:        Duration::from_millis(500),
            menu:            MenuLayout::default(),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Mode
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode { Build, Scale, Group, Extrude }

impl Mode {
    /// Menu order.
    pub const ALL: [Mode; 4] = [Mode::Build, Mode::Scale, Mode::Group, Mode::Extrude];

    pub fn label(self) -> &'static str {
        match self {
            Mode::Build   => "BUILD",
            Mode::Scale   => "SCALE",
            Mode::Group   => "GROUP",
            Mode::Extrude => "EXTRUDE",
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Blueprint
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Axis { Horizontal, Vertical }

/// Every cell of the inclusive rectangle spanned by two corners.
pub fn rect_cells(a: Cell, b: Cell) -> BTreeSet<Cell> {
    let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
    let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
    (x0..=x1).flat_map(|x| (y0..=y1).map(move |y| Cell::new(x, y))).collect()
}

/// Border cells of the same rectangle.
pub fn rect_outline(a: Cell, b: Cell) -> BTreeSet<Cell> {
    let (x0, x1) = (a.x.min(b.x), a.x.max(b.x));
    let (y0, y1) = (a.y.min(b.y), a.y.max(b.y));
    rect_cells(a, b).into_iter()
        .filter(|c| c.x == x0 || c.x == x1 || c.y == y0 || c.y == y1)
        .collect()
}

/// The draft shape shown while a build pinch is held.
#[derive(Clone, Debug, PartialEq)]
pub struct Blueprint {
    pub start: Cell,
    pub end:   Cell,
    /// Dominant drag direction on the last update; `None` before the first.
    pub axis:  Option<Axis>,
    pub cells: BTreeSet<Cell>,
}

impl Blueprint {
    pub fn new(start: Cell) -> Self {
        Blueprint { start, end: start, axis: None, cells: rect_cells(start, start) }
    }

    /// Follow the cursor, snapping the end onto the dominant axis.
    pub fn drag_to(&mut self, cursor: Cell) {
        let dx = cursor.x - self.start.x;
        let dy = cursor.y - self.start.y;
        let (axis, end) = if dx.abs() >= dy.abs() {
            (Axis::Horizontal, Cell::new(cursor.x, self.start.y))
        } else {
            (Axis::Vertical, Cell::new(self.start.x, cursor.y))
        };
        self.axis = Some(axis);
        self.end = end;
        self.cells = rect_cells(self.start, end);
    }

    pub fn outline(&self) -> BTreeSet<Cell> { rect_outline(self.start, self.end) }
}

// ════════════════════════════════════════════════════════════════════════════
// Drags and per-frame output
// ════════════════════════════════════════════════════════════════════════════

/// A fist drag in progress.
#[derive(Clone, Debug)]
struct MoveDrag {
    id:      StructureId,
    anchor:  Cell,
    /// Offset already applied to the structure.
    applied: (i32, i32),
    before:  Scene,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Adjust { Scale, Extrude }

impl Adjust {
    fn feedback(self) -> &'static str {
        match self {
            Adjust::Scale   => "SCALE OK",
            Adjust::Extrude => "EXTRUDE OK",
        }
    }
}

/// A vertical pinch drag in progress (scale or extrude).
#[derive(Clone, Debug)]
struct AdjustDrag {
    kind:   Adjust,
    id:     StructureId,
    last_y: i32,
    before: Scene,
}

/// A hold-to-confirm ring to draw this frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Indicator {
    pub x:         i32,
    pub y:         i32,
    pub radius:    i32,
    pub thickness: i32,
    pub progress:  f32,
}

/// What the overlay needs to know about the frame just processed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FrameReport {
    /// Index fingertip in canvas pixels.
    pub cursor:       Option<(i32, i32)>,
    pub cursor_cell:  Option<Cell>,
    pub hovered_menu: Option<usize>,
    pub indicators:   Vec<Indicator>,
    /// Live height while extruding.
    pub height:       Option<u32>,
    /// Live scale while scaling.
    pub scale:        Option<f32>,
}

#[derive(Clone, Debug)]
struct Feedback {
    text: &'static str,
    at:   Instant,
}

// ════════════════════════════════════════════════════════════════════════════
// EditorSession
// ════════════════════════════════════════════════════════════════════════════

pub struct EditorSession {
    config:     SessionConfig,
    scene_path: Option<PathBuf>,

    // ── document ─────────────────────────────────────────────────────────
    scene:      Scene,
    history:    History,

    // ── mode / lock ──────────────────────────────────────────────────────
    mode:       Mode,
    locked:     bool,
    lock_gate:  HoldGate,

    // ── build ────────────────────────────────────────────────────────────
    build_gate: HoldGate,
    blueprint:  Option<Blueprint>,

    // ── drags ────────────────────────────────────────────────────────────
    move_gate:  HoldGate,
    moving:     Option<MoveDrag>,
    adjusting:  Option<AdjustDrag>,

    // ── edge latches ─────────────────────────────────────────────────────
    menu_latch:  bool,
    group_latch: bool,

    feedback:   Option<Feedback>,
}

impl EditorSession {
    /// A session over an empty scene.  With a `scene_path`, every commit and
    /// undo/redo writes the snapshot there.
    pub fn new(config: SessionConfig, scene_path: Option<PathBuf>) -> Self {
        EditorSession {
            history:    History::new(config.history_limit),
            lock_gate:  HoldGate::new(config.hold),
            build_gate: HoldGate::new(config.hold),
            move_gate:  HoldGate::new(config.hold),
            config,
            scene_path,
            scene:      Scene::new(),
            mode:       Mode::Build,
            locked:     false,
            blueprint:  None,
            moving:     None,
            adjusting:  None,
            menu_latch:  false,
            group_latch: false,
            feedback:   None,
        }
    }

    /// Start from whatever the snapshot file holds.  Returns whether a
    /// scene was loaded.  A loaded scene starts with empty history.
    pub fn resume(&mut self) -> bool {
        let Some(path) = self.scene_path.clone() else { return false };
        let loaded = self.scene.load(&path);
        if loaded {
            self.history.clear();
            log::info!("resumed {} structure(s) from {}", self.scene.len(), path.display());
        }
        loaded
    }

    // ── accessors ────────────────────────────────────────────────────────

    pub fn config(&self)    -> &SessionConfig     { &self.config }
    pub fn scene(&self)     -> &Scene             { &self.scene }
    pub fn history(&self)   -> &History           { &self.history }
    pub fn mode(&self)      -> Mode               { self.mode }
    pub fn is_locked(&self) -> bool               { self.locked }
    pub fn blueprint(&self) -> Option<&Blueprint> { self.blueprint.as_ref() }
    pub fn is_moving(&self) -> bool               { self.moving.is_some() }

    /// The commit label, while it is still fresh.
    pub fn feedback(&self, now: Instant) -> Option<&'static str> {
        self.feedback.as_ref()
            .filter(|f| now.saturating_duration_since(f.at) < self.config.feedback)
            .map(|f| f.text)
    }

    // ════════════════════════════════════════════════════════════════════
    // Per-frame processing
    // ════════════════════════════════════════════════════════════════════

    pub fn step(&mut self, frame: &HandFrame, now: Instant) -> FrameReport {
        let threshold = self.config.pinch_threshold;
        let hand = HandSignals::primary(frame, threshold);
        let both = FrameSignals::classify(frame, threshold);

        let cursor = hand.tip.map(|t| t.to_pixel(self.config.width, self.config.height));
        let cell = cursor.map(|(px, py)| self.pixel_to_cell(px, py));
        let mut report = FrameReport {
            cursor,
            cursor_cell: cell,
            hovered_menu: cursor.and_then(|(px, py)| self.config.menu.hit(px, py)),
            ..FrameReport::default()
        };

        self.update_lock(both, now, &mut report);
        self.update_group(hand.pinch, cell);
        self.update_move(hand.fist, cell, cursor, now, &mut report);
        self.update_menu(hand.pinch, report.hovered_menu);
        self.update_build(&hand, cell, cursor, now, &mut report);

        let editable = !self.locked && self.scene.active_structure().is_some();
        let y = cursor.map(|(_, y)| y);
        self.update_adjust(Adjust::Scale,   editable && self.mode == Mode::Scale,   hand.pinch, y, now, &mut report);
        self.update_adjust(Adjust::Extrude, editable && self.mode == Mode::Extrude, hand.pinch, y, now, &mut report);

        report
    }

    fn pixel_to_cell(&self, px: i32, py: i32) -> Cell {
        let g = self.config.grid.max(1);
        Cell::new(px.div_euclid(g), py.div_euclid(g))
    }

    fn canvas_center(&self) -> (i32, i32) {
        (self.config.width as i32 / 2, self.config.height as i32 / 2)
    }

    // ── 1. two-hand lock ─────────────────────────────────────────────────

    fn update_lock(&mut self, both: FrameSignals, now: Instant, report: &mut FrameReport) {
        let arming = both.two_hand_ready() && !self.locked;
        let hold = self.lock_gate.update(arming, now);
        if let Some(progress) = hold.indicator() {
            let (x, y) = self.canvas_center();
            report.indicators.push(Indicator { x, y, radius: 40, thickness: 3, progress });
        }
        if hold.is_confirmed() {
            self.locked = true;
            self.end_drags(now);
            log::info!("editor locked");
        } else if self.locked && both.open_hands < 2 {
            self.locked = false;
            log::info!("editor unlocked");
        }
    }

    // ── 2. group selection ───────────────────────────────────────────────

    fn update_group(&mut self, pinch: bool, cell: Option<Cell>) {
        if self.mode != Mode::Group { return; }
        if !pinch {
            self.group_latch = false;
            return;
        }
        if self.group_latch { return; }
        if let Some(id) = cell.and_then(|c| self.scene.structure_at(c)) {
            self.scene.set_active(id);
            self.group_latch = true;
            log::debug!("selected structure {}", id);
        }
    }

    // ── 3. fist move ─────────────────────────────────────────────────────

    fn update_move(
        &mut self,
        fist: bool,
        cell: Option<Cell>,
        cursor: Option<(i32, i32)>,
        now: Instant,
        report: &mut FrameReport,
    ) {
        let target = self.scene.active();
        let allowed = fist && !self.locked && self.blueprint.is_none();

        let (Some(cell), Some(id), true) = (cell, target, allowed) else {
            self.move_gate.reset();
            if let Some(drag) = self.moving.take() {
                self.commit(drag.before, "MOVE OK", now);
            }
            return;
        };

        if let Some(drag) = self.moving.as_mut() {
            let offset = (cell.x - drag.anchor.x, cell.y - drag.anchor.y);
            if offset != drag.applied {
                let (dx, dy) = (offset.0 - drag.applied.0, offset.1 - drag.applied.1);
                self.scene.move_structure(drag.id, dx, dy);
                drag.applied = offset;
            }
            return;
        }

        let hold = self.move_gate.update(true, now);
        if let (Some(progress), Some((x, y))) = (hold.indicator(), cursor) {
            report.indicators.push(Indicator { x, y, radius: 28, thickness: 3, progress });
        }
        if hold.is_confirmed() {
            self.moving = Some(MoveDrag {
                id,
                anchor:  cell,
                applied: (0, 0),
                before:  self.scene.clone(),
            });
            log::debug!("move armed for {}", id);
        }
    }

    // ── 4. menu ──────────────────────────────────────────────────────────

    fn update_menu(&mut self, pinch: bool, hovered: Option<usize>) {
        if !pinch {
            self.menu_latch = false;
            return;
        }
        if self.menu_latch { return; }
        if let Some(mode) = hovered.map(|i| Mode::ALL[i]) {
            self.mode = mode;
            self.menu_latch = true;
            log::debug!("mode {}", mode.label());
        }
    }

    // ── 5. build ─────────────────────────────────────────────────────────

    fn update_build(
        &mut self,
        hand: &HandSignals,
        cell: Option<Cell>,
        cursor: Option<(i32, i32)>,
        now: Instant,
        report: &mut FrameReport,
    ) {
        if !hand.pinch { self.build_gate.reset(); }
        if self.mode != Mode::Build || self.locked { return; }

        if self.blueprint.is_none() {
            let Some(cell) = cell else { return };
            let hold = self.build_gate.update(hand.pinch, now);
            if let (Some(progress), Some((x, y))) = (hold.indicator(), cursor) {
                report.indicators.push(Indicator { x, y, radius: 20, thickness: 3, progress });
            }
            if hold.is_confirmed() {
                self.blueprint = Some(Blueprint::new(cell));
                log::debug!("blueprint started at {}", cell);
            }
        } else if hand.pinch {
            if let (Some(bp), Some(cell)) = (self.blueprint.as_mut(), cell) {
                bp.drag_to(cell);
            }
        } else if hand.open {
            self.commit_build(now);
        }
    }

    fn commit_build(&mut self, now: Instant) {
        let Some(bp) = self.blueprint.take() else { return };
        self.build_gate.reset();

        let before = self.scene.clone();
        let id = self.scene.add_structure(bp.cells, 1.0, 1);
        let merged = self.scene.auto_merge();
        self.scene.set_active(merged.resolve(id));
        self.commit(before, "BUILD OK", now);
    }

    // ── 6/7. scale and extrude ───────────────────────────────────────────

    fn update_adjust(
        &mut self,
        kind: Adjust,
        allowed: bool,
        pinch: bool,
        y: Option<i32>,
        now: Instant,
        report: &mut FrameReport,
    ) {
        let mine = self.adjusting.as_ref().is_some_and(|d| d.kind == kind);
        let (Some(y), Some(id), true) = (y, self.scene.active(), allowed && pinch) else {
            if mine {
                if let Some(drag) = self.adjusting.take() {
                    self.commit(drag.before, kind.feedback(), now);
                }
            }
            return;
        };

        if !mine {
            // no new drag while pointing at the menu
            if self.adjusting.is_none() && report.hovered_menu.is_none() {
                self.adjusting = Some(AdjustDrag { kind, id, last_y: y, before: self.scene.clone() });
            }
            return;
        }

        let step = self.config.drag_step_px;
        let scale_step = self.config.scale_step;
        if let Some(drag) = self.adjusting.as_mut() {
            if (drag.last_y - y).abs() > step {
                // upward is growth
                let dir = if y < drag.last_y { 1 } else { -1 };
                match kind {
                    Adjust::Extrude => { self.scene.adjust_height(drag.id, dir as i64); }
                    Adjust::Scale   => { self.scene.scale_structure(drag.id, dir as f32 * scale_step); }
                }
                drag.last_y = y;
            }
            if let Some(s) = self.scene.get(drag.id) {
                match kind {
                    Adjust::Extrude => report.height = Some(s.height),
                    Adjust::Scale   => report.scale  = Some(s.scale),
                }
            }
        }
    }

    // ════════════════════════════════════════════════════════════════════
    // Commits, undo, redo
    // ════════════════════════════════════════════════════════════════════

    fn commit(&mut self, before: Scene, label: &'static str, now: Instant) {
        if before != self.scene {
            self.history.record(before);
        }
        self.persist();
        self.feedback = Some(Feedback { text: label, at: now });
        log::info!("{} ({} structure(s))", label, self.scene.len());
    }

    /// Finish any in-progress drag as though the hand had been released.
    fn end_drags(&mut self, now: Instant) {
        self.move_gate.reset();
        if let Some(drag) = self.moving.take() {
            self.commit(drag.before, "MOVE OK", now);
        }
        if let Some(drag) = self.adjusting.take() {
            self.commit(drag.before, drag.kind.feedback(), now);
        }
    }

    fn persist(&self) {
        if let Some(path) = &self.scene_path {
            self.scene.export(path);
        }
    }

    /// Restore the previous snapshot.  In-progress drags are dropped.
    pub fn undo(&mut self, now: Instant) -> bool {
        self.cancel_drags();
        match self.history.undo(&self.scene) {
            Some(prev) => {
                self.scene.restore(prev);
                self.persist();
                self.feedback = Some(Feedback { text: "UNDO", at: now });
                log::info!("UNDO ({} left)", self.history.undo_depth());
                true
            }
            None => false,
        }
    }

    pub fn redo(&mut self, now: Instant) -> bool {
        self.cancel_drags();
        match self.history.redo(&self.scene) {
            Some(next) => {
                self.scene.restore(next);
                self.persist();
                self.feedback = Some(Feedback { text: "REDO", at: now });
                log::info!("REDO ({} left)", self.history.redo_depth());
                true
            }
            None => false,
        }
    }

    fn cancel_drags(&mut self) {
        self.moving = None;
        self.adjusting = None;
        self.move_gate.reset();
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════
