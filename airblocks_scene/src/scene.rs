//! Scene model — cells, structures, and the ordered structure list.

use std::collections::BTreeSet;
use std::fmt;

use glam::Vec3;
use serde::{Deserialize, Serialize};

// ════════════════════════════════════════════════════════════════════════════
// Limits
// ════════════════════════════════════════════════════════════════════════════

pub const MIN_SCALE:  f32 = 0.5;
pub const MAX_SCALE:  f32 = 2.0;
pub const MIN_HEIGHT: u32 = 1;
pub const MAX_HEIGHT: u32 = 20;

/// Clamp a scale factor into `MIN_SCALE..=MAX_SCALE`.
pub fn clamp_scale(scale: f32) -> f32 {
    if scale.is_nan() { return 1.0; }
    scale.clamp(MIN_SCALE, MAX_SCALE)
}

/// Clamp a height into `MIN_HEIGHT..=MAX_HEIGHT`.
pub fn clamp_height(height: i64) -> u32 {
    height.clamp(MIN_HEIGHT as i64, MAX_HEIGHT as i64) as u32
}

// ════════════════════════════════════════════════════════════════════════════
// Cell
// ════════════════════════════════════════════════════════════════════════════

/// One integer grid cell.  Persisted as a `[x, y]` pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self { Cell { x, y } }

    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Cell { x: self.x + dx, y: self.y + dy }
    }
}

impl From<[i32; 2]> for Cell {
    fn from([x, y]: [i32; 2]) -> Self { Cell { x, y } }
}

impl From<Cell> for [i32; 2] {
    fn from(c: Cell) -> Self { [c.x, c.y] }
}

impl From<(i32, i32)> for Cell {
    fn from((x, y): (i32, i32)) -> Self { Cell { x, y } }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Structure
// ════════════════════════════════════════════════════════════════════════════

/// Stable handle to a structure within one [`Scene`].
///
/// Handles are allocated monotonically and never reused by the scene that
/// issued them, including across [`Scene::restore`].  A scene replaced by
/// [`Scene::load`] issues fresh handles.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(u64);

impl fmt::Display for StructureId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// A set of grid cells extruded `height` levels, drawn at `scale`.
#[derive(Clone, Debug, PartialEq)]
pub struct Structure {
    pub id:     StructureId,
    pub cells:  BTreeSet<Cell>,
    pub scale:  f32,
    pub height: u32,
}

impl Structure {
    pub fn contains(&self, cell: Cell) -> bool { self.cells.contains(&cell) }

    /// Voxel count: cells × stacked levels.
    pub fn block_count(&self) -> usize { self.cells.len() * self.height as usize }
}

// ════════════════════════════════════════════════════════════════════════════
// Stats / bounds
// ════════════════════════════════════════════════════════════════════════════

/// Aggregate numbers shown on the viewer HUD.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub struct SceneStats {
    pub structures: usize,
    pub blocks:     usize,
    /// Positional index of the active structure.
    pub active:     Option<usize>,
    pub max_height: u32,
}

/// Axis-aligned focus volume over voxel positions `(x, level, y)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SceneBounds {
    pub center: Vec3,
    /// Suggested camera distance.
    pub radius: f32,
}

impl Default for SceneBounds {
    fn default() -> Self {
        SceneBounds { center: Vec3::ZERO, radius: 10.0 }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Scene
// ════════════════════════════════════════════════════════════════════════════

/// Ordered collection of structures plus the active handle.
///
/// Mutators taking a [`StructureId`] return `false` and leave the scene
/// untouched when the handle is unknown.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    structures: Vec<Structure>,
    active:     Option<StructureId>,
    next_id:    u64,
}

impl Scene {
    pub fn new() -> Self { Scene::default() }

    // ── queries ──────────────────────────────────────────────────────────

    pub fn len(&self)      -> usize        { self.structures.len() }
    pub fn is_empty(&self) -> bool         { self.structures.is_empty() }
    pub fn structures(&self) -> &[Structure] { &self.structures }

    pub fn get(&self, id: StructureId) -> Option<&Structure> {
        self.structures.iter().find(|s| s.id == id)
    }

    fn get_mut(&mut self, id: StructureId) -> Option<&mut Structure> {
        self.structures.iter_mut().find(|s| s.id == id)
    }

    pub fn index_of(&self, id: StructureId) -> Option<usize> {
        self.structures.iter().position(|s| s.id == id)
    }

    pub fn active(&self) -> Option<StructureId> { self.active }

    pub fn active_index(&self) -> Option<usize> {
        self.active.and_then(|id| self.index_of(id))
    }

    pub fn active_structure(&self) -> Option<&Structure> {
        self.active.and_then(|id| self.get(id))
    }

    /// First structure (in list order) containing `cell`.
    pub fn structure_at(&self, cell: Cell) -> Option<StructureId> {
        self.structures.iter().find(|s| s.contains(cell)).map(|s| s.id)
    }

    // ── mutation ─────────────────────────────────────────────────────────

    /// Append a structure and make it active.
    pub fn add_structure<I>(&mut self, cells: I, scale: f32, height: u32) -> StructureId
    where
        I: IntoIterator<Item = Cell>,
    {
        let id = StructureId(self.next_id);
        self.next_id += 1;
        self.structures.push(Structure {
            id,
            cells:  cells.into_iter().collect(),
            scale:  clamp_scale(scale),
            height: clamp_height(height as i64),
        });
        self.active = Some(id);
        id
    }

    pub fn add_cell(&mut self, id: StructureId, cell: Cell) -> bool {
        match self.get_mut(id) {
            Some(s) => { s.cells.insert(cell); true }
            None    => false,
        }
    }

    /// Ignored for unknown handles.
    pub fn set_active(&mut self, id: StructureId) -> bool {
        if self.get(id).is_some() {
            self.active = Some(id);
            true
        } else {
            false
        }
    }

    /// Translate every cell of a structure by `(dx, dy)`.
    pub fn move_structure(&mut self, id: StructureId, dx: i32, dy: i32) -> bool {
        match self.get_mut(id) {
            Some(s) => {
                s.cells = s.cells.iter().map(|c| c.offset(dx, dy)).collect();
                true
            }
            None => false,
        }
    }

    /// Add `delta` to a structure's scale, clamped to `0.5..=2.0`.
    pub fn scale_structure(&mut self, id: StructureId, delta: f32) -> bool {
        match self.get_mut(id) {
            Some(s) => { s.scale = clamp_scale(s.scale + delta); true }
            None    => false,
        }
    }

    pub fn set_height(&mut self, id: StructureId, height: i64) -> bool {
        match self.get_mut(id) {
            Some(s) => { s.height = clamp_height(height); true }
            None    => false,
        }
    }

    pub fn adjust_height(&mut self, id: StructureId, delta: i64) -> bool {
        match self.get(id).map(|s| s.height as i64 + delta) {
            Some(h) => self.set_height(id, h),
            None    => false,
        }
    }

    /// Become `snapshot` (an undo/redo state) without rewinding the handle
    /// counter, so handles issued since the snapshot stay retired.
    pub fn restore(&mut self, snapshot: Scene) {
        let next_id = self.next_id.max(snapshot.next_id);
        *self = snapshot;
        self.next_id = next_id;
    }

    /// Swap in a new structure list (merge results, loads).  The active
    /// handle is dropped if it no longer names a structure.
    pub(crate) fn replace_structures(&mut self, structures: Vec<Structure>) {
        self.structures = structures;
        if let Some(id) = self.active {
            if self.get(id).is_none() { self.active = None; }
        }
    }

    /// Rebuild from persisted `(cells, scale, height)` triples with fresh
    /// handles.  The first structure (if any) becomes active.
    pub(crate) fn rebuild<I>(&mut self, records: I)
    where
        I: IntoIterator<Item = (BTreeSet<Cell>, f32, u32)>,
    {
        let mut structures = Vec::new();
        for (cells, scale, height) in records {
            let id = StructureId(self.next_id);
            self.next_id += 1;
            structures.push(Structure {
                id,
                cells,
                scale:  clamp_scale(scale),
                height: clamp_height(height as i64),
            });
        }
        self.active = structures.first().map(|s| s.id);
        self.structures = structures;
    }

    // ── aggregates ───────────────────────────────────────────────────────

    pub fn stats(&self) -> SceneStats {
        SceneStats {
            structures: self.structures.len(),
            blocks:     self.structures.iter().map(Structure::block_count).sum(),
            active:     self.active_index(),
            max_height: self.structures.iter().map(|s| s.height).max().unwrap_or(0),
        }
    }

    /// Bounding volume over all voxels, padded into a camera distance.
    pub fn bounds(&self) -> SceneBounds {
        let mut min = Vec3::splat(f32::INFINITY);
        let mut max = Vec3::splat(f32::NEG_INFINITY);
        let mut any = false;

        for s in &self.structures {
            if s.cells.is_empty() { continue; }
            any = true;
            let top = (s.height - 1) as f32;
            for c in &s.cells {
                min = min.min(Vec3::new(c.x as f32, 0.0, c.y as f32));
                max = max.max(Vec3::new(c.x as f32, top, c.y as f32));
            }
        }

        if !any { return SceneBounds::default(); }

        let extent = max - min;
        SceneBounds {
            center: (min + max) * 0.5,
            radius: extent.max_element() * 1.5 + 2.0,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn cells(list: &[(i32, i32)]) -> Vec<Cell> {
        list.iter().map(|&c| Cell::from(c)).collect()
    }

    #[test]
    fn add_structure_becomes_active() {
        let mut scene = Scene::new();
        let a = scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        assert_eq!(scene.active(), Some(a));
        let b = scene.add_structure(cells(&[(5, 5)]), 1.0, 1);
        assert_eq!(scene.active(), Some(b));
        assert_eq!(scene.active_index(), Some(1));
    }

    #[test]
    fn handles_are_not_reused() {
        let mut scene = Scene::new();
        let a = scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        let b = scene.add_structure(cells(&[(1, 1)]), 1.0, 1);
        assert_ne!(a, b);
    }

    #[test]
    fn restore_keeps_handles_retired() {
        let mut scene = Scene::new();
        scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        let snapshot = scene.clone();
        let b = scene.add_structure(cells(&[(5, 5)]), 1.0, 1);

        scene.restore(snapshot.clone());
        assert_eq!(scene.structures(), snapshot.structures());
        assert_eq!(scene.active(), snapshot.active());
        assert!(scene.get(b).is_none());

        let c = scene.add_structure(cells(&[(7, 7)]), 1.0, 1);
        assert_ne!(c, b);
    }

    #[test]
    fn move_structure_translates_cells() {
        let mut scene = Scene::new();
        let id = scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        assert!(scene.move_structure(id, 2, 3));
        let s = scene.get(id).unwrap();
        assert_eq!(s.cells.iter().copied().collect::<Vec<_>>(), cells(&[(2, 3)]));
    }

    #[test]
    fn unknown_handle_is_noop() {
        let mut scene = Scene::new();
        let id = scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        let mut other = Scene::new();
        other.add_structure(cells(&[(9, 9)]), 1.0, 1);
        let stranger = other.add_structure(cells(&[(8, 8)]), 1.0, 1);

        let before = scene.clone();
        assert!(!scene.add_cell(stranger, Cell::new(1, 1)));
        assert!(!scene.move_structure(stranger, 1, 1));
        assert!(!scene.scale_structure(stranger, 0.5));
        assert!(!scene.set_active(stranger));
        assert_eq!(scene, before);
        assert_eq!(scene.active(), Some(id));
    }

    #[test]
    fn add_cell_grows_structure() {
        let mut scene = Scene::new();
        let id = scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        scene.add_cell(id, Cell::new(0, 1));
        scene.add_cell(id, Cell::new(0, 1));
        assert_eq!(scene.get(id).unwrap().cells.len(), 2);
    }

    #[test]
    fn scale_is_clamped() {
        let mut scene = Scene::new();
        let id = scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        for _ in 0..50 { scene.scale_structure(id, 0.3); }
        assert_eq!(scene.get(id).unwrap().scale, MAX_SCALE);
        for _ in 0..50 { scene.scale_structure(id, -0.3); }
        assert_eq!(scene.get(id).unwrap().scale, MIN_SCALE);
    }

    #[test]
    fn height_is_clamped() {
        let mut scene = Scene::new();
        let id = scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        for _ in 0..40 { scene.adjust_height(id, 1); }
        assert_eq!(scene.get(id).unwrap().height, MAX_HEIGHT);
        for _ in 0..40 { scene.adjust_height(id, -1); }
        assert_eq!(scene.get(id).unwrap().height, MIN_HEIGHT);
    }

    #[test]
    fn add_structure_clamps_inputs() {
        let mut scene = Scene::new();
        let id = scene.add_structure(cells(&[(0, 0)]), 9.0, 0);
        let s = scene.get(id).unwrap();
        assert_eq!(s.scale, MAX_SCALE);
        assert_eq!(s.height, MIN_HEIGHT);
    }

    #[test]
    fn structure_at_finds_first_owner() {
        let mut scene = Scene::new();
        let a = scene.add_structure(cells(&[(0, 0), (1, 0)]), 1.0, 1);
        scene.add_structure(cells(&[(1, 0)]), 1.0, 1);
        assert_eq!(scene.structure_at(Cell::new(1, 0)), Some(a));
        assert_eq!(scene.structure_at(Cell::new(7, 7)), None);
    }

    #[test]
    fn stats_count_stacked_blocks() {
        let mut scene = Scene::new();
        scene.add_structure(cells(&[(0, 0), (1, 0)]), 1.0, 3);
        scene.add_structure(cells(&[(5, 5)]), 1.0, 2);
        let stats = scene.stats();
        assert_eq!(stats.structures, 2);
        assert_eq!(stats.blocks, 8);
        assert_eq!(stats.active, Some(1));
        assert_eq!(stats.max_height, 3);
    }

    #[test]
    fn bounds_of_empty_scene() {
        assert_eq!(Scene::new().bounds(), SceneBounds::default());
    }

    #[test]
    fn bounds_cover_levels() {
        let mut scene = Scene::new();
        scene.add_structure(cells(&[(0, 0), (4, 2)]), 1.0, 3);
        let b = scene.bounds();
        assert_eq!(b.center, Vec3::new(2.0, 1.0, 1.0));
        assert_eq!(b.radius, 4.0 * 1.5 + 2.0);
    }

    #[test]
    fn cell_serializes_as_pair() {
        let json = serde_json::to_string(&Cell::new(3, -4)).unwrap();
        assert_eq!(json, "[3,-4]");
        let back: Cell = serde_json::from_str("[7,8]").unwrap();
        assert_eq!(back, Cell::new(7, 8));
    }
}
