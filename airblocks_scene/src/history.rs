//! Undo/redo over full scene snapshots.
//!
//! Every entry is a deep copy of the [`Scene`] (cells, scales, heights and
//! active handle).  Recording a new action clears the redo side; the undo
//! side is bounded and drops its oldest snapshot when full.

use std::collections::VecDeque;

use crate::scene::Scene;

/// Maximum number of snapshots kept on the undo side.
pub const DEFAULT_HISTORY_LIMIT: usize = 30;

#[derive(Debug)]
pub struct History {
    undo:  VecDeque<Scene>,
    redo:  Vec<Scene>,
    limit: usize,
}

impl Default for History {
    fn default() -> Self { History::new(DEFAULT_HISTORY_LIMIT) }
}

impl History {
    pub fn new(limit: usize) -> Self {
        History { undo: VecDeque::new(), redo: Vec::new(), limit: limit.max(1) }
    }

    /// Record the state *before* a new action.  Clears redo.
    pub fn record(&mut self, before: Scene) {
        self.push_undo(before);
        self.redo.clear();
    }

    /// Step back.  `current` moves onto the redo side and the previous
    /// snapshot is returned for the caller to restore.
    pub fn undo(&mut self, current: &Scene) -> Option<Scene> {
        let prev = self.undo.pop_back()?;
        self.redo.push(current.clone());
        Some(prev)
    }

    /// Step forward again after an undo.
    pub fn redo(&mut self, current: &Scene) -> Option<Scene> {
        let next = self.redo.pop()?;
        self.push_undo(current.clone());
        Some(next)
    }

    pub fn can_undo(&self)   -> bool  { !self.undo.is_empty() }
    pub fn can_redo(&self)   -> bool  { !self.redo.is_empty() }
    pub fn undo_depth(&self) -> usize { self.undo.len() }
    pub fn redo_depth(&self) -> usize { self.redo.len() }

    pub fn clear(&mut self) {
        self.undo.clear();
        self.redo.clear();
    }

    fn push_undo(&mut self, snapshot: Scene) {
        self.undo.push_back(snapshot);
        while self.undo.len() > self.limit {
            self.undo.pop_front();
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Cell;

    fn scene_with(n: i32) -> Scene {
        let mut s = Scene::new();
        for i in 0..n {
            s.add_structure([Cell::new(i * 3, 0)], 1.0, 1);
        }
        s
    }

    #[test]
    fn undo_then_redo_is_identity() {
        let mut history = History::default();
        let mut scene = scene_with(1);

        history.record(scene.clone());
        let id = scene.add_structure([Cell::new(10, 10)], 1.5, 4);
        scene.adjust_height(id, 2);
        let before_undo = scene.clone();

        scene = history.undo(&scene).unwrap();
        assert_eq!(scene, scene_with(1));

        scene = history.redo(&scene).unwrap();
        assert_eq!(scene, before_undo);
        assert_eq!(scene.active(), before_undo.active());
    }

    #[test]
    fn record_clears_redo() {
        let mut history = History::default();
        let scene = scene_with(1);
        history.record(scene_with(0));
        let restored = history.undo(&scene).unwrap();
        assert!(history.can_redo());
        history.record(restored);
        assert!(!history.can_redo());
    }

    #[test]
    fn undo_side_is_bounded() {
        let mut history = History::default();
        for i in 0..45 {
            history.record(scene_with(i % 3));
        }
        assert_eq!(history.undo_depth(), DEFAULT_HISTORY_LIMIT);
    }

    #[test]
    fn redo_moves_current_onto_undo() {
        let mut history = History::default();
        history.record(scene_with(0));
        let current = scene_with(2);
        let back = history.undo(&current).unwrap();
        assert_eq!(history.undo_depth(), 0);
        let forward = history.redo(&back).unwrap();
        assert_eq!(forward, current);
        assert_eq!(history.undo_depth(), 1);
        assert_eq!(history.redo_depth(), 0);
    }

    #[test]
    fn empty_history_returns_none() {
        let mut history = History::default();
        let scene = scene_with(1);
        assert!(history.undo(&scene).is_none());
        assert!(history.redo(&scene).is_none());
        assert!(!history.can_undo());
    }

    #[test]
    fn clear_empties_both_sides() {
        let mut history = History::default();
        history.record(scene_with(0));
        history.record(scene_with(1));
        history.undo(&scene_with(2));
        history.clear();
        assert_eq!((history.undo_depth(), history.redo_depth()), (0, 0));
    }
}
