//! Auto-merge — fold touching structures together after a build.
//!
//! One pass over the list, first match wins.  A structure that touches an
//! earlier *already merged* entry is folded into it; otherwise it is kept as
//! a new entry.  Because earlier entries are never revisited, a chain such as
//! `A … C … B` (A touches B, B touches C, A does not touch C) leaves two
//! structures behind after one pass even though they now touch.  Callers
//! that want full transitivity must call again until nothing changes.

use std::collections::BTreeSet;

use crate::scene::{Cell, Scene, Structure, StructureId};

const NEIGHBOURS: [(i32, i32); 5] = [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)];

/// True when the sets share a cell or an orthogonally adjacent pair.
pub fn cells_touch(a: &BTreeSet<Cell>, b: &BTreeSet<Cell>) -> bool {
    a.iter().any(|c| {
        NEIGHBOURS.iter().any(|&(dx, dy)| b.contains(&c.offset(dx, dy)))
    })
}

/// Which handles disappeared into which survivors during a merge pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeReport {
    /// `(absorbed, survivor)` pairs in merge order.
    pub absorbed: Vec<(StructureId, StructureId)>,
}

impl MergeReport {
    pub fn merged_any(&self) -> bool { !self.absorbed.is_empty() }

    /// The handle that now holds `id`'s cells.
    pub fn resolve(&self, id: StructureId) -> StructureId {
        self.absorbed.iter()
            .find(|(gone, _)| *gone == id)
            .map(|&(_, into)| into)
            .unwrap_or(id)
    }
}

impl Scene {
    /// Single-pass union of touching structures.
    ///
    /// The survivor keeps the earlier structure's handle and scale and takes
    /// the larger of the two heights.  The active handle follows its cells.
    pub fn auto_merge(&mut self) -> MergeReport {
        let mut report = MergeReport::default();
        let mut merged: Vec<Structure> = Vec::with_capacity(self.len());

        for s in self.structures().iter().cloned() {
            match merged.iter_mut().find(|m| cells_touch(&s.cells, &m.cells)) {
                Some(m) => {
                    m.cells.extend(s.cells.iter().copied());
                    m.height = m.height.max(s.height);
                    report.absorbed.push((s.id, m.id));
                }
                None => merged.push(s),
            }
        }

        if report.merged_any() {
            let active = self.active().map(|id| report.resolve(id));
            self.replace_structures(merged);
            if let Some(id) = active { self.set_active(id); }
            log::debug!("auto-merge folded {} structure(s)", report.absorbed.len());
        }
        report
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;

    fn set(list: &[(i32, i32)]) -> BTreeSet<Cell> {
        list.iter().map(|&c| Cell::from(c)).collect()
    }

    #[test]
    fn touch_detects_adjacent_and_overlap() {
        assert!(cells_touch(&set(&[(0, 0)]), &set(&[(1, 0)])));
        assert!(cells_touch(&set(&[(0, 0)]), &set(&[(0, -1)])));
        assert!(cells_touch(&set(&[(2, 2)]), &set(&[(2, 2)])));
    }

    #[test]
    fn diagonal_does_not_touch() {
        assert!(!cells_touch(&set(&[(0, 0)]), &set(&[(1, 1)])));
        assert!(!cells_touch(&set(&[(0, 0)]), &set(&[(2, 0)])));
    }

    #[test]
    fn merge_keeps_first_scale_and_max_height() {
        let mut scene = Scene::new();
        let a = scene.add_structure(set(&[(0, 0)]), 0.5, 2);
        let b = scene.add_structure(set(&[(1, 0)]), 2.0, 7);
        let report = scene.auto_merge();

        assert_eq!(scene.len(), 1);
        let s = &scene.structures()[0];
        assert_eq!(s.id, a);
        assert_eq!(s.scale, 0.5);
        assert_eq!(s.height, 7);
        assert_eq!(s.cells, set(&[(0, 0), (1, 0)]));
        assert_eq!(report.resolve(b), a);
    }

    #[test]
    fn active_follows_absorbed_cells() {
        let mut scene = Scene::new();
        let a = scene.add_structure(set(&[(0, 0)]), 1.0, 1);
        scene.add_structure(set(&[(0, 1)]), 1.0, 1);
        scene.auto_merge();
        assert_eq!(scene.active(), Some(a));
    }

    #[test]
    fn separate_structures_untouched() {
        let mut scene = Scene::new();
        scene.add_structure(set(&[(0, 0)]), 1.0, 1);
        scene.add_structure(set(&[(5, 5)]), 1.0, 1);
        let before = scene.clone();
        let report = scene.auto_merge();
        assert!(!report.merged_any());
        assert_eq!(scene, before);
    }

    #[test]
    fn idempotent_once_merged() {
        let mut scene = Scene::new();
        scene.add_structure(set(&[(0, 0)]), 1.0, 1);
        scene.add_structure(set(&[(1, 0)]), 1.0, 1);
        scene.add_structure(set(&[(9, 9)]), 1.0, 1);
        scene.auto_merge();
        let once = scene.clone();
        let report = scene.auto_merge();
        assert!(!report.merged_any());
        assert_eq!(scene, once);
    }

    #[test]
    fn chain_is_not_fully_merged_in_one_pass() {
        // A=(0,0) and C=(2,0) do not touch; B=(1,0) bridges them but comes last.
        let mut scene = Scene::new();
        scene.add_structure(set(&[(0, 0)]), 1.0, 1);
        scene.add_structure(set(&[(2, 0)]), 1.0, 1);
        scene.add_structure(set(&[(1, 0)]), 1.0, 1);

        scene.auto_merge();
        assert_eq!(scene.len(), 2);
        let s = scene.structures();
        assert!(cells_touch(&s[0].cells, &s[1].cells));

        // A second pass finishes the job.
        scene.auto_merge();
        assert_eq!(scene.len(), 1);
        assert_eq!(scene.structures()[0].cells, set(&[(0, 0), (1, 0), (2, 0)]));
    }
}
