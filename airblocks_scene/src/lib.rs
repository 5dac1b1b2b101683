//! # airblocks_scene
//!
//! In-memory voxel-block scene shared by the gesture editor and the 3D
//! viewer.
//!
//! A [`Scene`] is an ordered list of [`Structure`]s.  Each structure is a set
//! of integer grid [`Cell`]s plus a scale (`0.5..=2.0`) and a height
//! (`1..=20` stacked voxel levels).  At most one structure is *active*.
//!
//! Structures are addressed by [`StructureId`] handles that stay valid across
//! merges and reordering; positional indices are only used for display.
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use airblocks_scene::{Cell, Scene};
//!
//! let mut scene = Scene::new();
//! let id = scene.add_structure([Cell::new(0, 0), Cell::new(1, 0)], 1.0, 1);
//! scene.move_structure(id, 2, 3);
//! scene.export("data/scene_snapshot.json");
//!
//! let mut other = Scene::new();
//! other.load("data/scene_snapshot.json");
//! assert_eq!(other.len(), 1);
//! ```

pub mod scene;
pub mod merge;
pub mod history;
pub mod persist;

pub use scene::{
    Cell, Scene, SceneBounds, SceneStats, Structure, StructureId,
    MAX_HEIGHT, MAX_SCALE, MIN_HEIGHT, MIN_SCALE,
};
pub use merge::{cells_touch, MergeReport};
pub use history::{History, DEFAULT_HISTORY_LIMIT};
pub use persist::{SceneError, StructureRecord, DEFAULT_SCENE_FILE};
