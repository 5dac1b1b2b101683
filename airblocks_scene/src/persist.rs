//! JSON snapshot persistence.
//!
//! The file is a flat array, one element per structure:
//!
//! ```text
//! [{"blocks": [[0, 0], [1, 0]], "scale": 1.0, "height": 1}, ...]
//! ```
//!
//! Writes always replace the whole file: the snapshot goes to
//! `<path>.tmp` first and is then renamed over `<path>`, so a reader polling
//! the file never sees a half-written array.  There is no schema version and
//! no checksum; structure handles and the active selection are not stored.

use std::collections::BTreeSet;
use std::ffi::OsString;
use std::fs;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::scene::{Cell, Scene};

/// Where the editor and viewer meet when no path is configured.
pub const DEFAULT_SCENE_FILE: &str = "data/scene_snapshot.json";

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("scene file I/O on {path}: {source}")]
    Io {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("scene file {path} is not a valid snapshot: {source}")]
    Json {
        path:   PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

impl SceneError {
    fn io(path: &Path, source: io::Error) -> Self {
        SceneError::Io { path: path.to_path_buf(), source }
    }

    /// True for failures the tools deliberately ignore (another process
    /// holding the file, read-only directory).
    pub fn is_permission_denied(&self) -> bool {
        matches!(self, SceneError::Io { source, .. }
                 if source.kind() == io::ErrorKind::PermissionDenied)
    }
}

// ════════════════════════════════════════════════════════════════════════════
// On-disk record
// ════════════════════════════════════════════════════════════════════════════

/// One persisted structure.  Missing `scale` / `height` default to 1.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StructureRecord {
    pub blocks: Vec<Cell>,
    #[serde(default = "default_scale")]
    pub scale:  f32,
    #[serde(default = "default_height")]
    pub height: i64,
}

fn default_scale()  -> f32 { 1.0 }
fn default_height() -> i64 { 1 }

impl Scene {
    /// The scene as it is written to disk.
    pub fn to_records(&self) -> Vec<StructureRecord> {
        self.structures().iter().map(|s| StructureRecord {
            blocks: s.cells.iter().copied().collect(),
            scale:  s.scale,
            height: s.height as i64,
        }).collect()
    }

    /// Build a scene from persisted records.  Handles are fresh; the first
    /// structure (if any) is active.  Values outside the valid ranges are
    /// clamped.
    pub fn from_records(records: Vec<StructureRecord>) -> Scene {
        let mut scene = Scene::new();
        scene.replace_with_records(records);
        scene
    }

    fn replace_with_records(&mut self, records: Vec<StructureRecord>) {
        self.rebuild(records.into_iter().map(|r| {
            let cells: BTreeSet<Cell> = r.blocks.into_iter().collect();
            let height = r.height.clamp(0, u32::MAX as i64) as u32;
            (cells, r.scale, height)
        }));
    }

    // ── tolerant wrappers ────────────────────────────────────────────────

    /// Write the snapshot, logging and swallowing any failure.
    ///
    /// Returns whether the file was replaced.
    pub fn export(&self, path: impl AsRef<Path>) -> bool {
        match save(self, path.as_ref()) {
            Ok(()) => true,
            Err(e) if e.is_permission_denied() => {
                log::debug!("scene export skipped: {}", e);
                false
            }
            Err(e) => {
                log::warn!("scene export failed: {}", e);
                false
            }
        }
    }

    /// Replace the whole scene from disk.
    ///
    /// A missing or unreadable file leaves the scene untouched and returns
    /// `false`.  On success the active handle is reset to the first
    /// structure (or none when the file holds an empty array).
    pub fn load(&mut self, path: impl AsRef<Path>) -> bool {
        match read(path.as_ref()) {
            Ok(Some(records)) => {
                self.replace_with_records(records);
                true
            }
            Ok(None) => false,
            Err(e) => {
                log::debug!("scene load ignored: {}", e);
                false
            }
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Strict I/O
// ════════════════════════════════════════════════════════════════════════════

fn temp_path(path: &Path) -> PathBuf {
    let mut name = OsString::from(path.as_os_str());
    name.push(".tmp");
    PathBuf::from(name)
}

/// Write `scene` to `path` via a sibling temp file and an atomic rename.
pub fn save(scene: &Scene, path: &Path) -> Result<(), SceneError> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(|e| SceneError::io(dir, e))?;
    }

    let tmp = temp_path(path);
    {
        let file = fs::File::create(&tmp).map_err(|e| SceneError::io(&tmp, e))?;
        let mut w = BufWriter::new(file);
        serde_json::to_writer(&mut w, &scene.to_records())
            .map_err(|e| SceneError::Json { path: tmp.clone(), source: e })?;
        w.flush().map_err(|e| SceneError::io(&tmp, e))?;
    }

    fs::rename(&tmp, path).map_err(|e| SceneError::io(path, e))
}

/// Read the records stored at `path`.  `Ok(None)` when the file is absent.
pub fn read(path: &Path) -> Result<Option<Vec<StructureRecord>>, SceneError> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(SceneError::io(path, e)),
    };
    serde_json::from_str(&text)
        .map(Some)
        .map_err(|e| SceneError::Json { path: path.to_path_buf(), source: e })
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn scratch(name: &str) -> PathBuf {
        static SEQ: AtomicUsize = AtomicUsize::new(0);
        let n = SEQ.fetch_add(1, Ordering::Relaxed);
        std::env::temp_dir()
            .join(format!("airblocks-scene-{}-{}", std::process::id(), n))
            .join(name)
    }

    fn cells(list: &[(i32, i32)]) -> Vec<Cell> {
        list.iter().map(|&c| Cell::from(c)).collect()
    }

    #[test]
    fn export_then_load_single_structure() {
        let path = scratch("scene.json");
        let mut scene = Scene::new();
        scene.add_structure(cells(&[(0, 0), (1, 0)]), 1.0, 1);
        assert!(scene.export(&path));

        let mut fresh = Scene::new();
        assert!(fresh.load(&path));
        assert_eq!(fresh.len(), 1);
        let s = &fresh.structures()[0];
        assert_eq!(s.cells, cells(&[(0, 0), (1, 0)]).into_iter().collect());
        assert_eq!(s.scale, 1.0);
        assert_eq!(s.height, 1);
        assert_eq!(fresh.active_index(), Some(0));
    }

    #[test]
    fn round_trip_preserves_sets_scales_heights() {
        let path = scratch("scene.json");
        let mut scene = Scene::new();
        scene.add_structure(cells(&[(3, 4), (3, 5), (3, 6)]), 0.5, 7);
        scene.add_structure(cells(&[(-2, -2)]), 1.7, 20);
        scene.add_structure(cells(&[(10, 0), (11, 0)]), 2.0, 3);
        scene.export(&path);

        let mut loaded = Scene::new();
        loaded.load(&path);
        assert_eq!(loaded.to_records(), scene.to_records());
    }

    #[test]
    fn load_resets_active_to_first() {
        let path = scratch("scene.json");
        let mut scene = Scene::new();
        scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        scene.add_structure(cells(&[(5, 5)]), 1.0, 1);
        scene.add_structure(cells(&[(9, 9)]), 1.0, 1);
        assert_eq!(scene.active_index(), Some(2));
        scene.export(&path);

        assert!(scene.load(&path));
        assert_eq!(scene.active_index(), Some(0));
    }

    #[test]
    fn load_empty_array_clears_active() {
        let path = scratch("scene.json");
        Scene::new().export(&path);

        let mut scene = Scene::new();
        scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        assert!(scene.load(&path));
        assert!(scene.is_empty());
        assert_eq!(scene.active(), None);
    }

    #[test]
    fn missing_file_is_noop() {
        let mut scene = Scene::new();
        scene.add_structure(cells(&[(1, 1)]), 1.0, 2);
        let before = scene.clone();
        assert!(!scene.load(scratch("absent.json")));
        assert_eq!(scene, before);
    }

    #[test]
    fn corrupt_file_is_noop() {
        let path = scratch("scene.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "[{\"blocks\": [[0, 0]").unwrap();

        let mut scene = Scene::new();
        scene.add_structure(cells(&[(1, 1)]), 1.0, 2);
        let before = scene.clone();
        assert!(!scene.load(&path));
        assert_eq!(scene, before);
        assert!(matches!(read(&path), Err(SceneError::Json { .. })));
    }

    #[test]
    fn missing_keys_default_and_bad_values_clamp() {
        let path = scratch("scene.json");
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, r#"[{"blocks": [[1, 2]]}, {"blocks": [], "scale": 9.0, "height": 99}]"#)
            .unwrap();

        let mut scene = Scene::new();
        assert!(scene.load(&path));
        let s = scene.structures();
        assert_eq!((s[0].scale, s[0].height), (1.0, 1));
        assert_eq!((s[1].scale, s[1].height), (2.0, 20));
    }

    #[test]
    fn export_overwrites_and_removes_temp() {
        let path = scratch("scene.json");
        let mut scene = Scene::new();
        scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        scene.export(&path);
        scene.add_structure(cells(&[(4, 4)]), 1.0, 1);
        scene.export(&path);

        assert_eq!(read(&path).unwrap().unwrap().len(), 2);
        assert!(!temp_path(&path).exists());
    }

    #[test]
    fn export_under_regular_file_fails_quietly() {
        let blocker = scratch("not-a-dir");
        fs::create_dir_all(blocker.parent().unwrap()).unwrap();
        fs::write(&blocker, "plain file").unwrap();
        let path = blocker.join("scene.json");

        let mut scene = Scene::new();
        scene.add_structure(cells(&[(0, 0)]), 1.0, 1);
        assert!(!scene.export(&path));
        assert!(matches!(save(&scene, &path), Err(SceneError::Io { .. })));
        assert_eq!(fs::read_to_string(&blocker).unwrap(), "plain file");
    }

    #[test]
    fn file_format_is_flat_array() {
        let path = scratch("scene.json");
        let mut scene = Scene::new();
        scene.add_structure(cells(&[(2, 3)]), 1.0, 4);
        scene.export(&path);

        let value: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value, serde_json::json!([{"blocks": [[2, 3]], "scale": 1.0, "height": 4}]));
    }
}
