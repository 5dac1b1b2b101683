//! Editor configuration and main loop.
//!
//! `run` wires a landmark source to an [`EditorSession`] and an [`Overlay`]
//! window, then drives them until the window closes, `Esc` is pressed or the
//! landmark source runs dry.

use std::io;
use std::path::PathBuf;
use std::sync::mpsc::{self, TryRecvError};
use std::time::{Duration, Instant};

use thiserror::Error;

use airblocks_scene::DEFAULT_SCENE_FILE;

use crate::hand::HandFrame;
use crate::overlay::Overlay;
use crate::session::{EditorSession, FrameReport, SessionConfig};
use crate::source::{spawn_landmark_source, SimLandmarkSource, StreamLandmarkSource};

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Error)]
pub enum EditorError {
    #[error("window: {0}")]
    Window(String),

    #[error("landmark input {path}: {source}")]
    Landmarks {
        path:   PathBuf,
        #[source]
        source: io::Error,
    },
}

// ════════════════════════════════════════════════════════════════════════════
// EditorConfig
// ════════════════════════════════════════════════════════════════════════════

/// Where hand frames come from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LandmarkInput {
    /// Mouse and keyboard drive a synthetic hand.
    Simulated,
    /// JSON lines from a file, FIFO, or `-` for stdin.
    Stream { path: PathBuf, fps: Option<u32> },
    /// LeapMotion controller.
    #[cfg(feature = "leap")]
    Leap,
}

/// Configuration for the full editor.
#[derive(Clone, Debug)]
pub struct EditorConfig {
    pub session:    SessionConfig,
    pub scene_path: PathBuf,
    pub landmarks:  LandmarkInput,
    /// Load the existing snapshot before editing.
    pub resume:     bool,
}

impl Default for EditorConfig {
    fn default() -> Self {
        EditorConfig {
            session:    SessionConfig::default(),
            scene_path: PathBuf::from(DEFAULT_SCENE_FILE),
            landmarks:  LandmarkInput::Simulated,
            resume:     true,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Main loop
// ════════════════════════════════════════════════════════════════════════════

pub fn run(cfg: EditorConfig) -> Result<(), EditorError> {
    // ── Landmark channel ──────────────────────────────────────────────────
    let (sim_tx, frames) = match &cfg.landmarks {
        LandmarkInput::Simulated => {
            let (tx, rx) = mpsc::channel();
            (Some(tx), spawn_landmark_source(SimLandmarkSource { rx }))
        }
        LandmarkInput::Stream { path, fps } => {
            let mut source = StreamLandmarkSource::open(path)
                .map_err(|e| EditorError::Landmarks { path: path.clone(), source: e })?;
            if let Some(fps) = fps.filter(|&f| f > 0) {
                source = source.paced(Duration::from_secs(1) / fps);
            }
            (None, spawn_landmark_source(source))
        }
        #[cfg(feature = "leap")]
        LandmarkInput::Leap => {
            (None, spawn_landmark_source(crate::source::LeapLandmarkSource))
        }
    };

    // ── Overlay (owns the window and the sim input sender) ───────────────
    let (w, h) = (cfg.session.width, cfg.session.height);
    let mut overlay = Overlay::new("AirBlocks Editor", w, h, sim_tx)?;

    // ── Session ──────────────────────────────────────────────────────────
    let mut session = EditorSession::new(cfg.session.clone(), Some(cfg.scene_path.clone()));
    if cfg.resume {
        session.resume();
    }
    log::info!("editing {}", cfg.scene_path.display());

    let mut last_frame = HandFrame::empty();
    let mut report = FrameReport::default();

    // ── Main loop ─────────────────────────────────────────────────────────
    while overlay.is_open() {
        // 1. Window keys (and the simulator sample for this frame)
        let keys = overlay.poll_input();
        if keys.quit { break; }
        if keys.undo { session.undo(Instant::now()); }
        if keys.redo { session.redo(Instant::now()); }

        // 2. Drain hand frames; each is processed to completion
        loop {
            match frames.try_recv() {
                Ok(frame) => {
                    report = session.step(&frame, Instant::now());
                    last_frame = frame;
                }
                Err(TryRecvError::Empty)        => break,
                Err(TryRecvError::Disconnected) => {
                    log::info!("landmark source closed, leaving editor");
                    return Ok(());
                }
            }
        }

        // 3. Render
        overlay.render(&session, &last_frame, &report, Instant::now());
    }

    Ok(())
}
