//! # airblocks_editor
//!
//! Hand-gesture block editor.  A landmark source delivers 21-point hands,
//! the session classifies them into pinch / fist / open-hand signals and
//! drives the edit modes, and an overlay window draws the grid, the
//! structures and the user's hand.  Every committed edit is written to the
//! scene snapshot that `airblocks_viewer` polls.
//!
//! ## Gesture → Action mapping
//!
//! | Gesture | Mode | Action |
//! |---|---|---|
//! | Pinch held 0.5 s | BUILD | Start a blueprint at the cursor cell |
//! | Pinch drag | BUILD | Stretch the blueprint along the dominant axis |
//! | Open hand | BUILD | Commit the blueprint, auto-merge touching structures |
//! | Fist held 0.5 s, then drag | any | Move the active structure cell by cell |
//! | Pinch on a structure | GROUP | Make it the active structure |
//! | Pinch vertical drag | SCALE | Active structure scale ±0.1 per step |
//! | Pinch vertical drag | EXTRUDE | Active structure height ±1 per step |
//! | Pinch on a menu entry | any | Switch mode |
//! | Two open hands held 0.5 s | any | Lock editing ("3D MODE READY") |
//!
//! `Ctrl+Z` / `Ctrl+Y` undo and redo; `Esc` quits.
//!
//! ## Landmark sources
//!
//! * (default) **Simulation**: the mouse pointer is the index fingertip.
//!   Left button pinches, right button makes a fist, `Tab` shows two open
//!   hands, `H` hides the hand.
//! * `--landmarks <path|->`: JSON lines from an external hand detector.
//! * `leap` feature: a LeapMotion controller via LeapC.

pub mod hand;
pub mod gesture;
pub mod source;
pub mod session;
pub mod overlay;
pub mod app;
