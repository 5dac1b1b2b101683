//! # airblocks_viewer
//!
//! Read-only 3D view of the scene the editor writes.  The snapshot is polled
//! every few frames; each structure renders as stacked unit voxels at
//! `(x, level, y)`, edge length = structure scale, in a solid pass followed by
//! a depth-tested wireframe.  The active structure is blue, the rest green.
//!
//! | Input | Action |
//! |---|---|
//! | Left drag | Orbit |
//! | Right drag | Zoom |
//! | Wheel | Zoom in / out |
//! | `F` | Refocus on the scene |
//! | `Esc` | Quit |

pub mod camera;
pub mod raster;
pub mod app;
