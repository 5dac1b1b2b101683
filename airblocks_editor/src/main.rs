//! airblocks_editor — gesture editing window.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use airblocks_editor::app::{run, EditorConfig, LandmarkInput};
use airblocks_editor::session::SessionConfig;
use airblocks_scene::DEFAULT_SCENE_FILE;

#[derive(Parser, Debug)]
#[command(
    name = "airblocks_editor",
    version,
    about = "Build voxel structures with pinch, fist and open-hand gestures"
)]
struct Args {
    /// Scene snapshot shared with the viewer.
    #[arg(long, env = "AIRBLOCKS_SCENE", default_value = DEFAULT_SCENE_FILE)]
    scene: PathBuf,
    #[arg(long, default_value_t = 1280)]
    width: usize,
    #[arg(long, default_value_t = 720)]
    height: usize,
    /// Grid cell size in pixels.
    #[arg(long, default_value_t = 40)]
    grid: i32,
    /// Hold-to-confirm time in milliseconds.
    #[arg(long, default_value_t = 500)]
    hold_ms: u64,
    /// Read landmark JSON lines from a file or FIFO (`-` for stdin)
    /// instead of simulating a hand with the mouse.
    #[arg(long, value_name = "PATH|-")]
    landmarks: Option<PathBuf>,
    /// Replay rate for --landmarks (0 = as fast as lines arrive).
    #[arg(long, default_value_t = 0)]
    landmark_fps: u32,
    /// Poll a LeapMotion controller for hand landmarks.
    #[cfg(feature = "leap")]
    #[arg(long, conflicts_with = "landmarks")]
    leap: bool,
    /// Start from an empty scene instead of loading the snapshot.
    #[arg(long)]
    fresh: bool,
}

impl Args {
    fn landmark_input(&self) -> LandmarkInput {
        #[cfg(feature = "leap")]
        if self.leap {
            return LandmarkInput::Leap;
        }
        match &self.landmarks {
            Some(path) => LandmarkInput::Stream {
                path: path.clone(),
                fps:  Some(self.landmark_fps).filter(|&f| f > 0),
            },
            None => LandmarkInput::Simulated,
        }
    }

    fn into_config(self) -> EditorConfig {
        let landmarks = self.landmark_input();
        EditorConfig {
            session: SessionConfig {
                width:  self.width.max(320),
                height: self.height.max(240),
                grid:   self.grid.clamp(8, 200),
                hold:   Duration::from_millis(self.hold_ms),
                ..SessionConfig::default()
            },
            scene_path: self.scene,
            landmarks,
            resume: !self.fresh,
        }
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cfg = Args::parse().into_config();

    println!();
    println!("╔══════════════════════════════════════════════════════════════╗");
    println!("║            AirBlocks — gesture voxel block editor            ║");
    println!("╚══════════════════════════════════════════════════════════════╝");
    println!();
    match &cfg.landmarks {
        LandmarkInput::Simulated => {
            println!("  Input: mouse simulation");
            println!("    left button = pinch   right button = fist");
            println!("    Tab = two open hands  H = hide hand");
        }
        LandmarkInput::Stream { path, .. } => {
            println!("  Input: landmark stream {}", path.display());
        }
        #[cfg(feature = "leap")]
        LandmarkInput::Leap => println!("  Input: LeapMotion hardware"),
    }
    println!("  Scene: {}", cfg.scene_path.display());
    println!("  Ctrl+Z undo  Ctrl+Y redo  Esc quit");
    println!();

    if let Err(e) = run(cfg) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
