//! airblocks_viewer — orbit view of the shared scene snapshot.

use std::path::PathBuf;

use clap::Parser;

use airblocks_scene::DEFAULT_SCENE_FILE;
use airblocks_viewer::app::{run, ViewerConfig};

#[derive(Parser, Debug)]
#[command(
    name = "airblocks_viewer",
    version,
    about = "Orbit-camera 3D view of the AirBlocks scene file"
)]
struct Args {
    /// Scene snapshot written by the editor.
    #[arg(long, env = "AIRBLOCKS_SCENE", default_value = DEFAULT_SCENE_FILE)]
    scene: PathBuf,
    #[arg(long, default_value_t = 1000)]
    width: usize,
    #[arg(long, default_value_t = 700)]
    height: usize,
    /// Rendered frames between scene file polls.
    #[arg(long, default_value_t = 10)]
    poll_every: u32,
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();
    let cfg = ViewerConfig {
        scene_path: args.scene,
        width:      args.width.max(160),
        height:     args.height.max(120),
        poll_every: args.poll_every.max(1),
    };

    println!();
    println!("  AirBlocks 3D viewer: {}", cfg.scene_path.display());
    println!("  left drag = orbit  right drag = zoom  wheel = zoom  F = refocus  Esc = quit");
    println!();

    if let Err(e) = run(cfg) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}
