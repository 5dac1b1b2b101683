//! airblocks — start the gesture editor and the 3D viewer side by side.
//!
//! The two windows are independent processes; the only thing they share is
//! the scene snapshot path handed to both through `--scene`.

use std::env;
use std::ffi::OsString;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Child, Command};

use clap::Parser;
use thiserror::Error;

use airblocks_scene::DEFAULT_SCENE_FILE;

const EDITOR_BIN: &str = "airblocks_editor";
const VIEWER_BIN: &str = "airblocks_viewer";

#[derive(Parser, Debug)]
#[command(
    name = "airblocks",
    version,
    about = "Launch the AirBlocks gesture editor and 3D viewer"
)]
struct Args {
    /// Scene snapshot shared by both windows.
    #[arg(long, env = "AIRBLOCKS_SCENE", default_value = DEFAULT_SCENE_FILE)]
    scene: PathBuf,
    /// Start only the editor.
    #[arg(long)]
    no_viewer: bool,
    /// Return right after starting the processes instead of waiting.
    #[arg(long)]
    detach: bool,
    /// Extra arguments passed through to the editor (after `--`).
    #[arg(last = true)]
    editor_args: Vec<OsString>,
}

#[derive(Debug, Error)]
enum LaunchError {
    #[error("cannot start {program}: {source}")]
    Spawn {
        program: PathBuf,
        #[source]
        source:  io::Error,
    },
    #[error("waiting for {name}: {source}")]
    Wait {
        name:    &'static str,
        #[source]
        source:  io::Error,
    },
}

/// Path of a sibling executable next to `exe_dir`, or the bare name (looked
/// up on `PATH`) when no such file exists.
fn sibling(exe_dir: Option<&Path>, name: &str) -> PathBuf {
    let file = format!("{}{}", name, env::consts::EXE_SUFFIX);
    match exe_dir.map(|d| d.join(&file)) {
        Some(path) if path.is_file() => path,
        _ => PathBuf::from(file),
    }
}

fn spawn(program: PathBuf, scene: &Path, extra: &[OsString]) -> Result<Child, LaunchError> {
    log::info!("starting {}", program.display());
    Command::new(&program)
        .arg("--scene")
        .arg(scene)
        .args(extra)
        .spawn()
        .map_err(|source| LaunchError::Spawn { program, source })
}

fn run(args: Args) -> Result<(), LaunchError> {
    let exe = env::current_exe().ok();
    let exe_dir = exe.as_deref().and_then(Path::parent);

    let mut children: Vec<(&'static str, Child)> = Vec::new();
    children.push((
        "editor",
        spawn(sibling(exe_dir, EDITOR_BIN), &args.scene, &args.editor_args)?,
    ));
    if !args.no_viewer {
        match spawn(sibling(exe_dir, VIEWER_BIN), &args.scene, &[]) {
            Ok(child) => children.push(("viewer", child)),
            // the editor is useful on its own
            Err(e) => log::warn!("{}", e),
        }
    }

    println!("  AirBlocks is running (scene: {})", args.scene.display());
    if args.detach {
        return Ok(());
    }

    for (name, mut child) in children {
        let status = child.wait().map_err(|source| LaunchError::Wait { name, source })?;
        if status.success() {
            log::info!("{} exited", name);
        } else {
            log::warn!("{} exited with {}", name, status);
        }
    }
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    println!();
    println!("  Launching AirBlocks...");
    println!("    gesture editor + 3D viewer");
    println!();

    if let Err(e) = run(args) {
        log::error!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_path_lookup() {
        let dir = env::temp_dir().join(format!("airblocks-launch-{}", std::process::id()));
        let p = sibling(Some(&dir), EDITOR_BIN);
        assert_eq!(p, PathBuf::from(format!("{}{}", EDITOR_BIN, env::consts::EXE_SUFFIX)));
        assert_eq!(sibling(None, VIEWER_BIN).file_stem().unwrap(), VIEWER_BIN);
    }

    #[test]
    fn prefers_sibling_executable() {
        let dir = env::temp_dir().join(format!("airblocks-launch-sib-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let file = dir.join(format!("{}{}", VIEWER_BIN, env::consts::EXE_SUFFIX));
        std::fs::write(&file, b"").unwrap();
        assert_eq!(sibling(Some(&dir), VIEWER_BIN), file);
    }

    #[test]
    fn forwards_trailing_editor_args() {
        let args = Args::try_parse_from([
            "airblocks", "--scene", "s.json", "--no-viewer", "--", "--fresh", "--grid", "30",
        ]).unwrap();
        assert_eq!(args.scene, PathBuf::from("s.json"));
        assert!(args.no_viewer);
        assert_eq!(args.editor_args, vec!["--fresh", "--grid", "30"]);
    }
}
