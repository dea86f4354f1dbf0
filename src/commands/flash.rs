//! Build-and-flash console command

use crate::cli::PortArgs;
use crate::devices;
use bloco_flash::Flasher;
use std::path::{Path, PathBuf};

type CliResult = Result<(), Box<dyn std::error::Error>>;

/// Build a firmware project and flash it to the device port
pub fn run_flash(
    args: &PortArgs,
    project: &Path,
    tool: String,
    env_script: Option<PathBuf>,
    build_only: bool,
) -> CliResult {
    let port = devices::resolve_port(args)?;
    if port.starts_with("sim:") {
        return Err("flashing needs a real serial port".into());
    }
    if !project.is_dir() {
        return Err(format!("project directory not found: {}", project.display()).into());
    }

    let flasher = Flasher {
        tool,
        project_dir: project.to_path_buf(),
        port: port.clone(),
        env_script,
    };

    let action = if build_only { "Building" } else { "Building and flashing" };
    println!(">>> {} {} for {}...", action, project.display(), port);

    let result = if build_only {
        flasher.run_targets(&["build"], &mut |line| println!("{line}"))
    } else {
        flasher.run(&mut |line| println!("{line}"))
    };

    match result {
        Ok(()) => {
            println!(">>> Flash complete!");
            Ok(())
        }
        Err(e) => Err(format!("{e}").into()),
    }
}
