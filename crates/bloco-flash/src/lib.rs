//! bloco-flash - Build/flash tool subprocess wrapper
//!
//! The firmware projects are built and flashed by an external tool
//! (`idf.py -p <port> build flash`). This crate treats that tool as a black
//! box: spawn it, stream its merged stdout/stderr lines to the caller, and
//! judge success solely by the exit code.

use std::io::{BufRead, BufReader};
use std::path::PathBuf;
use std::process::{Command, Stdio};
use std::sync::mpsc;
use thiserror::Error;

/// Default build/flash tool
pub const DEFAULT_TOOL: &str = "idf.py";

/// Targets passed to the tool after the port argument
pub const DEFAULT_TARGETS: &[&str] = &["build", "flash"];

/// Flash failures
#[derive(Debug, Error)]
pub enum Error {
    /// The tool could not be spawned or its output could not be read
    #[error("failed to run flash tool: {0}")]
    Spawn(#[from] std::io::Error),

    /// The tool ran and reported failure; `None` means killed by a signal
    #[error("flash failed (exit code {code:?})")]
    Failed {
        /// Exit code, when the process exited normally
        code: Option<i32>,
    },
}

/// One build-and-flash invocation
#[derive(Debug, Clone)]
pub struct Flasher {
    /// Tool binary name or path
    pub tool: String,
    /// Firmware project directory the tool runs in
    pub project_dir: PathBuf,
    /// Target serial port, passed as `-p <port>`
    pub port: String,
    /// Environment script sourced before the tool runs (ESP-IDF `export.sh`)
    pub env_script: Option<PathBuf>,
}

impl Flasher {
    /// Flasher for a project with the default tool
    pub fn new(project_dir: impl Into<PathBuf>, port: impl Into<String>) -> Self {
        Self {
            tool: DEFAULT_TOOL.to_string(),
            project_dir: project_dir.into(),
            port: port.into(),
            env_script: None,
        }
    }

    fn command(&self, targets: &[&str]) -> Command {
        match &self.env_script {
            Some(script) => {
                // The environment script only works under a shell
                let mut shell_cmd = format!(
                    "source {:?} && cd {:?} && {} -p {} ",
                    script, self.project_dir, self.tool, self.port
                );
                shell_cmd.push_str(&targets.join(" "));
                let mut cmd = Command::new("bash");
                cmd.arg("-c").arg(shell_cmd);
                cmd
            }
            None => {
                let mut cmd = Command::new(&self.tool);
                cmd.current_dir(&self.project_dir)
                    .arg("-p")
                    .arg(&self.port)
                    .args(targets);
                cmd
            }
        }
    }

    /// Run `build flash`, streaming output lines to `sink`.
    ///
    /// `sink` runs on the calling thread; stderr is drained on a worker and
    /// merged in. Success is the tool's exit code being zero, nothing else.
    pub fn run(&self, sink: &mut dyn FnMut(&str)) -> Result<(), Error> {
        self.run_targets(DEFAULT_TARGETS, sink)
    }

    /// Run specific targets (e.g. just `build`)
    pub fn run_targets(&self, targets: &[&str], sink: &mut dyn FnMut(&str)) -> Result<(), Error> {
        log::info!(
            "Running {} -p {} {} in {:?}",
            self.tool,
            self.port,
            targets.join(" "),
            self.project_dir
        );

        let mut child = self
            .command(targets)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()?;

        let (tx, rx) = mpsc::channel::<String>();

        let stderr = child.stderr.take();
        let stderr_tx = tx.clone();
        let drain = std::thread::spawn(move || {
            if let Some(stderr) = stderr {
                for line in BufReader::new(stderr).lines().map_while(|l| l.ok()) {
                    if stderr_tx.send(line).is_err() {
                        break;
                    }
                }
            }
        });

        if let Some(stdout) = child.stdout.take() {
            for line in BufReader::new(stdout).lines() {
                let line = line?;
                // Interleave whatever stderr has produced so far
                while let Ok(err_line) = rx.try_recv() {
                    sink(&err_line);
                }
                sink(&line);
            }
        }
        drop(tx);
        for err_line in rx {
            sink(&err_line);
        }
        let _ = drain.join();

        let status = child.wait()?;
        if status.success() {
            log::info!("Flash complete");
            Ok(())
        } else {
            Err(Error::Failed {
                code: status.code(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collect(flasher: &Flasher, targets: &[&str]) -> (Result<(), Error>, Vec<String>) {
        let mut lines = Vec::new();
        let result = flasher.run_targets(targets, &mut |line| lines.push(line.to_string()));
        (result, lines)
    }

    fn flasher_for(tool: &str) -> Flasher {
        Flasher {
            tool: tool.to_string(),
            project_dir: PathBuf::from("."),
            port: "port0".to_string(),
            env_script: None,
        }
    }

    #[test]
    fn success_is_judged_by_exit_code() {
        // `true` and `false` ignore their arguments
        let (result, _) = collect(&flasher_for("true"), &[]);
        assert!(result.is_ok());

        let (result, _) = collect(&flasher_for("false"), &[]);
        assert!(matches!(result, Err(Error::Failed { code: Some(1) })));
    }

    #[test]
    fn missing_tool_is_a_spawn_error() {
        let (result, _) = collect(&flasher_for("definitely-not-a-real-tool"), &[]);
        assert!(matches!(result, Err(Error::Spawn(_))));
    }

    #[test]
    fn output_lines_reach_the_sink() {
        // echo prints its arguments, including the -p pair
        let (result, lines) = collect(&flasher_for("echo"), &["hello"]);
        assert!(result.is_ok());
        assert_eq!(lines, vec!["-p port0 hello".to_string()]);
    }

    #[test]
    fn env_script_switches_to_a_shell_invocation() {
        let flasher = Flasher {
            tool: "idf.py".to_string(),
            project_dir: PathBuf::from("/tmp/proj"),
            port: "/dev/ttyACM0".to_string(),
            env_script: Some(PathBuf::from("/opt/esp/export.sh")),
        };
        let cmd = flasher.command(DEFAULT_TARGETS);
        assert_eq!(cmd.get_program(), "bash");
        let args: Vec<_> = cmd.get_args().map(|a| a.to_string_lossy()).collect();
        assert!(args[1].contains("export.sh"));
        assert!(args[1].contains("idf.py -p /dev/ttyACM0 build flash"));
    }
}
