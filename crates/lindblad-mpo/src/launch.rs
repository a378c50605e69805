//! Launching the external solver executable.
//!
//! How the solver is started is described by a [`LaunchConfig`], resolved
//! once (from the host defaults, a config file, or explicit paths) and then
//! handed to a [`Launcher`]. On Windows the solver is a cygwin build and must
//! be started through a cygwin login shell; elsewhere it is run directly.
//!
//! ```text
//! direct:   <solver> input_file <path>
//! wrapped:  <shell> --login -c "<solver> input_file '<path>'"
//! ```

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{LindbladError, LindbladResult};

/// File name of the solver executable.
pub const SOLVER_NAME: &str = "lindbladmpo";

/// Location of the solver relative to the directory of the running binary.
pub const SOLVER_RELATIVE_DIR: &str = "../bin";

/// Default cygwin shell used on Windows.
pub const DEFAULT_CYGWIN_SHELL: &str = "C:/cygwin64/bin/bash.exe";

/// Environment variable overriding the solver path.
pub const SOLVER_PATH_ENV: &str = "LINDBLADMPO_SOLVER";

fn default_shell_args() -> Vec<String> {
    vec!["--login".to_string(), "-c".to_string()]
}

/// A shell through which the solver command line is run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellWrapper {
    /// Path of the shell executable.
    pub path: PathBuf,
    /// Arguments placed before the command string.
    #[serde(default = "default_shell_args")]
    pub args: Vec<String>,
}

impl ShellWrapper {
    /// A login shell (`<path> --login -c`).
    pub fn login(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            args: default_shell_args(),
        }
    }
}

/// How to start the solver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchConfig {
    /// Path of the solver executable, as seen by the shell if one is used.
    pub solver_path: PathBuf,
    /// Optional wrapping shell.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shell: Option<ShellWrapper>,
}

impl LaunchConfig {
    /// Run the solver directly.
    pub fn direct(solver_path: impl Into<PathBuf>) -> Self {
        Self {
            solver_path: solver_path.into(),
            shell: None,
        }
    }

    /// Run the solver through `shell`.
    pub fn with_shell(mut self, shell: ShellWrapper) -> Self {
        self.shell = Some(shell);
        self
    }

    /// The launch description for the current host.
    ///
    /// The solver is expected in `../bin/` next to the running executable
    /// unless `LINDBLADMPO_SOLVER` names it. On Windows the path is translated
    /// to its `/cygdrive/` form and the cygwin login shell is used.
    pub fn host_default() -> Self {
        let exe_dir = std::env::current_exe()
            .ok()
            .and_then(|p| p.parent().map(Path::to_path_buf))
            .unwrap_or_else(|| PathBuf::from("."));
        let env_path = std::env::var_os(SOLVER_PATH_ENV).map(PathBuf::from);

        if cfg!(windows) {
            let solver_path = env_path.unwrap_or_else(|| {
                PathBuf::from(format!(
                    "{}/{SOLVER_RELATIVE_DIR}/{SOLVER_NAME}.exe",
                    cygwin_path(&exe_dir)
                ))
            });
            Self::direct(solver_path).with_shell(ShellWrapper::login(DEFAULT_CYGWIN_SHELL))
        } else {
            let solver_path =
                env_path.unwrap_or_else(|| exe_dir.join(SOLVER_RELATIVE_DIR).join(SOLVER_NAME));
            Self::direct(solver_path)
        }
    }

    /// Parse a YAML launch description.
    pub fn from_yaml_str(source: &str) -> LindbladResult<Self> {
        Ok(serde_yaml_ng::from_str(source)?)
    }

    /// Load a YAML launch description from disk.
    pub fn from_path(path: impl AsRef<Path>) -> LindbladResult<Self> {
        let source = std::fs::read_to_string(path.as_ref())?;
        Self::from_yaml_str(&source)
    }

    /// The command string the solver is started with, for display and for
    /// passing to a wrapping shell.
    pub fn solver_command_line(&self, input_file: &Path) -> String {
        let mut line = self.solver_path.display().to_string();
        if !input_file.as_os_str().is_empty() {
            line.push_str(&format!(" input_file '{}'", input_file.display()));
        }
        line
    }

    /// Full command line including the shell, for logging.
    pub fn display_command(&self, input_file: &Path) -> String {
        let inner = self.solver_command_line(input_file);
        match &self.shell {
            Some(shell) => format!(
                "{} {} \"{inner}\"",
                shell.path.display(),
                shell.args.join(" ")
            ),
            None => inner,
        }
    }

    /// Build the process command. An empty input path starts the solver with
    /// its built-in defaults.
    pub fn command(&self, input_file: &Path) -> Command {
        match &self.shell {
            Some(shell) => {
                let mut cmd = Command::new(&shell.path);
                cmd.args(&shell.args)
                    .arg(self.solver_command_line(input_file));
                cmd
            }
            None => {
                let mut cmd = Command::new(&self.solver_path);
                if !input_file.as_os_str().is_empty() {
                    cmd.arg("input_file").arg(input_file);
                }
                cmd
            }
        }
    }
}

impl Default for LaunchConfig {
    fn default() -> Self {
        Self::host_default()
    }
}

/// Translate a Windows path (`C:\work\bin`) to cygwin form (`/cygdrive/C/work/bin`).
pub fn cygwin_path(path: &Path) -> String {
    let raw = path.display().to_string().replace(':', "").replace('\\', "/");
    format!("/cygdrive/{}", raw.trim_start_matches('/'))
}

/// Something that can run the solver on an input file.
#[async_trait]
pub trait Launcher: Send + Sync {
    /// Run the solver to completion and return its exit code.
    async fn execute(&self, input_file: &Path) -> LindbladResult<i32>;
}

/// Runs the solver as a child process and waits for it.
///
/// The child inherits stdout/stderr so solver progress is visible. There is
/// no timeout: a solver that never exits blocks the caller.
#[derive(Debug, Clone)]
pub struct ProcessLauncher {
    config: LaunchConfig,
}

impl ProcessLauncher {
    pub fn new(config: LaunchConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &LaunchConfig {
        &self.config
    }
}

impl Default for ProcessLauncher {
    fn default() -> Self {
        Self::new(LaunchConfig::host_default())
    }
}

#[async_trait]
impl Launcher for ProcessLauncher {
    async fn execute(&self, input_file: &Path) -> LindbladResult<i32> {
        let command_line = self.config.display_command(input_file);
        info!("Executing solver with command: {command_line}");

        let status = self
            .config
            .command(input_file)
            .status()
            .await
            .map_err(|e| LindbladError::Launch {
                command: command_line.clone(),
                message: e.to_string(),
            })?;

        let exit_code = status.code().unwrap_or_else(|| {
            warn!("Solver process was terminated by a signal");
            -1
        });
        info!("Solver process terminated with exit code {exit_code}");
        Ok(exit_code)
    }
}
