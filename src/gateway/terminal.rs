//! Shell launcher for terminal sessions.
//!
//! The launcher only decides where a shell starts. What the shell is then
//! allowed to do is outside this crate.

use super::GatewayError;
use crate::security::ResolvedPath;
use std::path::{Path, PathBuf};
use tokio::process::Command;

/// Default shell for terminal sessions.
pub const DEFAULT_SHELL: &str = "/bin/bash";

/// Builds shell commands whose working directory is a resolved directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TerminalLauncher {
    shell: PathBuf,
}

impl TerminalLauncher {
    /// Creates a launcher for `shell`.
    #[must_use]
    pub fn new(shell: impl Into<PathBuf>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// The shell executable.
    #[must_use]
    pub fn shell(&self) -> &Path {
        &self.shell
    }

    /// Prepares a shell command started in `dir`.
    ///
    /// Standard streams are left at their defaults; callers wire them to a
    /// pty, pipes or the current terminal as they need. The child is killed
    /// when the returned command's handle is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` does not exist or is not a directory.
    pub async fn prepare(&self, dir: &ResolvedPath) -> Result<Command, GatewayError> {
        let metadata = tokio::fs::metadata(dir.as_path())
            .await
            .map_err(|e| GatewayError::io(&e, dir))?;
        if !metadata.is_dir() {
            return Err(GatewayError::not_a_directory());
        }

        let mut cmd = Command::new(&self.shell);
        cmd.current_dir(dir.as_path())
            .env("TERM", "xterm-256color")
            .env("PWD", dir.as_path())
            .kill_on_drop(true);

        tracing::info!(cwd = %dir, shell = %self.shell.display(), "terminal prepared");
        Ok(cmd)
    }
}

impl Default for TerminalLauncher {
    fn default() -> Self {
        Self::new(DEFAULT_SHELL)
    }
}
