use crate::error::{LocboardError, Result};
use log::debug;
use std::ffi::OsStr;
use std::path::Path;
use std::process::Command;

/// One invocation of the system `git` binary.
pub struct GitCommand {
    command: Command,
}

impl GitCommand {
    /// A command that runs outside any repository (e.g. `git clone`).
    pub fn new<I, S>(args: I) -> GitCommand
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        GitCommand::internal(None, args)
    }

    /// A command that runs inside `repo_path`.
    pub fn for_repo<I, S>(repo_path: &Path, args: I) -> GitCommand
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        GitCommand::internal(Some(repo_path), args)
    }

    fn internal<I, S>(repo_path: Option<&Path>, args: I) -> GitCommand
    where
        I: IntoIterator<Item = S>,
        S: AsRef<OsStr>,
    {
        let mut command = Command::new("git");
        command.args(args);
        if let Some(repo_path) = repo_path {
            command.current_dir(repo_path);
        }
        GitCommand { command }
    }

    /// Run to completion and return stdout; a non-zero exit becomes an error
    /// carrying whatever git wrote to stderr.
    pub fn output(&mut self) -> Result<String> {
        debug!("running {:?}", self.command);
        let output = self.command.output()?;

        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).to_string());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let message = stderr.trim();
        if message.is_empty() {
            Err(LocboardError::Git(format!("git failed [{}]", output.status)))
        } else {
            Err(LocboardError::Git(format!(
                "{} [{}]",
                message, output.status
            )))
        }
    }
}
