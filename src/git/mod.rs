mod command;

pub use command::GitCommand;

use crate::error::Result;
use std::ffi::OsStr;
use std::path::Path;

/// The VCS operations the scanner needs, kept narrow so tests can substitute
/// a scripted fake for the real binary.
pub trait GitBackend {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()>;
    fn fetch_all(&self, repo: &Path) -> Result<()>;
    fn list_remote_branches(&self, repo: &Path) -> Result<Vec<String>>;
    fn checkout_force(&self, repo: &Path, branch: &str) -> Result<()>;
    fn log_numstat(
        &self,
        repo: &Path,
        authors: &[String],
        since_until: Option<(&str, &str)>,
    ) -> Result<String>;
}

/// Shells out to the `git` executable on PATH. No timeouts and no retries;
/// a hung remote stalls the caller.
pub struct SystemGit;

impl GitBackend for SystemGit {
    fn clone_repo(&self, url: &str, dest: &Path) -> Result<()> {
        GitCommand::new([
            OsStr::new("clone"),
            OsStr::new(url),
            dest.as_os_str(),
        ])
        .output()?;
        Ok(())
    }

    fn fetch_all(&self, repo: &Path) -> Result<()> {
        GitCommand::for_repo(repo, ["fetch", "--all"]).output()?;
        Ok(())
    }

    fn list_remote_branches(&self, repo: &Path) -> Result<Vec<String>> {
        let output = GitCommand::for_repo(
            repo,
            ["for-each-ref", "--format=%(refname:short)", "refs/remotes"],
        )
        .output()?;

        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            // origin/HEAD is a symbolic pointer to a branch already listed
            .filter(|line| !line.ends_with("/HEAD"))
            .map(String::from)
            .collect())
    }

    fn checkout_force(&self, repo: &Path, branch: &str) -> Result<()> {
        GitCommand::for_repo(repo, ["checkout", "--force", branch]).output()?;
        Ok(())
    }

    fn log_numstat(
        &self,
        repo: &Path,
        authors: &[String],
        since_until: Option<(&str, &str)>,
    ) -> Result<String> {
        let mut args: Vec<String> = vec![
            "--no-pager".to_string(),
            "log".to_string(),
            "--all".to_string(),
            "--pretty=tformat:".to_string(),
            "--numstat".to_string(),
        ];
        if let Some((since, until)) = since_until {
            args.push("--since".to_string());
            args.push(since.to_string());
            args.push("--until".to_string());
            args.push(until.to_string());
        }
        for author in authors {
            args.push("--author".to_string());
            args.push(author.clone());
        }
        GitCommand::for_repo(repo, &args).output()
    }
}
