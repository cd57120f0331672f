use crate::git::GitBackend;
use crate::model::{
    AuthorIdentity, ContributionRecord, RepositoryRef, ScanOutcome, ScanWarning, TimeWindow,
};
use log::debug;
use tempfile::TempDir;

/// Scan one repository for one author over one time window.
///
/// Clones into a scratch directory, fetches every remote ref, then walks the
/// remote branches, force-checking each one out and summing the author's
/// numstat counts from a full-history log. Failures never escape: a failed
/// clone or fetch yields a zero record, a failed branch is skipped, and every
/// failure is reported in the returned warnings. The scratch directory is
/// removed on every exit path.
///
/// Each branch checkout re-runs the log over all reachable refs, so a commit
/// reachable from more than one remote branch is counted once per branch.
pub fn scan_repository<G: GitBackend>(
    git: &G,
    repo: &RepositoryRef,
    identity: &AuthorIdentity,
    window: TimeWindow,
    token: Option<&str>,
) -> ScanOutcome {
    let mut warnings = Vec::new();

    let scratch = match TempDir::new() {
        Ok(dir) => dir,
        Err(err) => {
            warnings.push(ScanWarning::repo(
                &repo.name,
                format!("scratch directory: {err}"),
            ));
            return zero_outcome(repo, warnings);
        }
    };

    let clone_url = authenticated_clone_url(&repo.clone_url, token);
    if let Err(err) = git.clone_repo(&clone_url, scratch.path()) {
        warnings.push(ScanWarning::repo(&repo.name, format!("clone: {err}")));
        return zero_outcome(repo, warnings);
    }

    if let Err(err) = git.fetch_all(scratch.path()) {
        warnings.push(ScanWarning::repo(&repo.name, format!("fetch: {err}")));
        return zero_outcome(repo, warnings);
    }

    let branches = match git.list_remote_branches(scratch.path()) {
        Ok(branches) => branches,
        Err(err) => {
            warnings.push(ScanWarning::repo(
                &repo.name,
                format!("list branches: {err}"),
            ));
            return zero_outcome(repo, warnings);
        }
    };

    let authors = identity.author_patterns();
    let bounds = window.bounds();
    let since_until = bounds.as_ref().map(|(s, u)| (s.as_str(), u.as_str()));

    let mut added = 0u64;
    let mut deleted = 0u64;

    for branch in &branches {
        if let Err(err) = git.checkout_force(scratch.path(), branch) {
            warnings.push(ScanWarning::branch(
                &repo.name,
                branch,
                format!("checkout: {err}"),
            ));
            continue;
        }

        let log = match git.log_numstat(scratch.path(), &authors, since_until) {
            Ok(log) => log,
            Err(err) => {
                warnings.push(ScanWarning::branch(
                    &repo.name,
                    branch,
                    format!("log: {err}"),
                ));
                continue;
            }
        };

        let (branch_added, branch_deleted) = sum_numstat(&log);
        added += branch_added;
        deleted += branch_deleted;
    }

    debug!(
        "scanned {} over {} branches: +{added} -{deleted}",
        repo.name,
        branches.len()
    );

    ScanOutcome {
        record: ContributionRecord::new(repo.name.clone(), added, deleted),
        warnings,
    }
}

fn zero_outcome(repo: &RepositoryRef, warnings: Vec<ScanWarning>) -> ScanOutcome {
    ScanOutcome {
        record: ContributionRecord::zero(repo.name.clone()),
        warnings,
    }
}

/// Sum a numstat listing into (added, deleted).
///
/// Only lines with exactly three tab-separated fields whose first two are
/// purely numeric count; binary files show `-` markers and are skipped along
/// with anything malformed.
pub fn sum_numstat(output: &str) -> (u64, u64) {
    let mut added = 0u64;
    let mut deleted = 0u64;

    for line in output.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split('\t').collect();
        let [additions, deletions, _path] = fields.as_slice() else {
            continue;
        };
        if !is_count(additions) || !is_count(deletions) {
            continue;
        }
        added += additions.parse::<u64>().unwrap_or(0);
        deleted += deletions.parse::<u64>().unwrap_or(0);
    }

    (added, deleted)
}

fn is_count(field: &str) -> bool {
    !field.is_empty() && field.bytes().all(|b| b.is_ascii_digit())
}

fn authenticated_clone_url(url: &str, token: Option<&str>) -> String {
    match token {
        Some(token) => url.replacen("https://", &format!("https://{token}@"), 1),
        None => url.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{LocboardError, Result};
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::path::Path;

    fn repo_ref(name: &str) -> RepositoryRef {
        RepositoryRef {
            owner: "alice".to_string(),
            name: name.to_string(),
            clone_url: format!("https://github.com/alice/{name}.git"),
            fork: false,
        }
    }

    fn identity() -> AuthorIdentity {
        AuthorIdentity::new(
            "alice".to_string(),
            vec!["alice@example.com".to_string()],
        )
    }

    /// Scripted backend that replays a fixed branch list and log output and
    /// records the filters it was asked to apply.
    struct FakeGit {
        branches: Vec<String>,
        log: String,
        fail_clone: bool,
        fail_checkout_of: Option<String>,
        seen_authors: RefCell<Vec<Vec<String>>>,
        seen_bounds: RefCell<Vec<Option<(String, String)>>>,
        cloned_urls: RefCell<Vec<String>>,
    }

    impl FakeGit {
        fn new(branches: &[&str], log: &str) -> Self {
            Self {
                branches: branches.iter().map(|b| b.to_string()).collect(),
                log: log.to_string(),
                fail_clone: false,
                fail_checkout_of: None,
                seen_authors: RefCell::new(Vec::new()),
                seen_bounds: RefCell::new(Vec::new()),
                cloned_urls: RefCell::new(Vec::new()),
            }
        }
    }

    impl GitBackend for FakeGit {
        fn clone_repo(&self, url: &str, _dest: &Path) -> Result<()> {
            self.cloned_urls.borrow_mut().push(url.to_string());
            if self.fail_clone {
                return Err(LocboardError::Git("remote rejected".to_string()));
            }
            Ok(())
        }

        fn fetch_all(&self, _repo: &Path) -> Result<()> {
            Ok(())
        }

        fn list_remote_branches(&self, _repo: &Path) -> Result<Vec<String>> {
            Ok(self.branches.clone())
        }

        fn checkout_force(&self, _repo: &Path, branch: &str) -> Result<()> {
            if self.fail_checkout_of.as_deref() == Some(branch) {
                return Err(LocboardError::Git("corrupt ref".to_string()));
            }
            Ok(())
        }

        fn log_numstat(
            &self,
            _repo: &Path,
            authors: &[String],
            since_until: Option<(&str, &str)>,
        ) -> Result<String> {
            self.seen_authors.borrow_mut().push(authors.to_vec());
            self.seen_bounds
                .borrow_mut()
                .push(since_until.map(|(s, u)| (s.to_string(), u.to_string())));
            Ok(self.log.clone())
        }
    }

    #[test]
    fn sums_numeric_lines_and_skips_binary_markers() {
        let (added, deleted) =
            sum_numstat("3\t1\tfoo.py\n-\t-\tbinary.png\n2\t0\tbar.py\n");
        assert_eq!((added, deleted), (5, 1));
    }

    #[test]
    fn skips_malformed_lines() {
        let (added, deleted) = sum_numstat("nonsense\n4\t2\ta.rs\n7\n\n1\tx\tb.rs\n");
        assert_eq!((added, deleted), (4, 2));
    }

    #[test]
    fn counts_once_per_branch_ref() {
        // the same full-history log replays for every branch, doubling the
        // totals for a two-branch repository
        let git = FakeGit::new(&["origin/master", "origin/feat"], "5\t0\tlib.rs\n");
        let outcome =
            scan_repository(&git, &repo_ref("demo"), &identity(), TimeWindow::AllTime, None);
        assert_eq!(outcome.record.added_lines, 10);
        assert_eq!(outcome.record.deleted_lines, 0);
        assert_eq!(outcome.record.net_lines, 10);
        assert!(outcome.warnings.is_empty());
    }

    #[test]
    fn clone_failure_yields_zero_record_with_warning() {
        let mut git = FakeGit::new(&["origin/master"], "5\t0\tlib.rs\n");
        git.fail_clone = true;
        let outcome =
            scan_repository(&git, &repo_ref("demo"), &identity(), TimeWindow::AllTime, None);
        assert!(outcome.record.is_empty());
        assert_eq!(outcome.warnings.len(), 1);
        assert!(outcome.warnings[0].message.contains("clone"));
    }

    #[test]
    fn failed_branch_is_skipped_not_fatal() {
        let mut git = FakeGit::new(&["origin/master", "origin/broken"], "2\t1\tlib.rs\n");
        git.fail_checkout_of = Some("origin/broken".to_string());
        let outcome =
            scan_repository(&git, &repo_ref("demo"), &identity(), TimeWindow::AllTime, None);
        assert_eq!(outcome.record.added_lines, 2);
        assert_eq!(outcome.record.deleted_lines, 1);
        assert_eq!(outcome.warnings.len(), 1);
        assert_eq!(outcome.warnings[0].branch.as_deref(), Some("origin/broken"));
    }

    #[test]
    fn passes_author_patterns_and_year_bounds() {
        let git = FakeGit::new(&["origin/master"], "");
        scan_repository(
            &git,
            &repo_ref("demo"),
            &identity(),
            TimeWindow::Year(2024),
            None,
        );
        let authors = git.seen_authors.borrow();
        assert_eq!(
            authors[0],
            vec!["alice".to_string(), "alice@example.com".to_string()]
        );
        let bounds = git.seen_bounds.borrow();
        assert_eq!(
            bounds[0],
            Some(("2024-01-01".to_string(), "2024-12-31".to_string()))
        );
    }

    #[test]
    fn token_is_inlined_into_the_clone_url() {
        let git = FakeGit::new(&[], "");
        scan_repository(
            &git,
            &repo_ref("demo"),
            &identity(),
            TimeWindow::AllTime,
            Some("s3cret"),
        );
        let urls = git.cloned_urls.borrow();
        assert_eq!(urls[0], "https://s3cret@github.com/alice/demo.git");
    }
}
