use locboard::git::SystemGit;
use locboard::model::{AuthorIdentity, RepositoryRef, TimeWindow};
use locboard::scan::scan_repository;
use std::fs::{self, File};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;

fn has_git() -> bool {
    Command::new("git").arg("--version").output().is_ok()
}

fn git(dir: &Path, args: &[&str]) {
    git_env(dir, args, &[]);
}

fn git_env(dir: &Path, args: &[&str], envs: &[(&str, &str)]) {
    let mut cmd = Command::new("git");
    cmd.args(args).current_dir(dir);
    for (key, value) in envs {
        cmd.env(key, value);
    }
    assert!(cmd.status().unwrap().success());
}

fn init_git_repo(dir: &Path) {
    git(dir, &["init", "-b", "master"]);
    git(dir, &["config", "core.autocrlf", "false"]);
    git(dir, &["config", "user.email", "alice@example.com"]);
    git(dir, &["config", "user.name", "alice"]);
}

fn commit_file(dir: &Path, name: &str, content: &[u8], envs: &[(&str, &str)]) {
    let path = dir.join(name);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    let mut f = File::create(&path).unwrap();
    f.write_all(content).unwrap();
    f.sync_all().unwrap();
    git(dir, &["add", "."]);
    git_env(dir, &["commit", "-m", &format!("add {name}")], envs);
}

fn local_repo_ref(dir: &Path, name: &str) -> RepositoryRef {
    RepositoryRef {
        owner: "alice".to_string(),
        name: name.to_string(),
        clone_url: dir.display().to_string(),
        fork: false,
    }
}

fn alice() -> AuthorIdentity {
    AuthorIdentity::new("alice".to_string(), vec!["alice@example.com".to_string()])
}

#[test]
fn counts_commit_once_per_branch_ref() {
    if !has_git() {
        return;
    }
    let dir = tempdir().unwrap();
    init_git_repo(dir.path());
    commit_file(dir.path(), "lib.rs", b"a\nb\nc\nd\ne\n", &[]);
    // a second branch pointing at the same history doubles every count
    git(dir.path(), &["branch", "feat"]);

    let outcome = scan_repository(
        &SystemGit,
        &local_repo_ref(dir.path(), "demo"),
        &alice(),
        TimeWindow::AllTime,
        None,
    );

    assert!(outcome.warnings.is_empty(), "{:?}", outcome.warnings);
    assert_eq!(outcome.record.added_lines, 10);
    assert_eq!(outcome.record.deleted_lines, 0);
    assert_eq!(outcome.record.net_lines, 10);
}

#[test]
fn year_filter_restricts_to_the_calendar_year() {
    if !has_git() {
        return;
    }
    let dir = tempdir().unwrap();
    init_git_repo(dir.path());
    let date_2023 = [
        ("GIT_AUTHOR_DATE", "2023-06-01T12:00:00"),
        ("GIT_COMMITTER_DATE", "2023-06-01T12:00:00"),
    ];
    let date_2024 = [
        ("GIT_AUTHOR_DATE", "2024-03-05T12:00:00"),
        ("GIT_COMMITTER_DATE", "2024-03-05T12:00:00"),
    ];
    commit_file(dir.path(), "old.txt", b"x\ny\nz\n", &date_2023);
    commit_file(dir.path(), "new.txt", b"p\nq\n", &date_2024);

    let repo = local_repo_ref(dir.path(), "demo");

    let all_time = scan_repository(&SystemGit, &repo, &alice(), TimeWindow::AllTime, None);
    assert_eq!(all_time.record.added_lines, 5);

    let year = scan_repository(&SystemGit, &repo, &alice(), TimeWindow::Year(2024), None);
    assert_eq!(year.record.added_lines, 2);
    assert_eq!(year.record.deleted_lines, 0);
}

#[test]
fn commits_by_other_authors_are_excluded() {
    if !has_git() {
        return;
    }
    let dir = tempdir().unwrap();
    init_git_repo(dir.path());
    commit_file(dir.path(), "mine.txt", b"1\n2\n", &[]);
    commit_file(
        dir.path(),
        "theirs.txt",
        b"1\n2\n3\n4\n",
        &[
            ("GIT_AUTHOR_NAME", "bob"),
            ("GIT_AUTHOR_EMAIL", "bob@example.com"),
        ],
    );

    let outcome = scan_repository(
        &SystemGit,
        &local_repo_ref(dir.path(), "demo"),
        &alice(),
        TimeWindow::AllTime,
        None,
    );

    assert_eq!(outcome.record.added_lines, 2);
}

#[test]
fn binary_files_are_skipped() {
    if !has_git() {
        return;
    }
    let dir = tempdir().unwrap();
    init_git_repo(dir.path());
    commit_file(dir.path(), "text.txt", b"one\ntwo\n", &[]);
    commit_file(dir.path(), "blob.bin", &[0u8, 159, 146, 150, 0, 7], &[]);

    let outcome = scan_repository(
        &SystemGit,
        &local_repo_ref(dir.path(), "demo"),
        &alice(),
        TimeWindow::AllTime,
        None,
    );

    assert_eq!(outcome.record.added_lines, 2);
    assert_eq!(outcome.record.deleted_lines, 0);
}

#[test]
fn deletions_show_up_in_the_totals() {
    if !has_git() {
        return;
    }
    let dir = tempdir().unwrap();
    init_git_repo(dir.path());
    commit_file(dir.path(), "file.txt", b"a\nb\nc\nd\ne\n", &[]);
    commit_file(dir.path(), "file.txt", b"a\n", &[]);

    let outcome = scan_repository(
        &SystemGit,
        &local_repo_ref(dir.path(), "demo"),
        &alice(),
        TimeWindow::AllTime,
        None,
    );

    assert_eq!(outcome.record.added_lines, 5);
    assert_eq!(outcome.record.deleted_lines, 4);
    assert_eq!(outcome.record.net_lines, 1);
}

#[test]
fn unreachable_remote_yields_zero_record_with_warning() {
    if !has_git() {
        return;
    }
    let missing = tempdir().unwrap();
    let repo = RepositoryRef {
        owner: "alice".to_string(),
        name: "ghost".to_string(),
        clone_url: missing.path().join("does-not-exist").display().to_string(),
        fork: false,
    };

    let outcome = scan_repository(&SystemGit, &repo, &alice(), TimeWindow::AllTime, None);

    assert!(outcome.record.is_empty());
    assert_eq!(outcome.warnings.len(), 1);
    assert!(outcome.warnings[0].message.contains("clone"));
}
