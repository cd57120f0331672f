use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

/// The calendar year tracked alongside the all-time totals.
pub const LEADERBOARD_YEAR: i32 = 2024;

/// A remote repository as reported by the hosting API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub owner: String,
    pub name: String,
    pub clone_url: String,
    pub fork: bool,
}

impl RepositoryRef {
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }
}

/// A username plus the verified emails matched against commit authorship.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthorIdentity {
    pub username: String,
    pub emails: Vec<String>,
}

impl AuthorIdentity {
    pub fn new(username: String, emails: Vec<String>) -> Self {
        let emails = emails
            .into_iter()
            .map(|e| e.trim().to_string())
            .filter(|e| !e.is_empty())
            .collect();
        Self { username, emails }
    }

    /// Patterns passed as `--author` filters; git ORs them together.
    pub fn author_patterns(&self) -> Vec<String> {
        let mut patterns = Vec::with_capacity(1 + self.emails.len());
        patterns.push(self.username.clone());
        patterns.extend(self.emails.iter().cloned());
        patterns
    }
}

/// Line counts for one author in one repository over one time window.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContributionRecord {
    pub repository: String,
    pub added_lines: u64,
    pub deleted_lines: u64,
    pub net_lines: i64,
}

impl ContributionRecord {
    pub fn new(repository: String, added_lines: u64, deleted_lines: u64) -> Self {
        let net_lines = added_lines as i64 - deleted_lines as i64;
        Self {
            repository,
            added_lines,
            deleted_lines,
            net_lines,
        }
    }

    pub fn zero(repository: String) -> Self {
        Self::new(repository, 0, 0)
    }

    pub fn is_empty(&self) -> bool {
        self.added_lines == 0 && self.deleted_lines == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregateStats {
    pub total_added: u64,
    pub total_deleted: u64,
    pub total_net: i64,
}

/// The stored per-user document; replaced whole on every analysis run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserStatsDocument {
    pub username: String,
    pub all_time: AggregateStats,
    pub year_2024: AggregateStats,
    pub avatar_url: Option<String>,
    pub last_updated: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeWindow {
    AllTime,
    Year(i32),
}

impl TimeWindow {
    /// Inclusive calendar bounds for `git log --since/--until`.
    pub fn bounds(&self) -> Option<(String, String)> {
        match self {
            TimeWindow::AllTime => None,
            TimeWindow::Year(year) => {
                Some((format!("{year}-01-01"), format!("{year}-12-31")))
            }
        }
    }
}

/// A non-fatal failure collected during a repository scan.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanWarning {
    pub repository: String,
    pub branch: Option<String>,
    pub message: String,
}

impl ScanWarning {
    pub fn repo(repository: &str, message: String) -> Self {
        Self {
            repository: repository.to_string(),
            branch: None,
            message,
        }
    }

    pub fn branch(repository: &str, branch: &str, message: String) -> Self {
        Self {
            repository: repository.to_string(),
            branch: Some(branch.to_string()),
            message,
        }
    }
}

/// Scanner result: the partial value plus whatever went wrong along the way.
#[derive(Debug, Clone)]
pub struct ScanOutcome {
    pub record: ContributionRecord,
    pub warnings: Vec<ScanWarning>,
}
