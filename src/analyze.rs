use crate::aggregate::aggregate;
use crate::auth;
use crate::cli::CommonArgs;
use crate::git::{GitBackend, SystemGit};
use crate::github::GitHubClient;
use crate::model::{
    AggregateStats, AuthorIdentity, ContributionRecord, ScanWarning, TimeWindow,
    LEADERBOARD_YEAR,
};
use crate::scan::scan_repository;
use crate::session::AuthContext;
use crate::share;
use crate::store::LeaderboardStore;
use anyhow::Context;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct AnalysisReport {
    pub username: String,
    pub records: Vec<ContributionRecord>,
    pub all_time: AggregateStats,
    pub year_2024: AggregateStats,
    pub warnings: Vec<ScanWarning>,
    pub share_url: String,
}

pub fn exec(
    common: &CommonArgs,
    session: Option<&str>,
    token: Option<String>,
    username: Option<&str>,
    emails: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let ctx = auth::resolve_context(common, session, token, username, emails)?;
    let client = GitHubClient::new(ctx.token.clone());
    let mut store = LeaderboardStore::open(&common.store)
        .context("Failed to open the stats database")?;

    let report = run_analysis(&SystemGit, &client, &mut store, &ctx)
        .context("Failed to analyze contributions")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        render_report(&report);
    }
    Ok(())
}

/// One full analysis request: list repositories, scan each one twice (all
/// time and the tracked year), aggregate, persist, and build the share link.
///
/// Repositories are processed strictly one at a time; a persistence failure
/// is logged and does not abort the run.
pub fn run_analysis<G: GitBackend>(
    git: &G,
    client: &GitHubClient,
    store: &mut LeaderboardStore,
    ctx: &AuthContext,
) -> crate::error::Result<AnalysisReport> {
    let repos = client.user_repos(&ctx.username)?;
    let targets: Vec<_> = repos.into_iter().filter(|r| !r.fork).collect();

    let identity = AuthorIdentity::new(ctx.username.clone(), ctx.emails.clone());

    let pb = ProgressBar::new(targets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{msg:<40} [{bar:30}] {pos}/{len}")
            .unwrap_or_else(|_| ProgressStyle::default_bar()),
    );

    let mut all_records = Vec::new();
    let mut year_records = Vec::new();
    let mut warnings = Vec::new();

    for repo in &targets {
        pb.set_message(format!("Analyzing {}", repo.name));

        let all_time =
            scan_repository(git, repo, &identity, TimeWindow::AllTime, ctx.token.as_deref());
        let year = scan_repository(
            git,
            repo,
            &identity,
            TimeWindow::Year(LEADERBOARD_YEAR),
            ctx.token.as_deref(),
        );

        warnings.extend(all_time.warnings);
        warnings.extend(year.warnings);
        all_records.push(all_time.record);
        year_records.push(year.record);

        pb.inc(1);
    }
    pb.finish_with_message("Analysis complete");

    let all_time = aggregate(&all_records);
    let year_2024 = aggregate(&year_records);

    if let Err(err) = store.upsert(
        &ctx.username,
        &all_time,
        &year_2024,
        ctx.avatar_url.as_deref(),
    ) {
        warn!("failed to store stats for {}: {err}", ctx.username);
    }

    // only repositories with actual contributions make the report and the
    // share hash
    let mut records: Vec<ContributionRecord> = all_records
        .into_iter()
        .filter(|r| !r.is_empty())
        .collect();
    records.sort_by(|a, b| b.net_lines.cmp(&a.net_lines));

    let repo_names: Vec<String> = records.iter().map(|r| r.repository.clone()).collect();
    let share_url = share::share_url(&ctx.username, &all_time, &repo_names)?;

    Ok(AnalysisReport {
        username: ctx.username.clone(),
        records,
        all_time,
        year_2024,
        warnings,
        share_url,
    })
}

fn render_report(report: &AnalysisReport) {
    println!();
    println!("{}", style(format!("Contributions for {}", report.username)).bold());
    println!("{}", "─".repeat(70));

    render_totals("All time", &report.all_time);
    render_totals(&format!("Year {LEADERBOARD_YEAR}"), &report.year_2024);

    if report.records.is_empty() {
        println!("\nNo contributions found in the analyzed repositories.");
    } else {
        println!();
        println!(
            "{:<40} {:>8} {:>8} {:>8}",
            style("Repository").bold(),
            style("Added").bold(),
            style("Deleted").bold(),
            style("Net").bold()
        );
        println!("{}", "─".repeat(70));
        for record in &report.records {
            println!(
                "{:<40} {:>8} {:>8} {:>8}",
                record.repository, record.added_lines, record.deleted_lines, record.net_lines
            );
        }
    }

    if !report.warnings.is_empty() {
        println!();
        println!("{}", style("Warnings").bold().yellow());
        for warning in &report.warnings {
            match &warning.branch {
                Some(branch) => println!(
                    "  {} [{}]: {}",
                    warning.repository, branch, warning.message
                ),
                None => println!("  {}: {}", warning.repository, warning.message),
            }
        }
    }

    println!();
    println!("Share: {}", report.share_url);
}

fn render_totals(label: &str, stats: &AggregateStats) {
    println!(
        "{:<12} {} added, {} deleted, net {}",
        label,
        style(stats.total_added).green(),
        style(stats.total_deleted).red(),
        style(stats.total_net).bold()
    );
}
