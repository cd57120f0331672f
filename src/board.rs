use crate::cli::CommonArgs;
use crate::model::{AggregateStats, TimeWindow, UserStatsDocument, LEADERBOARD_YEAR};
use crate::store::LeaderboardStore;
use anyhow::Context;
use console::style;

pub fn exec_leaderboard(
    common: &CommonArgs,
    window: TimeWindow,
    limit: u32,
    json: bool,
) -> anyhow::Result<()> {
    let store = LeaderboardStore::open(&common.store)
        .context("Failed to open the stats database")?;
    let documents = store
        .top_n(window, limit)
        .context("Failed to query the leaderboard")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
        return Ok(());
    }

    if documents.is_empty() {
        println!("No stats stored yet");
        return Ok(());
    }

    let label = match window {
        TimeWindow::AllTime => "all time".to_string(),
        TimeWindow::Year(year) => format!("year {year}"),
    };
    println!("{}", style(format!("Top contributors ({label})")).bold());
    println!(
        "{:>4} {:<24} {:>10} {:>10} {:>10}",
        style("#").bold(),
        style("Username").bold(),
        style("Added").bold(),
        style("Deleted").bold(),
        style("Net").bold()
    );
    println!("{}", "─".repeat(62));
    for (rank, doc) in documents.iter().enumerate() {
        let stats = window_stats(doc, window);
        println!(
            "{:>4} {:<24} {:>10} {:>10} {:>10}",
            rank + 1,
            doc.username,
            stats.total_added,
            stats.total_deleted,
            stats.total_net
        );
    }
    Ok(())
}

pub fn exec_user(common: &CommonArgs, username: &str, json: bool) -> anyhow::Result<()> {
    let store = LeaderboardStore::open(&common.store)
        .context("Failed to open the stats database")?;
    let document = store
        .find_by_username(username)
        .context("Failed to look up user")?;

    match document {
        Some(doc) => {
            if json {
                println!("{}", serde_json::to_string_pretty(&doc)?);
            } else {
                render_document(&doc);
            }
        }
        None => println!("No stats stored for {username}"),
    }
    Ok(())
}

pub fn exec_search(common: &CommonArgs, pattern: &str, json: bool) -> anyhow::Result<()> {
    let store = LeaderboardStore::open(&common.store)
        .context("Failed to open the stats database")?;
    let documents = store
        .search_by_username(pattern)
        .context("Failed to search users")?;

    if json {
        println!("{}", serde_json::to_string_pretty(&documents)?);
        return Ok(());
    }

    if documents.is_empty() {
        println!("No users matching {pattern}");
        return Ok(());
    }
    for doc in &documents {
        println!(
            "{:<24} net {} (all time), net {} ({})",
            doc.username,
            doc.all_time.total_net,
            doc.year_2024.total_net,
            LEADERBOARD_YEAR
        );
    }
    Ok(())
}

fn window_stats(doc: &UserStatsDocument, window: TimeWindow) -> &AggregateStats {
    match window {
        TimeWindow::AllTime => &doc.all_time,
        TimeWindow::Year(_) => &doc.year_2024,
    }
}

fn render_document(doc: &UserStatsDocument) {
    println!("{}", style(&doc.username).bold());
    println!(
        "  all time: {} added, {} deleted, net {}",
        doc.all_time.total_added, doc.all_time.total_deleted, doc.all_time.total_net
    );
    println!(
        "  {}:     {} added, {} deleted, net {}",
        LEADERBOARD_YEAR,
        doc.year_2024.total_added,
        doc.year_2024.total_deleted,
        doc.year_2024.total_net
    );
    println!("  updated: {}", doc.last_updated.format("%Y-%m-%d %H:%M UTC"));
}
