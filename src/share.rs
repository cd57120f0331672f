use crate::error::Result;
use crate::model::AggregateStats;
use sha2::{Digest, Sha256};
use url::Url;

const SHARE_BASE: &str = "https://twitter.com/intent/tweet";

/// First 8 hex characters of SHA-256 over
/// `username-added-deleted-sorted_dash_joined_repo_names`.
///
/// A checksum for casual tamper-evidence on shared posts, not a proof of
/// anything; anyone can recompute it from the public fields.
pub fn verification_token(
    username: &str,
    stats: &AggregateStats,
    repo_names: &[String],
) -> String {
    let mut names: Vec<&str> = repo_names.iter().map(String::as_str).collect();
    names.sort_unstable();

    let payload = format!(
        "{}-{}-{}-{}",
        username,
        stats.total_added,
        stats.total_deleted,
        names.join("-")
    );

    let digest = Sha256::digest(payload.as_bytes());
    let hex: String = digest.iter().map(|b| format!("{b:02x}")).collect();
    hex[..8].to_string()
}

pub fn share_text(username: &str, stats: &AggregateStats, token: &str) -> String {
    format!(
        "{}'s GitHub line contributions: +{} / -{} (net {}). Verification: {}",
        username, stats.total_added, stats.total_deleted, stats.total_net, token
    )
}

/// Share link with the post text pre-filled and URL-encoded.
pub fn share_url(
    username: &str,
    stats: &AggregateStats,
    repo_names: &[String],
) -> Result<String> {
    let token = verification_token(username, stats, repo_names);
    let text = share_text(username, stats, &token);

    let mut url = Url::parse(SHARE_BASE)?;
    url.query_pairs_mut().append_pair("text", &text);
    Ok(url.to_string())
}
