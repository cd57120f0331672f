use crate::cli::CommonArgs;
use crate::github::GitHubClient;
use crate::session::{AuthContext, SessionStore};
use anyhow::{bail, Context};
use console::style;

pub fn exec_login(common: &CommonArgs, token: String) -> anyhow::Result<()> {
    let client = GitHubClient::new(Some(token.clone()));
    let profile = client
        .authenticated_user()
        .context("Failed to fetch the authenticated user")?;
    let emails = client
        .verified_emails()
        .context("Failed to fetch verified emails")?;

    let ctx = AuthContext {
        token: Some(token),
        username: profile.login,
        name: profile.name,
        emails,
        avatar_url: profile.avatar_url,
    };

    let mut sessions =
        SessionStore::open(&common.store).context("Failed to open the session store")?;
    let id = sessions.issue(&ctx).context("Failed to issue a session")?;

    println!(
        "Logged in as {} ({} verified email{})",
        style(&ctx.username).bold(),
        ctx.emails.len(),
        if ctx.emails.len() == 1 { "" } else { "s" }
    );
    println!("Session id: {id}");
    Ok(())
}

pub fn exec_logout(common: &CommonArgs, session: &str) -> anyhow::Result<()> {
    let mut sessions =
        SessionStore::open(&common.store).context("Failed to open the session store")?;
    if sessions.revoke(session)? {
        println!("Session revoked");
    } else {
        println!("No such session");
    }
    Ok(())
}

/// Build the request context from whichever credential the caller supplied:
/// a stored session, a raw token, or a bare username for public-only scans.
pub fn resolve_context(
    common: &CommonArgs,
    session: Option<&str>,
    token: Option<String>,
    username: Option<&str>,
    emails: &[String],
) -> anyhow::Result<AuthContext> {
    if let Some(id) = session {
        let sessions =
            SessionStore::open(&common.store).context("Failed to open the session store")?;
        return sessions
            .lookup(id)?
            .with_context(|| format!("Unknown session id: {id}"));
    }

    if let Some(token) = token {
        let client = GitHubClient::new(Some(token.clone()));
        let profile = client
            .authenticated_user()
            .context("Failed to fetch the authenticated user")?;
        let fetched = client
            .verified_emails()
            .context("Failed to fetch verified emails")?;
        return Ok(AuthContext {
            token: Some(token),
            username: profile.login,
            name: profile.name,
            emails: fetched,
            avatar_url: profile.avatar_url,
        });
    }

    if let Some(username) = username {
        return Ok(AuthContext {
            token: None,
            username: username.to_string(),
            name: None,
            emails: emails.to_vec(),
            avatar_url: None,
        });
    }

    bail!("Provide --session, --token, or --username")
}
