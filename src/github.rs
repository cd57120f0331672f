use crate::error::{LocboardError, Result};
use crate::model::RepositoryRef;
use log::debug;
use serde::Deserialize;
use ureq::{Agent, Request};

const API_BASE: &str = "https://api.github.com";
const ACCEPT: &str = "application/vnd.github.v3+json";
const PER_PAGE: u32 = 100;

/// Thin client over the GitHub REST API. Requests carry token auth when a
/// token is present; there are no retries, an API failure surfaces directly.
pub struct GitHubClient {
    agent: Agent,
    token: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub name: Option<String>,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RepoPayload {
    name: String,
    clone_url: String,
    fork: bool,
    owner: OwnerPayload,
}

#[derive(Debug, Deserialize)]
struct OwnerPayload {
    login: String,
}

#[derive(Debug, Deserialize)]
struct EmailPayload {
    email: String,
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct CollaboratorPayload {
    login: String,
}

impl GitHubClient {
    pub fn new(token: Option<String>) -> Self {
        let agent = ureq::AgentBuilder::new().user_agent("locboard").build();
        Self { agent, token }
    }

    fn get(&self, path: &str) -> Request {
        let mut request = self
            .agent
            .get(&format!("{API_BASE}{path}"))
            .set("Accept", ACCEPT);
        if let Some(token) = &self.token {
            request = request.set("Authorization", &format!("token {token}"));
        }
        request
    }

    pub fn authenticated_user(&self) -> Result<UserProfile> {
        if self.token.is_none() {
            return Err(LocboardError::Api(
                "a GitHub token is required for this call".to_string(),
            ));
        }
        let profile = self.get("/user").call()?.into_json()?;
        Ok(profile)
    }

    /// Verified email addresses of the authenticated user.
    pub fn verified_emails(&self) -> Result<Vec<String>> {
        let emails: Vec<EmailPayload> = self.get("/user/emails").call()?.into_json()?;
        Ok(emails
            .into_iter()
            .filter(|e| e.verified)
            .map(|e| e.email)
            .collect())
    }

    /// All repositories for `username`, paginated 100 at a time.
    ///
    /// With a token the authenticated listing is used (owner, collaborator
    /// and organization repos), filtered back down to repos the user owns or
    /// collaborates on. Without one, only the public listing is available.
    pub fn user_repos(&self, username: &str) -> Result<Vec<RepositoryRef>> {
        let mut repos = Vec::new();
        let mut page = 1u32;

        loop {
            let batch: Vec<RepoPayload> = if self.token.is_some() {
                self.get("/user/repos")
                    .query("per_page", &PER_PAGE.to_string())
                    .query("page", &page.to_string())
                    .query("affiliation", "owner,collaborator,organization_member")
                    .call()?
                    .into_json()?
            } else {
                self.get(&format!("/users/{username}/repos"))
                    .query("per_page", &PER_PAGE.to_string())
                    .query("page", &page.to_string())
                    .call()?
                    .into_json()?
            };

            if batch.is_empty() {
                break;
            }

            for repo in batch {
                if self.token.is_some() && !self.involves_user(&repo, username) {
                    continue;
                }
                repos.push(RepositoryRef {
                    owner: repo.owner.login,
                    name: repo.name,
                    clone_url: repo.clone_url,
                    fork: repo.fork,
                });
            }

            page += 1;
        }

        Ok(repos)
    }

    fn involves_user(&self, repo: &RepoPayload, username: &str) -> bool {
        if repo.owner.login == username {
            return true;
        }
        let full_name = format!("{}/{}", repo.owner.login, repo.name);
        self.collaborators(&full_name)
            .iter()
            .any(|login| login == username)
    }

    /// Collaborator logins; any failure is treated as an empty list.
    pub fn collaborators(&self, full_name: &str) -> Vec<String> {
        let response = match self
            .get(&format!("/repos/{full_name}/collaborators"))
            .call()
        {
            Ok(response) => response,
            Err(err) => {
                debug!("collaborator lookup failed for {full_name}: {err}");
                return Vec::new();
            }
        };
        match response.into_json::<Vec<CollaboratorPayload>>() {
            Ok(collaborators) => collaborators.into_iter().map(|c| c.login).collect(),
            Err(err) => {
                debug!("collaborator payload for {full_name} unreadable: {err}");
                Vec::new()
            }
        }
    }
}
