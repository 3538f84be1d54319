//! GitHub REST client for public profile data.

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::external::{ExternalApiError, ExternalClient};

const GITHUB_API: &str = "https://api.github.com";

static LOGIN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z0-9](?:[A-Za-z0-9]|-[A-Za-z0-9]){0,38}$").unwrap());

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubUser {
    pub login: String,
    pub name: Option<String>,
    pub company: Option<String>,
    pub blog: Option<String>,
    pub location: Option<String>,
    pub email: Option<String>,
    pub hireable: Option<bool>,
    pub bio: Option<String>,
    pub twitter_username: Option<String>,
    #[serde(default)]
    pub public_repos: u32,
    #[serde(default)]
    pub followers: u32,
    pub html_url: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GitHubRepo {
    pub name: String,
    #[serde(default)]
    pub fork: bool,
    #[serde(default)]
    pub stargazers_count: u32,
    #[serde(default)]
    pub forks_count: u32,
    pub language: Option<String>,
    pub pushed_at: Option<DateTime<Utc>>,
}

pub fn is_valid_login(login: &str) -> bool {
    LOGIN_RE.is_match(login)
}

#[derive(Clone)]
pub struct GitHubClient {
    http: ExternalClient,
    token: Option<String>,
}

impl GitHubClient {
    pub fn new(http: ExternalClient, token: Option<String>) -> Self {
        Self { http, token }
    }

    /// GET /users/{login}
    pub async fn fetch_user(&self, login: &str) -> Result<GitHubUser, ExternalApiError> {
        let url = format!("{GITHUB_API}/users/{login}");
        self.http.get_json(&url, &[], self.token.as_deref()).await
    }

    /// GET /users/{login}/repos, most recently pushed first (one page of 100).
    pub async fn fetch_repos(&self, login: &str) -> Result<Vec<GitHubRepo>, ExternalApiError> {
        let url = format!("{GITHUB_API}/users/{login}/repos");
        let query = [
            ("per_page", "100".to_string()),
            ("sort", "pushed".to_string()),
        ];
        let repos: Vec<GitHubRepo> = self
            .http
            .get_json(&url, &query, self.token.as_deref())
            .await?;
        debug!(login, repos = repos.len(), "Fetched GitHub repos");
        Ok(repos)
    }
}
