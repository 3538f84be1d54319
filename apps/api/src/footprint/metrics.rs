//! Footprint metrics: visibility scores, privacy exposure and recommendations.
//!
//! Pure functions over already-fetched profile data; no I/O.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::footprint::github::{GitHubRepo, GitHubUser};
use crate::footprint::stackoverflow::{BadgeCounts, StackOverflowUser, TopTag};

const TOP_LANGUAGES: usize = 5;
const TOP_TAGS: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PrivacyRiskLevel {
    Low,
    Medium,
    High,
}

impl PrivacyRiskLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s < 30.0 => Self::Low,
            s if s < 60.0 => Self::Medium,
            _ => Self::High,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LanguageCount {
    pub language: String,
    pub repos: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GitHubSummary {
    pub login: String,
    pub profile_url: Option<String>,
    pub public_repos: u32,
    pub followers: u32,
    pub total_stars: u64,
    pub top_languages: Vec<LanguageCount>,
    pub last_push: Option<DateTime<Utc>>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StackOverflowSummary {
    pub user_id: i64,
    pub display_name: String,
    pub profile_url: Option<String>,
    pub reputation: u64,
    pub answer_count: u64,
    pub badges: BadgeCounts,
    pub top_tags: Vec<String>,
    pub score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FootprintReport {
    pub visibility_score: f64,
    pub privacy_risk_score: f64,
    pub privacy_risk_level: PrivacyRiskLevel,
    pub github: Option<GitHubSummary>,
    pub stackoverflow: Option<StackOverflowSummary>,
    pub exposed_fields: Vec<String>,
    pub recommendations: Vec<String>,
}

/// Everything fetched from StackOverflow for one user.
pub struct StackOverflowProfile {
    pub user: StackOverflowUser,
    pub answer_count: u64,
    pub top_tags: Vec<TopTag>,
}

fn round1(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    ((x * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

/// `min(log10(1 + n) / scale, 1)`
fn log_ratio(n: f64, scale: f64) -> f64 {
    ((1.0 + n.max(0.0)).log10() / scale).min(1.0)
}

fn present(field: &Option<String>) -> bool {
    field.as_deref().is_some_and(|v| !v.trim().is_empty())
}

fn own_repos(repos: &[GitHubRepo]) -> impl Iterator<Item = &GitHubRepo> {
    repos.iter().filter(|r| !r.fork)
}

pub fn total_stars(repos: &[GitHubRepo]) -> u64 {
    own_repos(repos).map(|r| u64::from(r.stargazers_count)).sum()
}

pub fn last_push(repos: &[GitHubRepo]) -> Option<DateTime<Utc>> {
    repos.iter().filter_map(|r| r.pushed_at).max()
}

/// 25 within 30 days, 15 within 90, 5 within a year, otherwise 0.
pub fn activity_points(last_push: Option<DateTime<Utc>>, now: DateTime<Utc>) -> f64 {
    let Some(pushed) = last_push else {
        return 0.0;
    };
    match (now - pushed).num_days() {
        d if d <= 30 => 25.0,
        d if d <= 90 => 15.0,
        d if d <= 365 => 5.0,
        _ => 0.0,
    }
}

/// Language frequency across non-fork repos. Ties break alphabetically.
pub fn top_languages(repos: &[GitHubRepo], limit: usize) -> Vec<LanguageCount> {
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for repo in own_repos(repos) {
        if let Some(lang) = repo.language.as_deref().filter(|l| !l.is_empty()) {
            *counts.entry(lang).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(&str, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(language, repos)| LanguageCount {
            language: language.to_string(),
            repos,
        })
        .collect()
}

pub fn github_score(user: &GitHubUser, repos: &[GitHubRepo], now: DateTime<Utc>) -> f64 {
    let repo_points = f64::from(user.public_repos.min(30)) / 30.0 * 25.0;
    let star_points = log_ratio(total_stars(repos) as f64, 3.0) * 30.0;
    let follower_points = log_ratio(f64::from(user.followers), 2.5) * 20.0;
    let activity = activity_points(last_push(repos), now);
    round1(repo_points + star_points + follower_points + activity)
}

pub fn stackoverflow_score(reputation: u64, answer_count: u64, badges: BadgeCounts) -> f64 {
    let rep_points = log_ratio(reputation as f64, 5.0) * 60.0;
    let answer_points = answer_count.min(100) as f64 / 100.0 * 25.0;
    let weighted = badges
        .gold
        .saturating_mul(5)
        .saturating_add(badges.silver.saturating_mul(2))
        .saturating_add(badges.bronze);
    let badge_points = f64::from(weighted).min(15.0);
    round1(rep_points + answer_points + badge_points)
}

/// Mean of the platform scores that were scanned; 0 when none were.
pub fn visibility_score(scores: &[f64]) -> f64 {
    if scores.is_empty() {
        return 0.0;
    }
    round1(scores.iter().sum::<f64>() / scores.len() as f64)
}

/// Points for each publicly exposed personal field, capped at 100.
pub fn privacy_exposure(
    github: Option<&GitHubUser>,
    stackoverflow: Option<&StackOverflowUser>,
) -> (f64, Vec<String>) {
    let mut points = 0.0;
    let mut exposed = Vec::new();
    let mut flag = |hit: bool, weight: f64, label: &str| {
        if hit {
            points += weight;
            exposed.push(label.to_string());
        }
    };

    if let Some(user) = github {
        flag(present(&user.email), 30.0, "github.email");
        flag(present(&user.location), 15.0, "github.location");
        flag(present(&user.company), 10.0, "github.company");
        flag(present(&user.blog), 10.0, "github.blog");
        flag(present(&user.twitter_username), 10.0, "github.twitter_username");
        flag(user.hireable == Some(true), 5.0, "github.hireable");
        flag(present(&user.name), 10.0, "github.name");
    }
    if let Some(user) = stackoverflow {
        flag(present(&user.location), 10.0, "stackoverflow.location");
        flag(present(&user.website_url), 10.0, "stackoverflow.website_url");
    }

    (f64::min(points, 100.0), exposed)
}

fn recommendations(
    github: Option<&GitHubSummary>,
    stackoverflow: Option<&StackOverflowSummary>,
    exposed: &[String],
    risk: PrivacyRiskLevel,
) -> Vec<String> {
    let mut recs = Vec::new();

    match github {
        Some(gh) => {
            if gh.public_repos < 5 {
                recs.push("Publish more projects on GitHub to showcase your work".to_string());
            }
            if gh.last_push.is_none() || gh.score < 40.0 {
                recs.push("Commit regularly; recent activity raises profile visibility".to_string());
            }
            if gh.total_stars < 10 {
                recs.push("Add READMEs and demos so your repositories attract stars".to_string());
            }
        }
        None => recs.push("Link a GitHub profile to demonstrate your code".to_string()),
    }

    match stackoverflow {
        Some(so) => {
            if so.answer_count < 10 {
                recs.push("Answer StackOverflow questions in your core technologies".to_string());
            }
        }
        None => recs.push(
            "Consider a StackOverflow presence to show problem-solving skills".to_string(),
        ),
    }

    if exposed.iter().any(|f| f == "github.email") {
        recs.push("Hide your email on GitHub or use a no-reply address".to_string());
    }
    if risk == PrivacyRiskLevel::High {
        recs.push("Review which personal details are public across your profiles".to_string());
    }
    recs
}

pub fn summarize_github(user: &GitHubUser, repos: &[GitHubRepo], now: DateTime<Utc>) -> GitHubSummary {
    GitHubSummary {
        login: user.login.clone(),
        profile_url: user.html_url.clone(),
        public_repos: user.public_repos,
        followers: user.followers,
        total_stars: total_stars(repos),
        top_languages: top_languages(repos, TOP_LANGUAGES),
        last_push: last_push(repos),
        score: github_score(user, repos, now),
    }
}

pub fn summarize_stackoverflow(profile: &StackOverflowProfile) -> StackOverflowSummary {
    let user = &profile.user;
    StackOverflowSummary {
        user_id: user.user_id,
        display_name: user.display_name.clone(),
        profile_url: user.link.clone(),
        reputation: user.reputation,
        answer_count: profile.answer_count,
        badges: user.badge_counts,
        top_tags: profile
            .top_tags
            .iter()
            .take(TOP_TAGS)
            .map(|t| t.tag_name.clone())
            .collect(),
        score: stackoverflow_score(user.reputation, profile.answer_count, user.badge_counts),
    }
}

pub fn build_report(
    github: Option<(&GitHubUser, &[GitHubRepo])>,
    stackoverflow: Option<&StackOverflowProfile>,
    now: DateTime<Utc>,
) -> FootprintReport {
    let github_summary = github.map(|(user, repos)| summarize_github(user, repos, now));
    let so_summary = stackoverflow.map(summarize_stackoverflow);

    let scores: Vec<f64> = github_summary
        .iter()
        .map(|g| g.score)
        .chain(so_summary.iter().map(|s| s.score))
        .collect();

    let (privacy_risk_score, exposed_fields) =
        privacy_exposure(github.map(|(u, _)| u), stackoverflow.map(|p| &p.user));
    let level = PrivacyRiskLevel::from_score(privacy_risk_score);

    FootprintReport {
        visibility_score: visibility_score(&scores),
        privacy_risk_score,
        privacy_risk_level: level,
        recommendations: recommendations(
            github_summary.as_ref(),
            so_summary.as_ref(),
            &exposed_fields,
            level,
        ),
        github: github_summary,
        stackoverflow: so_summary,
        exposed_fields,
    }
}
