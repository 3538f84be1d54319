//! Match scoring engine. Ranks jobs against a candidate profile.
//!
//! overall = w_skill × skill + w_exp × experience + w_loc × location, each sub-score 0–100.
//! Deterministic and allocation-light; no I/O.

use std::cmp::Ordering;
use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::job::JobRow;
use crate::models::user::UserRow;
use crate::resume::parser::ParsedResume;
use crate::skills::normalize_skills;

/// Score used when there is not enough information to judge a dimension.
pub const NEUTRAL_SCORE: f64 = 50.0;

// ────────────────────────────────────────────────────────────────────────────
// Experience levels
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExperienceLevel {
    Entry,
    Mid,
    Senior,
    Lead,
}

impl ExperienceLevel {
    /// Parses free-form level words ("Sr.", "junior", "Principal Engineer").
    /// Checks the most senior vocabulary first so "Senior Lead" reads as Lead.
    pub fn parse(raw: &str) -> Option<Self> {
        let lower = raw.to_lowercase();
        let tokens: Vec<&str> = lower
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .collect();
        let has = |words: &[&str]| tokens.iter().any(|t| words.contains(t));
        // Roman grades only count at the end: "Engineer II", not "I/O Platform".
        let grade = tokens.last().copied().filter(|_| tokens.len() > 1);

        if has(&["lead", "principal", "staff", "head", "director", "architect", "manager"]) {
            Some(Self::Lead)
        } else if has(&["senior", "sr", "experienced"]) {
            Some(Self::Senior)
        } else if has(&["mid", "intermediate", "midlevel"])
            || lower.contains("mid-level")
            || grade == Some("ii")
        {
            Some(Self::Mid)
        } else if has(&["entry", "junior", "jr", "intern", "internship", "graduate", "trainee"])
            || grade == Some("i")
        {
            Some(Self::Entry)
        } else {
            None
        }
    }

    /// Buckets raw years of experience. Ranges overlap at the top (Senior 5–10,
    /// Lead 8+); 8 years and above bucket as Lead.
    pub fn from_years(years: f64) -> Self {
        match years {
            y if y < 2.0 => Self::Entry,
            y if y < 5.0 => Self::Mid,
            y if y < 8.0 => Self::Senior,
            _ => Self::Lead,
        }
    }

    /// Expected years of experience: (min, max). Lead has no upper bound.
    pub fn year_range(self) -> (f64, Option<f64>) {
        match self {
            Self::Entry => (0.0, Some(2.0)),
            Self::Mid => (2.0, Some(5.0)),
            Self::Senior => (5.0, Some(10.0)),
            Self::Lead => (8.0, None),
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Entry => "entry",
            Self::Mid => "mid",
            Self::Senior => "senior",
            Self::Lead => "lead",
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Inputs
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CandidateProfile {
    pub skills: Vec<String>,
    pub years_experience: Option<f64>,
    pub location: Option<String>,
    pub open_to_remote: bool,
    pub willing_to_relocate: bool,
}

impl CandidateProfile {
    pub fn from_resume(resume: &ParsedResume) -> Self {
        Self {
            skills: normalize_skills(&resume.skills),
            years_experience: resume.years_experience,
            location: resume.location.clone(),
            open_to_remote: true,
            willing_to_relocate: false,
        }
    }

    pub fn from_user(user: &UserRow) -> Self {
        Self {
            skills: normalize_skills(&user.skills),
            years_experience: user.years_experience,
            location: user.location.clone(),
            open_to_remote: true,
            willing_to_relocate: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MatchWeights {
    pub skills: f64,
    pub experience: f64,
    pub location: f64,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            skills: 0.5,
            experience: 0.3,
            location: 0.2,
        }
    }
}

impl MatchWeights {
    /// Rescales weights to sum to 1. Negative or non-finite weights count as zero;
    /// an all-zero set falls back to the defaults.
    pub fn normalized(self) -> Self {
        let clean = |w: f64| if w.is_finite() && w > 0.0 { w } else { 0.0 };
        let (s, e, l) = (clean(self.skills), clean(self.experience), clean(self.location));
        let total = s + e + l;
        if total <= 0.0 {
            return Self::default();
        }
        Self {
            skills: s / total,
            experience: e / total,
            location: l / total,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Output
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchLevel {
    Excellent,
    Good,
    Fair,
    Poor,
}

impl MatchLevel {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 80.0 => Self::Excellent,
            s if s >= 60.0 => Self::Good,
            s if s >= 40.0 => Self::Fair,
            _ => Self::Poor,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub job_id: Uuid,
    pub overall: f64,
    pub skill_score: f64,
    pub experience_score: f64,
    pub location_score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub level: MatchLevel,
}

#[derive(Debug, Clone, Serialize)]
pub struct RankedJob {
    pub job: JobRow,
    pub r#match: MatchResult,
}

// ────────────────────────────────────────────────────────────────────────────
// Sub-scores
// ────────────────────────────────────────────────────────────────────────────

pub struct SkillOverlap {
    pub score: f64,
    pub matched: Vec<String>,
    pub missing: Vec<String>,
}

/// Share of the job's skills the candidate covers. Jobs that list no skills are neutral.
pub fn skill_overlap(candidate_skills: &[String], job_skills: &[String]) -> SkillOverlap {
    let required = normalize_skills(job_skills);
    if required.is_empty() {
        return SkillOverlap {
            score: NEUTRAL_SCORE,
            matched: vec![],
            missing: vec![],
        };
    }

    let have: HashSet<String> = normalize_skills(candidate_skills).into_iter().collect();
    let (matched, missing): (Vec<String>, Vec<String>) =
        required.into_iter().partition(|s| have.contains(s));

    let score = 100.0 * matched.len() as f64 / (matched.len() + missing.len()) as f64;
    SkillOverlap {
        score,
        matched,
        missing,
    }
}

/// 100 inside the level's range; −20 per missing year below it; −5 per extra
/// year above it, never below 60.
pub fn experience_score(years: Option<f64>, level: Option<ExperienceLevel>) -> f64 {
    let (Some(years), Some(level)) = (years.filter(|y| y.is_finite() && *y >= 0.0), level) else {
        return NEUTRAL_SCORE;
    };
    let (min, max) = level.year_range();

    if years < min {
        (100.0 - 20.0 * (min - years)).max(0.0)
    } else if let Some(max) = max.filter(|m| years > *m) {
        (100.0 - 5.0 * (years - max)).max(60.0)
    } else {
        100.0
    }
}

fn location_segments(location: &str) -> Vec<String> {
    location
        .split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn overlaps(a: &str, b: &str) -> bool {
    a.contains(b) || b.contains(a)
}

pub fn is_remote_location(location: &str) -> bool {
    let lower = location.to_lowercase();
    lower.contains("remote") || lower.contains("anywhere") || lower.contains("work from home")
}

pub fn location_score(candidate: &CandidateProfile, job: &JobRow) -> f64 {
    let job_remote = job.is_remote || job.location.as_deref().is_some_and(is_remote_location);
    if job_remote {
        return if candidate.open_to_remote { 100.0 } else { 80.0 };
    }

    let (Some(cand), Some(job_loc)) = (candidate.location.as_deref(), job.location.as_deref())
    else {
        return NEUTRAL_SCORE;
    };
    let cand = location_segments(cand);
    let job_loc = location_segments(job_loc);
    let (Some(cand_city), Some(job_city)) = (cand.first(), job_loc.first()) else {
        return NEUTRAL_SCORE;
    };

    if overlaps(cand_city, job_city) {
        100.0
    } else if cand.last().zip(job_loc.last()).is_some_and(|(a, b)| overlaps(a, b)) {
        70.0
    } else if candidate.willing_to_relocate {
        60.0
    } else {
        30.0
    }
}

fn round1(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    ((x * 10.0).round() / 10.0).clamp(0.0, 100.0)
}

// ────────────────────────────────────────────────────────────────────────────
// Scoring & ranking
// ────────────────────────────────────────────────────────────────────────────

/// Scores one job for the candidate.
pub fn score_job(candidate: &CandidateProfile, job: &JobRow, weights: MatchWeights) -> MatchResult {
    let w = weights.normalized();

    let skills = skill_overlap(&candidate.skills, &job.skills);
    let level = job.experience_level.as_deref().and_then(ExperienceLevel::parse);
    let experience = experience_score(candidate.years_experience, level);
    let location = location_score(candidate, job);

    let overall = round1(w.skills * skills.score + w.experience * experience + w.location * location);

    MatchResult {
        job_id: job.id,
        overall,
        skill_score: round1(skills.score),
        experience_score: round1(experience),
        location_score: round1(location),
        matched_skills: skills.matched,
        missing_skills: skills.missing,
        level: MatchLevel::from_score(overall),
    }
}

/// Scores every job, drops those under `min_score`, and returns the best `limit`.
///
/// Order: overall desc, then most recently posted, then id, so repeated calls agree.
pub fn rank_jobs(
    candidate: &CandidateProfile,
    jobs: Vec<JobRow>,
    weights: MatchWeights,
    min_score: f64,
    limit: usize,
) -> Vec<RankedJob> {
    let mut ranked: Vec<RankedJob> = jobs
        .into_iter()
        .map(|job| {
            let r#match = score_job(candidate, &job, weights);
            RankedJob { job, r#match }
        })
        .filter(|r| r.r#match.overall >= min_score)
        .collect();

    ranked.sort_by(|a, b| {
        b.r#match
            .overall
            .partial_cmp(&a.r#match.overall)
            .unwrap_or(Ordering::Equal)
            .then_with(|| b.job.posted_at.cmp(&a.job.posted_at))
            .then_with(|| a.job.id.cmp(&b.job.id))
    });
    ranked.truncate(limit);
    ranked
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    pub(crate) fn make_job(skills: &[&str], level: Option<&str>, location: Option<&str>, remote: bool) -> JobRow {
        JobRow {
            id: Uuid::new_v4(),
            source: "test".to_string(),
            external_id: Uuid::new_v4().to_string(),
            title: "Backend Engineer".to_string(),
            company: "Acme".to_string(),
            location: location.map(str::to_string),
            description: String::new(),
            job_type: Some("full_time".to_string()),
            experience_level: level.map(str::to_string),
            is_remote: remote,
            salary_min: None,
            salary_max: None,
            skills: skills.iter().map(|s| s.to_string()).collect(),
            apply_url: None,
            posted_at: Some(Utc::now()),
            scraped_at: Utc::now(),
        }
    }

    fn candidate(skills: &[&str], years: Option<f64>, location: Option<&str>) -> CandidateProfile {
        CandidateProfile {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            years_experience: years,
            location: location.map(str::to_string),
            open_to_remote: true,
            willing_to_relocate: false,
        }
    }

    #[test]
    fn test_level_parsing() {
        assert_eq!(ExperienceLevel::parse("Sr. Software Engineer"), Some(ExperienceLevel::Senior));
        assert_eq!(ExperienceLevel::parse("Junior Developer"), Some(ExperienceLevel::Entry));
        assert_eq!(ExperienceLevel::parse("Principal Engineer"), Some(ExperienceLevel::Lead));
        assert_eq!(ExperienceLevel::parse("Senior Tech Lead"), Some(ExperienceLevel::Lead));
        assert_eq!(ExperienceLevel::parse("mid-level"), Some(ExperienceLevel::Mid));
        assert_eq!(ExperienceLevel::parse("Software Engineer"), None);
    }

    #[test]
    fn test_roman_grade_only_as_last_token() {
        assert_eq!(ExperienceLevel::parse("Software Engineer II"), Some(ExperienceLevel::Mid));
        assert_eq!(ExperienceLevel::parse("Data Analyst I"), Some(ExperienceLevel::Entry));
        assert_eq!(ExperienceLevel::parse("Engineer, I/O Platform"), None);
        assert_eq!(ExperienceLevel::parse("II Engineer"), None);
    }

    #[test]
    fn test_from_years_buckets() {
        assert_eq!(ExperienceLevel::from_years(0.5), ExperienceLevel::Entry);
        assert_eq!(ExperienceLevel::from_years(3.0), ExperienceLevel::Mid);
        assert_eq!(ExperienceLevel::from_years(6.0), ExperienceLevel::Senior);
        assert_eq!(ExperienceLevel::from_years(8.0), ExperienceLevel::Lead);
    }

    #[test]
    fn test_skill_overlap_uses_aliases() {
        let overlap = skill_overlap(
            &["JS".to_string(), "postgres".to_string()],
            &["javascript".to_string(), "postgresql".to_string(), "docker".to_string(), "kubernetes".to_string()],
        );
        assert_eq!(overlap.score, 50.0);
        assert_eq!(overlap.matched, vec!["javascript", "postgresql"]);
        assert_eq!(overlap.missing, vec!["docker", "kubernetes"]);
    }

    #[test]
    fn test_skill_overlap_neutral_without_job_skills() {
        let overlap = skill_overlap(&["rust".to_string()], &[]);
        assert_eq!(overlap.score, NEUTRAL_SCORE);
        assert!(overlap.matched.is_empty());
    }

    #[test]
    fn test_experience_score_rules() {
        let senior = Some(ExperienceLevel::Senior);
        assert_eq!(experience_score(Some(7.0), senior), 100.0);
        assert_eq!(experience_score(Some(3.0), senior), 60.0);
        assert_eq!(experience_score(Some(0.0), senior), 0.0);
        assert_eq!(experience_score(Some(12.0), senior), 90.0);
        assert_eq!(experience_score(Some(30.0), senior), 60.0);
        assert_eq!(experience_score(Some(25.0), Some(ExperienceLevel::Lead)), 100.0);
        assert_eq!(experience_score(None, senior), NEUTRAL_SCORE);
        assert_eq!(experience_score(Some(3.0), None), NEUTRAL_SCORE);
        assert_eq!(experience_score(Some(f64::NAN), senior), NEUTRAL_SCORE);
    }

    #[test]
    fn test_location_score_rules() {
        let cand = candidate(&[], None, Some("Tunis, Tunisia"));
        assert_eq!(location_score(&cand, &make_job(&[], None, Some("Paris"), true)), 100.0);
        assert_eq!(location_score(&cand, &make_job(&[], None, Some("Remote"), false)), 100.0);
        assert_eq!(location_score(&cand, &make_job(&[], None, Some("Tunis"), false)), 100.0);
        assert_eq!(location_score(&cand, &make_job(&[], None, Some("Sfax, Tunisia"), false)), 70.0);
        assert_eq!(location_score(&cand, &make_job(&[], None, Some("Berlin, Germany"), false)), 30.0);
        assert_eq!(location_score(&cand, &make_job(&[], None, None, false)), NEUTRAL_SCORE);

        let mover = CandidateProfile {
            willing_to_relocate: true,
            ..cand.clone()
        };
        assert_eq!(location_score(&mover, &make_job(&[], None, Some("Berlin, Germany"), false)), 60.0);

        let office_only = CandidateProfile {
            open_to_remote: false,
            ..cand
        };
        assert_eq!(location_score(&office_only, &make_job(&[], None, None, true)), 80.0);
    }

    #[test]
    fn test_score_job_weighted_sum() {
        let cand = candidate(&["python", "django"], Some(6.0), Some("Tunis, Tunisia"));
        let job = make_job(&["python", "django", "docker", "aws"], Some("senior"), Some("Tunis"), false);
        let result = score_job(&cand, &job, MatchWeights::default());
        // 0.5*50 + 0.3*100 + 0.2*100 = 75
        assert_eq!(result.overall, 75.0);
        assert_eq!(result.level, MatchLevel::Good);
        assert_eq!(result.missing_skills, vec!["docker", "aws"]);
    }

    #[test]
    fn test_weights_normalized() {
        let w = MatchWeights {
            skills: 2.0,
            experience: 1.0,
            location: 1.0,
        }
        .normalized();
        assert!((w.skills - 0.5).abs() < 1e-9);
        assert!((w.experience - 0.25).abs() < 1e-9);

        let fallback = MatchWeights {
            skills: 0.0,
            experience: -1.0,
            location: f64::NAN,
        }
        .normalized();
        assert_eq!(fallback.skills, 0.5);
    }

    #[test]
    fn test_overall_bounded() {
        let cand = candidate(&["rust"], Some(100.0), Some("x"));
        let job = make_job(&["rust"], Some("entry"), Some("x"), false);
        let result = score_job(&cand, &job, MatchWeights::default());
        assert!((0.0..=100.0).contains(&result.overall));
    }

    #[test]
    fn test_rank_jobs_orders_filters_and_limits() {
        let cand = candidate(&["rust", "docker"], Some(4.0), Some("Tunis"));
        let strong = make_job(&["rust", "docker"], Some("mid"), Some("Tunis"), false);
        let weak = make_job(&["java", "spring boot"], Some("lead"), Some("Oslo, Norway"), false);
        let mut older_tie = make_job(&["rust", "docker"], Some("mid"), Some("Tunis"), false);
        older_tie.posted_at = Some(Utc::now() - Duration::days(10));

        let strong_id = strong.id;
        let older_id = older_tie.id;

        let ranked = rank_jobs(&cand, vec![weak, older_tie, strong], MatchWeights::default(), 40.0, 10);
        assert_eq!(ranked.len(), 2);
        assert_eq!(ranked[0].job.id, strong_id);
        assert_eq!(ranked[1].job.id, older_id);

        let limited = rank_jobs(&cand, vec![make_job(&["rust"], None, None, true); 3], MatchWeights::default(), 0.0, 2);
        assert_eq!(limited.len(), 2);
    }

    #[test]
    fn test_match_level_thresholds() {
        assert_eq!(MatchLevel::from_score(80.0), MatchLevel::Excellent);
        assert_eq!(MatchLevel::from_score(79.9), MatchLevel::Good);
        assert_eq!(MatchLevel::from_score(40.0), MatchLevel::Fair);
        assert_eq!(MatchLevel::from_score(39.9), MatchLevel::Poor);
    }
}
