//! Compatibility analysis: trait-based comparison of one resume against one job.
//!
//! Default: `HeuristicCompatibilityAnalyzer` (deterministic, no network).
//! `AppState` holds an `Arc<dyn CompatibilityAnalyzer>`, chosen at startup.

use std::collections::{HashMap, HashSet};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AppError;
use crate::jobs::matcher::{
    experience_score, score_job, CandidateProfile, ExperienceLevel, MatchWeights,
};
use crate::models::job::JobRow;
use crate::resume::parser::ParsedResume;
use crate::skills::{extract_skills, normalize_skills};

/// How many job-description keywords are considered for coverage.
const TOP_KEYWORDS: usize = 30;
const MIN_KEYWORD_LEN: usize = 4;

const STOPWORDS: &[&str] = &[
    "about", "above", "after", "again", "also", "andor", "being", "both", "company", "could",
    "each", "experience", "from", "have", "having", "into", "more", "most", "must", "other",
    "ours", "over", "role", "same", "should", "some", "such", "team", "than", "that", "their",
    "them", "then", "there", "these", "they", "this", "those", "through", "under", "until",
    "very", "want", "were", "what", "when", "where", "which", "while", "will", "with", "within",
    "work", "working", "would", "year", "years", "your", "youll", "able", "across", "including",
    "join", "looking", "strong", "skills", "plus", "preferred", "required", "requirements",
    "responsibilities", "candidate", "ability", "knowledge", "using", "well", "based",
];

// ────────────────────────────────────────────────────────────────────────────
// Report model
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilityReport {
    pub compatibility_score: u32, // 0 – 100
    pub match_score: f64,
    pub matched_skills: Vec<String>,
    pub missing_skills: Vec<String>,
    pub additional_skills: Vec<String>,
    pub experience_fit: String,
    pub keyword_coverage: f64, // 0.0 – 1.0
    pub missing_keywords: Vec<String>,
    pub strengths: Vec<String>,
    pub recommendations: Vec<String>,
    pub summary: String,
    pub analyzer_backend: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Implement this to swap analysis backends without touching handlers.
#[async_trait]
pub trait CompatibilityAnalyzer: Send + Sync {
    async fn analyze(
        &self,
        resume: &ParsedResume,
        resume_text: &str,
        job: &JobRow,
    ) -> Result<CompatibilityReport, AppError>;
}

pub struct HeuristicCompatibilityAnalyzer;

#[async_trait]
impl CompatibilityAnalyzer for HeuristicCompatibilityAnalyzer {
    async fn analyze(
        &self,
        resume: &ParsedResume,
        resume_text: &str,
        job: &JobRow,
    ) -> Result<CompatibilityReport, AppError> {
        Ok(analyze_heuristic(resume, resume_text, job))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Heuristic algorithm
// ────────────────────────────────────────────────────────────────────────────

/// score = 0.6 × match-engine overall + 0.4 × keyword coverage × 100.
/// When the description yields no keywords the match-engine score stands alone.
pub fn analyze_heuristic(resume: &ParsedResume, resume_text: &str, job: &JobRow) -> CompatibilityReport {
    // Jobs scraped without a skill list still carry skills in their description.
    let mut job_skills = job.skills.clone();
    job_skills.extend(extract_skills(&format!("{}\n{}", job.title, job.description)));
    let job_skills = normalize_skills(&job_skills);

    let enriched = JobRow {
        skills: job_skills.clone(),
        ..job.clone()
    };
    let candidate = CandidateProfile::from_resume(resume);
    let result = score_job(&candidate, &enriched, MatchWeights::default());

    let required: HashSet<&String> = job_skills.iter().collect();
    let additional_skills: Vec<String> = candidate
        .skills
        .iter()
        .filter(|s| !required.contains(s))
        .cloned()
        .collect();

    let keywords = significant_keywords(&format!("{} {}", job.title, job.description), TOP_KEYWORDS);
    let resume_tokens: HashSet<String> = tokenize(resume_text).collect();
    let (present, missing_keywords): (Vec<String>, Vec<String>) =
        keywords.iter().cloned().partition(|k| resume_tokens.contains(k));

    let keyword_coverage = if keywords.is_empty() {
        None
    } else {
        Some(present.len() as f64 / keywords.len() as f64)
    };

    let raw_score = match keyword_coverage {
        Some(coverage) => 0.6 * result.overall + 0.4 * coverage * 100.0,
        None => result.overall,
    };
    let compatibility_score = raw_score.round().clamp(0.0, 100.0) as u32;
    let keyword_coverage = keyword_coverage.unwrap_or(0.0);

    let level = job.experience_level.as_deref().and_then(ExperienceLevel::parse);
    let experience_fit = experience_fit_label(resume.years_experience, level);

    let strengths = build_strengths(
        &result.matched_skills,
        job_skills.len(),
        result.experience_score,
        result.location_score,
        keyword_coverage,
    );
    let recommendations = build_recommendations(
        &result.missing_skills,
        &missing_keywords,
        keyword_coverage,
        resume.years_experience,
        level,
    );

    CompatibilityReport {
        compatibility_score,
        match_score: result.overall,
        matched_skills: result.matched_skills,
        missing_skills: result.missing_skills,
        additional_skills,
        experience_fit,
        keyword_coverage: (keyword_coverage * 1000.0).round() / 1000.0,
        missing_keywords: missing_keywords.into_iter().take(10).collect(),
        strengths,
        recommendations,
        summary: build_summary(compatibility_score, &job.title, &job.company),
        analyzer_backend: "heuristic".to_string(),
    }
}

fn tokenize(text: &str) -> impl Iterator<Item = String> + '_ {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_lowercase)
}

/// The most frequent non-stopword alphabetic tokens (≥ 4 chars). Ties break alphabetically.
pub fn significant_keywords(text: &str, limit: usize) -> Vec<String> {
    let mut counts: HashMap<String, usize> = HashMap::new();
    for token in tokenize(text) {
        if token.chars().count() >= MIN_KEYWORD_LEN
            && token.chars().all(char::is_alphabetic)
            && !STOPWORDS.contains(&token.as_str())
        {
            *counts.entry(token).or_insert(0) += 1;
        }
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(limit).map(|(k, _)| k).collect()
}

pub fn experience_fit_label(years: Option<f64>, level: Option<ExperienceLevel>) -> String {
    let (Some(y), Some(l)) = (years, level) else {
        return "Not enough information to assess experience".to_string();
    };
    let (min, max) = l.year_range();
    let score = experience_score(Some(y), Some(l));
    if y < min {
        format!("Below the expected range ({y:.0} of {min:.0}+ years, score {score:.0})")
    } else if max.is_some_and(|m| y > m) {
        format!("Above the expected range for a {} role", l.as_str())
    } else {
        format!("Within the expected range for a {} role", l.as_str())
    }
}

fn build_strengths(
    matched: &[String],
    required: usize,
    experience: f64,
    location: f64,
    coverage: f64,
) -> Vec<String> {
    let mut strengths = Vec::new();
    if !matched.is_empty() {
        let shown: Vec<&str> = matched.iter().take(5).map(String::as_str).collect();
        strengths.push(format!(
            "Covers {} of {} requested skills: {}",
            matched.len(),
            required,
            shown.join(", ")
        ));
    }
    if experience >= 100.0 {
        strengths.push("Experience level matches the role".to_string());
    }
    if location >= 70.0 {
        strengths.push("Location is compatible with the position".to_string());
    }
    if coverage >= 0.5 {
        strengths.push("Resume language aligns closely with the job description".to_string());
    }
    strengths
}

fn build_recommendations(
    missing_skills: &[String],
    missing_keywords: &[String],
    coverage: f64,
    years: Option<f64>,
    level: Option<ExperienceLevel>,
) -> Vec<String> {
    let mut recs = Vec::new();
    if !missing_skills.is_empty() {
        let shown: Vec<&str> = missing_skills.iter().take(5).map(String::as_str).collect();
        recs.push(format!(
            "Build or highlight experience with: {}",
            shown.join(", ")
        ));
    }
    if coverage < 0.4 && !missing_keywords.is_empty() {
        let shown: Vec<&str> = missing_keywords.iter().take(5).map(String::as_str).collect();
        recs.push(format!(
            "Mirror key terms from the posting where truthful, e.g. {}",
            shown.join(", ")
        ));
    }
    if let (Some(y), Some(l)) = (years, level) {
        if y < l.year_range().0 {
            recs.push(
                "Emphasise projects and quantified outcomes to offset fewer years of experience"
                    .to_string(),
            );
        }
    }
    if years.is_none() {
        recs.push("State your years of experience explicitly in the summary".to_string());
    }
    if recs.is_empty() {
        recs.push("Profile is well aligned; tailor the summary to this company".to_string());
    }
    recs
}

fn build_summary(score: u32, title: &str, company: &str) -> String {
    match score {
        80.. => format!("Strong compatibility ({score}/100) with {title} at {company}."),
        60..=79 => format!(
            "Good compatibility ({score}/100) with {title} at {company}; a few gaps to address."
        ),
        40..=59 => format!(
            "Partial compatibility ({score}/100) with {title} at {company}; notable gaps remain."
        ),
        _ => format!("Low compatibility ({score}/100) with {title} at {company}."),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::matcher::tests::make_job;

    fn resume(skills: &[&str], years: Option<f64>) -> ParsedResume {
        ParsedResume {
            skills: skills.iter().map(|s| s.to_string()).collect(),
            years_experience: years,
            location: Some("Tunis, Tunisia".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_significant_keywords_frequency_then_alpha() {
        let kws = significant_keywords(
            "Kubernetes kubernetes deploy deploy deploy with team cloud; zebra apple",
            10,
        );
        assert_eq!(kws, vec!["deploy", "kubernetes", "apple", "cloud", "zebra"]);
    }

    #[test]
    fn test_skills_pulled_from_description() {
        let mut job = make_job(&[], Some("mid"), Some("Tunis"), false);
        job.description = "We use Python and Docker daily.".to_string();
        let report = analyze_heuristic(&resume(&["python"], Some(3.0)), "python", &job);
        assert_eq!(report.matched_skills, vec!["python"]);
        assert_eq!(report.missing_skills, vec!["docker"]);
        assert_eq!(report.analyzer_backend, "heuristic");
    }

    #[test]
    fn test_additional_skills() {
        let job = make_job(&["rust"], None, None, true);
        let report = analyze_heuristic(&resume(&["rust", "figma"], None), "", &job);
        assert_eq!(report.additional_skills, vec!["figma"]);
    }

    #[test]
    fn test_score_blends_coverage() {
        let mut job = make_job(&["rust"], Some("mid"), Some("Tunis"), false);
        job.title = "Engineer".to_string();
        job.description = "distributed databases".to_string();
        // match overall = 100; keywords: databases, distributed, engineer → 2/3 present
        let report = analyze_heuristic(
            &resume(&["rust"], Some(3.0)),
            "Distributed databases in Rust",
            &job,
        );
        assert_eq!(report.match_score, 100.0);
        assert!((report.keyword_coverage - 0.667).abs() < 1e-9);
        assert_eq!(report.compatibility_score, 87);
    }

    #[test]
    fn test_no_keywords_uses_match_score() {
        let mut job = make_job(&["rust"], Some("mid"), Some("Tunis"), false);
        job.title = "SRE".to_string();
        let report = analyze_heuristic(&resume(&["rust"], Some(3.0)), "", &job);
        assert_eq!(report.compatibility_score, 100);
        assert_eq!(report.keyword_coverage, 0.0);
    }

    #[test]
    fn test_experience_fit_labels() {
        assert!(experience_fit_label(Some(1.0), Some(ExperienceLevel::Senior)).starts_with("Below"));
        assert!(experience_fit_label(Some(12.0), Some(ExperienceLevel::Mid)).starts_with("Above"));
        assert!(experience_fit_label(Some(3.0), Some(ExperienceLevel::Mid)).starts_with("Within"));
        assert!(experience_fit_label(None, Some(ExperienceLevel::Mid)).starts_with("Not enough"));
    }

    #[test]
    fn test_summary_bands() {
        assert!(build_summary(85, "SWE", "Acme").starts_with("Strong"));
        assert!(build_summary(65, "SWE", "Acme").starts_with("Good"));
        assert!(build_summary(45, "SWE", "Acme").starts_with("Partial"));
        assert!(build_summary(10, "SWE", "Acme").starts_with("Low"));
    }

    #[tokio::test]
    async fn test_trait_object_dispatch() {
        let analyzer: Box<dyn CompatibilityAnalyzer> = Box::new(HeuristicCompatibilityAnalyzer);
        let job = make_job(&["rust"], None, None, true);
        let report = analyzer.analyze(&resume(&["rust"], None), "rust", &job).await.unwrap();
        assert_eq!(report.matched_skills, vec!["rust"]);
    }
}
