//! Market insights: aggregate statistics over a set of job postings.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::jobs::matcher::{is_remote_location, ExperienceLevel};
use crate::models::job::JobRow;

const UNSPECIFIED: &str = "unspecified";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountEntry {
    pub name: String,
    pub count: usize,
    pub share: f64, // 0.0 – 1.0 of total_jobs
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalaryStats {
    pub count: usize,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub median: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketInsights {
    pub total_jobs: usize,
    pub remote_share: f64,
    pub top_skills: Vec<CountEntry>,
    pub top_locations: Vec<CountEntry>,
    pub top_companies: Vec<CountEntry>,
    pub job_type_distribution: BTreeMap<String, usize>,
    pub experience_distribution: BTreeMap<String, usize>,
    pub salary: Option<SalaryStats>,
    pub salary_by_level: BTreeMap<String, SalaryStats>,
}

fn round2(x: f64) -> f64 {
    (x * 100.0).round() / 100.0
}

/// Midpoint of whatever salary bounds the job carries.
fn salary_midpoint(job: &JobRow) -> Option<f64> {
    let mid = match (job.salary_min, job.salary_max) {
        (Some(lo), Some(hi)) => (lo + hi) / 2.0,
        (Some(v), None) | (None, Some(v)) => v,
        (None, None) => return None,
    };
    (mid.is_finite() && mid > 0.0).then_some(mid)
}

pub fn salary_stats(values: &[f64]) -> Option<SalaryStats> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    let n = sorted.len();
    let median = if n % 2 == 0 {
        (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
    } else {
        sorted[n / 2]
    };
    Some(SalaryStats {
        count: n,
        min: round2(sorted[0]),
        max: round2(sorted[n - 1]),
        mean: round2(sorted.iter().sum::<f64>() / n as f64),
        median: round2(median),
    })
}

/// Count descending, then name ascending; keeps the first `top_n`.
fn top_entries(counts: HashMap<String, usize>, total: usize, top_n: usize) -> Vec<CountEntry> {
    let mut entries: Vec<(String, usize)> = counts.into_iter().collect();
    entries.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    entries
        .into_iter()
        .take(top_n)
        .map(|(name, count)| CountEntry {
            share: if total == 0 {
                0.0
            } else {
                (count as f64 / total as f64 * 1000.0).round() / 1000.0
            },
            name,
            count,
        })
        .collect()
}

fn level_key(job: &JobRow) -> String {
    job.experience_level
        .as_deref()
        .and_then(ExperienceLevel::parse)
        .map(|l| l.as_str().to_string())
        .unwrap_or_else(|| UNSPECIFIED.to_string())
}

pub fn compute_market_insights(jobs: &[JobRow], top_n: usize) -> MarketInsights {
    let total = jobs.len();

    let mut skills: HashMap<String, usize> = HashMap::new();
    let mut locations: HashMap<String, usize> = HashMap::new();
    let mut companies: HashMap<String, usize> = HashMap::new();
    let mut job_types: BTreeMap<String, usize> = BTreeMap::new();
    let mut levels: BTreeMap<String, usize> = BTreeMap::new();
    let mut salaries: Vec<f64> = Vec::new();
    let mut salaries_by_level: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    let mut remote = 0usize;

    for job in jobs {
        let is_remote = job.is_remote || job.location.as_deref().is_some_and(is_remote_location);
        if is_remote {
            remote += 1;
        }

        // A posting that repeats a skill counts it once.
        let mut seen = job.skills.clone();
        seen.sort();
        seen.dedup();
        for skill in seen {
            *skills.entry(skill).or_insert(0) += 1;
        }

        let location = match job.location.as_deref().map(str::trim) {
            _ if is_remote => Some("Remote".to_string()),
            Some(l) if !l.is_empty() => Some(l.to_string()),
            _ => None,
        };
        if let Some(location) = location {
            *locations.entry(location).or_insert(0) += 1;
        }

        let company = job.company.trim();
        if !company.is_empty() {
            *companies.entry(company.to_string()).or_insert(0) += 1;
        }

        let job_type = job
            .job_type
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .unwrap_or(UNSPECIFIED)
            .to_lowercase();
        *job_types.entry(job_type).or_insert(0) += 1;

        let level = level_key(job);
        *levels.entry(level.clone()).or_insert(0) += 1;

        if let Some(mid) = salary_midpoint(job) {
            salaries.push(mid);
            salaries_by_level.entry(level).or_default().push(mid);
        }
    }

    MarketInsights {
        total_jobs: total,
        remote_share: if total == 0 {
            0.0
        } else {
            (remote as f64 / total as f64 * 1000.0).round() / 1000.0
        },
        top_skills: top_entries(skills, total, top_n),
        top_locations: top_entries(locations, total, top_n),
        top_companies: top_entries(companies, total, top_n),
        job_type_distribution: job_types,
        experience_distribution: levels,
        salary: salary_stats(&salaries),
        salary_by_level: salaries_by_level
            .into_iter()
            .filter_map(|(level, values)| salary_stats(&values).map(|s| (level, s)))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::matcher::tests::make_job;

    fn with_salary(mut job: JobRow, min: Option<f64>, max: Option<f64>) -> JobRow {
        job.salary_min = min;
        job.salary_max = max;
        job
    }

    #[test]
    fn test_empty_input() {
        let insights = compute_market_insights(&[], 10);
        assert_eq!(insights.total_jobs, 0);
        assert_eq!(insights.remote_share, 0.0);
        assert!(insights.top_skills.is_empty());
        assert!(insights.salary.is_none());
        assert!(insights.salary_by_level.is_empty());
    }

    #[test]
    fn test_top_skills_ties_alphabetical() {
        let jobs = vec![
            make_job(&["rust", "go"], None, Some("Tunis"), false),
            make_job(&["rust", "python"], None, Some("Tunis"), false),
            make_job(&["go", "python", "aws"], None, Some("Sfax"), false),
        ];
        let insights = compute_market_insights(&jobs, 3);
        let names: Vec<&str> = insights.top_skills.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["go", "python", "rust"]);
        assert_eq!(insights.top_skills[0].count, 2);
        assert!((insights.top_skills[0].share - 0.667).abs() < 1e-9);
        assert_eq!(insights.top_locations[0].name, "Tunis");
    }

    #[test]
    fn test_remote_share_and_location_bucket() {
        let jobs = vec![
            make_job(&[], None, Some("Paris"), true),
            make_job(&[], None, Some("Anywhere"), false),
            make_job(&[], None, Some("Paris"), false),
            make_job(&[], None, None, false),
        ];
        let insights = compute_market_insights(&jobs, 5);
        assert_eq!(insights.remote_share, 0.5);
        assert_eq!(insights.top_locations[0].name, "Remote");
        assert_eq!(insights.top_locations[0].count, 2);
        assert_eq!(insights.top_locations.len(), 2);
    }

    #[test]
    fn test_distributions_use_unspecified() {
        let mut untyped = make_job(&[], None, None, false);
        untyped.job_type = None;
        let jobs = vec![untyped, make_job(&[], Some("Senior"), None, false)];
        let insights = compute_market_insights(&jobs, 5);
        assert_eq!(insights.job_type_distribution.get(UNSPECIFIED), Some(&1));
        assert_eq!(insights.job_type_distribution.get("full_time"), Some(&1));
        assert_eq!(insights.experience_distribution.get("senior"), Some(&1));
        assert_eq!(insights.experience_distribution.get(UNSPECIFIED), Some(&1));
    }

    #[test]
    fn test_salary_stats_over_midpoints() {
        let jobs = vec![
            with_salary(make_job(&[], Some("mid"), None, false), Some(40_000.0), Some(60_000.0)),
            with_salary(make_job(&[], Some("mid"), None, false), Some(70_000.0), None),
            with_salary(make_job(&[], Some("senior"), None, false), None, Some(100_000.0)),
            make_job(&[], Some("senior"), None, false),
        ];
        let insights = compute_market_insights(&jobs, 5);
        let salary = insights.salary.unwrap();
        assert_eq!(salary.count, 3);
        assert_eq!(salary.min, 50_000.0);
        assert_eq!(salary.max, 100_000.0);
        assert_eq!(salary.median, 70_000.0);
        assert_eq!(salary.mean, 73_333.33);

        let mid = &insights.salary_by_level["mid"];
        assert_eq!(mid.median, 60_000.0);
        assert_eq!(insights.salary_by_level["senior"].count, 1);
    }

    #[test]
    fn test_duplicate_skill_counted_once_per_job() {
        let jobs = vec![make_job(&["rust", "rust"], None, None, false)];
        let insights = compute_market_insights(&jobs, 5);
        assert_eq!(insights.top_skills[0].count, 1);
    }
}
