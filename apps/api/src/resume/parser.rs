//! Rule-based resume parser: turns raw resume text into a `ParsedResume`.

use chrono::{Datelike, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::skills::extract_skills;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParsedResume {
    pub name: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub summary: Option<String>,
    pub skills: Vec<String>,
    pub years_experience: Option<f64>,
    pub education: Vec<String>,
    pub experience: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Section {
    Header,
    Summary,
    Experience,
    Education,
    Skills,
    Other,
}

static EMAIL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[a-z0-9._%+-]+@[a-z0-9.-]+\.[a-z]{2,}").unwrap());

static PHONE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\+?\(?\d{1,4}\)?(?:[\s.-]?\(?\d{2,4}\)?){2,4}").unwrap()
});

static YEARS_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)(\d{1,2}(?:\.\d)?)\s*\+?\s*(?:years?|yrs?)\b").unwrap()
});

static YEAR_RANGE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\b((?:19|20)\d{2})\s*(?:-|–|—|to)\s*((?:19|20)\d{2}|present|current|now)\b")
        .unwrap()
});

static LOCATION_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?im)^\s*(?:location|address|based in)\s*[:\-]\s*(.+?)\s*$").unwrap()
});

const DEGREE_KEYWORDS: &[&str] = &[
    "bachelor", "master", "phd", "ph.d", "b.sc", "m.sc", "bsc", "msc", "b.tech", "m.tech",
    "b.s.", "m.s.", "mba", "diploma", "degree", "licence", "engineering school",
];

/// Upper bound for any experience figure read from text.
const MAX_YEARS: f64 = 50.0;

/// Parses raw resume text. Never fails: missing fields stay `None` / empty.
pub fn parse_resume_text(text: &str) -> ParsedResume {
    let lines: Vec<&str> = text.lines().map(str::trim).collect();

    let mut section = Section::Header;
    let mut summary_lines = Vec::new();
    let mut experience = Vec::new();
    let mut education = Vec::new();

    for line in &lines {
        if line.is_empty() {
            continue;
        }
        if let Some(next) = heading_section(line) {
            section = next;
            continue;
        }
        let content = strip_bullet(line);
        if content.is_empty() {
            continue;
        }
        match section {
            Section::Summary => summary_lines.push(content.to_string()),
            Section::Experience => experience.push(content.to_string()),
            Section::Education => push_unique(&mut education, content),
            _ => {
                if has_degree_keyword(content) {
                    push_unique(&mut education, content);
                }
            }
        }
    }

    let experience_text = if experience.is_empty() {
        text.to_string()
    } else {
        experience.join("\n")
    };

    ParsedResume {
        name: extract_name(&lines),
        email: EMAIL_RE.find(text).map(|m| m.as_str().to_lowercase()),
        phone: extract_phone(text),
        location: LOCATION_RE
            .captures(text)
            .and_then(|c| c.get(1))
            .map(|m| m.as_str().to_string()),
        summary: (!summary_lines.is_empty()).then(|| summary_lines.join(" ")),
        skills: extract_skills(text),
        years_experience: explicit_years(text).or_else(|| years_from_ranges(&experience_text)),
        education,
        experience,
    }
}

fn heading_section(line: &str) -> Option<Section> {
    let heading = line.trim_end_matches(':').trim().to_lowercase();
    let section = match heading.as_str() {
        "summary" | "profile" | "professional summary" | "objective" | "about me" => {
            Section::Summary
        }
        "experience" | "work experience" | "professional experience" | "employment history"
        | "work history" => Section::Experience,
        "education" | "academic background" | "education and training" => Section::Education,
        "skills" | "technical skills" | "core competencies" => Section::Skills,
        "projects" | "certifications" | "languages" | "interests" | "awards" | "references" => {
            Section::Other
        }
        _ => return None,
    };
    Some(section)
}

fn strip_bullet(line: &str) -> &str {
    line.trim_start_matches(['-', '*', '•', '·', '▪', '◦'])
        .trim()
}

fn has_degree_keyword(line: &str) -> bool {
    let lower = line.to_lowercase();
    DEGREE_KEYWORDS.iter().any(|k| lower.contains(k))
}

fn push_unique(list: &mut Vec<String>, item: &str) {
    if !list.iter().any(|existing| existing == item) {
        list.push(item.to_string());
    }
}

/// First short line that looks like a person's name.
fn extract_name(lines: &[&str]) -> Option<String> {
    lines
        .iter()
        .filter(|l| !l.is_empty())
        .take(5)
        .find(|l| {
            let words = l.split_whitespace().count();
            words <= 5
                && !l.contains('@')
                && !l.chars().any(|c| c.is_ascii_digit())
                && l.chars().any(char::is_alphabetic)
                && heading_section(l).is_none()
                && !l.contains(':')
        })
        .map(|l| l.to_string())
}

/// Phone numbers need 9-15 digits; shorter digit runs are dates or ids.
fn extract_phone(text: &str) -> Option<String> {
    PHONE_RE
        .find_iter(text)
        .map(|m| m.as_str().trim())
        .find(|candidate| {
            let digits = candidate.chars().filter(char::is_ascii_digit).count();
            (9..=15).contains(&digits) && !YEAR_RANGE_RE.is_match(candidate)
        })
        .map(str::to_string)
}

/// Largest "N years" figure stated in the text.
fn explicit_years(text: &str) -> Option<f64> {
    YEARS_RE
        .captures_iter(text)
        .filter_map(|c| c.get(1)?.as_str().parse::<f64>().ok())
        .filter(|y| *y > 0.0 && *y <= MAX_YEARS)
        .fold(None, |acc: Option<f64>, y| Some(acc.map_or(y, |a| a.max(y))))
}

/// Span from the earliest start year to the latest end year across date ranges.
fn years_from_ranges(text: &str) -> Option<f64> {
    let current_year = Utc::now().year();
    let mut earliest: Option<i32> = None;
    let mut latest: Option<i32> = None;

    for caps in YEAR_RANGE_RE.captures_iter(text) {
        let Some(start) = caps.get(1).and_then(|m| m.as_str().parse::<i32>().ok()) else {
            continue;
        };
        let end = match caps.get(2).map(|m| m.as_str().to_lowercase()) {
            Some(e) if e.chars().all(|c| c.is_ascii_digit()) => e.parse::<i32>().unwrap_or(start),
            Some(_) => current_year,
            None => continue,
        };
        if end < start {
            continue;
        }
        earliest = Some(earliest.map_or(start, |e| e.min(start)));
        latest = Some(latest.map_or(end, |l| l.max(end)));
    }

    match (earliest, latest) {
        (Some(s), Some(e)) => Some(((e - s) as f64).min(MAX_YEARS)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        Amira Ben Salah
        amira.bensalah@Example.com | +216 22 345 678
        Location: Tunis, Tunisia

        Summary
        Backend engineer with 6+ years of experience building APIs.

        Experience
        - Senior Backend Engineer, Acme Corp (2020 - Present)
        - Software Engineer, Globex (2016 - 2020)

        Education
        Bachelor of Computer Science, University of Tunis, 2016

        Skills
        Python, Django, PostgreSQL, Docker, k8s, REST APIs
    "#;

    #[test]
    fn test_parses_contact_fields() {
        let parsed = parse_resume_text(SAMPLE);
        assert_eq!(parsed.name.as_deref(), Some("Amira Ben Salah"));
        assert_eq!(parsed.email.as_deref(), Some("amira.bensalah@example.com"));
        assert_eq!(parsed.phone.as_deref(), Some("+216 22 345 678"));
        assert_eq!(parsed.location.as_deref(), Some("Tunis, Tunisia"));
    }

    #[test]
    fn test_parses_sections() {
        let parsed = parse_resume_text(SAMPLE);
        assert_eq!(parsed.experience.len(), 2);
        assert!(parsed.experience[0].starts_with("Senior Backend Engineer"));
        assert_eq!(parsed.education.len(), 1);
        assert!(parsed.summary.unwrap().contains("Backend engineer"));
    }

    #[test]
    fn test_skills_are_canonical() {
        let parsed = parse_resume_text(SAMPLE);
        for skill in ["python", "django", "postgresql", "docker", "kubernetes", "rest api"] {
            assert!(parsed.skills.contains(&skill.to_string()), "missing {skill}");
        }
    }

    #[test]
    fn test_explicit_years_win_over_ranges() {
        let parsed = parse_resume_text(SAMPLE);
        assert_eq!(parsed.years_experience, Some(6.0));
    }

    #[test]
    fn test_years_from_ranges_when_not_stated() {
        let text = "Experience\nAnalyst, Foo (2015 - 2018)\nLead, Bar (2018 to 2021)";
        assert_eq!(parse_resume_text(text).years_experience, Some(6.0));
    }

    #[test]
    fn test_present_range_uses_current_year() {
        let start = Utc::now().year() - 3;
        let text = format!("Experience\nEngineer ({start} - Present)");
        assert_eq!(parse_resume_text(&text).years_experience, Some(3.0));
    }

    #[test]
    fn test_education_by_keyword_outside_section() {
        let text = "Jane Doe\nMSc in Data Science, 2019\nLikes hiking";
        let parsed = parse_resume_text(text);
        assert_eq!(parsed.education, vec!["MSc in Data Science, 2019".to_string()]);
    }

    #[test]
    fn test_empty_text_yields_default() {
        assert_eq!(parse_resume_text(""), ParsedResume::default());
    }

    #[test]
    fn test_year_range_is_not_a_phone() {
        assert_eq!(extract_phone("Worked 2016-2020 at Globex"), None);
    }
}
