//! Interview question bank and deterministic per-session selection.

use serde::{Deserialize, Serialize};

use crate::jobs::matcher::ExperienceLevel;

pub const MIN_QUESTIONS: usize = 1;
pub const MAX_QUESTIONS: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionCategory {
    Behavioral,
    Technical,
    Situational,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub category: QuestionCategory,
    pub prompt: String,
    pub expected_keywords: Vec<String>,
    pub difficulty: Difficulty,
}

struct Template {
    id: &'static str,
    category: QuestionCategory,
    prompt: &'static str,
    keywords: &'static [&'static str],
    difficulty: Difficulty,
}

const fn t(
    id: &'static str,
    category: QuestionCategory,
    difficulty: Difficulty,
    prompt: &'static str,
    keywords: &'static [&'static str],
) -> Template {
    Template {
        id,
        category,
        prompt,
        keywords,
        difficulty,
    }
}

use Difficulty::{Easy, Hard, Medium};
use QuestionCategory::{Behavioral, Situational, Technical};

const BEHAVIORAL: &[Template] = &[
    t("beh-01", Behavioral, Easy, "Tell me about yourself and what drew you to {role} work.",
      &["experience", "project", "team", "goal", "skills"]),
    t("beh-02", Behavioral, Medium, "Describe a time you disagreed with a teammate. How did you resolve it?",
      &["listen", "compromise", "data", "resolved", "communication"]),
    t("beh-03", Behavioral, Medium, "Tell me about a project that failed or slipped. What did you learn?",
      &["mistake", "learned", "deadline", "changed", "responsibility"]),
    t("beh-04", Behavioral, Hard, "Describe a time you led a team through a difficult change.",
      &["led", "stakeholders", "plan", "motivate", "outcome"]),
    t("beh-05", Behavioral, Easy, "What accomplishment are you most proud of, and why?",
      &["impact", "result", "challenge", "team", "proud"]),
    t("beh-06", Behavioral, Medium, "Tell me about a time you had to learn something new very quickly.",
      &["learn", "documentation", "practice", "deadline", "applied"]),
];

const SITUATIONAL: &[Template] = &[
    t("sit-01", Situational, Medium, "A critical production issue appears an hour before a release. What do you do?",
      &["prioritize", "rollback", "communicate", "root cause", "stakeholders"]),
    t("sit-02", Situational, Easy, "You receive unclear requirements for a task. How do you proceed?",
      &["clarify", "questions", "assumptions", "document", "stakeholders"]),
    t("sit-03", Situational, Medium, "Your manager asks you to deliver two urgent tasks by the same deadline. How do you handle it?",
      &["prioritize", "communicate", "impact", "negotiate", "deadline"]),
    t("sit-04", Situational, Hard, "A senior colleague keeps rejecting your proposals without explanation. What do you do?",
      &["feedback", "private", "understand", "evidence", "escalate"]),
    t("sit-05", Situational, Medium, "You discover a teammate's code introduced a security flaw. How do you respond?",
      &["report", "fix", "respect", "review", "process"]),
];

const TECH_GENERAL: &[Template] = &[
    t("tech-gen-01", Technical, Easy, "Walk me through how you debug a problem in an unfamiliar {role} codebase.",
      &["reproduce", "logs", "isolate", "hypothesis", "test"]),
    t("tech-gen-02", Technical, Medium, "How do you decide when code is ready to ship as a {role}?",
      &["tests", "review", "requirements", "monitoring", "edge cases"]),
    t("tech-gen-03", Technical, Medium, "Explain version control branching strategies you have used and their trade-offs.",
      &["branch", "merge", "conflict", "release", "rebase"]),
    t("tech-gen-04", Technical, Hard, "How would you approach improving the performance of a slow system?",
      &["measure", "profile", "bottleneck", "cache", "benchmark"]),
];

const TECH_BACKEND: &[Template] = &[
    t("tech-be-01", Technical, Medium, "How would you design a REST API for a job board?",
      &["resource", "endpoint", "status code", "pagination", "authentication"]),
    t("tech-be-02", Technical, Medium, "Explain database indexing and when an index hurts performance.",
      &["index", "query", "write", "b-tree", "scan"]),
    t("tech-be-03", Technical, Hard, "How do you keep data consistent across services when a request fails halfway?",
      &["transaction", "idempotent", "retry", "rollback", "saga"]),
    t("tech-be-04", Technical, Easy, "What is the difference between authentication and authorization?",
      &["identity", "permission", "token", "role", "verify"]),
];

const TECH_FRONTEND: &[Template] = &[
    t("tech-fe-01", Technical, Medium, "How does the browser render a page, and how do you keep it fast?",
      &["dom", "layout", "paint", "bundle", "lazy"]),
    t("tech-fe-02", Technical, Medium, "How do you manage state in a large single-page application?",
      &["state", "component", "store", "props", "context"]),
    t("tech-fe-03", Technical, Easy, "How do you make a web page accessible?",
      &["semantic", "aria", "keyboard", "contrast", "screen reader"]),
    t("tech-fe-04", Technical, Hard, "Explain how you would debug a memory leak in a web application.",
      &["profiler", "heap", "listener", "reference", "snapshot"]),
];

const TECH_DATA: &[Template] = &[
    t("tech-data-01", Technical, Medium, "How do you handle missing or inconsistent data in a dataset?",
      &["missing", "impute", "outlier", "validate", "distribution"]),
    t("tech-data-02", Technical, Medium, "Explain overfitting and how you prevent it.",
      &["overfitting", "validation", "regularization", "cross-validation", "generalize"]),
    t("tech-data-03", Technical, Easy, "What is the difference between a left join and an inner join?",
      &["join", "rows", "null", "match", "table"]),
    t("tech-data-04", Technical, Hard, "How would you evaluate a model that will be used on imbalanced data?",
      &["precision", "recall", "imbalanced", "threshold", "metric"]),
];

const TECH_DEVOPS: &[Template] = &[
    t("tech-ops-01", Technical, Medium, "Describe a CI/CD pipeline you would set up for a new service.",
      &["build", "test", "deploy", "pipeline", "rollback"]),
    t("tech-ops-02", Technical, Medium, "How do containers differ from virtual machines?",
      &["container", "kernel", "image", "isolation", "overhead"]),
    t("tech-ops-03", Technical, Hard, "How would you design monitoring and alerting for a critical service?",
      &["metrics", "logs", "alert", "threshold", "on-call"]),
    t("tech-ops-04", Technical, Easy, "What is infrastructure as code and why is it useful?",
      &["terraform", "reproducible", "version", "declarative", "review"]),
];

const TECH_MOBILE: &[Template] = &[
    t("tech-mob-01", Technical, Medium, "How do you handle offline support in a mobile app?",
      &["cache", "sync", "conflict", "storage", "network"]),
    t("tech-mob-02", Technical, Medium, "Explain the lifecycle of a mobile screen or activity.",
      &["lifecycle", "state", "background", "resume", "memory"]),
    t("tech-mob-03", Technical, Easy, "How do you keep a mobile UI responsive?",
      &["main thread", "async", "background", "render", "profile"]),
    t("tech-mob-04", Technical, Hard, "How would you reduce the crash rate of a large mobile app?",
      &["crash", "reporting", "reproduce", "release", "monitoring"]),
];

/// Picks the technical track whose vocabulary the role mentions.
fn technical_track(role: &str) -> &'static [Template] {
    let lower = role.to_lowercase();
    let mentions = |words: &[&str]| words.iter().any(|w| lower.contains(w));

    if mentions(&["frontend", "front-end", "front end", "react", "angular", "vue", "ui "]) {
        TECH_FRONTEND
    } else if mentions(&["data", "machine learning", "ml ", "analyst", "scientist", "ai "]) {
        TECH_DATA
    } else if mentions(&["devops", "sre", "cloud", "infrastructure", "platform", "reliability"]) {
        TECH_DEVOPS
    } else if mentions(&["mobile", "android", "ios", "flutter", "react native"]) {
        TECH_MOBILE
    } else if mentions(&["backend", "back-end", "back end", "api", "server", "full stack", "fullstack"]) {
        TECH_BACKEND
    } else {
        &[]
    }
}

fn allowed_difficulties(level: ExperienceLevel) -> &'static [Difficulty] {
    match level {
        ExperienceLevel::Entry => &[Easy, Medium],
        ExperienceLevel::Mid => &[Easy, Medium, Hard],
        ExperienceLevel::Senior | ExperienceLevel::Lead => &[Medium, Hard],
    }
}

fn instantiate(template: &Template, role: &str) -> Question {
    Question {
        id: template.id.to_string(),
        category: template.category,
        prompt: template.prompt.replace("{role}", role),
        expected_keywords: template.keywords.iter().map(|k| k.to_string()).collect(),
        difficulty: template.difficulty,
    }
}

/// splitmix64 finaliser.
fn mix(mut x: u64) -> u64 {
    x = x.wrapping_add(0x9E37_79B9_7F4A_7C15);
    x = (x ^ (x >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    x = (x ^ (x >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    x ^ (x >> 31)
}

/// FNV-1a, stable across builds and platforms.
fn stable_hash(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |h, b| {
        (h ^ u64::from(b)).wrapping_mul(0x0000_0100_0000_01B3)
    })
}

/// Orders templates by a seeded key: same seed, same order.
fn shuffled<'a>(pool: impl Iterator<Item = &'a Template>, seed: u64) -> Vec<&'a Template> {
    let mut items: Vec<&Template> = pool.collect();
    items.sort_by_key(|t| (mix(seed ^ stable_hash(t.id)), t.id));
    items
}

/// Deterministically selects `count` questions for `role` at `level`.
///
/// Categories interleave as technical, behavioral, technical, situational. When a
/// category runs dry the remaining slots are filled from whatever is left.
/// `count` is clamped to `MIN_QUESTIONS..=MAX_QUESTIONS`.
pub fn select_questions(role: &str, level: ExperienceLevel, count: usize, seed: u64) -> Vec<Question> {
    let count = count.clamp(MIN_QUESTIONS, MAX_QUESTIONS);
    let allowed = allowed_difficulties(level);
    let by_level = |pool: &'static [Template]| {
        pool.iter().filter(move |t| allowed.contains(&t.difficulty))
    };

    let technical_pool = technical_track(role).iter().chain(TECH_GENERAL);
    let mut technical = shuffled(
        technical_pool.filter(|t| allowed.contains(&t.difficulty)),
        seed,
    );
    let mut behavioral = shuffled(by_level(BEHAVIORAL), seed.rotate_left(17));
    let mut situational = shuffled(by_level(SITUATIONAL), seed.rotate_left(41));
    // Consume from the front.
    technical.reverse();
    behavioral.reverse();
    situational.reverse();

    const PATTERN: [QuestionCategory; 4] = [Technical, Behavioral, Technical, Situational];
    let mut picked: Vec<&Template> = Vec::with_capacity(count);

    let mut slot = 0usize;
    while picked.len() < count {
        if technical.is_empty() && behavioral.is_empty() && situational.is_empty() {
            break;
        }
        let preferred = PATTERN[slot % PATTERN.len()];
        slot += 1;

        let order: [&mut Vec<&Template>; 3] = match preferred {
            Technical => [&mut technical, &mut behavioral, &mut situational],
            Behavioral => [&mut behavioral, &mut situational, &mut technical],
            Situational => [&mut situational, &mut behavioral, &mut technical],
        };
        if let Some(next) = order.into_iter().find_map(|pool| pool.pop()) {
            picked.push(next);
        }
    }

    picked.into_iter().map(|t| instantiate(t, role)).collect()
}

/// Derives a selection seed from a session id.
pub fn seed_from_id(id: uuid::Uuid) -> u64 {
    let bits = id.as_u128();
    (bits as u64) ^ ((bits >> 64) as u64)
}
