//! Rule-based interview answer scorer and session summariser.
//!
//! overall = 0.20 × length + 0.25 × structure + 0.35 × relevance + 0.20 × specificity
//!           − filler penalty, on a 0–10 scale.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::interview::questions::{Question, QuestionCategory};

const W_LENGTH: f64 = 0.20;
const W_STRUCTURE: f64 = 0.25;
const W_RELEVANCE: f64 = 0.35;
const W_SPECIFICITY: f64 = 0.20;
const MAX_FILLER_PENALTY: f64 = 2.0;

const STAR_MARKERS: [&[&str]; 4] = [
    // situation
    &["situation", "when i was", "at my previous", "at my last", "context", "background", "we were"],
    // task
    &["task", "goal", "responsible for", "needed to", "challenge", "objective", "my role"],
    // action
    &["i decided", "i implemented", "i led", "i built", "i created", "i organized", "i proposed", "i took", "i worked", "action"],
    // result
    &["result", "outcome", "as a result", "achieved", "improved", "reduced", "increased", "learned", "impact"],
];

const EXPLANATION_MARKERS: [&[&str]; 4] = [
    // definition
    &["is a", "refers to", "means", "defined as", "is when"],
    // reasoning
    &["because", "therefore", "so that", "which means", "since", "in order to"],
    // example
    &["for example", "for instance", "such as", "e.g", "in my project", "i used"],
    // trade-offs
    &["trade-off", "tradeoff", "however", "on the other hand", "drawback", "downside", "advantage", "whereas"],
];

const OUTCOME_WORDS: &[&str] = &[
    "increased", "reduced", "decreased", "improved", "saved", "delivered", "launched", "grew",
    "cut", "shipped", "achieved", "doubled",
];

const FILLERS: &[&str] = &["um", "uh", "like", "you know", "basically", "kind of", "sort of", "i mean"];

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerScore {
    pub overall: f64, // 0 – 10
    pub length: f64,
    pub structure: f64,
    pub relevance: f64,
    pub specificity: f64,
    pub filler_penalty: f64,
    pub word_count: usize,
    pub matched_keywords: Vec<String>,
    pub strengths: Vec<String>,
    pub improvements: Vec<String>,
}

fn round1(x: f64) -> f64 {
    if !x.is_finite() {
        return 0.0;
    }
    (x * 10.0).round() / 10.0
}

fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !(c.is_alphanumeric() || c == '\'' || c == '%' || c == '.'))
        .map(|w| w.trim_matches('.').to_lowercase())
        .filter(|w| !w.is_empty())
        .collect()
}

/// Occurrences of a (possibly multi-word) phrase on word boundaries.
fn count_phrase(tokens: &[String], phrase: &str) -> usize {
    let parts: Vec<&str> = phrase.split_whitespace().collect();
    if parts.is_empty() || parts.len() > tokens.len() {
        return 0;
    }
    tokens
        .windows(parts.len())
        .filter(|w| w.iter().zip(&parts).all(|(a, b)| a == b))
        .count()
}

fn contains_phrase(tokens: &[String], phrase: &str) -> bool {
    count_phrase(tokens, phrase) > 0
}

/// 0 for no words; ramps to 10 at 50 words; 10 through 250; eases to 8 at 400;
/// drops faster beyond, never under 4.
pub fn length_score(word_count: usize) -> f64 {
    let w = word_count as f64;
    match word_count {
        0 => 0.0,
        1..=19 => w / 20.0 * 4.0,
        20..=49 => 4.0 + (w - 20.0) / 30.0 * 6.0,
        50..=250 => 10.0,
        251..=400 => 10.0 - (w - 250.0) / 150.0 * 2.0,
        _ => (8.0 - (w - 400.0) / 100.0 * 2.0).max(4.0),
    }
}

fn structure_score(tokens: &[String], category: QuestionCategory) -> (f64, usize) {
    let groups: &[&[&str]; 4] = match category {
        QuestionCategory::Technical => &EXPLANATION_MARKERS,
        QuestionCategory::Behavioral | QuestionCategory::Situational => &STAR_MARKERS,
    };
    let hit = groups
        .iter()
        .filter(|markers| markers.iter().any(|m| contains_phrase(tokens, m)))
        .count();
    (hit as f64 / groups.len() as f64 * 10.0, hit)
}

fn relevance_score(tokens: &[String], expected: &[String]) -> (f64, Vec<String>) {
    if expected.is_empty() {
        return (5.0, vec![]);
    }
    let matched: Vec<String> = expected
        .iter()
        .filter(|k| {
            let k = k.to_lowercase();
            // Stems like "prioritize" also match "prioritized" / "prioritizing".
            contains_phrase(tokens, &k)
                || (!k.contains(' ') && tokens.iter().any(|t| t.starts_with(k.as_str())))
        })
        .cloned()
        .collect();
    (matched.len() as f64 / expected.len() as f64 * 10.0, matched)
}

fn specificity_score(tokens: &[String]) -> f64 {
    let numbers = tokens
        .iter()
        .filter(|t| t.chars().any(|c| c.is_ascii_digit()))
        .count();
    let percentages = tokens.iter().filter(|t| t.ends_with('%')).count()
        + count_phrase(tokens, "percent");
    let outcomes = tokens
        .iter()
        .filter(|t| OUTCOME_WORDS.contains(&t.as_str()))
        .count();
    let score = 3.0 * numbers.min(2) as f64
        + 1.0 * percentages.min(1) as f64
        + 1.5 * outcomes.min(2) as f64;
    score.min(10.0)
}

fn filler_penalty(tokens: &[String]) -> (f64, usize) {
    let fillers: usize = FILLERS.iter().map(|f| count_phrase(tokens, f)).sum();
    ((fillers as f64 * 0.25).min(MAX_FILLER_PENALTY), fillers)
}

pub fn score_answer(question: &Question, answer: &str) -> AnswerScore {
    let tokens = words(answer);
    if tokens.is_empty() {
        return AnswerScore {
            overall: 0.0,
            length: 0.0,
            structure: 0.0,
            relevance: 0.0,
            specificity: 0.0,
            filler_penalty: 0.0,
            word_count: 0,
            matched_keywords: vec![],
            strengths: vec![],
            improvements: vec!["Provide an answer to the question".to_string()],
        };
    }

    let word_count = tokens.len();
    let length = length_score(word_count);
    let (structure, groups_hit) = structure_score(&tokens, question.category);
    let (relevance, matched_keywords) = relevance_score(&tokens, &question.expected_keywords);
    let specificity = specificity_score(&tokens);
    let (penalty, filler_count) = filler_penalty(&tokens);

    let raw = W_LENGTH * length
        + W_STRUCTURE * structure
        + W_RELEVANCE * relevance
        + W_SPECIFICITY * specificity
        - penalty;
    let overall = round1(raw.clamp(0.0, 10.0));

    let mut strengths = Vec::new();
    let mut improvements = Vec::new();

    match word_count {
        0..=19 => improvements.push("Expand your answer; aim for at least 50 words".to_string()),
        50..=250 => strengths.push("Answer length is well judged".to_string()),
        401.. => improvements.push("Tighten your answer; it runs long".to_string()),
        _ => {}
    }

    let is_technical = question.category == QuestionCategory::Technical;
    if groups_hit >= 3 {
        strengths.push(if is_technical {
            "Clear explanation with reasoning and examples".to_string()
        } else {
            "Well structured using the STAR method".to_string()
        });
    } else {
        improvements.push(if is_technical {
            "Explain the concept, why it matters, an example, and its trade-offs".to_string()
        } else {
            "Structure your answer as Situation, Task, Action, Result".to_string()
        });
    }

    if relevance >= 6.0 {
        strengths.push("Covers the key points the question is looking for".to_string());
    } else {
        let missing: Vec<&str> = question
            .expected_keywords
            .iter()
            .filter(|k| !matched_keywords.contains(k))
            .take(3)
            .map(String::as_str)
            .collect();
        if !missing.is_empty() {
            improvements.push(format!("Address points such as: {}", missing.join(", ")));
        }
    }

    if specificity >= 6.0 {
        strengths.push("Concrete, quantified details".to_string());
    } else {
        improvements.push("Add numbers or measurable outcomes".to_string());
    }

    if filler_count >= 3 {
        improvements.push("Reduce filler words".to_string());
    }

    AnswerScore {
        overall,
        length: round1(length),
        structure: round1(structure),
        relevance: round1(relevance),
        specificity: round1(specificity),
        filler_penalty: round1(penalty),
        word_count,
        matched_keywords,
        strengths,
        improvements,
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Session summary
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Readiness {
    #[serde(rename = "Ready")]
    Ready,
    #[serde(rename = "Almost Ready")]
    AlmostReady,
    #[serde(rename = "Needs Practice")]
    NeedsPractice,
}

impl Readiness {
    pub fn from_score(score: f64) -> Self {
        match score {
            s if s >= 7.5 => Self::Ready,
            s if s >= 5.5 => Self::AlmostReady,
            _ => Self::NeedsPractice,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSummary {
    pub total_questions: usize,
    pub answered: usize,
    pub average_score: f64,
    pub category_scores: BTreeMap<QuestionCategory, f64>,
    pub readiness: Readiness,
    pub top_strengths: Vec<String>,
    pub focus_areas: Vec<String>,
}

/// Most frequent entries first; ties keep first-seen order.
fn most_common(items: impl Iterator<Item = String>, limit: usize) -> Vec<String> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for item in items {
        match counts.iter_mut().find(|(existing, _)| *existing == item) {
            Some((_, n)) => *n += 1,
            None => counts.push((item, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts.into_iter().take(limit).map(|(s, _)| s).collect()
}

/// Summarises a session. Unanswered questions count as 0.
pub fn summarize(questions: &[Question], answers: &[(String, AnswerScore)]) -> SessionSummary {
    let score_for = |id: &str| {
        answers
            .iter()
            .find(|(qid, _)| qid == id)
            .map(|(_, s)| s.overall)
            .unwrap_or(0.0)
    };

    let mut per_category: BTreeMap<QuestionCategory, (f64, usize)> = BTreeMap::new();
    let mut total = 0.0;
    for q in questions {
        let score = score_for(&q.id);
        total += score;
        let entry = per_category.entry(q.category).or_insert((0.0, 0));
        entry.0 += score;
        entry.1 += 1;
    }

    let average_score = if questions.is_empty() {
        0.0
    } else {
        round1(total / questions.len() as f64)
    };

    SessionSummary {
        total_questions: questions.len(),
        answered: answers
            .iter()
            .filter(|(qid, _)| questions.iter().any(|q| &q.id == qid))
            .count(),
        average_score,
        category_scores: per_category
            .into_iter()
            .map(|(cat, (sum, n))| (cat, round1(sum / n as f64)))
            .collect(),
        readiness: Readiness::from_score(average_score),
        top_strengths: most_common(answers.iter().flat_map(|(_, s)| s.strengths.clone()), 3),
        focus_areas: most_common(answers.iter().flat_map(|(_, s)| s.improvements.clone()), 3),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::interview::questions::Difficulty;

    fn question(category: QuestionCategory, keywords: &[&str]) -> Question {
        Question {
            id: "q1".to_string(),
            category,
            prompt: "Prompt".to_string(),
            expected_keywords: keywords.iter().map(|k| k.to_string()).collect(),
            difficulty: Difficulty::Medium,
        }
    }

    const STAR_ANSWER: &str = "At my previous job we were missing deadlines. My role was to \
        fix the release process and the goal was weekly releases. I decided to automate the \
        pipeline and I led a small team to build it. As a result we reduced release time by 60% \
        and shipped 12 releases in 3 months. I learned how much communication with stakeholders \
        matters when priorities change.";

    #[test]
    fn test_empty_answer_scores_zero() {
        let score = score_answer(&question(QuestionCategory::Behavioral, &["team"]), "   ");
        assert_eq!(score.overall, 0.0);
        assert_eq!(score.word_count, 0);
        assert!(!score.improvements.is_empty());
    }

    #[test]
    fn test_length_curve() {
        assert_eq!(length_score(0), 0.0);
        assert_eq!(length_score(10), 2.0);
        assert_eq!(length_score(20), 4.0);
        assert_eq!(length_score(50), 10.0);
        assert_eq!(length_score(250), 10.0);
        assert_eq!(length_score(400), 8.0);
        assert_eq!(length_score(500), 6.0);
        assert_eq!(length_score(2000), 4.0);
    }

    #[test]
    fn test_star_answer_scores_well() {
        let q = question(
            QuestionCategory::Behavioral,
            &["deadline", "team", "communication", "stakeholders"],
        );
        let score = score_answer(&q, STAR_ANSWER);
        assert_eq!(score.structure, 10.0);
        assert_eq!(score.relevance, 10.0);
        assert_eq!(score.specificity, 10.0);
        assert!(score.overall >= 7.5, "overall was {}", score.overall);
        assert!(score.strengths.iter().any(|s| s.contains("STAR")));
    }

    #[test]
    fn test_vague_answer_scores_low() {
        let q = question(QuestionCategory::Behavioral, &["deadline", "team"]);
        let score = score_answer(&q, "Um, I basically just, like, worked hard I guess.");
        assert!(score.overall < 3.0, "overall was {}", score.overall);
        assert!(score.filler_penalty > 0.0);
        assert!(score.improvements.iter().any(|s| s.contains("STAR")));
    }

    #[test]
    fn test_technical_uses_explanation_markers() {
        let q = question(QuestionCategory::Technical, &["index", "query"]);
        let answer = "An index is a data structure that speeds up a query because the database \
            can avoid a full scan. For example, I used a composite index on user_id. However, \
            every write must update it.";
        let score = score_answer(&q, answer);
        assert_eq!(score.structure, 10.0);
        assert_eq!(score.matched_keywords, vec!["index", "query"]);
    }

    #[test]
    fn test_filler_words_are_whole_words() {
        let tokens = words("I likely liked it, like, you know");
        assert_eq!(count_phrase(&tokens, "like"), 1);
        assert_eq!(count_phrase(&tokens, "you know"), 1);
    }

    #[test]
    fn test_keyword_stems_match() {
        let q = question(QuestionCategory::Situational, &["prioritize"]);
        let score = score_answer(&q, "I prioritized the outage fix.");
        assert_eq!(score.matched_keywords, vec!["prioritize"]);
    }

    #[test]
    fn test_readiness_thresholds() {
        assert_eq!(Readiness::from_score(7.5), Readiness::Ready);
        assert_eq!(Readiness::from_score(7.4), Readiness::AlmostReady);
        assert_eq!(Readiness::from_score(5.5), Readiness::AlmostReady);
        assert_eq!(Readiness::from_score(5.4), Readiness::NeedsPractice);
        assert_eq!(
            serde_json::to_value(Readiness::AlmostReady).unwrap(),
            serde_json::json!("Almost Ready")
        );
    }

    #[test]
    fn test_summarize_counts_unanswered_as_zero() {
        let mut q1 = question(QuestionCategory::Technical, &[]);
        q1.id = "a".to_string();
        let mut q2 = question(QuestionCategory::Behavioral, &[]);
        q2.id = "b".to_string();

        let mut scored = score_answer(&q1, "x");
        scored.overall = 8.0;
        let summary = summarize(&[q1, q2], &[("a".to_string(), scored)]);

        assert_eq!(summary.answered, 1);
        assert_eq!(summary.average_score, 4.0);
        assert_eq!(summary.category_scores[&QuestionCategory::Technical], 8.0);
        assert_eq!(summary.category_scores[&QuestionCategory::Behavioral], 0.0);
        assert_eq!(summary.readiness, Readiness::NeedsPractice);
    }

    #[test]
    fn test_summarize_empty_session() {
        let summary = summarize(&[], &[]);
        assert_eq!(summary.average_score, 0.0);
        assert!(summary.category_scores.is_empty());
    }
}
