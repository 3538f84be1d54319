//! Canonical skill vocabulary shared by resume parsing, job normalisation and matching.

use std::collections::{HashMap, HashSet};

use once_cell::sync::Lazy;

/// (canonical name, aliases). Ambiguous short tokens ("go", "c", "r") are
/// deliberately absent: they produce too many false positives in prose.
const VOCABULARY: &[(&str, &[&str])] = &[
    // Languages
    ("python", &["python3"]),
    ("javascript", &["js", "ecmascript"]),
    ("typescript", &[]),
    ("java", &[]),
    ("c++", &["cpp"]),
    ("c#", &["csharp"]),
    ("golang", &[]),
    ("rust", &[]),
    ("ruby", &[]),
    ("php", &[]),
    ("swift", &[]),
    ("kotlin", &[]),
    ("scala", &[]),
    ("sql", &[]),
    ("html", &["html5"]),
    ("css", &["css3"]),
    ("bash", &["shell scripting"]),
    // Frameworks & libraries
    ("react", &["reactjs", "react.js"]),
    ("react native", &[]),
    ("angular", &["angularjs"]),
    ("vue", &["vuejs", "vue.js"]),
    ("node.js", &["nodejs", "node"]),
    ("express.js", &["expressjs"]),
    ("next.js", &["nextjs"]),
    ("django", &[]),
    ("flask", &[]),
    ("fastapi", &[]),
    ("spring boot", &["springboot"]),
    ("ruby on rails", &["rails"]),
    ("laravel", &[]),
    (".net", &["dotnet", "asp.net"]),
    ("tensorflow", &[]),
    ("pytorch", &[]),
    ("scikit-learn", &["sklearn"]),
    ("pandas", &[]),
    ("numpy", &[]),
    ("apache spark", &["spark", "pyspark"]),
    ("hadoop", &[]),
    ("kafka", &["apache kafka"]),
    ("graphql", &[]),
    ("rest api", &["restful", "rest apis", "restful apis"]),
    ("microservices", &["microservice"]),
    // Tools & platforms
    ("docker", &[]),
    ("kubernetes", &["k8s"]),
    ("terraform", &[]),
    ("ansible", &[]),
    ("jenkins", &[]),
    ("git", &[]),
    ("github actions", &[]),
    ("aws", &["amazon web services"]),
    ("azure", &["microsoft azure"]),
    ("gcp", &["google cloud", "google cloud platform"]),
    ("linux", &[]),
    ("postgresql", &["postgres"]),
    ("mysql", &[]),
    ("mongodb", &["mongo"]),
    ("redis", &[]),
    ("elasticsearch", &[]),
    ("ci/cd", &["cicd", "continuous integration"]),
    ("airflow", &["apache airflow"]),
    ("tableau", &[]),
    ("power bi", &["powerbi"]),
    ("excel", &["microsoft excel"]),
    ("figma", &[]),
    ("jira", &[]),
    // Practices & domains
    ("machine learning", &["ml"]),
    ("deep learning", &[]),
    ("nlp", &["natural language processing"]),
    ("computer vision", &[]),
    ("data analysis", &["data analytics"]),
    ("data science", &[]),
    ("agile", &["scrum", "kanban"]),
    ("devops", &[]),
    ("communication", &["communication skills"]),
    ("leadership", &[]),
    ("project management", &[]),
    ("problem solving", &["problem-solving"]),
];

/// Every matchable surface form mapped to its canonical skill.
static SURFACE_FORMS: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut forms = HashMap::new();
    for (canonical, aliases) in VOCABULARY {
        forms.insert(*canonical, *canonical);
        for alias in *aliases {
            forms.insert(*alias, *canonical);
        }
    }
    forms
});

/// Lowercases, trims and collapses whitespace, then resolves known aliases.
/// Unknown skills are returned in their cleaned form.
pub fn normalize_skill(raw: &str) -> String {
    let cleaned = collapse_whitespace(&raw.to_lowercase());
    match SURFACE_FORMS.get(cleaned.as_str()) {
        Some(canonical) => canonical.to_string(),
        None => cleaned,
    }
}

/// Normalises a list of skills, dropping empties and duplicates while keeping order.
pub fn normalize_skills<S: AsRef<str>>(raw: &[S]) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.iter()
        .map(|s| normalize_skill(s.as_ref()))
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.clone()))
        .collect()
}

/// Finds vocabulary skills mentioned in free text.
///
/// Matches respect word boundaries, so "java" does not fire inside "javascript"
/// and "c++" does not fire inside "c++11". A leading dot also blocks a match,
/// so "js" is not read out of "node.js". Results are canonical names in
/// first-occurrence order.
pub fn extract_skills(text: &str) -> Vec<String> {
    let haystack = collapse_whitespace(&text.to_lowercase());
    let mut first_seen: HashMap<&'static str, usize> = HashMap::new();

    for (form, canonical) in SURFACE_FORMS.iter() {
        if let Some(pos) = find_bounded(&haystack, form) {
            first_seen
                .entry(*canonical)
                .and_modify(|p| *p = (*p).min(pos))
                .or_insert(pos);
        }
    }

    let mut found: Vec<(&'static str, usize)> = first_seen.into_iter().collect();
    found.sort_by(|a, b| a.1.cmp(&b.1).then_with(|| a.0.cmp(b.0)));
    found.into_iter().map(|(s, _)| s.to_string()).collect()
}

/// Position of the first occurrence of `needle` that is not glued to
/// neighbouring word characters.
fn find_bounded(haystack: &str, needle: &str) -> Option<usize> {
    haystack.match_indices(needle).map(|(i, _)| i).find(|&i| {
        let before = haystack[..i].chars().next_back();
        let after = haystack[i + needle.len()..].chars().next();
        let before_ok = before.map_or(true, |c| !is_word_char(c) && c != '.');
        let after_ok = after.map_or(true, |c| !is_word_char(c) && c != '+' && c != '#');
        before_ok && after_ok
    })
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_resolves_aliases() {
        assert_eq!(normalize_skill("  JS "), "javascript");
        assert_eq!(normalize_skill("K8s"), "kubernetes");
        assert_eq!(normalize_skill("Postgres"), "postgresql");
        assert_eq!(normalize_skill("Google   Cloud"), "gcp");
    }

    #[test]
    fn test_normalize_keeps_unknown_skill() {
        assert_eq!(normalize_skill("  Quantum Basket Weaving "), "quantum basket weaving");
    }

    #[test]
    fn test_normalize_skills_dedups() {
        let skills = normalize_skills(&["React", "reactjs", "", "Docker"]);
        assert_eq!(skills, vec!["react", "docker"]);
    }

    #[test]
    fn test_extract_respects_word_boundaries() {
        let skills = extract_skills("Strong JavaScript background");
        assert!(skills.contains(&"javascript".to_string()));
        assert!(!skills.contains(&"java".to_string()));
    }

    #[test]
    fn test_extract_symbols() {
        let skills = extract_skills("Built services in C++ and C#, frontends in Node.js.");
        assert_eq!(skills, vec!["c++", "c#", "node.js"]);
    }

    #[test]
    fn test_extract_first_occurrence_order_and_dedup() {
        let skills = extract_skills("Docker, Python, docker again, and k8s with Python");
        assert_eq!(skills, vec!["docker", "python", "kubernetes"]);
    }

    #[test]
    fn test_extract_multi_word_across_line_breaks() {
        let skills = extract_skills("Experience with machine\n   learning pipelines");
        assert_eq!(skills, vec!["machine learning"]);
    }

    #[test]
    fn test_extract_empty_text() {
        assert!(extract_skills("").is_empty());
    }
}
