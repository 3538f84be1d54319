//! Job search: filter parsing, parameterised SQL generation and pagination.
//!
//! All user input reaches Postgres through `push_bind`; the SQL text only ever
//! contains column names and placeholders.

use serde::{Deserialize, Serialize};
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use crate::jobs::matcher::ExperienceLevel;
use crate::models::job::JobRow;
use crate::skills::normalize_skill;

pub const DEFAULT_PER_PAGE: u32 = 20;
pub const MAX_PER_PAGE: u32 = 100;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobSort {
    #[default]
    Recent,
    Salary,
    Title,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobFilters {
    pub q: Option<String>,
    pub location: Option<String>,
    pub job_type: Option<String>,
    pub experience_level: Option<String>,
    pub remote: Option<bool>,
    pub min_salary: Option<f64>,
    /// Comma-separated list, e.g. `rust,docker`.
    pub skills: Option<String>,
    pub company: Option<String>,
    pub source: Option<String>,
    pub posted_within_days: Option<u32>,
    pub sort: Option<JobSort>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u32,
    pub per_page: u32,
}

impl Pagination {
    pub fn from_filters(filters: &JobFilters) -> Self {
        Self {
            page: filters.page.unwrap_or(1).max(1),
            per_page: filters
                .per_page
                .unwrap_or(DEFAULT_PER_PAGE)
                .clamp(1, MAX_PER_PAGE),
        }
    }

    pub fn limit(&self) -> i64 {
        i64::from(self.per_page)
    }

    pub fn offset(&self) -> i64 {
        i64::from(self.page - 1) * i64::from(self.per_page)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub page: u32,
    pub per_page: u32,
    pub total: i64,
    pub total_pages: i64,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, total: i64, pagination: Pagination) -> Self {
        let per_page = i64::from(pagination.per_page);
        let total = total.max(0);
        let total_pages = (total + per_page - 1) / per_page;
        Self {
            items,
            page: pagination.page,
            per_page: pagination.per_page,
            total,
            total_pages,
            has_next: i64::from(pagination.page) < total_pages,
        }
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Escapes LIKE wildcards so user text matches literally.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

fn contains_pattern(raw: &str) -> String {
    format!("%{}%", escape_like(raw))
}

/// Parses the comma-separated `skills` filter into canonical skill names.
pub fn parse_skill_list(raw: &str) -> Vec<String> {
    let mut skills: Vec<String> = raw
        .split(',')
        .map(normalize_skill)
        .filter(|s| !s.is_empty())
        .collect();
    skills.dedup();
    skills
}

fn push_filters(builder: &mut QueryBuilder<'static, Postgres>, filters: &JobFilters) {
    builder.push(" WHERE TRUE");

    if let Some(q) = non_empty(&filters.q) {
        let pattern = contains_pattern(q);
        builder
            .push(" AND (title ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR company ILIKE ")
            .push_bind(pattern.clone())
            .push(" OR description ILIKE ")
            .push_bind(pattern)
            .push(")");
    }
    if let Some(location) = non_empty(&filters.location) {
        builder
            .push(" AND location ILIKE ")
            .push_bind(contains_pattern(location));
    }
    if let Some(job_type) = non_empty(&filters.job_type) {
        builder
            .push(" AND job_type = ")
            .push_bind(job_type.to_lowercase().replace([' ', '-'], "_"));
    }
    if let Some(level) = non_empty(&filters.experience_level) {
        let level = ExperienceLevel::parse(level)
            .map(|l| l.as_str().to_string())
            .unwrap_or_else(|| level.to_lowercase());
        builder.push(" AND experience_level = ").push_bind(level);
    }
    if let Some(remote) = filters.remote {
        builder.push(" AND is_remote = ").push_bind(remote);
    }
    if let Some(min_salary) = filters.min_salary.filter(|s| s.is_finite() && *s > 0.0) {
        builder
            .push(" AND COALESCE(salary_max, salary_min) >= ")
            .push_bind(min_salary);
    }
    if let Some(skills) = non_empty(&filters.skills).map(parse_skill_list) {
        if !skills.is_empty() {
            builder.push(" AND skills && ").push_bind(skills);
        }
    }
    if let Some(company) = non_empty(&filters.company) {
        builder
            .push(" AND company ILIKE ")
            .push_bind(contains_pattern(company));
    }
    if let Some(source) = non_empty(&filters.source) {
        builder.push(" AND source = ").push_bind(source.to_lowercase());
    }
    if let Some(days) = filters.posted_within_days {
        let days = days.clamp(1, 365) as i32;
        builder
            .push(" AND posted_at >= now() - make_interval(days => ")
            .push_bind(days)
            .push(")");
    }
}

fn order_clause(sort: JobSort) -> &'static str {
    match sort {
        JobSort::Recent => " ORDER BY posted_at DESC NULLS LAST, id ASC",
        JobSort::Salary => " ORDER BY salary_max DESC NULLS LAST, id ASC",
        JobSort::Title => " ORDER BY title ASC, id ASC",
    }
}

/// `SELECT * FROM jobs WHERE … ORDER BY … LIMIT … OFFSET …`
pub fn build_search_query(
    filters: &JobFilters,
    limit: i64,
    offset: i64,
) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT * FROM jobs");
    push_filters(&mut builder, filters);
    builder.push(order_clause(filters.sort.unwrap_or_default()));
    builder.push(" LIMIT ").push_bind(limit);
    builder.push(" OFFSET ").push_bind(offset);
    builder
}

pub fn build_count_query(filters: &JobFilters) -> QueryBuilder<'static, Postgres> {
    let mut builder = QueryBuilder::new("SELECT COUNT(*) FROM jobs");
    push_filters(&mut builder, filters);
    builder
}

/// Runs the filtered search and returns one page plus totals.
pub async fn search_jobs(pool: &PgPool, filters: &JobFilters) -> Result<Page<JobRow>, sqlx::Error> {
    let pagination = Pagination::from_filters(filters);

    let total: i64 = build_count_query(filters)
        .build_query_scalar()
        .fetch_one(pool)
        .await?;

    let items = build_search_query(filters, pagination.limit(), pagination.offset())
        .build_query_as::<JobRow>()
        .fetch_all(pool)
        .await?;

    Ok(Page::new(items, total, pagination))
}

/// Fetches up to `cap` filtered jobs (ignoring pagination) for in-memory ranking or aggregation.
pub async fn fetch_filtered(
    pool: &PgPool,
    filters: &JobFilters,
    cap: i64,
) -> Result<Vec<JobRow>, sqlx::Error> {
    build_search_query(filters, cap, 0)
        .build_query_as::<JobRow>()
        .fetch_all(pool)
        .await
}

pub async fn get_job(pool: &PgPool, id: Uuid) -> Result<Option<JobRow>, sqlx::Error> {
    sqlx::query_as::<_, JobRow>("SELECT * FROM jobs WHERE id = $1")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn delete_job(pool: &PgPool, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM jobs WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::Execute;

    fn sql_of(filters: &JobFilters) -> String {
        let mut builder = build_search_query(filters, 20, 0);
        builder.build().sql().to_string()
    }

    #[test]
    fn test_no_filters() {
        let sql = sql_of(&JobFilters::default());
        assert_eq!(
            sql,
            "SELECT * FROM jobs WHERE TRUE ORDER BY posted_at DESC NULLS LAST, id ASC LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_keyword_uses_placeholders_only() {
        let filters = JobFilters {
            q: Some("rust'; DROP TABLE jobs; --".to_string()),
            ..Default::default()
        };
        let sql = sql_of(&filters);
        assert!(sql.contains("(title ILIKE $1 OR company ILIKE $2 OR description ILIKE $3)"));
        assert!(!sql.contains("DROP TABLE"));
    }

    #[test]
    fn test_all_filters_numbered_in_order() {
        let filters = JobFilters {
            q: Some("engineer".into()),
            location: Some("Tunis".into()),
            job_type: Some("Full-time".into()),
            experience_level: Some("Sr".into()),
            remote: Some(true),
            min_salary: Some(50_000.0),
            skills: Some("Rust, k8s".into()),
            company: Some("Acme".into()),
            source: Some("SerpAPI".into()),
            posted_within_days: Some(7),
            sort: Some(JobSort::Salary),
            page: Some(2),
            per_page: Some(10),
        };
        let sql = sql_of(&filters);
        assert!(sql.contains("location ILIKE $4"));
        assert!(sql.contains("job_type = $5"));
        assert!(sql.contains("experience_level = $6"));
        assert!(sql.contains("is_remote = $7"));
        assert!(sql.contains("COALESCE(salary_max, salary_min) >= $8"));
        assert!(sql.contains("skills && $9"));
        assert!(sql.contains("company ILIKE $10"));
        assert!(sql.contains("source = $11"));
        assert!(sql.contains("make_interval(days => $12)"));
        assert!(sql.ends_with("ORDER BY salary_max DESC NULLS LAST, id ASC LIMIT $13 OFFSET $14"));
    }

    #[test]
    fn test_blank_filters_are_ignored() {
        let filters = JobFilters {
            q: Some("   ".into()),
            skills: Some(" , ".into()),
            ..Default::default()
        };
        let sql = sql_of(&filters);
        assert!(!sql.contains("ILIKE"));
        assert!(!sql.contains("skills &&"));
    }

    #[test]
    fn test_count_query_has_no_paging() {
        let mut builder = build_count_query(&JobFilters {
            remote: Some(false),
            ..Default::default()
        });
        let sql = builder.build().sql().to_string();
        assert_eq!(sql, "SELECT COUNT(*) FROM jobs WHERE TRUE AND is_remote = $1");
    }

    #[test]
    fn test_escape_like() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
    }

    #[test]
    fn test_parse_skill_list_normalizes() {
        assert_eq!(parse_skill_list("JS, k8s,,Rust"), vec!["javascript", "kubernetes", "rust"]);
    }

    #[test]
    fn test_pagination_clamps() {
        let p = Pagination::from_filters(&JobFilters {
            page: Some(0),
            per_page: Some(1000),
            ..Default::default()
        });
        assert_eq!(p, Pagination { page: 1, per_page: MAX_PER_PAGE });
        assert_eq!(p.offset(), 0);

        let p = Pagination::from_filters(&JobFilters {
            page: Some(3),
            per_page: Some(0),
            ..Default::default()
        });
        assert_eq!(p.per_page, 1);
        assert_eq!(p.offset(), 2);
    }

    #[test]
    fn test_page_math() {
        let p = Pagination { page: 2, per_page: 10 };
        let page: Page<u8> = Page::new(vec![], 25, p);
        assert_eq!(page.total_pages, 3);
        assert!(page.has_next);

        let last: Page<u8> = Page::new(vec![], 25, Pagination { page: 3, per_page: 10 });
        assert!(!last.has_next);

        let empty: Page<u8> = Page::new(vec![], 0, p);
        assert_eq!(empty.total_pages, 0);
        assert!(!empty.has_next);
    }
}
