//! StackExchange API client (site = stackoverflow).

use serde::{Deserialize, Serialize};

use crate::external::{ExternalApiError, ExternalClient};

const STACKEXCHANGE_API: &str = "https://api.stackexchange.com/2.3";
const SITE: &str = "stackoverflow";

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BadgeCounts {
    #[serde(default)]
    pub gold: u32,
    #[serde(default)]
    pub silver: u32,
    #[serde(default)]
    pub bronze: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StackOverflowUser {
    pub user_id: i64,
    pub display_name: String,
    #[serde(default)]
    pub reputation: u64,
    #[serde(default)]
    pub badge_counts: BadgeCounts,
    pub location: Option<String>,
    pub website_url: Option<String>,
    pub link: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopTag {
    pub tag_name: String,
    #[serde(default)]
    pub answer_count: u32,
    #[serde(default)]
    pub answer_score: i64,
}

#[derive(Debug, Deserialize)]
struct Wrapper<T> {
    #[serde(default = "Vec::new")]
    items: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct Total {
    total: u64,
}

fn site_query() -> Vec<(&'static str, String)> {
    vec![("site", SITE.to_string())]
}

#[derive(Clone)]
pub struct StackOverflowClient {
    http: ExternalClient,
}

impl StackOverflowClient {
    pub fn new(http: ExternalClient) -> Self {
        Self { http }
    }

    /// GET /users/{id}. An empty `items` list means the user does not exist.
    pub async fn fetch_user(&self, user_id: i64) -> Result<StackOverflowUser, ExternalApiError> {
        let url = format!("{STACKEXCHANGE_API}/users/{user_id}");
        let wrapper: Wrapper<StackOverflowUser> =
            self.http.get_json(&url, &site_query(), None).await?;
        wrapper
            .items
            .into_iter()
            .next()
            .ok_or_else(|| ExternalApiError::NotFound(format!("StackOverflow user {user_id}")))
    }

    /// GET /users/{id}/answers with `filter=total`.
    pub async fn fetch_answer_count(&self, user_id: i64) -> Result<u64, ExternalApiError> {
        let url = format!("{STACKEXCHANGE_API}/users/{user_id}/answers");
        let mut query = site_query();
        query.push(("filter", "total".to_string()));
        let total: Total = self.http.get_json(&url, &query, None).await?;
        Ok(total.total)
    }

    /// GET /users/{id}/top-tags
    pub async fn fetch_top_tags(&self, user_id: i64) -> Result<Vec<TopTag>, ExternalApiError> {
        let url = format!("{STACKEXCHANGE_API}/users/{user_id}/top-tags");
        let wrapper: Wrapper<TopTag> = self.http.get_json(&url, &site_query(), None).await?;
        Ok(wrapper.items)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_wrapper_deserializes() {
        let wrapper: Wrapper<StackOverflowUser> = serde_json::from_value(serde_json::json!({
            "items": [{
                "user_id": 22656,
                "display_name": "Jon Skeet",
                "reputation": 1400000,
                "badge_counts": { "gold": 900, "silver": 9000, "bronze": 9500 },
                "location": "Reading, United Kingdom",
                "link": "https://stackoverflow.com/users/22656/jon-skeet"
            }],
            "has_more": false
        }))
        .unwrap();
        let user = &wrapper.items[0];
        assert_eq!(user.badge_counts.gold, 900);
        assert!(user.website_url.is_none());
    }

    #[test]
    fn test_empty_wrapper() {
        let wrapper: Wrapper<TopTag> = serde_json::from_value(serde_json::json!({})).unwrap();
        assert!(wrapper.items.is_empty());
    }
}
