pub mod compatibility;
pub mod handlers;
pub mod insights;
pub mod matcher;
pub mod query;
pub mod scraper;
