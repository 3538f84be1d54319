// Resume ingestion: text/PDF extraction, rule-based parsing, owner-scoped storage.

pub mod handlers;
pub mod parser;
pub mod pdf;
pub mod store;
