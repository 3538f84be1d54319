// Digital footprint scan over public GitHub and StackOverflow profiles.

pub mod github;
pub mod handlers;
pub mod metrics;
pub mod stackoverflow;
