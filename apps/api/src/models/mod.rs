pub mod footprint;
pub mod interview;
pub mod job;
pub mod resume;
pub mod user;
