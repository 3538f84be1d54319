// Interview simulation: question selection, rule-based answer scoring, session lifecycle.

pub mod handlers;
pub mod questions;
pub mod scorer;
pub mod store;
