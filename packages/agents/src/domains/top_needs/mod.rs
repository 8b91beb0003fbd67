pub mod models;

pub use models::{clamp_score, TopNeed, UNKNOWN_LOCATION};
