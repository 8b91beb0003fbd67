mod top_need;

pub use top_need::{clamp_score, TopNeed, UNKNOWN_LOCATION};
