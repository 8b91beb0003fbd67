pub mod urgency;

pub use urgency::*;
