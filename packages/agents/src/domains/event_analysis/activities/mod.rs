//! Event analysis activities.

mod analyze;

pub use analyze::{
    assess_event, create_event_need, create_support_post, support_post_for, PostOutcome,
};
