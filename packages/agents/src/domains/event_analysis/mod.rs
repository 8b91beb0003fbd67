//! Event analysis: support posts and urgency for upcoming events.

pub mod activities;
pub mod models;
pub mod stage;
pub mod utils;

pub use models::{EventAnalysisReport, EventAssessment, SupportPost, SupportPostKind};
pub use stage::{EventAnalysisConfig, EventAnalysisStage};
