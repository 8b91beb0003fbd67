use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::common::RecordId;
use crate::domains::top_needs::TopNeed;

/// Per-event analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventAssessment {
    pub event_id: Option<RecordId>,
    pub title: String,
    pub start_at: Option<String>,
    pub capacity: Option<f64>,
    pub location: String,
    pub org_id: Option<RecordId>,
    pub days_until_event: Option<i64>,
    pub needs_volunteers: bool,
    pub needs_resources: bool,
    pub capacity_utilization: f64,
    pub urgency_score: f64,
    pub needs_support: bool,
    pub is_urgent: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SupportPostKind {
    VolunteerRequest,
    ResourceRequest,
}

/// A request post generated for an event that needs support.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SupportPost {
    pub id: Option<RecordId>,
    pub event_id: Option<RecordId>,
    pub post_type: SupportPostKind,
    pub title: String,
    pub description: String,
    pub location_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EventAnalysisReport {
    pub total_events: usize,
    pub events_analyzed: usize,
    pub events_needing_support: usize,
    pub urgent_events: usize,
    pub generated_posts: Vec<SupportPost>,
    /// Support posts that already existed and were left alone
    pub existing_posts: usize,
    pub created_needs: Vec<TopNeed>,
    pub event_analysis: Vec<EventAssessment>,
    pub storage_failures: usize,
    pub timestamp: DateTime<Utc>,
}
