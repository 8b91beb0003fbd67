use serde::{Deserialize, Serialize};

use crate::common::RecordId;

/// A scored volunteer for a seeker's request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Match {
    pub request_id: RecordId,
    pub volunteer_id: RecordId,
    pub seeker_id: Option<RecordId>,
    pub confidence: f64,
    pub request_title: String,
    pub request_description: String,
    pub volunteer_name: String,
    pub volunteer_email: Option<String>,
    pub skills_match: Vec<String>,
    pub location_match: bool,
    pub location_text: Option<String>,
    pub match_type: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionKind {
    NoMatches,
    LowConfidence,
    EventsCreated,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSuggestion {
    pub request_id: RecordId,
    #[serde(rename = "type")]
    pub kind: SuggestionKind,
    pub suggestion: String,
    pub confidence: f64,
}
