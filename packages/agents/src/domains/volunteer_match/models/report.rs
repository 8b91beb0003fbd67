use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{HelpEvent, HelpOffer, Match, MatchSuggestion};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolunteerMatchReport {
    pub seeker_requests: usize,
    pub available_volunteers: usize,
    pub matches_found: usize,
    pub high_confidence_matches: usize,
    pub matches: Vec<Match>,
    pub created_offers: Vec<HelpOffer>,
    /// Offers that already existed for a matched pair
    pub existing_offers: usize,
    pub created_events: Vec<HelpEvent>,
    pub participants_added: usize,
    pub match_suggestions: Vec<MatchSuggestion>,
    pub storage_failures: usize,
    pub timestamp: DateTime<Utc>,
}
