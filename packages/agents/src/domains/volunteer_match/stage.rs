use async_trait::async_trait;
use chrono::Utc;
use tracing::info;

use super::activities::{
    available_volunteers, find_matches, match_suggestions, schedule_help, seeker_requests,
};
use super::models::{HelpOffer, HelpOfferDraft, OfferOutcome, VolunteerMatchReport};
use crate::domains::community::{Post, Profile};
use crate::kernel::AgentDeps;
use crate::pipeline::{Stage, StageError, StageInput, StageName, StagePayload};

#[derive(Debug, Clone)]
pub struct VolunteerMatchConfig {
    /// Matches below this confidence are discarded
    pub skill_match_threshold: f64,
    /// Matches at or above this confidence get an offer and an event
    pub offer_threshold: f64,
    pub max_matches_per_request: usize,
    pub low_confidence_threshold: f64,
}

impl Default for VolunteerMatchConfig {
    fn default() -> Self {
        Self {
            skill_match_threshold: 0.7,
            offer_threshold: 0.8,
            max_matches_per_request: 3,
            low_confidence_threshold: 0.6,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct VolunteerMatchStage {
    pub config: VolunteerMatchConfig,
}

impl VolunteerMatchStage {
    pub fn new(config: VolunteerMatchConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Stage for VolunteerMatchStage {
    fn name(&self) -> StageName {
        StageName::VolunteerMatch
    }

    fn description(&self) -> &'static str {
        "Matches available volunteers to seeker requests"
    }

    async fn process(
        &self,
        _input: &StageInput,
        deps: &AgentDeps,
    ) -> Result<StagePayload, StageError> {
        let store = deps.store_for(StageName::VolunteerMatch);
        let now = Utc::now();

        let profiles = Profile::find_all(&store).await;
        let requests = seeker_requests(Post::find_open(&store).await, &profiles);
        let volunteers = available_volunteers(&profiles);
        info!(
            seeker_requests = requests.len(),
            volunteers = volunteers.len(),
            "Starting volunteer matching"
        );

        let matches = find_matches(&requests, &volunteers, &self.config);
        let high_confidence: Vec<_> = matches
            .iter()
            .filter(|m| m.confidence >= self.config.offer_threshold)
            .collect();

        let mut created_offers = Vec::new();
        let mut existing_offers = 0;
        let mut created_events = Vec::new();
        let mut participants_added = 0;
        for m in &high_confidence {
            let draft = HelpOfferDraft::builder()
                .post_id(m.request_id.clone())
                .helper_id(m.volunteer_id.clone())
                .offered_at(now)
                .build();
            let offer: HelpOffer = match HelpOffer::find_or_create(draft, &store).await {
                OfferOutcome::Created(offer) => {
                    info!(
                        volunteer = %m.volunteer_name,
                        request = %m.request_title,
                        "Created help offer"
                    );
                    created_offers.push(offer.clone());
                    offer
                }
                OfferOutcome::Existing(offer) => {
                    existing_offers += 1;
                    offer
                }
                OfferOutcome::NotCreated => continue,
            };

            let scheduled = schedule_help(m, &offer, now, &store).await;
            participants_added += scheduled.participants_added;
            created_events.extend(scheduled.created);
        }

        let match_suggestions = match_suggestions(&requests, &matches, &self.config);

        info!(
            matches = matches.len(),
            offers = created_offers.len(),
            events = created_events.len(),
            "Volunteer matching completed"
        );

        Ok(StagePayload::VolunteerMatch(VolunteerMatchReport {
            seeker_requests: requests.len(),
            available_volunteers: volunteers.len(),
            matches_found: matches.len(),
            high_confidence_matches: high_confidence.len(),
            matches,
            created_offers,
            existing_offers,
            created_events,
            participants_added,
            match_suggestions,
            storage_failures: store.failures(),
            timestamp: now,
        }))
    }
}
