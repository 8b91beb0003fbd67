//! Volunteer matching.
//!
//! Pipeline:
//! 1. Collect seeker requests and available volunteers
//! 2. Score every pair, keep the best few per request
//! 3. Persist help offers for high-confidence matches (idempotent)
//! 4. Schedule one help event per offer with both participants

use std::cmp::Ordering;
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::common::RecordId;
use crate::domains::community::{Post, Profile};
use crate::domains::volunteer_match::models::{
    add_participant, EventOutcome, HelpEvent, HelpEventDraft, HelpOffer, Match, MatchSuggestion,
    ParticipantRole, SuggestionKind,
};
use crate::domains::volunteer_match::utils::{
    extract_skills, location_match, location_score, match_confidence, match_type,
    session_window, skill_overlap, skill_score, DEFAULT_AVAILABILITY_SCORE,
};
use crate::domains::volunteer_match::VolunteerMatchConfig;
use crate::kernel::StageStore;

const DETAILS_PREVIEW_CHARS: usize = 200;

/// Open requests whose author is a seeker. Posts without a known author are skipped.
pub fn seeker_requests(posts: Vec<Post>, profiles: &[Profile]) -> Vec<Post> {
    let authors: HashMap<String, &Profile> =
        profiles.iter().map(|p| (p.id.to_string(), p)).collect();
    posts
        .into_iter()
        .filter(Post::is_request)
        .filter(|post| {
            post.author_id
                .as_ref()
                .and_then(|id| authors.get(&id.to_string()))
                .is_some_and(|author| author.is_seeker())
        })
        .collect()
}

pub fn available_volunteers(profiles: &[Profile]) -> Vec<Profile> {
    profiles
        .iter()
        .filter(|p| p.is_available_volunteer())
        .cloned()
        .collect()
}

/// Score one request/volunteer pair. Pure.
pub fn score_pair(request: &Post, volunteer: &Profile) -> Match {
    let request_skills = extract_skills(&request.title, &request.description);
    let location = request.location_text.as_deref();
    let confidence = match_confidence(
        skill_score(&request_skills, &volunteer.skills),
        location_score(location, volunteer.radius_meters),
        DEFAULT_AVAILABILITY_SCORE,
    );

    Match {
        request_id: request.id.clone(),
        volunteer_id: volunteer.id.clone(),
        seeker_id: request.author_id.clone(),
        confidence,
        request_title: request.title.clone(),
        request_description: request.description.clone(),
        volunteer_name: volunteer.display_label(),
        volunteer_email: volunteer.email.clone(),
        skills_match: skill_overlap(&request_skills, &volunteer.skills),
        location_match: location_match(location, volunteer.radius_meters),
        location_text: request.location_text.clone(),
        match_type: match_type(&request_skills),
    }
}

/// Matches at or above the skill threshold, best first, at most
/// `max_matches_per_request` per request.
pub fn find_matches(
    requests: &[Post],
    volunteers: &[Profile],
    config: &VolunteerMatchConfig,
) -> Vec<Match> {
    let mut matches = Vec::new();
    for request in requests {
        let mut candidates: Vec<Match> = volunteers
            .iter()
            .map(|volunteer| score_pair(request, volunteer))
            .filter(|m| m.confidence >= config.skill_match_threshold)
            .collect();
        candidates.sort_by(|a, b| {
            b.confidence
                .partial_cmp(&a.confidence)
                .unwrap_or(Ordering::Equal)
        });
        candidates.truncate(config.max_matches_per_request);
        matches.extend(candidates);
    }
    matches
}

/// Per-request hints: requests with no match, a single weak match, or
/// matches strong enough to schedule events.
pub fn match_suggestions(
    requests: &[Post],
    matches: &[Match],
    config: &VolunteerMatchConfig,
) -> Vec<MatchSuggestion> {
    let mut suggestions = Vec::new();
    for request in requests {
        let for_request: Vec<&Match> = matches
            .iter()
            .filter(|m| m.request_id == request.id)
            .collect();

        if for_request.is_empty() {
            suggestions.push(MatchSuggestion {
                request_id: request.id.clone(),
                kind: SuggestionKind::NoMatches,
                suggestion: "Consider expanding skill requirements or location radius".into(),
                confidence: 0.0,
            });
            continue;
        }

        if let [only] = for_request.as_slice() {
            if only.confidence < config.low_confidence_threshold {
                suggestions.push(MatchSuggestion {
                    request_id: request.id.clone(),
                    kind: SuggestionKind::LowConfidence,
                    suggestion: "Consider adding more specific skill requirements".into(),
                    confidence: only.confidence,
                });
                continue;
            }
        }

        let strong: Vec<f64> = for_request
            .iter()
            .map(|m| m.confidence)
            .filter(|c| *c >= config.offer_threshold)
            .collect();
        if !strong.is_empty() {
            suggestions.push(MatchSuggestion {
                request_id: request.id.clone(),
                kind: SuggestionKind::EventsCreated,
                suggestion: format!(
                    "Created {} events from high-confidence matches",
                    strong.len()
                ),
                confidence: strong.iter().copied().fold(0.0, f64::max),
            });
        }
    }
    suggestions
}

/// Text for the scheduled help event.
pub fn event_description(m: &Match) -> String {
    let mut lines = vec![
        format!("Volunteer help session for: {}", m.request_title),
        format!("Volunteer: {}", m.volunteer_name),
        format!("Skills involved: {}", m.skills_match.join(", ")),
        format!("Match confidence: {:.0}%", m.confidence * 100.0),
    ];
    if !m.request_description.is_empty() {
        let preview: String = m
            .request_description
            .chars()
            .take(DETAILS_PREVIEW_CHARS)
            .collect();
        lines.push(format!("Details: {}...", preview));
    }
    lines.push(String::new());
    lines.push("This event was automatically created based on a volunteer match.".into());
    lines.push("Please coordinate final details directly with each other.".into());
    lines.join("\n")
}

pub struct Scheduled {
    pub created: Option<HelpEvent>,
    pub participants_added: usize,
}

/// Ensure the offer has its help event and both participants.
pub async fn schedule_help(
    m: &Match,
    offer: &HelpOffer,
    now: DateTime<Utc>,
    store: &StageStore<'_>,
) -> Scheduled {
    let mut scheduled = Scheduled {
        created: None,
        participants_added: 0,
    };
    let Some(offer_id) = offer.id.clone() else {
        return scheduled;
    };

    let (start_at, end_at) = session_window(&m.match_type, now);
    let draft = HelpEventDraft::builder()
        .title(format!("Volunteer Help: {}", m.request_title))
        .description(event_description(m))
        .location_text(m.location_text.clone().unwrap_or_else(|| "TBD".to_string()))
        .start_at(start_at)
        .end_at(end_at)
        .created_by(m.volunteer_id.clone())
        .help_offer_id(offer_id)
        .post_id(m.request_id.clone())
        .match_confidence(m.confidence)
        .skills_involved(m.skills_match.clone())
        .match_type(m.match_type.clone())
        .created_at(now)
        .build();

    let event = match HelpEvent::find_or_create(draft, store).await {
        EventOutcome::Created(event) => {
            scheduled.created = Some(event.clone());
            event
        }
        EventOutcome::Existing(event) => event,
        EventOutcome::NotCreated => return scheduled,
    };
    let Some(event_id) = event.id.as_ref() else {
        return scheduled;
    };

    let mut participants: Vec<(&RecordId, ParticipantRole)> =
        vec![(&m.volunteer_id, ParticipantRole::Volunteer)];
    if let Some(seeker) = m.seeker_id.as_ref() {
        participants.push((seeker, ParticipantRole::Recipient));
    }
    for (user_id, role) in participants {
        if add_participant(event_id, user_id, role, now, store).await {
            debug!(event_id = %event_id, user_id = %user_id, role = role.as_str(), "Added event participant");
            scheduled.participants_added += 1;
        }
    }
    scheduled
}
